use crate::buffer::Buffer;
use crate::config::Config;
use crate::format::InsertMode;
use crate::picker::{Command, Focus, Outcome, Picker, PickerSettings, Session, Surfaces};
use crate::theme::UiPalette;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use tracing::{debug, info};
use unicode_width::UnicodeWidthChar;

pub fn run_app(paths: Vec<PathBuf>, config: Config, settings: PickerSettings) -> Result<()> {
    let mut app = App::new(paths, config, settings)?;

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    loop {
        let size = terminal.size()?;
        let layout = app.layout(size);
        app.buffers[app.current].ensure_cursor_visible(layout.editor_height);

        terminal.draw(|f| ui(f, &app, &layout))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key, layout.editor_height) {
                break;
            }
        }
    }

    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferId(usize);

impl Surfaces<BufferId> for Vec<Buffer> {
    fn insert_at_point(&mut self, id: &BufferId, text: &str) {
        if let Some(buffer) = self.get_mut(id.0) {
            buffer.insert_str(text);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Editor,
    Listing,
}

struct StatusMessage {
    text: String,
    is_error: bool,
}

struct LayoutInfo {
    status: Rect,
    editor: Rect,
    listing: Option<Rect>,
    editor_width: u16,
    editor_height: u16,
}

/// Key bindings shown by the listing's help overlay.
const LISTING_HELP: &[(&str, &str)] = &[
    ("Enter, i", "Insert <URL:url>"),
    ("n", "Insert the bare url"),
    ("f", "Insert name <URL:url>"),
    ("t", "Insert the name only"),
    ("q, Esc", "Close without inserting"),
    ("j/k, Up/Down", "Move"),
    ("PgUp/PgDn", "Move by a page"),
    ("g / G", "First / last URL"),
    ("Ctrl-U", "Reload the URL file"),
    ("?, h", "Toggle this help"),
];

fn listing_command(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let command = match key.code {
        KeyCode::Enter | KeyCode::Char('i') => Command::Insert(InsertMode::AngleBracketed),
        KeyCode::Char('n') => Command::Insert(InsertMode::Naked),
        KeyCode::Char('f') => Command::Insert(InsertMode::NamedAngleBracketed),
        KeyCode::Char('t') => Command::Insert(InsertMode::NameOnly),
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Char('?') | KeyCode::Char('h') => Command::Help,
        KeyCode::Up | KeyCode::Char('k') => Command::Up,
        KeyCode::Down | KeyCode::Char('j') => Command::Down,
        KeyCode::PageUp => Command::PageUp,
        KeyCode::PageDown => Command::PageDown,
        KeyCode::Home | KeyCode::Char('g') => Command::Top,
        KeyCode::End | KeyCode::Char('G') => Command::Bottom,
        _ => return None,
    };
    Some(command)
}

fn is_invoke_key(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::F(2))
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('u'))
}

struct App {
    config: Config,
    settings: PickerSettings,
    palette: UiPalette,
    buffers: Vec<Buffer>,
    current: usize,
    picker: Picker<BufferId>,
    focus: Pane,
    status: Option<StatusMessage>,
    quit_armed: bool,
}

impl App {
    fn new(paths: Vec<PathBuf>, config: Config, settings: PickerSettings) -> Result<Self> {
        let mut buffers = Vec::new();
        for path in &paths {
            buffers.push(Buffer::open(path)?);
        }
        if buffers.is_empty() {
            buffers.push(Buffer::scratch());
        }
        let palette = UiPalette::from_config(&config);

        Ok(Self {
            config,
            settings,
            palette,
            buffers,
            current: 0,
            picker: Picker::new(),
            focus: Pane::Editor,
            status: Some(StatusMessage {
                text: "Ctrl-U: pick a URL".to_string(),
                is_error: false,
            }),
            quit_armed: false,
        })
    }

    fn layout(&self, size: Rect) -> LayoutInfo {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(size);
        let main = vertical[0];
        let status = vertical[1];

        let (editor, listing) = if self.picker.is_open() {
            let listing_pct = self.config.listing_height;
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(100 - listing_pct),
                    Constraint::Percentage(listing_pct),
                ])
                .split(main);
            (split[0], Some(split[1]))
        } else {
            (main, None)
        };

        LayoutInfo {
            status,
            editor,
            listing,
            editor_width: editor.width.saturating_sub(2).max(1),
            editor_height: editor.height.saturating_sub(2).max(1),
        }
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
        });
    }

    fn handle_key(&mut self, key: KeyEvent, content_height: u16) -> bool {
        if is_invoke_key(key) {
            self.quit_armed = false;
            self.invoke_picker();
            return false;
        }
        match self.focus {
            Pane::Listing => {
                self.handle_listing_key(key);
                false
            }
            Pane::Editor => self.handle_editor_key(key, content_height),
        }
    }

    fn invoke_picker(&mut self) {
        let focus = match self.focus {
            Pane::Editor => Focus::Surface(BufferId(self.current)),
            Pane::Listing => Focus::Listing,
        };
        match self.picker.invoke(focus, &self.settings) {
            Ok(()) => {
                if let Some(session) = self.picker.session() {
                    let message = if session.store().is_empty() {
                        "URL file has no entries".to_string()
                    } else {
                        format!("{} URLs, ? for help", session.store().len())
                    };
                    self.focus = Pane::Listing;
                    self.set_status(message, false);
                }
            }
            Err(err) => self.set_status(err.to_string(), true),
        }
    }

    fn handle_listing_key(&mut self, key: KeyEvent) {
        let Some(command) = listing_command(key) else {
            return;
        };
        match self.picker.dispatch(command, &mut self.buffers) {
            Ok(Outcome::Closed { origin, inserted }) => {
                self.current = origin.0;
                self.focus = Pane::Editor;
                match inserted {
                    Some(text) => self.set_status(format!("Inserted {text}"), false),
                    None => self.status = None,
                }
            }
            Ok(Outcome::Open) | Ok(Outcome::Idle) => {}
            Err(err) => self.set_status(err.to_string(), true),
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent, content_height: u16) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('q') {
            if self.buffers.iter().any(Buffer::is_dirty) && !self.quit_armed {
                self.quit_armed = true;
                self.set_status("Unsaved changes; Ctrl-Q again to quit", true);
                return false;
            }
            return true;
        }
        self.quit_armed = false;

        let page = content_height.max(1) as isize;
        let buffer = &mut self.buffers[self.current];
        match key.code {
            KeyCode::Char('s') if ctrl => {
                let result = buffer.save();
                match result {
                    Ok(()) => {
                        info!(buffer = %self.buffers[self.current].name(), "saved");
                        self.set_status("Saved", false);
                    }
                    Err(err) => self.set_status(format!("Save failed: {err:#}"), true),
                }
            }
            KeyCode::Char('n') if ctrl => self.cycle_buffer(1),
            KeyCode::Char('p') if ctrl => self.cycle_buffer(-1),
            KeyCode::Char(c) if !ctrl => buffer.insert_char(c),
            KeyCode::Enter => buffer.insert_char('\n'),
            KeyCode::Tab => buffer.insert_char('\t'),
            KeyCode::Backspace => buffer.backspace(),
            KeyCode::Delete => buffer.delete(),
            KeyCode::Left => buffer.move_left(),
            KeyCode::Right => buffer.move_right(),
            KeyCode::Up => buffer.move_lines(-1),
            KeyCode::Down => buffer.move_lines(1),
            KeyCode::PageUp => buffer.move_lines(-page),
            KeyCode::PageDown => buffer.move_lines(page),
            KeyCode::Home => buffer.move_line_start(),
            KeyCode::End => buffer.move_line_end(),
            _ => {}
        }
        false
    }

    fn cycle_buffer(&mut self, delta: isize) {
        let len = self.buffers.len() as isize;
        self.current = (self.current as isize + delta).rem_euclid(len) as usize;
        debug!(buffer = self.current, "switched buffer");
        self.set_status(self.buffers[self.current].name(), false);
    }

    fn status_line(&self) -> Line<'static> {
        let sep = || Span::styled(" | ", Style::default().fg(self.palette.muted));
        let mut parts = vec![Span::styled(
            "urlpick",
            Style::default()
                .fg(self.palette.accent)
                .add_modifier(Modifier::BOLD),
        )];
        parts.push(sep());
        let pane = match self.focus {
            Pane::Editor => "edit",
            Pane::Listing => "pick",
        };
        parts.push(Span::styled(pane, Style::default().fg(self.palette.accent)));
        parts.push(sep());
        // while picking, show the buffer the pick will land in
        let target = match (self.focus, self.picker.session()) {
            (Pane::Listing, Some(session)) => session.origin().0,
            _ => self.current,
        };
        let buffer = &self.buffers[target];
        let (line, col) = buffer.cursor_line_col();
        parts.push(Span::styled(
            format!("{} {}:{}", buffer.name(), line + 1, col + 1),
            self.palette.base(),
        ));
        if let Some(msg) = &self.status {
            let color = if msg.is_error {
                self.palette.error
            } else {
                self.palette.accent
            };
            parts.push(sep());
            parts.push(Span::styled(msg.text.clone(), Style::default().fg(color)));
        }
        Line::from(parts)
    }

    fn editor_text(&self) -> Text<'static> {
        let buffer = &self.buffers[self.current];
        let lines: Vec<Line<'static>> = buffer
            .rope()
            .lines()
            .map(|line| {
                let text = line.to_string();
                Line::from(text.trim_end_matches(['\n', '\r']).replace('\t', "    "))
            })
            .collect();
        Text::from(lines)
    }

    fn editor_cursor_position(&self, layout: &LayoutInfo) -> Option<(u16, u16)> {
        if self.focus != Pane::Editor {
            return None;
        }
        let buffer = &self.buffers[self.current];
        let (line, col) = buffer.cursor_line_col();
        if line < buffer.scroll {
            return None;
        }
        let visible_line = line - buffer.scroll;
        if visible_line >= layout.editor_height as usize {
            return None;
        }

        let mut width = 0usize;
        for ch in buffer.rope().line(line).chars().take(col) {
            width += if ch == '\t' {
                4
            } else {
                UnicodeWidthChar::width(ch).unwrap_or(0)
            };
        }
        let x = layout
            .editor
            .x
            .saturating_add(1)
            .saturating_add(width.min(layout.editor_width as usize).try_into().ok()?);
        let y = layout
            .editor
            .y
            .saturating_add(1)
            .saturating_add(visible_line.try_into().ok()?);
        Some((x, y))
    }
}

fn ui(f: &mut ratatui::Frame, app: &App, layout: &LayoutInfo) {
    f.render_widget(
        Paragraph::new(app.status_line()).style(app.palette.base()),
        layout.status,
    );

    let buffer = &app.buffers[app.current];
    let title = if buffer.is_dirty() {
        format!(" *{} ", buffer.name())
    } else {
        format!(" {} ", buffer.name())
    };
    let editor = Paragraph::new(app.editor_text())
        .block(
            Block::bordered()
                .title(title)
                .border_type(BorderType::Rounded)
                .border_style(app.palette.border_for(app.focus == Pane::Editor)),
        )
        .style(app.palette.base())
        .scroll((buffer.scroll as u16, 0));
    f.render_widget(editor, layout.editor);

    if let (Some(area), Some(session)) = (layout.listing, app.picker.session()) {
        render_listing(f, app, session, area);
        if session.show_help() {
            let popup = centered_rect(60, 60, f.size());
            render_help(f, app, popup);
        }
    }

    if let Some((x, y)) = app.editor_cursor_position(layout) {
        f.set_cursor(x, y);
    }
}

fn render_listing(f: &mut ratatui::Frame, app: &App, session: &Session<BufferId>, area: Rect) {
    let listing = session.listing();
    let items: Vec<ListItem> = listing.lines().map(ListItem::new).collect();
    let mut state = ListState::default();
    state.select(Some(listing.cursor_line()));
    let list = List::new(items)
        .block(
            Block::bordered()
                .title(format!(" {} ", session.name()))
                .border_type(BorderType::Rounded)
                .border_style(app.palette.border_for(app.focus == Pane::Listing)),
        )
        .style(app.palette.base())
        .highlight_style(app.palette.highlight());
    f.render_stateful_widget(list, area, &mut state);
}

fn render_help(f: &mut ratatui::Frame, app: &App, area: Rect) {
    f.render_widget(Clear, area);
    let key_style = Style::default()
        .fg(app.palette.accent)
        .add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = LISTING_HELP
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("  {keys:<14}"), key_style),
                Span::raw(*action),
            ])
        })
        .collect();
    let help = Paragraph::new(lines).block(
        Block::bordered()
            .title(" Keys ")
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(app.palette.accent)),
    );
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
