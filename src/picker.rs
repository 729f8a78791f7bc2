//! Picker lifecycle: `Closed -> Open -> Closed`, driven by discrete commands.

use crate::error::PickerError;
use crate::format::InsertMode;
use crate::listing::Listing;
use crate::store::{Comparator, Record, RecordStore};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Surfaces that can receive picked text, addressed by `Id`.
pub trait Surfaces<Id> {
    fn insert_at_point(&mut self, id: &Id, text: &str);
}

/// What had focus when the picker was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus<Id> {
    Surface(Id),
    Listing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Insert(InsertMode),
    Quit,
    Help,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

const PAGE: isize = 10;

/// Read once when a session starts.
#[derive(Debug, Clone)]
pub struct PickerSettings {
    pub url_file: PathBuf,
    pub comparator: Option<Comparator>,
    pub listing_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<Id> {
    /// The command was ignored because no session is open.
    Idle,
    /// The session is still open.
    Open,
    /// The listing was torn down; focus goes back to `origin`.
    Closed { origin: Id, inserted: Option<String> },
}

pub struct Session<Id> {
    origin: Id,
    store: RecordStore,
    listing: Listing,
    name: String,
    show_help: bool,
}

impl<Id> Session<Id> {
    pub fn origin(&self) -> &Id {
        &self.origin
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Resolved fresh from the cursor on every call.
    pub fn selection(&self) -> Option<&Record> {
        crate::listing::resolve(self.listing.text(), self.listing.cursor(), &self.store)
    }

    fn listing_mut(&mut self) -> &mut Listing {
        &mut self.listing
    }
}

pub struct Picker<Id> {
    session: Option<Session<Id>>,
}

impl<Id> Default for Picker<Id> {
    fn default() -> Self {
        Self { session: None }
    }
}

impl<Id: Clone + std::fmt::Debug> Picker<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session<Id>> {
        self.session.as_ref()
    }

    /// Loads the URL file and opens the listing. Invoking from the listing
    /// keeps the current origin instead of pointing at the listing itself.
    /// On failure the picker state is left as it was.
    pub fn invoke(
        &mut self,
        focus: Focus<Id>,
        settings: &PickerSettings,
    ) -> Result<(), PickerError> {
        let origin = match (focus, &self.session) {
            (Focus::Surface(id), _) => id,
            (Focus::Listing, Some(session)) => session.origin.clone(),
            (Focus::Listing, None) => {
                warn!("picker invoked from a listing that is not open");
                return Ok(());
            }
        };

        let store = match RecordStore::load(&settings.url_file) {
            Ok(store) => store.sorted(settings.comparator),
            Err(err) => {
                warn!(error = %err, "failed to load URL file");
                return Err(err);
            }
        };
        let listing = Listing::new(&store);
        info!(
            path = %settings.url_file.display(),
            records = store.len(),
            origin = ?origin,
            "opened URL listing"
        );
        self.session = Some(Session {
            origin,
            store,
            listing,
            name: settings.listing_name.clone(),
            show_help: false,
        });
        Ok(())
    }

    pub fn dispatch<S: Surfaces<Id>>(
        &mut self,
        command: Command,
        surfaces: &mut S,
    ) -> Result<Outcome<Id>, PickerError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(Outcome::Idle);
        };

        match command {
            Command::Insert(mode) => {
                let text = match session.selection() {
                    Some(record) => mode.format(record),
                    None => {
                        let line = session.listing.cursor_line();
                        debug!(line, "insert with no record under the cursor");
                        return Err(PickerError::NoSelectionAtLine { line });
                    }
                };
                surfaces.insert_at_point(&session.origin, &text);
                let origin = session.origin.clone();
                self.session = None;
                info!(origin = ?origin, mode = mode.label(), "inserted URL");
                Ok(Outcome::Closed {
                    origin,
                    inserted: Some(text),
                })
            }
            Command::Quit => {
                let origin = session.origin.clone();
                self.session = None;
                info!(origin = ?origin, "closed URL listing");
                Ok(Outcome::Closed {
                    origin,
                    inserted: None,
                })
            }
            Command::Help => {
                session.show_help = !session.show_help;
                Ok(Outcome::Open)
            }
            Command::Up => {
                session.listing_mut().move_lines(-1);
                Ok(Outcome::Open)
            }
            Command::Down => {
                session.listing_mut().move_lines(1);
                Ok(Outcome::Open)
            }
            Command::PageUp => {
                session.listing_mut().move_lines(-PAGE);
                Ok(Outcome::Open)
            }
            Command::PageDown => {
                session.listing_mut().move_lines(PAGE);
                Ok(Outcome::Open)
            }
            Command::Top => {
                session.listing_mut().move_to_top();
                Ok(Outcome::Open)
            }
            Command::Bottom => {
                session.listing_mut().move_to_last_record();
                Ok(Outcome::Open)
            }
        }
    }
}
