mod app;
mod buffer;
mod config;
mod error;
mod format;
mod listing;
mod picker;
mod reader;
mod store;
mod theme;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use format::InsertMode;
use picker::PickerSettings;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use store::{RecordStore, SortOrder};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "urlpick", version, about = "Quote URLs from a list file into your text")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Files to edit
    files: Vec<PathBuf>,

    #[command(flatten)]
    source: SourceArgs,

    /// Write log events to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
struct SourceArgs {
    /// URL file to read instead of the configured one
    #[arg(long, global = true)]
    urls: Option<PathBuf>,

    /// Sort order: name, name-case-sensitive, url or none
    #[arg(long, global = true)]
    sort: Option<SortOrder>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the config file in $EDITOR (default: nvim)
    Config,
    /// Print the URL listing
    List,
    /// Print the formatted URL on a listing line (0-based)
    Get {
        line: usize,
        /// formatted, naked, named or name-only
        #[arg(long, default_value = "formatted")]
        mode: InsertMode,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_tracing(path)?;
    }

    if let Some(Commands::Config) = cli.command {
        return config::open_config_in_editor();
    }

    let cfg = config::load_config()?;
    let settings = picker_settings(&cfg, &cli.source);

    match cli.command {
        Some(Commands::List) => {
            let store = load_sorted(&settings)?;
            for line in listing::render(store.records()) {
                print!("{line}");
            }
            Ok(())
        }
        Some(Commands::Get { line, mode }) => {
            let store = load_sorted(&settings)?;
            let record = store
                .get(line)
                .ok_or(error::PickerError::NoSelectionAtLine { line })?;
            print!("{}", mode.format(record));
            Ok(())
        }
        Some(Commands::Config) | None => app::run_app(cli.files, cfg, settings),
    }
}

fn picker_settings(cfg: &config::Config, source: &SourceArgs) -> PickerSettings {
    let url_file = match &source.urls {
        Some(path) => config::expand_home(path),
        None => cfg.resolved_url_file(),
    };
    PickerSettings {
        url_file,
        comparator: source.sort.unwrap_or(cfg.sort).comparator(),
        listing_name: cfg.listing_name.clone(),
    }
}

fn load_sorted(settings: &PickerSettings) -> Result<RecordStore> {
    let store = RecordStore::load(&settings.url_file)?;
    Ok(store.sorted(settings.comparator))
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{picker_settings, Cli, Commands, SourceArgs};
    use crate::config::Config;
    use crate::format::InsertMode;
    use crate::store::{Record, SortOrder};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn cli_parses_get_with_mode() {
        let cli = Cli::parse_from(["urlpick", "get", "1", "--mode", "name-only", "--sort", "none"]);
        match cli.command {
            Some(Commands::Get { line, mode }) => {
                assert_eq!(line, 1);
                assert_eq!(mode, InsertMode::NameOnly);
            }
            _ => panic!("expected get"),
        }
        assert_eq!(cli.source.sort, Some(SortOrder::None));
    }

    #[test]
    fn cli_flags_override_config() {
        let cfg = Config {
            url_file: PathBuf::from("/cfg/urls"),
            sort: SortOrder::None,
            ..Config::default()
        };
        let source = SourceArgs {
            urls: Some(PathBuf::from("/cli/urls")),
            sort: Some(SortOrder::Name),
        };
        let settings = picker_settings(&cfg, &source);
        assert_eq!(settings.url_file, PathBuf::from("/cli/urls"));
        let cmp = settings.comparator.expect("sorting enabled");
        assert!(cmp(&Record::new("a", ""), &Record::new("B", "")).is_lt());
    }

    #[test]
    fn config_used_without_flags() {
        let cfg = Config {
            url_file: PathBuf::from("/cfg/urls"),
            sort: SortOrder::None,
            ..Config::default()
        };
        let settings = picker_settings(&cfg, &SourceArgs::default());
        assert_eq!(settings.url_file, PathBuf::from("/cfg/urls"));
        assert!(settings.comparator.is_none());
        assert_eq!(settings.listing_name, "*URLs*");
    }
}
