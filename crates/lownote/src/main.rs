//! lownote entrypoint.
//!
//! With a note body on the command line (and no `-i`) the note is stored and
//! the program exits. Otherwise the interactive browser starts: every stored
//! note is listed, deleting a note removes it from the database, and notes
//! added by other processes appear on the next tick.
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use core_config::{Config, data_dir, ensure_parent_dir, load_from};
use core_input::CrosstermSource;
use core_interface::{Interface, InterfaceOptions, TickOutcome};
use core_render::{CrosstermCanvas, StylePalette};
use core_store::{NoteRecord, NoteStore};
use core_terminal::{CrosstermBackend, TerminalBackend};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Once;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "lownote.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "lownote", version, about = "Take notes and browse them in the terminal")]
struct Args {
    /// Topic to file the note under (repeatable).
    #[arg(short = 't', long = "topic")]
    topics: Vec<String>,
    /// Configuration file path (overrides discovery of `lownote.toml`).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
    /// Database path (overrides `db_path` from the config file).
    #[arg(short = 'p', long = "path")]
    db_path: Option<PathBuf>,
    /// Due date for the note, as YYYY-MM-DD.
    #[arg(long, value_parser = parse_due)]
    due: Option<NaiveDate>,
    /// Open the browser even when a note body is given.
    #[arg(short = 'i', long)]
    interactive: bool,
    /// Note body; all words are joined with single spaces.
    body: Vec<String>,
}

impl Args {
    fn body(&self) -> Option<String> {
        let body = self.body.join(" ");
        (!body.trim().is_empty()).then_some(body)
    }

    fn wants_browser(&self) -> bool {
        self.interactive || self.body().is_none()
    }
}

fn parse_due(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self, log_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_ansi(false)
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                core_terminal::restore();
                default_panic(info);
            }));
        });
    }
}

/// Resolve configuration, reporting ignored keys on stderr.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = load_from(args.config.clone())?;
    for key in &config.unknown_keys {
        eprintln!("lownote: ignoring unknown config option `{key}`");
    }
    if let Some(path) = &args.db_path {
        config.override_db_path(path.clone());
    }
    Ok(config)
}

/// Store the note given on the command line, if any.
fn add_from_args(store: &mut NoteStore, args: &Args) -> Result<Option<NoteRecord>> {
    let Some(body) = args.body() else {
        return Ok(None);
    };
    let record = store.add_note(&body, &args.topics, args.due)?;
    info!(
        target: "runtime",
        id = record.id,
        topics = record.topics.len(),
        keywords = record.keywords.len(),
        "note_added"
    );
    Ok(Some(record))
}

/// Notes stored after `last_id`, advancing it past them.
fn poll_new_notes(store: &NoteStore, last_id: &Cell<i64>) -> Result<TickOutcome> {
    let fresh = store.notes_after(last_id.get())?;
    let Some(newest) = fresh.last() else {
        return Ok(TickOutcome::default());
    };
    last_id.set(newest.id);
    info!(target: "runtime", count = fresh.len(), last_id = newest.id, "external_notes");
    Ok(TickOutcome {
        keywords: fresh.iter().flat_map(|n| n.keywords.iter().cloned()).collect(),
        items: fresh.iter().map(NoteRecord::to_display_item).collect(),
    })
}

fn run_browser(store: NoteStore, config: &Config) -> Result<()> {
    let (keymap, key_errors) = config.keymap();
    for e in &key_errors {
        eprintln!("lownote: {e}");
    }

    let notes = store.notes()?;
    let keywords = store.keywords()?;
    let last_id = Rc::new(Cell::new(store.last_id()?));
    let store = Rc::new(RefCell::new(store));

    let mut backend = CrosstermBackend::new();
    backend.set_title("lownote")?;
    let mut guard = backend.enter_guard()?;
    let (width, height) = guard.backend().size()?;

    let canvas = CrosstermCanvas::new(Rc::new(StylePalette::build()));
    let options = InterfaceOptions {
        poll_timeout: config.poll_timeout(),
        highlight_keywords: config.highlight_keywords(),
        keymap,
    };
    let delete_store = Rc::clone(&store);
    let tick_store = Rc::clone(&store);
    let mut iface = Interface::new(width, height, &canvas, options)?
        .with_delete_callback(move |item| {
            if !delete_store.borrow_mut().delete_matching(item)? {
                warn!(target: "runtime", "delete_target_missing");
            }
            Ok(())
        })
        .with_tick_callback(move || poll_new_notes(&tick_store.borrow(), &last_id));

    iface.add_keywords(&keywords)?;
    for note in &notes {
        iface.add_note(note.to_display_item())?;
    }
    info!(target: "runtime", notes = notes.len(), keywords = keywords.len(), "browser_ready");

    let mut source = CrosstermSource::new();
    iface.handle_events(&mut source)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging(&data_dir())?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let config = load_config(&args)?;
    let db_path = config.db_path();
    ensure_parent_dir(&db_path)?;
    let mut store = NoteStore::open(&db_path)?;

    add_from_args(&mut store, &args)?;
    if !args.wants_browser() {
        return Ok(());
    }
    run_browser(store, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lownote").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn body_words_are_joined() {
        let a = args(&["-t", "home", "-t", "errands", "buy", "milk"]);
        assert_eq!(a.body().as_deref(), Some("buy milk"));
        assert_eq!(a.topics, vec!["home", "errands"]);
        assert!(!a.wants_browser());
    }

    #[test]
    fn no_body_or_interactive_opens_browser() {
        assert!(args(&[]).wants_browser());
        assert!(args(&["-i", "note"]).wants_browser());
        assert!(args(&["   "]).wants_browser());
    }

    #[test]
    fn due_date_is_validated() {
        let a = args(&["--due", "2024-12-31", "pay", "rent"]);
        assert_eq!(a.due, NaiveDate::from_ymd_opt(2024, 12, 31));
        let bad = Args::try_parse_from(["lownote", "--due", "tomorrow", "x"]);
        assert!(bad.is_err());
    }

    #[test]
    fn cli_db_path_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("lownote.toml");
        std::fs::write(&cfg_path, "db_path = \"/tmp/from-config.sqlite\"\n").unwrap();
        let db = dir.path().join("cli.sqlite");
        let a = args(&["-c", cfg_path.to_str().unwrap(), "-p", db.to_str().unwrap()]);
        let config = load_config(&a).unwrap();
        assert_eq!(config.db_path(), db);
    }

    #[test]
    fn long_path_flag_sets_database() {
        let a = args(&["--path", "/tmp/notes.sqlite"]);
        assert_eq!(a.db_path, Some(PathBuf::from("/tmp/notes.sqlite")));
        assert!(Args::try_parse_from(["lownote", "--db-path", "x.sqlite"]).is_err());
    }

    #[test]
    fn missing_explicit_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let a = args(&["-c", missing.to_str().unwrap()]);
        assert!(load_config(&a).is_err());
    }

    #[test]
    fn add_from_args_stores_note() {
        let mut store = NoteStore::open_in_memory().unwrap();
        let a = args(&["-t", "lang", "%%Rust%%", "is", "fun"]);
        let rec = add_from_args(&mut store, &a).unwrap().unwrap();
        assert_eq!(rec.body, "%%Rust%% is fun");
        assert_eq!(rec.keywords, vec!["rust"]);
        assert!(add_from_args(&mut store, &args(&[])).unwrap().is_none());
    }

    #[test]
    fn tick_picks_up_external_notes_once() {
        let mut store = NoteStore::open_in_memory().unwrap();
        store.add_note("existing", &[], None).unwrap();
        let last = Cell::new(store.last_id().unwrap());
        assert!(poll_new_notes(&store, &last).unwrap().is_empty());

        store.add_note("%%New%% from elsewhere", &[], None).unwrap();
        let outcome = poll_new_notes(&store, &last).unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].body(), "%%New%% from elsewhere");
        assert_eq!(outcome.keywords, vec!["new"]);
        assert!(poll_new_notes(&store, &last).unwrap().is_empty());
    }
}
