//! Configuration loading and parsing.
//!
//! Parses `lownote.toml` (or an override path provided by the binary):
//!
//! ```toml
//! db_path = "~/.lownote/lownote.sqlite"
//! poll_timeout_ms = 500
//! highlight_keywords = true
//!
//! [keys]
//! up = ["k", "Up"]
//! down = "j"
//! ```
//!
//! Loading rules:
//! * An explicitly requested file that cannot be read is fatal
//!   ([`ConfigError::Unreadable`]). A missing default file silently yields the
//!   defaults.
//! * Malformed TOML (or a value of the wrong type) is logged and the defaults
//!   are used.
//! * Unknown keys are collected in [`Config::unknown_keys`], logged, and
//!   otherwise ignored.
//! * Scalar settings written as strings are coerced: integer-looking strings
//!   become integers and `true/yes/on/y` / `false/no/off/n` become booleans.
//!   String-typed settings (`db_path`, key names) are left as written.

use core_keymap::{Action, KeyParseError, Keymap};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, mem};
use toml::{Table, Value};
use tracing::{debug, info, warn};

pub const FILE_NAME: &str = "lownote.toml";
pub const DATA_DIR_NAME: &str = ".lownote";
pub const DEFAULT_DB_PATH: &str = "~/.lownote/lownote.sqlite";

const TOP_LEVEL_KEYS: [&str; 4] = ["db_path", "poll_timeout_ms", "highlight_keywords", "keys"];
const STRING_KEYS: [&str; 1] = ["db_path"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("could not create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One key name or a list of them.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum KeyList {
    One(String),
    Many(Vec<String>),
}

impl KeyList {
    pub fn names(&self) -> Vec<String> {
        match self {
            KeyList::One(k) => vec![k.clone()],
            KeyList::Many(ks) => ks.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct KeysConfig {
    pub up: Option<KeyList>,
    pub down: Option<KeyList>,
    pub delete: Option<KeyList>,
    pub exit: Option<KeyList>,
}

impl KeysConfig {
    const NAMES: [&str; 4] = ["up", "down", "delete", "exit"];

    fn for_action(&self, action: Action) -> Option<&KeyList> {
        match action {
            Action::MoveUp => self.up.as_ref(),
            Action::MoveDown => self.down.as_ref(),
            Action::Delete => self.delete.as_ref(),
            Action::Exit => self.exit.as_ref(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default = "ConfigFile::default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "ConfigFile::default_highlight_keywords")]
    pub highlight_keywords: bool,
    #[serde(default)]
    pub keys: KeysConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            db_path: None,
            poll_timeout_ms: Self::default_poll_timeout_ms(),
            highlight_keywords: Self::default_highlight_keywords(),
            keys: KeysConfig::default(),
        }
    }
}

impl ConfigFile {
    const fn default_poll_timeout_ms() -> u64 {
        500
    }
    const fn default_highlight_keywords() -> bool {
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,       // original file string (optional)
    pub source: Option<PathBuf>,   // file the values came from
    pub file: ConfigFile,          // parsed (or default) data
    pub unknown_keys: Vec<String>, // dotted paths of ignored keys
    db_path_override: Option<PathBuf>,
}

/// `~/.lownote`, or `.lownote` in the working directory when no home
/// directory is known.
pub fn data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DATA_DIR_NAME),
        None => PathBuf::from(DATA_DIR_NAME),
    }
}

/// Default config location.
pub fn discover() -> PathBuf {
    data_dir().join(FILE_NAME)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

/// Coerce a string scalar the way hand-edited rc files expect.
pub fn coerce_scalar(value: Value) -> Value {
    let Value::String(s) = value else {
        return value;
    };
    if let Ok(n) = s.trim().parse::<i64>() {
        return Value::Integer(n);
    }
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "y" => Value::Boolean(true),
        "false" | "no" | "off" | "n" => Value::Boolean(false),
        _ => Value::String(s),
    }
}

/// Strip unknown keys from `table` (returning their dotted paths) and coerce
/// non-string scalars.
fn normalize(table: &mut Table) -> Vec<String> {
    let mut unknown = Vec::new();
    let keys: Vec<String> = table.keys().cloned().collect();
    for key in keys {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            table.remove(&key);
            unknown.push(key);
            continue;
        }
        if key == "keys" {
            if let Some(Value::Table(keys)) = table.get_mut(&key) {
                let names: Vec<String> = keys.keys().cloned().collect();
                for name in names {
                    if !KeysConfig::NAMES.contains(&name.as_str()) {
                        keys.remove(&name);
                        unknown.push(format!("keys.{name}"));
                    }
                }
            }
            continue;
        }
        if STRING_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(v) = table.get_mut(&key) {
            *v = coerce_scalar(mem::replace(v, Value::Boolean(false)));
        }
    }
    unknown.sort();
    unknown
}

/// Parse config text. Returns the parsed file and the ignored keys, or `None`
/// when the text is not usable.
pub fn parse(content: &str) -> Option<(ConfigFile, Vec<String>)> {
    let mut table = match toml::from_str::<Table>(content) {
        Ok(t) => t,
        Err(e) => {
            warn!(target: "config", error = %e, "config_parse_failed");
            return None;
        }
    };
    let unknown = normalize(&mut table);
    for key in &unknown {
        warn!(target: "config", key = %key, "config_unknown_key");
    }
    match Value::Table(table).try_into::<ConfigFile>() {
        Ok(file) => Some((file, unknown)),
        Err(e) => {
            warn!(target: "config", error = %e, "config_invalid_value");
            None
        }
    }
}

/// Load configuration from `path`, or from [`discover`] when `None`.
pub fn load_from(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(source) if explicit => return Err(ConfigError::Unreadable { path, source }),
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(target: "config", path = %path.display(), error = %e, "config_default_unreadable");
            }
            debug!(target: "config", path = %path.display(), "config_defaults");
            return Ok(Config::default());
        }
    };
    let Some((file, unknown_keys)) = parse(&content) else {
        return Ok(Config {
            raw: Some(content),
            source: Some(path),
            ..Config::default()
        });
    };
    info!(
        target: "config",
        path = %path.display(),
        unknown = unknown_keys.len(),
        "config_loaded"
    );
    Ok(Config {
        raw: Some(content),
        source: Some(path),
        file,
        unknown_keys,
        db_path_override: None,
    })
}

impl Config {
    /// Command line `--path` takes precedence over the file.
    pub fn override_db_path(&mut self, path: PathBuf) {
        self.db_path_override = Some(path);
    }

    /// Effective database path with `~` expanded.
    pub fn db_path(&self) -> PathBuf {
        if let Some(p) = &self.db_path_override {
            return p.to_str().map_or_else(|| p.clone(), expand_tilde);
        }
        expand_tilde(self.file.db_path.as_deref().unwrap_or(DEFAULT_DB_PATH))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.file.poll_timeout_ms)
    }

    pub fn highlight_keywords(&self) -> bool {
        self.file.highlight_keywords
    }

    /// Default bindings with any `[keys]` entries replacing an action's keys.
    pub fn keymap(&self) -> (Keymap, Vec<KeyParseError>) {
        let mut map = Keymap::with_defaults();
        let mut errors = Vec::new();
        for action in Action::ALL {
            if let Some(list) = self.file.keys.for_action(action) {
                errors.extend(map.rebind(action, &list.names()));
            }
        }
        for e in &errors {
            warn!(target: "config", error = %e, "config_bad_key");
        }
        (map, errors)
    }
}

/// Create the directory holding `path` if needed. An existing non-directory
/// in its place is an error.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ConfigError> {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if dir.exists() && !dir.is_dir() {
        return Err(ConfigError::NotADirectory(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        info!(target: "config", dir = %dir.display(), "data_dir_created");
    }
    Ok(())
}
