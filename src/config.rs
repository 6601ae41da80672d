use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Editor launched for the external round trip when nothing else is configured
pub const DEFAULT_EDITOR: &str = "vi";

/// Scratch directory used when neither `TMPDIR` nor the config file names one
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

/// Key binding flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EditingMode {
    #[default]
    Emacs,
    Vi,
}

impl EditingMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "emacs" => Some(Self::Emacs),
            "vi" | "vim" => Some(Self::Vi),
            _ => None,
        }
    }
}

/// On-disk configuration (`$XDG_CONFIG_HOME/jot/config.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External editor command for the full-screen round trip
    #[serde(default)]
    pub editor: Option<String>,

    /// Directory for the round-trip temp file
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    #[serde(default)]
    pub editing_mode: Option<EditingMode>,

    /// Ring the terminal bell on boundary conditions
    #[serde(default = "default_true")]
    pub bell: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: None,
            scratch_dir: None,
            editing_mode: None,
            bell: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.as_ref().display(), e)))?;

        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/jot/config.json` (or the platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jot").join("config.json"))
    }

    /// Load the explicit config file, or the default one if it exists.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }
}

/// Application name matched by `$if` sections of a readline init file
pub const READLINE_APP_NAME: &str = "jot";

/// Find `set editing-mode ...` in a readline init file; the last one wins.
///
/// Lines inside a `$if` section only count when the section names
/// [`READLINE_APP_NAME`]; `$else` flips the innermost section.
pub fn inputrc_editing_mode(contents: &str) -> Option<EditingMode> {
    // one entry per open `$if`
    let mut sections: Vec<bool> = Vec::new();
    let mut mode = None;

    for line in contents.lines().map(str::trim) {
        if line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        match words.next() {
            Some("$if") => sections.push(
                words
                    .next()
                    .is_some_and(|name| name.eq_ignore_ascii_case(READLINE_APP_NAME)),
            ),
            Some("$else") => {
                if let Some(applies) = sections.last_mut() {
                    *applies = !*applies;
                }
            }
            Some("$endif") => {
                sections.pop();
            }
            Some("set") if sections.iter().all(|&applies| applies) => {
                if let (Some(var), Some(value)) = (words.next(), words.next()) {
                    if var.eq_ignore_ascii_case("editing-mode") {
                        mode = EditingMode::parse(value).or(mode);
                    }
                }
            }
            _ => {}
        }
    }
    mode
}

/// Readline init file location: `$INPUTRC`, else `~/.inputrc`.
pub fn inputrc_path(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    non_empty(lookup("INPUTRC"))
        .map(PathBuf::from)
        .or_else(|| non_empty(lookup("HOME")).map(|home| PathBuf::from(home).join(".inputrc")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Effective settings after layering defaults, config file, init file,
/// environment and command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub editor: String,
    pub scratch_dir: PathBuf,
    pub editing_mode: EditingMode,
    pub bell: bool,
}

impl Settings {
    /// Layer, lowest precedence first:
    /// defaults, config file, readline init file mode, environment, CLI mode.
    /// A non-empty `TMPDIR` overrides the config file's `scratch_dir`.
    pub fn resolve(
        config: &Config,
        inputrc_mode: Option<EditingMode>,
        lookup: &dyn Fn(&str) -> Option<String>,
        cli_mode: Option<EditingMode>,
    ) -> Self {
        let editor = non_empty(lookup("JOT_EDITOR"))
            .or_else(|| config.editor.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());

        let scratch_dir = non_empty(lookup("TMPDIR"))
            .map(PathBuf::from)
            .or_else(|| config.scratch_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR));

        let editing_mode = cli_mode
            .or_else(|| non_empty(lookup("JOT_EDITING_MODE")).and_then(|m| EditingMode::parse(&m)))
            .or(inputrc_mode)
            .or(config.editing_mode)
            .unwrap_or_default();

        Self {
            editor,
            scratch_dir,
            editing_mode,
            bell: config.bell,
        }
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
