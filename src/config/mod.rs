//! The local installed-state record.
//!
//! [`InstalledState`] is what is on disk "now": the version and build of the
//! currently-installed server binary. It is loaded once at startup and
//! mutated only after a verified-successful install.
//!
//! [`StateStore`] reads two record shapes: the server's own history record
//! (`{"currentVersion": "<tag>-<build> (MC: <version>)"}`) and this tool's
//! plain `{"version", "build"}` shape. Read or parse failures never abort
//! the process; they degrade to the unknown state `("0", 0)` with a logged
//! warning. Writes always use the plain shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::core::Result;

/// Default file name of the state record, kept next to the install target.
pub const DEFAULT_STATE_FILE: &str = "version_history.json";

/// The version and build currently installed at the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledState {
    /// Installed version string; `"0"` when unknown.
    pub version: String,
    /// Installed build number; `0` when unknown.
    pub build: i64,
}

impl Default for InstalledState {
    fn default() -> Self {
        Self {
            version: "0".to_string(),
            build: 0,
        }
    }
}

impl InstalledState {
    /// The "unknown/none" state used when no record can be read.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether the state holds real version information.
    pub fn is_known(&self) -> bool {
        self.version != "0" || self.build != 0
    }
}

impl std::fmt::Display for InstalledState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "version {} build {}", self.version, self.build)
    }
}

/// Reads and writes the installed-state record.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Use an explicit record path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the record next to the install target.
    ///
    /// A directory target keeps the record inside it; a file target keeps it
    /// as a sibling.
    pub fn for_target(target: &Path) -> Self {
        let path = if target.is_dir() {
            target.join(DEFAULT_STATE_FILE)
        } else {
            match target.parent() {
                Some(parent) if parent != Path::new("") => parent.join(DEFAULT_STATE_FILE),
                _ => PathBuf::from(DEFAULT_STATE_FILE),
            }
        };
        Self { path }
    }

    /// Path of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, degrading to [`InstalledState::unknown`] on any
    /// failure.
    pub async fn load(&self) -> InstalledState {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) => {
                debug!(
                    path = %self.path.display(),
                    %err,
                    "no readable state record; assuming unknown installed version"
                );
                return InstalledState::unknown();
            }
        };

        let value: Value = match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    %err,
                    "state record is not valid JSON; assuming unknown installed version"
                );
                return InstalledState::unknown();
            }
        };

        match parse_record(&value) {
            Some(state) => {
                debug!(path = %self.path.display(), %state, "loaded installed state");
                state
            }
            None => {
                warn!(
                    path = %self.path.display(),
                    "state record has an unrecognized shape; assuming unknown installed version"
                );
                InstalledState::unknown()
            }
        }
    }

    /// Persist the record in the plain shape.
    pub async fn save(&self, state: &InstalledState) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)
            .expect("installed state always serializes");

        if let Some(parent) = self.path.parent()
            && parent != Path::new("")
        {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, contents).await?;

        debug!(path = %self.path.display(), %state, "persisted installed state");
        Ok(())
    }
}

/// Parse either supported record shape.
fn parse_record(value: &Value) -> Option<InstalledState> {
    if let Ok(state) = serde_json::from_value::<InstalledState>(value.clone()) {
        return Some(state);
    }
    value
        .get("currentVersion")
        .and_then(Value::as_str)
        .and_then(parse_current_version)
}

/// Parse the server's own `currentVersion` string.
///
/// The shape is `<tag>-<build> (MC: <version>)`, e.g.
/// `git-Paper-550 (MC: 1.16.5)`. Only this official shape is accepted.
fn parse_current_version(raw: &str) -> Option<InstalledState> {
    let (build_part, version_part) = raw.split_once(' ')?;
    let build = build_part.rsplit('-').next()?.parse().ok()?;
    let version = version_part
        .strip_prefix("(MC: ")?
        .strip_suffix(')')?
        .to_string();
    if version.is_empty() {
        return None;
    }
    Some(InstalledState { version, build })
}
