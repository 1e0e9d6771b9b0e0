//! Wire types for the artifact catalog API.
//!
//! All three response shapes are read-only snapshots deserialized fresh per
//! fetch; a new fetch replaces the previous snapshot rather than mutating it.
//! Both `versions` and `builds` are ordered chronologically with the newest
//! element LAST, which is what makes `latest` equivalent to "last element".

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Project-level catalog metadata: the list of known versions.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectIndex {
    /// Known versions, oldest first, newest last.
    pub versions: Vec<String>,
}

/// Version-level catalog metadata: the builds published for one version.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionIndex {
    /// The version these builds belong to.
    pub version: String,
    /// Published build numbers, oldest first, newest last.
    pub builds: Vec<i64>,
}

/// Full metadata for one `(version, build)` pair.
///
/// Uniquely identified by `(version, build)`; immutable once published.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildDescriptor {
    /// The version this build belongs to.
    pub version: String,
    /// The build number.
    pub build: i64,
    /// When the build was created.
    #[serde(rename = "time")]
    pub created_at: DateTime<Utc>,
    /// Commits included since the previous build.
    #[serde(default)]
    pub changes: Vec<Change>,
    /// Download descriptors for the build's artifacts.
    pub downloads: Downloads,
}

impl BuildDescriptor {
    /// File name of the application artifact.
    pub fn download_name(&self) -> &str {
        &self.downloads.application.name
    }

    /// Published SHA-256 digest (hex) of the application artifact.
    pub fn sha256(&self) -> &str {
        &self.downloads.application.sha256
    }
}

/// The set of downloadable artifacts for a build.
///
/// The catalog may publish more than one artifact per build; this tool only
/// consumes the application binary.
#[derive(Debug, Clone, Deserialize)]
pub struct Downloads {
    /// The server application binary.
    pub application: DownloadInfo,
}

/// Name and published digest of one downloadable artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadInfo {
    /// File name to request from the downloads endpoint.
    pub name: String,
    /// Hex-encoded SHA-256 digest of the artifact.
    pub sha256: String,
}

/// One commit in a build's changeset.
#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    /// Commit identifier.
    pub commit: String,
    /// One-line summary.
    pub summary: String,
    /// Full commit message.
    pub message: String,
}
