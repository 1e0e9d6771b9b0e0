//! Remote artifact catalog access.
//!
//! The catalog is a versioned HTTP API: the project root lists versions,
//! each version lists builds, and each build carries a full descriptor with
//! its artifact name, SHA-256 digest, creation time, and changeset. URLs are
//! built by appending path segments only for the arguments supplied, so an
//! omitted argument broadens the query instead of producing a wildcard.
//!
//! [`CatalogClient`] caches metadata responses by resolved URL for the
//! process lifetime. Nothing here retries: a network or protocol failure
//! surfaces immediately with the attempted URL attached.

mod client;
mod model;

pub use client::CatalogClient;
pub use model::{BuildDescriptor, Change, DownloadInfo, Downloads, ProjectIndex, VersionIndex};
