//! Artifact downloading.
//!
//! [`ArtifactDownloader`] streams a build's binary into the staging
//! directory in fixed-size blocks, reporting progress once per block, then
//! verifies the written file against the catalog's published SHA-256 digest.
//!
//! The server MUST declare a `content-length`; its absence is a hard error,
//! not something to tolerate silently, because the block accounting and the
//! progress contract both depend on knowing the total up front. When the
//! caller passes a directory instead of a file path, the file name is derived
//! from the `content-disposition` header and validated to be a plain file
//! name so a hostile server cannot escape the staging directory.
//!
//! A failure mid-stream aborts with the partial file left in staging; it is
//! never promoted to the install target.

mod verification;

pub use verification::ChecksumVerifier;

use futures::StreamExt;
use reqwest::header;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::catalog::CatalogClient;
use crate::core::{Result, UpdateError};

/// Bytes per progress block.
///
/// Large enough to amortize syscall overhead, small enough to bound memory
/// and keep progress updates smooth.
pub const BLOCK_SIZE: usize = 8 * 1024;

/// Progress of one block of a download.
///
/// Passed to the progress callback once per block. `bytes_complete` is the
/// quantity to render: on the final block it equals `total_bytes` exactly
/// instead of overshooting to `total_blocks * block_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockProgress {
    /// Declared total size of the download in bytes.
    pub total_bytes: u64,
    /// Size of a full block.
    pub block_size: usize,
    /// Total number of blocks in the download.
    pub total_blocks: u64,
    /// Zero-based index of the block just written.
    pub block_index: u64,
}

impl BlockProgress {
    /// Bytes written so far, clamped so the last block reports the exact
    /// total rather than a whole-block multiple.
    pub fn bytes_complete(&self) -> u64 {
        ((self.block_index + 1) * self.block_size as u64).min(self.total_bytes)
    }

    /// Whether this is the final block of the download.
    pub fn is_last(&self) -> bool {
        self.block_index + 1 >= self.total_blocks
    }
}

/// Callback invoked once per written block.
pub type ProgressFn<'a> = dyn FnMut(&BlockProgress) + 'a;

/// Streams build artifacts from the catalog into staging and verifies them.
pub struct ArtifactDownloader<'a> {
    catalog: &'a CatalogClient,
    verify: bool,
}

impl<'a> ArtifactDownloader<'a> {
    /// Create a downloader with integrity checking enabled.
    pub fn new(catalog: &'a CatalogClient) -> Self {
        Self {
            catalog,
            verify: true,
        }
    }

    /// Enable or disable the post-download integrity check.
    #[must_use]
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Download the artifact for `(version, build)` to `destination`.
    ///
    /// `destination` may be a file path or a directory; for a directory the
    /// file name is derived from the response's `content-disposition` header
    /// (falling back to the catalog's published name) and validated against
    /// path traversal. Returns the path of the written file.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::Network`] on transport failure, including mid-stream
    /// - [`UpdateError::HttpStatus`] on a non-2xx response
    /// - [`UpdateError::MissingLength`] when no `content-length` is declared
    /// - [`UpdateError::UnsafeFilename`] when the derived name is not plain
    /// - [`UpdateError::Integrity`] when the digest does not match
    pub async fn download(
        &self,
        destination: &Path,
        version: &str,
        build: i64,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<PathBuf> {
        let descriptor = self.catalog.build(version, build).await?;
        let url = self
            .catalog
            .download_url(version, build, descriptor.download_name());

        let response = self.catalog.fetch_artifact(&url).await?;

        let total_bytes =
            declared_length(response.headers()).ok_or_else(|| UpdateError::MissingLength {
                url: url.clone(),
            })?;

        let path = if destination.is_dir() {
            let name = response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok())
                .and_then(attachment_filename)
                .unwrap_or_else(|| descriptor.download_name().to_string());
            ensure_plain_filename(&name)?;
            destination.join(name)
        } else {
            destination.to_path_buf()
        };

        info!(%url, path = %path.display(), total_bytes, "downloading artifact");

        let total_blocks = total_bytes.div_ceil(BLOCK_SIZE as u64);
        let mut file = fs::File::create(&path).await?;
        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::with_capacity(BLOCK_SIZE * 2);
        let mut block_index = 0u64;

        let mut emit = |index: u64| {
            if let Some(progress) = progress.as_mut() {
                progress(&BlockProgress {
                    total_bytes,
                    block_size: BLOCK_SIZE,
                    total_blocks,
                    block_index: index,
                });
            }
        };

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| UpdateError::Network {
                url: url.clone(),
                source,
            })?;
            pending.extend_from_slice(&chunk);

            while pending.len() >= BLOCK_SIZE {
                let block: Vec<u8> = pending.drain(..BLOCK_SIZE).collect();
                file.write_all(&block).await?;
                emit(block_index);
                block_index += 1;
            }
        }

        if !pending.is_empty() {
            file.write_all(&pending).await?;
            emit(block_index);
        }
        file.flush().await?;
        drop(file);

        if self.verify {
            ChecksumVerifier::verify(&path, descriptor.sha256()).await?;
        } else {
            warn!("integrity check disabled; installing unverified artifact");
        }

        debug!(path = %path.display(), "download complete");
        Ok(path)
    }
}

/// Read the declared `content-length` from response headers.
///
/// Reads the raw header rather than `Response::content_length()` so that a
/// present-but-unparseable value is treated the same as an absent one.
fn declared_length(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Extract the file name from a `content-disposition` header value.
///
/// Understands both the RFC 5987 `filename*=charset''name` form and the
/// plain (optionally quoted) `filename=name` form, preferring the former.
fn attachment_filename(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        if let Some(encoded) = param.strip_prefix("filename*=") {
            let name = match encoded.split_once("''") {
                Some((_charset, name)) => name,
                None => encoded,
            };
            let name = name.trim_matches('"');
            if !name.is_empty() {
                return Some(name.to_string());
            }
        } else if let Some(name) = param.strip_prefix("filename=") {
            let name = name.trim_matches('"');
            if !name.is_empty() {
                plain = Some(name.to_string());
            }
        }
    }
    plain
}

/// Reject any derived name that is not a single plain path component.
///
/// The name came from the network; anything with separators or `..` could
/// escape the staging directory.
fn ensure_plain_filename(name: &str) -> Result<()> {
    let path = Path::new(name);
    let mut components = path.components();
    let is_plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !is_plain || name.contains('/') || name.contains('\\') {
        return Err(UpdateError::UnsafeFilename {
            name: name.to_string(),
        });
    }
    Ok(())
}
