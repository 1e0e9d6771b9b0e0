//! Progress indicators for long-running operations.
//!
//! Wraps `indicatif` with consistent styling and automatic disabling in
//! quiet or non-interactive environments. Set the `SRVUP_NO_PROGRESS`
//! environment variable (or pass `--no-progress`) to disable all bars.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

use crate::download::BlockProgress;

/// Checks if progress bars should be disabled.
fn is_progress_disabled() -> bool {
    std::env::var("SRVUP_NO_PROGRESS").is_ok()
}

/// A byte-count progress bar with consistent styling.
///
/// Hidden entirely when progress is disabled, so call sites never need to
/// branch on quiet mode.
pub struct ProgressBar {
    bar: IndicatifBar,
}

impl ProgressBar {
    /// Create a bar for `total` bytes of known work.
    pub fn new_bytes(total: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            IndicatifBar::new(total)
        };
        bar.set_style(
            ProgressStyle::with_template(
                "{msg:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .expect("progress template is valid")
            .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Set the status message shown next to the bar.
    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    /// Move the bar to an absolute position.
    pub fn set_position(&self, position: u64) {
        self.bar.set_position(position);
    }

    /// Complete the bar, leaving a final message.
    pub fn finish_with_message(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }
}

/// Adapts the downloader's per-block callback to a byte progress bar.
///
/// The bar is created lazily on the first block, once the total size is
/// known, and finished on the last block, whose reported byte count equals
/// the total exactly.
#[derive(Default)]
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    /// Create an adapter with no bar yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one block of download progress.
    pub fn observe(&mut self, progress: &BlockProgress) {
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new_bytes(progress.total_bytes);
            bar.set_message("downloading");
            bar
        });
        bar.set_position(progress.bytes_complete());
        if progress.is_last() {
            bar.finish_with_message("downloaded");
        }
    }
}
