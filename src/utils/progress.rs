//! Progress reporting for the clone pipeline.
//!
//! A thin wrapper over `indicatif` so commands never deal with bar styling
//! or suppression logic. Progress is hidden when requested (`--no-progress`,
//! `--quiet`) and in non-TTY environments, where indicatif already draws
//! nothing.

use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;

/// A file-count progress bar for one clone run.
#[derive(Debug)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a reporter for `total` files. Hidden entirely when `enabled`
    /// is false.
    #[must_use]
    pub fn new(total: u64, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Advance by one file, showing what is being processed.
    pub fn tick(&self, message: impl Into<Cow<'static, str>>) {
        self.bar.set_message(message);
        self.bar.inc(1);
    }

    /// Finish and clear the bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
