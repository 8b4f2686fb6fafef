//! Byte-level progress reporting for transfers.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives progress events from the transferrer.
///
/// One `start`/`finish` pair per file; `advance` is called after every chunk
/// written to disk.
pub trait ProgressReporter: Send + Sync {
    /// A new file begins. `total` is the announced body length, if any.
    fn start(&self, label: &str, total: Option<u64>);
    /// `bytes` more were written.
    fn advance(&self, bytes: u64);
    /// The current file is complete or abandoned.
    fn finish(&self);
}

/// Reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&self, _label: &str, _total: Option<u64>) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

const BAR_TEMPLATE: &str =
    "{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner} {msg} {bytes} ({bytes_per_sec})";

/// Terminal progress bar on stderr.
///
/// Draws a byte bar when the length is known and a spinner otherwise.
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl BarProgress {
    /// Creates a reporter; `hidden` suppresses all drawing.
    #[must_use]
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            hidden,
        }
    }

    fn make_bar(&self, label: &str, total: Option<u64>) -> ProgressBar {
        let bar = match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template(SPINNER_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_message(label.to_string());
        bar
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, label: &str, total: Option<u64>) {
        let bar = self.make_bar(label, total);
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, bytes: u64) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.inc(bytes);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_tracks_position() {
        let progress = BarProgress::new(true);
        progress.start("BookOne.epub", Some(100));
        progress.advance(40);
        progress.advance(10);
        let position = progress.bar.lock().unwrap().as_ref().unwrap().position();
        assert_eq!(position, 50);
        progress.finish();
        assert!(progress.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_unknown_length_uses_spinner() {
        let progress = BarProgress::new(true);
        progress.start("x", None);
        assert_eq!(progress.bar.lock().unwrap().as_ref().unwrap().length(), None);
        progress.finish();
    }

    #[test]
    fn test_advance_without_start_is_ignored() {
        let progress = BarProgress::new(true);
        progress.advance(10);
        progress.finish();
    }
}
