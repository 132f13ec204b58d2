//! Terminal progress bar for one file.

use indicatif::{ProgressBar, ProgressStyle};
use mediaup_transfer::ProgressSink;

const TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Byte progress bar fed by the upload workers.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(name: &str) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let bar = ProgressBar::new(0).with_style(style);
        bar.set_message(name.to_string());
        Self { bar }
    }

    /// Leaves the bar where it stopped.
    pub fn abandon(&self) {
        self.bar.abandon();
    }

    #[cfg(test)]
    fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressSink for BarProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_bytes() {
        let progress = BarProgress::new("clip.mp4");
        progress.start(1024);
        progress.advance(512);
        progress.advance(256);
        assert_eq!(progress.bar().length(), Some(1024));
        assert_eq!(progress.bar().position(), 768);

        progress.finish();
        assert!(progress.bar().is_finished());
    }

    #[test]
    fn abandon_finishes_the_bar() {
        let progress = BarProgress::new("clip.mp4");
        progress.start(10);
        progress.advance(4);
        progress.abandon();
        assert!(progress.bar().is_finished());
        assert_eq!(progress.bar().position(), 4);
    }
}
