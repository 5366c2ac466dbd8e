//! Progress bar driven by download events.

use indicatif::{ProgressBar, ProgressStyle};

use crate::download::{EventSink, Outcome, ProgressEvent, StatusEvent};

/// Create a progress bar for item counts.
pub fn create_item_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {{msg}}",
            message
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}

/// [`EventSink`] that renders batch progress on the terminal.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new(total: usize) -> Self {
        Self {
            bar: create_item_bar(total as u64, "Downloading"),
        }
    }

    /// A sink whose bar draws nothing.
    pub fn hidden(total: usize) -> Self {
        let bar = create_item_bar(total as u64, "Downloading");
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for ProgressBarSink {
    fn status(&self, event: StatusEvent) {
        if event.status == Outcome::Failed {
            self.bar
                .set_message(format!("last failure: tweet {}", event.tweet_id));
        }
    }

    fn progress(&self, event: ProgressEvent) {
        self.bar.set_position(event.current as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tracks_position() {
        let sink = ProgressBarSink::hidden(4);
        sink.progress(ProgressEvent::new(3, 4));
        assert_eq!(sink.bar.position(), 3);
        assert_eq!(sink.bar.length(), Some(4));
        sink.finish();
    }
}
