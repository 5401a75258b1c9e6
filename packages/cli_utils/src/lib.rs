#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the pride map preprocessor: the event geocoding
//! progress bar and logger setup that keeps log lines from tearing it.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use pride_map_preprocess::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// Longest event title shown next to the bar, in characters.
const MAX_LABEL_CHARS: usize = 32;

/// Shown while the export is read and before the event count is known.
const READING_TEMPLATE: &str = "{spinner:.magenta} Reading {msg}";

/// One tick per event; the message is the event being geocoded.
const EVENTS_TEMPLATE: &str =
    "{spinner:.magenta} Geocoding events {wide_bar:.magenta/dim} {pos}/{len} [{elapsed_precise}, ~{eta} left] {msg}";

/// Geocoding progress for one export, drawn with `indicatif`.
///
/// Starts as a spinner naming the input file; [`ProgressCallback::set_total`]
/// switches it to a per-event bar once the rows are known.
pub struct EventProgress {
    bar: ProgressBar,
    events_style: ProgressStyle,
}

impl EventProgress {
    /// Adds the bar to `multi` and starts the spinner for `input`.
    #[must_use]
    pub fn start(multi: &MultiProgress, input: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_style(
            ProgressStyle::with_template(READING_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(input.to_string());

        let events_style = ProgressStyle::with_template(EVENTS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        Arc::new(Self { bar, events_style })
    }
}

impl ProgressCallback for EventProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.events_style.clone());
        self.bar.set_length(total);
        self.bar.reset();
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(event_label(&msg));
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Shortens an event title to fit beside the bar, ending cut titles with
/// an ellipsis. Line breaks in the title are flattened.
#[must_use]
pub fn event_label(title: &str) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.chars().count() <= MAX_LABEL_CHARS {
        return title;
    }
    let mut label: String = title.chars().take(MAX_LABEL_CHARS - 1).collect();
    label.push('…');
    label
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge` and returns
/// the [`MultiProgress`] every bar must be added to.
///
/// `default_level` applies unless `RUST_LOG` is set.
#[must_use]
pub fn init_logger(default_level: LevelFilter) -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(default_level)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A logger may already be installed (tests).
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();
    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_are_kept() {
        assert_eq!(event_label("Pride Picnic"), "Pride Picnic");
    }

    #[test]
    fn multiline_titles_are_flattened() {
        assert_eq!(event_label("Pride\nWalk  2025"), "Pride Walk 2025");
    }

    #[test]
    fn long_titles_are_cut_on_characters() {
        let label = event_label("Ølsmagning og quiz for hele regnbuefamilien på Godsbanen");
        assert_eq!(label.chars().count(), MAX_LABEL_CHARS);
        assert!(label.starts_with("Ølsmagning og quiz"));
        assert!(label.ends_with('…'));
    }

    #[test]
    fn templates_parse() {
        assert!(ProgressStyle::with_template(READING_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(EVENTS_TEMPLATE).is_ok());
    }
}
