//! Progress over the album tasks of a manifest.
//!
//! Interactive runs draw a bar; `--log-only` runs hide it and write a
//! progress line through the logger every few albums instead.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tracing::info;

/// Tracks how many album tasks have been handled.
pub struct AlbumProgress {
    bar: ProgressBar,
    log_only: bool,
    interval: u64,
    done: u64,
    total: u64,
}

impl AlbumProgress {
    /// `interval` is how many albums pass between log lines in log-only mode.
    pub fn new(total: u64, msg: &str, log_only: bool, interval: u64) -> Self {
        let bar = ProgressBar::new(total);
        if log_only {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            let style = ProgressStyle::default_bar()
                .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} albums")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        Self {
            bar,
            log_only,
            interval: interval.max(1),
            done: 0,
            total,
        }
    }

    /// Run `f` with the bar cleared, so report lines don't interleave with it.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.bar.suspend(f)
    }

    /// Mark one more album as handled.
    pub fn advance(&mut self) {
        self.done += 1;
        self.bar.inc(1);
        if self.should_log() {
            let pct = 100.0 * self.done as f64 / self.total as f64;
            info!("[Albums] {}/{} ({:.1}%)", self.done, self.total, pct);
        }
    }

    pub fn finish(&self) {
        self.bar
            .finish_with_message(format!("Compared {} albums", self.done));
    }

    fn should_log(&self) -> bool {
        self.log_only
            && self.total > 0
            && (self.done % self.interval == 0 || self.done == self.total)
    }
}

/// Elapsed time for the run summary: "4.2s" under a minute, "3m 07s" above.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        return format!("{:.1}s", secs);
    }
    let whole = d.as_secs();
    format!("{}m {:02}s", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3 * 60 + 7)), "3m 07s");
    }

    #[test]
    fn test_log_lines_follow_interval() {
        let mut progress = AlbumProgress::new(5, "Comparing", true, 2);
        let mut logged = Vec::new();
        for _ in 0..5 {
            progress.advance();
            logged.push(progress.should_log());
        }
        assert_eq!(logged, vec![false, true, false, true, true]);
    }

    #[test]
    fn test_interactive_mode_never_logs() {
        let mut progress = AlbumProgress::new(2, "Comparing", false, 1);
        progress.advance();
        assert!(!progress.should_log());
    }

    #[test]
    fn test_zero_interval_and_empty_total() {
        let mut progress = AlbumProgress::new(0, "Comparing", true, 0);
        assert!(!progress.should_log());
        // Extra advances past an empty total must not panic
        progress.advance();
        progress.finish();
    }
}
