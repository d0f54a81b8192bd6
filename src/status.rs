//! Progress tracking.

use std::io::Write;

/// Notified once per completed segment with the number of integers of the
/// interval it covered.
pub trait StatusSink {
    fn update_status(&mut self, numbers_processed: u64);
}

/// Progress of a run as a percentage of its interval.
pub struct Progress {
    total: u64,
    processed: u64,
    percent: f64,
    printed: Option<u32>,
    out: Option<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("total", &self.total)
            .field("processed", &self.processed)
            .field("percent", &self.percent)
            .field("printing", &self.out.is_some())
            .finish()
    }
}

impl Progress {
    /// Track progress over an interval of `total` integers.
    pub fn new(total: u64) -> Self {
        Self {
            total: total.max(1),
            processed: 0,
            percent: 0.0,
            printed: None,
            out: None,
        }
    }

    /// Also print `"\r<percent>%"` to `out` whenever the integer percent
    /// changes.
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = Some(out);
        self
    }

    /// Print to stderr.
    pub fn to_stderr(self) -> Self {
        self.with_output(Box::new(std::io::stderr()))
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Mark the run complete.
    pub fn finish(&mut self) {
        self.processed = self.total;
        self.percent = 100.0;
        self.print();
    }

    fn print(&mut self) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        let whole = self.percent as u32;
        if self.printed != Some(whole) {
            self.printed = Some(whole);
            // write errors on the progress stream are ignored
            let _ = write!(out, "\r{}%", whole);
            let _ = out.flush();
        }
    }
}

impl StatusSink for Progress {
    fn update_status(&mut self, numbers_processed: u64) {
        self.processed = self.processed.saturating_add(numbers_processed);
        self.percent = (self.processed as f64 / self.total as f64 * 100.0).min(100.0);
        self.print();
    }
}
