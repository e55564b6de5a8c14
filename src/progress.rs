use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporting for a scrape. Called from worker threads, hence `&self`.
pub trait Progress: Sync {
    /// Called once with the number of work units.
    fn begin(&self, _total: usize) {}

    /// Called when one work unit has finished.
    fn item_done(&self, _code: &str) {}

    fn finish(&self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Terminal progress bar on stderr.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:60} {pos:>7}/{len:7} [{elapsed_precise}] [{eta}] {msg}")
        {
            bar.set_style(style);
        }
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for BarProgress {
    fn begin(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn item_done(&self, code: &str) {
        self.bar.set_message(code.to_string());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
