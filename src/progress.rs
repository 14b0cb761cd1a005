//! Progress reporting for directory uploads.

/// Progress of a multi-file upload, counted in files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    /// Files finished so far, failed ones included
    pub done: u64,
    /// Files in the batch
    pub total: u64,
    /// Relative path of the file that just finished
    pub filename: String,
}

impl TransferProgress {
    pub fn new(done: u64, total: u64, filename: impl Into<String>) -> Self {
        Self {
            done,
            total,
            filename: filename.into(),
        }
    }

    /// Progress as a percentage (0.0 to 100.0). An empty batch reports 100.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Called after each file of a batch finishes.
///
/// Return `false` to stop the batch; files not yet started are skipped.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) -> bool + Send>;

/// Callback that prints one line per finished file to stderr.
///
/// # Example
/// ```no_run
/// use hfsapi::progress::make_progress_printer;
///
/// let callback = make_progress_printer();
/// ```
pub fn make_progress_printer() -> ProgressCallback {
    Box::new(|progress: &TransferProgress| {
        eprintln!(
            "[{}/{}] {:5.1}% {}",
            progress.done,
            progress.total,
            progress.percent(),
            progress.filename
        );
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(TransferProgress::new(1, 4, "a").percent(), 25.0);
        assert_eq!(TransferProgress::new(0, 0, "").percent(), 100.0);
        assert!(TransferProgress::new(2, 2, "b").is_complete());
        assert!(!TransferProgress::new(1, 2, "b").is_complete());
    }
}
