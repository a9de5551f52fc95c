//! Progress-callback trait for batch runs.
//!
//! The folder drivers in [`crate::stages`] accept an optional
//! `&dyn BatchProgress` and report per-file events through it. A callback
//! is the least-invasive integration point: the CLI renders a terminal
//! progress bar, a host application could forward events to a channel or
//! a database, and the library knows nothing about either. All methods
//! default to no-ops so implementors only override what they care about.
//!
//! Batch processing is strictly sequential, so implementations are never
//! called concurrently; `Send + Sync` is still required so a callback can
//! be shared across stage invocations.

/// Receives per-file events as a batch run progresses.
pub trait BatchProgress: Send + Sync {
    /// Called once before the first file, with the number of files found.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is processed (1-indexed).
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a file was fully processed.
    fn on_file_processed(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a file was skipped (output already exists, analysis
    /// already present, …).
    fn on_file_skipped(&self, index: usize, total: usize, name: &str, reason: &str) {
        let _ = (index, total, name, reason);
    }

    /// Called when processing a file failed; the batch continues.
    fn on_file_failed(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after the last file.
    fn on_batch_complete(&self, processed: usize, skipped: usize, failed: usize) {
        let _ = (processed, skipped, failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl BatchProgress for Silent {}

    // Default methods must all be callable as no-ops.
    #[test]
    fn defaults_are_noops() {
        let cb: &dyn BatchProgress = &Silent;
        cb.on_batch_start(3);
        cb.on_file_start(1, 3, "a.txt");
        cb.on_file_processed(1, 3, "a.txt");
        cb.on_file_skipped(2, 3, "b.txt", "already analyzed");
        cb.on_file_failed(3, 3, "c.txt", "boom");
        cb.on_batch_complete(1, 1, 1);
    }
}
