use std::path::Path;

use crate::error::ExtractError;

/// Progress and diagnostics interface the orchestration layer reports
/// through. The decode path itself never prints; anything user-visible goes
/// through an observer so callers (CLI, tests) decide what to do with it.
pub trait ExtractObserver: Send + Sync {
    fn file_started(&self, _path: &Path) {}
    fn file_finished(&self, _path: &Path, _objects: usize) {}
    fn file_failed(&self, _path: &Path, _error: &ExtractError) {}
    fn warning(&self, _message: &str) {}
}

/// Observer used by the CLI.
pub struct ConsoleObserver;

impl ExtractObserver for ConsoleObserver {
    fn file_started(&self, path: &Path) {
        println!("=> Processing {}...", path.display());
    }

    fn file_finished(&self, path: &Path, objects: usize) {
        println!("==> {}: wrote {} object(s)", path.display(), objects);
    }

    fn file_failed(&self, path: &Path, error: &ExtractError) {
        eprintln!("** {}: {}", path.display(), error);
    }

    fn warning(&self, message: &str) {
        println!("** {}", message);
    }
}

/// Observer that swallows everything.
pub struct SilentObserver;

impl ExtractObserver for SilentObserver {}
