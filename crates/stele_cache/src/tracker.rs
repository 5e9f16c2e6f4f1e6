//! Dependency recording.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Receives the path of every file a load consults.
///
/// The loader reports the interface, any prebuilt binary module it inspects,
/// and the cache artifact it reads or writes. It never reads back.
pub trait DependencyTracker: Send + Sync {
    /// Records that `path` was consulted.
    fn record(&self, path: &Path);
}

/// A tracker that keeps the recorded paths in first-seen order.
#[derive(Debug, Default)]
pub struct FileListTracker {
    files: Mutex<Vec<PathBuf>>,
}

impl FileListTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded paths without duplicates.
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().clone()
    }

    /// Renders a make-style dependency rule for `target`.
    pub fn render_make_deps(&self, target: &Path) -> String {
        let mut out = escape_make(target);
        out.push(':');
        for file in self.files.lock().iter() {
            out.push_str(" \\\n  ");
            out.push_str(&escape_make(file));
        }
        out.push('\n');
        out
    }
}

impl DependencyTracker for FileListTracker {
    fn record(&self, path: &Path) {
        let mut files = self.files.lock();
        if !files.iter().any(|p| p == path) {
            files.push(path.to_path_buf());
        }
    }
}

fn escape_make(path: &Path) -> String {
    let mut out = String::new();
    for c in path.to_string_lossy().chars() {
        match c {
            ' ' => out.push_str("\\ "),
            '#' => out.push_str("\\#"),
            '$' => out.push_str("$$"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_without_duplicates() {
        let tracker = FileListTracker::new();
        tracker.record(Path::new("b.swiftinterface"));
        tracker.record(Path::new("a.swiftmodule"));
        tracker.record(Path::new("b.swiftinterface"));
        assert_eq!(
            tracker.files(),
            vec![PathBuf::from("b.swiftinterface"), PathBuf::from("a.swiftmodule")]
        );
    }

    #[test]
    fn make_deps_escapes_specials() {
        let tracker = FileListTracker::new();
        tracker.record(Path::new("my dir/M.swiftinterface"));
        tracker.record(Path::new("cost$.swiftmodule"));
        let rule = tracker.render_make_deps(Path::new("out.d"));
        assert_eq!(
            rule,
            "out.d: \\\n  my\\ dir/M.swiftinterface \\\n  cost$$.swiftmodule\n"
        );
    }

    #[test]
    fn works_as_trait_object() {
        let tracker = FileListTracker::new();
        let dyn_tracker: &dyn DependencyTracker = &tracker;
        dyn_tracker.record(Path::new("x"));
        assert_eq!(tracker.files().len(), 1);
    }
}
