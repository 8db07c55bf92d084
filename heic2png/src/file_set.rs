//! File Set Manager
//!
//! The ordered, de-duplicated collection of input paths a conversion run
//! operates on. Entry identity is the normalized (canonicalized when
//! possible) path, so the same file reached through different spellings
//! counts once. Insertion order is preserved and is the order jobs are
//! later submitted in.

use shared_utils::{collect_heic_files, has_extension, HEIC_EXTENSIONS};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[derive(Debug, Default)]
pub struct FileSet {
    entries: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add files and/or directories.
    ///
    /// Directories are scanned recursively for `.heic` files
    /// (case-insensitive); `.heic` paths are candidates directly; anything
    /// else is ignored. Candidates already in the set are skipped silently.
    /// Returns the number of genuinely new entries, appended in discovery
    /// order.
    pub fn add(&mut self, paths: &[PathBuf]) -> usize {
        let mut added = 0;
        for path in paths {
            if path.is_dir() {
                for candidate in collect_heic_files(path) {
                    if self.insert(candidate) {
                        added += 1;
                    }
                }
            } else if has_extension(path, HEIC_EXTENSIONS) && self.insert(path.clone()) {
                added += 1;
            }
        }
        added
    }

    fn insert(&mut self, path: PathBuf) -> bool {
        if self.seen.insert(normalize(&path)) {
            self.entries.push(path);
            true
        } else {
            false
        }
    }

    /// Remove every entry whose identity is in `identities`.
    ///
    /// All removals apply in one pass over stable identities, so a
    /// multi-entry selection never leaves the set half-updated and the
    /// order of the remainder is untouched. Unknown identities are no-ops.
    pub fn remove(&mut self, identities: &HashSet<PathBuf>) {
        if identities.is_empty() {
            return;
        }
        let doomed: HashSet<PathBuf> = identities.iter().map(|p| normalize(p)).collect();
        self.entries.retain(|p| !doomed.contains(&normalize(p)));
        self.seen.retain(|id| !doomed.contains(id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    /// Entries in insertion order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"heic-bytes").unwrap();
    }

    #[test]
    fn test_add_directory_scenario() {
        // /dir with x.HEIC, y.heic, z.txt; y.heic also passed directly.
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("x.HEIC"));
        touch(&dir.path().join("y.heic"));
        touch(&dir.path().join("z.txt"));

        let mut set = FileSet::new();
        let added = set.add(&[dir.path().to_path_buf(), dir.path().join("y.heic")]);

        assert_eq!(added, 2);
        assert_eq!(set.len(), 2);
        assert!(set.paths()[0].ends_with("x.HEIC"));
        assert!(set.paths()[1].ends_with("y.heic"));
    }

    #[test]
    fn test_add_skips_duplicates_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.heic");
        touch(&file);

        let mut set = FileSet::new();
        assert_eq!(set.add(&[file.clone()]), 1);
        assert_eq!(set.add(&[file.clone()]), 0);
        assert_eq!(set.add(&[dir.path().to_path_buf()]), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_add_ignores_non_heic() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        touch(&txt);

        let mut set = FileSet::new();
        assert_eq!(set.add(&[txt]), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_preserves_remainder_order() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = ["a.heic", "b.heic", "c.heic", "d.heic"]
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                touch(&p);
                p
            })
            .collect();

        let mut set = FileSet::new();
        assert_eq!(set.add(&files), 4);

        let doomed: HashSet<PathBuf> = [files[1].clone(), files[3].clone()].into();
        set.remove(&doomed);

        assert_eq!(set.len(), 2);
        assert!(set.paths()[0].ends_with("a.heic"));
        assert!(set.paths()[1].ends_with("c.heic"));

        // removed entries can be re-added
        assert_eq!(set.add(&files), 2);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_remove_unknown_identity_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.heic");
        touch(&file);

        let mut set = FileSet::new();
        set.add(&[file]);

        let doomed: HashSet<PathBuf> = [dir.path().join("ghost.heic")].into();
        set.remove(&doomed);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.heic");
        touch(&file);

        let mut set = FileSet::new();
        set.add(&[file.clone()]);
        set.clear();
        assert!(set.is_empty());

        // cleared identities are addable again
        assert_eq!(set.add(&[file]), 1);
    }

    #[test]
    fn test_same_file_through_different_spellings() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.heic");
        touch(&file);
        let dotted = dir.path().join(".").join("a.heic");

        let mut set = FileSet::new();
        assert_eq!(set.add(&[file, dotted]), 1);
        assert_eq!(set.len(), 1);
    }
}
