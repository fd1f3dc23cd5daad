use crate::properties::{Properties, PropertiesError};
use std::path::{Path, PathBuf};

pub const RECENT_CAPACITY: usize = 5;

/// A recently used file, split into its name and parent directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentEntry {
    pub name: String,
    pub path: String,
}

impl RecentEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Returns `None` for paths without a file name (e.g. `/` or `..`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let name = path.file_name()?.to_string_lossy().into_owned();
        let parent = path
            .parent()
            .map(|parent| parent.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(Self::new(name, parent))
    }

    pub fn full_path(&self) -> PathBuf {
        Path::new(&self.path).join(&self.name)
    }
}

/// Most-recent-first ring of [`RECENT_CAPACITY`] slots, persisted as
/// `name_1..name_5` / `path_1..path_5`.
///
/// Pushing a file that is already listed adds a second entry; the ring does
/// not deduplicate.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    slots: [Option<RecentEntry>; RECENT_CAPACITY],
    properties: Properties,
}

impl RecentFiles {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PropertiesError> {
        let properties = Properties::load(path)?;
        let slots = std::array::from_fn(|slot| {
            let name = properties.get(&name_key(slot))?;
            let path = properties.get(&path_key(slot))?;
            Some(RecentEntry::new(name, path))
        });
        Ok(Self { slots, properties })
    }

    /// Shift every entry down one slot, dropping the oldest, and store `entry`
    /// in the first slot. All slots are persisted; if that fails the ring is
    /// left as it was.
    pub fn push(&mut self, entry: RecentEntry) -> Result<(), PropertiesError> {
        let mut slots = self.slots.clone();
        slots.rotate_right(1);
        slots[0] = Some(entry);

        let mut properties = self.properties.clone();
        write_slots(&mut properties, &slots);
        properties.save()?;

        self.slots = slots;
        self.properties = properties;
        Ok(())
    }

    pub fn snapshot(&self) -> [Option<RecentEntry>; RECENT_CAPACITY] {
        self.slots.clone()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RecentEntry> {
        self.slots.iter().flatten()
    }
}

fn write_slots(properties: &mut Properties, slots: &[Option<RecentEntry>]) {
    for (slot, entry) in slots.iter().enumerate() {
        match entry {
            Some(entry) => {
                properties.set(name_key(slot), entry.name.clone());
                properties.set(path_key(slot), entry.path.clone());
            }
            None => {
                properties.remove(&name_key(slot));
                properties.remove(&path_key(slot));
            }
        }
    }
}

fn name_key(slot: usize) -> String {
    format!("name_{}", slot + 1)
}

fn path_key(slot: usize) -> String {
    format!("path_{}", slot + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn entry(idx: usize) -> RecentEntry {
        RecentEntry::new(format!("file{idx}.txt"), format!("/work/dir{idx}"))
    }

    #[test]
    fn keeps_five_most_recent_first() {
        let dir = tempdir().unwrap();
        let mut recent = RecentFiles::load(dir.path().join("recent.properties")).unwrap();
        for idx in 1..=6 {
            recent.push(entry(idx)).unwrap();
        }

        let snapshot = recent.snapshot();
        let expected: Vec<_> = (2..=6).rev().map(|idx| Some(entry(idx))).collect();
        assert_eq!(snapshot.to_vec(), expected);
        assert!(!recent.entries().any(|item| *item == entry(1)));
    }

    #[test]
    fn persists_slots_as_flat_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recent.properties");
        let mut recent = RecentFiles::load(&path).unwrap();
        recent.push(entry(1)).unwrap();
        recent.push(entry(2)).unwrap();

        let props = Properties::load(&path).unwrap();
        assert_eq!(props.get("name_1"), Some("file2.txt"));
        assert_eq!(props.get("path_1"), Some("/work/dir2"));
        assert_eq!(props.get("name_2"), Some("file1.txt"));
        assert_eq!(props.get("name_3"), None);

        let reloaded = RecentFiles::load(&path).unwrap();
        assert_eq!(reloaded.snapshot(), recent.snapshot());
    }

    #[test]
    fn failed_write_leaves_ring_untouched() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config");
        let mut recent = RecentFiles::load(config.join("recent.properties")).unwrap();
        fs::write(&config, "").unwrap();

        assert!(recent.push(entry(1)).is_err());
        assert_eq!(recent.entries().count(), 0);

        fs::remove_file(&config).unwrap();
        recent.push(entry(2)).unwrap();
        let names: Vec<_> = recent.entries().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["file2.txt".to_string()]);
    }

    #[test]
    fn duplicates_are_kept() {
        let dir = tempdir().unwrap();
        let mut recent = RecentFiles::load(dir.path().join("recent.properties")).unwrap();
        recent.push(entry(1)).unwrap();
        recent.push(entry(2)).unwrap();
        recent.push(entry(1)).unwrap();

        let names: Vec<_> = recent.entries().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["file1.txt", "file2.txt", "file1.txt"]);
    }

    #[test]
    fn entry_from_path_splits_name_and_parent() {
        let entry = RecentEntry::from_path("/home/user/notes/todo.md").unwrap();
        assert_eq!(entry.name, "todo.md");
        assert_eq!(entry.path, "/home/user/notes");
        assert_eq!(entry.full_path(), PathBuf::from("/home/user/notes/todo.md"));
        assert!(RecentEntry::from_path("/").is_none());
    }
}
