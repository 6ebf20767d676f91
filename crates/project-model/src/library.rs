//! Media library: imported sources, deduplicated by path.

use std::path::{Path, PathBuf};

use crate::clip::{file_name, Thumbnail, VideoMetadata};

/// One imported source file.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItem {
    pub file_path: PathBuf,
    pub name: String,
    pub duration: f64,
    pub thumbnail: Option<Thumbnail>,
    pub metadata: Option<VideoMetadata>,
}

impl LibraryItem {
    pub fn new(file_path: impl Into<PathBuf>, duration: f64) -> Self {
        let file_path = file_path.into();
        Self {
            name: file_name(&file_path),
            file_path,
            duration,
            thumbnail: None,
            metadata: None,
        }
    }
}

/// Ordered collection of library items with at most one entry per path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    items: Vec<LibraryItem>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item. Returns false if its path is already present.
    pub fn add(&mut self, item: LibraryItem) -> bool {
        if self.contains(&item.file_path) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, path: &Path) -> Option<LibraryItem> {
        let index = self.items.iter().position(|i| i.file_path == path)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, path: &Path) -> Option<&LibraryItem> {
        self.items.iter().find(|i| i.file_path == path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn items(&self) -> &[LibraryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<LibraryItem> for Library {
    fn from_iter<I: IntoIterator<Item = LibraryItem>>(iter: I) -> Self {
        let mut library = Library::new();
        for item in iter {
            library.add(item);
        }
        library
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_by_path() {
        let mut library = Library::new();
        assert!(library.add(LibraryItem::new("/a.mp4", 3.0)));
        assert!(!library.add(LibraryItem::new("/a.mp4", 9.0)));
        assert_eq!(library.len(), 1);
        assert_eq!(library.get(Path::new("/a.mp4")).unwrap().duration, 3.0);
    }

    #[test]
    fn test_remove() {
        let mut library: Library = [LibraryItem::new("/a.mp4", 1.0), LibraryItem::new("/b.mp4", 2.0)]
            .into_iter()
            .collect();
        let removed = library.remove(Path::new("/a.mp4")).unwrap();
        assert_eq!(removed.name, "a.mp4");
        assert!(library.remove(Path::new("/a.mp4")).is_none());
        assert_eq!(library.len(), 1);
    }
}
