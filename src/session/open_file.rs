//! Open editor buffers
//!
//! An `OpenFile` is an editable copy of a template file, tracked separately
//! from the tree it came from. `content` is what the editor shows,
//! `original_content` the bytes at the last successful load or save, and
//! `has_unsaved_changes` a cached comparison of the two that every content
//! mutation must keep in sync.

use crate::model::{FileId, TemplateFile};

/// One open, editable file buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    /// Path-derived identity within the session's template
    pub id: FileId,
    /// Snapshot of the file's metadata at open time (kept current on rename)
    pub file: TemplateFile,
    /// Current, possibly edited content
    pub content: String,
    /// Content at the last successful load or save
    pub original_content: String,
    /// Cached `content != original_content`
    pub has_unsaved_changes: bool,
}

impl OpenFile {
    /// Create a clean buffer for a freshly opened file.
    pub fn new(id: FileId, file: &TemplateFile) -> Self {
        Self {
            id,
            file: file.clone(),
            content: file.content.clone(),
            original_content: file.content.clone(),
            has_unsaved_changes: false,
        }
    }

    /// Replace the buffer content and recompute the dirty flag.
    pub fn set_content(&mut self, content: String) {
        self.has_unsaved_changes = content != self.original_content;
        self.content = content;
    }

    /// Mark the current content as saved.
    pub fn mark_saved(&mut self) {
        self.original_content = self.content.clone();
        self.has_unsaved_changes = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> OpenFile {
        let file = TemplateFile::new("index", "ts", "a");
        OpenFile::new(FileId::new("src/index.ts"), &file)
    }

    #[test]
    fn test_new_buffer_is_clean() {
        let b = buffer();
        assert_eq!(b.content, "a");
        assert_eq!(b.original_content, "a");
        assert!(!b.has_unsaved_changes);
    }

    #[test]
    fn test_edit_sets_dirty() {
        let mut b = buffer();
        b.set_content("b".to_string());
        assert!(b.has_unsaved_changes);
    }

    #[test]
    fn test_edit_back_to_original_clears_dirty() {
        let mut b = buffer();
        b.set_content("b".to_string());
        b.set_content("a".to_string());
        assert!(!b.has_unsaved_changes);
    }

    #[test]
    fn test_mark_saved() {
        let mut b = buffer();
        b.set_content("b".to_string());
        b.mark_saved();
        assert!(!b.has_unsaved_changes);
        assert_eq!(b.original_content, "b");
    }
}
