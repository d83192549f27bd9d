//! Stable file identity derived from tree position
//!
//! A `FileId` is the slash-joined path of a file within a specific template
//! snapshot ("src/index.ts"). The path string is the identity: two
//! structurally distinct nodes with the same path compare equal, so a buffer
//! opened for a logical path still matches after the tree object has been
//! rebuilt. Renaming or moving an ancestor changes descendants' ids.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::template::{join_path, TemplateFile, TemplateFolder, TemplateItem};

/// Deterministic identifier for a file: its full path in a template snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Build an id from a parent folder path and the file's name parts.
    pub fn from_parts(parent_path: &str, filename: &str, extension: &str) -> Self {
        let full_name = if extension.is_empty() {
            filename.to_string()
        } else {
            format!("{}.{}", filename, extension)
        };
        Self(join_path(parent_path, &full_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this file lives under the given folder path (or is exactly
    /// that path, which cannot happen for a well-formed file id but keeps the
    /// check segment-aware rather than a raw prefix match).
    pub fn is_under(&self, folder_path: &str) -> bool {
        self.0 == folder_path || self.0.starts_with(&format!("{}/", folder_path))
    }

    /// Re-root an id after an ancestor folder changed path. Returns the same
    /// id when it is not under `old_prefix`.
    pub fn rebase(&self, old_prefix: &str, new_prefix: &str) -> FileId {
        if self.is_under(old_prefix) {
            FileId(format!("{}{}", new_prefix, &self.0[old_prefix.len()..]))
        } else {
            self.clone()
        }
    }

    /// Compute the id of a file by locating it in the tree.
    ///
    /// The walk is pure and deterministic: the same file value in the same
    /// tree value always yields the same id. Returns `None` when no matching
    /// file exists in the tree. When several files compare equal (same name,
    /// extension and content in different folders) the first in traversal
    /// order wins.
    pub fn resolve(file: &TemplateFile, root: &TemplateFolder) -> Option<FileId> {
        fn walk(folder: &TemplateFolder, prefix: &str, target: &TemplateFile) -> Option<String> {
            for item in &folder.items {
                match item {
                    TemplateItem::File(candidate) if candidate == target => {
                        return Some(join_path(prefix, &candidate.full_name()));
                    }
                    TemplateItem::Folder(child) => {
                        let child_prefix = join_path(prefix, &child.folder_name);
                        if let Some(path) = walk(child, &child_prefix, target) {
                            return Some(path);
                        }
                    }
                    TemplateItem::File(_) => {}
                }
            }
            None
        }
        walk(root, "", file).map(FileId)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> TemplateFolder {
        let mut root = TemplateFolder::new("root");
        let mut src = TemplateFolder::new("src");
        let mut components = TemplateFolder::new("components");
        components.items.push(TemplateItem::File(TemplateFile::new(
            "button", "tsx", "<b/>",
        )));
        src.items.push(TemplateItem::Folder(components));
        src.items
            .push(TemplateItem::File(TemplateFile::new("index", "ts", "a")));
        root.items.push(TemplateItem::Folder(src));
        root
    }

    #[test]
    fn test_resolve_nested_file() {
        let root = sample_root();
        let file = root.find_file("src/components/button.tsx").unwrap();
        let id = FileId::resolve(file, &root).unwrap();
        assert_eq!(id.as_str(), "src/components/button.tsx");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let root = sample_root();
        let file = root.find_file("src/index.ts").unwrap();
        let first = FileId::resolve(file, &root).unwrap();
        let second = FileId::resolve(&file.clone(), &root.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_missing_file() {
        let root = sample_root();
        let stranger = TemplateFile::new("ghost", "ts", "");
        assert!(FileId::resolve(&stranger, &root).is_none());
    }

    #[test]
    fn test_path_is_identity_across_rebuilds() {
        let root = sample_root();
        let rebuilt = root.clone();
        let a = FileId::resolve(root.find_file("src/index.ts").unwrap(), &root).unwrap();
        let b = FileId::resolve(rebuilt.find_file("src/index.ts").unwrap(), &rebuilt).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            FileId::from_parts("src", "index", "ts").as_str(),
            "src/index.ts"
        );
        assert_eq!(FileId::from_parts("", "package", "json").as_str(), "package.json");
        assert_eq!(FileId::from_parts("", "Makefile", "").as_str(), "Makefile");
    }

    #[test]
    fn test_is_under_is_segment_aware() {
        let id = FileId::new("src/index.ts");
        assert!(id.is_under("src"));
        assert!(!id.is_under("sr"));
        assert!(!FileId::new("srcdir/index.ts").is_under("src"));
    }

    #[test]
    fn test_rebase() {
        let id = FileId::new("src/components/button.tsx");
        let moved = id.rebase("src", "source");
        assert_eq!(moved.as_str(), "source/components/button.tsx");
        let untouched = id.rebase("lib", "libs");
        assert_eq!(untouched, id);
    }
}
