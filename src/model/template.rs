//! Project template tree
//!
//! A playground project is a tree of files and folders. The wire format is
//! the template JSON produced by the original path-to-json exporter:
//! folders carry `folderName` and `items`, files carry `filename`,
//! `fileExtension` and `content`. Items are distinguished by field shape,
//! not by a tag.
//!
//! The tree is plain data. Callers that want speculative mutation clone the
//! tree, apply an operation, and commit or drop the clone; no operation here
//! ever touches more than the tree it is called on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors from structural tree operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The parent folder path did not resolve to a folder
    ParentNotFound(String),
    /// A sibling with the same name already exists in the target folder
    NameExists(String),
    /// The named file or folder was not found in its parent
    NotFound(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::ParentNotFound(path) => write!(f, "parent folder not found: {}", path),
            TreeError::NameExists(name) => write!(f, "name already exists in folder: {}", name),
            TreeError::NotFound(name) => write!(f, "not found: {}", name),
        }
    }
}

impl std::error::Error for TreeError {}

/// A single file in the template tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFile {
    pub filename: String,
    pub file_extension: String,
    #[serde(default)]
    pub content: String,
}

impl TemplateFile {
    pub fn new(
        filename: impl Into<String>,
        file_extension: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            file_extension: file_extension.into(),
            content: content.into(),
        }
    }

    /// Display name including the extension, or just the name when the
    /// extension is empty (e.g. `Makefile`).
    pub fn full_name(&self) -> String {
        if self.file_extension.is_empty() {
            self.filename.clone()
        } else {
            format!("{}.{}", self.filename, self.file_extension)
        }
    }

    fn same_name(&self, filename: &str, extension: &str) -> bool {
        self.filename == filename && self.file_extension == extension
    }
}

/// A folder in the template tree; child order is display and traversal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFolder {
    pub folder_name: String,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

/// File-or-folder union, distinguished by field shape on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateItem {
    Folder(TemplateFolder),
    File(TemplateFile),
}

impl TemplateItem {
    pub fn as_file(&self) -> Option<&TemplateFile> {
        match self {
            TemplateItem::File(file) => Some(file),
            TemplateItem::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&TemplateFolder> {
        match self {
            TemplateItem::Folder(folder) => Some(folder),
            TemplateItem::File(_) => None,
        }
    }

    /// Name used for sibling-uniqueness checks
    fn display_name(&self) -> String {
        match self {
            TemplateItem::File(file) => file.full_name(),
            TemplateItem::Folder(folder) => folder.folder_name.clone(),
        }
    }
}

/// Split a slash-separated folder path into segments, skipping empties so
/// `"src/app"`, `"/src/app/"` and `""` (the root) all normalize consistently.
pub(crate) fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Join a parent folder path and a child name into a slash-separated path.
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    let segments = path_segments(parent);
    if segments.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", segments.join("/"), name)
    }
}

impl TemplateFolder {
    /// Create an empty folder
    pub fn new(folder_name: impl Into<String>) -> Self {
        Self {
            folder_name: folder_name.into(),
            items: Vec::new(),
        }
    }

    /// Find a descendant folder by slash-separated path. The empty path is
    /// this folder itself. Missing segments resolve to `None`, never panic.
    pub fn find_folder(&self, path: &str) -> Option<&TemplateFolder> {
        let mut current = self;
        for segment in path_segments(path) {
            current = current.items.iter().find_map(|item| match item {
                TemplateItem::Folder(folder) if folder.folder_name == segment => Some(folder),
                _ => None,
            })?;
        }
        Some(current)
    }

    fn find_folder_mut(&mut self, path: &str) -> Option<&mut TemplateFolder> {
        let mut current = self;
        for segment in path_segments(path) {
            current = current.items.iter_mut().find_map(|item| match item {
                TemplateItem::Folder(folder) if folder.folder_name == segment => Some(folder),
                _ => None,
            })?;
        }
        Some(current)
    }

    /// Find a file by its full path ("src/index.ts"). The last segment is the
    /// file's full name, everything before it a folder path.
    pub fn find_file(&self, path: &str) -> Option<&TemplateFile> {
        let mut segments = path_segments(path);
        let full_name = segments.pop()?;
        let parent = self.find_folder(&segments.join("/"))?;
        parent.items.iter().find_map(|item| match item {
            TemplateItem::File(file) if file.full_name() == full_name => Some(file),
            _ => None,
        })
    }

    pub fn find_file_mut(&mut self, path: &str) -> Option<&mut TemplateFile> {
        let mut segments = path_segments(path);
        let full_name = segments.pop()?;
        let parent = self.find_folder_mut(&segments.join("/"))?;
        parent.items.iter_mut().find_map(|item| match item {
            TemplateItem::File(file) if file.full_name() == full_name => Some(file),
            _ => None,
        })
    }

    /// Insert a file or folder under the folder at `parent_path`.
    ///
    /// # Errors
    ///
    /// `ParentNotFound` if the path does not resolve, `NameExists` if a
    /// sibling already uses the same name.
    pub fn insert_item(&mut self, parent_path: &str, item: TemplateItem) -> Result<(), TreeError> {
        let name = item.display_name();
        let parent = self
            .find_folder_mut(parent_path)
            .ok_or_else(|| TreeError::ParentNotFound(parent_path.to_string()))?;
        if parent
            .items
            .iter()
            .any(|existing| existing.display_name() == name)
        {
            return Err(TreeError::NameExists(name));
        }
        parent.items.push(item);
        Ok(())
    }

    /// Remove a file from the folder at `parent_path`, returning it.
    pub fn remove_file(
        &mut self,
        parent_path: &str,
        filename: &str,
        extension: &str,
    ) -> Result<TemplateFile, TreeError> {
        let parent = self
            .find_folder_mut(parent_path)
            .ok_or_else(|| TreeError::ParentNotFound(parent_path.to_string()))?;
        let index = parent
            .items
            .iter()
            .position(|item| matches!(item, TemplateItem::File(f) if f.same_name(filename, extension)))
            .ok_or_else(|| TreeError::NotFound(join_path(parent_path, filename)))?;
        match parent.items.remove(index) {
            TemplateItem::File(file) => Ok(file),
            TemplateItem::Folder(_) => unreachable!("position matched a file"),
        }
    }

    /// Remove a folder (and its whole subtree) from `parent_path`.
    pub fn remove_folder(
        &mut self,
        parent_path: &str,
        folder_name: &str,
    ) -> Result<TemplateFolder, TreeError> {
        let parent = self
            .find_folder_mut(parent_path)
            .ok_or_else(|| TreeError::ParentNotFound(parent_path.to_string()))?;
        let index = parent
            .items
            .iter()
            .position(
                |item| matches!(item, TemplateItem::Folder(f) if f.folder_name == folder_name),
            )
            .ok_or_else(|| TreeError::NotFound(join_path(parent_path, folder_name)))?;
        match parent.items.remove(index) {
            TemplateItem::Folder(folder) => Ok(folder),
            TemplateItem::File(_) => unreachable!("position matched a folder"),
        }
    }

    /// Rename a file in place, keeping its content and position.
    pub fn rename_file(
        &mut self,
        parent_path: &str,
        old_name: &str,
        old_extension: &str,
        new_name: &str,
        new_extension: &str,
    ) -> Result<(), TreeError> {
        let parent = self
            .find_folder_mut(parent_path)
            .ok_or_else(|| TreeError::ParentNotFound(parent_path.to_string()))?;
        let taken = parent.items.iter().any(
            |item| matches!(item, TemplateItem::File(f) if f.same_name(new_name, new_extension)),
        );
        if taken {
            return Err(TreeError::NameExists(format!(
                "{}.{}",
                new_name, new_extension
            )));
        }
        let file = parent
            .items
            .iter_mut()
            .find_map(|item| match item {
                TemplateItem::File(f) if f.same_name(old_name, old_extension) => Some(f),
                _ => None,
            })
            .ok_or_else(|| TreeError::NotFound(join_path(parent_path, old_name)))?;
        file.filename = new_name.to_string();
        file.file_extension = new_extension.to_string();
        Ok(())
    }

    /// Rename a folder in place, keeping its subtree and position.
    pub fn rename_folder(
        &mut self,
        parent_path: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), TreeError> {
        let parent = self
            .find_folder_mut(parent_path)
            .ok_or_else(|| TreeError::ParentNotFound(parent_path.to_string()))?;
        let taken = parent
            .items
            .iter()
            .any(|item| matches!(item, TemplateItem::Folder(f) if f.folder_name == new_name));
        if taken {
            return Err(TreeError::NameExists(new_name.to_string()));
        }
        let folder = parent
            .items
            .iter_mut()
            .find_map(|item| match item {
                TemplateItem::Folder(f) if f.folder_name == old_name => Some(f),
                _ => None,
            })
            .ok_or_else(|| TreeError::NotFound(join_path(parent_path, old_name)))?;
        folder.folder_name = new_name.to_string();
        Ok(())
    }

    /// All files in the tree with their full paths, in traversal order.
    pub fn files(&self) -> Vec<(String, &TemplateFile)> {
        let mut out = Vec::new();
        self.collect_files("", &mut out);
        out
    }

    fn collect_files<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a TemplateFile)>) {
        for item in &self.items {
            match item {
                TemplateItem::File(file) => {
                    out.push((join_path(prefix, &file.full_name()), file));
                }
                TemplateItem::Folder(folder) => {
                    let child_prefix = join_path(prefix, &folder.folder_name);
                    folder.collect_files(&child_prefix, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> TemplateFolder {
        let mut root = TemplateFolder::new("root");
        let mut src = TemplateFolder::new("src");
        src.items
            .push(TemplateItem::File(TemplateFile::new("index", "ts", "a")));
        src.items
            .push(TemplateItem::File(TemplateFile::new("app", "ts", "b")));
        root.items.push(TemplateItem::Folder(src));
        root.items.push(TemplateItem::File(TemplateFile::new(
            "package",
            "json",
            "{}",
        )));
        root
    }

    #[test]
    fn test_find_folder() {
        let root = sample_root();
        assert!(root.find_folder("src").is_some());
        assert!(root.find_folder("").is_some());
        assert!(root.find_folder("/src/").is_some());
        assert!(root.find_folder("missing").is_none());
        assert!(root.find_folder("src/missing").is_none());
    }

    #[test]
    fn test_find_file() {
        let root = sample_root();
        assert_eq!(root.find_file("src/index.ts").unwrap().content, "a");
        assert_eq!(root.find_file("package.json").unwrap().content, "{}");
        assert!(root.find_file("src/missing.ts").is_none());
        assert!(root.find_file("missing/index.ts").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_sibling() {
        let mut root = sample_root();
        let dup = TemplateItem::File(TemplateFile::new("index", "ts", ""));
        assert!(matches!(
            root.insert_item("src", dup),
            Err(TreeError::NameExists(_))
        ));
        // Same base name with a different extension is a different sibling
        let other = TemplateItem::File(TemplateFile::new("index", "css", ""));
        assert!(root.insert_item("src", other).is_ok());
    }

    #[test]
    fn test_insert_into_missing_parent() {
        let mut root = sample_root();
        let file = TemplateItem::File(TemplateFile::new("x", "ts", ""));
        assert!(matches!(
            root.insert_item("no/such/folder", file),
            Err(TreeError::ParentNotFound(_))
        ));
    }

    #[test]
    fn test_remove_file() {
        let mut root = sample_root();
        let removed = root.remove_file("src", "index", "ts").unwrap();
        assert_eq!(removed.content, "a");
        assert!(root.find_file("src/index.ts").is_none());
        assert!(matches!(
            root.remove_file("src", "index", "ts"),
            Err(TreeError::NotFound(_))
        ));
    }

    #[test]
    fn test_rename_file_keeps_content() {
        let mut root = sample_root();
        root.rename_file("src", "index", "ts", "main", "tsx").unwrap();
        assert!(root.find_file("src/index.ts").is_none());
        assert_eq!(root.find_file("src/main.tsx").unwrap().content, "a");
    }

    #[test]
    fn test_rename_file_collision() {
        let mut root = sample_root();
        assert!(matches!(
            root.rename_file("src", "index", "ts", "app", "ts"),
            Err(TreeError::NameExists(_))
        ));
    }

    #[test]
    fn test_rename_folder() {
        let mut root = sample_root();
        root.rename_folder("", "src", "source").unwrap();
        assert!(root.find_folder("src").is_none());
        assert_eq!(root.find_file("source/index.ts").unwrap().content, "a");
    }

    #[test]
    fn test_remove_folder_takes_subtree() {
        let mut root = sample_root();
        let folder = root.remove_folder("", "src").unwrap();
        assert_eq!(folder.items.len(), 2);
        assert!(root.find_folder("src").is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let root = sample_root();
        let mut copy = root.clone();
        copy.remove_file("src", "index", "ts").unwrap();
        copy.find_file_mut("src/app.ts").unwrap().content = "changed".to_string();
        // The original is untouched; a dropped clone is a free rollback.
        assert_eq!(root.find_file("src/index.ts").unwrap().content, "a");
        assert_eq!(root.find_file("src/app.ts").unwrap().content, "b");
    }

    #[test]
    fn test_files_traversal() {
        let root = sample_root();
        let paths: Vec<String> = root.files().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["src/index.ts", "src/app.ts", "package.json"]);
    }

    #[test]
    fn test_wire_format_round_trip() {
        let root = sample_root();
        let json = serde_json::to_string(&root).unwrap();
        // camelCase field names, untagged items
        assert!(json.contains("\"folderName\":\"src\""));
        assert!(json.contains("\"fileExtension\":\"ts\""));
        let parsed: TemplateFolder = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn test_deserialize_original_template_json() {
        // Shape produced by the original exporter
        let json = r#"{
            "folderName": "root",
            "items": [
                { "folderName": "src", "items": [
                    { "filename": "index", "fileExtension": "ts", "content": "x" }
                ]},
                { "filename": "README", "fileExtension": "md", "content": "" }
            ]
        }"#;
        let root: TemplateFolder = serde_json::from_str(json).unwrap();
        assert_eq!(root.find_file("src/index.ts").unwrap().content, "x");
        assert!(root.find_file("README.md").is_some());
    }

    #[test]
    fn test_file_full_name_without_extension() {
        let file = TemplateFile::new("Makefile", "", "all:");
        assert_eq!(file.full_name(), "Makefile");
    }
}
