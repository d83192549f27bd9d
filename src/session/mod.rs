//! Playground editor session
//!
//! `PlaygroundSession` is the state machine behind the editor UI: it owns the
//! live template tree, the open buffers with their dirty flags, and the
//! active-buffer selection, and it coordinates the persistence gateway and
//! the sandbox mirror so the preview sees the same bytes the editor holds.
//!
//! Sessions are explicitly constructed objects with a lifecycle tied to one
//! playground; nothing here is process-global, so multiple sessions (and
//! tests) can coexist.
//!
//! Consistency rules:
//! - Tree mutations are speculative: they run on a clone and commit only
//!   after the gateway accepted the new tree; on failure the previous tree
//!   stays in place and buffers are untouched.
//! - Buffer reconciliation (closing buffers of deleted files, re-keying
//!   buffers of renamed ones, cascading over folders) commits together with
//!   the successful persistence, never before.
//! - Mirror pushes are best-effort and happen after commit; a mirror failure
//!   is logged and recorded on the mirror, never rolled into session state.

pub mod open_file;

use std::fmt;
use std::sync::Arc;

use crate::model::template::join_path;
use crate::model::{FileId, TemplateFile, TemplateFolder, TemplateItem, TreeError};
use crate::services::persistence::{PersistError, PersistenceGateway};
use crate::services::sandbox::SandboxMirror;

pub use open_file::OpenFile;

/// Errors surfaced by session operations
#[derive(Debug, Clone)]
pub enum SessionError {
    /// The file handed to `open_file` does not exist in the current tree
    FileNotInTree(String),
    /// A structural tree operation failed
    Tree(TreeError),
    /// The persistence gateway rejected the save; state was rolled back
    Persist(PersistError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::FileNotInTree(name) => {
                write!(f, "file is not part of the current template: {}", name)
            }
            SessionError::Tree(e) => write!(f, "{}", e),
            SessionError::Persist(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TreeError> for SessionError {
    fn from(e: TreeError) -> Self {
        SessionError::Tree(e)
    }
}

impl From<PersistError> for SessionError {
    fn from(e: PersistError) -> Self {
        SessionError::Persist(e)
    }
}

/// Editor session for one playground
pub struct PlaygroundSession {
    playground_id: String,
    template: TemplateFolder,
    open_files: Vec<OpenFile>,
    active_file: Option<FileId>,
    /// Fast-path mirror of the active buffer's content for render loops
    editor_content: String,
    gateway: Arc<dyn PersistenceGateway>,
    mirror: Option<Arc<SandboxMirror>>,
}

impl PlaygroundSession {
    pub fn new(
        playground_id: impl Into<String>,
        template: TemplateFolder,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            playground_id: playground_id.into(),
            template,
            open_files: Vec::new(),
            active_file: None,
            editor_content: String::new(),
            gateway,
            mirror: None,
        }
    }

    /// Construct a session by loading its template from the gateway.
    pub async fn load(
        playground_id: impl Into<String>,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Result<Self, SessionError> {
        let playground_id = playground_id.into();
        let template = gateway.load_template(&playground_id).await?;
        tracing::debug!(playground = %playground_id, "session loaded");
        Ok(Self::new(playground_id, template, gateway))
    }

    /// Attach the sandbox mirror this session pushes edits into.
    pub fn attach_mirror(&mut self, mirror: Arc<SandboxMirror>) {
        self.mirror = Some(mirror);
    }

    pub fn playground_id(&self) -> &str {
        &self.playground_id
    }

    pub fn template(&self) -> &TemplateFolder {
        &self.template
    }

    /// Replace the whole tree (e.g. after an external reload). Open buffers
    /// keep their ids and contents; callers that change the structure are
    /// responsible for closing buffers that no longer apply.
    pub fn set_template(&mut self, template: TemplateFolder) {
        self.template = template;
    }

    pub fn open_files(&self) -> &[OpenFile] {
        &self.open_files
    }

    pub fn active_file(&self) -> Option<&FileId> {
        self.active_file.as_ref()
    }

    pub fn editor_content(&self) -> &str {
        &self.editor_content
    }

    /// Overwrite the scratch editor content without touching any buffer.
    pub fn set_editor_content(&mut self, content: impl Into<String>) {
        self.editor_content = content.into();
    }

    /// Look up an open buffer by id.
    pub fn buffer(&self, id: &FileId) -> Option<&OpenFile> {
        self.open_files.iter().find(|b| &b.id == id)
    }

    fn buffer_mut(&mut self, id: &FileId) -> Option<&mut OpenFile> {
        self.open_files.iter_mut().find(|b| &b.id == id)
    }

    /// Make an already-open buffer active. Unknown ids are ignored; `None`
    /// clears the selection.
    pub fn set_active_file(&mut self, id: Option<FileId>) {
        match id {
            None => {
                self.active_file = None;
                self.editor_content.clear();
            }
            Some(id) => match self.buffer(&id) {
                Some(buffer) => {
                    self.editor_content = buffer.content.clone();
                    self.active_file = Some(id);
                }
                None => {
                    tracing::warn!(file = %id, "ignoring activation of a file that is not open");
                }
            },
        }
    }

    /// Open a file from the current tree.
    ///
    /// Opening is idempotent per identity: if a buffer for the same path
    /// already exists it just becomes active, and its (possibly unsaved)
    /// content is kept.
    ///
    /// # Errors
    ///
    /// `FileNotInTree` when the file cannot be located in the current tree.
    pub fn open_file(&mut self, file: &TemplateFile) -> Result<FileId, SessionError> {
        let id = FileId::resolve(file, &self.template)
            .ok_or_else(|| SessionError::FileNotInTree(file.full_name()))?;

        if let Some(existing) = self.buffer(&id) {
            self.editor_content = existing.content.clone();
            self.active_file = Some(id.clone());
            return Ok(id);
        }

        let buffer = OpenFile::new(id.clone(), file);
        self.editor_content = buffer.content.clone();
        self.open_files.push(buffer);
        self.active_file = Some(id.clone());
        tracing::debug!(file = %id, "opened file");
        Ok(id)
    }

    /// Update a buffer's content (called on every keystroke). Recomputes the
    /// dirty flag; unknown ids are a no-op.
    pub fn update_buffer_content(&mut self, id: &FileId, content: impl Into<String>) {
        let content = content.into();
        let is_active = self.active_file.as_ref() == Some(id);
        match self.buffer_mut(id) {
            Some(buffer) => {
                buffer.set_content(content.clone());
                if is_active {
                    self.editor_content = content;
                }
            }
            None => tracing::trace!(file = %id, "edit for a file that is not open, ignoring"),
        }
    }

    /// Persist one buffer: its content is written back into the tree, the
    /// whole tree is handed to the gateway, and only on success do the tree,
    /// the saved flags and the mirror advance. On failure the buffer stays
    /// dirty and nothing changes.
    ///
    /// Saving a buffer that is not open is a no-op.
    pub async fn save_buffer(&mut self, id: &FileId) -> Result<(), SessionError> {
        let content = match self.buffer(id) {
            Some(buffer) => buffer.content.clone(),
            None => return Ok(()),
        };

        let mut candidate = self.template.clone();
        let file = candidate
            .find_file_mut(id.as_str())
            .ok_or_else(|| SessionError::Tree(TreeError::NotFound(id.to_string())))?;
        file.content = content.clone();

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        if let Some(buffer) = self.buffer_mut(id) {
            buffer.mark_saved();
        }
        tracing::debug!(file = %id, "saved buffer");

        self.push_to_mirror(id.as_str(), &content).await;
        Ok(())
    }

    /// Persist every open buffer in one gateway call. On success all saved
    /// buffers become clean; on failure every one of them stays dirty.
    pub async fn save_all(&mut self) -> Result<(), SessionError> {
        let mut candidate = self.template.clone();
        let mut saved: Vec<(FileId, String)> = Vec::new();
        for buffer in &self.open_files {
            match candidate.find_file_mut(buffer.id.as_str()) {
                Some(file) => {
                    file.content = buffer.content.clone();
                    saved.push((buffer.id.clone(), buffer.content.clone()));
                }
                None => {
                    tracing::warn!(file = %buffer.id, "open buffer missing from tree, not saved");
                }
            }
        }

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        for (id, _) in &saved {
            if let Some(buffer) = self.buffer_mut(id) {
                buffer.mark_saved();
            }
        }
        for (id, content) in &saved {
            self.push_to_mirror(id.as_str(), content).await;
        }
        Ok(())
    }

    /// Close a buffer, discarding any unsaved edits. Callers that want to
    /// warn first check `buffer(id).has_unsaved_changes` before calling.
    ///
    /// Closing the active buffer activates the most recently opened of the
    /// remaining ones; the selection only becomes empty when no buffer is
    /// left. Unknown ids are a no-op.
    pub fn close_file(&mut self, id: &FileId) {
        let before = self.open_files.len();
        self.open_files.retain(|b| &b.id != id);
        if self.open_files.len() == before {
            return;
        }
        tracing::debug!(file = %id, "closed file");
        if self.active_file.as_ref() == Some(id) {
            self.activate_last_open();
        }
    }

    /// Close every buffer and clear the selection, discarding unsaved edits.
    pub fn close_all_files(&mut self) {
        self.open_files.clear();
        self.active_file = None;
        self.editor_content.clear();
    }

    /// Create a file under `parent_path` and persist the new tree.
    ///
    /// # Errors
    ///
    /// Tree errors (missing parent, duplicate sibling) and persistence
    /// failures both leave the session exactly as it was.
    pub async fn add_file(
        &mut self,
        parent_path: &str,
        file: TemplateFile,
    ) -> Result<FileId, SessionError> {
        let mut candidate = self.template.clone();
        candidate.insert_item(parent_path, TemplateItem::File(file.clone()))?;

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        let id = FileId::from_parts(parent_path, &file.filename, &file.file_extension);
        tracing::info!(file = %id, "created file");

        self.push_to_mirror(id.as_str(), &file.content).await;
        Ok(id)
    }

    /// Create a folder under `parent_path` and persist the new tree.
    pub async fn add_folder(
        &mut self,
        parent_path: &str,
        folder: TemplateFolder,
    ) -> Result<(), SessionError> {
        let folder_path = join_path(parent_path, &folder.folder_name);
        let mut candidate = self.template.clone();
        candidate.insert_item(parent_path, TemplateItem::Folder(folder))?;

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        tracing::info!(folder = %folder_path, "created folder");

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.ensure_dir(&folder_path).await {
                tracing::warn!(folder = %folder_path, error = %e, "mirror mkdir failed");
            }
        }
        Ok(())
    }

    /// Delete a file; its open buffer (if any) is closed after the new tree
    /// has been persisted.
    pub async fn delete_file(
        &mut self,
        parent_path: &str,
        filename: &str,
        extension: &str,
    ) -> Result<(), SessionError> {
        let mut candidate = self.template.clone();
        candidate.remove_file(parent_path, filename, extension)?;

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        let id = FileId::from_parts(parent_path, filename, extension);
        tracing::info!(file = %id, "deleted file");
        self.close_file(&id);
        Ok(())
    }

    /// Delete a folder and its subtree; buffers of every descendant file are
    /// closed after the new tree has been persisted.
    pub async fn delete_folder(
        &mut self,
        parent_path: &str,
        folder_name: &str,
    ) -> Result<(), SessionError> {
        let mut candidate = self.template.clone();
        candidate.remove_folder(parent_path, folder_name)?;

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        let folder_path = join_path(parent_path, folder_name);
        tracing::info!(folder = %folder_path, "deleted folder");

        let before = self.open_files.len();
        self.open_files.retain(|b| !b.id.is_under(&folder_path));
        let closed = before - self.open_files.len();
        if closed > 0 {
            tracing::debug!(closed, folder = %folder_path, "closed buffers under deleted folder");
        }
        let active_gone = self
            .active_file
            .as_ref()
            .map(|id| id.is_under(&folder_path))
            .unwrap_or(false);
        if active_gone {
            self.activate_last_open();
        }
        Ok(())
    }

    /// Rename a file. An open buffer for it is re-keyed to the new identity
    /// with content and dirty flag preserved; reconciliation happens only
    /// after the new tree has been persisted.
    pub async fn rename_file(
        &mut self,
        parent_path: &str,
        old_name: &str,
        old_extension: &str,
        new_name: &str,
        new_extension: &str,
    ) -> Result<FileId, SessionError> {
        let mut candidate = self.template.clone();
        candidate.rename_file(parent_path, old_name, old_extension, new_name, new_extension)?;

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        let old_id = FileId::from_parts(parent_path, old_name, old_extension);
        let new_id = FileId::from_parts(parent_path, new_name, new_extension);
        tracing::info!(from = %old_id, to = %new_id, "renamed file");

        let mut mirror_content = None;
        if let Some(buffer) = self.buffer_mut(&old_id) {
            buffer.id = new_id.clone();
            buffer.file.filename = new_name.to_string();
            buffer.file.file_extension = new_extension.to_string();
            mirror_content = Some(buffer.content.clone());
        }
        if self.active_file.as_ref() == Some(&old_id) {
            self.active_file = Some(new_id.clone());
        }

        // The preview should see the bytes the editor holds, which for an
        // open buffer may be ahead of the tree.
        let content = match mirror_content {
            Some(content) => content,
            None => self
                .template
                .find_file(new_id.as_str())
                .map(|f| f.content.clone())
                .unwrap_or_default(),
        };
        self.push_to_mirror(new_id.as_str(), &content).await;
        Ok(new_id)
    }

    /// Rename a folder. Buffers of every descendant file are re-keyed to
    /// their new identities, contents and dirty flags preserved.
    pub async fn rename_folder(
        &mut self,
        parent_path: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), SessionError> {
        let mut candidate = self.template.clone();
        candidate.rename_folder(parent_path, old_name, new_name)?;

        self.gateway
            .save_template(&self.playground_id, &candidate)
            .await?;

        self.template = candidate;
        let old_path = join_path(parent_path, old_name);
        let new_path = join_path(parent_path, new_name);
        tracing::info!(from = %old_path, to = %new_path, "renamed folder");

        for buffer in &mut self.open_files {
            buffer.id = buffer.id.rebase(&old_path, &new_path);
        }
        if let Some(active) = &self.active_file {
            self.active_file = Some(active.rebase(&old_path, &new_path));
        }
        Ok(())
    }

    /// Whether any open buffer holds unsaved edits.
    pub fn has_unsaved_changes(&self) -> bool {
        self.open_files.iter().any(|b| b.has_unsaved_changes)
    }

    /// Activate the most recently opened remaining buffer, or clear the
    /// selection when none is left.
    fn activate_last_open(&mut self) {
        match self.open_files.last() {
            Some(buffer) => {
                self.active_file = Some(buffer.id.clone());
                self.editor_content = buffer.content.clone();
            }
            None => {
                self.active_file = None;
                self.editor_content.clear();
            }
        }
    }

    async fn push_to_mirror(&self, path: &str, content: &str) {
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.write_file(path, content).await {
                tracing::warn!(file = %path, error = %e, "mirror write failed");
            }
        }
    }
}
