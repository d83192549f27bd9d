// Data model for playground projects
//
// Pure data, no I/O: the template tree and the path-derived file identity
// used to key open buffers and the sandbox mirror.

pub mod file_id;
pub mod template;

pub use file_id::FileId;
pub use template::{TemplateFile, TemplateFolder, TemplateItem, TreeError};
