//! Storage adapters for uploaded files.

mod fs_attachment_store;

pub use fs_attachment_store::FsAttachmentStore;
