//! Port for storing uploaded consultation files.
use async_trait::async_trait;

use crate::domain::{Attachment, AttachmentKind};

use super::define_port_error;

define_port_error! {
    /// Failures raised by attachment stores.
    pub enum AttachmentStoreError {
        /// The underlying storage failed.
        Io { message: String } => "attachment storage failed: {message}",
    }
}

/// An upload that passed type and size checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub kind: AttachmentKind,
    pub content_type: String,
    pub original_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Write the upload under a fresh name and describe the stored file.
    async fn store(&self, upload: Upload) -> Result<Attachment, AttachmentStoreError>;

    /// Delete a stored file. Missing files are not an error.
    async fn remove(&self, attachment: &Attachment) -> Result<(), AttachmentStoreError>;
}
