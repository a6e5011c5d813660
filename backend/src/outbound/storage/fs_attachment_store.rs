//! Filesystem `AttachmentStore` confined to one upload directory.
//!
//! All access goes through a `cap_std` directory handle, so stored names
//! cannot escape the upload root. Files are named with a fresh UUID plus the
//! client's extension when it is short and alphanumeric.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::Attachment;
use crate::domain::ports::{AttachmentStore, AttachmentStoreError, Upload};

const MAX_EXTENSION_LEN: usize = 10;

/// Attachment store writing into a capability-scoped directory.
#[derive(Clone)]
pub struct FsAttachmentStore {
    dir: Arc<Dir>,
    root: PathBuf,
}

impl FsAttachmentStore {
    /// Open `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        Dir::create_ambient_dir_all(&root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())?;
        Ok(Self {
            dir: Arc::new(dir),
            root,
        })
    }

    /// Directory the store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn io_error(context: &str, error: &io::Error) -> AttachmentStoreError {
    AttachmentStoreError::io(format!("{context}: {error}"))
}

fn extension_of(original_name: Option<&str>) -> Option<String> {
    let ext = Path::new(original_name?).extension()?.to_str()?;
    (!ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    .then(|| ext.to_ascii_lowercase())
}

fn stored_name_for(upload: &Upload) -> String {
    let id = Uuid::new_v4().simple();
    match extension_of(upload.original_name.as_deref()) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Only plain file names are accepted for removal.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    async fn store(&self, upload: Upload) -> Result<Attachment, AttachmentStoreError> {
        let stored_name = stored_name_for(&upload);
        let sha256 = hex::encode(Sha256::digest(&upload.bytes));
        let size_bytes = u64::try_from(upload.bytes.len()).unwrap_or(u64::MAX);
        let dir = Arc::clone(&self.dir);
        let name = stored_name.clone();
        let bytes = upload.bytes;

        tokio::task::spawn_blocking(move || dir.write(&name, bytes))
            .await
            .map_err(|err| AttachmentStoreError::io(format!("write task failed: {err}")))?
            .map_err(|err| io_error("write attachment", &err))?;
        debug!(%stored_name, size_bytes, "attachment stored");

        Ok(Attachment {
            kind: upload.kind,
            stored_name,
            original_name: upload.original_name,
            content_type: upload.content_type,
            size_bytes,
            sha256,
        })
    }

    async fn remove(&self, attachment: &Attachment) -> Result<(), AttachmentStoreError> {
        if !is_plain_name(&attachment.stored_name) {
            return Err(AttachmentStoreError::io(format!(
                "refusing to remove {:?}",
                attachment.stored_name
            )));
        }
        let dir = Arc::clone(&self.dir);
        let name = attachment.stored_name.clone();
        let outcome = tokio::task::spawn_blocking(move || dir.remove_file(&name))
            .await
            .map_err(|err| AttachmentStoreError::io(format!("remove task failed: {err}")))?;
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(stored_name = %attachment.stored_name, "attachment already gone");
                Ok(())
            }
            Err(err) => Err(io_error("remove attachment", &err)),
        }
    }
}
