//! ObjectStore: blob storage for downloaded file attachments (spec.md
//! §4.6 step 9). Backed by the `object_store` crate rather than a
//! hand-rolled S3 client, since that crate's `ObjectStore` trait already
//! matches the put/get shape this engine needs and is what the pack's
//! Arrow-adjacent examples reach for when they need blob storage.

use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore as ObjectStoreTrait, PutPayload};

use crate::error::{AppError, Result};

/// Thin wrapper around a boxed `object_store::ObjectStore` scoping keys
/// under a tenant/case-file prefix. A failure here is
/// `ObjectStoreFailure` (spec.md §7): file-level, never fails the job.
pub struct ObjectStore {
    inner: Arc<dyn ObjectStoreTrait>,
}

impl ObjectStore {
    pub fn new(inner: Arc<dyn ObjectStoreTrait>) -> Self {
        Self { inner }
    }

    /// `{tenantId}/{caseFileId}/{binnacleId}/{originalName}`, matching
    /// the `FileAttachment.object_store_key` field's shape.
    pub fn key_for(tenant_id: uuid::Uuid, case_file_id: uuid::Uuid, binnacle_id: uuid::Uuid, original_name: &str) -> String {
        format!("{tenant_id}/{case_file_id}/{binnacle_id}/{original_name}")
    }

    pub async fn put(&self, key: &str, bytes: Bytes) -> Result<()> {
        let path = ObjectPath::from(key);
        self.inner
            .put(&path, PutPayload::from_bytes(bytes))
            .await
            .map_err(|e| AppError::ObjectStoreFailure(format!("put {key} failed: {e}")))?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let path = ObjectPath::from(key);
        let result = self
            .inner
            .get(&path)
            .await
            .map_err(|e| AppError::ObjectStoreFailure(format!("get {key} failed: {e}")))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| AppError::ObjectStoreFailure(format!("read {key} failed: {e}")))?;
        Ok(bytes)
    }
}

pub type SharedObjectStore = Arc<ObjectStore>;
