//! In-memory storage for testing, the CLI and single-process deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{
    ensure_owner, BlobStore, Caller, DataFileRecord, DocumentRecord, RecordId, UploadRepository,
};
use crate::error::{DocsightError, Result};

/// In-memory [`UploadRepository`].
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    data_files: Arc<RwLock<HashMap<RecordId, DataFileRecord>>>,
    documents: Arc<RwLock<HashMap<RecordId, DocumentRecord>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records of both kinds.
    pub async fn size(&self) -> usize {
        self.data_files.read().await.len() + self.documents.read().await.len()
    }

    pub async fn clear(&self) {
        self.data_files.write().await.clear();
        self.documents.write().await.clear();
    }
}

#[async_trait]
impl UploadRepository for InMemoryRepository {
    #[instrument(skip(self, record), fields(id = %record.id, status = %record.processing_status))]
    async fn save_data_file(&self, record: DataFileRecord) -> Result<()> {
        self.data_files.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    #[instrument(skip(self, record), fields(id = %record.id, status = %record.processing_status))]
    async fn save_document(&self, record: DocumentRecord) -> Result<()> {
        self.documents.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    #[instrument(skip(self, caller), fields(id = %id))]
    async fn get_data_file(&self, caller: &Caller, id: &RecordId) -> Result<DataFileRecord> {
        let store = self.data_files.read().await;
        let record = store
            .get(id)
            .ok_or_else(|| DocsightError::not_found("data file", id.as_str()))?;
        ensure_owner(caller, &record.member_id, &record.company_id, id)?;
        Ok(record.clone())
    }

    #[instrument(skip(self, caller), fields(id = %id))]
    async fn get_document(&self, caller: &Caller, id: &RecordId) -> Result<DocumentRecord> {
        let store = self.documents.read().await;
        let record = store
            .get(id)
            .ok_or_else(|| DocsightError::not_found("document", id.as_str()))?;
        ensure_owner(caller, &record.member_id, &record.company_id, id)?;
        Ok(record.clone())
    }

    async fn list_data_files(&self, caller: &Caller) -> Result<Vec<DataFileRecord>> {
        let store = self.data_files.read().await;
        let mut records: Vec<DataFileRecord> = store
            .values()
            .filter(|r| caller.owns(&r.member_id, &r.company_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn list_documents(&self, caller: &Caller) -> Result<Vec<DocumentRecord>> {
        let store = self.documents.read().await;
        let mut records: Vec<DocumentRecord> = store
            .values()
            .filter(|r| caller.owns(&r.member_id, &r.company_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    #[instrument(skip(self, caller), fields(id = %id))]
    async fn delete(&self, caller: &Caller, id: &RecordId) -> Result<()> {
        {
            let mut store = self.data_files.write().await;
            if let Some(record) = store.get(id) {
                ensure_owner(caller, &record.member_id, &record.company_id, id)?;
                store.remove(id);
                debug!("Deleted data file record");
                return Ok(());
            }
        }

        let mut store = self.documents.write().await;
        if let Some(record) = store.get(id) {
            ensure_owner(caller, &record.member_id, &record.company_id, id)?;
            store.remove(id);
            debug!("Deleted document record");
            return Ok(());
        }

        Err(DocsightError::not_found("record", id.as_str()))
    }
}

/// In-memory [`BlobStore`].
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores bytes under a caller-chosen id, replacing any existing blob.
    pub async fn put_with_id(&self, blob_id: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.write().await.insert(blob_id.into(), bytes);
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<String> {
        let blob_id = RecordId::generate("blob", &bytes.len().to_string()).to_string();
        self.blobs.write().await.insert(blob_id.clone(), bytes);
        Ok(blob_id)
    }

    async fn get(&self, blob_id: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(blob_id)
            .cloned()
            .ok_or_else(|| DocsightError::not_found("blob", blob_id))
    }

    async fn delete(&self, blob_id: &str) -> Result<()> {
        self.blobs
            .write()
            .await
            .remove(blob_id)
            .map(|_| ())
            .ok_or_else(|| DocsightError::not_found("blob", blob_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blob_store_roundtrip() {
        let store = InMemoryBlobStore::new();
        let id = store.put(b"hello".to_vec()).await.unwrap();

        assert_eq!(store.get(&id).await.unwrap(), b"hello");
        assert_eq!(store.len().await, 1);

        store.delete(&id).await.unwrap();
        assert!(matches!(
            store.get(&id).await,
            Err(DocsightError::NotFound { .. })
        ));
        assert!(store.delete(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_repository_ownership() {
        let repository = InMemoryRepository::new();
        let owner = Caller::new("m1", "acme");
        let stranger = Caller::new("m2", "acme");

        let record = DataFileRecord::pending(&owner, "a.csv", "text/csv", 10, "blob");
        let id = record.id.clone();
        repository.save_data_file(record).await.unwrap();

        assert_eq!(repository.get_data_file(&owner, &id).await.unwrap().file_name, "a.csv");
        assert!(matches!(
            repository.get_data_file(&stranger, &id).await,
            Err(DocsightError::PermissionDenied(_))
        ));
        assert!(repository.list_data_files(&stranger).await.unwrap().is_empty());
        assert!(repository.delete(&stranger, &id).await.is_err());

        repository.delete(&owner, &id).await.unwrap();
        assert!(matches!(
            repository.get_data_file(&owner, &id).await,
            Err(DocsightError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_documents_and_listing() {
        let repository = InMemoryRepository::new();
        let caller = Caller::new("m1", "acme");

        let first = DocumentRecord::pending(&caller, "a.txt", "text/plain", 5, "b1");
        let second = DocumentRecord::pending(&caller, "b.txt", "text/plain", 5, "b2");
        let id = second.id.clone();
        repository.save_document(first).await.unwrap();
        repository.save_document(second).await.unwrap();

        assert_eq!(repository.list_documents(&caller).await.unwrap().len(), 2);
        assert_eq!(repository.size().await, 2);

        repository.delete(&caller, &id).await.unwrap();
        assert_eq!(repository.list_documents(&caller).await.unwrap().len(), 1);

        repository.clear().await;
        assert_eq!(repository.size().await, 0);
    }
}
