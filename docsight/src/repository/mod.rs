//! Persistence for uploaded files and their processing results.
//!
//! Two storage seams are defined here:
//!
//! - [`BlobStore`] holds the raw uploaded bytes, addressed by blob id
//! - [`UploadRepository`] holds the [`DataFileRecord`]s and [`DocumentRecord`]s
//!   produced by processing
//!
//! Records belong to the [`Caller`] that created them. Reads, listings and
//! deletes only ever see the caller's own records; touching another member's
//! record yields [`DocsightError::PermissionDenied`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docsight::repository::{BlobStore, InMemoryBlobStore};
//!
//! let blobs = InMemoryBlobStore::new();
//! let blob_id = blobs.put(b"a,b\n1,2\n".to_vec()).await?;
//! assert_eq!(blobs.get(&blob_id).await?, b"a,b\n1,2\n");
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::charts::ChartSuggestion;
use crate::analyzers::inference::InferredType;
use crate::analyzers::profiler::{ColumnProfile, DatasetAnalysis};
use crate::analyzers::quality::QualityAssessment;
use crate::error::{DocsightError, Result};
use crate::ingest::DocumentMetadata;
use crate::structure::DocumentStructure;

pub mod in_memory;
pub mod record_id;

pub use in_memory::{InMemoryBlobStore, InMemoryRepository};
pub use record_id::RecordId;

/// The member on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub member_id: String,
    pub company_id: String,
}

impl Caller {
    pub fn new(member_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            company_id: company_id.into(),
        }
    }

    /// Whether this caller owns a record with the given owner fields.
    pub fn owns(&self, member_id: &str, company_id: &str) -> bool {
        self.member_id == member_id && self.company_id == company_id
    }
}

/// Processing lifecycle of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Uploaded,
    Parsing,
    Analyzing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Progress percentage reported for the status.
    pub fn progress(&self) -> u8 {
        match self {
            ProcessingStatus::Uploaded => 0,
            ProcessingStatus::Parsing => 25,
            ProcessingStatus::Analyzing => 60,
            ProcessingStatus::Completed | ProcessingStatus::Failed => 100,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Uploaded => "uploaded",
            ProcessingStatus::Parsing => "parsing",
            ProcessingStatus::Analyzing => "analyzing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column type entry stored with a data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTypeSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: InferredType,
    pub nullable: bool,
    pub unique_count: usize,
    pub sample_values: Vec<String>,
}

impl From<&ColumnProfile> for ColumnTypeSummary {
    fn from(profile: &ColumnProfile) -> Self {
        Self {
            name: profile.name.clone(),
            column_type: profile.inferred_type,
            nullable: profile.nullable(),
            unique_count: profile.unique_count,
            sample_values: profile.sample_values.clone(),
        }
    }
}

/// A processed (or failed) tabular upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFileRecord {
    pub id: RecordId,
    pub company_id: String,
    pub member_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: usize,
    pub blob_id: String,
    pub column_headers: Vec<String>,
    pub column_types: Vec<ColumnTypeSummary>,
    /// Rows in the parsed file, before sampling
    pub row_count: usize,
    pub column_count: usize,
    /// JSON array of the first sampled rows
    pub data_preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<DatasetAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<QualityAssessment>,
    #[serde(default)]
    pub suggested_charts: Vec<ChartSuggestion>,
    pub schema_description: String,
    #[serde(default)]
    pub schema_embedding: Vec<f32>,
    pub processing_status: ProcessingStatus,
    pub processing_progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl DataFileRecord {
    /// A record in `uploaded` state with no results yet.
    pub fn pending(
        caller: &Caller,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        file_size: usize,
        blob_id: impl Into<String>,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            id: RecordId::generate(&caller.member_id, &file_name),
            company_id: caller.company_id.clone(),
            member_id: caller.member_id.clone(),
            file_name,
            file_type: file_type.into(),
            file_size,
            blob_id: blob_id.into(),
            column_headers: Vec::new(),
            column_types: Vec::new(),
            row_count: 0,
            column_count: 0,
            data_preview: "[]".to_string(),
            analysis: None,
            data_quality: None,
            suggested_charts: Vec::new(),
            schema_description: String::new(),
            schema_embedding: Vec::new(),
            processing_status: ProcessingStatus::Uploaded,
            processing_progress: ProcessingStatus::Uploaded.progress(),
            error_message: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Moves the record to an intermediate status.
    pub fn set_status(&mut self, status: ProcessingStatus) {
        self.processing_status = status;
        self.processing_progress = status.progress();
    }

    /// Marks the record failed with a message for the uploader.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.processing_status = ProcessingStatus::Failed;
        self.processing_progress = ProcessingStatus::Failed.progress();
        self.error_message = Some(message.into());
        self.processed_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.processing_status = ProcessingStatus::Completed;
        self.processing_progress = ProcessingStatus::Completed.progress();
        self.processed_at = Some(Utc::now());
    }
}

/// A processed (or failed) document upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: RecordId,
    pub company_id: String,
    pub member_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: usize,
    pub blob_id: String,
    pub extracted_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_structure: Option<DocumentStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub processing_status: ProcessingStatus,
    pub processing_progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    /// A record in `uploaded` state with no results yet.
    pub fn pending(
        caller: &Caller,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        file_size: usize,
        blob_id: impl Into<String>,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            id: RecordId::generate(&caller.member_id, &file_name),
            company_id: caller.company_id.clone(),
            member_id: caller.member_id.clone(),
            file_name,
            file_type: file_type.into(),
            file_size,
            blob_id: blob_id.into(),
            extracted_text: String::new(),
            document_structure: None,
            word_count: None,
            page_count: None,
            metadata: DocumentMetadata::default(),
            embedding: Vec::new(),
            processing_status: ProcessingStatus::Uploaded,
            processing_progress: ProcessingStatus::Uploaded.progress(),
            error_message: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Moves the record to an intermediate status.
    pub fn set_status(&mut self, status: ProcessingStatus) {
        self.processing_status = status;
        self.processing_progress = status.progress();
    }

    /// Marks the record failed with a message for the uploader.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.processing_status = ProcessingStatus::Failed;
        self.processing_progress = ProcessingStatus::Failed.progress();
        self.error_message = Some(message.into());
        self.processed_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.processing_status = ProcessingStatus::Completed;
        self.processing_progress = ProcessingStatus::Completed.progress();
        self.processed_at = Some(Utc::now());
    }
}

/// Storage for raw uploaded bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores bytes and returns the new blob id.
    async fn put(&self, bytes: Vec<u8>) -> Result<String>;

    /// Fetches a blob. Unknown ids yield [`DocsightError::NotFound`].
    async fn get(&self, blob_id: &str) -> Result<Vec<u8>>;

    async fn delete(&self, blob_id: &str) -> Result<()>;
}

/// Storage for processing records.
///
/// Saving replaces any record with the same id.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn save_data_file(&self, record: DataFileRecord) -> Result<()>;

    async fn save_document(&self, record: DocumentRecord) -> Result<()>;

    async fn get_data_file(&self, caller: &Caller, id: &RecordId) -> Result<DataFileRecord>;

    async fn get_document(&self, caller: &Caller, id: &RecordId) -> Result<DocumentRecord>;

    /// The caller's data files, newest first.
    async fn list_data_files(&self, caller: &Caller) -> Result<Vec<DataFileRecord>>;

    /// The caller's documents, newest first.
    async fn list_documents(&self, caller: &Caller) -> Result<Vec<DocumentRecord>>;

    /// Deletes a data file or document record owned by the caller.
    async fn delete(&self, caller: &Caller, id: &RecordId) -> Result<()>;
}

pub(crate) fn ensure_owner(caller: &Caller, member_id: &str, company_id: &str, id: &RecordId) -> Result<()> {
    if caller.owns(member_id, company_id) {
        Ok(())
    } else {
        Err(DocsightError::PermissionDenied(format!(
            "record '{id}' belongs to another member"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_progress() {
        assert_eq!(ProcessingStatus::Uploaded.progress(), 0);
        assert_eq!(ProcessingStatus::Completed.progress(), 100);
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(!ProcessingStatus::Analyzing.is_terminal());
        assert_eq!(
            serde_json::to_value(ProcessingStatus::Analyzing).unwrap(),
            "analyzing"
        );
    }

    #[test]
    fn test_record_lifecycle() {
        let caller = Caller::new("m1", "acme");
        let mut record = DataFileRecord::pending(&caller, "sales.csv", "text/csv", 120, "blob-1");
        assert_eq!(record.processing_status, ProcessingStatus::Uploaded);
        assert!(record.processed_at.is_none());

        record.fail("Unsupported file type: x");
        assert_eq!(record.processing_status, ProcessingStatus::Failed);
        assert_eq!(record.processing_progress, 100);
        assert_eq!(record.error_message.as_deref(), Some("Unsupported file type: x"));
        assert!(record.processed_at.is_some());
    }

    #[test]
    fn test_column_type_summary_serializes_type() {
        let summary = ColumnTypeSummary {
            name: "age".to_string(),
            column_type: InferredType::Number,
            nullable: false,
            unique_count: 3,
            sample_values: vec!["30".to_string()],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["uniqueCount"], 3);
    }

    #[test]
    fn test_ownership() {
        let caller = Caller::new("m1", "acme");
        let id = RecordId::from("abc");
        assert!(ensure_owner(&caller, "m1", "acme", &id).is_ok());
        assert!(matches!(
            ensure_owner(&caller, "m2", "acme", &id),
            Err(DocsightError::PermissionDenied(_))
        ));
        assert!(ensure_owner(&caller, "m1", "other", &id).is_err());
    }
}
