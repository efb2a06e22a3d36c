//! Upload processing: fetch, parse, analyze and persist.
//!
//! [`UploadProcessor`] runs the two upload pipelines end to end:
//!
//! ```text
//! data file:  blob → format detection → table parser → profiler → quality + charts → DataFileRecord
//! document:   blob → format detection → text extraction → structure → embedding → DocumentRecord
//! ```
//!
//! Every request produces exactly one persisted record. When any step fails the
//! record is saved with status `failed` and the error message, and the error is
//! returned to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docsight::processing::{DataFileRequest, UploadProcessor};
//! use docsight::repository::{Caller, InMemoryBlobStore, InMemoryRepository};
//!
//! let blobs = InMemoryBlobStore::new();
//! blobs.put_with_id("upload-1", b"x,y\n2,5\n3,7\n".to_vec()).await;
//!
//! let processor = UploadProcessor::builder()
//!     .repository(Arc::new(InMemoryRepository::new()))
//!     .blob_store(Arc::new(blobs))
//!     .build()?;
//!
//! let outcome = processor
//!     .process_data_file(&Caller::new("m1", "acme"), DataFileRequest::new("upload-1", "xy.csv", "text/csv"))
//!     .await?;
//! println!("{} rows", outcome.row_count);
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::analyzers::cell::Row;
use crate::analyzers::charts::{AnalysisGoal, ChartRecommender, ChartSuggestion};
use crate::analyzers::profiler::{DatasetAnalysis, ProfilerConfig, TabularProfiler};
use crate::analyzers::quality::{QualityAssessment, QualityAssessor};
use crate::embedding::{EmbeddingProvider, DEFAULT_MAX_CHARS};
use crate::error::{DocsightError, Result};
use crate::ingest::{DocumentMetadata, FileFormat, ParserSet};
use crate::logging::LogConfig;
use crate::repository::{
    BlobStore, Caller, ColumnTypeSummary, DataFileRecord, DocumentRecord, ProcessingStatus,
    RecordId, UploadRepository,
};
use crate::security::InputValidator;
use crate::structure::{DocumentStructure, StructureConfig, StructureExtractor};

/// Rows returned and stored as the data preview.
pub const PREVIEW_ROWS: usize = 10;

/// Default upload size limit (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Per-request switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    /// Rows to analyze; `None` or `Some(0)` means `min(1000, rows)`
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default = "enabled")]
    pub detect_types: bool,
    #[serde(default = "enabled")]
    pub find_correlations: bool,
    #[serde(default = "enabled")]
    pub extract_structure: bool,
    #[serde(default = "enabled")]
    pub generate_embedding: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            sample_size: None,
            detect_types: true,
            find_correlations: true,
            extract_structure: true,
            generate_embedding: true,
        }
    }
}

/// A tabular upload to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFileRequest {
    pub blob_id: String,
    pub file_name: String,
    /// MIME type as reported by the uploader
    pub file_type: String,
    /// Defaults to the stored blob's length
    #[serde(default)]
    pub file_size: Option<usize>,
    #[serde(default)]
    pub options: ProcessingOptions,
}

impl DataFileRequest {
    pub fn new(blob_id: impl Into<String>, file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            blob_id: blob_id.into(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_size: None,
            options: ProcessingOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProcessingOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of a successful data file run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFileOutcome {
    pub record_id: RecordId,
    pub headers: Vec<String>,
    /// Parsed rows, before sampling
    pub row_count: usize,
    pub analysis: DatasetAnalysis,
    pub quality: QualityAssessment,
    pub charts: Vec<ChartSuggestion>,
    /// First sampled rows
    pub preview: Vec<Row>,
}

/// A document upload to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub blob_id: String,
    pub file_name: String,
    pub file_type: String,
    #[serde(default)]
    pub file_size: Option<usize>,
    #[serde(default)]
    pub options: ProcessingOptions,
}

impl DocumentRequest {
    pub fn new(blob_id: impl Into<String>, file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            blob_id: blob_id.into(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_size: None,
            options: ProcessingOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProcessingOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of a successful document run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub record_id: RecordId,
    pub extracted_text: String,
    pub structure: Option<DocumentStructure>,
    pub metadata: DocumentMetadata,
    /// Empty when embedding was disabled or failed
    pub embedding: Vec<f32>,
}

/// Builder for [`UploadProcessor`].
pub struct UploadProcessorBuilder {
    profiler_config: ProfilerConfig,
    structure_config: StructureConfig,
    parsers: ParserSet,
    repository: Option<Arc<dyn UploadRepository>>,
    blobs: Option<Arc<dyn BlobStore>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    charts: ChartRecommender,
    quality: QualityAssessor,
    log_config: LogConfig,
    max_file_size: usize,
}

impl Default for UploadProcessorBuilder {
    fn default() -> Self {
        Self {
            profiler_config: ProfilerConfig::default(),
            structure_config: StructureConfig::default(),
            parsers: ParserSet::new(),
            repository: None,
            blobs: None,
            embedder: None,
            charts: ChartRecommender::with_default_rules(),
            quality: QualityAssessor::new(),
            log_config: LogConfig::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl UploadProcessorBuilder {
    /// Base profiler configuration; request options override its switches
    pub fn profiler_config(mut self, config: ProfilerConfig) -> Self {
        self.profiler_config = config;
        self
    }

    pub fn structure_config(mut self, config: StructureConfig) -> Self {
        self.structure_config = config;
        self
    }

    pub fn parsers(mut self, parsers: ParserSet) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn repository(mut self, repository: Arc<dyn UploadRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn chart_recommender(mut self, charts: ChartRecommender) -> Self {
        self.charts = charts;
        self
    }

    pub fn quality_assessor(mut self, quality: QualityAssessor) -> Self {
        self.quality = quality;
        self
    }

    pub fn log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Fails when the repository or blob store is missing.
    pub fn build(self) -> Result<UploadProcessor> {
        let repository = self.repository.ok_or_else(|| {
            DocsightError::Configuration("upload processor requires a repository".to_string())
        })?;
        let blobs = self.blobs.ok_or_else(|| {
            DocsightError::Configuration("upload processor requires a blob store".to_string())
        })?;

        Ok(UploadProcessor {
            profiler_config: self.profiler_config,
            structure: StructureExtractor::with_config(self.structure_config),
            parsers: self.parsers,
            repository,
            blobs,
            embedder: self.embedder,
            charts: Arc::new(self.charts),
            quality: self.quality,
            log_config: self.log_config,
            max_file_size: self.max_file_size,
        })
    }
}

/// Orchestrates upload processing against injected storage and parsers.
#[derive(Clone)]
pub struct UploadProcessor {
    profiler_config: ProfilerConfig,
    structure: StructureExtractor,
    parsers: ParserSet,
    repository: Arc<dyn UploadRepository>,
    blobs: Arc<dyn BlobStore>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    charts: Arc<ChartRecommender>,
    quality: QualityAssessor,
    log_config: LogConfig,
    max_file_size: usize,
}

impl std::fmt::Debug for UploadProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadProcessor")
            .field("profiler_config", &self.profiler_config)
            .field("structure", &self.structure)
            .field("parsers", &self.parsers)
            .field("embedder", &self.embedder.as_ref().map(|e| e.model().to_string()))
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

impl UploadProcessor {
    pub fn builder() -> UploadProcessorBuilder {
        UploadProcessorBuilder::default()
    }

    pub fn repository(&self) -> &Arc<dyn UploadRepository> {
        &self.repository
    }

    /// Processes a CSV or Excel upload.
    #[instrument(skip(self, caller, request), fields(file_name = %self.log_config.field(&request.file_name), file_type = %request.file_type))]
    pub async fn process_data_file(&self, caller: &Caller, request: DataFileRequest) -> Result<DataFileOutcome> {
        let start_time = Instant::now();
        let mut record = DataFileRecord::pending(
            caller,
            request.file_name.clone(),
            request.file_type.clone(),
            request.file_size.unwrap_or_default(),
            request.blob_id.clone(),
        );

        match self.run_data_file(&request, &mut record).await {
            Ok(outcome) => {
                record.complete();
                self.repository.save_data_file(record).await?;
                info!(
                    record_id = %outcome.record_id,
                    rows = outcome.row_count,
                    columns = outcome.headers.len(),
                    time_ms = start_time.elapsed().as_millis() as u64,
                    "Processed data file"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, "Data file processing failed");
                record.fail(err.user_message());
                if let Err(save_err) = self.repository.save_data_file(record).await {
                    warn!(error = %save_err, "Failed to persist failed data file record");
                }
                Err(err)
            }
        }
    }

    async fn run_data_file(&self, request: &DataFileRequest, record: &mut DataFileRecord) -> Result<DataFileOutcome> {
        InputValidator::validate_file_name(&request.file_name)?;
        let format = FileFormat::for_data_file(&request.file_name, &request.file_type)?;

        let bytes = self.fetch(&request.blob_id, record.file_size).await?;
        if request.file_size.is_none() {
            record.file_size = bytes.len();
        }

        record.set_status(ProcessingStatus::Parsing);
        let table = self.parsers.parse_table(format, &bytes)?;
        crate::log_data_op!(
            self.log_config,
            format = format.name(),
            rows = table.rows.len(),
            columns = table.headers.len(),
            "Parsed data file"
        );

        record.set_status(ProcessingStatus::Analyzing);
        let options = &request.options;
        let profiler = TabularProfiler::builder()
            .config(self.profiler_config.clone())
            .sample_size_opt(options.sample_size.or(self.profiler_config.sample_size))
            .detect_types(options.detect_types)
            .find_correlations(options.find_correlations)
            .build();
        let analysis = profiler.try_profile(&table.headers, &table.rows)?;
        let sample = profiler.sample(&table.rows);

        let quality = self.quality.assess(&analysis, sample);
        let charts = self.charts.recommend(&analysis, AnalysisGoal::Overview);
        let preview: Vec<Row> = sample.iter().take(PREVIEW_ROWS).cloned().collect();

        let schema_description = format!(
            "Dataset with {} columns and {} rows",
            table.headers.len(),
            table.rows.len()
        );
        if options.generate_embedding {
            record.schema_embedding = self.embed_or_empty(&schema_description).await;
        }

        record.column_headers = table.headers.clone();
        record.column_types = analysis.columns.iter().map(ColumnTypeSummary::from).collect();
        record.row_count = table.rows.len();
        record.column_count = table.headers.len();
        record.data_preview = serde_json::to_string(&preview)?;
        record.data_quality = Some(quality.clone());
        record.suggested_charts = charts.clone();
        record.schema_description = schema_description;
        record.analysis = Some(analysis.clone());

        Ok(DataFileOutcome {
            record_id: record.id.clone(),
            headers: table.headers,
            row_count: table.rows.len(),
            analysis,
            quality,
            charts,
            preview,
        })
    }

    /// Processes a PDF, Word or text upload.
    #[instrument(skip(self, caller, request), fields(file_name = %self.log_config.field(&request.file_name), file_type = %request.file_type))]
    pub async fn process_document(&self, caller: &Caller, request: DocumentRequest) -> Result<DocumentOutcome> {
        let start_time = Instant::now();
        let mut record = DocumentRecord::pending(
            caller,
            request.file_name.clone(),
            request.file_type.clone(),
            request.file_size.unwrap_or_default(),
            request.blob_id.clone(),
        );

        match self.run_document(&request, &mut record).await {
            Ok(outcome) => {
                record.complete();
                self.repository.save_document(record).await?;
                info!(
                    record_id = %outcome.record_id,
                    chars = outcome.extracted_text.len(),
                    embedded = !outcome.embedding.is_empty(),
                    time_ms = start_time.elapsed().as_millis() as u64,
                    "Processed document"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, "Document processing failed");
                record.fail(err.user_message());
                if let Err(save_err) = self.repository.save_document(record).await {
                    warn!(error = %save_err, "Failed to persist failed document record");
                }
                Err(err)
            }
        }
    }

    async fn run_document(&self, request: &DocumentRequest, record: &mut DocumentRecord) -> Result<DocumentOutcome> {
        InputValidator::validate_file_name(&request.file_name)?;

        let bytes = self.fetch(&request.blob_id, record.file_size).await?;
        if bytes.is_empty() {
            return Err(DocsightError::EmptyInput(format!(
                "The uploaded document appears to be empty (0 bytes). Please upload a file with content. File info: {} ({})",
                request.file_name, request.file_type
            )));
        }
        if request.file_size.is_none() {
            record.file_size = bytes.len();
        }

        let format = FileFormat::for_document(&request.file_name, &request.file_type)?;

        record.set_status(ProcessingStatus::Parsing);
        let extracted = self.parsers.extract_text(format, &bytes, &request.file_name)?;
        crate::log_data_op!(
            self.log_config,
            format = format.name(),
            chars = extracted.text.len(),
            "Extracted document text"
        );
        if self.log_config.log_content_previews {
            crate::perf_debug!(self.log_config, preview = %self.log_config.field(&extracted.text), "Extracted text preview");
        }

        record.set_status(ProcessingStatus::Analyzing);
        let options = &request.options;
        let structure = options
            .extract_structure
            .then(|| self.structure.extract(&extracted.text));

        let embedding = if options.generate_embedding {
            let head: String = extracted.text.chars().take(DEFAULT_MAX_CHARS).collect();
            self.embed_or_empty(&head).await
        } else {
            Vec::new()
        };

        record.extracted_text = extracted.text.clone();
        record.document_structure = structure.clone();
        record.word_count = structure.as_ref().map(|s| s.word_count);
        record.page_count = extracted.metadata.page_count;
        record.metadata = extracted.metadata.clone();
        record.embedding = embedding.clone();

        Ok(DocumentOutcome {
            record_id: record.id.clone(),
            extracted_text: extracted.text,
            structure,
            metadata: extracted.metadata,
            embedding,
        })
    }

    async fn fetch(&self, blob_id: &str, declared_size: usize) -> Result<Vec<u8>> {
        InputValidator::validate_file_size(declared_size, self.max_file_size)?;
        let bytes = self.blobs.get(blob_id).await?;
        InputValidator::validate_file_size(bytes.len(), self.max_file_size)?;
        crate::perf_debug!(self.log_config, blob_id, bytes = bytes.len(), "Fetched upload");
        Ok(bytes)
    }

    /// Embeds text with the configured provider. Failures are logged and give an
    /// empty vector.
    async fn embed_or_empty(&self, text: &str) -> Vec<f32> {
        let Some(embedder) = &self.embedder else {
            return Vec::new();
        };
        match embedder.embed(text).await {
            Ok(embedding) => embedding.vector,
            Err(err) => {
                warn!(model = embedder.model(), error = %err, "Embedding failed, storing empty vector");
                Vec::new()
            }
        }
    }
}
