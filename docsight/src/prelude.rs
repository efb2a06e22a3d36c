//! Prelude for commonly used types and traits in docsight.

pub use crate::analyzers::{
    Cell, CorrelationStrength, DatasetAnalysis, InferredType, ProfilerConfig, Row, TabularProfiler,
};
pub use crate::embedding::EmbeddingProvider;
pub use crate::error::{DocsightError, Result};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::ingest::{FileFormat, ParserSet};
pub use crate::logging::LogConfig;
pub use crate::processing::{DataFileRequest, DocumentRequest, UploadProcessor};
pub use crate::repository::{BlobStore, Caller, UploadRepository};
pub use crate::structure::{extract_structure, DocumentStructure, StructureExtractor};
