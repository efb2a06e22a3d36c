//! # docsight - Upload analysis for tabular data and documents
//!
//! docsight turns uploaded files into structured metadata: spreadsheets get a
//! per-column profile with statistics and correlations, documents get a
//! heading/section outline with paragraph and word counts.
//!
//! ## Quick Start
//!
//! ```rust
//! use docsight::prelude::*;
//!
//! // Tabular profiling
//! let table = ParserSet::new()
//!     .parse_table(FileFormat::Csv, b"hours,score\n2,55\n3,61\n5,70\n6,78\n8,90\n")
//!     .unwrap();
//! let analysis = TabularProfiler::new().profile(&table.headers, &table.rows);
//!
//! assert_eq!(analysis.columns[0].inferred_type, InferredType::Number);
//! assert_eq!(analysis.correlations[0].strength, CorrelationStrength::Strong);
//!
//! // Document structure
//! let structure = extract_structure("CHAPTER ONE\nSome text.\n2. Second heading\nMore text.");
//! assert_eq!(structure.sections.len(), 2);
//! assert_eq!(structure.word_count, 9);
//! ```
//!
//! ## Architecture
//!
//! - **`analyzers`**: the tabular side
//!   - Type inference over the first values of each column
//!   - Two-pass numeric statistics and categorical modes
//!   - Pairwise Pearson correlation discovery
//!   - Data quality scoring and rule-based chart recommendations
//! - **`structure`**: heuristic heading, section, list and table detection in plain text
//! - **`ingest`**: format detection, CSV and text parsing, plug-in traits for Excel, PDF and Word
//! - **`embedding`**: text normalization, cosine similarity and embedding providers
//! - **`templates`**: similarity search over company document templates
//! - **`repository`**: blob and record storage traits with in-memory implementations
//! - **`processing`**: the upload pipelines tying everything together
//! - **`formatters`**: JSON and console rendering
//!
//! ## Logging
//!
//! The library emits `tracing` events and never installs a subscriber itself.
//! Binaries call [`logging::setup::init_logging`].

pub mod analyzers;
pub mod embedding;
pub mod error;
pub mod formatters;
pub mod ingest;
pub mod logging;
pub mod prelude;
pub mod processing;
pub mod repository;
pub mod security;
pub mod structure;
pub mod templates;
