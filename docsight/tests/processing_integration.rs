//! End-to-end tests for the upload processor with in-memory storage.

use std::sync::Arc;

use async_trait::async_trait;
use docsight::analyzers::{Cell, CorrelationStrength, InferredType};
use docsight::embedding::{Embedding, EmbeddingProvider, HashingEmbedder};
use docsight::error::{DocsightError, Result};
use docsight::ingest::{DocumentMetadata, DocumentParser, ExtractedText, ParsedTable, ParserSet, TableParser};
use docsight::processing::{DataFileRequest, DocumentRequest, ProcessingOptions, UploadProcessor};
use docsight::repository::{
    BlobStore, Caller, InMemoryBlobStore, InMemoryRepository, ProcessingStatus, RecordId, UploadRepository,
};
use docsight::templates::{DocumentTemplate, SimilarityOptions, TemplateLibrary};

const SALES_CSV: &str = "\
month,ad_spend,revenue,region,promo
2024-01-01,2,5,north,true
2024-02-01,3,7,south,false
2024-03-01,4,9,north,true
2024-04-01,5,11,north,false
2024-05-01,6,13,south,true
2024-06-01,7,15,north,false
";

#[derive(Debug)]
struct BrokenPdf;

impl DocumentParser for BrokenPdf {
    fn extract_text(&self, _bytes: &[u8]) -> Result<ExtractedText> {
        Err(DocsightError::parse("PDF", "Invalid PDF structure"))
    }

    fn name(&self) -> &str {
        "broken-pdf"
    }
}

#[derive(Debug)]
struct FixedPdf;

impl DocumentParser for FixedPdf {
    fn extract_text(&self, _bytes: &[u8]) -> Result<ExtractedText> {
        Ok(ExtractedText {
            text: "INTRODUCTION\nThis proposal covers the rollout.\n".to_string(),
            metadata: DocumentMetadata {
                page_count: Some(3),
                title: Some("Rollout".to_string()),
                ..DocumentMetadata::default()
            },
        })
    }

    fn name(&self) -> &str {
        "fixed-pdf"
    }
}

#[derive(Debug)]
struct CorruptDocx;

impl DocumentParser for CorruptDocx {
    fn extract_text(&self, _bytes: &[u8]) -> Result<ExtractedText> {
        Err(DocsightError::parse("DOCX", "Corrupted zip: can't find end of central directory"))
    }

    fn name(&self) -> &str {
        "corrupt-docx"
    }
}

#[derive(Debug)]
struct GridSheet;

impl TableParser for GridSheet {
    fn parse_table(&self, _bytes: &[u8]) -> Result<ParsedTable> {
        Ok(ParsedTable::from_grid(vec![
            vec![Cell::from("item"), Cell::from("qty")],
            vec![Cell::from("bolts"), Cell::from(40)],
            vec![Cell::from("nuts"), Cell::from(55)],
        ]))
    }

    fn name(&self) -> &str {
        "grid"
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding> {
        Err(DocsightError::embedding_transient("rate limited"))
    }

    fn model(&self) -> &str {
        "failing"
    }
}

struct Harness {
    processor: UploadProcessor,
    repository: Arc<InMemoryRepository>,
    blobs: Arc<InMemoryBlobStore>,
}

fn harness_with(parsers: ParserSet, embedder: Arc<dyn EmbeddingProvider>) -> Harness {
    let repository = Arc::new(InMemoryRepository::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let processor = UploadProcessor::builder()
        .repository(repository.clone())
        .blob_store(blobs.clone())
        .parsers(parsers)
        .embedder(embedder)
        .build()
        .expect("processor builds");
    Harness {
        processor,
        repository,
        blobs,
    }
}

fn harness() -> Harness {
    harness_with(ParserSet::new(), Arc::new(HashingEmbedder::new(64)))
}

fn caller() -> Caller {
    Caller::new("member-1", "acme")
}

#[tokio::test]
async fn test_csv_upload_end_to_end() {
    let h = harness();
    let blob_id = h.blobs.put(SALES_CSV.as_bytes().to_vec()).await.unwrap();

    let outcome = h
        .processor
        .process_data_file(&caller(), DataFileRequest::new(blob_id, "sales.csv", "text/csv"))
        .await
        .unwrap();

    assert_eq!(outcome.headers, ["month", "ad_spend", "revenue", "region", "promo"]);
    assert_eq!(outcome.row_count, 6);
    assert_eq!(outcome.preview.len(), 6);

    let analysis = &outcome.analysis;
    assert_eq!(analysis.column("month").unwrap().inferred_type, InferredType::Date);
    assert_eq!(analysis.column("ad_spend").unwrap().inferred_type, InferredType::Number);
    assert_eq!(analysis.column("promo").unwrap().inferred_type, InferredType::Boolean);
    assert_eq!(analysis.column("region").unwrap().mode(), Some("north"));
    assert_eq!(analysis.correlations.len(), 1);
    assert_eq!(analysis.correlations[0].strength, CorrelationStrength::Strong);
    assert_eq!(analysis.correlations[0].correlation, 1.0);

    assert_eq!(outcome.quality.completeness, 100.0);
    assert!(!outcome.charts.is_empty());

    let record = h.repository.get_data_file(&caller(), &outcome.record_id).await.unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Completed);
    assert_eq!(record.processing_progress, 100);
    assert!(record.processed_at.is_some());
    assert_eq!(record.row_count, 6);
    assert_eq!(record.column_count, 5);
    assert_eq!(record.schema_description, "Dataset with 5 columns and 6 rows");
    assert_eq!(record.schema_embedding.len(), 64);
    assert_eq!(record.column_types[2].column_type, InferredType::Number);
    assert!(!record.column_types[0].nullable);

    let preview: serde_json::Value = serde_json::from_str(&record.data_preview).unwrap();
    assert_eq!(preview[0]["region"], "north");
    assert_eq!(preview[0]["promo"], true);
    assert_eq!(preview[0]["revenue"], 5.0);
}

#[tokio::test]
async fn test_preview_is_capped_at_ten_rows() {
    let h = harness();
    let mut csv = String::from("n,label\n");
    for n in 0..25 {
        csv.push_str(&format!("{n},row-{n}\n"));
    }
    h.blobs.put_with_id("big", csv.into_bytes()).await;

    let outcome = h
        .processor
        .process_data_file(&caller(), DataFileRequest::new("big", "big.CSV", ""))
        .await
        .unwrap();

    assert_eq!(outcome.row_count, 25);
    assert_eq!(outcome.preview.len(), 10);
}

#[tokio::test]
async fn test_request_options_override_profiling() {
    let h = harness();
    h.blobs.put_with_id("b", SALES_CSV.as_bytes().to_vec()).await;
    let options = ProcessingOptions {
        sample_size: Some(3),
        find_correlations: false,
        generate_embedding: false,
        ..ProcessingOptions::default()
    };

    let outcome = h
        .processor
        .process_data_file(&caller(), DataFileRequest::new("b", "sales.csv", "text/csv").with_options(options))
        .await
        .unwrap();

    assert_eq!(outcome.analysis.analyzed_rows, 3);
    assert_eq!(outcome.row_count, 6);
    assert!(outcome.analysis.correlations.is_empty());

    let record = h.repository.get_data_file(&caller(), &outcome.record_id).await.unwrap();
    assert!(record.schema_embedding.is_empty());
}

#[tokio::test]
async fn test_excel_requires_a_parser() {
    let h = harness();
    h.blobs.put_with_id("x", vec![0x50, 0x4b, 0x03, 0x04]).await;

    let err = h
        .processor
        .process_data_file(&caller(), DataFileRequest::new("x", "stock.xlsx", "application/vnd.ms-excel"))
        .await
        .unwrap_err();
    assert!(matches!(err, DocsightError::UnsupportedFormat { .. }));

    let with_excel = harness_with(
        ParserSet::new().with_excel(Arc::new(GridSheet)),
        Arc::new(HashingEmbedder::new(8)),
    );
    with_excel.blobs.put_with_id("x", vec![0x50, 0x4b, 0x03, 0x04]).await;
    let outcome = with_excel
        .processor
        .process_data_file(&caller(), DataFileRequest::new("x", "stock.xlsx", "application/vnd.ms-excel"))
        .await
        .unwrap();
    assert_eq!(outcome.headers, ["item", "qty"]);
    assert_eq!(outcome.analysis.column("qty").unwrap().inferred_type, InferredType::Number);
}

#[tokio::test]
async fn test_missing_blob_fails_record() {
    let h = harness();

    let err = h
        .processor
        .process_data_file(&caller(), DataFileRequest::new("nope", "gone.csv", "text/csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, DocsightError::NotFound { .. }));

    let records = h.repository.list_data_files(&caller()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].processing_status, ProcessingStatus::Failed);
    assert!(records[0].error_message.as_deref().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let repository = Arc::new(InMemoryRepository::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    blobs.put_with_id("b", SALES_CSV.as_bytes().to_vec()).await;
    let processor = UploadProcessor::builder()
        .repository(repository.clone())
        .blob_store(blobs)
        .max_file_size(16)
        .build()
        .unwrap();

    let result = processor
        .process_data_file(&caller(), DataFileRequest::new("b", "sales.csv", "text/csv"))
        .await;
    assert!(result.is_err());
    assert_eq!(
        repository.list_data_files(&caller()).await.unwrap()[0].processing_status,
        ProcessingStatus::Failed
    );
}

#[tokio::test]
async fn test_text_document_end_to_end() {
    let h = harness();
    let text = "EXECUTIVE SUMMARY\nWe propose a phased rollout.\n- Phase one\n- Phase two\n";
    h.blobs.put_with_id("d", text.as_bytes().to_vec()).await;

    let outcome = h
        .processor
        .process_document(&caller(), DocumentRequest::new("d", "summary.txt", "text/plain"))
        .await
        .unwrap();

    let structure = outcome.structure.as_ref().unwrap();
    assert_eq!(structure.headings[0].text, "EXECUTIVE SUMMARY");
    assert!(structure.has_lists);
    assert_eq!(outcome.embedding.len(), 64);

    let record = h.repository.get_document(&caller(), &outcome.record_id).await.unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Completed);
    assert_eq!(record.extracted_text, text);
    assert_eq!(record.word_count, Some(structure.word_count));
    assert_eq!(record.metadata.encoding.as_deref(), Some("utf-8"));
}

#[tokio::test]
async fn test_empty_document_is_rejected() {
    let h = harness();
    h.blobs.put_with_id("e", Vec::new()).await;

    let err = h
        .processor
        .process_document(&caller(), DocumentRequest::new("e", "blank.txt", "text/plain"))
        .await
        .unwrap_err();

    assert!(matches!(err, DocsightError::EmptyInput(_)));
    let records = h.repository.list_documents(&caller()).await.unwrap();
    assert_eq!(
        records[0].error_message.as_deref(),
        Some("Empty input: The uploaded document appears to be empty (0 bytes). Please upload a file with content. File info: blank.txt (text/plain)")
    );
}

#[tokio::test]
async fn test_pdf_parse_failure_uses_placeholder() {
    let h = harness_with(
        ParserSet::new().with_pdf(Arc::new(BrokenPdf)),
        Arc::new(HashingEmbedder::new(16)),
    );
    h.blobs.put_with_id("p", b"%PDF-1.4 garbage".to_vec()).await;

    let outcome = h
        .processor
        .process_document(&caller(), DocumentRequest::new("p", "scan.pdf", "application/pdf"))
        .await
        .unwrap();

    assert_eq!(
        outcome.extracted_text,
        "[PDF parsing failed: Invalid PDF structure. Please try a different PDF file or convert to a text format.]"
    );
    assert_eq!(outcome.metadata.processing_error.as_deref(), Some("Invalid PDF structure"));
    assert_eq!(outcome.metadata.page_count, Some(0));

    let record = h.repository.get_document(&caller(), &outcome.record_id).await.unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_pdf_page_count_is_recorded() {
    let h = harness_with(
        ParserSet::new().with_pdf(Arc::new(FixedPdf)),
        Arc::new(HashingEmbedder::new(16)),
    );
    h.blobs.put_with_id("p", b"%PDF-1.7".to_vec()).await;

    let outcome = h
        .processor
        .process_document(&caller(), DocumentRequest::new("p", "rollout.pdf", "application/pdf"))
        .await
        .unwrap();

    let record = h.repository.get_document(&caller(), &outcome.record_id).await.unwrap();
    assert_eq!(record.page_count, Some(3));
    assert_eq!(record.metadata.title.as_deref(), Some("Rollout"));
}

#[tokio::test]
async fn test_word_document_errors() {
    let h = harness_with(
        ParserSet::new().with_docx(Arc::new(CorruptDocx)),
        Arc::new(HashingEmbedder::new(16)),
    );
    h.blobs.put_with_id("w", b"PK".to_vec()).await;
    h.blobs.put_with_id("legacy", b"\xd0\xcf\x11\xe0".to_vec()).await;

    let corrupt = h
        .processor
        .process_document(
            &caller(),
            DocumentRequest::new(
                "w",
                "brief.docx",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
        )
        .await
        .unwrap_err();
    assert!(corrupt.to_string().contains("valid .docx file"));

    let legacy = h
        .processor
        .process_document(&caller(), DocumentRequest::new("legacy", "old.doc", "application/msword"))
        .await
        .unwrap_err();
    assert!(matches!(legacy, DocsightError::UnsupportedFormat { .. }));

    let records = h.repository.list_documents(&caller()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.processing_status == ProcessingStatus::Failed));
    assert!(records
        .iter()
        .any(|r| r.error_message.as_deref().is_some_and(|m| m.contains("save the document as .docx"))));
}

#[tokio::test]
async fn test_embedding_failure_stores_empty_vector() {
    let h = harness_with(ParserSet::new(), Arc::new(FailingEmbedder));
    h.blobs.put_with_id("d", b"NOTES\nsome body text".to_vec()).await;
    h.blobs.put_with_id("c", SALES_CSV.as_bytes().to_vec()).await;

    let document = h
        .processor
        .process_document(&caller(), DocumentRequest::new("d", "notes.txt", "text/plain"))
        .await
        .unwrap();
    assert!(document.embedding.is_empty());

    let data = h
        .processor
        .process_data_file(&caller(), DataFileRequest::new("c", "sales.csv", "text/csv"))
        .await
        .unwrap();
    let record = h.repository.get_data_file(&caller(), &data.record_id).await.unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Completed);
    assert!(record.schema_embedding.is_empty());
}

#[tokio::test]
async fn test_records_are_scoped_to_their_owner() {
    let h = harness();
    h.blobs.put_with_id("c", SALES_CSV.as_bytes().to_vec()).await;
    let outcome = h
        .processor
        .process_data_file(&caller(), DataFileRequest::new("c", "sales.csv", "text/csv"))
        .await
        .unwrap();

    let stranger = Caller::new("member-2", "acme");
    let err = h
        .repository
        .get_data_file(&stranger, &outcome.record_id)
        .await
        .unwrap_err();
    assert!(matches!(err, DocsightError::PermissionDenied(_)));
    assert!(h.repository.list_data_files(&stranger).await.unwrap().is_empty());
    assert!(h.repository.delete(&stranger, &outcome.record_id).await.is_err());

    h.repository.delete(&caller(), &outcome.record_id).await.unwrap();
    let missing = h
        .repository
        .get_data_file(&caller(), &RecordId::from("does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(missing, DocsightError::NotFound { .. }));
}

#[tokio::test]
async fn test_template_search_from_document_text() {
    let embedder = HashingEmbedder::new(128);
    let proposal = embedder
        .embed("project proposal budget timeline deliverables")
        .await
        .unwrap();
    let memo = embedder.embed("internal memo office closure holiday").await.unwrap();

    let mut library = TemplateLibrary::new();
    library.insert(DocumentTemplate::new("t-proposal", "acme", "Proposal", "proposal", proposal.vector));
    library.insert(DocumentTemplate::new("t-memo", "acme", "Memo", "memo", memo.vector));

    let matches = library
        .find_similar_to_text(
            &embedder,
            "Proposal: budget, timeline and deliverables for the project",
            "acme",
            &SimilarityOptions::default().threshold(0.5),
        )
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].template_id, "t-proposal");
    assert!(matches[0].score > 0.5);

    let other_company = library
        .find_similar_to_text(&embedder, "project proposal", "globex", &SimilarityOptions::default())
        .await
        .unwrap();
    assert!(other_company.is_empty());
}
