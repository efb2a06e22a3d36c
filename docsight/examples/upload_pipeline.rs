//! Example running a CSV upload and a text document through the processor.
//!
//! Storage is in memory and embeddings come from the local hashing model, so
//! nothing here needs network access. Run with `RUST_LOG=docsight=debug` to see
//! the pipeline's log events.

use std::sync::Arc;

use docsight::embedding::HashingEmbedder;
use docsight::logging::setup::{init_logging, LoggingConfig};
use docsight::processing::{DataFileRequest, DocumentRequest, UploadProcessor};
use docsight::repository::{BlobStore, Caller, InMemoryBlobStore, InMemoryRepository, UploadRepository};
use docsight::templates::{DocumentTemplate, SimilarityOptions, TemplateLibrary};

const ORDERS: &str = "\
order_date,units,unit_price,revenue,channel
2024-03-01,12,9.5,114,web
2024-03-02,7,9.5,66.5,store
2024-03-03,15,9.0,135,web
2024-03-04,9,9.5,85.5,web
2024-03-05,21,8.5,178.5,store
2024-03-06,,9.5,,web
";

const PROPOSAL: &str = "\
PROJECT PROPOSAL
We propose migrating the reporting stack over two quarters.

1. Scope
- Consolidate the nightly exports
- Retire the legacy dashboard

Section 2 Budget
| Item | Cost |
| Migration | 40k |
";

#[tokio::main]
async fn main() -> docsight::error::Result<()> {
    init_logging(LoggingConfig::development())?;

    let repository = Arc::new(InMemoryRepository::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let embedder = Arc::new(HashingEmbedder::new(128));

    let processor = UploadProcessor::builder()
        .repository(repository.clone())
        .blob_store(blobs.clone())
        .embedder(embedder.clone())
        .build()?;

    let caller = Caller::new("member-42", "acme");

    // Tabular upload
    let blob_id = blobs.put(ORDERS.as_bytes().to_vec()).await?;
    let data = processor
        .process_data_file(&caller, DataFileRequest::new(blob_id, "orders.csv", "text/csv"))
        .await?;

    println!("== {} rows, {} columns", data.row_count, data.headers.len());
    for column in &data.analysis.columns {
        println!(
            "  {:<12} {:<8} nulls={} unique={}",
            column.name, column.inferred_type, column.null_count, column.unique_count
        );
    }
    for pair in &data.analysis.correlations {
        println!("  {} ~ {}: {} ({})", pair.column1, pair.column2, pair.correlation, pair.strength);
    }
    println!("  quality: {}", data.quality.overall_score);
    for chart in &data.charts {
        println!("  chart: {} ({:.2})", chart.chart_type, chart.confidence);
    }

    // Document upload
    let blob_id = blobs.put(PROPOSAL.as_bytes().to_vec()).await?;
    let document = processor
        .process_document(&caller, DocumentRequest::new(blob_id, "proposal.txt", "text/plain"))
        .await?;

    if let Some(structure) = &document.structure {
        println!("== {} headings, {} words", structure.headings.len(), structure.word_count);
        for heading in &structure.headings {
            println!("  line {:>2}: {}", heading.line_number, heading.text);
        }
    }

    // Match the document against the company's templates
    let mut library = TemplateLibrary::new();
    library.insert(DocumentTemplate::new(
        "tpl-proposal",
        "acme",
        "Project proposal",
        "proposal",
        document.embedding.clone(),
    ));
    let matches = library.find_similar(
        &document.embedding,
        &caller.company_id,
        &SimilarityOptions::default().template_type("proposal"),
    )?;
    for hit in matches {
        println!("  template {} scored {:.3}", hit.template_name, hit.score);
    }

    let stored = repository.list_documents(&caller).await?;
    println!("== {} document record(s) stored", stored.len());

    Ok(())
}
