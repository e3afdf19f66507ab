//! Document management commands: `upload`, `documents`, `delete`, `reset`.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::rag_system::{DocumentRag, OpResult};
use crate::stats::format_ts_relative;

/// Upload each PDF in turn. Failures are reported per file and do not stop
/// the remaining uploads; the command fails if any upload failed.
pub async fn run_upload(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let rag = DocumentRag::from_config(config).await?;

    let mut failed = 0usize;
    for path in paths {
        match rag.upload_document(path).await {
            OpResult::Success(report) => {
                println!(
                    "uploaded {} ({} pages, {} chunks)",
                    report.filename, report.pages, report.chunks_created
                );
                println!("    id: {}", report.document_id);
            }
            OpResult::Error(e) => {
                failed += 1;
                eprintln!("Error: {} [{}]", e.message, e.kind);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} uploads failed", failed, paths.len());
    }
    Ok(())
}

pub async fn run_documents(config: &Config) -> Result<()> {
    let rag = DocumentRag::from_config(config).await?;
    let list = rag.get_uploaded_documents().await.into_result()?;

    if list.documents.is_empty() {
        println!("No documents uploaded.");
        return Ok(());
    }

    for (i, d) in list.documents.iter().enumerate() {
        println!("{}. {}", i + 1, d.filename);
        println!("    id: {}", d.id);
        println!(
            "    pages: {}  chunks: {}  uploaded: {}",
            d.page_count,
            d.chunk_count,
            format_ts_relative(d.uploaded_at)
        );
        println!();
    }
    println!("{} document(s)", list.total);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let rag = DocumentRag::from_config(config).await?;
    let report = rag.delete_document(id).await.into_result()?;
    println!(
        "{} ({} chunks removed)",
        report.message, report.chunks_removed
    );
    Ok(())
}

pub async fn run_reset(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        bail!("reset deletes every document and query record; pass --yes to confirm");
    }
    let rag = DocumentRag::from_config(config).await?;
    let report = rag.reset_collection().await.into_result()?;
    println!("{}", report.message);
    Ok(())
}
