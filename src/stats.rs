//! Collection statistics and health overview.
//!
//! Summarizes what is indexed and how queries have been performing. Used by
//! `docintel stats`.

use anyhow::Result;

use crate::config::Config;
use crate::rag_system::DocumentRag;

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let rag = DocumentRag::from_config(config).await?;
    let stats = rag.collection_stats().await.into_result()?;
    let documents = rag.get_uploaded_documents().await.into_result()?.documents;

    let db_path = config.db_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    println!("docintel collection stats");
    println!("=========================");
    println!();
    println!("  Database:    {}", db_path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Embeddings:  {}", rag.embedder_model());
    println!("  LLM:         {}", rag.generator_model());
    println!();
    println!("  Documents:   {}", stats.total_documents);
    println!("  Chunks:      {}", stats.total_chunks);
    println!("  Queries:     {}", stats.total_queries);
    println!(
        "  Avg latency: {}",
        stats
            .avg_latency_ms
            .map(format_latency)
            .unwrap_or_else(|| "n/a".to_string())
    );

    if !documents.is_empty() {
        println!();
        println!("  By document:");
        println!(
            "  {:<36} {:>6} {:>8}   {}",
            "FILENAME", "PAGES", "CHUNKS", "UPLOADED"
        );
        println!("  {}", "-".repeat(72));
        for d in &documents {
            println!(
                "  {:<36} {:>6} {:>8}   {}",
                d.filename,
                d.page_count,
                d.chunk_count,
                format_ts_relative(d.uploaded_at)
            );
        }
    }

    println!();
    Ok(())
}

pub fn format_latency(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
pub fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MB");
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(250.0), "250 ms");
        assert_eq!(format_latency(1500.0), "1.50 s");
    }

    #[test]
    fn test_format_ts() {
        assert_eq!(format_ts_iso(0), "1970-01-01 00:00");
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
        assert_eq!(format_ts_relative(now - 86400), "1 day ago");
    }
}
