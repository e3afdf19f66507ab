//! Question answering commands: `query` and `history`.

use anyhow::Result;

use crate::config::Config;
use crate::rag_system::DocumentRag;
use crate::stats::{format_latency, format_ts_iso};

pub async fn run_query(config: &Config, question: &str, source: Option<&str>) -> Result<()> {
    let rag = DocumentRag::from_config(config).await?;
    let report = rag.query(question, source).await.into_result()?;

    println!("{}", report.answer);
    println!();
    println!("--- Sources ({}) ---", report.sources.len());
    for (i, c) in report.sources.iter().enumerate() {
        println!(
            "{}. {}, page {} (score {:.3})",
            i + 1,
            c.source,
            c.page,
            c.score
        );
        println!("    {}", c.content_preview.replace('\n', " "));
    }
    println!();
    println!("latency: {}", format_latency(report.latency_ms as f64));
    Ok(())
}

pub async fn run_history(config: &Config, limit: Option<usize>) -> Result<()> {
    let rag = DocumentRag::from_config(config).await?;
    let history = rag.query_history(limit).await.into_result()?;

    if history.queries.is_empty() {
        println!("No queries recorded.");
        return Ok(());
    }

    for q in &history.queries {
        println!(
            "[{}] {} ({}, {})",
            format_ts_iso(q.created_at),
            q.question,
            q.status.as_str(),
            format_latency(q.latency_ms as f64)
        );
        match (&q.answer, &q.error) {
            (Some(answer), _) => {
                let first_line = answer.lines().next().unwrap_or_default();
                println!("    {}", first_line);
            }
            (None, Some(err)) => println!("    error: {}", err),
            (None, None) => {}
        }
        if !q.sources.is_empty() {
            let sources: Vec<String> = q
                .sources
                .iter()
                .map(|c| format!("{} p.{}", c.source, c.page))
                .collect();
            println!("    sources: {}", sources.join(", "));
        }
    }
    Ok(())
}
