//! Standalone HTML reports over the document collection and query history.
//!
//! Two artifacts, both written on demand into `[dashboard].output_dir`:
//!
//! - `rag_dashboard_<YYYYmmdd_HHMMSS>.html`: document distribution,
//!   per-query latency, sources per query, retrieval similarity heatmap,
//!   latency histogram, question length distribution, source usage,
//!   frequent question terms and the average latency against a 2 s target.
//! - `metrics_<YYYYmmdd_HHMMSS>.html`: document and chunk counts with the
//!   document list.
//!
//! Charts are inline SVG, so the files open without network access. All
//! user-supplied text (filenames, questions) is HTML-escaped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use docintel_core::models::{CollectionStats, Document, QueryRecord, QueryStatus};

use crate::rag_system::DocumentRag;

/// Average latency above this is flagged on the dashboard.
pub const LATENCY_TARGET_SECS: f64 = 2.0;

const TOP_TERMS: usize = 10;
const LABEL_CHARS: usize = 28;
/// Most recent queries shown in the similarity heatmap.
const HEATMAP_ROWS: usize = 10;

/// Words ignored when counting question terms.
const STOPWORDS: &[&str] = &[
    "about", "does", "from", "have", "that", "their", "there", "these", "this", "what", "when",
    "where", "which", "with", "would", "your",
];

/// Everything a report is rendered from.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub documents: Vec<Document>,
    /// Newest first, as returned by the store.
    pub queries: Vec<QueryRecord>,
    pub stats: CollectionStats,
}

impl DashboardData {
    pub async fn collect(rag: &DocumentRag) -> Result<Self> {
        let store = rag.store();
        Ok(Self {
            documents: store.list_documents().await?,
            queries: store.list_queries(None).await?,
            stats: store.stats().await?,
        })
    }
}

/// Paths of the files written by one dashboard run.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub files: Vec<String>,
}

/// Collect data from `rag` and write the metrics card, plus the full
/// dashboard unless `metrics_only` is set.
pub async fn write_reports(
    rag: &DocumentRag,
    output_dir: &Path,
    metrics_only: bool,
) -> Result<DashboardReport> {
    let data = DashboardData::collect(rag).await?;
    let now = Local::now();

    let mut files = Vec::new();
    if !metrics_only {
        files.push(generate_full_dashboard(&data, output_dir, now)?);
    }
    files.push(generate_metrics_card(&data, output_dir, now)?);

    for f in &files {
        tracing::info!(path = %f.display(), "dashboard written");
    }
    Ok(DashboardReport {
        files: files.iter().map(|p| p.display().to_string()).collect(),
    })
}

pub fn generate_full_dashboard<Tz: TimeZone>(
    data: &DashboardData,
    output_dir: &Path,
    now: DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let chronological: Vec<&QueryRecord> = data.queries.iter().rev().collect();

    let doc_labels: Vec<String> = data.documents.iter().map(|d| d.filename.clone()).collect();
    let doc_values: Vec<f64> = data.documents.iter().map(|d| d.chunk_count as f64).collect();

    let query_labels: Vec<String> = chronological
        .iter()
        .enumerate()
        .map(|(i, q)| format!("#{} {}", i + 1, q.question))
        .collect();
    let latencies: Vec<f64> = chronological
        .iter()
        .map(|q| q.latency_ms as f64 / 1000.0)
        .collect();
    let source_counts: Vec<f64> = chronological.iter().map(|q| q.sources.len() as f64).collect();

    let (hist_labels, hist_values) = latency_histogram(&latencies);
    let (length_labels, length_values) = question_lengths(&data.queries);
    let (usage_labels, usage_values) = split_pairs(source_usage(&data.queries));
    let (term_labels, term_values) = split_pairs(top_terms(&data.queries, TOP_TERMS));

    let failed = data
        .queries
        .iter()
        .filter(|q| q.status == QueryStatus::Error)
        .count();
    let avg_secs = data.stats.avg_latency_ms.map(|ms| ms / 1000.0);

    let mut body = String::new();
    body.push_str(&summary_tiles(&[
        ("Documents", data.stats.total_documents.to_string()),
        ("Chunks", data.stats.total_chunks.to_string()),
        ("Queries", data.stats.total_queries.to_string()),
        ("Failed queries", failed.to_string()),
    ]));
    body.push_str(&panel("Average latency", &latency_gauge(avg_secs)));
    body.push_str(&panel(
        "Document distribution (chunks per document)",
        &bar_chart(&doc_labels, &doc_values, ""),
    ));
    body.push_str(&panel(
        "Query latency",
        &bar_chart(&query_labels, &latencies, " s"),
    ));
    body.push_str(&panel(
        "Sources per query",
        &bar_chart(&query_labels, &source_counts, ""),
    ));
    body.push_str(&panel(
        "Retrieval similarity (score by rank)",
        &similarity_heatmap(&chronological),
    ));
    body.push_str(&panel(
        "Latency distribution",
        &bar_chart(&hist_labels, &hist_values, ""),
    ));
    body.push_str(&panel(
        "Question length (words)",
        &bar_chart(&length_labels, &length_values, ""),
    ));
    body.push_str(&panel(
        "Source usage",
        &bar_chart(&usage_labels, &usage_values, ""),
    ));
    body.push_str(&panel(
        "Frequent question terms",
        &bar_chart(&term_labels, &term_values, ""),
    ));

    let html = page("RAG Dashboard", &now.format("%Y-%m-%d %H:%M:%S").to_string(), &body);
    write_file(output_dir, &format!("rag_dashboard_{}.html", now.format("%Y%m%d_%H%M%S")), &html)
}

pub fn generate_metrics_card<Tz: TimeZone>(
    data: &DashboardData,
    output_dir: &Path,
    now: DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let docs = data.stats.total_documents;
    let chunks = data.stats.total_chunks;
    let avg_chunks = if docs > 0 {
        format!("{:.1}", chunks as f64 / docs as f64)
    } else {
        "0".to_string()
    };

    let mut body = summary_tiles(&[
        ("Documents", docs.to_string()),
        ("Chunks", chunks.to_string()),
        ("Avg chunks / document", avg_chunks),
    ]);

    let mut table = String::from(
        "<table><thead><tr><th>Document</th><th>Pages</th><th>Chunks</th><th>Uploaded</th></tr></thead><tbody>",
    );
    if data.documents.is_empty() {
        table.push_str("<tr><td colspan=\"4\" class=\"empty\">No documents uploaded.</td></tr>");
    }
    for d in &data.documents {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&d.filename),
            d.page_count,
            d.chunk_count,
            format_ts(d.uploaded_at),
        ));
    }
    table.push_str("</tbody></table>");
    body.push_str(&panel("Documents", &table));

    let html = page("RAG Metrics", &now.format("%Y-%m-%d %H:%M:%S").to_string(), &body);
    write_file(output_dir, &format!("metrics_{}.html", now.format("%Y%m%d_%H%M%S")), &html)
}

fn write_file(dir: &Path, name: &str, html: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating dashboard directory {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

// ============ Aggregations ============

const HISTOGRAM_EDGES: &[f64] = &[0.5, 1.0, 2.0, 5.0];

/// Bucket latencies (seconds) into fixed ranges.
fn latency_histogram(latencies: &[f64]) -> (Vec<String>, Vec<f64>) {
    let mut labels = Vec::new();
    let mut lower = 0.0;
    for edge in HISTOGRAM_EDGES {
        labels.push(format!("{}-{} s", lower, edge));
        lower = *edge;
    }
    labels.push(format!("{}+ s", lower));

    let mut counts = vec![0.0; labels.len()];
    for &l in latencies {
        let idx = HISTOGRAM_EDGES
            .iter()
            .position(|edge| l < *edge)
            .unwrap_or(HISTOGRAM_EDGES.len());
        counts[idx] += 1.0;
    }
    (labels, counts)
}

const LENGTH_EDGES: &[usize] = &[5, 10, 15, 20];

/// Bucket questions by word count.
fn question_lengths(queries: &[QueryRecord]) -> (Vec<String>, Vec<f64>) {
    let mut labels = Vec::new();
    let mut lower = 1;
    for edge in LENGTH_EDGES {
        labels.push(format!("{}-{} words", lower, edge));
        lower = edge + 1;
    }
    labels.push(format!("{}+ words", lower));

    let mut counts = vec![0.0; labels.len()];
    for q in queries {
        let words = q.question.split_whitespace().count();
        let idx = LENGTH_EDGES
            .iter()
            .position(|edge| words <= *edge)
            .unwrap_or(LENGTH_EDGES.len());
        counts[idx] += 1.0;
    }
    (labels, counts)
}

/// How often each source file was cited, most cited first.
fn source_usage(queries: &[QueryRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for q in queries {
        for s in &q.sources {
            *counts.entry(s.source.as_str()).or_default() += 1;
        }
    }
    sorted_counts(counts)
}

/// The `n` most frequent question words of four or more letters.
fn top_terms(queries: &[QueryRecord], n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for q in queries {
        for word in q
            .question
            .split(|c: char| !c.is_alphanumeric())
            .map(|w| w.to_lowercase())
            .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(&w.as_str()))
        {
            *counts.entry(word).or_default() += 1;
        }
    }
    let mut sorted = sorted_counts(counts);
    sorted.truncate(n);
    sorted
}

fn sorted_counts<K: Into<String>>(counts: HashMap<K, usize>) -> Vec<(String, usize)> {
    let mut v: Vec<(String, usize)> = counts.into_iter().map(|(k, c)| (k.into(), c)).collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}

fn split_pairs(pairs: Vec<(String, usize)>) -> (Vec<String>, Vec<f64>) {
    pairs.into_iter().map(|(k, c)| (k, c as f64)).unzip()
}

// ============ Rendering ============

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn truncate_label(s: &str) -> String {
    if s.chars().count() <= LABEL_CHARS {
        s.to_string()
    } else {
        let cut: String = s.chars().take(LABEL_CHARS - 1).collect();
        format!("{}…", cut)
    }
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

/// Horizontal bar chart as inline SVG.
fn bar_chart(labels: &[String], values: &[f64], unit: &str) -> String {
    if values.is_empty() {
        return "<p class=\"empty\">No data yet.</p>".to_string();
    }
    const ROW: usize = 24;
    const LABEL_W: f64 = 210.0;
    const BAR_W: f64 = 360.0;

    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    let height = ROW * values.len() + 8;
    let mut svg = format!(
        "<svg class=\"chart\" width=\"660\" height=\"{}\" viewBox=\"0 0 660 {}\">",
        height, height
    );
    for (i, (label, value)) in labels.iter().zip(values).enumerate() {
        let y = (i * ROW + 4) as f64;
        let w = if max > 0.0 { value / max * BAR_W } else { 0.0 };
        svg.push_str(&format!(
            "<text x=\"0\" y=\"{:.0}\">{}</text>\
             <rect x=\"{:.0}\" y=\"{:.0}\" width=\"{:.1}\" height=\"18\" rx=\"3\"></rect>\
             <text x=\"{:.1}\" y=\"{:.0}\" class=\"value\">{}{}</text>",
            y + 14.0,
            html_escape(&truncate_label(label)),
            LABEL_W,
            y,
            w,
            LABEL_W + w + 6.0,
            y + 14.0,
            format_value(*value),
            unit,
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// One row per recent query with citations, one cell per citation rank,
/// shaded by similarity score.
fn similarity_heatmap(chronological: &[&QueryRecord]) -> String {
    let rows: Vec<(usize, &QueryRecord)> = chronological
        .iter()
        .enumerate()
        .filter(|(_, q)| !q.sources.is_empty())
        .map(|(i, q)| (i + 1, *q))
        .collect();
    let rows = &rows[rows.len().saturating_sub(HEATMAP_ROWS)..];
    let columns = rows.iter().map(|(_, q)| q.sources.len()).max().unwrap_or(0);
    if columns == 0 {
        return "<p class=\"empty\">No data yet.</p>".to_string();
    }

    const ROW: usize = 26;
    const CELL: usize = 60;
    const LABEL_W: usize = 210;
    let width = LABEL_W + CELL * columns;
    let height = ROW * (rows.len() + 1);
    let mut svg = format!(
        "<svg class=\"heatmap\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
        width, height, width, height
    );
    for rank in 0..columns {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"16\" class=\"rank\">#{}</text>",
            LABEL_W + rank * CELL + CELL / 2,
            rank + 1
        ));
    }
    for (row, (n, q)) in rows.iter().enumerate() {
        let y = (row + 1) * ROW;
        svg.push_str(&format!(
            "<text x=\"0\" y=\"{}\">{}</text>",
            y + 17,
            html_escape(&truncate_label(&format!("#{} {}", n, q.question)))
        ));
        for (rank, citation) in q.sources.iter().enumerate() {
            let x = LABEL_W + rank * CELL;
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill-opacity=\"{:.2}\"></rect>\
                 <text x=\"{}\" y=\"{}\" class=\"score\">{:.3}</text>",
                x,
                y,
                CELL - 2,
                ROW - 2,
                citation.score.clamp(0.05, 1.0),
                x + CELL / 2,
                y + 17,
                citation.score
            ));
        }
    }
    svg.push_str("</svg>");
    svg
}

/// Average latency on a linear scale with the target marked.
fn latency_gauge(avg_secs: Option<f64>) -> String {
    let Some(avg) = avg_secs else {
        return "<p class=\"empty\">No queries recorded yet.</p>".to_string();
    };
    const WIDTH: f64 = 600.0;
    let scale = (LATENCY_TARGET_SECS * 2.0).max(avg * 1.25);
    let bar = avg / scale * WIDTH;
    let target = LATENCY_TARGET_SECS / scale * WIDTH;
    let (class, verdict) = if avg <= LATENCY_TARGET_SECS {
        ("ok", "within target")
    } else {
        ("slow", "above target")
    };
    format!(
        "<p class=\"gauge-value {class}\">{avg:.2} s <span>({verdict}, target {LATENCY_TARGET_SECS:.1} s)</span></p>\
         <svg class=\"gauge\" width=\"620\" height=\"40\" viewBox=\"0 0 620 40\">\
         <rect x=\"0\" y=\"8\" width=\"{WIDTH}\" height=\"20\" class=\"track\"></rect>\
         <rect x=\"0\" y=\"8\" width=\"{bar:.1}\" height=\"20\" class=\"{class}\"></rect>\
         <line x1=\"{target:.1}\" y1=\"2\" x2=\"{target:.1}\" y2=\"34\" class=\"target\"></line>\
         </svg>"
    )
}

fn summary_tiles(tiles: &[(&str, String)]) -> String {
    let mut out = String::from("<div class=\"tiles\">");
    for (label, value) in tiles {
        out.push_str(&format!(
            "<div class=\"tile\"><div class=\"tile-value\">{}</div><div class=\"tile-label\">{}</div></div>",
            html_escape(value),
            html_escape(label)
        ));
    }
    out.push_str("</div>");
    out
}

fn panel(title: &str, content: &str) -> String {
    format!(
        "<section class=\"panel\"><h2>{}</h2>{}</section>",
        html_escape(title),
        content
    )
}

fn page(title: &str, generated: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2rem auto; max-width: 760px; color: #1f2933; background: #f5f7fa; }}
h1 {{ margin-bottom: 0; }}
.generated {{ color: #7b8794; margin-top: .25rem; }}
.tiles {{ display: flex; gap: 1rem; flex-wrap: wrap; margin: 1.5rem 0; }}
.tile {{ background: #fff; border-radius: 8px; padding: 1rem 1.25rem; min-width: 120px; box-shadow: 0 1px 3px rgba(0,0,0,.08); }}
.tile-value {{ font-size: 1.6rem; font-weight: 600; }}
.tile-label {{ color: #7b8794; font-size: .85rem; }}
.panel {{ background: #fff; border-radius: 8px; padding: 1rem 1.25rem; margin-bottom: 1rem; box-shadow: 0 1px 3px rgba(0,0,0,.08); }}
.panel h2 {{ font-size: 1rem; margin-top: 0; }}
.chart text {{ font-size: 12px; fill: #3e4c59; }}
.chart rect {{ fill: #4c63b6; }}
.chart .value {{ fill: #7b8794; }}
.heatmap text {{ font-size: 12px; fill: #3e4c59; }}
.heatmap rect {{ fill: #4c63b6; }}
.heatmap .rank, .heatmap .score {{ text-anchor: middle; }}
.gauge .track {{ fill: #e4e7eb; }}
.gauge .ok, .gauge-value.ok {{ fill: #3f9142; color: #3f9142; }}
.gauge .slow, .gauge-value.slow {{ fill: #ba2525; color: #ba2525; }}
.gauge .target {{ stroke: #1f2933; stroke-width: 2; stroke-dasharray: 4 2; }}
.gauge-value {{ font-size: 1.4rem; font-weight: 600; margin: 0; }}
.gauge-value span {{ font-size: .85rem; font-weight: 400; color: #7b8794; }}
.empty {{ color: #9aa5b1; font-style: italic; }}
table {{ width: 100%; border-collapse: collapse; font-size: .9rem; }}
th, td {{ text-align: left; padding: .4rem .5rem; border-bottom: 1px solid #e4e7eb; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p class="generated">Generated {generated}</p>
{body}
</body>
</html>
"#,
        title = html_escape(title),
        generated = html_escape(generated),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintel_core::models::Citation;

    fn record(question: &str, latency_ms: i64, sources: &[&str], ok: bool) -> QueryRecord {
        QueryRecord {
            id: question.to_string(),
            question: question.to_string(),
            answer: ok.then(|| "answer".to_string()),
            retrieved_chunk_ids: Vec::new(),
            sources: sources
                .iter()
                .map(|s| Citation {
                    document_id: "d".to_string(),
                    source: s.to_string(),
                    page: 1,
                    chunk_id: "c".to_string(),
                    score: 0.9,
                    content_preview: String::new(),
                })
                .collect(),
            latency_ms,
            created_at: 1_700_000_000,
            status: if ok { QueryStatus::Success } else { QueryStatus::Error },
            error: (!ok).then(|| "boom".to_string()),
        }
    }

    fn sample() -> DashboardData {
        DashboardData {
            documents: vec![Document {
                id: "d1".to_string(),
                filename: "<script>alert(1)</script>.pdf".to_string(),
                source_path: "x".to_string(),
                content_hash: "h".to_string(),
                page_count: 3,
                chunk_count: 7,
                uploaded_at: 1_700_000_000,
            }],
            queries: vec![
                record("How do bridges handle wind?", 2500, &["bridges.pdf"], true),
                record("What about bridges & tunnels?", 400, &["bridges.pdf", "tunnels.pdf"], true),
                record("failing question", 100, &[], false),
            ],
            stats: CollectionStats {
                total_documents: 1,
                total_chunks: 7,
                total_queries: 3,
                avg_latency_ms: Some(1000.0),
            },
        }
    }

    fn fixed_now() -> DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_full_dashboard_written_with_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate_full_dashboard(&sample(), dir.path(), fixed_now()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "rag_dashboard_20240309_140507.html"
        );
        let html = std::fs::read_to_string(&path).unwrap();
        // 29 chars, so the bar label is cut to 28.
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;.p…"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("bridges &amp; tun"));
        assert!(html.contains("within target"));
        assert!(html.contains("Frequent question terms"));
        assert!(html.contains("Question length (words)"));
        assert!(html.contains("class=\"heatmap\""));
    }

    #[test]
    fn test_metrics_card() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate_metrics_card(&sample(), &dir.path().join("nested"), fixed_now()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "metrics_20240309_140507.html"
        );
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Avg chunks / document"));
        assert!(html.contains("7.0"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_collection_renders() {
        let data = DashboardData {
            documents: Vec::new(),
            queries: Vec::new(),
            stats: CollectionStats {
                total_documents: 0,
                total_chunks: 0,
                total_queries: 0,
                avg_latency_ms: None,
            },
        };
        let dir = tempfile::tempdir().unwrap();
        let path = generate_full_dashboard(&data, dir.path(), fixed_now()).unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("No data yet."));
        assert!(html.contains("No queries recorded yet."));
    }

    #[test]
    fn test_latency_histogram_buckets() {
        let (labels, counts) = latency_histogram(&[0.1, 0.4, 0.7, 1.5, 2.5, 9.0]);
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[4], "5+ s");
        assert_eq!(counts, vec![2.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_source_usage_and_terms() {
        let data = sample();
        let usage = source_usage(&data.queries);
        assert_eq!(usage[0], ("bridges.pdf".to_string(), 2));
        assert_eq!(usage[1], ("tunnels.pdf".to_string(), 1));

        let terms = top_terms(&data.queries, 3);
        assert_eq!(terms[0], ("bridges".to_string(), 2));
        assert!(terms.iter().all(|(t, _)| t != "what" && t != "about"));
    }

    #[test]
    fn test_question_length_buckets() {
        let data = sample();
        let (labels, counts) = question_lengths(&data.queries);
        assert_eq!(labels[0], "1-5 words");
        assert_eq!(labels[4], "21+ words");
        // 5, 5 and 2 words.
        assert_eq!(counts, vec![3.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_similarity_heatmap_skips_queries_without_sources() {
        let mut strong = record("Which river is longest?", 300, &["rivers.pdf", "maps.pdf"], true);
        strong.sources[1].score = 0.25;
        let failed = record("failing question", 100, &[], false);
        let svg = similarity_heatmap(&[&failed, &strong]);
        assert!(svg.contains("#2 Which river is longest?"));
        assert!(!svg.contains("failing question"));
        assert!(svg.contains(">0.900<"));
        assert!(svg.contains(">0.250<"));
        assert!(svg.contains(">#2<"));

        assert!(similarity_heatmap(&[&failed]).contains("No data yet."));
    }

    #[test]
    fn test_gauge_flags_slow_average() {
        assert!(latency_gauge(Some(3.2)).contains("above target"));
        assert!(latency_gauge(Some(0.8)).contains("within target"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&#39;");
    }
}
