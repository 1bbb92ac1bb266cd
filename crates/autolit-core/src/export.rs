//! Dataset snapshot writers (JSON and CSV)

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::paper::Paper;

/// Pretty-printed UTF-8 JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), value).map_err(io::Error::other)
}

/// Column order for CSV output. The record type is closed, so the header is
/// fixed rather than derived per run.
const CSV_HEADER: &[&str] = &[
    "title",
    "abstract",
    "authors",
    "journal",
    "publication_date",
    "doi",
    "pmid",
    "url",
    "keywords",
    "mesh_terms",
    "source",
    "disease_relevance",
    "metadata",
    "scraped_at",
];

/// One row per paper; list fields joined with `"; "`, absent values as the
/// empty string, metadata as compact JSON.
pub fn write_csv(papers: &[Paper], path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;

    for p in papers {
        let metadata = if p.metadata.is_empty() {
            String::new()
        } else {
            serde_json::Value::Object(p.metadata.clone()).to_string()
        };
        writer.write_record([
            p.title.as_str(),
            p.abstract_text.as_str(),
            &p.authors.join("; "),
            p.journal.as_str(),
            &p.publication_date.map(|d| d.to_string()).unwrap_or_default(),
            p.doi.as_str(),
            p.pmid.as_str(),
            p.url.as_str(),
            &p.keywords.join("; "),
            &p.mesh_terms.join("; "),
            p.source.as_str(),
            &p.disease_relevance.join("; "),
            &metadata,
            &p.scraped_at.to_rfc3339(),
        ])?;
    }
    writer.flush()
}
