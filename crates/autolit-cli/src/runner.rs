//! Multi-source collection run: scrape, combine, summarize, save

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;

use autolit_core::diseases::{self, DiseaseSummary};
use autolit_core::paper::{self, Paper};
use autolit_core::stats::{CollectionStats, collection_stats};
use autolit_core::export;

/// Source tags in scrape order.
pub const SOURCES: &[&str] = &["pubmed", "europe_pmc", "openalex", "biorxiv"];

pub fn is_valid_source(source: &str) -> bool {
    SOURCES.contains(&source)
}

/// Resolved run parameters after config and CLI merging.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub diseases: Vec<String>,
    pub sources: Vec<String>,
    pub max_results: usize,
    pub years_back: u32,
    pub email: Option<String>,
}

/// Per-disease block in the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseReport {
    pub name: String,
    pub paper_count: usize,
    pub profile: DiseaseSummary,
}

/// Top-level summary written next to the paper dump.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scraped_at: DateTime<Utc>,
    pub total_papers: usize,
    pub papers_by_source: BTreeMap<String, usize>,
    pub papers_by_disease: BTreeMap<String, DiseaseReport>,
    pub statistics: CollectionStats,
}

/// One source's scrape. Adapter failures degrade to an empty batch so the
/// remaining sources still run.
fn scrape_source(source: &str, opts: &RunOptions) -> Vec<Paper> {
    log::info!("scraping {source}...");
    let result = match source {
        "pubmed" => autolit_pubmed::Client::new(opts.email.clone())
            .scrape_diseases(&opts.diseases, opts.max_results),
        "europe_pmc" => {
            autolit_europepmc::Client::new().scrape_diseases(&opts.diseases, opts.max_results)
        }
        "openalex" => autolit_openalex::Client::new(opts.email.clone())
            .scrape_diseases(&opts.diseases, opts.max_results),
        "biorxiv" => {
            autolit_biorxiv::Client::new(true).scrape_diseases(&opts.diseases, opts.years_back)
        }
        other => {
            log::warn!("unknown source {other}, skipping");
            Ok(Vec::new())
        }
    };

    match result {
        Ok(papers) => papers,
        Err(e) => {
            log::error!("{source} scrape failed: {e:#}");
            Vec::new()
        }
    }
}

/// Scrape every requested source, in order.
pub fn scrape_all(opts: &RunOptions) -> Vec<(String, Vec<Paper>)> {
    opts.sources
        .iter()
        .map(|source| {
            let papers = scrape_source(source, opts);
            log::info!("{source}: {} papers", papers.len());
            (source.clone(), papers)
        })
        .collect()
}

/// Concatenate per-source batches, drop invalid records, collapse duplicate
/// identities and sort newest first.
pub fn combine(per_source: Vec<(String, Vec<Paper>)>) -> Vec<Paper> {
    let concatenated: Vec<Paper> = per_source
        .into_iter()
        .flat_map(|(_, papers)| papers)
        .collect();

    let before = concatenated.len();
    let mut papers = paper::deduplicate(paper::filter_valid(concatenated));
    log::info!(
        "combined {} records into {} unique papers",
        before,
        papers.len()
    );

    paper::sort_by_date(&mut papers, true);
    papers
}

pub fn summarize(
    papers: &[Paper],
    per_source_counts: &[(String, usize)],
    disease_keys: &[String],
) -> RunSummary {
    let papers_by_source: BTreeMap<String, usize> = per_source_counts
        .iter()
        .map(|(source, count)| (source.clone(), *count))
        .collect();

    let mut papers_by_disease = BTreeMap::new();
    for key in disease_keys {
        let Some(disease) = diseases::get(key) else {
            continue;
        };
        papers_by_disease.insert(
            key.clone(),
            DiseaseReport {
                name: disease.name.to_string(),
                paper_count: paper::by_disease(papers, key).len(),
                profile: disease.summary(),
            },
        );
    }

    RunSummary {
        scraped_at: Utc::now(),
        total_papers: papers.len(),
        papers_by_source,
        papers_by_disease,
        statistics: collection_stats(papers),
    }
}

fn name_part(names: &[String], plural: &str) -> String {
    match names.len() {
        0 => format!("0_{plural}"),
        1 => names[0].clone(),
        2..=3 => names.join("_"),
        n => format!("{n}_{plural}"),
    }
}

/// `autoimmune_papers_<diseases>_<sources>_<timestamp>` file stem.
pub fn output_stem(diseases: &[String], sources: &[String], at: DateTime<Utc>) -> String {
    format!(
        "autoimmune_papers_{}_{}_{}",
        name_part(diseases, "diseases"),
        name_part(sources, "sources"),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Write the requested formats; the JSON summary accompanies the JSON dump.
///
/// A failing format is logged and skipped; formats already written stay on
/// disk. Returns the paths that were actually written.
pub fn save_results(
    papers: &[Paper],
    summary: &RunSummary,
    output_dir: &Path,
    stem: &str,
    as_json: bool,
    as_csv: bool,
) -> Vec<PathBuf> {
    let mut written = Vec::new();

    if as_json {
        let papers_path = output_dir.join(format!("{stem}.json"));
        match export::write_json(&papers, &papers_path) {
            Ok(()) => written.push(papers_path),
            Err(e) => log::error!("failed to write {}: {e}", papers_path.display()),
        }

        let summary_path = output_dir.join(format!("{stem}_summary.json"));
        match export::write_json(summary, &summary_path) {
            Ok(()) => written.push(summary_path),
            Err(e) => log::error!("failed to write {}: {e}", summary_path.display()),
        }
    }

    if as_csv {
        let csv_path = output_dir.join(format!("{stem}.csv"));
        match export::write_csv(papers, &csv_path) {
            Ok(()) => written.push(csv_path),
            Err(e) => log::error!("failed to write {}: {e}", csv_path.display()),
        }
    }

    for path in &written {
        log::info!("wrote {}", path.display());
    }
    written
}

pub struct RunOutcome {
    pub papers: Vec<Paper>,
    pub summary: RunSummary,
    pub files: Vec<PathBuf>,
}

/// Full collection run. Validation failures abort before any network call.
///
/// Unknown disease keys and source names are dropped with a warning; the
/// run fails only when nothing valid remains.
pub fn run(
    opts: &RunOptions,
    output_dir: &Path,
    as_json: bool,
    as_csv: bool,
) -> Result<RunOutcome> {
    let diseases: Vec<String> = diseases::validate_keys(&opts.diseases)
        .into_iter()
        .map(str::to_string)
        .collect();
    for key in &opts.diseases {
        if !diseases::is_valid_key(key) {
            log::warn!("ignoring unknown disease key {key}");
        }
    }
    if diseases.is_empty() {
        bail!(
            "no valid diseases in {:?}; known keys: {}",
            opts.diseases,
            diseases::all_keys().join(", ")
        );
    }

    let sources: Vec<String> = opts
        .sources
        .iter()
        .filter(|s| {
            let known = is_valid_source(s);
            if !known {
                log::warn!("ignoring unknown source {s}");
            }
            known
        })
        .cloned()
        .collect();
    if sources.is_empty() {
        bail!(
            "no valid sources in {:?}; known sources: {}",
            opts.sources,
            SOURCES.join(", ")
        );
    }

    if !as_json && !as_csv {
        bail!("no output format selected");
    }

    let opts = RunOptions {
        diseases,
        sources,
        ..opts.clone()
    };

    let per_source = scrape_all(&opts);
    let per_source_counts: Vec<(String, usize)> = per_source
        .iter()
        .map(|(source, papers)| (source.clone(), papers.len()))
        .collect();

    let papers = combine(per_source);
    let summary = summarize(&papers, &per_source_counts, &opts.diseases);

    let stem = output_stem(&opts.diseases, &opts.sources, summary.scraped_at);
    let files = save_results(&papers, &summary, output_dir, &stem, as_json, as_csv);

    Ok(RunOutcome {
        papers,
        summary,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn paper(title: &str, doi: &str, source: &str, date: Option<(i32, u32, u32)>) -> Paper {
        Paper {
            title: title.to_string(),
            abstract_text: "An abstract.".to_string(),
            doi: doi.to_string(),
            source: source.to_string(),
            publication_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..Default::default()
        }
    }

    #[test]
    fn combine_dedups_across_sources_and_sorts() {
        let shared = "10.1000/shared";
        let per_source = vec![
            (
                "pubmed".to_string(),
                vec![
                    paper("Old paper", shared, "pubmed", Some((2020, 1, 1))),
                    paper("Undated", "", "pubmed", None),
                ],
            ),
            (
                "openalex".to_string(),
                vec![
                    paper("Old paper again", shared, "openalex", Some((2020, 1, 1))),
                    paper("New paper", "10.1000/new", "openalex", Some((2024, 6, 1))),
                    Paper::default(), // invalid, dropped
                ],
            ),
        ];

        let combined = combine(per_source);
        assert_eq!(combined.len(), 3);
        // newest first, first-seen duplicate kept, undated last
        assert_eq!(combined[0].title, "New paper");
        assert_eq!(combined[1].title, "Old paper");
        assert_eq!(combined[1].source, "pubmed");
        assert_eq!(combined[2].title, "Undated");
    }

    #[test]
    fn summary_counts_by_disease() {
        let mut a = paper("A", "10.1/a", "pubmed", Some((2023, 1, 1)));
        a.add_disease_relevance("crohns");
        let mut b = paper("B", "10.1/b", "openalex", Some((2023, 2, 1)));
        b.add_disease_relevance("crohns");
        b.add_disease_relevance("systemic_lupus");

        let papers = vec![a, b];
        let counts = vec![("pubmed".to_string(), 1), ("openalex".to_string(), 1)];
        let keys = vec!["crohns".to_string(), "systemic_lupus".to_string()];

        let summary = summarize(&papers, &counts, &keys);
        assert_eq!(summary.total_papers, 2);
        assert_eq!(summary.papers_by_disease["crohns"].paper_count, 2);
        assert_eq!(summary.papers_by_disease["systemic_lupus"].paper_count, 1);
        assert_eq!(summary.papers_by_source["pubmed"], 1);
        assert_eq!(summary.statistics.total_papers, 2);
    }

    #[test]
    fn stem_collapses_long_lists() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap();
        let sources = vec!["pubmed".to_string()];

        let one = vec!["crohns".to_string()];
        assert_eq!(
            output_stem(&one, &sources, at),
            "autoimmune_papers_crohns_pubmed_20240305_102030"
        );

        let three = vec![
            "crohns".to_string(),
            "systemic_lupus".to_string(),
            "type1_diabetes".to_string(),
        ];
        assert!(output_stem(&three, &sources, at)
            .contains("crohns_systemic_lupus_type1_diabetes"));

        let five: Vec<String> = autolit_core::diseases::all_keys()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert!(output_stem(&five, &sources, at).contains("5_diseases"));

        let four: Vec<String> = SOURCES.iter().map(|s| s.to_string()).collect();
        assert!(output_stem(&one, &four, at).contains("4_sources"));
    }

    #[test]
    fn save_results_honors_format_flags() {
        let dir = tempfile::tempdir().unwrap();
        let papers = vec![paper("A", "10.1/a", "pubmed", Some((2023, 1, 1)))];
        let summary = summarize(&papers, &[("pubmed".to_string(), 1)], &[]);

        let files = save_results(&papers, &summary, dir.path(), "stem", true, true);
        assert_eq!(files.len(), 3);
        assert!(dir.path().join("stem.json").exists());
        assert!(dir.path().join("stem_summary.json").exists());
        assert!(dir.path().join("stem.csv").exists());

        let json_only = save_results(&papers, &summary, dir.path(), "j", true, false);
        assert_eq!(json_only.len(), 2);
    }

    #[test]
    fn run_rejects_bad_input_before_scraping() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RunOptions {
            diseases: vec!["not_a_disease".to_string()],
            sources: vec!["pubmed".to_string()],
            max_results: 10,
            years_back: 1,
            email: None,
        };
        assert!(run(&opts, dir.path(), true, false).is_err());

        opts.diseases = vec!["crohns".to_string()];
        opts.sources = vec!["not_a_source".to_string()];
        assert!(run(&opts, dir.path(), true, false).is_err());

        opts.sources = vec!["pubmed".to_string()];
        assert!(run(&opts, dir.path(), false, false).is_err());
    }
}
