//! Harvest pipeline: search, normalize, enrich, serialize.
//!
//! Documents are written in two passes over the collection: journal
//! articles first, then everything else, each pass in search order. Only
//! output I/O failures abort a run; everything that goes wrong with a
//! single record degrades that record and is logged.

use crate::abstracts::retrieve_abstract;
use crate::authors::resolve_authors;
use crate::config::ScopusConfig;
use crate::document::Document;
use crate::error::Result;
use crate::query::SearchQuery;
use crate::ris::{enriched_journal_block, journal_block, non_journal_block, route, Route};
use crate::scopus::{collect_entries, ScopusClient};
use crate::writer::{non_journal_tally, save_review_csv, BatchWriter, Counts, ReviewItem, Tally};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// End-of-run report.
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub counts: Counts,
    /// Raw entries collected from the search API
    pub retrieved: usize,
    pub pagination_interrupted: bool,
    /// Journal articles without a DOI
    pub review: Vec<ReviewItem>,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub filename: String,
    pub path: PathBuf,
    /// Side file listing `summary.review`, when there was anything to list
    pub review_path: Option<PathBuf>,
    pub summary: HarvestSummary,
}

/// Runs harvests against one Scopus account.
pub struct Harvester {
    client: ScopusClient,
    config: ScopusConfig,
}

impl Harvester {
    pub fn new(config: ScopusConfig) -> Result<Self> {
        Ok(Self {
            client: ScopusClient::new(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &ScopusConfig {
        &self.config
    }

    /// Harvest one selection into its RIS file.
    pub async fn run(&self, query: &SearchQuery) -> Result<HarvestOutcome> {
        let started_at = Local::now();
        let timer = Instant::now();
        info!(selection = %query, "Starting harvest");

        std::fs::create_dir_all(&self.config.output_dir)?;
        let filename = query.filename();
        let path = self.config.output_dir.join(&filename);
        // Readers of `path` see the previous file until the run completes.
        let staging = self.config.output_dir.join(format!("{}.part", filename));
        let file = File::create(&staging)?;

        let pagination =
            collect_entries(&self.client, &query.expression(), self.config.page_size).await;
        let retrieved = pagination.entries.len();

        let mut documents: Vec<Document> = pagination
            .entries
            .into_iter()
            .map(Document::from_entry)
            .collect();
        for doc in documents.iter_mut() {
            doc.author_names = self.authors_for(doc).await;
        }
        info!(documents = documents.len(), "Documents normalized");

        let mut writer = BatchWriter::new(BufWriter::new(file));
        self.write_journals(&documents, &mut writer).await?;
        write_others(&documents, &mut writer)?;
        let (counts, review) = writer.finish()?;
        std::fs::rename(&staging, &path)?;

        let review_path = if review.is_empty() {
            None
        } else {
            let review_path = path.with_file_name(review_filename(&filename));
            save_review_csv(&review_path, &review)?;
            Some(review_path)
        };

        let summary = HarvestSummary {
            counts,
            retrieved,
            pagination_interrupted: pagination.interrupted.is_some(),
            review,
            started_at,
            elapsed: timer.elapsed(),
        };
        info!(
            file = %path.display(),
            journals = summary.counts.journal_articles,
            abstract_fallbacks = summary.counts.abstract_fallbacks,
            missing_identifier = summary.counts.missing_identifier,
            books = summary.counts.books,
            chapters = summary.counts.chapters,
            elapsed_secs = summary.elapsed.as_secs(),
            "Harvest complete"
        );

        Ok(HarvestOutcome {
            filename,
            path,
            review_path,
            summary,
        })
    }

    /// Author names for a document; empty when they cannot be resolved.
    async fn authors_for(&self, doc: &Document) -> Vec<String> {
        let Some(link) = doc.author_link.as_deref() else {
            warn!(title = %doc.title, "No author link, leaving authors empty");
            return Vec::new();
        };
        match resolve_authors(&self.client, link).await {
            Ok(names) => names,
            Err(e) => {
                warn!(title = %doc.title, error = %e, "Author lookup failed");
                Vec::new()
            }
        }
    }

    async fn write_journals<W: Write>(
        &self,
        documents: &[Document],
        writer: &mut BatchWriter<W>,
    ) -> Result<()> {
        for doc in documents.iter().filter(|d| d.is_journal()) {
            match route(doc) {
                Route::EnrichedJournal { doi } => {
                    match retrieve_abstract(&self.client, doi).await {
                        Ok(record) => {
                            writer.append(&enriched_journal_block(&record), Tally::Journal)?
                        }
                        Err(e) => {
                            warn!(
                                doi = doi,
                                title = %doc.title,
                                error = %e,
                                "Abstract lookup failed, using search record"
                            );
                            writer.append(&journal_block(doc), Tally::AbstractFallback)?;
                        }
                    }
                }
                _ => {
                    warn!(
                        title = %doc.title,
                        authors = ?doc.author_names,
                        subtype = %doc.subtype_description,
                        "Journal article without DOI, flagged for review"
                    );
                    writer.append(&journal_block(doc), Tally::MissingIdentifier)?;
                    writer.flag_for_review(ReviewItem::from(doc));
                }
            }
        }
        Ok(())
    }
}

fn write_others<W: Write>(documents: &[Document], writer: &mut BatchWriter<W>) -> Result<()> {
    for doc in documents.iter().filter(|d| !d.is_journal()) {
        let block = non_journal_block(doc);
        writer.append(&block, non_journal_tally(&block))?;
    }
    Ok(())
}

/// `<stem>_review.csv` next to the RIS file.
fn review_filename(ris_filename: &str) -> String {
    let stem = ris_filename.strip_suffix(".ris").unwrap_or(ris_filename);
    format!("{}_review.csv", stem)
}
