//! Output stream for citation blocks.
//!
//! The writer owns the RIS stream for a whole run. Blocks are appended as
//! soon as they are produced and are never rolled back.

use crate::document::Document;
use crate::error::Result;
use crate::ris::{CitationBlock, CitationKind};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// What a written block counts towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    /// Journal article written from the abstract service
    Journal,
    /// Journal article with a DOI whose abstract lookup failed
    AbstractFallback,
    /// Journal article without a DOI
    MissingIdentifier,
    /// Book, or any other non-journal type
    Book,
    Chapter,
}

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub journal_articles: usize,
    pub abstract_fallbacks: usize,
    pub missing_identifier: usize,
    pub books: usize,
    pub chapters: usize,
}

impl Counts {
    pub fn written(&self) -> usize {
        self.journal_articles
            + self.abstract_fallbacks
            + self.missing_identifier
            + self.books
            + self.chapters
    }
}

/// Record that needs a manual look
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub title: String,
    pub authors: String,
    pub aggregation_type: String,
    pub subtype_description: String,
    pub publication_name: String,
    pub doi: String,
}

impl From<&Document> for ReviewItem {
    fn from(doc: &Document) -> Self {
        Self {
            title: doc.title.clone(),
            authors: doc.author_names.join("; "),
            aggregation_type: doc.aggregation_type.clone(),
            subtype_description: doc.subtype_description.clone(),
            publication_name: doc.publication_name.clone(),
            doi: doc.doi.clone().unwrap_or_default(),
        }
    }
}

/// Appends citation blocks to a stream and keeps the tallies.
pub struct BatchWriter<W: Write> {
    out: W,
    counts: Counts,
    review: Vec<ReviewItem>,
}

impl<W: Write> BatchWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            counts: Counts::default(),
            review: Vec::new(),
        }
    }

    /// Write one block and count it.
    pub fn append(&mut self, block: &CitationBlock, tally: Tally) -> Result<()> {
        self.out.write_all(block.render().as_bytes())?;
        match tally {
            Tally::Journal => self.counts.journal_articles += 1,
            Tally::AbstractFallback => self.counts.abstract_fallbacks += 1,
            Tally::MissingIdentifier => self.counts.missing_identifier += 1,
            Tally::Book => self.counts.books += 1,
            Tally::Chapter => self.counts.chapters += 1,
        }
        debug!(kind = ?block.kind(), tally = ?tally, "Wrote citation");
        Ok(())
    }

    /// Remember a record for manual follow-up.
    pub fn flag_for_review(&mut self, item: ReviewItem) {
        self.review.push(item);
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Flush the stream and hand back the tallies.
    pub fn finish(mut self) -> Result<(Counts, Vec<ReviewItem>)> {
        self.out.flush()?;
        Ok((self.counts, self.review))
    }
}

/// Tally for a non-journal block.
pub fn non_journal_tally(block: &CitationBlock) -> Tally {
    match block.kind() {
        CitationKind::BookChapter => Tally::Chapter,
        _ => Tally::Book,
    }
}

/// Save review items as CSV.
pub fn save_review_csv(path: &Path, items: &[ReviewItem]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    for item in items {
        wtr.serialize(item)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), count = items.len(), "Saved review list");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ris::{book_block, chapter_block, journal_block};
    use tempfile::tempdir;

    fn doc(title: &str) -> Document {
        Document {
            title: title.to_string(),
            aggregation_type: "Journal".to_string(),
            cover_date: "2020-05-05".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_append_and_count() -> Result<()> {
        let mut writer = BatchWriter::new(Vec::new());
        writer.append(&journal_block(&doc("A")), Tally::Journal)?;
        writer.append(&journal_block(&doc("B")), Tally::MissingIdentifier)?;
        writer.flag_for_review(ReviewItem::from(&doc("B")));
        let chapter = chapter_block(&doc("C"));
        writer.append(&chapter, non_journal_tally(&chapter))?;
        let book = book_block(&doc("D"));
        writer.append(&book, non_journal_tally(&book))?;
        assert_eq!(writer.counts().written(), 4);

        let out = String::from_utf8(writer.out.clone()).expect("utf8");
        let (counts, review) = writer.finish()?;
        assert_eq!(counts.journal_articles, 1);
        assert_eq!(counts.missing_identifier, 1);
        assert_eq!(counts.chapters, 1);
        assert_eq!(counts.books, 1);
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].title, "B");

        assert_eq!(out.matches("ER  - \n\n").count(), 4);
        let order: Vec<&str> = out
            .lines()
            .filter_map(|l| l.strip_prefix("TI  - "))
            .collect();
        assert_eq!(order, vec!["A", "B", "C", "D"]);
        Ok(())
    }

    #[test]
    fn test_save_review_csv() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("review.csv");
        let mut item = ReviewItem::from(&doc("Untitled record"));
        item.authors = "Khan, I.; Walker, L.".to_string();
        save_review_csv(&path, &[item])?;

        let content = std::fs::read_to_string(&path)?;
        assert!(content.starts_with("title,authors,aggregation_type"));
        assert!(content.contains("Untitled record,\"Khan, I.; Walker, L.\",Journal"));
        Ok(())
    }
}
