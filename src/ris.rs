//! RIS citation blocks.
//!
//! Each record becomes one block: a `TY` line, one line per tag, and a
//! closing `ER` line followed by a blank line.

use crate::abstracts::AbstractRecord;
use crate::document::Document;
use std::fmt;

/// Citation variant of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationKind {
    JournalArticle,
    Book,
    BookChapter,
    /// Any other non-journal type; written as a book
    Other,
}

impl CitationKind {
    /// RIS reference type
    pub fn ris_type(self) -> &'static str {
        match self {
            CitationKind::JournalArticle => "JOUR",
            CitationKind::Book | CitationKind::Other => "BOOK",
            CitationKind::BookChapter => "CHAP",
        }
    }
}

/// How a document is turned into a citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Journal article with a DOI: try the abstract service first
    EnrichedJournal { doi: &'a str },
    /// Journal article without a DOI: local block, flagged for review
    UnidentifiedJournal,
    Book,
    BookChapter,
    Other,
}

/// Pick the citation route for a document.
pub fn route(doc: &Document) -> Route<'_> {
    if doc.is_journal() {
        return match doc.doi.as_deref() {
            Some(doi) => Route::EnrichedJournal { doi },
            None => Route::UnidentifiedJournal,
        };
    }
    match doc.subtype_description.as_str() {
        "Book" => Route::Book,
        "Book Chapter" => Route::BookChapter,
        _ => Route::Other,
    }
}

/// One serialized citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationBlock {
    kind: CitationKind,
    tags: Vec<(&'static str, String)>,
}

impl CitationBlock {
    pub fn new(kind: CitationKind) -> Self {
        Self {
            kind,
            tags: Vec::new(),
        }
    }

    pub fn kind(&self) -> CitationKind {
        self.kind
    }

    pub fn push(&mut self, tag: &'static str, value: impl Into<String>) -> &mut Self {
        self.tags.push((tag, value.into()));
        self
    }

    /// Values of every line carrying `tag`, in order.
    pub fn values<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CitationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TY  - {}", self.kind.ris_type())?;
        for (tag, value) in &self.tags {
            writeln!(f, "{}  - {}", tag, value)?;
        }
        writeln!(f, "ER  - ")?;
        writeln!(f)
    }
}

/// First four characters of a cover date.
pub fn year_of(date: &str) -> String {
    date.chars().take(4).collect()
}

fn push_authors<'a>(block: &mut CitationBlock, names: impl IntoIterator<Item = &'a String>) {
    for name in names {
        block.push("AU", name.as_str());
    }
}

fn push_doi(block: &mut CitationBlock, doi: Option<&str>) {
    if let Some(doi) = doi {
        block.push("DO", doi);
        block.push("UR", format!("https://doi.org/{}", doi));
    }
}

/// Journal block built from the search record alone.
pub fn journal_block(doc: &Document) -> CitationBlock {
    let mut block = CitationBlock::new(CitationKind::JournalArticle);
    block
        .push("TI", doc.title.as_str())
        .push("JO", doc.publication_name.as_str())
        .push("VL", doc.volume.as_str())
        .push("DA", doc.cover_date.as_str())
        .push("PY", year_of(&doc.cover_date))
        .push("SP", doc.page_range.as_str());
    push_authors(&mut block, &doc.author_names);
    push_doi(&mut block, doc.doi.as_deref());
    if !doc.issue_identifier.is_empty() {
        block.push("IS", doc.issue_identifier.as_str());
    }
    block
}

/// Journal block built from an abstract-service record.
pub fn enriched_journal_block(record: &AbstractRecord) -> CitationBlock {
    let mut block = CitationBlock::new(CitationKind::JournalArticle);
    block
        .push("TI", record.title.as_str())
        .push("JO", record.journal.as_str())
        .push("VL", record.volume.as_str())
        .push("DA", record.cover_date.as_str())
        .push("PY", year_of(&record.cover_date))
        .push("SP", record.first_page.as_deref().unwrap_or("None"));
    for author in &record.authors {
        block.push("AU", author.display());
    }
    push_doi(&mut block, Some(record.doi.as_str()));
    block.push("IS", record.issue.as_str());
    block
}

fn book_like(doc: &Document, kind: CitationKind) -> CitationBlock {
    let mut block = CitationBlock::new(kind);
    block.push("TI", doc.title.as_str());
    if kind == CitationKind::BookChapter {
        block.push("T2", doc.publication_name.as_str());
    }
    block
        .push("DA", doc.cover_date.as_str())
        .push("PY", year_of(&doc.cover_date))
        .push("SP", doc.page_range.as_str());
    push_authors(&mut block, &doc.author_names);
    push_doi(&mut block, doc.doi.as_deref());
    block
}

pub fn book_block(doc: &Document) -> CitationBlock {
    book_like(doc, CitationKind::Book)
}

pub fn chapter_block(doc: &Document) -> CitationBlock {
    book_like(doc, CitationKind::BookChapter)
}

/// Block for a non-journal document, chosen by subtype description.
pub fn non_journal_block(doc: &Document) -> CitationBlock {
    match route(doc) {
        Route::BookChapter => chapter_block(doc),
        Route::Book => book_block(doc),
        _ => book_like(doc, CitationKind::Other),
    }
}
