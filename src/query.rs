//! Scopus search expression builder.
//!
//! A harvest is selected by a publication year and, optionally, a calendar
//! quarter. The selection determines exactly one search expression and one
//! output file name.

use crate::error::{Result, ScopusError};
use serde::Deserialize;
use std::fmt;

/// Institutional affiliation filter shared by every query.
///
/// The first affiliation is only counted when the record also matches one of
/// the subject-area terms.
const AFFILIATION_FILTER: &str = r#"((AF-ID (60010491) AND (pharmacy OR "biomolecular sciences" OR "natural products research" OR pharmaceutics)) OR AF-ID (60020462) OR AF-ID (60030187))"#;

/// Prefix of every generated RIS file name
pub const FILE_PREFIX: &str = "UM_Pharmacy_Publications";

/// Calendar quarter of a publication year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Map a 1-based quarter index to a quarter.
    pub fn from_index(index: i64) -> Result<Self> {
        match index {
            1 => Ok(Quarter::Q1),
            2 => Ok(Quarter::Q2),
            3 => Ok(Quarter::Q3),
            4 => Ok(Quarter::Q4),
            other => Err(ScopusError::Validation(format!(
                "unrecognized quarter: {}",
                other
            ))),
        }
    }

    /// Parse `quarter_N` (as sent by the web form) or a bare `N`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let digits = value.strip_prefix("quarter_").unwrap_or(value);
        let index: i64 = digits
            .parse()
            .map_err(|_| ScopusError::Validation(format!("unrecognized quarter: {:?}", value)))?;
        Self::from_index(index)
    }

    /// The three month names covered by this quarter, in calendar order.
    pub fn months(self) -> [&'static str; 3] {
        match self {
            Quarter::Q1 => ["January", "February", "March"],
            Quarter::Q2 => ["April", "May", "June"],
            Quarter::Q3 => ["July", "August", "September"],
            Quarter::Q4 => ["October", "November", "December"],
        }
    }
}

/// Time window of a harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Annual,
    Quarter(Quarter),
}

/// Immutable search selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery {
    year: i32,
    scope: SearchScope,
}

impl SearchQuery {
    pub fn annual(year: i32) -> Self {
        Self {
            year,
            scope: SearchScope::Annual,
        }
    }

    pub fn quarterly(year: i32, quarter: Quarter) -> Self {
        Self {
            year,
            scope: SearchScope::Quarter(quarter),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    /// Build the Scopus advanced-search expression.
    pub fn expression(&self) -> String {
        match self.scope {
            SearchScope::Annual => {
                format!("({} AND PUBYEAR = {})", AFFILIATION_FILTER, self.year)
            }
            SearchScope::Quarter(quarter) => {
                let [m1, m2, m3] = quarter.months();
                let y = self.year;
                format!(
                    r#"({} AND PUBDATETXT ( "{m1} {y}" OR "{m2} {y}" OR "{m3} {y}" ) AND PUBYEAR = {y})"#,
                    AFFILIATION_FILTER
                )
            }
        }
    }

    /// Deterministic RIS file name for this selection.
    pub fn filename(&self) -> String {
        match self.scope {
            SearchScope::Annual => format!("{}_{}.ris", FILE_PREFIX, self.year),
            SearchScope::Quarter(quarter) => {
                let months = quarter.months();
                format!(
                    "{}_{}_to_{}_{}.ris",
                    FILE_PREFIX, months[0], months[2], self.year
                )
            }
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            SearchScope::Annual => write!(f, "{} (annual)", self.year),
            SearchScope::Quarter(q) => {
                let months = q.months();
                write!(f, "{} {} to {}", self.year, months[0], months[2])
            }
        }
    }
}

// ============================================================================
// Inbound request
// ============================================================================

/// A value the web form may send either as a JSON number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

/// Harvest selection as posted by the front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestRequest {
    pub publication_year: NumberOrText,
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub quarter_number: Option<NumberOrText>,
}

impl HarvestRequest {
    /// Resolve the request into a search selection.
    ///
    /// `searchType == "a"` selects the whole year; anything else requires a
    /// recognizable quarter.
    pub fn to_query(&self) -> Result<SearchQuery> {
        let year = match &self.publication_year {
            NumberOrText::Number(n) => i32::try_from(*n).ok(),
            NumberOrText::Text(s) => s.trim().parse().ok(),
        }
        .ok_or_else(|| ScopusError::Validation("invalid publication year".to_string()))?;

        if self.search_type.as_deref() == Some("a") {
            return Ok(SearchQuery::annual(year));
        }

        let quarter = match &self.quarter_number {
            Some(NumberOrText::Number(n)) => Quarter::from_index(*n)?,
            Some(NumberOrText::Text(s)) => Quarter::parse(s)?,
            None => {
                return Err(ScopusError::Validation(
                    "quarterly search without a quarter".to_string(),
                ))
            }
        };
        Ok(SearchQuery::quarterly(year, quarter))
    }
}
