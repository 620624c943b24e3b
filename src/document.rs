//! Search entries and the normalized `Document` record.
//!
//! Scopus search entries are loosely typed: numbers arrive as strings, some
//! fields are sometimes a scalar and sometimes a list, and nested objects
//! may be missing entirely. `RawEntry` accepts all of that without failing;
//! `Document::from_entry` applies the defaulting policy.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Placeholder written into every affiliation field when a record has none
pub const NO_AFFILIATION: &str = "None";

/// Aggregation type of journal records
pub const JOURNAL: &str = "Journal";

/// One search result as returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub eid: Option<String>,
    #[serde(rename = "prism:doi", default, deserialize_with = "lenient_text")]
    pub doi: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub pii: Option<String>,
    #[serde(rename = "pubmed-id", default, deserialize_with = "lenient_text")]
    pub pubmed_id: Option<String>,
    #[serde(rename = "dc:title", default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subtype: Option<String>,
    #[serde(rename = "subtypeDescription", default, deserialize_with = "lenient_text")]
    pub subtype_description: Option<String>,
    #[serde(rename = "dc:creator", default, deserialize_with = "lenient_text")]
    pub creator: Option<String>,
    #[serde(default)]
    pub affiliation: Option<Value>,
    #[serde(rename = "author-count", default)]
    pub author_count: Option<Value>,
    #[serde(rename = "prism:coverDate", default, deserialize_with = "lenient_text")]
    pub cover_date: Option<String>,
    #[serde(rename = "prism:coverDisplayDate", default, deserialize_with = "lenient_text")]
    pub cover_display_date: Option<String>,
    #[serde(rename = "prism:publicationName", default, deserialize_with = "lenient_text")]
    pub publication_name: Option<String>,
    #[serde(rename = "prism:issn", default, deserialize_with = "lenient_text")]
    pub issn: Option<String>,
    #[serde(rename = "prism:eIssn", default, deserialize_with = "lenient_text")]
    pub e_issn: Option<String>,
    #[serde(rename = "source-id", default, deserialize_with = "lenient_text")]
    pub source_id: Option<String>,
    #[serde(rename = "prism:aggregationType", default, deserialize_with = "lenient_text")]
    pub aggregation_type: Option<String>,
    #[serde(rename = "prism:volume", default, deserialize_with = "lenient_text")]
    pub volume: Option<String>,
    #[serde(rename = "prism:issueIdentifier", default, deserialize_with = "lenient_text")]
    pub issue_identifier: Option<String>,
    #[serde(rename = "article-number", default, deserialize_with = "lenient_text")]
    pub article_number: Option<String>,
    #[serde(rename = "prism:pageRange", default, deserialize_with = "lenient_text")]
    pub page_range: Option<String>,
    #[serde(rename = "dc:description", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub authkeywords: Option<String>,
    #[serde(rename = "citedby-count", default)]
    pub cited_by_count: Option<Value>,
    #[serde(default)]
    pub openaccess: Option<Value>,
    #[serde(default)]
    pub freetoread: Option<Value>,
    #[serde(rename = "freetoreadLabel", default)]
    pub freetoread_label: Option<Value>,
    #[serde(rename = "fund-acr", default, deserialize_with = "lenient_text")]
    pub fund_acr: Option<String>,
    #[serde(rename = "fund-no", default, deserialize_with = "lenient_text")]
    pub fund_no: Option<String>,
    #[serde(rename = "fund-sponsor", default, deserialize_with = "lenient_text")]
    pub fund_sponsor: Option<String>,
    #[serde(rename = "prism:url", default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_links")]
    pub link: Vec<Link>,
    /// Present only on the placeholder entry of an empty result set
    #[serde(default, deserialize_with = "lenient_text")]
    pub error: Option<String>,
}

/// Entry of a record's `link` list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    #[serde(rename = "@ref", default)]
    pub rel: Option<String>,
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAffiliation {
    #[serde(default, deserialize_with = "lenient_text")]
    afid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    affilname: Option<String>,
    #[serde(rename = "affiliation-city", default, deserialize_with = "lenient_text")]
    affiliation_city: Option<String>,
    #[serde(rename = "affiliation-country", default, deserialize_with = "lenient_text")]
    affiliation_country: Option<String>,
}

/// Access labels appear as a `{"value": [...]}` wrapper, a bare list or a
/// single item; each item is either a string or `{"$": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccessLabels {
    Wrapped { value: Box<AccessLabels> },
    Many(Vec<AccessLabel>),
    One(AccessLabel),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccessLabel {
    Text(String),
    Keyed {
        #[serde(rename = "$")]
        text: String,
    },
}

impl AccessLabels {
    fn flatten(self) -> Vec<String> {
        match self {
            AccessLabels::Wrapped { value } => value.flatten(),
            AccessLabels::Many(items) => items.into_iter().map(AccessLabel::into_text).collect(),
            AccessLabels::One(item) => vec![item.into_text()],
        }
    }
}

impl AccessLabel {
    fn into_text(self) -> String {
        match self {
            AccessLabel::Text(text) | AccessLabel::Keyed { text } => text,
        }
    }
}

/// Normalized bibliographic record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub eid: String,
    pub doi: Option<String>,
    pub pii: Option<String>,
    pub pubmed_id: Option<String>,
    pub title: String,
    pub subtype: String,
    pub subtype_description: String,
    pub creator: String,
    pub afid: Option<String>,
    pub affil_name: Option<String>,
    pub affiliation_city: Option<String>,
    pub affiliation_country: Option<String>,
    pub author_count: Option<u32>,
    pub cover_date: String,
    pub cover_display_date: String,
    pub publication_name: String,
    pub issn: Option<String>,
    pub e_issn: Option<String>,
    pub source_id: String,
    pub aggregation_type: String,
    pub volume: String,
    pub issue_identifier: String,
    pub article_number: String,
    pub page_range: String,
    pub description: String,
    pub auth_keywords: String,
    pub cited_by_count: u64,
    pub open_access: u32,
    pub free_to_read: Vec<String>,
    pub free_to_read_label: Vec<String>,
    pub fund_acr: Option<String>,
    pub fund_no: Option<String>,
    pub fund_sponsor: Option<String>,
    pub url: String,
    /// Link used to resolve the full author list
    pub author_link: Option<String>,
    /// Filled by the author resolver; empty until then
    pub author_names: Vec<String>,
}

impl Document {
    /// Build a document from a raw search entry.
    pub fn from_entry(entry: RawEntry) -> Self {
        let affiliation = first_affiliation(entry.affiliation.as_ref());
        let (afid, affil_name, affiliation_city, affiliation_country) = match affiliation {
            Some(a) => (a.afid, a.affilname, a.affiliation_city, a.affiliation_country),
            None => (
                Some(NO_AFFILIATION.to_string()),
                Some(NO_AFFILIATION.to_string()),
                Some(NO_AFFILIATION.to_string()),
                Some(NO_AFFILIATION.to_string()),
            ),
        };

        let author_link = entry.link.get(1).and_then(|l| l.href.clone());

        Self {
            eid: entry.eid.unwrap_or_default(),
            doi: entry.doi.filter(|d| !d.trim().is_empty()),
            pii: entry.pii,
            pubmed_id: entry.pubmed_id,
            title: entry.title.unwrap_or_default(),
            subtype: entry.subtype.unwrap_or_default(),
            subtype_description: entry.subtype_description.unwrap_or_default(),
            creator: entry.creator.unwrap_or_default(),
            afid,
            affil_name,
            affiliation_city,
            affiliation_country,
            author_count: entry
                .author_count
                .as_ref()
                .map(|v| v.get("$").unwrap_or(v))
                .and_then(|v| u32::try_from(parse_count(Some(v))).ok()),
            cover_date: entry.cover_date.unwrap_or_default(),
            cover_display_date: entry.cover_display_date.unwrap_or_default(),
            publication_name: entry.publication_name.unwrap_or_default(),
            issn: entry.issn,
            e_issn: entry.e_issn,
            source_id: entry.source_id.unwrap_or_default(),
            aggregation_type: entry.aggregation_type.unwrap_or_default(),
            volume: entry.volume.unwrap_or_default(),
            issue_identifier: entry.issue_identifier.unwrap_or_default(),
            article_number: entry.article_number.unwrap_or_default(),
            page_range: entry.page_range.unwrap_or_default(),
            description: entry.description.unwrap_or_default(),
            auth_keywords: entry.authkeywords.unwrap_or_default(),
            cited_by_count: parse_count(entry.cited_by_count.as_ref()),
            open_access: u32::try_from(parse_count(entry.openaccess.as_ref())).unwrap_or(0),
            free_to_read: access_labels(entry.freetoread),
            free_to_read_label: access_labels(entry.freetoread_label),
            fund_acr: entry.fund_acr,
            fund_no: entry.fund_no,
            fund_sponsor: entry.fund_sponsor,
            url: entry.url.unwrap_or_default(),
            author_link,
            author_names: Vec::new(),
        }
    }

    pub fn is_journal(&self) -> bool {
        self.aggregation_type == JOURNAL
    }
}

fn first_affiliation(value: Option<&Value>) -> Option<RawAffiliation> {
    match value {
        Some(Value::Array(items)) => items
            .first()
            .map(|first| serde_json::from_value(first.clone()).unwrap_or_default()),
        _ => None,
    }
}

fn access_labels(value: Option<Value>) -> Vec<String> {
    value
        .and_then(|v| serde_json::from_value::<AccessLabels>(v).ok())
        .map(AccessLabels::flatten)
        .unwrap_or_default()
}

/// Non-negative integer from a number or numeric string; 0 otherwise.
fn parse_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Accept strings, numbers and booleans as text; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_links<'de, D>(deserializer: D) -> std::result::Result<Vec<Link>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> RawEntry {
        serde_json::from_value(value).expect("entry")
    }

    #[test]
    fn test_full_entry() {
        let doc = Document::from_entry(entry(json!({
            "eid": "2-s2.0-85100000000",
            "prism:doi": "10.1016/j.ijpharm.2021.120000",
            "dc:title": "Nanoparticle delivery",
            "subtype": "ar",
            "subtypeDescription": "Article",
            "dc:creator": "Smith J.",
            "affiliation": [
                {"afid": "60010491", "affilname": "University of Mississippi",
                 "affiliation-city": "University", "affiliation-country": "United States"},
                {"afid": "1", "affilname": "Other"}
            ],
            "author-count": {"@limit": "100", "$": "4"},
            "prism:coverDate": "2021-03-01",
            "prism:publicationName": "International Journal of Pharmaceutics",
            "prism:aggregationType": "Journal",
            "prism:volume": "596",
            "prism:issueIdentifier": "2",
            "prism:pageRange": "10-20",
            "citedby-count": "17",
            "openaccess": "1",
            "freetoread": {"value": [{"$": "all"}, {"$": "publisherhybridgold"}]},
            "freetoreadLabel": {"value": [{"$": "All Open Access"}]},
            "fund-sponsor": "NIH",
            "source-id": 21100,
            "link": [
                {"@ref": "self", "@href": "https://api.elsevier.com/content/abstract/scopus_id/1"},
                {"@ref": "author-affiliation", "@href": "https://api.elsevier.com/content/abstract/scopus_id/1?field=author"}
            ]
        })));

        assert_eq!(doc.doi.as_deref(), Some("10.1016/j.ijpharm.2021.120000"));
        assert_eq!(doc.affil_name.as_deref(), Some("University of Mississippi"));
        assert_eq!(doc.affiliation_country.as_deref(), Some("United States"));
        assert_eq!(doc.author_count, Some(4));
        assert_eq!(doc.cited_by_count, 17);
        assert_eq!(doc.open_access, 1);
        assert_eq!(doc.free_to_read, vec!["all", "publisherhybridgold"]);
        assert_eq!(doc.free_to_read_label, vec!["All Open Access"]);
        assert_eq!(doc.source_id, "21100");
        assert_eq!(doc.fund_sponsor.as_deref(), Some("NIH"));
        assert!(doc.fund_acr.is_none());
        assert!(doc.is_journal());
        assert_eq!(
            doc.author_link.as_deref(),
            Some("https://api.elsevier.com/content/abstract/scopus_id/1?field=author")
        );
        assert!(doc.author_names.is_empty());
    }

    #[test]
    fn test_missing_affiliation_uses_placeholder() {
        let doc = Document::from_entry(entry(json!({"dc:title": "No affiliation"})));
        assert_eq!(doc.afid.as_deref(), Some(NO_AFFILIATION));
        assert_eq!(doc.affil_name.as_deref(), Some(NO_AFFILIATION));
        assert_eq!(doc.affiliation_city.as_deref(), Some(NO_AFFILIATION));
        assert_eq!(doc.affiliation_country.as_deref(), Some(NO_AFFILIATION));

        let empty = Document::from_entry(entry(json!({"affiliation": []})));
        assert_eq!(empty.afid.as_deref(), Some(NO_AFFILIATION));
    }

    #[test]
    fn test_defaults_for_absent_fields() {
        let doc = Document::from_entry(RawEntry::default());
        assert_eq!(doc.cited_by_count, 0);
        assert_eq!(doc.open_access, 0);
        assert!(doc.doi.is_none());
        assert!(doc.e_issn.is_none());
        assert_eq!(doc.title, "");
        assert_eq!(doc.page_range, "");
        assert!(doc.free_to_read.is_empty());
        assert!(doc.author_link.is_none());
    }

    #[test]
    fn test_non_numeric_counts_fall_back_to_zero() {
        let doc = Document::from_entry(entry(json!({
            "citedby-count": "n/a",
            "openaccess": null
        })));
        assert_eq!(doc.cited_by_count, 0);
        assert_eq!(doc.open_access, 0);
    }

    #[test]
    fn test_access_labels_pass_through() {
        let doc = Document::from_entry(entry(json!({
            "freetoread": ["all", "repository"],
            "freetoreadLabel": "Green"
        })));
        assert_eq!(doc.free_to_read, vec!["all", "repository"]);
        assert_eq!(doc.free_to_read_label, vec!["Green"]);
    }

    #[test]
    fn test_single_link_has_no_author_link() {
        let doc = Document::from_entry(entry(json!({
            "link": [{"@ref": "self", "@href": "https://example.org/self"}],
            "prism:doi": "  "
        })));
        assert!(doc.author_link.is_none());
        assert!(doc.doi.is_none());
    }
}
