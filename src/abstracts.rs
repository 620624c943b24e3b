//! Abstract retrieval by DOI.
//!
//! Journal records with a DOI are re-fetched from the abstract service to
//! get the publisher's bibliographic detail for the citation.

use crate::error::{OptionExt, Result};
use crate::scopus::ScopusClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Placeholder for missing text fields
const BLANK: &str = " ";

/// Placeholder for a missing cover date
const NO_DATE: &str = "No Publication Date";

/// Bibliographic detail for one DOI.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractRecord {
    pub title: String,
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub cover_date: String,
    pub doi: String,
    /// Only set when the payload carries `prism:pageRang`, which the service
    /// does not send, so this is normally `None`.
    pub first_page: Option<String>,
    pub authors: Vec<IndexedAuthor>,
}

/// Author as listed in the abstract payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexedAuthor {
    #[serde(rename = "ce:surname", default)]
    pub surname: String,
    #[serde(rename = "ce:indexed-name", default)]
    pub indexed_name: Option<String>,
}

impl IndexedAuthor {
    /// Second token of the indexed name, e.g. `"J.A."` for `"Smith J.A."`.
    pub fn initials(&self) -> Option<&str> {
        self.indexed_name
            .as_deref()
            .and_then(|name| name.split_whitespace().nth(1))
    }

    /// `"<surname> <initials>"`, or the surname alone.
    pub fn display(&self) -> String {
        match self.initials() {
            Some(initials) => format!("{} {}", self.surname, initials),
            None => self.surname.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "abstracts-retrieval-response")]
    response: Option<Response>,
}

#[derive(Debug, Deserialize)]
struct Response {
    coredata: Option<Coredata>,
    #[serde(default)]
    authors: Option<AuthorList>,
}

#[derive(Debug, Deserialize)]
struct AuthorList {
    #[serde(default)]
    author: OneOrMany<IndexedAuthor>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Coredata {
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "prism:publicationName")]
    journal: Option<String>,
    #[serde(rename = "prism:volume")]
    volume: Option<String>,
    #[serde(rename = "prism:issueIdentifier")]
    issue: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    #[serde(rename = "prism:pageRang")]
    page_range_probe: Option<Value>,
    #[serde(rename = "prism:pageRange")]
    page_range: Option<String>,
}

/// Decode an abstract-retrieval payload.
pub fn parse_abstract(payload: Value) -> Result<AbstractRecord> {
    let envelope: Envelope = serde_json::from_value(payload)?;
    let response = envelope
        .response
        .ok_or_parse("missing abstracts-retrieval-response")?;
    let core = response.coredata.ok_or_parse("missing coredata")?;

    let probe_set = core
        .page_range_probe
        .as_ref()
        .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
    let first_page = if probe_set { core.page_range } else { None };

    Ok(AbstractRecord {
        title: core.title.unwrap_or_else(|| BLANK.to_string()),
        journal: core.journal.unwrap_or_else(|| BLANK.to_string()),
        volume: core.volume.unwrap_or_else(|| BLANK.to_string()),
        issue: core.issue.unwrap_or_else(|| BLANK.to_string()),
        cover_date: core.cover_date.unwrap_or_else(|| NO_DATE.to_string()),
        doi: core.doi.unwrap_or_else(|| BLANK.to_string()),
        first_page,
        authors: response
            .authors
            .map(|a| a.author.into_vec())
            .unwrap_or_default(),
    })
}

/// Fetch the abstract record for `doi`.
pub async fn retrieve_abstract(client: &ScopusClient, doi: &str) -> Result<AbstractRecord> {
    let url = client.abstract_url(doi)?;
    debug!(doi = doi, url = %url, "Retrieving abstract");
    let payload = client.get_json(url.as_str()).await?;
    parse_abstract(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopusConfig;
    use crate::error::ScopusError;
    use mockito::Server;
    use serde_json::json;

    fn payload() -> Value {
        json!({"abstracts-retrieval-response": {
            "coredata": {
                "dc:title": "Cannabinoid pharmacokinetics",
                "prism:publicationName": "Journal of Natural Products",
                "prism:volume": "84",
                "prism:issueIdentifier": "3",
                "prism:coverDate": "2021-03-26",
                "prism:doi": "10.1021/acs.jnatprod.0c01000",
                "prism:pageRange": "600-612"
            },
            "authors": {"author": [
                {"ce:surname": "ElSohly", "ce:indexed-name": "ElSohly M.A."},
                {"ce:surname": "Gul", "ce:indexed-name": "Gul"}
            ]}
        }})
    }

    #[test]
    fn test_parse_abstract() -> Result<()> {
        let record = parse_abstract(payload())?;
        assert_eq!(record.journal, "Journal of Natural Products");
        assert_eq!(record.issue, "3");
        assert_eq!(record.doi, "10.1021/acs.jnatprod.0c01000");
        let names: Vec<String> = record.authors.iter().map(IndexedAuthor::display).collect();
        assert_eq!(names, vec!["ElSohly M.A.", "Gul"]);
        Ok(())
    }

    #[test]
    fn test_first_page_only_from_probe_field() -> Result<()> {
        // The real payload carries prism:pageRange but never prism:pageRang.
        assert_eq!(parse_abstract(payload())?.first_page, None);

        let mut probed = payload();
        probed["abstracts-retrieval-response"]["coredata"]["prism:pageRang"] = json!("x");
        assert_eq!(parse_abstract(probed)?.first_page.as_deref(), Some("600-612"));
        Ok(())
    }

    #[test]
    fn test_placeholders_for_missing_fields() -> Result<()> {
        let record = parse_abstract(json!({"abstracts-retrieval-response": {"coredata": {}}}))?;
        assert_eq!(record.title, BLANK);
        assert_eq!(record.cover_date, NO_DATE);
        assert!(record.authors.is_empty());
        Ok(())
    }

    #[test]
    fn test_single_author_object() -> Result<()> {
        let record = parse_abstract(json!({"abstracts-retrieval-response": {
            "coredata": {"dc:title": "T"},
            "authors": {"author": {"ce:surname": "Solo", "ce:indexed-name": "Solo H."}}
        }}))?;
        assert_eq!(record.authors.len(), 1);
        assert_eq!(record.authors[0].display(), "Solo H.");
        Ok(())
    }

    #[test]
    fn test_missing_coredata_is_error() {
        let result = parse_abstract(json!({"abstracts-retrieval-response": {}}));
        assert!(matches!(result, Err(ScopusError::Parse(_))));
        assert!(parse_abstract(json!({"service-error": {}})).is_err());
    }

    #[tokio::test]
    async fn test_retrieve_by_doi() -> Result<()> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/abstract/doi/10.1021/acs.jnatprod.0c01000")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(payload().to_string())
            .create_async()
            .await;

        let mut config = ScopusConfig::new("key");
        config.abstract_url = format!("{}/abstract/doi/", server.url());
        let client = ScopusClient::new(&config)?;

        let record = retrieve_abstract(&client, "10.1021/acs.jnatprod.0c01000").await?;
        assert_eq!(record.volume, "84");
        mock.assert_async().await;
        Ok(())
    }
}
