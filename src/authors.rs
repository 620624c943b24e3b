//! Full author lists from a record's author-affiliation link.
//!
//! The abstract service reports authors in three layouts:
//!
//! - a flat `author` list
//! - an `author-group` list, each group holding an `author` list
//! - a single `author-group` object holding an `author` list
//!
//! All three decode into [`AuthorContainer`].

use crate::error::{Result, ScopusError};
use crate::scopus::ScopusClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Known layouts of the `authors` member.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AuthorContainer {
    Flat {
        author: Vec<Author>,
    },
    Groups {
        #[serde(rename = "author-group")]
        groups: Vec<AuthorGroup>,
    },
    Group {
        #[serde(rename = "author-group")]
        group: AuthorGroup,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorGroup {
    #[serde(default)]
    pub author: Vec<Author>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(rename = "preferred-name")]
    pub preferred_name: PreferredName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferredName {
    #[serde(rename = "ce:surname")]
    pub surname: String,
    #[serde(rename = "ce:given-name", default)]
    pub given_name: Option<String>,
}

impl PreferredName {
    /// `"<surname>, <given-name>"`, or just the surname.
    pub fn display(&self) -> String {
        match self.given_name.as_deref().map(str::trim) {
            Some(given) if !given.is_empty() => format!("{}, {}", self.surname, given),
            _ => self.surname.clone(),
        }
    }
}

impl AuthorContainer {
    /// Author names in document order.
    pub fn names(&self) -> Vec<String> {
        let authors: Vec<&Author> = match self {
            AuthorContainer::Flat { author } => author.iter().collect(),
            AuthorContainer::Groups { groups } => {
                groups.iter().flat_map(|g| g.author.iter()).collect()
            }
            AuthorContainer::Group { group } => group.author.iter().collect(),
        };
        authors.iter().map(|a| a.preferred_name.display()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "abstracts-retrieval-response")]
    response: Option<Response>,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    authors: Option<Value>,
}

/// Extract author names from an abstract-retrieval payload.
///
/// A payload without an `authors` member is a valid, empty result; an
/// `authors` member in an unknown layout is an error.
pub fn parse_authors(payload: Value) -> Result<Vec<String>> {
    let envelope: Envelope = serde_json::from_value(payload)?;
    let Some(authors) = envelope.response.and_then(|r| r.authors) else {
        return Ok(Vec::new());
    };
    if authors.is_null() {
        return Ok(Vec::new());
    }
    let container: AuthorContainer = serde_json::from_value(authors)
        .map_err(|e| ScopusError::UnexpectedShape(format!("authors: {}", e)))?;
    Ok(container.names())
}

/// Fetch and decode the author list behind `link`.
pub async fn resolve_authors(client: &ScopusClient, link: &str) -> Result<Vec<String>> {
    debug!(link = link, "Resolving authors");
    let payload = client.get_json(link).await?;
    parse_authors(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopusConfig;
    use mockito::Server;
    use serde_json::json;

    fn author(surname: &str, given: Option<&str>) -> Value {
        match given {
            Some(g) => json!({"preferred-name": {"ce:surname": surname, "ce:given-name": g}}),
            None => json!({"preferred-name": {"ce:surname": surname}}),
        }
    }

    fn wrap(authors: Value) -> Value {
        json!({"abstracts-retrieval-response": {"authors": authors}})
    }

    #[test]
    fn test_flat_authors() -> Result<()> {
        let names = parse_authors(wrap(json!({
            "author": [author("Khan", Some("Ikhlas A.")), author("Walker", None)]
        })))?;
        assert_eq!(names, vec!["Khan, Ikhlas A.", "Walker"]);
        Ok(())
    }

    #[test]
    fn test_single_group_matches_group_list() -> Result<()> {
        let members = json!([author("Avery", Some("Mitchell")), author("Ross", Some("Samir"))]);
        let single = parse_authors(wrap(json!({"author-group": {"author": members.clone()}})))?;
        let listed = parse_authors(wrap(json!({"author-group": [{"author": members}]})))?;
        assert_eq!(single, listed);
        assert_eq!(single, vec!["Avery, Mitchell", "Ross, Samir"]);
        Ok(())
    }

    #[test]
    fn test_group_list_flattens_in_order() -> Result<()> {
        let names = parse_authors(wrap(json!({"author-group": [
            {"author": [author("A", Some("One"))]},
            {"affiliation": {}},
            {"author": [author("B", None), author("C", Some(""))]}
        ]})))?;
        assert_eq!(names, vec!["A, One", "B", "C"]);
        Ok(())
    }

    #[test]
    fn test_missing_authors_is_empty() -> Result<()> {
        assert!(parse_authors(json!({"abstracts-retrieval-response": {}}))?.is_empty());
        assert!(parse_authors(json!({}))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_layout_is_error() {
        let result = parse_authors(wrap(json!({"contributors": []})));
        assert!(matches!(result, Err(ScopusError::UnexpectedShape(_))));

        let no_surname = parse_authors(wrap(json!({"author": [{"preferred-name": {}}]})));
        assert!(no_surname.is_err());
    }

    #[tokio::test]
    async fn test_resolve_authors_over_http() -> Result<()> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/abstract/scopus_id/42")
            .match_header("x-els-apikey", "key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(wrap(json!({"author": [author("Khan", Some("S."))]})).to_string())
            .create_async()
            .await;

        let client = ScopusClient::new(&ScopusConfig::new("key"))?;
        let link = format!("{}/abstract/scopus_id/42", server.url());
        let names = resolve_authors(&client, &link).await?;
        assert_eq!(names, vec!["Khan, S."]);
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_authors_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/abstract/scopus_id/7")
            .with_status(401)
            .create_async()
            .await;

        let client = ScopusClient::new(&ScopusConfig::new("key")).expect("client");
        let link = format!("{}/abstract/scopus_id/7", server.url());
        let result = resolve_authors(&client, &link).await;
        assert!(matches!(result, Err(ScopusError::Api { code: 401, .. })));
    }
}
