//! LibreX response format

use nexus_core::SearchResult;
use serde_json::Value;

/// One raw hit from a LibreX `api.php?format=json` response. Other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibreXResult {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl From<&Value> for LibreXResult {
    /// Fields that are not JSON strings read as absent
    fn from(entry: &Value) -> Self {
        let field = |name: &str| entry.get(name).and_then(Value::as_str).map(str::to_string);

        Self {
            url: field("url"),
            title: field("title"),
            description: field("description"),
        }
    }
}

/// Parse a response body. A JSON `null` body is an empty result set. Only the outer
/// array shape is enforced, so one odd entry never costs the rest of the page.
pub(crate) fn parse_body(body: &str) -> serde_json::Result<Vec<LibreXResult>> {
    let entries: Option<Vec<Value>> = serde_json::from_str(body)?;
    Ok(entries
        .unwrap_or_default()
        .iter()
        .map(LibreXResult::from)
        .collect())
}

/// Drop hits without a url or title and map the rest, in order, to [`SearchResult`].
/// Ids use the position within the filtered list.
pub fn normalize_results(entries: Vec<LibreXResult>, page: u32) -> Vec<SearchResult> {
    entries
        .into_iter()
        .filter_map(|entry| match (entry.url, entry.title) {
            (Some(url), Some(title)) if !url.is_empty() && !title.is_empty() => {
                Some((url, title, entry.description))
            }
            _ => None,
        })
        .enumerate()
        .map(|(index, (url, title, description))| {
            SearchResult::new(url, title, description, page, index)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::DEFAULT_SNIPPET;

    fn entry(url: Option<&str>, title: Option<&str>, description: Option<&str>) -> LibreXResult {
        LibreXResult {
            url: url.map(str::to_string),
            title: title.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_filters_incomplete_entries() {
        let entries = vec![
            entry(Some("https://a.example"), Some("A"), Some("first")),
            entry(Some("https://b.example"), None, Some("no title")),
            entry(None, Some("No url"), None),
            entry(Some(""), Some("Empty url"), None),
            entry(Some("https://c.example"), Some(""), None),
            entry(Some("https://d.example"), Some("D"), None),
        ];

        let results = normalize_results(entries, 1);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "A");
        assert_eq!(results[0].snippet, "first");
        assert_eq!(results[1].title, "D");
        assert_eq!(results[1].snippet, DEFAULT_SNIPPET);
    }

    #[test]
    fn test_ids_follow_filtered_positions() {
        let entries = vec![
            entry(None, Some("skipped"), None),
            entry(Some("https://a.example"), Some("A"), None),
            entry(Some("https://a.example"), Some("A again"), None),
        ];

        let ids: Vec<String> = normalize_results(entries, 3)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["https://a.example-3-0", "https://a.example-3-1"]);
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body("null").unwrap().is_empty());
        assert!(parse_body("[]").unwrap().is_empty());

        let parsed = parse_body(
            r#"[{"title":"Rust","url":"https://rust-lang.org","description":"A language","base_url":"rust-lang.org"}]"#,
        )
        .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].url.as_deref(), Some("https://rust-lang.org"));

        assert!(parse_body(r#"{"error":"rate limited"}"#).is_err());
        assert!(parse_body("<html>").is_err());
    }

    #[test]
    fn test_mistyped_fields_read_as_absent() {
        let parsed = parse_body(
            r#"[
                {"title":"Good","url":"https://good.example","description":"ok"},
                {"title":"Odd","url":"https://odd.example","description":["x"]},
                {"title":"Numeric url","url":5},
                {"title":{"text":"Object title"},"url":"https://object.example"},
                "not an object"
            ]"#,
        )
        .unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[1].description, None);
        assert_eq!(parsed[2].url, None);
        assert_eq!(parsed[3].title, None);
        assert_eq!(parsed[4], LibreXResult::default());

        let results = normalize_results(parsed, 1);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet, "ok");
        assert_eq!(results[1].title, "Odd");
        assert_eq!(results[1].snippet, DEFAULT_SNIPPET);
        assert_eq!(results[1].id, "https://odd.example-1-1");
    }
}
