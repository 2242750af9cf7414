//! App-store wire and persistence models.
//!
//! Deserialization is deliberately lenient: unknown keys are ignored and
//! optional blocks default, so older clients keep working against newer
//! server payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────
// Sources
// ─────────────────────────────────────────────────────────────────

/// Algolia search credentials attached to a store source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgoliaData {
    pub app_id: String,
    pub api_key: String,
    pub index_name: String,
}

/// One user-editable app-store source. Order within the persisted list is
/// significant and user-controlled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppstoreSource {
    /// Stable primary key; immutable once created.
    pub id: Uuid,
    pub url: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub algolia: Option<AlgoliaData>,
}

fn default_true() -> bool {
    true
}

impl AppstoreSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            name: name.into(),
            enabled: true,
            algolia: None,
        }
    }
}

/// The canonical default source list, seeded on first run and restored by
/// the "reset sources" action.
///
/// Ids are fixed so that "restore defaults" is structurally comparable
/// across runs.
pub fn default_sources() -> Vec<AppstoreSource> {
    vec![
        AppstoreSource {
            id: Uuid::from_u128(0x8b1b_4a26_930c_4d9e_8a1f_0e57c1a40001),
            url: "https://appstore-api.rebble.io/api".into(),
            name: "Rebble".into(),
            enabled: true,
            algolia: None,
        },
        AppstoreSource {
            id: Uuid::from_u128(0x8b1b_4a26_930c_4d9e_8a1f_0e57c1a40002),
            url: "https://apps.rebble.io/api".into(),
            name: "Rebble (legacy)".into(),
            enabled: false,
            algolia: None,
        },
    ]
}

// ─────────────────────────────────────────────────────────────────
// Apps and pages
// ─────────────────────────────────────────────────────────────────

/// A store application entry (trimmed to the fields the companion uses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppstoreApp {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "deserialize_store_date")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hearts: u32,
}

/// One fetched page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppstoreCollectionPage {
    #[serde(rename = "data", default)]
    pub apps: Vec<AppstoreApp>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default, rename = "links")]
    pub links: PageLinks,
}

impl AppstoreCollectionPage {
    /// Opaque cursor for the next page, `None` at the end of the collection.
    pub fn next_page_token(&self) -> Option<&str> {
        self.links.next_page.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default, rename = "nextPage")]
    pub next_page: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// Home document
// ─────────────────────────────────────────────────────────────────

/// The store "home page" payload: everything the landing screen renders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeDocument {
    #[serde(default)]
    pub applications: Vec<AppstoreApp>,
    #[serde(default)]
    pub banners: Vec<HomeBanner>,
    #[serde(default)]
    pub categories: Vec<HomeCategory>,
    #[serde(default)]
    pub collections: Vec<HomeCollection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeBanner {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeCategory {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeCollection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "links")]
    pub links: PageLinks,
}

// ─────────────────────────────────────────────────────────────────
// Dates
// ─────────────────────────────────────────────────────────────────

/// Parse a store-served date string.
///
/// The server mixes RFC-1123 and ISO-8601 variants; formats are tried in a
/// fixed fallback order so behavior is deterministic.
pub fn parse_store_date(s: &str) -> Option<DateTime<Utc>> {
    // 1. RFC-1123 ("Tue, 03 Jun 2025 10:15:30 GMT") parses as RFC 2822.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // 2. Full ISO-8601 / RFC 3339 with offset.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // 3. ISO-8601 without offset, assumed UTC.
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}

/// Lenient serde adapter over [`parse_store_date`]: an unparseable or absent
/// date becomes `None` instead of failing the whole document.
fn deserialize_store_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_store_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc1123_date() {
        let dt = parse_store_date("Tue, 03 Jun 2025 10:15:30 GMT").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 6, 3, 10, 15, 30).unwrap());
    }

    #[test]
    fn test_parse_iso8601_with_offset() {
        let dt = parse_store_date("2025-06-03T12:15:30+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 6, 3, 10, 15, 30).unwrap());
    }

    #[test]
    fn test_parse_iso8601_naive_assumed_utc() {
        let dt = parse_store_date("2025-06-03T10:15:30.500").unwrap();
        assert_eq!(dt.timestamp_millis() % 1000, 500);
    }

    #[test]
    fn test_unparseable_date_is_none() {
        assert!(parse_store_date("last tuesday").is_none());
        assert!(parse_store_date("").is_none());
    }

    #[test]
    fn test_app_deserialization_is_lenient() {
        // Unknown keys and a junk date must not fail the document.
        let json = r#"{
            "id": "abc123",
            "title": "Snake",
            "published_date": "whenever",
            "some_new_server_field": {"nested": true}
        }"#;
        let app: AppstoreApp = serde_json::from_str(json).unwrap();
        assert_eq!(app.title, "Snake");
        assert!(app.published_date.is_none());
        assert_eq!(app.hearts, 0);
    }

    #[test]
    fn test_collection_page_shape() {
        let json = r#"{
            "data": [{"id": "a", "title": "A"}, {"id": "b", "title": "B"}],
            "limit": 20,
            "offset": 0,
            "links": {"nextPage": "https://example.com/collection?offset=20"}
        }"#;
        let page: AppstoreCollectionPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.apps.len(), 2);
        assert_eq!(
            page.next_page_token(),
            Some("https://example.com/collection?offset=20")
        );
    }

    #[test]
    fn test_last_page_has_no_token() {
        let json = r#"{"data": [], "limit": 20, "offset": 40, "links": {}}"#;
        let page: AppstoreCollectionPage = serde_json::from_str(json).unwrap();
        assert!(page.next_page_token().is_none());
    }

    #[test]
    fn test_source_enabled_defaults_to_true() {
        let json = r#"{"id": "6a204bd8-9f3c-4a55-9b4e-1cd9ffa6f6a1", "url": "https://x", "name": "X"}"#;
        let source: AppstoreSource = serde_json::from_str(json).unwrap();
        assert!(source.enabled);
        assert!(source.algolia.is_none());
    }

    #[test]
    fn test_default_sources_are_stable() {
        let a = default_sources();
        let b = default_sources();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_home_document_defaults() {
        let doc: HomeDocument = serde_json::from_str(r#"{"applications": []}"#).unwrap();
        assert!(doc.banners.is_empty());
        assert!(doc.categories.is_empty());
    }
}
