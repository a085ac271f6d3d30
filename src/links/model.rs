//! Persisted data model and its lenient parser
//!
//! The on-disk shape is:
//!
//! ```json
//! {"version": 1, "groups": [{"id": "…", "title": "…", "links": [{"id": "…", "title": "…", "url": "…"}], "browser": ""}]}
//! ```
//!
//! Parsing goes through [`serde_json::Value`] rather than derived
//! deserialization so that one malformed group or link is dropped instead of
//! failing the whole database.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Schema version written with every database
pub const CURRENT_DB_VERSION: u32 = 1;

/// Browsers a group can be pinned to
///
/// Identified on disk by their macOS bundle id; the empty string is the system
/// default browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Browser {
    #[default]
    SystemDefault,
    Safari,
    Chrome,
    Vivaldi,
    Brave,
    Firefox,
    Arc,
    Edge,
}

impl Browser {
    /// Every browser, in menu order
    pub const ALL: [Browser; 8] = [
        Browser::SystemDefault,
        Browser::Safari,
        Browser::Chrome,
        Browser::Vivaldi,
        Browser::Brave,
        Browser::Firefox,
        Browser::Arc,
        Browser::Edge,
    ];

    /// Bundle id used on disk and by the OS launcher (empty for system default)
    pub fn bundle_id(self) -> &'static str {
        match self {
            Self::SystemDefault => "",
            Self::Safari => "com.apple.Safari",
            Self::Chrome => "com.google.Chrome",
            Self::Vivaldi => "com.vivaldi.Vivaldi",
            Self::Brave => "com.brave.Browser",
            Self::Firefox => "org.mozilla.firefox",
            Self::Arc => "company.thebrowser.Browser",
            Self::Edge => "com.microsoft.edgemac",
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Self::SystemDefault => "System Default",
            Self::Safari => "Safari",
            Self::Chrome => "Google Chrome",
            Self::Vivaldi => "Vivaldi",
            Self::Brave => "Brave",
            Self::Firefox => "Firefox",
            Self::Arc => "Arc",
            Self::Edge => "Microsoft Edge",
        }
    }

    /// Short name accepted on the command line
    pub fn slug(self) -> &'static str {
        match self {
            Self::SystemDefault => "default",
            Self::Safari => "safari",
            Self::Chrome => "chrome",
            Self::Vivaldi => "vivaldi",
            Self::Brave => "brave",
            Self::Firefox => "firefox",
            Self::Arc => "arc",
            Self::Edge => "edge",
        }
    }

    /// Look up a browser by its exact bundle id
    pub fn from_bundle_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.bundle_id() == id)
    }

    pub fn is_system_default(self) -> bool {
        self == Self::SystemDefault
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error for browser names that are neither a slug nor a known bundle id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown browser '{0}' (try: default, safari, chrome, vivaldi, brave, firefox, arc, edge)")]
pub struct UnknownBrowser(pub String);

impl FromStr for Browser {
    type Err = UnknownBrowser;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.slug().eq_ignore_ascii_case(trimmed) || b.bundle_id() == trimmed)
            .ok_or_else(|| UnknownBrowser(s.to_string()))
    }
}

impl Serialize for Browser {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.bundle_id())
    }
}

impl<'de> Deserialize<'de> for Browser {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(normalize_browser(&value))
    }
}

/// A titled URL inside a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// A named collection of links with a preferred browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroup {
    pub id: String,
    pub title: String,
    pub links: Vec<LinkItem>,
    #[serde(default)]
    pub browser: Browser,
}

impl LinkGroup {
    /// URLs of every link, in display order
    pub fn urls(&self) -> Vec<String> {
        self.links.iter().map(|l| l.url.clone()).collect()
    }
}

/// The whole persisted database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub version: u32,
    pub groups: Vec<LinkGroup>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            version: CURRENT_DB_VERSION,
            groups: Vec::new(),
        }
    }
}

impl Database {
    pub fn group(&self, group_id: &str) -> Option<&LinkGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn group_mut(&mut self, group_id: &str) -> Option<&mut LinkGroup> {
        self.groups.iter_mut().find(|g| g.id == group_id)
    }

    /// Serialize to the blob format stored under the primary key
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Outcome of parsing a stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Nothing was stored
    Missing,
    /// Blob had the right shape; malformed entries were dropped
    Valid(Database),
    /// Blob was unreadable or had the wrong top-level shape
    Corrupt,
}

/// Parse a stored blob, dropping malformed groups and links
pub fn parse_database(raw: Option<&str>) -> Parsed {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Parsed::Missing;
    };

    let Ok(mut value) = serde_json::from_str::<Value>(raw) else {
        return Parsed::Corrupt;
    };

    // Older writers stored the JSON text as a JSON string
    if let Value::String(inner) = &value {
        match serde_json::from_str::<Value>(inner) {
            Ok(unwrapped) => value = unwrapped,
            Err(_) => return Parsed::Corrupt,
        }
    }

    let Some(obj) = value.as_object() else {
        return Parsed::Corrupt;
    };

    if !obj.get("version").is_some_and(Value::is_number) {
        return Parsed::Corrupt;
    }
    let Some(groups) = obj.get("groups").and_then(Value::as_array) else {
        return Parsed::Corrupt;
    };

    Parsed::Valid(Database {
        version: CURRENT_DB_VERSION,
        groups: groups.iter().filter_map(normalize_group).collect(),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_browser(value: &Value) -> Browser {
    value
        .as_str()
        .and_then(Browser::from_bundle_id)
        .unwrap_or_default()
}

fn normalize_link(value: &Value) -> Option<LinkItem> {
    Some(LinkItem {
        id: non_empty_str(value.get("id"))?,
        title: non_empty_str(value.get("title"))?,
        url: non_empty_str(value.get("url"))?,
    })
}

fn normalize_group(value: &Value) -> Option<LinkGroup> {
    let id = non_empty_str(value.get("id"))?;
    let title = non_empty_str(value.get("title"))?;

    let links = value
        .get("links")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(normalize_link).collect())
        .unwrap_or_default();

    Some(LinkGroup {
        id,
        title,
        links,
        browser: value.get("browser").map(normalize_browser).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, url: &str) -> LinkItem {
        LinkItem {
            id: id.to_string(),
            title: format!("Title {}", id),
            url: url.to_string(),
        }
    }

    fn sample_db() -> Database {
        Database {
            version: CURRENT_DB_VERSION,
            groups: vec![
                LinkGroup {
                    id: "g1".to_string(),
                    title: "Work".to_string(),
                    links: vec![link("l1", "https://a.com/"), link("l2", "https://b.com/x")],
                    browser: Browser::Firefox,
                },
                LinkGroup {
                    id: "g2".to_string(),
                    title: "Empty".to_string(),
                    links: vec![],
                    browser: Browser::SystemDefault,
                },
            ],
        }
    }

    #[test]
    fn test_round_trip() {
        let dbs = [Database::default(), sample_db()];
        for db in dbs {
            let blob = db.to_blob().unwrap();
            assert_eq!(parse_database(Some(&blob)), Parsed::Valid(db));
        }
    }

    #[test]
    fn test_serialized_shape() {
        let blob = sample_db().to_blob().unwrap();
        let value: Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["groups"][0]["browser"], "org.mozilla.firefox");
        assert_eq!(value["groups"][1]["browser"], "");
        assert_eq!(value["groups"][0]["links"][1]["url"], "https://b.com/x");
    }

    #[test]
    fn test_missing() {
        assert_eq!(parse_database(None), Parsed::Missing);
        assert_eq!(parse_database(Some("")), Parsed::Missing);
    }

    #[test]
    fn test_corrupt_shapes() {
        for raw in [
            "{not json",
            "[]",
            "42",
            "null",
            r#"{"groups": []}"#,
            r#"{"version": "1", "groups": []}"#,
            r#"{"version": 1, "groups": {}}"#,
            r#""just a string""#,
        ] {
            assert_eq!(parse_database(Some(raw)), Parsed::Corrupt, "raw: {}", raw);
        }
    }

    #[test]
    fn test_double_encoded_blob() {
        let inner = sample_db().to_blob().unwrap();
        let outer = serde_json::to_string(&inner).unwrap();
        assert_eq!(parse_database(Some(&outer)), Parsed::Valid(sample_db()));
    }

    #[test]
    fn test_drops_malformed_entries() {
        let raw = r#"{
            "version": 7,
            "groups": [
                {"id": "g1", "title": "  Keep  ", "links": [
                    {"id": "l1", "title": "ok", "url": "https://a.com/"},
                    {"id": "", "title": "no id", "url": "https://b.com/"},
                    {"id": "l3", "title": "no url"},
                    "garbage"
                ], "browser": "com.example.Unknown"},
                {"id": "g2", "title": ""},
                {"title": "no id"},
                {"id": "g4", "title": "No links", "links": "oops", "browser": "com.brave.Browser"},
                17
            ]
        }"#;

        let Parsed::Valid(db) = parse_database(Some(raw)) else {
            panic!("expected a valid database");
        };

        assert_eq!(db.version, CURRENT_DB_VERSION);
        assert_eq!(db.groups.len(), 2);
        assert_eq!(db.groups[0].title, "Keep");
        assert_eq!(
            db.groups[0].links,
            vec![LinkItem {
                id: "l1".to_string(),
                title: "ok".to_string(),
                url: "https://a.com/".to_string(),
            }]
        );
        assert_eq!(db.groups[0].browser, Browser::SystemDefault);
        assert!(db.groups[1].links.is_empty());
        assert_eq!(db.groups[1].browser, Browser::Brave);
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("chrome".parse::<Browser>().unwrap(), Browser::Chrome);
        assert_eq!("Firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert_eq!(
            "company.thebrowser.Browser".parse::<Browser>().unwrap(),
            Browser::Arc
        );
        assert_eq!("default".parse::<Browser>().unwrap(), Browser::SystemDefault);
        assert!("netscape".parse::<Browser>().is_err());
    }

    #[test]
    fn test_browser_labels() {
        assert_eq!(Browser::SystemDefault.label(), "System Default");
        assert_eq!(Browser::Edge.to_string(), "Microsoft Edge");
        assert_eq!(Browser::from_bundle_id(""), Some(Browser::SystemDefault));
        assert_eq!(Browser::from_bundle_id("com.apple.Safari"), Some(Browser::Safari));
    }
}
