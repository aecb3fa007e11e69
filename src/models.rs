//! Core data types shared by the index, the HTTP server and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the three parallel document folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Html,
    Excel,
    Pdf,
}

impl Category {
    /// Scan order. Flags are independent per category, so the order never
    /// changes the listing.
    pub const ALL: [Category; 3] = [Category::Html, Category::Excel, Category::Pdf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Html => "html",
            Category::Excel => "excel",
            Category::Pdf => "pdf",
        }
    }

    /// Accepted extensions, highest priority first.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Html => &["html", "htm"],
            Category::Excel => &["xlsx", "xls"],
            Category::Pdf => &["pdf"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document category: '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Exact, case-sensitive match on the route token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Category::Html),
            "excel" => Ok(Category::Excel),
            "pdf" => Ok(Category::Pdf),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Which categories hold a file for a given base name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub html: bool,
    pub excel: bool,
    pub pdf: bool,
}

impl DocumentEntry {
    pub fn set(&mut self, category: Category) {
        match category {
            Category::Html => self.html = true,
            Category::Excel => self.excel = true,
            Category::Pdf => self.pdf = true,
        }
    }
}

/// Base name → availability, sorted by base name.
pub type DocumentListing = BTreeMap<String, DocumentEntry>;

/// A search result row as served by `GET /api/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Availability flags, serialized inline next to `original_name`.
    #[serde(flatten)]
    pub entry: DocumentEntry,
    pub original_name: String,
}

pub type SearchResults = BTreeMap<String, SearchHit>;

/// A file resolved for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub category: Category,
    /// Absolute path inside the category folder.
    pub path: PathBuf,
    /// On-disk file name, offered to the client as the save name.
    pub file_name: String,
}

/// Diagnostic snapshot served by `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Always `"ok"` when the report could be built.
    pub status: String,
    /// The crate version from `Cargo.toml`.
    pub version: String,
    pub base_dir: String,
    /// Whether each category folder exists on disk.
    pub folders: BTreeMap<Category, bool>,
    pub templates_path: String,
    pub templates_exists: bool,
    /// Whether the host page served at `/` exists.
    pub index_html_exists: bool,
    /// Number of distinct base names across all folders.
    pub file_count: usize,
    pub checked_at: String, // RFC 3339
}
