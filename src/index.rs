//! Filesystem-backed document index.
//!
//! [`FileIndex`] joins the three category folders on base name. It holds no
//! state besides the folder layout: every call re-reads the directories, so
//! files added or removed between requests show up immediately and the
//! index is safe to share across any number of concurrent requests.
//!
//! Listing rules:
//!
//! - only the immediate entries of each folder are considered;
//! - names starting with `.` are skipped;
//! - the base name is the name with its last extension removed
//!   (`Map1.html` → `Map1`, `a.tar.gz` → `a.tar`, `README` → `README`);
//! - a missing folder contributes nothing, and unreadable entries are
//!   logged and skipped.

use anyhow::{Context, Result};
use std::path::{Component, Path};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::FolderLayout;
use crate::error::IndexError;
use crate::models::{
    Category, DocumentListing, Download, HealthReport, SearchHit, SearchResults,
};

#[derive(Debug, Clone)]
pub struct FileIndex {
    layout: FolderLayout,
}

impl FileIndex {
    pub fn new(layout: FolderLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &FolderLayout {
        &self.layout
    }

    /// Scans all three folders and merges them by base name.
    ///
    /// Read failures never fail the scan: a missing folder is skipped, and
    /// an unreadable folder or entry is logged at `warn` and skipped, so one
    /// bad folder still leaves the other two listed. The `Result` carries
    /// failures of the surrounding task machinery (see [`IndexError`]'s
    /// `JoinError` conversion), not filesystem errors.
    pub fn list_all(&self) -> Result<DocumentListing, IndexError> {
        let mut listing = DocumentListing::new();

        for category in Category::ALL {
            let folder = self.layout.folder(category);
            if !folder.exists() {
                debug!(%category, folder = %folder.display(), "folder missing, skipping");
                continue;
            }

            let walker = WalkDir::new(folder).min_depth(1).max_depth(1);
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(%category, folder = %folder.display(), error = %err, "skipping unreadable entry");
                        continue;
                    }
                };

                let Some(base) = base_name(entry.file_name()) else {
                    continue;
                };
                listing.entry(base).or_default().set(category);
            }
        }

        Ok(listing)
    }

    /// Case-insensitive substring search over base names.
    ///
    /// The query is trimmed first; a blank query matches everything.
    pub fn search(&self, query: &str) -> Result<SearchResults, IndexError> {
        let needle = query.trim().to_lowercase();

        let results = self
            .list_all()?
            .into_iter()
            .filter(|(name, _)| needle.is_empty() || name.to_lowercase().contains(&needle))
            .map(|(name, entry)| {
                let hit = SearchHit {
                    entry,
                    original_name: name.clone(),
                };
                (name, hit)
            })
            .collect();

        Ok(results)
    }

    /// Finds the on-disk file for `(file_type, base_name)`.
    ///
    /// Extensions are tried in the category's priority order and the first
    /// existing file wins, so `Name.xlsx` shadows `Name.xls`.
    pub fn resolve_download(&self, file_type: &str, base_name: &str) -> Result<Download, IndexError> {
        let category: Category = file_type
            .parse()
            .map_err(|_| IndexError::invalid_file_type())?;

        if !is_plain_name(base_name) {
            warn!(%category, base_name, "rejected download name outside the category folder");
            return Err(IndexError::file_not_found());
        }

        let folder = self.layout.folder(category);
        for ext in category.extensions() {
            let file_name = format!("{}.{}", base_name, ext);
            let path = folder.join(&file_name);
            if path.is_file() {
                return Ok(Download {
                    category,
                    path,
                    file_name,
                });
            }
        }

        Err(IndexError::file_not_found())
    }

    /// Reads the host page verbatim.
    pub fn index_page(&self) -> Result<String, IndexError> {
        let path = self.layout.index_page_path();
        match std::fs::read_to_string(&path) {
            Ok(html) => Ok(html),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(IndexError::NotFound(
                format!("{} not found at {}", self.layout.index_page, path.display()),
            )),
            Err(err) => Err(IndexError::Internal(format!(
                "failed to read {}: {}",
                path.display(),
                err
            ))),
        }
    }

    /// Diagnostic snapshot of the layout. Fails only where
    /// [`FileIndex::list_all`] does.
    pub fn health(&self) -> Result<HealthReport, IndexError> {
        let file_count = self.list_all()?.len();
        let folders = Category::ALL
            .into_iter()
            .map(|category| (category, self.layout.folder(category).is_dir()))
            .collect();

        Ok(HealthReport {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            base_dir: self.layout.base_dir.display().to_string(),
            folders,
            templates_path: self.layout.templates_dir.display().to_string(),
            templates_exists: self.layout.templates_dir.is_dir(),
            index_html_exists: self.layout.index_page_path().is_file(),
            file_count,
            checked_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Creates any category folder that does not exist yet.
    pub fn ensure_folders(&self) -> Result<()> {
        for category in Category::ALL {
            let folder = self.layout.folder(category);
            if folder.is_dir() {
                continue;
            }
            std::fs::create_dir_all(folder)
                .with_context(|| format!("Failed to create {} folder: {}", category, folder.display()))?;
            info!(%category, folder = %folder.display(), "created folder");
        }
        Ok(())
    }
}

/// Base name of a directory entry, or `None` for hidden entries.
fn base_name(file_name: &std::ffi::OsStr) -> Option<String> {
    let name = file_name.to_string_lossy();
    if name.starts_with('.') {
        return None;
    }
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.into_owned());
    Some(stem)
}

/// A single normal path component: no separators, no `.`/`..`, no NUL.
fn is_plain_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentEntry;
    use std::fs;
    use tempfile::TempDir;

    fn layout(root: &Path) -> FolderLayout {
        FolderLayout {
            base_dir: root.to_path_buf(),
            html_dir: root.join("JMP MAPS"),
            excel_dir: root.join("JMP EXCEL"),
            pdf_dir: root.join("JMP PDF"),
            templates_dir: root.join("templates"),
            index_page: "index.html".to_string(),
        }
    }

    /// Builds an index with all three folders created and the given files
    /// placed under them.
    fn index_with(files: &[(Category, &str)]) -> (TempDir, FileIndex) {
        let tmp = TempDir::new().unwrap();
        let index = FileIndex::new(layout(tmp.path()));
        index.ensure_folders().unwrap();
        for (category, name) in files {
            fs::write(index.layout().folder(*category).join(name), name.as_bytes()).unwrap();
        }
        (tmp, index)
    }

    fn entry(html: bool, excel: bool, pdf: bool) -> DocumentEntry {
        DocumentEntry { html, excel, pdf }
    }

    fn scenario() -> (TempDir, FileIndex) {
        index_with(&[
            (Category::Html, "Map1.html"),
            (Category::Excel, "Map1.xlsx"),
            (Category::Pdf, "Map2.pdf"),
        ])
    }

    #[test]
    fn test_list_all_merges_by_base_name() {
        let (_tmp, index) = scenario();
        let listing = index.list_all().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing["Map1"], entry(true, true, false));
        assert_eq!(listing["Map2"], entry(false, false, true));
    }

    #[test]
    fn test_search_empty_returns_everything() {
        let (_tmp, index) = scenario();
        let results = index.search("").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results["Map1"].entry, entry(true, true, false));
        assert_eq!(results["Map1"].original_name, "Map1");
        assert_eq!(results["Map2"].entry, entry(false, false, true));
        assert_eq!(results["Map2"].original_name, "Map2");
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let (_tmp, index) = scenario();
        let results = index.search("map2").unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["Map2"]);

        let results = index.search("AP").unwrap();
        assert_eq!(results.len(), 2);

        assert!(index.search("map3").unwrap().is_empty());
    }

    #[test]
    fn test_search_whitespace_equals_empty() {
        let (_tmp, index) = scenario();
        assert_eq!(index.search("   ").unwrap(), index.search("").unwrap());
        assert_eq!(index.search("  map1 ").unwrap(), index.search("map1").unwrap());
    }

    #[test]
    fn test_search_is_subset_of_full_listing() {
        let (_tmp, index) = index_with(&[
            (Category::Html, "North Ridge.html"),
            (Category::Pdf, "north_ridge.pdf"),
            (Category::Excel, "South.xls"),
        ]);
        let all = index.search("").unwrap();
        for query in ["north", "RIDGE", "s", "zzz", "."] {
            let results = index.search(query).unwrap();
            for (name, hit) in &results {
                assert_eq!(all.get(name), Some(hit));
                assert!(name.to_lowercase().contains(&query.to_lowercase()));
            }
        }
    }

    #[test]
    fn test_search_is_idempotent() {
        let (_tmp, index) = scenario();
        assert_eq!(index.search("map").unwrap(), index.search("map").unwrap());
    }

    #[test]
    fn test_hidden_files_are_skipped() {
        let (_tmp, index) = index_with(&[
            (Category::Html, ".DS_Store"),
            (Category::Pdf, ".hidden.pdf"),
            (Category::Pdf, "Visible.pdf"),
        ]);
        let results = index.search("").unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["Visible"]);
    }

    #[test]
    fn test_missing_folder_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        let index = FileIndex::new(layout(tmp.path()));
        fs::create_dir_all(index.layout().folder(Category::Pdf)).unwrap();
        fs::write(index.layout().folder(Category::Pdf).join("Only.pdf"), b"%PDF").unwrap();

        let listing = index.list_all().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing["Only"], entry(false, false, true));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_folder_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let (_tmp, index) = index_with(&[
            (Category::Html, "Map1.html"),
            (Category::Pdf, "Map2.pdf"),
        ]);
        let pdf_dir = index.layout().pdf_dir.clone();
        fs::set_permissions(&pdf_dir, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind root; nothing to check there.
        if fs::read_dir(&pdf_dir).is_ok() {
            fs::set_permissions(&pdf_dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let listing = index.list_all();
        fs::set_permissions(&pdf_dir, fs::Permissions::from_mode(0o755)).unwrap();

        let listing = listing.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing["Map1"], entry(true, false, false));
        assert!(!listing.contains_key("Map2"));
    }

    #[test]
    fn test_no_folders_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let index = FileIndex::new(layout(tmp.path()));
        assert!(index.search("").unwrap().is_empty());
    }

    #[test]
    fn test_base_name_strips_last_extension_only() {
        let (_tmp, index) = index_with(&[
            (Category::Excel, "archive.tar.gz"),
            (Category::Html, "README"),
        ]);
        let listing = index.list_all().unwrap();
        assert!(listing.contains_key("archive.tar"));
        assert!(listing.contains_key("README"));
    }

    #[test]
    fn test_subdirectories_count_as_entries() {
        let (_tmp, index) = index_with(&[]);
        fs::create_dir(index.layout().folder(Category::Html).join("Bundle")).unwrap();
        let listing = index.list_all().unwrap();
        assert_eq!(listing["Bundle"], entry(true, false, false));
    }

    #[test]
    fn test_listing_follows_disk_changes() {
        let (_tmp, index) = scenario();
        fs::remove_file(index.layout().folder(Category::Pdf).join("Map2.pdf")).unwrap();
        fs::write(index.layout().folder(Category::Pdf).join("Map1.pdf"), b"%PDF").unwrap();

        let listing = index.list_all().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing["Map1"], entry(true, true, true));
    }

    #[test]
    fn test_resolve_download_pdf() {
        let (_tmp, index) = index_with(&[(Category::Pdf, "Report.pdf")]);
        let download = index.resolve_download("pdf", "Report").unwrap();
        assert_eq!(download.category, Category::Pdf);
        assert_eq!(download.file_name, "Report.pdf");
        assert_eq!(download.path, index.layout().pdf_dir.join("Report.pdf"));

        let err = index.resolve_download("pdf", "Missing").unwrap_err();
        assert_eq!(err, IndexError::file_not_found());
    }

    #[test]
    fn test_resolve_download_prefers_xlsx() {
        let (_tmp, index) = index_with(&[
            (Category::Excel, "Name.xls"),
            (Category::Excel, "Name.xlsx"),
        ]);
        let download = index.resolve_download("excel", "Name").unwrap();
        assert_eq!(download.file_name, "Name.xlsx");
    }

    #[test]
    fn test_resolve_download_falls_back_to_htm() {
        let (_tmp, index) = index_with(&[(Category::Html, "Legacy.htm")]);
        let download = index.resolve_download("html", "Legacy").unwrap();
        assert_eq!(download.file_name, "Legacy.htm");
    }

    #[test]
    fn test_resolve_download_invalid_type() {
        let (_tmp, index) = index_with(&[(Category::Pdf, "anything.pdf")]);
        let err = index.resolve_download("csv", "anything").unwrap_err();
        assert_eq!(err, IndexError::invalid_file_type());
        assert_eq!(err.to_string(), "Invalid file type");
    }

    #[test]
    fn test_resolve_download_wrong_category() {
        let (_tmp, index) = scenario();
        assert!(index.resolve_download("html", "Map1").is_ok());
        let err = index.resolve_download("pdf", "Map1").unwrap_err();
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn test_resolve_download_rejects_traversal() {
        let (tmp, index) = index_with(&[]);
        fs::write(tmp.path().join("secret.pdf"), b"%PDF").unwrap();

        for name in ["../secret", "..", ".", "", "a/b", "a\\b"] {
            let err = index.resolve_download("pdf", name).unwrap_err();
            assert!(err.is_not_found(), "expected NotFound for {:?}", name);
        }
    }

    #[test]
    fn test_index_page() {
        let (tmp, index) = index_with(&[]);
        let err = index.index_page().unwrap_err();
        assert!(err.is_not_found());

        fs::create_dir_all(tmp.path().join("templates")).unwrap();
        fs::write(tmp.path().join("templates/index.html"), "<h1>{{ title }}</h1>").unwrap();
        assert_eq!(index.index_page().unwrap(), "<h1>{{ title }}</h1>");
    }

    #[test]
    fn test_health_reports_folders_and_count() {
        let tmp = TempDir::new().unwrap();
        let index = FileIndex::new(layout(tmp.path()));
        fs::create_dir_all(&index.layout().html_dir).unwrap();
        fs::write(index.layout().html_dir.join("Map1.html"), "<html/>").unwrap();

        let report = index.health().unwrap();
        assert_eq!(report.status, "ok");
        assert_eq!(report.file_count, 1);
        assert_eq!(report.folders[&Category::Html], true);
        assert_eq!(report.folders[&Category::Excel], false);
        assert_eq!(report.folders[&Category::Pdf], false);
        assert!(!report.templates_exists);
        assert!(!report.index_html_exists);
    }

    #[test]
    fn test_ensure_folders_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let index = FileIndex::new(layout(tmp.path()));
        index.ensure_folders().unwrap();
        index.ensure_folders().unwrap();
        for category in Category::ALL {
            assert!(index.layout().folder(category).is_dir());
        }
        assert!(!index.layout().templates_dir.exists());
    }
}
