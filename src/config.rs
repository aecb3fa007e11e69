//! TOML configuration.
//!
//! Every key has a default, so an absent file or an empty `[folders]` table
//! yields the conventional layout: `JMP MAPS`, `JMP EXCEL` and `JMP PDF`
//! next to a `templates/` directory, all under the current directory.
//!
//! [`Config::layout`] turns the raw configuration into an immutable
//! [`FolderLayout`] of absolute paths, which is what the rest of the crate
//! consumes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use crate::models::Category;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// `[folders]`: where the three categories and the host page live.
    #[serde(default)]
    pub folders: FoldersConfig,
    /// `[server]`: HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FoldersConfig {
    /// Root of the shelf, relative to the working directory.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// HTML map folder, relative to `base_dir`.
    #[serde(default = "default_html")]
    pub html: PathBuf,
    /// Excel export folder, relative to `base_dir`.
    #[serde(default = "default_excel")]
    pub excel: PathBuf,
    /// PDF export folder, relative to `base_dir`.
    #[serde(default = "default_pdf")]
    pub pdf: PathBuf,
    /// Folder holding the host page, relative to `base_dir`.
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    /// File name of the host page inside `templates`.
    #[serde(default = "default_index_page")]
    pub index_page: String,
    /// Create missing category folders when the server starts.
    #[serde(default = "default_create_missing")]
    pub create_missing: bool,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            html: default_html(),
            excel: default_excel(),
            pdf: default_pdf(),
            templates: default_templates(),
            index_page: default_index_page(),
            create_missing: default_create_missing(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_html() -> PathBuf {
    PathBuf::from("JMP MAPS")
}
fn default_excel() -> PathBuf {
    PathBuf::from("JMP EXCEL")
}
fn default_pdf() -> PathBuf {
    PathBuf::from("JMP PDF")
}
fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}
fn default_index_page() -> String {
    "index.html".to_string()
}
fn default_create_missing() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on, e.g. `127.0.0.1:5000`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

/// Absolute on-disk locations of everything the index reads.
///
/// Built once at startup and handed to [`crate::index::FileIndex`]; nothing
/// in the crate looks folder paths up from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    /// Absolute shelf root.
    pub base_dir: PathBuf,
    /// Absolute folder for [`Category::Html`].
    pub html_dir: PathBuf,
    /// Absolute folder for [`Category::Excel`].
    pub excel_dir: PathBuf,
    /// Absolute folder for [`Category::Pdf`].
    pub pdf_dir: PathBuf,
    /// Absolute folder holding the host page.
    pub templates_dir: PathBuf,
    /// Host page file name inside `templates_dir`.
    pub index_page: String,
}

impl FolderLayout {
    /// Folder holding documents of the given category.
    pub fn folder(&self, category: Category) -> &Path {
        match category {
            Category::Html => &self.html_dir,
            Category::Excel => &self.excel_dir,
            Category::Pdf => &self.pdf_dir,
        }
    }

    pub fn index_page_path(&self) -> PathBuf {
        self.templates_dir.join(&self.index_page)
    }
}

impl Config {
    /// Resolves every configured folder to an absolute path.
    ///
    /// `base_dir` is taken relative to the current working directory; the
    /// category and template folders are taken relative to `base_dir`.
    pub fn layout(&self) -> Result<FolderLayout> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(self.layout_from(&cwd))
    }

    fn layout_from(&self, cwd: &Path) -> FolderLayout {
        let base_dir = normalize(&cwd.join(&self.folders.base_dir));
        let under_base = |p: &Path| normalize(&base_dir.join(p));

        FolderLayout {
            html_dir: under_base(&self.folders.html),
            excel_dir: under_base(&self.folders.excel),
            pdf_dir: under_base(&self.folders.pdf),
            templates_dir: under_base(&self.folders.templates),
            index_page: self.folders.index_page.clone(),
            base_dir,
        }
    }
}

/// Lexically removes `.` and `..` components without touching the disk, so
/// folders that do not exist yet still get a clean absolute path.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Loads the configuration file, falling back to defaults when it does not
/// exist.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let folders = &config.folders;

    for (key, value) in [
        ("folders.html", &folders.html),
        ("folders.excel", &folders.excel),
        ("folders.pdf", &folders.pdf),
        ("folders.templates", &folders.templates),
    ] {
        if value.as_os_str().is_empty() {
            anyhow::bail!("{} must not be empty", key);
        }
    }

    if folders.html == folders.excel
        || folders.html == folders.pdf
        || folders.excel == folders.pdf
    {
        anyhow::bail!("folders.html, folders.excel and folders.pdf must be distinct");
    }

    let page = Path::new(&folders.index_page);
    let mut components = page.components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        anyhow::bail!(
            "folders.index_page must be a plain file name, got '{}'",
            folders.index_page
        );
    }

    config
        .server
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("server.bind is not a socket address: '{}'", config.server.bind))?;

    Ok(())
}
