//! `docshelf status`: the health report rendered for a terminal.

use anyhow::Result;

use crate::index::FileIndex;
use crate::models::{Category, HealthReport};

pub fn print_status(index: &FileIndex) -> Result<()> {
    let report = index.health()?;
    print!("{}", render(index, &report));
    Ok(())
}

fn render(index: &FileIndex, report: &HealthReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Base directory: {}\n\n", report.base_dir));
    out.push_str(&format!("{:<10} {:<8} PATH\n", "CATEGORY", "EXISTS"));
    for category in Category::ALL {
        let exists = report.folders.get(&category).copied().unwrap_or(false);
        out.push_str(&format!(
            "{:<10} {:<8} {}\n",
            category,
            exists,
            index.layout().folder(category).display()
        ));
    }
    out.push_str(&format!(
        "{:<10} {:<8} {}\n",
        "templates", report.templates_exists, report.templates_path
    ));
    out.push('\n');
    out.push_str(&format!("Host page present: {}\n", report.index_html_exists));
    out.push_str(&format!("Documents:         {}\n", report.file_count));
    out
}
