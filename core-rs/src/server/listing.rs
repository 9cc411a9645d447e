//! HTML directory listing

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::Path;

use super::http::escape_html;

/// Characters left as-is in listing links (unreserved plus `/`)
const LINK_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl ListingEntry {
    /// Visible text: symlinks get `@` (even to directories), directories get `/`
    pub fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Relative link target (directories keep a trailing slash)
    pub fn href(&self) -> String {
        let link = if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        };
        utf8_percent_encode(&link, LINK_ENCODE_SET).to_string()
    }
}

/// Collect the entries of `dir`, sorted case-insensitively
///
/// Symlinks are followed to decide whether an entry is a directory.
pub async fn read_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_symlink = entry.file_type().await.map(|t| t.is_symlink()).unwrap_or(false);
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        entries.push(ListingEntry {
            name,
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_key(|entry| entry.name.to_lowercase());
    Ok(entries)
}

/// Render the listing page for `display_path` (the decoded URL path)
pub fn render(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));

    let mut page = String::new();
    page.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str(&format!("<title>{}</title>\n</head>\n<body>\n", title));
    page.push_str(&format!("<h1>{}</h1>\n<hr>\n<ul>\n", title));
    for entry in entries {
        page.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            entry.href(),
            escape_html(&entry.display_name())
        ));
    }
    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    page
}
