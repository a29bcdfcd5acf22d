use anyhow::{Context, Result};
use serde::Deserialize;

use repoview_core::tree::{EntryKind, PathEntry};

/// Default repository identity. These three constants are the only
/// configuration the browser carries.
pub const DEFAULT_OWNER: &str = "DaintyDust";
pub const DEFAULT_REPO: &str = "http-resources";
pub const DEFAULT_BRANCH: &str = "main";

// ── Repo locator ─────────────────────────────────────────────────────

/// Identifies one repository branch and knows how to build the two
/// endpoint URLs: the recursive-tree listing and per-file raw content.
#[derive(Debug, Clone)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl Default for RepoLocator {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl RepoLocator {
    /// Recursive-tree listing endpoint.
    pub fn listing_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/git/trees/{}?recursive=1",
            self.owner, self.repo, self.branch
        )
    }

    /// Raw-content URL for a single file path.
    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.owner, self.repo, self.branch, path
        )
    }

    /// Short identity label for the status bar, e.g. `owner/repo@main`.
    pub fn label(&self) -> String {
        format!("{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

// ── Listing wire model ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TreeListing {
    tree: Vec<ListedItem>,
}

#[derive(Debug, Deserialize)]
struct ListedItem {
    path: String,
    #[serde(rename = "type")]
    kind: ListedKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ListedKind {
    Blob,
    Tree,
    /// Submodule commits and anything GitHub adds later.
    #[serde(other)]
    Other,
}

/// Parse the listing response body into path entries. Unknown entry kinds
/// (e.g. submodule commits) are skipped.
pub fn parse_listing(body: &str) -> Result<Vec<PathEntry>> {
    let listing: TreeListing =
        serde_json::from_str(body).context("Unexpected listing response body")?;

    Ok(listing
        .tree
        .into_iter()
        .filter_map(|item| {
            let kind = match item.kind {
                ListedKind::Blob => EntryKind::Blob,
                ListedKind::Tree => EntryKind::Tree,
                ListedKind::Other => return None,
            };
            Some(PathEntry {
                path: item.path,
                kind,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        let locator = RepoLocator::default();
        assert_eq!(
            locator.listing_url(),
            "https://api.github.com/repos/DaintyDust/http-resources/git/trees/main?recursive=1"
        );
    }

    #[test]
    fn test_raw_url() {
        let locator = RepoLocator::default();
        assert_eq!(
            locator.raw_url("src/main.rs"),
            "https://raw.githubusercontent.com/DaintyDust/http-resources/main/src/main.rs"
        );
    }

    #[test]
    fn test_parse_listing() {
        let body = r#"{
            "sha": "abc",
            "tree": [
                {"path": "README.md", "mode": "100644", "type": "blob", "sha": "x"},
                {"path": "src", "mode": "040000", "type": "tree", "sha": "y"},
                {"path": "src/main.rs", "mode": "100644", "type": "blob", "sha": "z"}
            ],
            "truncated": false
        }"#;

        let entries = parse_listing(body).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], PathEntry::blob("README.md"));
        assert_eq!(entries[1], PathEntry::tree("src"));
        assert_eq!(entries[2], PathEntry::blob("src/main.rs"));
    }

    #[test]
    fn test_parse_listing_skips_unknown_kinds() {
        let body = r#"{"tree": [
            {"path": "vendored", "type": "commit"},
            {"path": "a.txt", "type": "blob"}
        ]}"#;

        let entries = parse_listing(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "a.txt");
    }

    #[test]
    fn test_parse_listing_rejects_garbage() {
        assert!(parse_listing("not json").is_err());
        assert!(parse_listing(r#"{"message": "Not Found"}"#).is_err());
    }
}
