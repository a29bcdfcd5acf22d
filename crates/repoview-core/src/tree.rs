use std::collections::HashMap;

use tracing::warn;

// ── Path entries ─────────────────────────────────────────────────────

/// Kind of a listed repository entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A file.
    Blob,
    /// A directory.
    Tree,
}

/// One flat record from the repository listing: a full `/`-separated path
/// plus whether it names a file or a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: String,
    pub kind: EntryKind,
}

impl PathEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
        }
    }
}

// ── Tree nodes ───────────────────────────────────────────────────────

/// The in-memory hierarchical reconstruction of the flat listing.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Folder { children: HashMap<String, TreeNode> },
    File { path: String },
}

impl TreeNode {
    fn empty_folder() -> Self {
        TreeNode::Folder {
            children: HashMap::new(),
        }
    }
}

/// Running tally of listed entries, for the stats line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub folders: usize,
    pub files: usize,
}

// ── Tree builder ─────────────────────────────────────────────────────

/// Build the nested tree from a flat list of path entries.
///
/// Entries may arrive in any order; every intermediate segment of a file's
/// path is materialized as a folder even when the listing carries no
/// explicit entry for it. Folder entries are idempotent and never clobber
/// children created earlier. The stats tally counts listed entries, not
/// reconstructed nodes.
pub fn build_tree(entries: &[PathEntry]) -> (HashMap<String, TreeNode>, TreeStats) {
    let mut root = HashMap::new();
    let mut stats = TreeStats::default();

    for entry in entries {
        match entry.kind {
            EntryKind::Blob => stats.files += 1,
            EntryKind::Tree => stats.folders += 1,
        }
        insert_entry(&mut root, entry);
    }

    (root, stats)
}

fn insert_entry(root: &mut HashMap<String, TreeNode>, entry: &PathEntry) {
    let segments: Vec<&str> = entry.path.split('/').collect();
    let Some((last, ancestors)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in ancestors {
        let node = current
            .entry((*segment).to_string())
            .or_insert_with(TreeNode::empty_folder);
        match node {
            TreeNode::Folder { children } => current = children,
            TreeNode::File { .. } => {
                // Invalid input: an ancestor segment already resolves to a
                // file. Keep the first write and drop this entry.
                warn!(path = %entry.path, segment, "path routes through a file, dropping entry");
                return;
            }
        }
    }

    match entry.kind {
        EntryKind::Blob => match current.get(*last) {
            Some(TreeNode::Folder { children }) if !children.is_empty() => {
                warn!(path = %entry.path, "file collides with populated folder, keeping folder");
            }
            _ => {
                // A placeholder folder (no children yet) yields to the file.
                current.insert(
                    (*last).to_string(),
                    TreeNode::File {
                        path: entry.path.clone(),
                    },
                );
            }
        },
        EntryKind::Tree => match current.get(*last) {
            Some(TreeNode::Folder { .. }) => {}
            Some(TreeNode::File { .. }) => {
                warn!(path = %entry.path, "folder collides with file, keeping file");
            }
            None => {
                current.insert((*last).to_string(), TreeNode::empty_folder());
            }
        },
    }
}

// ── View nodes ───────────────────────────────────────────────────────

/// A renderable node: sorted children, expansion flag, and the lowercased
/// full path the search filter matches against.
#[derive(Debug, Clone)]
pub struct ViewNode {
    pub name: String,
    /// Full original path (used to open previews and to identify the node).
    pub path: String,
    /// Lowercased full path, matched against the search query.
    pub match_key: String,
    pub is_folder: bool,
    pub expanded: bool,
    pub children: Vec<ViewNode>,
}

/// A flattened row — one visible line in the tree panel.
#[derive(Debug, Clone)]
pub struct FlatRow {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub is_folder: bool,
    pub is_expanded: bool,
    pub has_children: bool,
    /// Marks a search hit while a filter is active.
    pub is_match: bool,
    /// `(in parent/)` annotation for nested search hits.
    pub breadcrumb: Option<String>,
    /// For each depth level 0..depth, whether a vertical guide line (│)
    /// should be drawn.
    pub guide_depths: Vec<bool>,
}

// ── Tree view ────────────────────────────────────────────────────────

/// Presentation state over a built tree: the whole view-node tree is
/// materialized eagerly; expansion and filtering only decide which rows
/// the flattening pass emits.
pub struct TreeView {
    pub roots: Vec<ViewNode>,
    /// Flattened visible rows for rendering and navigation.
    pub flat_view: Vec<FlatRow>,
    /// Currently selected index into flat_view.
    pub selected: usize,
    /// Active search query, lowercased. Empty = no filter.
    query: String,
}

impl TreeView {
    pub fn new(root: &HashMap<String, TreeNode>) -> Self {
        let mut view = Self {
            roots: build_view_nodes(root, ""),
            flat_view: Vec::new(),
            selected: 0,
            query: String::new(),
        };
        view.rebuild_flat_view();
        view
    }

    /// Rebuild the flat_view from the current tree state, preserving
    /// selection by path if possible.
    pub fn rebuild_flat_view(&mut self) {
        let old_path = self.selected_row().map(|r| r.path.clone());
        self.flat_view.clear();
        if self.query.is_empty() {
            flatten_tree(&self.roots, 0, &[], &mut self.flat_view);
        } else {
            flatten_filtered(&self.roots, 0, &[], &self.query, &mut self.flat_view);
        }

        if let Some(path) = old_path {
            if let Some(pos) = self.flat_view.iter().position(|r| r.path == path) {
                self.selected = pos;
                return;
            }
        }
        self.selected = self.selected.min(self.flat_view.len().saturating_sub(1));
    }

    /// Apply a search filter. An empty query restores the baseline: every
    /// row visible, every folder collapsed — manual expand state from
    /// before the search is discarded.
    pub fn set_filter(&mut self, query: &str) {
        self.query = query.to_lowercase();
        if self.query.is_empty() {
            collapse_all(&mut self.roots);
        }
        self.rebuild_flat_view();
    }

    /// Whether a non-empty filter is currently applied.
    pub fn filter_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn selected_row(&self) -> Option<&FlatRow> {
        self.flat_view.get(self.selected)
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.flat_view.len() {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn goto_top(&mut self) {
        self.selected = 0;
    }

    pub fn goto_bottom(&mut self) {
        self.selected = self.flat_view.len().saturating_sub(1);
    }

    pub fn half_page_down(&mut self, visible_lines: usize) {
        let half = visible_lines / 2;
        self.selected = (self.selected + half).min(self.flat_view.len().saturating_sub(1));
    }

    pub fn half_page_up(&mut self, visible_lines: usize) {
        let half = visible_lines / 2;
        self.selected = self.selected.saturating_sub(half);
    }

    /// Toggle expansion of the selected folder. Flips only that folder —
    /// siblings and ancestors keep their state.
    pub fn toggle_expand(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        if !row.is_folder {
            return false;
        }
        let path = row.path.clone();
        if let Some(node) = find_node_mut(&mut self.roots, &path) {
            node.expanded = !node.expanded;
            self.rebuild_flat_view();
            return true;
        }
        false
    }

    /// Expand the selected folder (no-op if already expanded or a file).
    pub fn expand_selected(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        if !row.is_folder || row.is_expanded {
            return false;
        }
        let path = row.path.clone();
        if let Some(node) = find_node_mut(&mut self.roots, &path) {
            node.expanded = true;
            self.rebuild_flat_view();
            return true;
        }
        false
    }

    /// Collapse the selected folder, or move to its parent if it is already
    /// collapsed or a file.
    pub fn collapse_or_parent(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if row.is_folder && row.is_expanded {
            let path = row.path.clone();
            if let Some(node) = find_node_mut(&mut self.roots, &path) {
                node.expanded = false;
                self.rebuild_flat_view();
            }
            return;
        }
        if let Some((parent, _)) = row.path.rsplit_once('/') {
            let parent = parent.to_string();
            if let Some(pos) = self.flat_view.iter().position(|r| r.path == parent) {
                self.selected = pos;
            }
        }
    }
}

// ── Tree view construction ───────────────────────────────────────────

/// Build sorted view nodes from a tree mapping: folders before files, each
/// group alphabetically (case-insensitive). This ordering determines both
/// the visual order and the order the search filter inspects rows in.
fn build_view_nodes(mapping: &HashMap<String, TreeNode>, prefix: &str) -> Vec<ViewNode> {
    let mut nodes: Vec<ViewNode> = mapping
        .iter()
        .map(|(name, node)| {
            let full = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            match node {
                TreeNode::Folder { children } => ViewNode {
                    name: name.clone(),
                    match_key: full.to_lowercase(),
                    children: build_view_nodes(children, &full),
                    path: full,
                    is_folder: true,
                    expanded: false,
                },
                TreeNode::File { path } => ViewNode {
                    name: name.clone(),
                    path: path.clone(),
                    match_key: path.to_lowercase(),
                    is_folder: false,
                    expanded: false,
                    children: Vec::new(),
                },
            }
        })
        .collect();

    nodes.sort_by(|a, b| {
        let type_ord = match (a.is_folder, b.is_folder) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => std::cmp::Ordering::Equal,
        };
        type_ord.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    nodes
}

fn collapse_all(nodes: &mut [ViewNode]) {
    for node in nodes.iter_mut() {
        node.expanded = false;
        collapse_all(&mut node.children);
    }
}

fn find_node_mut<'a>(nodes: &'a mut [ViewNode], path: &str) -> Option<&'a mut ViewNode> {
    for node in nodes.iter_mut() {
        if node.path == path {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, path) {
            return Some(found);
        }
    }
    None
}

// ── Flattening ───────────────────────────────────────────────────────

/// Flatten visible tree nodes into rows, skipping collapsed subtrees.
fn flatten_tree(nodes: &[ViewNode], depth: usize, parent_guides: &[bool], out: &mut Vec<FlatRow>) {
    for node in nodes.iter() {
        out.push(FlatRow {
            path: node.path.clone(),
            name: node.name.clone(),
            depth,
            is_folder: node.is_folder,
            is_expanded: node.expanded,
            has_children: !node.children.is_empty(),
            is_match: false,
            breadcrumb: None,
            guide_depths: parent_guides.to_vec(),
        });

        if node.expanded && !node.children.is_empty() {
            let mut child_guides = parent_guides.to_vec();
            child_guides.push(true);
            flatten_tree(&node.children, depth + 1, &child_guides, out);
        }
    }
}

/// Flatten under an active filter. A row is emitted when its lowercased
/// full path contains the query, or when any descendant's does — ancestors
/// of a match are forced visible and expanded regardless of their own
/// expansion state. Matching rows below the top level carry a breadcrumb
/// naming their parent path. Returns whether the subtree contains a match.
fn flatten_filtered(
    nodes: &[ViewNode],
    depth: usize,
    parent_guides: &[bool],
    query: &str,
    out: &mut Vec<FlatRow>,
) -> bool {
    let mut any_match = false;
    for node in nodes.iter() {
        let is_match = node.match_key.contains(query);

        let mut child_rows = Vec::new();
        let mut child_guides = parent_guides.to_vec();
        child_guides.push(true);
        let descendant_match = flatten_filtered(
            &node.children,
            depth + 1,
            &child_guides,
            query,
            &mut child_rows,
        );

        if !is_match && !descendant_match {
            continue;
        }
        any_match = true;

        let breadcrumb = if is_match {
            node.path
                .rsplit_once('/')
                .map(|(parent, _)| format!("(in {parent}/)"))
        } else {
            None
        };

        out.push(FlatRow {
            path: node.path.clone(),
            name: node.name.clone(),
            depth,
            is_folder: node.is_folder,
            is_expanded: descendant_match,
            has_children: !node.children.is_empty(),
            is_match,
            breadcrumb,
            guide_depths: parent_guides.to_vec(),
        });
        out.append(&mut child_rows);
    }
    any_match
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<PathEntry> {
        vec![
            PathEntry::blob("README.md"),
            PathEntry::tree("src"),
            PathEntry::blob("src/main.rs"),
        ]
    }

    #[test]
    fn test_build_sample_listing() {
        let (root, stats) = build_tree(&sample_entries());

        assert_eq!(root.len(), 2);
        assert!(matches!(root.get("README.md"), Some(TreeNode::File { .. })));
        let TreeNode::Folder { children } = root.get("src").unwrap() else {
            panic!("src should be a folder");
        };
        assert_eq!(children.len(), 1);
        assert!(matches!(
            children.get("main.rs"),
            Some(TreeNode::File { path }) if path == "src/main.rs"
        ));

        assert_eq!(stats.folders, 1);
        assert_eq!(stats.files, 2);
    }

    #[test]
    fn test_implied_ancestor_folders() {
        // No explicit entry for "a" or "a/b" — both must exist as folders.
        let (root, _) = build_tree(&[PathEntry::blob("a/b/c.txt")]);

        let TreeNode::Folder { children: a } = root.get("a").unwrap() else {
            panic!("a should be a folder");
        };
        let TreeNode::Folder { children: b } = a.get("b").unwrap() else {
            panic!("a/b should be a folder");
        };
        assert!(matches!(b.get("c.txt"), Some(TreeNode::File { .. })));
    }

    #[test]
    fn test_builder_is_order_independent() {
        let entries = vec![
            PathEntry::blob("src/lib/util.rs"),
            PathEntry::tree("src"),
            PathEntry::tree("src/lib"),
            PathEntry::blob("src/main.rs"),
            PathEntry::blob("README.md"),
            PathEntry::tree("docs"),
        ];
        let (forward, _) = build_tree(&entries);

        let mut reversed = entries.clone();
        reversed.reverse();
        let (backward, _) = build_tree(&reversed);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_folder_entry_never_clobbers_children() {
        // The blob arrives first, implying "pkg" as a populated folder;
        // a later explicit (empty) folder entry must not reset it.
        let (root, _) = build_tree(&[PathEntry::blob("pkg/mod.rs"), PathEntry::tree("pkg")]);

        let TreeNode::Folder { children } = root.get("pkg").unwrap() else {
            panic!("pkg should be a folder");
        };
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn test_blob_replaces_placeholder_folder() {
        let (root, _) = build_tree(&[PathEntry::tree("notes"), PathEntry::blob("notes")]);
        assert!(matches!(root.get("notes"), Some(TreeNode::File { .. })));
    }

    #[test]
    fn test_blob_keeps_populated_folder() {
        let (root, _) = build_tree(&[PathEntry::blob("pkg/mod.rs"), PathEntry::blob("pkg")]);

        let TreeNode::Folder { children } = root.get("pkg").unwrap() else {
            panic!("pkg should still be a folder");
        };
        assert!(children.contains_key("mod.rs"));
    }

    #[test]
    fn test_folder_entry_keeps_existing_file() {
        let (root, _) = build_tree(&[PathEntry::blob("notes"), PathEntry::tree("notes")]);
        assert!(matches!(root.get("notes"), Some(TreeNode::File { .. })));
    }

    #[test]
    fn test_entry_through_file_is_dropped() {
        let (root, _) = build_tree(&[PathEntry::blob("notes"), PathEntry::blob("notes/a.txt")]);
        assert!(matches!(root.get("notes"), Some(TreeNode::File { .. })));
    }

    fn view_for(entries: &[PathEntry]) -> TreeView {
        let (root, _) = build_tree(entries);
        TreeView::new(&root)
    }

    #[test]
    fn test_folders_sort_before_files() {
        let mut view = view_for(&[
            PathEntry::blob("b/x.txt"),
            PathEntry::blob("a.txt"),
            PathEntry::tree("A"),
        ]);

        let names: Vec<&str> = view.flat_view.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b", "a.txt"]);
        assert!(view.flat_view[0].is_folder);
        assert!(view.flat_view[1].is_folder);
        assert!(!view.flat_view[2].is_folder);

        // Expand b — x.txt appears nested under it.
        view.selected = 1;
        assert!(view.toggle_expand());
        let names: Vec<&str> = view.flat_view.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b", "x.txt", "a.txt"]);
        assert_eq!(view.flat_view[2].depth, 1);
    }

    #[test]
    fn test_initially_collapsed() {
        let view = view_for(&sample_entries());
        // Only root rows are visible; src is collapsed.
        assert_eq!(view.flat_view.len(), 2);
        assert!(!view.flat_view[0].is_expanded);
    }

    #[test]
    fn test_toggle_affects_only_that_folder() {
        let mut view = view_for(&[
            PathEntry::blob("one/a.txt"),
            PathEntry::blob("two/b.txt"),
        ]);

        view.selected = 0; // "one"
        view.toggle_expand();

        let names: Vec<&str> = view.flat_view.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["one", "a.txt", "two"]);
        assert!(view.flat_view[0].is_expanded);
        assert!(!view.flat_view[2].is_expanded);
    }

    #[test]
    fn test_collapse_or_parent_moves_to_parent() {
        let mut view = view_for(&[PathEntry::blob("one/a.txt")]);
        view.selected = 0;
        view.toggle_expand();
        view.selected = 1; // a.txt
        view.collapse_or_parent();
        assert_eq!(view.selected_row().unwrap().name, "one");
    }

    #[test]
    fn test_deep_match_exposes_ancestor_chain() {
        let mut view = view_for(&[
            PathEntry::blob("src/deep/hidden_gem.rs"),
            PathEntry::blob("src/other.rs"),
            PathEntry::blob("docs/readme.md"),
        ]);

        view.set_filter("gem");

        let names: Vec<&str> = view.flat_view.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["src", "deep", "hidden_gem.rs"]);

        // Ancestors forced expanded, the match marked and annotated.
        assert!(view.flat_view[0].is_expanded);
        assert!(!view.flat_view[0].is_match);
        assert!(view.flat_view[1].is_expanded);
        let hit = &view.flat_view[2];
        assert!(hit.is_match);
        assert_eq!(hit.breadcrumb.as_deref(), Some("(in src/deep/)"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let mut view = view_for(&[PathEntry::blob("README.md")]);
        view.set_filter("readme");
        assert_eq!(view.flat_view.len(), 1);
        assert!(view.flat_view[0].is_match);
    }

    #[test]
    fn test_top_level_match_has_no_breadcrumb() {
        let mut view = view_for(&[PathEntry::blob("README.md")]);
        view.set_filter("read");
        assert!(view.flat_view[0].breadcrumb.is_none());
    }

    #[test]
    fn test_multiple_matches_share_ancestors() {
        let mut view = view_for(&[
            PathEntry::blob("src/alpha_one.rs"),
            PathEntry::blob("src/sub/alpha_two.rs"),
            PathEntry::blob("src/beta.rs"),
        ]);

        view.set_filter("alpha");

        let names: Vec<&str> = view.flat_view.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["src", "sub", "alpha_two.rs", "alpha_one.rs"]);
    }

    #[test]
    fn test_no_match_hides_everything() {
        let mut view = view_for(&sample_entries());
        view.set_filter("zzz-nothing");
        assert!(view.flat_view.is_empty());
    }

    #[test]
    fn test_clearing_filter_resets_to_collapsed_baseline() {
        let mut view = view_for(&[
            PathEntry::blob("src/deep/hidden_gem.rs"),
            PathEntry::blob("docs/readme.md"),
        ]);

        // Manually expand docs, then search, then clear.
        view.selected = 0; // "docs"
        view.toggle_expand();
        view.set_filter("gem");
        view.set_filter("");

        // Everything visible again, every folder collapsed — including the
        // manually expanded one.
        let names: Vec<&str> = view.flat_view.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "src"]);
        assert!(view.flat_view.iter().all(|r| !r.is_expanded));
        assert!(view.flat_view.iter().all(|r| !r.is_match));
        assert!(view.flat_view.iter().all(|r| r.breadcrumb.is_none()));
    }

    #[test]
    fn test_selection_preserved_across_toggle() {
        let mut view = view_for(&[
            PathEntry::blob("one/a.txt"),
            PathEntry::blob("two/b.txt"),
        ]);
        view.selected = 1; // "two"
        let selected_path = view.selected_row().unwrap().path.clone();

        view.selected = 0;
        view.toggle_expand(); // expand "one", rows shift
        view.selected = view
            .flat_view
            .iter()
            .position(|r| r.path == selected_path)
            .unwrap();
        assert_eq!(view.selected_row().unwrap().name, "two");
    }

    #[test]
    fn test_guide_depths() {
        let mut view = view_for(&[
            PathEntry::blob("a/sub/one.txt"),
            PathEntry::blob("a/two.txt"),
            PathEntry::blob("b.txt"),
        ]);
        view.selected = 0; // "a"
        view.toggle_expand();
        view.selected = 1; // "sub"
        view.toggle_expand();

        assert_eq!(view.flat_view.len(), 5);
        assert_eq!(view.flat_view[0].guide_depths, Vec::<bool>::new());
        assert_eq!(view.flat_view[1].guide_depths, vec![true]);
        assert_eq!(view.flat_view[2].guide_depths, vec![true, true]);
        assert_eq!(view.flat_view[3].guide_depths, vec![true]);
        assert_eq!(view.flat_view[4].guide_depths, Vec::<bool>::new());
    }

    #[test]
    fn test_navigation_bounds() {
        let mut view = view_for(&sample_entries());
        assert_eq!(view.selected, 0);
        view.move_up();
        assert_eq!(view.selected, 0);
        view.move_down();
        assert_eq!(view.selected, 1);
        view.move_down(); // already at bottom
        assert_eq!(view.selected, 1);
        view.goto_top();
        assert_eq!(view.selected, 0);
        view.goto_bottom();
        assert_eq!(view.selected, 1);
    }
}
