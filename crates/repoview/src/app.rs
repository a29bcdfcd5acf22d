use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use repoview_core::{
    help_popup::{HelpPopup, browser_help_entries},
    keybinds::{Action, InputMode, KeyState, process_normal_key},
    tree::{TreeStats, TreeView, build_tree},
};
use repoview_github::{
    fetch::{FetchCmd, FetchOutcome, Fetcher},
    model::RepoLocator,
    preview::{PreviewContent, PreviewData},
};

/// State of the preview pane. A preview fetch is fire-and-forget: opening
/// another file does not cancel an in-flight request, so the last response
/// to arrive overwrites the pane.
pub enum PreviewState {
    Closed,
    Loading { name: String, path: String },
    Ready(PreviewData),
    Failed { name: String, message: String },
}

impl PreviewState {
    fn display_name(&self) -> Option<&str> {
        match self {
            PreviewState::Closed => None,
            PreviewState::Loading { name, .. } => Some(name),
            PreviewState::Ready(data) => Some(&data.name),
            PreviewState::Failed { name, .. } => Some(name),
        }
    }
}

/// The main application state.
pub struct App {
    pub locator: RepoLocator,
    fetcher: Fetcher,

    /// The view over the built tree (None until the listing arrives).
    pub tree: Option<TreeView>,
    pub stats: TreeStats,
    pub listing_error: Option<String>,
    pub listing_in_flight: bool,

    pub mode: InputMode,
    pub search_query: String,
    pub search_cursor: usize,

    pub preview: PreviewState,
    pub preview_scroll: usize,

    pub help: HelpPopup,
    pub should_quit: bool,
    key_state: KeyState,

    pub spinner_frame: u8,
    /// Tree panel height from the last render, for half-page motions.
    pub tree_viewport_lines: usize,
}

impl App {
    /// Create the app and kick off the listing fetch.
    pub fn new() -> Self {
        let locator = RepoLocator::default();
        let fetcher = Fetcher::spawn(locator.clone());
        fetcher.request(FetchCmd::Listing);

        Self {
            locator,
            fetcher,
            tree: None,
            stats: TreeStats::default(),
            listing_error: None,
            listing_in_flight: true,
            mode: InputMode::Normal,
            search_query: String::new(),
            search_cursor: 0,
            preview: PreviewState::Closed,
            preview_scroll: 0,
            help: HelpPopup::new(),
            should_quit: false,
            key_state: KeyState::default(),
            spinner_frame: 0,
            tree_viewport_lines: 20,
        }
    }

    pub fn spinner_char(&self) -> char {
        const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
        FRAMES[(self.spinner_frame as usize / 2) % FRAMES.len()]
    }

    fn fetch_in_flight(&self) -> bool {
        self.listing_in_flight || matches!(self.preview, PreviewState::Loading { .. })
    }

    /// Poll the fetcher (called every ~50ms) and advance the spinner.
    pub fn tick(&mut self) {
        if self.fetch_in_flight() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }

        while let Some(outcome) = self.fetcher.try_recv() {
            match outcome {
                FetchOutcome::Listing(Ok(entries)) => {
                    info!(entries = entries.len(), "repository listing loaded");
                    // The previous tree is fully discarded and rebuilt.
                    let (root, stats) = build_tree(&entries);
                    let mut view = TreeView::new(&root);
                    if !self.search_query.is_empty() {
                        view.set_filter(&self.search_query);
                    }
                    self.tree = Some(view);
                    self.stats = stats;
                    self.listing_error = None;
                    self.listing_in_flight = false;
                }
                FetchOutcome::Listing(Err(e)) => {
                    warn!(error = %e.message, "repository listing fetch failed");
                    self.tree = None;
                    self.stats = TreeStats::default();
                    self.listing_error = Some(e.message);
                    self.listing_in_flight = false;
                }
                FetchOutcome::Preview(result) => {
                    // Ignore responses for a pane the user already closed.
                    let Some(name) = self.preview.display_name().map(str::to_string) else {
                        continue;
                    };
                    self.preview = match result {
                        Ok(data) => PreviewState::Ready(data),
                        Err(e) => PreviewState::Failed {
                            name,
                            message: e.message,
                        },
                    };
                }
            }
        }
    }

    /// Handle a terminal event.
    pub fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Ctrl-c always quits
            if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
                self.should_quit = true;
                return;
            }

            if self.help.visible {
                self.handle_help_key(key);
                return;
            }

            if self.mode == InputMode::Search {
                self.handle_search_key(key);
                return;
            }

            let action = process_normal_key(key, &mut self.key_state);
            self.process_action(action);
        }
    }

    fn process_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::MoveDown(n) => {
                if let Some(tree) = &mut self.tree {
                    for _ in 0..n {
                        tree.move_down();
                    }
                }
            }
            Action::MoveUp(n) => {
                if let Some(tree) = &mut self.tree {
                    for _ in 0..n {
                        tree.move_up();
                    }
                }
            }
            Action::GotoTop => {
                if let Some(tree) = &mut self.tree {
                    tree.goto_top();
                }
            }
            Action::GotoBottom => {
                if let Some(tree) = &mut self.tree {
                    tree.goto_bottom();
                }
            }
            Action::HalfPageDown => {
                let lines = self.tree_viewport_lines;
                if let Some(tree) = &mut self.tree {
                    tree.half_page_down(lines);
                }
            }
            Action::HalfPageUp => {
                let lines = self.tree_viewport_lines;
                if let Some(tree) = &mut self.tree {
                    tree.half_page_up(lines);
                }
            }
            Action::Confirm => self.confirm_selected(),
            Action::Expand => {
                if let Some(tree) = &mut self.tree {
                    tree.expand_selected();
                }
            }
            Action::Collapse => {
                if let Some(tree) = &mut self.tree {
                    tree.collapse_or_parent();
                }
            }
            Action::Search => {
                self.mode = InputMode::Search;
                self.search_cursor = self.search_query.len();
            }
            Action::PreviewScrollDown => {
                if let PreviewState::Ready(data) = &self.preview {
                    let max = match &data.content {
                        PreviewContent::Text { lines, .. } => lines.saturating_sub(1),
                        PreviewContent::Image { .. } => 0,
                    };
                    self.preview_scroll = self.preview_scroll.saturating_add(1).min(max);
                }
            }
            Action::PreviewScrollUp => {
                self.preview_scroll = self.preview_scroll.saturating_sub(1);
            }
            Action::ClosePreview => {
                self.preview = PreviewState::Closed;
                self.preview_scroll = 0;
            }
            Action::Refresh => self.refresh_listing(),
            Action::Help => self.help.show("Help", browser_help_entries()),
            Action::None => {}
        }
    }

    /// Toggle the selected folder, or open the selected file in the
    /// preview pane.
    fn confirm_selected(&mut self) {
        let Some(tree) = &mut self.tree else {
            return;
        };
        let Some(row) = tree.selected_row() else {
            return;
        };

        if row.is_folder {
            tree.toggle_expand();
            return;
        }

        let path = row.path.clone();
        let name = row.name.clone();
        self.open_preview(path, name);
    }

    fn open_preview(&mut self, path: String, name: String) {
        debug!(%path, "opening preview");
        self.preview_scroll = 0;
        self.preview = PreviewState::Loading {
            name: name.clone(),
            path: path.clone(),
        };
        self.fetcher.request(FetchCmd::Preview { path, name });
    }

    fn refresh_listing(&mut self) {
        if self.listing_in_flight {
            return;
        }
        info!("refreshing repository listing");
        self.listing_in_flight = true;
        self.fetcher.request(FetchCmd::Listing);
    }

    // ── Search mode ──────────────────────────────────────────────────

    /// Live filter: every edit reapplies the filter immediately.
    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                // Clearing restores the collapsed baseline.
                self.search_query.clear();
                self.search_cursor = 0;
                self.mode = InputMode::Normal;
                self.apply_filter();
            }
            KeyCode::Enter => {
                // Keep the filter, return focus to the tree.
                self.mode = InputMode::Normal;
            }
            KeyCode::Char(c) => {
                self.search_query.insert(self.search_cursor, c);
                self.search_cursor += c.len_utf8();
                self.apply_filter();
            }
            KeyCode::Backspace => {
                if self.search_cursor > 0 {
                    let prev = self.search_query[..self.search_cursor]
                        .char_indices()
                        .next_back()
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    self.search_query.drain(prev..self.search_cursor);
                    self.search_cursor = prev;
                    self.apply_filter();
                }
            }
            _ => {}
        }
    }

    fn apply_filter(&mut self) {
        if let Some(tree) = &mut self.tree {
            tree.set_filter(&self.search_query);
        }
    }

    // ── Help popup ───────────────────────────────────────────────────

    fn handle_help_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.help.hide();
                self.key_state.reset();
            }
            KeyCode::Char('j') | KeyCode::Down => self.help.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.help.scroll_up(),
            _ => {}
        }
    }
}
