use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Input modes, modeled after vim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Default mode. Navigation and actions via keybinds.
    #[default]
    Normal,
    /// Live search input. Entered with `/`. Exited with `Esc` or `Enter`.
    Search,
}

impl InputMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Search => "SEARCH",
        }
    }
}

/// Actions that can result from processing a key event in Normal mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No-op — the key was consumed but nothing happens.
    None,
    /// Quit the application.
    Quit,
    /// Move selection down by N rows.
    MoveDown(usize),
    /// Move selection up by N rows.
    MoveUp(usize),
    /// Jump to top of the tree.
    GotoTop,
    /// Jump to bottom of the tree.
    GotoBottom,
    /// Half-page down.
    HalfPageDown,
    /// Half-page up.
    HalfPageUp,
    /// Toggle the selected folder or open the selected file.
    Confirm,
    /// Expand the selected folder.
    Expand,
    /// Collapse the selected folder or move to its parent.
    Collapse,
    /// Enter search mode.
    Search,
    /// Scroll the preview panel down.
    PreviewScrollDown,
    /// Scroll the preview panel up.
    PreviewScrollUp,
    /// Close the preview panel.
    ClosePreview,
    /// Discard the tree and refetch the listing.
    Refresh,
    /// Show the help popup.
    Help,
}

/// Pending key state for multi-key sequences like `gg`.
#[derive(Debug, Default, Clone)]
pub struct KeyState {
    /// Pending first key of a two-key sequence (e.g., 'g' for gg).
    pub pending_key: Option<char>,
}

impl KeyState {
    pub fn reset(&mut self) {
        self.pending_key = None;
    }
}

/// Process a key event in Normal mode, accounting for multi-key sequences.
pub fn process_normal_key(key: KeyEvent, state: &mut KeyState) -> Action {
    if let Some(pending) = state.pending_key.take() {
        return match (pending, key.code) {
            ('g', KeyCode::Char('g')) => Action::GotoTop,
            _ => Action::None, // Invalid sequence, ignore
        };
    }

    match key.code {
        KeyCode::Char('d') if key.modifiers == KeyModifiers::CONTROL => Action::HalfPageDown,
        KeyCode::Char('u') if key.modifiers == KeyModifiers::CONTROL => Action::HalfPageUp,
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown(1),
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp(1),
        KeyCode::Char('G') => Action::GotoBottom,
        KeyCode::Char('g') => {
            state.pending_key = Some('g');
            Action::None
        }
        KeyCode::Enter => Action::Confirm,
        KeyCode::Char('l') | KeyCode::Right => Action::Expand,
        KeyCode::Char('h') | KeyCode::Left => Action::Collapse,
        KeyCode::Char('/') => Action::Search,
        KeyCode::Char('J') => Action::PreviewScrollDown,
        KeyCode::Char('K') => Action::PreviewScrollUp,
        KeyCode::Char('x') => Action::ClosePreview,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('?') => Action::Help,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_single_keys() {
        let mut state = KeyState::default();
        assert_eq!(
            process_normal_key(key(KeyCode::Char('j')), &mut state),
            Action::MoveDown(1)
        );
        assert_eq!(
            process_normal_key(key(KeyCode::Enter), &mut state),
            Action::Confirm
        );
        assert_eq!(
            process_normal_key(key(KeyCode::Char('/')), &mut state),
            Action::Search
        );
    }

    #[test]
    fn test_gg_sequence() {
        let mut state = KeyState::default();
        assert_eq!(
            process_normal_key(key(KeyCode::Char('g')), &mut state),
            Action::None
        );
        assert_eq!(state.pending_key, Some('g'));
        assert_eq!(
            process_normal_key(key(KeyCode::Char('g')), &mut state),
            Action::GotoTop
        );
        assert_eq!(state.pending_key, None);
    }

    #[test]
    fn test_invalid_sequence_is_ignored() {
        let mut state = KeyState::default();
        process_normal_key(key(KeyCode::Char('g')), &mut state);
        assert_eq!(
            process_normal_key(key(KeyCode::Char('x')), &mut state),
            Action::None
        );
        assert_eq!(state.pending_key, None);
    }

    #[test]
    fn test_ctrl_half_page() {
        let mut state = KeyState::default();
        let ev = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(process_normal_key(ev, &mut state), Action::HalfPageDown);
    }
}
