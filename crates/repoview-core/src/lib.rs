pub mod help_popup;
pub mod keybinds;
pub mod tree;
pub mod ui;
