pub mod context_menu;
pub mod dialog;
pub mod editor;
pub mod status_bar;
pub mod tree;
