pub mod binder;
pub mod controller;

pub use binder::{ElementRole, Row, ViewBinder};
pub use controller::{InteractionController, InteractionKind, MenuItem, PointerEvent};
