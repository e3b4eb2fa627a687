//! The privileged UI surface, without the rendering.

pub mod panel;
pub mod status;

pub use panel::Panel;
pub use status::{BusyFlag, ChatEntry, PanelControls, Severity, Status, StatusLine};
