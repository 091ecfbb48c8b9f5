//! Terminal shell around the view models.
//!
//! `App` is split across files by concern: construction, keyboard routing,
//! overlays, the pending-action runner and the periodic tick.

mod actions;
mod init;
mod input;
mod keyboard;
mod overlays;
mod state;
mod tick;

pub use input::TextInput;
pub use state::{
    AgentEditorState, AgentPickerState, App, AuthForm, AuthMode, ConfirmDeleteState,
    DeleteSubject, OverlayState, PendingAction, UploadPromptState,
};
