//! Terminal administrative console for the Distributo task-distribution
//! backend.
//!
//! The library holds everything that is independent of the terminal: the
//! session context, the REST gateway, the view models for the agent roster
//! and the batch lifecycle, and the route guard. The `distributo` binary
//! wires them into a ratatui shell (`app` + `ui`).

pub mod api;
pub mod app;
pub mod batches;
pub mod config;
pub mod confirm;
pub mod dashboard;
pub mod event;
pub mod guard;
pub mod logging;
pub mod registry;
pub mod session;
pub mod tui;
pub mod ui;
pub mod validation;
