// State management module
// Handles application state and the workflow registry

pub mod app_state;
pub mod workflows;

pub use app_state::{build_generator, AppState};
pub use workflows::PrepareOptions;
