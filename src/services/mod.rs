pub mod auth;
pub mod file;
pub mod workspace;

pub use auth::{AuthProvider, GateOutcome, SessionGate};
pub use file::{FileManager, UploadSettings, ViewState};
pub use workspace::Workspaces;
