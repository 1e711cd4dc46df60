//! Retrieval-augmented question answering over course materials.
//!
//! [`RagSystem`] is the entry point used by the CLI and the HTTP API.

mod session;
mod system;

pub use session::{Exchange, SessionManager};
pub use system::{CourseAnalytics, QueryResponse, RagSystem};
