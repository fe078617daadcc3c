//! portal-core: Shared infrastructure for the staff-portal client crates.
pub mod error;
pub mod observability;

pub use reqwest;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
