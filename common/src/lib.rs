pub mod messages;
pub mod config;
pub mod models;
pub mod sse;
pub mod utils;

pub use messages::*;
pub use config::*;
pub use models::session::{auth_headers, SessionCredential};
pub use sse::SseEvent;
pub use utils::*;
