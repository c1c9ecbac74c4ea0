pub mod activity_handlers;
pub mod admin_handlers;
pub mod document_handlers;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod lease_handlers;
pub mod property_handlers;
pub mod research_file_handlers;
pub mod routes;
pub mod state;
pub mod tool_handlers;
pub mod user_extractor;

pub use error::ErrorResponse;
pub use handlers::{health_check, ApiResult};
pub use routes::*;
pub use state::AppState;
