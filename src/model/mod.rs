pub mod activity;
pub mod claim;
pub mod common;
pub mod concurrency;
pub mod document;
pub mod filter;
pub mod lease;
pub mod paged;
pub mod permission;
pub mod property;
pub mod research_file;
pub mod role;
pub mod tenant;
pub mod user_context;

pub use activity::*;
pub use claim::*;
pub use common::*;
pub use concurrency::*;
pub use document::*;
pub use filter::*;
pub use lease::*;
pub use paged::*;
pub use permission::*;
pub use property::*;
pub use research_file::*;
pub use role::*;
pub use tenant::*;
pub use user_context::*;
