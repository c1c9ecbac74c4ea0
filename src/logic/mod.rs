pub mod concurrency;
pub mod guard;
pub mod validate;

pub use concurrency::*;
pub use guard::*;
pub use validate::*;
