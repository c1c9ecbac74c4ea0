pub mod http;
pub mod ltsa;
pub mod mayan;

pub use http::HttpClientRequestError;
pub use ltsa::{HttpLtsaClient, LtsaClient, LtsaOrders};
pub use mayan::{DocumentStorageClient, ExternalResult, HttpDocumentStorageClient};
