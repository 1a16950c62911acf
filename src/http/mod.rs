//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the pipeline and the server edge:
//! MIME detection, conditional-request caching, JSON formatting, and
//! hyper response construction. Decoupled from application logic.

pub mod cache;
pub mod json;
pub mod mime;
pub mod response;

pub use json::JSON_CONTENT_TYPE;
pub use response::from_outgoing;
