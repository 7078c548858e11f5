//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → request.rs (request ID, client IP, header accessors)
//!     → identity + admission middleware
//!     → handlers.rs (downstream routes)
//!     → response.rs (403 / 500 rejections from the pipeline)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::Rejection;
pub use server::{build_router, AppState, HttpServer};
