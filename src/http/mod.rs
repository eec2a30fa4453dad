//! HTTP surface: a single multipart upload route

pub mod handler;
pub mod server;

pub use handler::{AppState, FILE_FIELD};
pub use server::{router, HttpServer};
