//! Book catalogue

pub mod models;
pub mod service;

pub use models::{Book, CreateBookRequest};
pub use service::BookService;
