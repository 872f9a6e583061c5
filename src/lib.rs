pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod media;
pub mod synthesis;
pub mod version;
