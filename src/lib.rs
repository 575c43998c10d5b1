//! A small static file server: GET only, one thread per connection.

pub mod config;
pub mod connection;
pub mod error;
pub mod file;
pub mod log;
pub mod mime;
pub mod request;
pub mod server;
pub mod signal;
pub mod status;

pub use config::Config;
pub use server::Server;
pub use signal::ShutdownFlag;
