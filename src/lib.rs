pub mod backend;
pub mod codec;
pub mod commands;
pub mod config;
pub mod document;
pub mod framer;
pub mod outcome;
pub mod reply;
pub mod server;
pub mod session;
pub mod target;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
