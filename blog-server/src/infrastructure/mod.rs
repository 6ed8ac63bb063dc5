pub mod config;
pub mod database;
pub mod logging;
pub mod sanitize;
pub mod security;
