pub mod config;
pub mod models;
pub mod processor;
pub mod table;
