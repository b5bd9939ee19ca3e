pub mod plan_config;

pub use plan_config::*;
