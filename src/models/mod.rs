pub mod plan_models;

pub use plan_models::*;
