// src/agent/mod.rs
pub mod executor;
pub mod prompts;
pub mod schema;
pub mod sql_agent;
pub mod sql_guard;

pub use executor::{PgQueryRunner, QueryRunner};
pub use sql_agent::SqlAgent;
