pub mod history;
pub mod kv;
pub mod questions;
pub mod schema;
