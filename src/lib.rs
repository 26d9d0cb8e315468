pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod session;
pub mod store;
pub mod ui;
