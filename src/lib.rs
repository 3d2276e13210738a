pub mod app;
pub mod assemble;
pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod output;
pub mod soft;
pub mod store;
