// src/lib.rs
pub mod api;
pub mod banner;
pub mod cache;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod invoker;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod resolver;
pub mod runner;
