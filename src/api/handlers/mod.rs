// src/api/handlers/mod.rs
mod health;
mod grading;

pub use health::health_check;
pub use grading::{error_status, get_candidates, grade, json_error};
