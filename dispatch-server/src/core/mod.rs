//! Engine assembly and configuration

pub mod config;
pub mod engine;

pub use config::Config;
pub use engine::DispatchEngine;
