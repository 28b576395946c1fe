#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod cli;
pub mod collector;
pub mod composer;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod llm;
pub mod platform;
pub mod profile;
pub mod scheduler;
pub mod store;

pub use config::Config;
pub use error::MimusError;
