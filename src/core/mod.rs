//! Core slug generation engine module

pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod pinyin;
pub mod selection;
pub mod settings;
pub mod slug;
pub mod store;
pub mod uniqueness;
pub mod usage;
pub mod validator;
