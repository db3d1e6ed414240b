pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod expander;
pub mod gbif;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod source;
pub mod table;
