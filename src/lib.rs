pub mod app;
pub mod config;
pub mod datasets;
pub mod domain;
pub mod error;
pub mod lineage;
pub mod output;
pub mod resolver;
pub mod table;
