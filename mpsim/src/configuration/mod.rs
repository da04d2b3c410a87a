pub mod config;
pub mod param_file;
