pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod master;
pub mod pipeline;
pub mod scanner;
pub mod selector;
