#![forbid(unsafe_code)]

pub mod assemble;
pub mod build;
pub mod classify;
pub mod cli;
pub mod config;
pub mod content;
pub mod epub;
pub mod error;
pub mod formats;
pub mod http;
pub mod listing;
pub mod logging;
pub mod prompt;
pub mod resolve;
pub mod work;
