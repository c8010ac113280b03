pub mod benchmark;
pub mod config;
pub mod host;
pub mod riders;
