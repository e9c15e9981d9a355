//! Infrastructure layer: storage, the write pipeline, configuration.

pub mod command_dispatcher;
pub mod config;
pub mod store;
