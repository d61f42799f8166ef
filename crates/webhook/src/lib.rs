pub mod config;
pub mod logging;
pub mod policy;
pub mod registry;
pub mod webhook;
