// Library for tests to access modules

pub mod config;
pub mod error;
pub mod event_bus;
pub mod interface_registry;
pub mod models;
pub mod process_manager;
pub mod profile_store;
pub mod services;
pub mod worker;

pub use error::{Error, Result};
