pub mod cli;
pub mod device;
pub mod error;
pub mod policy;
pub mod service;
pub mod store;
