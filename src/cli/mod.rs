pub mod args;
pub mod commands;
pub mod config;
pub mod loader;

pub use args::{Args, Command, DeviceArgs};
pub use commands::run;
pub use config::ConfigFile;
pub use loader::SettingsLoader;
