use std::time::Duration;

use crate::device::{DEFAULT_PORT, DEFAULT_TIMEOUT, DeviceSettings};
use crate::error::QoscError;

use super::args::{Args, DeviceArgs};
use super::config::ConfigFile;

/// Merge settings from the config file with command line and environment overrides
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load the config file named on the command line, or defaults
    pub fn config(args: &Args) -> Result<ConfigFile, QoscError> {
        match args.config.as_ref() {
            Some(path) => ConfigFile::load(path),
            None => Ok(ConfigFile::default()),
        }
    }

    /// Resolve switch connection settings; flags win over the config file
    pub fn device(args: &DeviceArgs, config: &ConfigFile) -> Result<DeviceSettings, QoscError> {
        let file = &config.device;

        let host = args
            .host
            .clone()
            .or_else(|| file.host.clone())
            .ok_or(QoscError::MissingSetting("device.host"))?;
        let username = args
            .username
            .clone()
            .or_else(|| file.username.clone())
            .ok_or(QoscError::MissingSetting("device.username"))?;

        // --insecure can only relax verification, never re-enable it
        let verify_tls = !args.insecure && file.verify_tls.unwrap_or(true);

        Ok(DeviceSettings {
            host,
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            username,
            password: args
                .password
                .clone()
                .or_else(|| file.password.clone())
                .unwrap_or_default(),
            verify_tls,
            timeout: args
                .timeout
                .or(file.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        })
    }

    /// Dry-run is on if either the flag or the config file asks for it
    pub fn dry_run(flag: bool, config: &ConfigFile) -> bool {
        flag || config.execution.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::{DeviceConfig, ExecutionConfig};

    fn file_config() -> ConfigFile {
        ConfigFile {
            device: DeviceConfig {
                host: Some("sw1.lab".to_string()),
                port: Some(8443),
                username: Some("admin".to_string()),
                password: Some("from-file".to_string()),
                verify_tls: None,
                timeout_secs: Some(5),
            },
            execution: ExecutionConfig { dry_run: false },
        }
    }

    #[test]
    fn config_file_values_fill_in_defaults() {
        let settings = SettingsLoader::device(&DeviceArgs::default(), &file_config()).unwrap();

        assert_eq!(settings.host, "sw1.lab");
        assert_eq!(settings.port, 8443);
        assert_eq!(settings.password, "from-file");
        assert!(settings.verify_tls);
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn flags_override_config_file() {
        let args = DeviceArgs {
            host: Some("10.0.0.1".to_string()),
            password: Some("from-flag".to_string()),
            insecure: true,
            timeout: Some(60),
            ..Default::default()
        };

        let settings = SettingsLoader::device(&args, &file_config()).unwrap();
        assert_eq!(settings.host, "10.0.0.1");
        assert_eq!(settings.username, "admin");
        assert_eq!(settings.password, "from-flag");
        assert!(!settings.verify_tls);
        assert_eq!(settings.timeout, Duration::from_secs(60));
    }

    #[test]
    fn built_in_defaults() {
        let args = DeviceArgs {
            host: Some("sw1".to_string()),
            username: Some("admin".to_string()),
            ..Default::default()
        };

        let settings = SettingsLoader::device(&args, &ConfigFile::default()).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert!(settings.verify_tls);
        assert_eq!(settings.password, "");
    }

    #[test]
    fn missing_host_is_reported() {
        let err = SettingsLoader::device(&DeviceArgs::default(), &ConfigFile::default())
            .unwrap_err();
        assert!(matches!(err, QoscError::MissingSetting("device.host")));
    }

    #[test]
    fn dry_run_from_either_source() {
        let mut config = ConfigFile::default();
        assert!(!SettingsLoader::dry_run(false, &config));
        assert!(SettingsLoader::dry_run(true, &config));

        config.execution.dry_run = true;
        assert!(SettingsLoader::dry_run(false, &config));
    }
}
