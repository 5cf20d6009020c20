use std::path::PathBuf;

use clap::{Parser, Subcommand, builder::BoolishValueParser};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compile QoS policies into NX-OS configuration and apply them over NX-API"
)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Switch connection overrides (take precedence over the config file)
#[derive(clap::Args, Debug, Default)]
pub struct DeviceArgs {
    /// Switch hostname or IP address
    #[arg(long, env = "QOSC_HOST", global = true)]
    pub host: Option<String>,

    /// NX-API HTTPS port
    #[arg(long, env = "QOSC_PORT", global = true)]
    pub port: Option<u16>,

    /// NX-API username
    #[arg(long, env = "QOSC_USERNAME", global = true)]
    pub username: Option<String>,

    /// NX-API password
    #[arg(long, env = "QOSC_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Skip TLS certificate verification (lab devices only)
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "QOSC_TIMEOUT", value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse and validate a policy file
    Validate {
        /// Policy document (YAML)
        file: PathBuf,
    },

    /// Show the commands a policy compiles to
    Preview {
        /// Policy document (YAML)
        file: PathBuf,
    },

    /// Validate a policy and push its commands to the switch
    Apply {
        /// Policy document (YAML)
        file: PathBuf,

        /// Build the batch without sending it
        #[arg(long, env = "QOSC_DRY_RUN", value_parser = BoolishValueParser::new())]
        dry_run: bool,
    },

    /// Test connectivity to the switch
    Check,

    /// Print the switch running configuration
    ShowConfig {
        /// Limit output to a section, e.g. `ipqos`
        #[arg(long)]
        section: Option<String>,
    },

    /// Report which snippets are present in the running configuration
    Verify {
        #[arg(required = true, value_name = "PATTERN")]
        patterns: Vec<String>,
    },
}
