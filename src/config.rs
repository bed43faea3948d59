//! Constants and environment-driven settings.

use std::env;

/// log4rs configuration file read at startup.
pub const LOG_CONFIG_FILE: &str = "log4rs.yml";

/// Subnets per zone: one public, one private.
pub const ROLES_PER_ZONE: u32 = 2;

/// Address space multiplier kept in reserve; 2 leaves half the VPC unallocated.
pub const SUBNET_HEADROOM_FACTOR: u32 = 2;

/// Default Docker bridge network on container hosts.
pub const DOCKER_BRIDGE_CIDR: &str = "172.17.0.0/16";

/// Prefix of the dated JSON files holding cached VPC facts.
pub const CACHE_FILE_PREFIX: &str = "vpc_facts_cache";

/// Cap on a single cloud CLI response.
pub const MAX_COMMAND_OUTPUT: usize = 5_000_000;

/// Runtime settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Path or name of the `aws` executable.
    pub aws_cli: String,
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            aws_cli: "aws".to_string(),
            region: None,
            profile: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Settings {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Settings {
            aws_cli: get("VPC_PLANNER_AWS_CLI").unwrap_or_else(|| "aws".to_string()),
            region: get("AWS_REGION").or_else(|| get("AWS_DEFAULT_REGION")),
            profile: get("AWS_PROFILE"),
        }
    }

    /// Override the region, e.g. from a command line flag.
    pub fn with_region(mut self, region: Option<String>) -> Settings {
        if region.is_some() {
            self.region = region;
        }
        self
    }
}
