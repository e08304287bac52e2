use clap::{Parser, Subcommand};

// ============================================
// Environment variable name constants
// ============================================
pub mod env {
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const HEALTH_PORT: &str = "HEALTH_PORT";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const STORAGE_PATH: &str = "STORAGE_PATH";
    pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
}

const DB_FILE_NAME: &str = "cve-manager.db";

/// Build metadata emitted by `build.rs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_date: &'static str,
    pub rustc: &'static str,
    pub channel: &'static str,
    pub target: &'static str,
}

impl BuildInfo {
    pub const CURRENT: BuildInfo = BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_date: env!("VERGEN_BUILD_TIMESTAMP"),
        rustc: env!("VERGEN_RUSTC_SEMVER"),
        channel: env!("VERGEN_RUSTC_CHANNEL"),
        target: env!("VERGEN_CARGO_TARGET_TRIPLE"),
    };
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cve-manager {} (built {}, rustc {} {}, {})",
            self.version, self.build_date, self.rustc, self.channel, self.target
        )
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show version information
    Version,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cve-manager",
    version,
    about = "CVE exposure API for managed clusters",
    long_about = "Serves the CVEs affecting an account's clusters and images, with composable filtering, sorting and paging."
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log format: json or pretty
    #[arg(long, env = env::LOG_FORMAT, default_value = "json")]
    pub log_format: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = env::LOG_LEVEL, default_value = "info")]
    pub log_level: String,

    /// Health check server port
    #[arg(long, env = env::HEALTH_PORT, default_value = "8080")]
    pub health_port: u16,

    /// API server port
    #[arg(long, env = env::SERVER_PORT, default_value = "3000")]
    pub server_port: u16,

    /// Storage path for the SQLite database
    #[arg(long, env = env::STORAGE_PATH, default_value = "/data")]
    pub storage_path: String,

    /// Maximum number of pooled database connections
    #[arg(long, env = env::DB_MAX_CONNECTIONS, default_value = "5")]
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_args() -> Self {
        Config::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server_port == self.health_port {
            return Err(format!(
                "{} and {} must differ (both are {})",
                env::SERVER_PORT,
                env::HEALTH_PORT,
                self.server_port
            ));
        }
        if self.db_max_connections == 0 {
            return Err(format!("{} must be at least 1", env::DB_MAX_CONNECTIONS));
        }
        Ok(())
    }

    /// Get SQLite database path
    pub fn get_db_path(&self) -> String {
        format!("{}/{}", self.storage_path.trim_end_matches('/'), DB_FILE_NAME)
    }
}
