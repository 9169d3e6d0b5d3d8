//! Command line and environment configuration for the server.

use std::path::PathBuf;

use clap::Parser;

/// A web app for tracking personal and business finances.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    pub db_path: PathBuf,

    /// The port to serve the app from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// The address to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// The secret used to sign session tokens.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub secret: String,

    /// The directory uploaded attachments are saved to.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    pub timezone: String,

    /// Allow the session cookie to be sent over plain HTTP, e.g. for local development.
    #[arg(long, env = "INSECURE_COOKIES")]
    pub insecure_cookies: bool,

    /// File path to write debug logs to.
    #[arg(long, env = "LOG_PATH", default_value = "debug.log")]
    pub log_path: PathBuf,
}
