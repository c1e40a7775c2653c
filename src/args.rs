use std::net::IpAddr;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[clap(version, about)]
pub struct CourseManagerArgs {
    #[clap(flatten)]
    pub server: ServerArgs,

    /// Emit logs as JSON lines
    #[clap(long, env = "COURSE_MANAGER_LOG_JSON", global = true)]
    pub log_json: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, Args)]
pub struct ServerArgs {
    /// Database URL
    #[clap(
        long,
        env = "COURSE_MANAGER_DATABASE_URL",
        default_value = "sqlite:course_manager.db?mode=rwc",
        global = true
    )]
    pub database_url: String,

    /// Address to listen on
    #[clap(long, env = "COURSE_MANAGER_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port
    #[clap(long, env = "COURSE_MANAGER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Mark session cookies as `Secure`
    #[clap(long, env = "COURSE_MANAGER_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Days of inactivity before a session expires
    #[clap(long, env = "COURSE_MANAGER_SESSION_DAYS", default_value_t = 7)]
    pub session_days: i64,

    /// Minimum password length on registration
    #[clap(long, env = "COURSE_MANAGER_PASSWORD_MIN_LENGTH", default_value_t = 8)]
    pub password_min_length: usize,
}

impl ServerArgs {
    /// Defaults for an in-process server, used by tests.
    #[must_use]
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            secure_cookies: false,
            session_days: 7,
            password_min_length: 8,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create an administrator account
    CreateSuperuser {
        #[clap(long)]
        email: String,

        #[clap(long)]
        username: String,

        #[clap(long, env = "COURSE_MANAGER_SUPERUSER_PASSWORD")]
        password: String,
    },
}
