use clap::Parser;

/// Default connection string when neither the flag nor `DATABASE_URL` is set.
pub const DATABASE_URL_DEFAULT: &str = "sqlite://reviews.db";

pub const HOST_DEFAULT: &str = "0.0.0.0";

pub const PORT_DEFAULT: u16 = 8000;

/// Review record service
#[derive(Parser, Debug, Clone)]
#[command(name = "reviewstore")]
#[command(about = "CRUD service for movie reviews backed by SQLite")]
#[command(version)]
pub struct Config {
    /// Storage connection string (`sqlite://<path>` or `sqlite::memory:`)
    #[arg(long, env = "DATABASE_URL", default_value = DATABASE_URL_DEFAULT)]
    pub database_url: String,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = HOST_DEFAULT)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = PORT_DEFAULT)]
    pub port: u16,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
