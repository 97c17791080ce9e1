use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    /// Cadence of the menu-window rollover check, in seconds.
    pub rollover_tick_secs: u64,
    /// Cadence of the roster sweep that drops votes of unenrolled students.
    pub roster_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            jwt_secret: required("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            rollover_tick_secs: env::var("ROLLOVER_TICK_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()?,
            roster_sweep_secs: env::var("ROSTER_SWEEP_SECS")
                .unwrap_or_else(|_| "900".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
