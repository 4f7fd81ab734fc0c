use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    pub host: String,
    pub port: u16,

    // Address the admin-channel subscription alerts go to
    pub admin_email: String,

    // SMTP transport; when host is unset outgoing mail is logged and skipped
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_from: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<Secret<String>>,

    // Daily schedule for the maintenance sweeps (6-field cron, with seconds)
    pub cron_schedule: String,

    // Exposes the manual /test/cron/* trigger routes
    pub enable_test_routes: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: config.get("database_url")?,
            base_url: config.get("base_url")?,
            host: config
                .get("host")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            admin_email: config.get("admin_email")?,

            smtp_host: config.get("smtp_host").ok(),
            smtp_port: config.get("smtp_port").unwrap_or(587),
            smtp_from: config
                .get("smtp_from")
                .unwrap_or_else(|_| "noreply@souk.local".to_string()),
            smtp_user: config.get("smtp_user").ok(),
            smtp_password: config.get::<String>("smtp_password").ok().map(Secret::new),

            cron_schedule: config
                .get("cron_schedule")
                .unwrap_or_else(|_| "0 0 3 * * *".to_string()),

            enable_test_routes: config.get("enable_test_routes").unwrap_or(false),
        })
    }
}
