//! Server configuration

/// Runtime configuration, loaded from the environment with defaults
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub environment: String,

    /// ISO currency code sent to the gateway
    pub currency: String,
    /// Seconds a pending_payment order may live before the sweep cancels it
    pub payment_timeout_secs: u64,
    /// Seconds between sweep passes
    pub sweep_interval_secs: u64,

    // Gateway
    pub gateway_base_url: String,
    pub gateway_secret_key: String,
    /// Frontend base for success/cancel redirect targets
    pub frontend_url: String,

    // Card vault collaborator
    pub vault_base_url: String,

    // Auth
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/storefront".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),
            payment_timeout_secs: std::env::var("PAYMENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1800),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),

            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://gateway.example.com".into()),
            gateway_secret_key: std::env::var("GATEWAY_SECRET_KEY").unwrap_or_default(),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),

            vault_base_url: std::env::var("VAULT_BASE_URL")
                .unwrap_or_else(|_| "https://vault.example.com".into()),

            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-only-jwt-secret".into()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn db_path(&self) -> String {
        format!("{}/store.redb", self.work_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
