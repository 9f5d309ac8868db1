use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use clap::Parser;
use std::fs;
use tracing::{info, warn};
use toml;

/// Configuration for the Stargazer application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// TCP port the API server listens on
    pub port: u16,
    /// Public base URL of this deployment, used in signed storage URLs
    /// and sandbox checkout links
    pub public_base_url: String,
    /// Shared secret for verifying payment-processor webhooks
    pub webhook_secret: String,
    /// Secret for signing expiring object-storage URLs
    pub storage_secret: String,
    /// Base URL of the payment processor's API, if one is configured
    pub payment_provider_url: Option<String>,
    /// Bearer secret for the payment processor's API
    pub payment_provider_secret: Option<String>,
    /// URL notifications are POSTed to (mail bridge), if configured
    pub notify_url: Option<String>,
    /// How long login sessions stay valid, in hours
    pub session_ttl_hours: u64,
    /// How often expired sessions are swept, in minutes
    pub session_sweep_interval_minutes: u64,
    /// How long signed upload/download URLs stay valid, in minutes
    pub upload_url_ttl_minutes: u64,
    /// Star-party registration prices
    pub pricing: PricingConfig,
}

/// Prices used by the registration calculator, all in integer cents
///
/// Every field has a standalone default so a config file can override
/// just the prices that changed for the year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Base registration fee, charged once per registration
    pub base_fee_cents: i64,
    /// Fee for each adult beyond the first
    pub extra_adult_cents: i64,
    /// Fee per child
    pub child_cents: i64,
    /// Camping fee per adult per night
    pub nightly_camping_cents: i64,
    /// Meal plan fee per person (adults and children)
    pub meal_plan_cents: i64,
    /// Surcharge when the registrant's membership has lapsed
    pub non_member_surcharge_cents: i64,
    /// Discount for registering before the event's early-bird deadline
    pub early_bird_discount_cents: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fee_cents: 5_000,
            extra_adult_cents: 2_500,
            child_cents: 1_000,
            nightly_camping_cents: 1_500,
            meal_plan_cents: 4_500,
            non_member_surcharge_cents: 2_000,
            early_bird_discount_cents: 1_000,
        }
    }
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    /// Optional update for database URL
    #[serde(default)]
    pub database_url: Option<String>,
    /// Optional update for the listen port
    #[serde(default)]
    pub port: Option<u16>,
    /// Optional update for the public base URL
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Optional update for the webhook secret
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Optional update for the storage-URL secret
    #[serde(default)]
    pub storage_secret: Option<String>,
    /// Optional update for the payment processor URL
    #[serde(default)]
    pub payment_provider_url: Option<String>,
    /// Optional update for the payment processor secret
    #[serde(default)]
    pub payment_provider_secret: Option<String>,
    /// Optional update for the notification URL
    #[serde(default)]
    pub notify_url: Option<String>,
    /// Optional update for the session lifetime
    #[serde(default)]
    pub session_ttl_hours: Option<u64>,
    /// Optional update for the session sweep interval
    #[serde(default)]
    pub session_sweep_interval_minutes: Option<u64>,
    /// Optional update for the signed-URL lifetime
    #[serde(default)]
    pub upload_url_ttl_minutes: Option<u64>,
    /// Optional replacement pricing table
    #[serde(default)]
    pub pricing: Option<PricingConfig>,
}

/// Command line arguments for the application
#[derive(Parser, Debug)]
#[clap(name = "stargazer", about = "Membership club web backend")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// TCP port to listen on
    #[clap(long, env = "STARGAZER_PORT")]
    pub port: Option<u16>,

    /// Public base URL of this deployment
    #[clap(long, env = "STARGAZER_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Shared secret for payment-processor webhooks
    #[clap(long, env = "STARGAZER_WEBHOOK_SECRET")]
    pub webhook_secret: Option<String>,

    /// Secret for signing object-storage URLs
    #[clap(long, env = "STARGAZER_STORAGE_SECRET")]
    pub storage_secret: Option<String>,

    /// Base URL of the payment processor's API
    #[clap(long, env = "STARGAZER_PAYMENT_PROVIDER_URL")]
    pub payment_provider_url: Option<String>,

    /// Bearer secret for the payment processor's API
    #[clap(long, env = "STARGAZER_PAYMENT_PROVIDER_SECRET")]
    pub payment_provider_secret: Option<String>,

    /// URL notifications are POSTed to
    #[clap(long, env = "STARGAZER_NOTIFY_URL")]
    pub notify_url: Option<String>,

    /// Session lifetime in hours
    #[clap(long, env = "STARGAZER_SESSION_TTL_HOURS")]
    pub session_ttl_hours: Option<u64>,

    /// Debug mode
    #[clap(long, env = "STARGAZER_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            port: update.port.unwrap_or(self.port),
            public_base_url: update.public_base_url.unwrap_or(self.public_base_url),
            webhook_secret: update.webhook_secret.unwrap_or(self.webhook_secret),
            storage_secret: update.storage_secret.unwrap_or(self.storage_secret),
            payment_provider_url: update.payment_provider_url.or(self.payment_provider_url),
            payment_provider_secret: update
                .payment_provider_secret
                .or(self.payment_provider_secret),
            notify_url: update.notify_url.or(self.notify_url),
            session_ttl_hours: update.session_ttl_hours.unwrap_or(self.session_ttl_hours),
            session_sweep_interval_minutes: update
                .session_sweep_interval_minutes
                .unwrap_or(self.session_sweep_interval_minutes),
            upload_url_ttl_minutes: update
                .upload_url_ttl_minutes
                .unwrap_or(self.upload_url_ttl_minutes),
            pricing: update.pricing.unwrap_or(self.pricing),
        }
    }

    /// Returns the session lifetime as a chrono TimeDelta
    pub fn session_ttl(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::hours(self.session_ttl_hours as i64)
    }

    /// Returns the session sweep interval as a Duration
    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_minutes * 60)
    }

    /// Returns the signed-URL lifetime as a chrono TimeDelta
    pub fn upload_url_ttl(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::minutes(self.upload_url_ttl_minutes as i64)
    }
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {

    let database_url = config_path.map_or("stargazer.db".to_string(), |path| path.join("stargazer.db").to_string_lossy().to_string());

    Config {
        database_url,
        port: 3000,
        public_base_url: "http://localhost:3000".to_string(),
        webhook_secret: "change-me".to_string(),
        storage_secret: "change-me".to_string(),
        payment_provider_url: None,
        payment_provider_secret: None,
        notify_url: None,
        session_ttl_hours: 720,
        session_sweep_interval_minutes: 60,
        upload_url_ttl_minutes: 15,
        pricing: PricingConfig::default(),
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    // if the config path is None, return the default config
    if config_path.is_none() {
            return Ok(ConfigUpdate::default());
        }

    let config_path = config_path.unwrap();

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            },
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        port: args.port,
        public_base_url: args.public_base_url,
        webhook_secret: args.webhook_secret,
        storage_secret: args.storage_secret,
        payment_provider_url: args.payment_provider_url,
        payment_provider_secret: args.payment_provider_secret,
        notify_url: args.notify_url,
        session_ttl_hours: args.session_ttl_hours,
        session_sweep_interval_minutes: None,
        upload_url_ttl_minutes: None,
        pricing: None,
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let mut config_path = match ProjectDirs::from("org", "stargazer", "stargazer") {
        Some(proj_dirs) => {
            let config_dir = proj_dirs.config_dir();
            let path = PathBuf::from(config_dir);
            Some(path)
        }
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    };

    config_path = config_path.and_then(|path| {
        if !path.exists() {
            info!("Config path not found at {:?}, using defaults", path);
            None
        } else {
            Some(path)
        }
    });

    let base = base_config(config_path.clone());

    // Apply updates in order of increasing precedence
    let config = base
        .apply_update(config_from_file(config_path.map(|path| path.join("config.toml"))).unwrap_or_default())
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, port={}, public_base_url={}",
        config.database_url, config.port, config.public_base_url
    );

    config
}
