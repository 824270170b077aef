use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelConfig {
    pub cooldown: CooldownConfig,
}

/// Grace windows between logical deactivation and physical reclamation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    pub after_delete_days: u64,
    pub after_unused_days: u64,
}

impl Default for HotelConfig {
    fn default() -> Self {
        Self {
            cooldown: CooldownConfig::default(),
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            after_delete_days: 30,
            after_unused_days: 180,
        }
    }
}

impl HotelConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        // Pick up a .env file if one is present
        dotenvy::dotenv().ok();

        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&HotelConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Add environment variables with prefix "SCHEMA_HOTEL_"
        config = config.add_source(
            config::Environment::with_prefix("SCHEMA_HOTEL")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let hotel_config: HotelConfig = config.try_deserialize()?;

        Ok(hotel_config)
    }

    /// Cooldown applied when a deactivation request does not name one.
    pub fn delete_cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown.after_delete_days * 24 * 60 * 60)
    }

    pub fn unused_cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown.after_unused_days * 24 * 60 * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_month_long_delete_cooldown() {
        let config = HotelConfig::default();
        assert_eq!(config.delete_cooldown(), Duration::from_secs(30 * 86400));
        assert_eq!(config.unused_cooldown(), Duration::from_secs(180 * 86400));
    }
}
