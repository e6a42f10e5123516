use coachline_core::{FarePolicy, LayoutPolicy, RefundPolicy};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;

/// Business policy for the reservation engine. Every field falls back to the
/// reference constants, so an empty configuration is a valid one.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub fares: FarePolicy,
    #[serde(default)]
    pub layout: LayoutPolicy,
    #[serde(default)]
    pub refunds: RefundPolicy,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(File::with_name("config/local").required(false))
            // e.g. COACHLINE_FARES__FLEXI_FEE=60
            .add_source(
                Environment::with_prefix("COACHLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = Self::build(builder)?;
        tracing::info!(%run_mode, ?config, "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        Self::build(
            config::Config::builder().add_source(File::from_str(document, FileFormat::Toml)),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fares
            .validate()
            .and_then(|_| self.layout.validate())
            .and_then(|_| self.refunds.validate())
            .map_err(|e| ConfigError::Message(e.to_string()))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_reference_policy() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fares.flexi_fee, 50);
        assert_eq!(config.fares.resell_processing_fee, 75);
        assert_eq!(config.layout.seats_per_deck, 18);
        assert_eq!(config.refunds.unsold_refund_percent, 50);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
            [fares]
            flexi_fee = 60

            [refunds]
            unsold_refund_percent = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.fares.flexi_fee, 60);
        assert_eq!(config.fares.max_seats_per_booking, 6);
        assert_eq!(config.refunds.unsold_refund_percent, 40);
        assert_eq!(config.refunds.resold_refund_percent, 100);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let err = Config::from_toml_str("[layout]\nseats_per_row = 4\n").unwrap_err();
        assert!(err.to_string().contains("seats_per_row"));

        let err = Config::from_toml_str("[refunds]\nresold_refund_percent = 120\n").unwrap_err();
        assert!(err.to_string().contains("resold_refund_percent"));
    }

    #[test]
    fn test_shipped_default_file_matches_reference() {
        let shipped = include_str!("../../config/default.toml");
        assert_eq!(Config::from_toml_str(shipped).unwrap(), Config::default());
    }

    #[test]
    fn test_environment_override() {
        env::set_var("COACHLINE_FARES__RESELL_PROCESSING_FEE", "90");
        let config = Config::load();
        env::remove_var("COACHLINE_FARES__RESELL_PROCESSING_FEE");

        let config = config.unwrap();
        assert_eq!(config.fares.resell_processing_fee, 90);
        assert_eq!(config.fares.flexi_fee, 50);
    }
}
