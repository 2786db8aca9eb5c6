use crate::errors::{PricerResult, PricingError};
use crate::models::MAX_SIMULATIONS;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub static_dir: PathBuf,
    pub max_simulations: u64,
    pub pricer_seed: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> PricerResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| PricingError::Config(format!("SERVER_PORT: {e}")))?;

        let max_simulations = env_var_or("MAX_SIMULATIONS", "10000000")
            .parse::<u64>()
            .map_err(|e| PricingError::Config(format!("MAX_SIMULATIONS: {e}")))?;

        if max_simulations == 0 || max_simulations > MAX_SIMULATIONS {
            return Err(PricingError::Config(format!(
                "MAX_SIMULATIONS must be in 1..={MAX_SIMULATIONS}, got {max_simulations}"
            )));
        }

        let pricer_seed = match std::env::var("PRICER_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|e| PricingError::Config(format!("PRICER_SEED: {e}")))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            server_port,
            static_dir: PathBuf::from(env_var_or("STATIC_DIR", "static")),
            max_simulations,
            pricer_seed,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 5000,
            static_dir: PathBuf::from("static"),
            max_simulations: 10_000_000,
            pricer_seed: None,
        }
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
