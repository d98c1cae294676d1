use crate::{
    config::GatewayConfig,
    error::Result,
    model::{AlertFeature, Coordinate, ForecastPeriod, StateCode},
    provider::nws::NwsProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod nws;

/// Upstream lookups. Inputs are already validated; implementations do not re-check them.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Active alerts for a state, in upstream order. A state with none yields an empty list.
    async fn active_alerts(&self, state: &StateCode) -> Result<Vec<AlertFeature>>;

    /// Forecast periods for a point, in upstream order.
    async fn forecast(&self, at: Coordinate) -> Result<Vec<ForecastPeriod>>;
}

/// Construct the NWS-backed provider from gateway settings.
pub fn provider_from_config(config: &GatewayConfig) -> anyhow::Result<Box<dyn WeatherProvider>> {
    Ok(Box::new(NwsProvider::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_default_config_builds() {
        assert!(provider_from_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn provider_from_config_rejects_bad_base_url() {
        let cfg = GatewayConfig { base_url: "not a url".into(), ..GatewayConfig::default() };
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid upstream base URL"));
    }
}
