use crate::{
    Config,
    provider::{counter::CounterIdProvider, http::HttpIdProvider},
};
use async_trait::async_trait;
use std::{fmt::Debug, str::FromStr};

pub mod counter;
pub mod http;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Http,
    Counter,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Http => "http",
            ProviderId::Counter => "counter",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Http, ProviderId::Counter]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one parser for provider names, shared by config and command line.
impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ProviderId::all()
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                let supported: Vec<_> = ProviderId::all().iter().map(ProviderId::as_str).collect();
                anyhow::anyhow!(
                    "Unknown provider '{value}'. Supported providers: {}.",
                    supported.join(", ")
                )
            })
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Source of the numeric id that seeds a trip's forecast.
#[async_trait]
pub trait IdProvider: Send + Sync + Debug {
    /// Request a fresh id for `destination`. `nonce` makes each call distinct.
    async fn request_id(&self, destination: &str, nonce: u64) -> anyhow::Result<u64>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(id: ProviderId, config: &Config) -> anyhow::Result<Box<dyn IdProvider>> {
    let boxed: Box<dyn IdProvider> = match id {
        ProviderId::Http => {
            Box::new(HttpIdProvider::new(config.endpoint(), config.request_timeout())?)
        }
        ProviderId::Counter => Box::new(CounterIdProvider::from_clock()),
    };

    Ok(boxed)
}

/// Construct the provider selected in config (HTTP when unset).
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn IdProvider>> {
    let id = config.provider_id()?;
    provider_from_config(id, config)
}
