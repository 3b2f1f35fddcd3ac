pub mod account;
pub mod legacy;
pub mod transport;
pub mod variations;

use crate::{
    catalog::{ApiGeneration, EndpointSpec},
    config::PixelLabConfig,
    error::Result,
    models::{ImageAsset, UsageReport},
    payload::RequestPayload,
};
use async_trait::async_trait;
use serde_json::Value;

pub use account::{AccountClient, Balance};
pub use legacy::LegacyEndpoint;
pub use transport::Transport;
pub use variations::VariationEndpoint;

/// What a generation call produced, before anything touches the disk.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub assets: Vec<ImageAsset>,
    pub usage: UsageReport,
    pub keypoints: Option<Value>,
    pub total_variations: Option<usize>,
}

/// One family of generation endpoints.
#[async_trait]
pub trait GenerationEndpoint: Send + Sync {
    fn spec(&self) -> &'static EndpointSpec;

    async fn generate(&self, transport: &Transport, payload: &RequestPayload) -> Result<Generation>;
}

#[derive(Clone)]
pub struct PixelLabClient {
    transport: Transport,
    account: AccountClient,
}

impl PixelLabClient {
    /// Fails with a configuration error when no credential is set; nothing is sent.
    pub fn new(config: &PixelLabConfig) -> Result<Self> {
        let transport = Transport::new(config)?;
        Ok(Self {
            account: AccountClient::new(transport.clone()),
            transport,
        })
    }

    pub fn account(&self) -> &AccountClient {
        &self.account
    }

    pub fn endpoint(&self, spec: &'static EndpointSpec) -> Box<dyn GenerationEndpoint> {
        match spec.generation {
            ApiGeneration::Legacy => Box::new(LegacyEndpoint::new(spec)),
            ApiGeneration::Variations => Box::new(VariationEndpoint::new(spec)),
        }
    }

    pub async fn generate(
        &self,
        spec: &'static EndpointSpec,
        payload: &RequestPayload,
    ) -> Result<Generation> {
        self.endpoint(spec).generate(&self.transport, payload).await
    }
}
