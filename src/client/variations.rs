use super::{Generation, GenerationEndpoint, Transport};
use crate::{
    catalog::EndpointSpec,
    error::Result,
    normalize::normalize,
    payload::RequestPayload,
};
use async_trait::async_trait;

/// `/v2` endpoints. These may return several candidates per call and report
/// usage either in USD or in credits.
#[derive(Debug, Clone, Copy)]
pub struct VariationEndpoint {
    spec: &'static EndpointSpec,
}

impl VariationEndpoint {
    pub fn new(spec: &'static EndpointSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl GenerationEndpoint for VariationEndpoint {
    fn spec(&self) -> &'static EndpointSpec {
        self.spec
    }

    async fn generate(&self, transport: &Transport, payload: &RequestPayload) -> Result<Generation> {
        log::info!("Running {}", self.spec.name);
        let raw = transport.send(self.spec, payload).await?;
        let normalized = normalize(self.spec, &raw)?;
        let total = normalized.assets.len();

        if let Some(usage) = normalized.usage.raw() {
            log::debug!("{} usage: {}", self.spec.name, usage);
        }
        log::info!("{} returned {} images", self.spec.name, total);

        Ok(Generation {
            assets: normalized.assets,
            usage: normalized.usage,
            keypoints: None,
            total_variations: Some(total),
        })
    }
}
