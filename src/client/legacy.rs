use super::{Generation, GenerationEndpoint, Transport};
use crate::{
    catalog::{EndpointSpec, ResponseShape},
    error::{PixelLabError, Result},
    normalize::normalize,
    payload::RequestPayload,
};
use async_trait::async_trait;
use serde_json::Value;

/// `/v1` endpoints: one image, a frame list, or skeleton keypoints per call.
#[derive(Debug, Clone, Copy)]
pub struct LegacyEndpoint {
    spec: &'static EndpointSpec,
}

impl LegacyEndpoint {
    pub fn new(spec: &'static EndpointSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl GenerationEndpoint for LegacyEndpoint {
    fn spec(&self) -> &'static EndpointSpec {
        self.spec
    }

    async fn generate(&self, transport: &Transport, payload: &RequestPayload) -> Result<Generation> {
        log::info!("Running {}", self.spec.name);
        let raw = transport.send(self.spec, payload).await?;
        let normalized = normalize(self.spec, &raw)?;

        if self.spec.response == ResponseShape::SingleImage && normalized.assets.len() != 1 {
            return Err(PixelLabError::DecodeError(format!(
                "expected one image, got {}",
                normalized.assets.len()
            )));
        }

        Ok(Generation {
            assets: normalized.assets,
            usage: normalized.usage,
            keypoints: normalized.keypoints.map(Value::Array),
            total_variations: None,
        })
    }
}
