//! Runs one parsed invocation end to end and always produces a report.

use crate::catalog::{OutputMode, ResponseShape};
use crate::cli::ParsedInvocation;
use crate::client::PixelLabClient;
use crate::config::PixelLabConfig;
use crate::error::{PixelLabError, Result};
use crate::models::{InvocationResult, UsageReport};
use crate::output::{self, OutputTarget};
use crate::payload;
use serde_json::Value;
use std::path::Path;

pub async fn run(config: &PixelLabConfig, invocation: &ParsedInvocation) -> InvocationResult {
    match execute(config, invocation).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("{} failed: {}", invocation.endpoint.name, e);
            InvocationResult::failure(&e, Vec::new())
        }
    }
}

async fn execute(config: &PixelLabConfig, invocation: &ParsedInvocation) -> Result<InvocationResult> {
    let spec = invocation.endpoint;
    log::debug!("Invocation {} for {}", crate::logger::request_id(), spec.name);

    // credential first, so a missing key never reaches the network
    let client = PixelLabClient::new(config)?;
    let request = payload::build(spec, &invocation.raw)?;

    if spec.response == ResponseShape::Balance {
        let balance = client.account().balance().await?;
        return Ok(InvocationResult::success(Vec::new(), &UsageReport::default())
            .with_balance(balance.usd));
    }

    let generation = client.generate(spec, &request).await?;

    let result = match spec.output {
        OutputMode::Keypoints => {
            let keypoints = generation
                .keypoints
                .clone()
                .unwrap_or_else(|| Value::Array(Vec::new()));
            output::write_keypoints(&keypoints, invocation.output.as_deref().map(Path::new))
        }
        mode => {
            let target = OutputTarget::for_mode(mode, invocation.output.as_deref())
                .ok_or_else(|| {
                    PixelLabError::DecodeError(format!("{} does not produce images", spec.name))
                })?;
            output::write(
                &generation.assets,
                invocation.selection,
                &target,
                invocation.spritesheet,
            )
        }
    };

    let mut result = result.with_usage(&generation.usage);
    if let Some(total) = generation.total_variations {
        result = result.with_total_variations(total);
    }
    Ok(result)
}
