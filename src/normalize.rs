//! Extracts images, keypoints and usage from the different response shapes.

use crate::catalog::{EndpointSpec, ResponseShape};
use crate::error::{PixelLabError, Result};
use crate::models::{Direction, ImageAsset, UsageReport};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct NormalizedResponse {
    pub assets: Vec<ImageAsset>,
    pub usage: UsageReport,
    pub keypoints: Option<Vec<Value>>,
    pub balance_usd: Option<f64>,
}

pub fn normalize(spec: &EndpointSpec, raw: &Value) -> Result<NormalizedResponse> {
    let obj = raw
        .as_object()
        .ok_or_else(|| PixelLabError::DecodeError("response is not a JSON object".into()))?;
    let usage = UsageReport::new(obj.get("usage").cloned());

    let mut normalized = NormalizedResponse {
        assets: Vec::new(),
        usage,
        keypoints: None,
        balance_usd: None,
    };

    match spec.response {
        ResponseShape::Balance => {
            let usd = obj.get("usd").and_then(Value::as_f64).unwrap_or_else(|| {
                log::warn!("Balance response has no usd field");
                0.0
            });
            normalized.balance_usd = Some(usd);
        }
        ResponseShape::Keypoints => {
            let keypoints = match obj.get("keypoints") {
                Some(Value::Array(points)) => points.clone(),
                Some(other) => {
                    return Err(PixelLabError::DecodeError(format!(
                        "keypoints should be an array, got {}",
                        type_name(other)
                    )))
                }
                None => Vec::new(),
            };
            normalized.keypoints = Some(keypoints);
        }
        ResponseShape::SingleImage | ResponseShape::ImageList | ResponseShape::DirectionMap => {
            normalized.assets = extract_images(obj)?;
            if spec.response == ResponseShape::DirectionMap
                && normalized.assets.iter().any(|a| a.label.is_none())
            {
                return Err(PixelLabError::DecodeError(
                    "expected images keyed by direction".into(),
                ));
            }
        }
    }

    Ok(normalized)
}

fn extract_images(obj: &Map<String, Value>) -> Result<Vec<ImageAsset>> {
    if let Some(image) = obj.get("image") {
        return Ok(vec![decode_image_value(image, "image")?]);
    }
    let images = obj
        .get("images")
        .or_else(|| obj.get("rotations"))
        .ok_or_else(|| PixelLabError::DecodeError("response contains no image".into()))?;

    let assets = match images {
        Value::Array(list) => list
            .iter()
            .enumerate()
            .map(|(i, v)| decode_image_value(v, &format!("images[{}]", i)))
            .collect::<Result<Vec<_>>>()?,
        Value::Object(map) => decode_direction_map(map)?,
        other => {
            return Err(PixelLabError::DecodeError(format!(
                "images should be a list or a direction map, got {}",
                type_name(other)
            )))
        }
    };

    if assets.is_empty() {
        return Err(PixelLabError::DecodeError("response contains no image".into()));
    }
    Ok(assets)
}

/// Reorders a direction-keyed map into the canonical rotation order.
fn decode_direction_map(map: &Map<String, Value>) -> Result<Vec<ImageAsset>> {
    let mut slots: [Option<&Value>; 8] = [None; 8];
    for (key, value) in map {
        let direction = Direction::parse(key).ok_or_else(|| {
            PixelLabError::DecodeError(format!("unexpected direction '{}' in response", key))
        })?;
        let idx = Direction::CANONICAL_ORDER
            .iter()
            .position(|d| *d == direction)
            .unwrap_or_default();
        if slots[idx].replace(value).is_some() {
            return Err(PixelLabError::DecodeError(format!(
                "direction '{}' appears twice in response",
                direction.as_str()
            )));
        }
    }

    Direction::CANONICAL_ORDER
        .iter()
        .zip(slots.iter())
        .map(|(direction, slot)| {
            let value = slot.ok_or_else(|| {
                PixelLabError::DecodeError(format!(
                    "response is missing the {} direction",
                    direction.as_str()
                ))
            })?;
            Ok(decode_image_value(value, direction.as_str())?.with_label(direction.as_str()))
        })
        .collect()
}

fn decode_image_value(value: &Value, what: &str) -> Result<ImageAsset> {
    let encoded = match value {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("base64").and_then(Value::as_str).ok_or_else(|| {
            PixelLabError::DecodeError(format!("{} has no base64 field", what))
        })?,
        other => {
            return Err(PixelLabError::DecodeError(format!(
                "{} should be an image object, got {}",
                what,
                type_name(other)
            )))
        }
    };
    ImageAsset::from_base64(encoded)
        .map_err(|e| PixelLabError::DecodeError(format!("{}: {}", what, strip_prefix(&e))))
}

fn strip_prefix(err: &PixelLabError) -> String {
    match err {
        PixelLabError::DecodeError(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
