//! Turns raw CLI values into the JSON body of one endpoint call.
//!
//! Everything that can be checked locally is checked here, so an invalid
//! invocation fails before any request is made. Files named by image and
//! keypoint parameters are read only after every cheap check has passed.

use crate::catalog::{
    ConditionalGroup, EndpointSpec, KeypointShape, MethodOption, ParamKind, ParamSpec, SizeRule,
};
use crate::error::{PixelLabError, Result};
use crate::models::{Base64Image, ImageSize, KeypointFile, SKELETON_LABELS};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A value exactly as it came off the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Flag,
    Text(String),
    List(Vec<String>),
}

/// Raw arguments keyed by parameter name (`snake_case`).
pub type RawArgs = BTreeMap<String, RawValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct RequestPayload {
    body: Map<String, Value>,
    method: Option<MethodOption>,
}

impl RequestPayload {
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// The discriminator arm selected for this request, if the endpoint has one.
    pub fn method(&self) -> Option<&MethodOption> {
        self.method.as_ref()
    }
}

pub fn build(spec: &EndpointSpec, raw: &RawArgs) -> Result<RequestPayload> {
    for name in raw.keys() {
        if spec.param(name).is_none() {
            return Err(PixelLabError::validation(
                name.as_str(),
                format!("not accepted by {}", spec.name),
            ));
        }
    }

    for param in &spec.params {
        if param.required && !is_size_param(spec, param) && !raw.contains_key(param.name) {
            return Err(PixelLabError::validation(param.name, "is required"));
        }
        if let Some(other) = param.only_with {
            if raw.contains_key(param.name) && !raw.contains_key(other) {
                return Err(PixelLabError::validation(
                    param.name,
                    format!("requires {}", other),
                ));
            }
        }
    }

    let method = check_groups(spec, raw)?;

    let mut body = Map::new();

    if let Some(size) = resolve_size(spec, raw)? {
        body.insert("image_size".to_string(), json!(size));
    }

    for param in &spec.params {
        if is_size_param(spec, param) {
            continue;
        }
        match raw.get(param.name) {
            Some(value) => {
                if let Some(coerced) = coerce_scalar(param, value)? {
                    body.insert(param.name.to_string(), coerced);
                }
            }
            None => {
                let enabled = param.only_with.map_or(true, |other| raw.contains_key(other));
                if let (Some(default), true) = (param.default, enabled) {
                    body.insert(param.name.to_string(), default.to_json());
                }
            }
        }
    }

    // Files are read last so bad flags never cost any I/O.
    for param in &spec.params {
        if let Some(value) = raw.get(param.name) {
            if let Some(loaded) = load_file_param(param, value)? {
                body.insert(param.name.to_string(), loaded);
            }
        }
    }

    log::debug!(
        "Built {} payload with fields: {:?}",
        spec.name,
        body.keys().collect::<Vec<_>>()
    );

    Ok(RequestPayload { body, method })
}

fn is_size_param(spec: &EndpointSpec, param: &ParamSpec) -> bool {
    spec.size != SizeRule::None && (param.name == "width" || param.name == "height")
}

fn check_groups(spec: &EndpointSpec, raw: &RawArgs) -> Result<Option<MethodOption>> {
    let mut selected = None;
    for group in &spec.groups {
        match group {
            ConditionalGroup::ExactlyOne {
                discriminator,
                options,
            } => {
                let method = match raw.get(*discriminator) {
                    Some(RawValue::Text(m)) => m.trim(),
                    _ => return Err(PixelLabError::validation(*discriminator, "is required")),
                };
                let chosen = options.iter().find(|o| o.method == method).ok_or_else(|| {
                    let allowed: Vec<_> = options.iter().map(|o| o.method).collect();
                    PixelLabError::validation(
                        *discriminator,
                        format!("'{}' is not one of: {}", method, allowed.join(", ")),
                    )
                })?;
                if !raw.contains_key(chosen.field) {
                    return Err(PixelLabError::validation(
                        chosen.field,
                        format!("is required when {} is {}", discriminator, chosen.method),
                    ));
                }
                if let Some(other) = options
                    .iter()
                    .find(|o| o.field != chosen.field && raw.contains_key(o.field))
                {
                    return Err(PixelLabError::validation(
                        other.field,
                        format!("cannot be used when {} is {}", discriminator, chosen.method),
                    ));
                }
                selected = Some(*chosen);
            }
            ConditionalGroup::AllOf { trigger, requires } => {
                if raw.contains_key(*trigger) {
                    if let Some(missing) = requires.iter().find(|r| !raw.contains_key(**r)) {
                        return Err(PixelLabError::validation(
                            *missing,
                            format!("is required when {} is given", trigger),
                        ));
                    }
                }
            }
        }
    }
    Ok(selected)
}

fn resolve_size(spec: &EndpointSpec, raw: &RawArgs) -> Result<Option<ImageSize>> {
    let (default_w, default_h) = match &spec.size {
        SizeRule::None => return Ok(None),
        SizeRule::Discrete(sizes) if sizes.len() == 1 => sizes[0],
        _ => (
            default_dimension(spec, "width"),
            default_dimension(spec, "height"),
        ),
    };
    let width = read_dimension(raw, "width")?.unwrap_or(default_w);
    let height = read_dimension(raw, "height")?.unwrap_or(default_h);
    let size = ImageSize::new(width, height);

    match &spec.size {
        SizeRule::None => {}
        SizeRule::PerAxis { min, max } => {
            for (field, value) in [("width", width), ("height", height)] {
                if value < *min {
                    return Err(PixelLabError::validation(
                        field,
                        format!("must be at least {}px (got {})", min, value),
                    ));
                }
                if value > *max {
                    return Err(PixelLabError::validation(
                        field,
                        format!("must be at most {}px (got {})", max, value),
                    ));
                }
            }
        }
        SizeRule::MaxArea { min_side, max_area } => {
            for (field, value) in [("width", width), ("height", height)] {
                if value < *min_side {
                    return Err(PixelLabError::validation(
                        field,
                        format!("must be at least {}px (got {})", min_side, value),
                    ));
                }
            }
            if size.area() > *max_area {
                return Err(PixelLabError::validation(
                    "image_size",
                    format!(
                        "{}x{} exceeds the maximum area of {} pixels",
                        width, height, max_area
                    ),
                ));
            }
        }
        SizeRule::Discrete(sizes) => {
            if !sizes.contains(&(width, height)) {
                let allowed: Vec<String> =
                    sizes.iter().map(|(w, h)| format!("{}x{}", w, h)).collect();
                return Err(PixelLabError::validation(
                    "image_size",
                    format!(
                        "{}x{} is not supported, allowed sizes: {}",
                        width,
                        height,
                        allowed.join(", ")
                    ),
                ));
            }
        }
    }
    Ok(Some(size))
}

fn default_dimension(spec: &EndpointSpec, name: &str) -> u32 {
    spec.param(name)
        .and_then(|p| match p.default {
            Some(crate::catalog::DefaultValue::Int(v)) => u32::try_from(v).ok(),
            None => None,
        })
        .unwrap_or(64)
}

fn read_dimension(raw: &RawArgs, field: &str) -> Result<Option<u32>> {
    match raw.get(field) {
        None => Ok(None),
        Some(RawValue::Text(text)) => {
            let value: i64 = text.trim().parse().map_err(|_| {
                PixelLabError::validation(field, format!("expected an integer, got '{}'", text))
            })?;
            u32::try_from(value).map(Some).map_err(|_| {
                PixelLabError::validation(field, format!("must be positive (got {})", value))
            })
        }
        Some(_) => Err(PixelLabError::validation(field, "expected a single integer")),
    }
}

fn single_text<'a>(param: &ParamSpec, value: &'a RawValue) -> Result<&'a str> {
    match value {
        RawValue::Text(text) => Ok(text.as_str()),
        RawValue::List(items) if items.len() == 1 => Ok(items[0].as_str()),
        RawValue::List(_) => Err(PixelLabError::validation(param.name, "expects a single value")),
        RawValue::Flag => Err(PixelLabError::validation(param.name, "expects a value")),
    }
}

fn check_range(param: &ParamSpec, value: f64) -> Result<()> {
    if let Some((min, max)) = param.range {
        if value < min || value > max {
            return Err(PixelLabError::validation(
                param.name,
                format!("must be between {} and {} (got {})", min, max, value),
            ));
        }
    }
    Ok(())
}

/// Coerce every non-file kind. Returns `None` for file kinds and unset flags.
fn coerce_scalar(param: &ParamSpec, value: &RawValue) -> Result<Option<Value>> {
    match param.kind {
        ParamKind::String => {
            let text = single_text(param, value)?;
            if text.trim().is_empty() {
                return Err(PixelLabError::validation(param.name, "must not be empty"));
            }
            Ok(Some(json!(text)))
        }
        ParamKind::Integer => {
            let text = single_text(param, value)?;
            let parsed: i64 = text.trim().parse().map_err(|_| {
                PixelLabError::validation(param.name, format!("expected an integer, got '{}'", text))
            })?;
            check_range(param, parsed as f64)?;
            Ok(Some(json!(parsed)))
        }
        ParamKind::Float => {
            let text = single_text(param, value)?;
            let parsed: f64 = text
                .trim()
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| {
                    PixelLabError::validation(param.name, format!("expected a number, got '{}'", text))
                })?;
            check_range(param, parsed)?;
            Ok(Some(json!(parsed)))
        }
        ParamKind::Boolean => match value {
            RawValue::Flag => Ok(Some(json!(true))),
            RawValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Some(json!(true))),
                "false" | "0" | "no" => Ok(None),
                _ => Err(PixelLabError::validation(
                    param.name,
                    format!("expected true or false, got '{}'", text),
                )),
            },
            RawValue::List(_) => Err(PixelLabError::validation(param.name, "is a flag")),
        },
        ParamKind::Enum(allowed) => {
            let text = single_text(param, value)?;
            if !allowed.contains(&text) {
                return Err(PixelLabError::validation(
                    param.name,
                    format!("'{}' is not one of: {}", text, allowed.join(", ")),
                ));
            }
            Ok(Some(json!(text)))
        }
        ParamKind::Image | ParamKind::ImageArray | ParamKind::PointArray(_) => Ok(None),
    }
}

fn load_file_param(param: &ParamSpec, value: &RawValue) -> Result<Option<Value>> {
    match param.kind {
        ParamKind::Image => {
            let path = single_text(param, value)?;
            Ok(Some(encode_image_file(param, Path::new(path))?))
        }
        ParamKind::ImageArray => {
            let paths: Vec<&str> = match value {
                RawValue::List(items) => items.iter().map(String::as_str).collect(),
                RawValue::Text(text) => vec![text.as_str()],
                RawValue::Flag => {
                    return Err(PixelLabError::validation(param.name, "expects image paths"))
                }
            };
            if paths.is_empty() {
                return Err(PixelLabError::validation(param.name, "expects at least one image"));
            }
            let images = paths
                .into_iter()
                .map(|p| encode_image_file(param, Path::new(p)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Value::Array(images)))
        }
        ParamKind::PointArray(shape) => {
            let path = single_text(param, value)?;
            Ok(Some(load_keypoints(param, Path::new(path), shape)?))
        }
        _ => Ok(None),
    }
}

/// Read an image file into the `{"type": "base64", ...}` wire object.
pub fn encode_image_file(param: &ParamSpec, path: &Path) -> Result<Value> {
    let bytes = fs::read(path).map_err(|e| PixelLabError::file_io(path, e))?;
    if bytes.is_empty() {
        return Err(PixelLabError::validation(
            param.name,
            format!("image file {} is empty", path.display()),
        ));
    }
    Ok(json!(Base64Image::new(STANDARD.encode(bytes))))
}

fn load_keypoints(param: &ParamSpec, path: &Path, shape: KeypointShape) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| PixelLabError::file_io(path, e))?;
    let file: KeypointFile = serde_json::from_str(&text).map_err(|e| {
        PixelLabError::validation(param.name, format!("invalid keypoint JSON: {}", e))
    })?;
    let frames = file.into_frames();
    if frames.is_empty() || frames.iter().any(|f| f.is_empty()) {
        return Err(PixelLabError::validation(
            param.name,
            "every frame needs at least one keypoint",
        ));
    }
    for (i, frame) in frames.iter().enumerate() {
        if let Some(bad) = frame.iter().find(|kp| !kp.has_known_label()) {
            return Err(PixelLabError::validation(
                param.name,
                format!(
                    "frame {}: unknown label '{}', expected one of: {}",
                    i,
                    bad.label,
                    SKELETON_LABELS.join(", ")
                ),
            ));
        }
    }
    match shape {
        KeypointShape::Frames => Ok(json!(frames)),
        KeypointShape::SingleFrame => {
            if frames.len() != 1 {
                return Err(PixelLabError::validation(
                    param.name,
                    format!("expected a single pose, got {} frames", frames.len()),
                ));
            }
            Ok(json!(frames[0]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lookup;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(pairs: &[(&str, &str)]) -> RawArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), RawValue::Text(v.to_string())))
            .collect()
    }

    fn temp_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    fn field_of(err: PixelLabError) -> String {
        match err {
            PixelLabError::ValidationError { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_pixflux_defaults_and_image_size() {
        let spec = lookup("generate-pixflux").unwrap();
        let payload = build(spec, &args(&[("description", "a red knight")])).unwrap();
        assert_eq!(payload.get("image_size"), Some(&json!({"width": 64, "height": 64})));
        assert_eq!(payload.get("description"), Some(&json!("a red knight")));
        assert!(payload.get("width").is_none());
        assert!(payload.get("init_image_strength").is_none());
        assert!(payload.get("no_background").is_none());
    }

    #[test]
    fn test_width_below_minimum() {
        let spec = lookup("generate-pixflux").unwrap();
        let err = build(spec, &args(&[("description", "x"), ("width", "15")])).unwrap_err();
        assert_eq!(field_of(err), "width");
    }

    #[test]
    fn test_missing_required_field() {
        let spec = lookup("inpaint").unwrap();
        let err = build(spec, &args(&[("description", "hat")])).unwrap_err();
        assert_eq!(field_of(err), "inpainting_image");
    }

    #[test]
    fn test_enum_and_range_rejected() {
        let spec = lookup("generate-pixflux").unwrap();
        let err = build(spec, &args(&[("description", "x"), ("outline", "thick")])).unwrap_err();
        assert_eq!(field_of(err), "outline");

        let err = build(
            spec,
            &args(&[("description", "x"), ("text_guidance_scale", "25")]),
        )
        .unwrap_err();
        assert_eq!(field_of(err), "text_guidance_scale");
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let spec = lookup("balance").unwrap();
        let err = build(spec, &args(&[("description", "x")])).unwrap_err();
        assert_eq!(field_of(err), "description");
        assert!(build(spec, &RawArgs::new()).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_size_endpoint() {
        let spec = lookup("animate-text").unwrap();
        let image = temp_file(b"\x89PNG fake");
        let path = image.path().to_str().unwrap();
        let base = [
            ("description", "wizard"),
            ("action", "walk"),
            ("reference_image", path),
        ];
        let payload = build(spec, &args(&base)).unwrap();
        assert_eq!(payload.get("image_size"), Some(&json!({"width": 64, "height": 64})));

        let mut wrong = base.to_vec();
        wrong.push(("width", "32"));
        wrong.push(("height", "32"));
        assert_eq!(field_of(build(spec, &args(&wrong)).unwrap_err()), "image_size");
    }

    #[test]
    fn test_max_area_rule() {
        let spec = lookup("generate-image").unwrap();
        // 500x330 is over the 400x400 area cap
        let err = build(
            spec,
            &args(&[("description", "x"), ("width", "500"), ("height", "330")]),
        )
        .unwrap_err();
        assert_eq!(field_of(err), "image_size");

        let payload = build(
            spec,
            &args(&[("description", "x"), ("width", "640"), ("height", "64")]),
        )
        .unwrap();
        assert_eq!(payload.get("image_size"), Some(&json!({"width": 640, "height": 64})));
    }

    #[test]
    fn test_init_image_strength_follows_init_image() {
        let spec = lookup("generate-pixflux").unwrap();
        let image = temp_file(b"png-bytes");
        let payload = build(
            spec,
            &args(&[
                ("description", "x"),
                ("init_image", image.path().to_str().unwrap()),
            ]),
        )
        .unwrap();
        assert_eq!(payload.get("init_image_strength"), Some(&json!(300)));
        assert_eq!(
            payload.get("init_image"),
            Some(&json!({"type": "base64", "base64": STANDARD.encode(b"png-bytes")}))
        );

        let err = build(
            spec,
            &args(&[("description", "x"), ("init_image_strength", "400")]),
        )
        .unwrap_err();
        assert_eq!(field_of(err), "init_image_strength");
    }

    #[test]
    fn test_rotation_method_variants() {
        let spec = lookup("generate-8-rotations").unwrap();
        let payload = build(
            spec,
            &args(&[("method", "create_with_style"), ("description", "elf archer")]),
        )
        .unwrap();
        assert_eq!(payload.method().unwrap().field, "description");

        let err = build(spec, &args(&[("method", "rotate_character")])).unwrap_err();
        assert_eq!(field_of(err), "reference_image");

        let concept = temp_file(b"concept");
        let err = build(
            spec,
            &args(&[
                ("method", "create_with_style"),
                ("description", "elf"),
                ("concept_image", concept.path().to_str().unwrap()),
            ]),
        )
        .unwrap_err();
        assert_eq!(field_of(err), "concept_image");

        let err = build(spec, &args(&[("method", "teleport")])).unwrap_err();
        assert_eq!(field_of(err), "method");
    }

    #[test]
    fn test_rotation_discrete_sizes() {
        let spec = lookup("generate-8-rotations").unwrap();
        let ok = build(
            spec,
            &args(&[
                ("method", "create_with_style"),
                ("description", "elf"),
                ("width", "96"),
                ("height", "96"),
            ]),
        );
        assert!(ok.is_ok());
        let err = build(
            spec,
            &args(&[
                ("method", "create_with_style"),
                ("description", "elf"),
                ("width", "96"),
                ("height", "64"),
            ]),
        )
        .unwrap_err();
        assert_eq!(field_of(err), "image_size");
    }

    #[test]
    fn test_mask_requires_init_image() {
        let spec = lookup("rotate").unwrap();
        let from = temp_file(b"from");
        let mask = temp_file(b"mask");
        let err = build(
            spec,
            &args(&[
                ("from_image", from.path().to_str().unwrap()),
                ("mask_image", mask.path().to_str().unwrap()),
            ]),
        )
        .unwrap_err();
        assert_eq!(field_of(err), "init_image");
    }

    #[test]
    fn test_keypoint_frames_validated() {
        let spec = lookup("animate-skeleton").unwrap();
        let reference = temp_file(b"ref");
        let good = temp_file(
            br#"[[{"x": 10, "y": 12, "label": "NECK", "z_index": 0}],
                 [{"x": 11, "y": 12, "label": "NECK", "depth": 1}]]"#,
        );
        let payload = build(
            spec,
            &args(&[
                ("reference_image", reference.path().to_str().unwrap()),
                ("skeleton_keypoints", good.path().to_str().unwrap()),
            ]),
        )
        .unwrap();
        let frames = payload.get("skeleton_keypoints").unwrap().as_array().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1][0]["z_index"], 1);

        let bad = temp_file(br#"[[{"x": 1, "y": 1, "label": "TAIL"}]]"#);
        let err = build(
            spec,
            &args(&[
                ("reference_image", reference.path().to_str().unwrap()),
                ("skeleton_keypoints", bad.path().to_str().unwrap()),
            ]),
        )
        .unwrap_err();
        assert_eq!(field_of(err), "skeleton_keypoints");
    }

    #[test]
    fn test_missing_image_file_is_file_error() {
        let spec = lookup("estimate-skeleton").unwrap();
        let err = build(spec, &args(&[("image", "/nonexistent/char.png")])).unwrap_err();
        assert!(matches!(err, PixelLabError::FileIoError { .. }));
    }

    #[test]
    fn test_flag_and_image_array() {
        let spec = lookup("edit-images").unwrap();
        let a = temp_file(b"a");
        let b = temp_file(b"b");
        let mut raw = args(&[("method", "edit_with_text"), ("description", "add a hat")]);
        raw.insert(
            "edit_frames".into(),
            RawValue::List(vec![
                a.path().to_str().unwrap().to_string(),
                b.path().to_str().unwrap().to_string(),
            ]),
        );
        raw.insert("no_background".into(), RawValue::Flag);
        let payload = build(spec, &raw).unwrap();
        assert_eq!(payload.get("edit_frames").unwrap().as_array().unwrap().len(), 2);
        assert_eq!(payload.get("no_background"), Some(&json!(true)));
    }
}
