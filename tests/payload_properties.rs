use pixellab::catalog;
use pixellab::payload::{build, RawArgs, RawValue};
use pixellab::PixelLabError;
use proptest::prelude::*;

const ROTATION_SIZES: [u32; 5] = [32, 48, 64, 96, 128];

fn args(pairs: &[(&str, String)]) -> RawArgs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), RawValue::Text(v.clone())))
        .collect()
}

fn size_args(extra: &[(&str, &str)], width: u32, height: u32) -> RawArgs {
    let mut pairs: Vec<(&str, String)> = extra.iter().map(|(k, v)| (*k, v.to_string())).collect();
    pairs.push(("width", width.to_string()));
    pairs.push(("height", height.to_string()));
    args(&pairs)
}

fn field_of(err: PixelLabError) -> String {
    match err {
        PixelLabError::ValidationError { field, .. } => field,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn pixflux_accepts_every_in_range_size(width in 16u32..=400, height in 16u32..=400) {
        let spec = catalog::lookup("generate-pixflux").unwrap();
        let payload = build(spec, &size_args(&[("description", "x")], width, height)).unwrap();
        prop_assert_eq!(payload.get("image_size").unwrap()["width"].as_u64(), Some(width as u64));
        prop_assert_eq!(payload.get("image_size").unwrap()["height"].as_u64(), Some(height as u64));
        prop_assert!(payload.get("width").is_none());
    }

    #[test]
    fn bitforge_rejects_out_of_range_axes(width in prop_oneof![0u32..16, 201u32..2000], height in 16u32..=200) {
        let spec = catalog::lookup("generate-bitforge").unwrap();
        let err = build(spec, &size_args(&[("description", "x")], width, height)).unwrap_err();
        prop_assert_eq!(field_of(err), "width");
    }

    #[test]
    fn variation_sizes_respect_the_area_cap(width in 16u32..=1000, height in 16u32..=1000) {
        let spec = catalog::lookup("generate-image").unwrap();
        let result = build(spec, &size_args(&[("description", "x")], width, height));
        if (width as u64) * (height as u64) <= 400 * 400 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(field_of(result.unwrap_err()), "image_size");
        }
    }

    #[test]
    fn rotations_only_accept_listed_sizes(width in 16u32..=160, height in 16u32..=160) {
        let spec = catalog::lookup("generate-8-rotations").unwrap();
        let extra = [("method", "create_with_style"), ("description", "x")];
        let result = build(spec, &size_args(&extra, width, height));
        if width == height && ROTATION_SIZES.contains(&width) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(field_of(result.unwrap_err()), "image_size");
        }
    }

    #[test]
    fn numeric_ranges_are_enforced(scale in -5.0f64..30.0) {
        let spec = catalog::lookup("generate-pixflux").unwrap();
        let raw = args(&[
            ("description", "x".to_string()),
            ("text_guidance_scale", format!("{}", scale)),
        ]);
        let result = build(spec, &raw);
        if (1.0..=20.0).contains(&scale) {
            let payload = result.unwrap();
            prop_assert_eq!(payload.get("text_guidance_scale").unwrap().as_f64(), Some(scale));
        } else {
            prop_assert_eq!(field_of(result.unwrap_err()), "text_guidance_scale");
        }
    }

    #[test]
    fn unknown_arguments_never_pass(name in "[a-z]{3,12}") {
        let spec = catalog::lookup("generate-pixflux").unwrap();
        prop_assume!(spec.param(&name).is_none());
        let raw = args(&[("description", "x".to_string()), (name.as_str(), "1".to_string())]);
        prop_assert_eq!(field_of(build(spec, &raw).unwrap_err()), name);
    }
}
