//! Static table of every PixelLab endpoint the CLI can call.
//!
//! Each [`EndpointSpec`] declares the request parameters, their kinds and
//! constraints, the conditional groups that tie parameters together, the size
//! rule of the endpoint and how its response is turned into files. The table is
//! built once on first use and never mutated.

use crate::error::{PixelLabError, Result};
use crate::models::{DETAILS, DIRECTIONS, OUTLINES, SHADINGS, VIEWS};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGeneration {
    /// v1: one image (or one animation) per call, cost in USD
    Legacy,
    /// v2: several candidate images per call, usage in credits
    Variations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypointShape {
    SingleFrame,
    Frames,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    String,
    Integer,
    Float,
    Boolean,
    Image,
    ImageArray,
    PointArray(KeypointShape),
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
}

impl DefaultValue {
    pub fn to_json(self) -> Value {
        match self {
            DefaultValue::Int(v) => json!(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
    /// Inclusive numeric bounds
    pub range: Option<(f64, f64)>,
    /// Only sent when this other parameter is present
    pub only_with: Option<&'static str>,
    pub help: &'static str,
}

impl ParamSpec {
    fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            range: None,
            only_with: None,
            help: "",
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, ParamKind::String)
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    pub fn float(name: &'static str) -> Self {
        Self::new(name, ParamKind::Float)
    }

    pub fn flag(name: &'static str) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    pub fn image(name: &'static str) -> Self {
        Self::new(name, ParamKind::Image)
    }

    pub fn images(name: &'static str) -> Self {
        Self::new(name, ParamKind::ImageArray)
    }

    pub fn keypoints(name: &'static str, shape: KeypointShape) -> Self {
        Self::new(name, ParamKind::PointArray(shape))
    }

    pub fn choice(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, ParamKind::Enum(values))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn only_with(mut self, other: &'static str) -> Self {
        self.only_with = Some(other);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub fn cli_flag(&self) -> String {
        self.name.replace('_', "-")
    }
}

/// One arm of a method discriminator: picking `method` makes `field` required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodOption {
    pub method: &'static str,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalGroup {
    /// The discriminator selects exactly one field; the others are forbidden.
    ExactlyOne {
        discriminator: &'static str,
        options: &'static [MethodOption],
    },
    /// When `trigger` is present every field in `requires` must be too.
    AllOf {
        trigger: &'static str,
        requires: &'static [&'static str],
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeRule {
    None,
    PerAxis { min: u32, max: u32 },
    MaxArea { min_side: u32, max_area: u64 },
    Discrete(&'static [(u32, u32)]),
}

impl SizeRule {
    pub fn is_fixed(&self) -> bool {
        matches!(self, SizeRule::Discrete(sizes) if sizes.len() == 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Balance,
    SingleImage,
    ImageList,
    DirectionMap,
    Keypoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    None,
    /// One image written to the output path
    Single { default_path: &'static str },
    /// Every frame written as `{base}_{i}`, spritesheet optional
    Frames { default_base: &'static str },
    /// Candidates picked with first / all / pick N
    Variations { default_base: &'static str },
    /// Keypoints echoed in the report and optionally saved as JSON
    Keypoints,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSpec {
    pub name: &'static str,
    pub summary: &'static str,
    pub generation: ApiGeneration,
    pub verb: HttpVerb,
    pub path: &'static str,
    pub size: SizeRule,
    pub response: ResponseShape,
    pub output: OutputMode,
    pub params: Vec<ParamSpec>,
    pub groups: Vec<ConditionalGroup>,
}

impl EndpointSpec {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

const FIXED_64: &[(u32, u32)] = &[(64, 64)];
const ROTATION_SIZES: &[(u32, u32)] = &[(32, 32), (48, 48), (64, 64), (96, 96), (128, 128)];

const ROTATION_METHODS: &[MethodOption] = &[
    MethodOption {
        method: "rotate_character",
        field: "reference_image",
    },
    MethodOption {
        method: "create_with_style",
        field: "description",
    },
    MethodOption {
        method: "create_from_concept",
        field: "concept_image",
    },
];
const ROTATION_METHOD_NAMES: &[&str] =
    &["rotate_character", "create_with_style", "create_from_concept"];

const EDIT_METHODS: &[MethodOption] = &[
    MethodOption {
        method: "edit_with_text",
        field: "description",
    },
    MethodOption {
        method: "edit_with_reference",
        field: "reference_image",
    },
];
const EDIT_METHOD_NAMES: &[&str] = &["edit_with_text", "edit_with_reference"];

const SEED_MAX: f64 = 4_294_967_295.0;

fn size_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("width")
            .default(DefaultValue::Int(64))
            .help("Image width in pixels"),
        ParamSpec::int("height")
            .default(DefaultValue::Int(64))
            .help("Image height in pixels"),
    ]
}

fn style_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::choice("outline", OUTLINES).help("Outline style"),
        ParamSpec::choice("shading", SHADINGS).help("Shading style"),
        ParamSpec::choice("detail", DETAILS).help("Detail level"),
        ParamSpec::choice("view", VIEWS).help("Camera view angle"),
        ParamSpec::choice("direction", DIRECTIONS).help("Subject facing direction"),
    ]
}

fn init_image_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::image("init_image").help("Path to initial image"),
        ParamSpec::int("init_image_strength")
            .default(DefaultValue::Int(300))
            .range(1.0, 999.0)
            .only_with("init_image")
            .help("Strength of init image (1-999, default 300)"),
    ]
}

fn init_images_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::images("init_images").help("Paths to initial frame images"),
        ParamSpec::int("init_image_strength")
            .default(DefaultValue::Int(300))
            .range(1.0, 999.0)
            .only_with("init_images")
            .help("Strength of init images (1-999, default 300)"),
    ]
}

fn legacy_seed() -> ParamSpec {
    ParamSpec::int("seed")
        .range(0.0, SEED_MAX)
        .help("Random seed for reproducibility")
}

fn color_image() -> ParamSpec {
    ParamSpec::image("color_image").help("Path to color palette image")
}

fn flags(names: &[&'static str]) -> Vec<ParamSpec> {
    names
        .iter()
        .map(|name| {
            let help = match *name {
                "no_background" => "Transparent background",
                "isometric" => "Isometric view",
                "oblique_projection" => "Oblique projection view",
                _ => "",
            };
            ParamSpec::flag(name).help(help)
        })
        .collect()
}

fn balance() -> EndpointSpec {
    EndpointSpec {
        name: "balance",
        summary: "Check account credit balance",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Get,
        path: "/v1/balance",
        size: SizeRule::None,
        response: ResponseShape::Balance,
        output: OutputMode::None,
        params: vec![],
        groups: vec![],
    }
}

fn generate_pixflux() -> EndpointSpec {
    let mut params = vec![ParamSpec::string("description")
        .required()
        .help("Text description of image")];
    params.extend(size_params());
    params.extend(style_params());
    params.extend(flags(&["no_background", "isometric"]));
    params.push(
        ParamSpec::float("text_guidance_scale")
            .range(1.0, 20.0)
            .help("Text guidance (1.0-20.0, default 8.0)"),
    );
    params.extend(init_image_params());
    params.push(color_image());
    params.push(legacy_seed());

    EndpointSpec {
        name: "generate-pixflux",
        summary: "Text-to-pixel-art generation (up to 400x400)",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Post,
        path: "/v1/generate-image-pixflux",
        size: SizeRule::PerAxis { min: 16, max: 400 },
        response: ResponseShape::SingleImage,
        output: OutputMode::Single {
            default_path: "output.png",
        },
        params,
        groups: vec![],
    }
}

fn generate_bitforge() -> EndpointSpec {
    let mut params = vec![ParamSpec::string("description")
        .required()
        .help("Text description of image")];
    params.extend(size_params());
    params.extend(style_params());
    params.extend(flags(&["no_background", "isometric", "oblique_projection"]));
    params.push(
        ParamSpec::float("text_guidance_scale")
            .range(1.0, 20.0)
            .help("Text guidance (1.0-20.0, default 8.0)"),
    );
    params.push(
        ParamSpec::float("style_strength")
            .range(0.0, 100.0)
            .help("Style transfer strength (0-100)"),
    );
    params.push(
        ParamSpec::float("coverage_percentage")
            .range(0.0, 100.0)
            .help("Canvas coverage percentage (0-100)"),
    );
    params.extend(init_image_params());
    params.push(ParamSpec::image("style_image").help("Path to style reference image"));
    params.push(ParamSpec::image("inpainting_image").help("Path to image to inpaint"));
    params.push(ParamSpec::image("mask_image").help("Path to mask image (white=edit area)"));
    params.push(color_image());
    params.push(
        ParamSpec::keypoints("skeleton_keypoints", KeypointShape::SingleFrame)
            .help("Path to JSON file with skeleton keypoints"),
    );
    params.push(legacy_seed());

    EndpointSpec {
        name: "generate-bitforge",
        summary: "Style transfer pixel art generation (up to 200x200)",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Post,
        path: "/v1/generate-image-bitforge",
        size: SizeRule::PerAxis { min: 16, max: 200 },
        response: ResponseShape::SingleImage,
        output: OutputMode::Single {
            default_path: "output.png",
        },
        params,
        groups: vec![],
    }
}

fn animate_skeleton() -> EndpointSpec {
    let mut params = size_params();
    params.push(
        ParamSpec::image("reference_image")
            .required()
            .help("Path to reference character image"),
    );
    params.push(
        ParamSpec::keypoints("skeleton_keypoints", KeypointShape::Frames)
            .required()
            .help("Path to JSON file with skeleton keypoints (array of frames)"),
    );
    params.push(ParamSpec::choice("view", VIEWS).help("Camera view angle"));
    params.push(ParamSpec::choice("direction", DIRECTIONS).help("Subject facing direction"));
    params.extend(flags(&["isometric", "oblique_projection"]));
    params.push(
        ParamSpec::float("guidance_scale")
            .range(1.0, 20.0)
            .help("Guidance scale (1.0-20.0, default 4.0)"),
    );
    params.extend(init_images_params());
    params.push(color_image());
    params.push(legacy_seed());

    EndpointSpec {
        name: "animate-skeleton",
        summary: "Skeleton-based animation (up to 256x256)",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Post,
        path: "/v1/animate-with-skeleton",
        size: SizeRule::PerAxis { min: 16, max: 256 },
        response: ResponseShape::ImageList,
        output: OutputMode::Frames {
            default_base: "frame",
        },
        params,
        groups: vec![],
    }
}

fn animate_text() -> EndpointSpec {
    let mut params = vec![
        ParamSpec::string("description")
            .required()
            .help("Character description"),
        ParamSpec::string("action")
            .required()
            .help("Animation action (e.g. 'walk', 'attack')"),
        ParamSpec::image("reference_image")
            .required()
            .help("Path to reference character image"),
    ];
    params.extend(size_params());
    params.push(ParamSpec::choice("view", VIEWS).help("Camera view angle"));
    params.push(ParamSpec::choice("direction", DIRECTIONS).help("Subject facing direction"));
    params.push(
        ParamSpec::int("n_frames")
            .range(2.0, 20.0)
            .help("Total animation frames (2-20, default 4)"),
    );
    params.push(
        ParamSpec::int("start_frame_index")
            .range(0.0, 20.0)
            .help("Starting frame index (0-20, default 0)"),
    );
    params.push(
        ParamSpec::float("text_guidance_scale")
            .range(1.0, 20.0)
            .help("Text guidance (1.0-20.0, default 8.0)"),
    );
    params.push(
        ParamSpec::float("image_guidance_scale")
            .range(1.0, 20.0)
            .help("Image guidance (1.0-20.0, default 1.4)"),
    );
    params.extend(init_images_params());
    params.push(color_image());
    params.push(legacy_seed());

    EndpointSpec {
        name: "animate-text",
        summary: "Text-guided animation (64x64 only)",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Post,
        path: "/v1/animate-with-text",
        size: SizeRule::Discrete(FIXED_64),
        response: ResponseShape::ImageList,
        output: OutputMode::Frames {
            default_base: "frame",
        },
        params,
        groups: vec![],
    }
}

fn rotate() -> EndpointSpec {
    let mut params = size_params();
    params.push(
        ParamSpec::image("from_image")
            .required()
            .help("Path to source image to rotate"),
    );
    params.push(ParamSpec::choice("from_view", VIEWS).help("Current view (default: side)"));
    params.push(ParamSpec::choice("to_view", VIEWS).help("Target view (default: side)"));
    params.push(
        ParamSpec::choice("from_direction", DIRECTIONS).help("Current direction (default: south)"),
    );
    params.push(
        ParamSpec::choice("to_direction", DIRECTIONS).help("Target direction (default: east)"),
    );
    params.push(
        ParamSpec::int("view_change")
            .range(-90.0, 90.0)
            .help("Degrees to tilt (-90 to 90)"),
    );
    params.push(
        ParamSpec::int("direction_change")
            .range(-180.0, 180.0)
            .help("Degrees to rotate (-180 to 180)"),
    );
    params.extend(flags(&["isometric", "oblique_projection"]));
    params.push(
        ParamSpec::float("image_guidance_scale")
            .range(1.0, 20.0)
            .help("Image guidance (1.0-20.0, default 3.0)"),
    );
    params.extend(init_image_params());
    params.push(ParamSpec::image("mask_image").help("Path to mask image (requires init-image)"));
    params.push(color_image());
    params.push(legacy_seed());

    EndpointSpec {
        name: "rotate",
        summary: "Rotate character view/direction (up to 200x200)",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Post,
        path: "/v1/rotate",
        size: SizeRule::PerAxis { min: 16, max: 200 },
        response: ResponseShape::SingleImage,
        output: OutputMode::Single {
            default_path: "rotated.png",
        },
        params,
        groups: vec![ConditionalGroup::AllOf {
            trigger: "mask_image",
            requires: &["init_image"],
        }],
    }
}

fn inpaint() -> EndpointSpec {
    let mut params = vec![ParamSpec::string("description")
        .required()
        .help("Description of what to generate in mask")];
    params.extend(size_params());
    params.extend(style_params());
    params.push(
        ParamSpec::image("inpainting_image")
            .required()
            .help("Path to image to edit"),
    );
    params.push(
        ParamSpec::image("mask_image")
            .required()
            .help("Path to mask image (white=edit area, black=keep)"),
    );
    params.extend(flags(&["no_background", "isometric", "oblique_projection"]));
    params.push(
        ParamSpec::float("text_guidance_scale")
            .range(1.0, 10.0)
            .help("Text guidance (1.0-10.0, default 3.0)"),
    );
    params.extend(init_image_params());
    params.push(color_image());
    params.push(legacy_seed());

    EndpointSpec {
        name: "inpaint",
        summary: "Edit masked region of existing art (up to 200x200)",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Post,
        path: "/v1/inpaint",
        size: SizeRule::PerAxis { min: 16, max: 200 },
        response: ResponseShape::SingleImage,
        output: OutputMode::Single {
            default_path: "inpainted.png",
        },
        params,
        groups: vec![],
    }
}

fn estimate_skeleton() -> EndpointSpec {
    EndpointSpec {
        name: "estimate-skeleton",
        summary: "Extract skeleton keypoints from character image",
        generation: ApiGeneration::Legacy,
        verb: HttpVerb::Post,
        path: "/v1/estimate-skeleton",
        size: SizeRule::None,
        response: ResponseShape::Keypoints,
        output: OutputMode::Keypoints,
        params: vec![ParamSpec::image("image")
            .required()
            .help("Path to character image (transparent background)")],
        groups: vec![],
    }
}

fn generate_image_v2() -> EndpointSpec {
    let mut params = vec![ParamSpec::string("description")
        .required()
        .help("Text description of image")];
    params.extend(size_params());
    params.extend(style_params());
    params.extend(flags(&["no_background"]));
    params.push(ParamSpec::image("style_image").help("Path to style reference image"));
    params.push(
        ParamSpec::int("seed")
            .range(0.0, SEED_MAX)
            .help("Seed for the variation batch (0 = random seed)"),
    );

    EndpointSpec {
        name: "generate-image",
        summary: "Multi-variation pixel art generation (total area up to 400x400)",
        generation: ApiGeneration::Variations,
        verb: HttpVerb::Post,
        path: "/v2/generate-image",
        size: SizeRule::MaxArea {
            min_side: 16,
            max_area: 400 * 400,
        },
        response: ResponseShape::ImageList,
        output: OutputMode::Variations {
            default_base: "variation",
        },
        params,
        groups: vec![],
    }
}

fn generate_8_rotations() -> EndpointSpec {
    let mut params = vec![
        ParamSpec::choice("method", ROTATION_METHOD_NAMES)
            .required()
            .help("Generation method"),
        ParamSpec::image("reference_image")
            .help("Character to rotate (method rotate_character)"),
        ParamSpec::string("description")
            .help("Character description (method create_with_style)"),
        ParamSpec::image("concept_image")
            .help("Concept art to build from (method create_from_concept)"),
    ];
    params.extend(size_params());
    params.push(ParamSpec::choice("view", VIEWS).help("Camera view angle"));
    params.push(ParamSpec::choice("outline", OUTLINES).help("Outline style"));
    params.push(ParamSpec::choice("shading", SHADINGS).help("Shading style"));
    params.push(ParamSpec::choice("detail", DETAILS).help("Detail level"));
    params.extend(flags(&["no_background"]));
    params.push(
        ParamSpec::int("seed")
            .range(0.0, SEED_MAX)
            .help("Seed used for all eight directions"),
    );

    EndpointSpec {
        name: "generate-8-rotations",
        summary: "Character in all eight directions (32/48/64/96/128 square)",
        generation: ApiGeneration::Variations,
        verb: HttpVerb::Post,
        path: "/v2/generate-8-rotations",
        size: SizeRule::Discrete(ROTATION_SIZES),
        response: ResponseShape::DirectionMap,
        output: OutputMode::Frames {
            default_base: "rotation",
        },
        params,
        groups: vec![ConditionalGroup::ExactlyOne {
            discriminator: "method",
            options: ROTATION_METHODS,
        }],
    }
}

fn edit_images() -> EndpointSpec {
    let mut params = vec![
        ParamSpec::choice("method", EDIT_METHOD_NAMES)
            .required()
            .help("Edit method"),
        ParamSpec::string("description")
            .help("Edit instruction (method edit_with_text)"),
        ParamSpec::image("reference_image")
            .help("Reference to copy from (method edit_with_reference)"),
        ParamSpec::images("edit_frames")
            .required()
            .help("Paths to the frames to edit"),
    ];
    params.extend(size_params());
    params.extend(flags(&["no_background"]));
    params.push(
        ParamSpec::int("seed")
            .range(0.0, SEED_MAX)
            .help("Seed for the edit"),
    );

    EndpointSpec {
        name: "edit-images",
        summary: "Batch edit a set of frames (total area up to 256x256)",
        generation: ApiGeneration::Variations,
        verb: HttpVerb::Post,
        path: "/v2/edit-images",
        size: SizeRule::MaxArea {
            min_side: 16,
            max_area: 256 * 256,
        },
        response: ResponseShape::ImageList,
        output: OutputMode::Variations {
            default_base: "variation",
        },
        params,
        groups: vec![ConditionalGroup::ExactlyOne {
            discriminator: "method",
            options: EDIT_METHODS,
        }],
    }
}

static CATALOG: Lazy<Vec<EndpointSpec>> = Lazy::new(|| {
    vec![
        balance(),
        generate_pixflux(),
        generate_bitforge(),
        animate_skeleton(),
        animate_text(),
        rotate(),
        inpaint(),
        estimate_skeleton(),
        generate_image_v2(),
        generate_8_rotations(),
        edit_images(),
    ]
});

pub fn all() -> &'static [EndpointSpec] {
    &CATALOG
}

pub fn lookup(name: &str) -> Result<&'static EndpointSpec> {
    CATALOG
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| PixelLabError::UnknownSubcommand(name.to_string()))
}
