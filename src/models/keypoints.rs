use serde::{Deserialize, Serialize};

/// Joint labels the skeleton endpoints accept.
pub const SKELETON_LABELS: &[&str] = &[
    "NOSE",
    "NECK",
    "RIGHT SHOULDER",
    "RIGHT ELBOW",
    "RIGHT ARM",
    "LEFT SHOULDER",
    "LEFT ELBOW",
    "LEFT ARM",
    "RIGHT HIP",
    "RIGHT KNEE",
    "RIGHT LEG",
    "LEFT HIP",
    "LEFT KNEE",
    "LEFT LEG",
    "RIGHT EYE",
    "LEFT EYE",
    "RIGHT EAR",
    "LEFT EAR",
];

/// One labeled joint of a pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    #[serde(default, alias = "depth")]
    pub z_index: i32,
}

impl Keypoint {
    pub fn has_known_label(&self) -> bool {
        SKELETON_LABELS.contains(&self.label.as_str())
    }
}

/// Keypoint file contents: one pose, or one pose per animation frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeypointFile {
    Frames(Vec<Vec<Keypoint>>),
    Single(Vec<Keypoint>),
}

impl KeypointFile {
    pub fn into_frames(self) -> Vec<Vec<Keypoint>> {
        match self {
            KeypointFile::Frames(frames) => frames,
            KeypointFile::Single(points) => vec![points],
        }
    }
}
