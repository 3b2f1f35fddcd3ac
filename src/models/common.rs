use serde::{Deserialize, Serialize};

pub const OUTLINES: &[&str] = &[
    "single color black outline",
    "single color outline",
    "selective outline",
    "lineless",
];

pub const SHADINGS: &[&str] = &[
    "flat shading",
    "basic shading",
    "medium shading",
    "detailed shading",
    "highly detailed shading",
];

pub const DETAILS: &[&str] = &["low detail", "medium detail", "highly detailed"];

pub const VIEWS: &[&str] = &["side", "low top-down", "high top-down"];

pub const DIRECTIONS: &[&str] = &[
    "north",
    "north-east",
    "east",
    "south-east",
    "south",
    "south-west",
    "west",
    "north-west",
];

/// Facing direction of a sprite; `CANONICAL_ORDER` is the order of a rotation sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
}

impl Direction {
    pub const CANONICAL_ORDER: [Direction; 8] = [
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::South => "south",
            Direction::SouthWest => "south-west",
            Direction::West => "west",
            Direction::NorthWest => "north-west",
            Direction::North => "north",
            Direction::NorthEast => "north-east",
            Direction::East => "east",
            Direction::SouthEast => "south-east",
        }
    }

    /// Accepts `south-west`, `south_west` and `southwest` spellings.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .collect();
        Direction::CANONICAL_ORDER
            .iter()
            .copied()
            .find(|d| d.as_str().replace('-', "") == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Wire shape of an image sent to the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Base64Image {
    #[serde(rename = "type")]
    pub kind: String,
    pub base64: String,
}

impl Base64Image {
    pub fn new(encoded: String) -> Self {
        Self {
            kind: "base64".to_string(),
            base64: encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse_spellings() {
        assert_eq!(Direction::parse("south-west"), Some(Direction::SouthWest));
        assert_eq!(Direction::parse("SOUTH_WEST"), Some(Direction::SouthWest));
        assert_eq!(Direction::parse("northeast"), Some(Direction::NorthEast));
        assert_eq!(Direction::parse("up"), None);
    }

    #[test]
    fn test_every_direction_listed() {
        for d in Direction::CANONICAL_ORDER {
            assert!(DIRECTIONS.contains(&d.as_str()));
        }
    }

    #[test]
    fn test_base64_image_wire_shape() {
        let value = serde_json::to_value(Base64Image::new("AAAA".into())).unwrap();
        assert_eq!(value, serde_json::json!({"type": "base64", "base64": "AAAA"}));
    }
}
