use crate::error::{PixelLabError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};

/// Decoded image bytes as returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// Direction label for rotation sheets
    pub label: Option<String>,
}

impl ImageAsset {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        // data:image/png;base64,....
        let payload = match trimmed.find("base64,") {
            Some(idx) if trimmed.starts_with("data:") => &trimmed[idx + "base64,".len()..],
            _ => trimmed,
        };
        if payload.is_empty() {
            return Err(PixelLabError::DecodeError("empty image payload".into()));
        }
        let data = STANDARD
            .decode(payload)
            .map_err(|e| PixelLabError::DecodeError(format!("malformed base64 image: {}", e)))?;
        if data.is_empty() {
            return Err(PixelLabError::DecodeError("empty image payload".into()));
        }
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        let format = image::guess_format(&data).unwrap_or(ImageFormat::Png);
        Self {
            data,
            format,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("png")
    }

    pub fn to_rgba(&self) -> Result<RgbaImage> {
        image::load_from_memory_with_format(&self.data, self.format)
            .map(|img| img.to_rgba8())
            .map_err(|e| PixelLabError::DecodeError(format!("cannot decode image pixels: {}", e)))
    }
}

/// Frames of one animation (or rotation sheet), all sharing the same dimensions.
#[derive(Debug, Clone)]
pub struct AnimationFrameSet {
    frames: Vec<RgbaImage>,
    width: u32,
    height: u32,
}

impl AnimationFrameSet {
    pub fn from_assets(assets: &[ImageAsset]) -> Result<Self> {
        let frames = assets
            .iter()
            .map(ImageAsset::to_rgba)
            .collect::<Result<Vec<_>>>()?;
        Self::new(frames)
    }

    pub fn new(frames: Vec<RgbaImage>) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| PixelLabError::DecodeError("animation has no frames".into()))?;
        let (width, height) = first.dimensions();
        if let Some((i, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != (width, height))
        {
            return Err(PixelLabError::DecodeError(format!(
                "frame {} is {}x{} but frame 0 is {}x{}",
                i,
                frame.width(),
                frame.height(),
                width,
                height
            )));
        }
        Ok(Self {
            frames,
            width,
            height,
        })
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn frame_width(&self) -> u32 {
        self.width
    }

    pub fn frame_height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
