//! Horizontal spritesheets for animation and rotation frames.

use crate::error::{PixelLabError, Result};
use crate::models::{AnimationFrameSet, ImageAsset};
use image::{imageops, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Lay the frames out left to right at native resolution.
///
/// The sheet is `frames * frame_width` wide and `frame_height` tall; frame `i`
/// starts at column `i * frame_width`.
pub fn render_horizontal(frames: &AnimationFrameSet) -> RgbaImage {
    let width = frames.frame_width() * frames.len() as u32;
    let mut sheet = RgbaImage::new(width, frames.frame_height());

    for (i, frame) in frames.frames().iter().enumerate() {
        let x = i as u32 * frames.frame_width();
        imageops::replace(&mut sheet, frame, x as i64, 0);
    }

    sheet
}

/// Decode, validate and concatenate the assets, returning PNG bytes.
pub fn encode_spritesheet(assets: &[ImageAsset]) -> Result<Vec<u8>> {
    let frames = AnimationFrameSet::from_assets(assets)?;
    let sheet = render_horizontal(&frames);
    log::debug!(
        "Spritesheet: {} frames, {}x{}",
        frames.len(),
        sheet.width(),
        sheet.height()
    );

    let mut out = Cursor::new(Vec::new());
    sheet.write_to(&mut out, ImageFormat::Png).map_err(|e| {
        PixelLabError::DecodeError(format!("cannot encode spritesheet: {}", e))
    })?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_geometry_and_placement() {
        let frames = AnimationFrameSet::new(vec![solid(3, 2, 10), solid(3, 2, 20), solid(3, 2, 30)])
            .unwrap();
        let sheet = render_horizontal(&frames);
        assert_eq!(sheet.dimensions(), (9, 2));
        for i in 0..3u32 {
            let expected = (i as u8 + 1) * 10;
            assert_eq!(sheet.get_pixel(i * 3, 0)[0], expected);
            assert_eq!(sheet.get_pixel(i * 3 + 2, 1)[0], expected);
        }
    }

    #[test]
    fn test_single_frame_sheet() {
        let frames = AnimationFrameSet::new(vec![solid(4, 4, 7)]).unwrap();
        assert_eq!(render_horizontal(&frames).dimensions(), (4, 4));
    }

    #[test]
    fn test_encode_rejects_mismatched_frames() {
        let encode = |img: RgbaImage| {
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, ImageFormat::Png).unwrap();
            ImageAsset::from_bytes(out.into_inner())
        };
        let assets = vec![encode(solid(4, 4, 1)), encode(solid(5, 4, 1))];
        assert!(matches!(
            encode_spritesheet(&assets),
            Err(PixelLabError::DecodeError(_))
        ));

        let png = encode_spritesheet(&assets[..1]).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }
}
