use fuelsite_core::ImageKind;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;

use super::resize::ImageResize;
use crate::compression::OutputFormat;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Pixel decode/render/encode backend used by the raster compression path.
///
/// The search loop only talks to this trait, so a different backend (or a
/// test double) can be swapped in without touching the candidate logic.
pub trait ImageCodec: Send + Sync + 'static {
    type Surface: Send + 'static;

    fn decode(&self, bytes: &[u8], kind: ImageKind) -> Result<Self::Surface, CodecError>;

    fn dimensions(&self, surface: &Self::Surface) -> (u32, u32);

    /// Render `surface` at exactly `width` x `height`.
    fn render(&self, surface: &Self::Surface, width: u32, height: u32) -> Self::Surface;

    /// Encode with `quality` in 1..=100.
    fn encode(
        &self,
        surface: &Self::Surface,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Codec backed by the `image` crate for decoding and resizing, `mozjpeg` for
/// JPEG output and `webp` (libwebp) for lossy WebP output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl NativeCodec {
    fn image_format(kind: ImageKind) -> Option<ImageFormat> {
        match kind {
            ImageKind::Jpeg => Some(ImageFormat::Jpeg),
            ImageKind::Png => Some(ImageFormat::Png),
            ImageKind::Gif => Some(ImageFormat::Gif),
            ImageKind::WebP => Some(ImageFormat::WebP),
            ImageKind::Svg => None,
        }
    }

    /// Composite onto a white background; JPEG has no alpha channel.
    fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
        if !img.color().has_alpha() {
            return img.to_rgb8();
        }

        let rgba = img.to_rgba8();
        let mut rgb = RgbImage::new(rgba.width(), rgba.height());
        for (src, dst) in rgba.pixels().zip(rgb.pixels_mut()) {
            let alpha = src[3] as u32;
            for c in 0..3 {
                let blended = (src[c] as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
                dst[c] = blended as u8;
            }
        }
        rgb
    }

    fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        let rgb_img = Self::flatten_onto_white(img);
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp
            .start_compress(Vec::new())
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        comp.write_scanlines(&rgb_img)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        comp.finish().map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(quality as f32);

        if webp_data.is_empty() {
            return Err(CodecError::Encode("WebP encoder produced no data".to_string()));
        }
        Ok(webp_data.to_vec())
    }
}

impl ImageCodec for NativeCodec {
    type Surface = DynamicImage;

    fn decode(&self, bytes: &[u8], kind: ImageKind) -> Result<DynamicImage, CodecError> {
        let format = Self::image_format(kind)
            .ok_or_else(|| CodecError::Decode(format!("{} is not a raster format", kind)))?;

        let mut reader = ImageReader::new(Cursor::new(bytes));
        reader.set_format(format);
        // Trust the bytes over the declared type when they disagree
        let reader = reader
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        reader
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn dimensions(&self, surface: &DynamicImage) -> (u32, u32) {
        (surface.width(), surface.height())
    }

    fn render(&self, surface: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        ImageResize::resize_image(surface, width, height)
    }

    fn encode(
        &self,
        surface: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError> {
        let quality = quality.clamp(1, 100);
        match format {
            OutputFormat::Jpeg => Self::encode_jpeg(surface, quality),
            OutputFormat::WebP => Self::encode_webp(surface, quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 20, Rgba([10, 20, 30, 255])));
        let surface = NativeCodec.decode(&png_bytes(&img), ImageKind::Png).unwrap();
        assert_eq!(NativeCodec.dimensions(&surface), (30, 20));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = NativeCodec.decode(b"definitely not an image", ImageKind::Jpeg);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_svg_is_rejected() {
        let result = NativeCodec.decode(b"<svg/>", ImageKind::Svg);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_uses_actual_bytes_over_declared_type() {
        let img = DynamicImage::new_rgb8(8, 8);
        // PNG bytes declared as JPEG still decode
        let surface = NativeCodec.decode(&png_bytes(&img), ImageKind::Jpeg).unwrap();
        assert_eq!(NativeCodec.dimensions(&surface), (8, 8));
    }

    #[test]
    fn test_encode_jpeg_flattens_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0])));
        let bytes = NativeCodec.encode(&img, OutputFormat::Jpeg, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        // Transparent black becomes (near) white
        assert!(decoded.get_pixel(8, 8)[0] > 240);
    }

    #[test]
    fn test_encode_webp() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([200, 10, 10, 255])));
        let bytes = NativeCodec.encode(&img, OutputFormat::WebP, 75).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |x, y| {
            image::Rgb([(x * 2) as u8, (y * 2) as u8, ((x * y) % 256) as u8])
        }));
        let high = NativeCodec.encode(&img, OutputFormat::Jpeg, 95).unwrap();
        let low = NativeCodec.encode(&img, OutputFormat::Jpeg, 30).unwrap();
        assert!(low.len() < high.len());
    }
}
