use image::imageops::FilterType;
use image::DynamicImage;

pub struct ImageResize;

impl ImageResize {
    /// Dimensions that fit within `max_dimension` on the longest side while
    /// preserving aspect ratio. Never upscales.
    pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
        let longest = width.max(height);
        if longest <= max_dimension || longest == 0 {
            return (width, height);
        }

        let scale = |side: u32| -> u32 {
            let scaled = (side as u64 * max_dimension as u64 + longest as u64 / 2) / longest as u64;
            (scaled as u32).max(1)
        };

        (scale(width), scale(height))
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        if img.width() == width && img.height() == height {
            return img.clone();
        }
        let filter = Self::select_filter(img.width(), img.height(), width, height);
        img.resize_exact(width, height, filter)
    }
}
