//! Resizing and alpha flattening.
//!
//! Two steps, always in this order: scale down to the max-side constraint,
//! then (for opaque targets only) flatten transparency onto the background
//! color. Flattening after resizing keeps scaled edges blending against the
//! background they will actually sit on, instead of leaving seams.

use super::calculations::fit_within;
use crate::options::Background;
use image::{DynamicImage, RgbImage, RgbaImage, imageops::FilterType};

/// Scale an image down so its longer side fits `max_side` (0 = no limit),
/// preserving aspect ratio. Never upscales. The result keeps its alpha
/// channel; transparency is destroyed only by [`flatten_onto`].
pub fn resize_to_limit(image: &DynamicImage, max_side: u32) -> RgbaImage {
    let source = (image.width(), image.height());
    let (dst_w, dst_h) = fit_within(source, max_side);
    if (dst_w, dst_h) == source {
        image.to_rgba8()
    } else {
        image
            .resize_exact(dst_w, dst_h, FilterType::Lanczos3)
            .to_rgba8()
    }
}

/// Composite an RGBA surface over a solid background, discarding alpha.
pub fn flatten_onto(surface: &RgbaImage, background: Background) -> RgbImage {
    let mut flat = RgbImage::new(surface.width(), surface.height());
    for (src, dst) in surface.pixels().zip(flat.pixels_mut()) {
        let alpha = u32::from(src[3]);
        dst[0] = blend(src[0], background.r, alpha);
        dst[1] = blend(src[1], background.g, alpha);
        dst[2] = blend(src[2], background.b, alpha);
    }
    flat
}

#[inline]
fn blend(fg: u8, bg: u8, alpha: u32) -> u8 {
    ((u32::from(fg) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
}
