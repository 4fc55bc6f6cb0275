//! Pair compositing: warp the first image into the second image's frame,
//! blend the two and crop away the empty border.

use image::RgbImage;
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use stitch_homography::Homography;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum ComposeError {
    SingularTransform,
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
    InvalidWeight(f32),
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComposeError::SingularTransform => write!(f, "Homography is not invertible"),
            ComposeError::DimensionMismatch { left, right } => write!(
                f,
                "Image dimensions differ: {}x{} vs {}x{}",
                left.0, left.1, right.0, right.1
            ),
            ComposeError::InvalidWeight(w) => {
                write!(f, "Invalid blend weight: {} (must be in [0, 1])", w)
            }
        }
    }
}

impl std::error::Error for ComposeError {}

pub type ComposeResult<T> = Result<T, ComposeError>;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompositorConfig {
    /// Weight of the warped image; the reference image gets `1 - blend_weight`
    pub blend_weight: f32,
    /// Pixels with luma above this count as content when cropping
    pub crop_threshold: u8,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            blend_weight: 0.5,
            crop_threshold: 1,
        }
    }
}

impl CompositorConfig {
    pub fn validate(&self) -> ComposeResult<()> {
        if !(0.0..=1.0).contains(&self.blend_weight) {
            return Err(ComposeError::InvalidWeight(self.blend_weight));
        }
        Ok(())
    }
}

/// Bilinear sample of all three channels, `None` outside the image.
fn bilinear_sample(img: &RgbImage, x: f64, y: f64) -> Option<[f64; 3]> {
    let (w, h) = img.dimensions();
    if !(x >= 0.0 && y >= 0.0 && x <= (w - 1) as f64 && y <= (h - 1) as f64) {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let dx = x - x0 as f64;
    let dy = y - y0 as f64;

    let (p00, p10) = (img.get_pixel(x0, y0), img.get_pixel(x1, y0));
    let (p01, p11) = (img.get_pixel(x0, y1), img.get_pixel(x1, y1));

    let mut out = [0.0; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - dx) + p10[c] as f64 * dx;
        let bottom = p01[c] as f64 * (1.0 - dx) + p11[c] as f64 * dx;
        *v = top * (1.0 - dy) + bottom * dy;
    }
    Some(out)
}

fn warp_with_inverse(src: &RgbImage, width: u32, height: u32, inv: &Matrix3<f64>) -> RgbImage {
    let mut out = RgbImage::new(width, height);
    if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
        return out;
    }

    let row_len = width as usize * 3;
    let buf: &mut [u8] = &mut out;
    buf.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        for x in 0..width as usize {
            let p = inv * Vector3::new(x as f64, y as f64, 1.0);
            if p.z.abs() < 1e-12 {
                continue;
            }
            if let Some(rgb) = bilinear_sample(src, p.x / p.z, p.y / p.z) {
                for c in 0..3 {
                    row[x * 3 + c] = rgb[c].round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    });
    out
}

/// Resample `a` into the frame of `b`.
///
/// The output has `b`'s dimensions. Each output pixel reads `a` at `H⁻¹·(x, y)`;
/// samples that fall outside `a` stay black.
pub fn warp(a: &RgbImage, b: &RgbImage, h: &Homography) -> ComposeResult<RgbImage> {
    let inv = h.inverse().ok_or(ComposeError::SingularTransform)?;
    Ok(warp_with_inverse(a, b.width(), b.height(), &inv))
}

/// Per-channel `round(weight·a + (1 - weight)·b)`.
pub fn blend(a: &RgbImage, b: &RgbImage, weight: f32) -> ComposeResult<RgbImage> {
    if a.dimensions() != b.dimensions() {
        return Err(ComposeError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }
    if !(0.0..=1.0).contains(&weight) {
        return Err(ComposeError::InvalidWeight(weight));
    }

    let mut out = b.clone();
    let buf: &mut [u8] = &mut out;
    buf.par_iter_mut().zip(a.as_raw().par_iter()).for_each(|(pb, &pa)| {
        *pb = (weight * pa as f32 + (1.0 - weight) * *pb as f32).round().clamp(0.0, 255.0) as u8;
    });
    Ok(out)
}

/// Bounding rectangle `(x, y, width, height)` of pixels with luma above `threshold`.
pub fn content_bounds(img: &RgbImage, threshold: u8) -> Option<(u32, u32, u32, u32)> {
    let luma = image::imageops::grayscale(img);
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in luma.enumerate_pixels() {
        if p[0] <= threshold {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Crop to the content rectangle; an image without content is returned as is.
pub fn crop(img: &RgbImage, threshold: u8) -> RgbImage {
    match content_bounds(img, threshold) {
        Some((x, y, w, h)) => image::imageops::crop_imm(img, x, y, w, h).to_image(),
        None => img.clone(),
    }
}

/// Warp, blend and crop with fixed settings.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    config: CompositorConfig,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> ComposeResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Composite of `a` (mapped through `h`) over `b`
    pub fn compose(&self, a: &RgbImage, b: &RgbImage, h: &Homography) -> ComposeResult<RgbImage> {
        let warped = warp(a, b, h)?;
        let blended = blend(&warped, b, self.config.blend_weight)?;
        let out = crop(&blended, self.config.crop_threshold);
        log::debug!(
            "compose: {}x{} onto {}x{} -> {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height(),
            out.width(),
            out.height()
        );
        Ok(out)
    }
}
