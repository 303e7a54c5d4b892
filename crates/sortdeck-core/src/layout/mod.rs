//! Slide layout: fit an image inside a bounding box and center it on the slide.
//!
//! All lengths are `f64` inches. The deck writer converts to EMUs with
//! [`inches_to_emu`] when it serializes a [`Placement`].

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// English Metric Units per inch (OOXML drawing unit).
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Convert inches to whole EMUs, rounding to nearest.
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Pixel size of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// The largest area an image may occupy on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub max_width: f64,
    pub max_height: f64,
}

impl BoundingBox {
    pub fn new(max_width: f64, max_height: f64) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

/// Full slide size; must contain the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}

impl SlideSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Where an image is drawn on its slide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl Placement {
    /// `(x, y, cx, cy)` in EMUs, the order DrawingML's `a:off`/`a:ext` use.
    pub fn to_emu(&self) -> (i64, i64, i64, i64) {
        (
            inches_to_emu(self.left),
            inches_to_emu(self.top),
            inches_to_emu(self.width),
            inches_to_emu(self.height),
        )
    }
}

/// Compute an aspect-preserving, centered placement.
///
/// Landscape images (aspect > 1) are first fitted to the box width, everything
/// else to the box height. If that overflows the other dimension both sides
/// are rescaled by the same factor so the image fits on both axes. The result
/// is centered on the whole slide, not just the box.
pub fn compute_placement(
    image: ImageDimensions,
    bbox: BoundingBox,
    slide: SlideSize,
) -> Result<Placement, LayoutError> {
    check_inputs(image, bbox, slide)?;

    let aspect = image.aspect();
    let (width, height) = if aspect > 1.0 {
        let width = bbox.max_width;
        let height = width / aspect;
        if height > bbox.max_height {
            (bbox.max_height * aspect, bbox.max_height)
        } else {
            (width, height)
        }
    } else {
        let height = bbox.max_height;
        let width = height * aspect;
        if width > bbox.max_width {
            (bbox.max_width, bbox.max_width / aspect)
        } else {
            (width, height)
        }
    };

    Ok(Placement {
        width,
        height,
        left: (slide.width - width) / 2.0,
        top: (slide.height - height) / 2.0,
    })
}

fn check_inputs(
    image: ImageDimensions,
    bbox: BoundingBox,
    slide: SlideSize,
) -> Result<(), LayoutError> {
    let invalid = |message: String| Err(LayoutError::InvalidDimensions { message });

    if image.width == 0 || image.height == 0 {
        return invalid(format!(
            "image must have positive pixel size, got {}x{}",
            image.width, image.height
        ));
    }
    for (name, value) in [
        ("box width", bbox.max_width),
        ("box height", bbox.max_height),
        ("slide width", slide.width),
        ("slide height", slide.height),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return invalid(format!("{name} must be positive, got {value}"));
        }
    }
    if slide.width < bbox.max_width || slide.height < bbox.max_height {
        return invalid(format!(
            "slide {}x{} is smaller than box {}x{}",
            slide.width, slide.height, bbox.max_width, bbox.max_height
        ));
    }
    Ok(())
}
