/// Region-of-interest selection
///
/// The lobby UI keeps the player list in a fixed panel on the right side of
/// the screen, so the region is derived purely from the image dimensions.
use image::DynamicImage;

use crate::error::NicknameError;

/// Left edge of the player panel as a fraction of image width
const ROI_LEFT: f64 = 0.65;
/// Top margin excluded from the region (fraction of height)
const ROI_TOP: f64 = 0.10;
/// Height of the region (fraction of height); leaves the bottom 10% out
const ROI_HEIGHT: f64 = 0.80;

/// Rectangular sub-region of a screenshot in absolute pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Compute the nickname panel region for an image of `width` x `height`
    ///
    /// # Errors
    /// `DegenerateImage` if either dimension is zero or the region would be empty
    pub fn for_dimensions(width: u32, height: u32) -> Result<Self, NicknameError> {
        let degenerate = || NicknameError::DegenerateImage { width, height };

        if width == 0 || height == 0 {
            return Err(degenerate());
        }

        let x = ((width as f64 * ROI_LEFT).round() as u32).min(width);
        let y = ((height as f64 * ROI_TOP).round() as u32).min(height);
        let region_height = ((height as f64 * ROI_HEIGHT).round() as u32).min(height - y);

        let region = Self {
            x,
            y,
            width: width - x,
            height: region_height,
        };

        if region.width == 0 || region.height == 0 {
            return Err(degenerate());
        }

        Ok(region)
    }

    /// Materialize the region as an independent image buffer
    pub fn extract(&self, image: &DynamicImage) -> DynamicImage {
        image.crop_imm(self.x, self.y, self.width, self.height)
    }
}

/// Select the nickname panel from a decoded screenshot
pub fn select_region(image: &DynamicImage) -> Result<(Region, DynamicImage), NicknameError> {
    let region = Region::for_dimensions(image.width(), image.height())?;

    tracing::info!(
        "ROI: x={} y={} size={}x{}",
        region.x,
        region.y,
        region.width,
        region.height
    );

    let cropped = region.extract(image);
    Ok((region, cropped))
}
