/// Image preprocessing for OCR
///
/// Turns the cropped nickname panel into a binary bitmap ready for
/// Tesseract. Every step uses fixed constants tuned for the lobby UI;
/// only the Otsu threshold adapts to the image.
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::error::NicknameError;

/// Upscale factor applied before anything else (small glyphs)
pub const SCALE_FACTOR: f32 = 2.5;
/// CLAHE clip limit, relative to the uniform histogram bin height
pub const CLAHE_CLIP_LIMIT: f32 = 3.0;
/// CLAHE tile grid (columns, rows)
pub const CLAHE_TILE_GRID: (u32, u32) = (8, 8);

/// Image preprocessor for OCR
///
/// Steps:
/// 1. Cubic upscale by `SCALE_FACTOR`
/// 2. Grayscale conversion
/// 3. Contrast-limited adaptive histogram equalization
/// 4. 3x3 Gaussian smoothing
/// 5. Otsu binarization
/// 6. Morphological close then open with a 2x2 window
#[derive(Debug, Default)]
pub struct ImagePreprocessor;

/// Output of the enhancer together with the threshold it chose
#[derive(Debug)]
pub struct ProcessedBitmap {
    pub image: GrayImage,
    pub threshold: u8,
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Convert the region into a two-level bitmap
    ///
    /// # Errors
    /// `PreprocessFailed` for zero-size input or an upscale that overflows
    pub fn preprocess(&self, region: &DynamicImage) -> Result<ProcessedBitmap, NicknameError> {
        let (width, height) = (region.width(), region.height());
        if width == 0 || height == 0 {
            return Err(NicknameError::PreprocessFailed(format!(
                "zero-size region ({}x{})",
                width, height
            )));
        }

        let scaled = self.upscale(&region.to_rgb8())?;
        let gray = self.rgb_to_grayscale(&scaled);
        let equalized = self.apply_clahe(&gray);
        let smoothed = self.gaussian_smooth(&equalized);

        let threshold = self.calculate_otsu_threshold(&smoothed);
        let binary = self.binarize(&smoothed, threshold);

        let closed = self.erode(&self.dilate(&binary));
        let opened = self.dilate(&self.erode(&closed));

        tracing::info!(
            "Processed bitmap: {}x{} (otsu threshold {})",
            opened.width(),
            opened.height(),
            threshold
        );

        Ok(ProcessedBitmap {
            image: opened,
            threshold,
        })
    }

    fn upscale(&self, image: &RgbImage) -> Result<RgbImage, NicknameError> {
        let new_width = (image.width() as f32 * SCALE_FACTOR) as u32;
        let new_height = (image.height() as f32 * SCALE_FACTOR) as u32;

        if new_width == 0 || new_height == 0 || new_width.checked_mul(new_height).is_none() {
            return Err(NicknameError::PreprocessFailed(format!(
                "cannot scale {}x{} by {}",
                image.width(),
                image.height(),
                SCALE_FACTOR
            )));
        }

        Ok(imageops::resize(image, new_width, new_height, FilterType::CatmullRom))
    }

    /// Luma conversion using integer arithmetic
    fn rgb_to_grayscale(&self, image: &RgbImage) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let pixel = image.get_pixel(x, y);
            // Fixed-point: (77*R + 150*G + 29*B) / 256
            let value = (77 * pixel[0] as u32 + 150 * pixel[1] as u32 + 29 * pixel[2] as u32) >> 8;
            Luma([value as u8])
        })
    }

    /// Contrast Limited Adaptive Histogram Equalization
    ///
    /// Each tile gets its own clipped-histogram lookup table; pixels are
    /// mapped by bilinear interpolation between the four nearest tile
    /// centers so tile borders don't show.
    fn apply_clahe(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        let tile_w = width.div_ceil(CLAHE_TILE_GRID.0.min(width));
        let tile_h = height.div_ceil(CLAHE_TILE_GRID.1.min(height));
        let tiles_x = width.div_ceil(tile_w) as usize;
        let tiles_y = height.div_ceil(tile_h) as usize;

        let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let x0 = tx as u32 * tile_w;
                let y0 = ty as u32 * tile_h;
                let x1 = (x0 + tile_w).min(width);
                let y1 = (y0 + tile_h).min(height);

                let mut histogram = [0u32; 256];
                for y in y0..y1 {
                    for x in x0..x1 {
                        histogram[gray.get_pixel(x, y)[0] as usize] += 1;
                    }
                }

                let area = (x1 - x0) * (y1 - y0);
                luts[ty * tiles_x + tx] = clipped_equalization_lut(&mut histogram, area);
            }
        }

        let mut output = GrayImage::new(width, height);
        for y in 0..height {
            let (ty0, ty1, wy) = interpolation_axis(y, tile_h, tiles_y);
            for x in 0..width {
                let (tx0, tx1, wx) = interpolation_axis(x, tile_w, tiles_x);
                let v = gray.get_pixel(x, y)[0] as usize;

                let top = luts[ty0 * tiles_x + tx0][v] as f32 * (1.0 - wx)
                    + luts[ty0 * tiles_x + tx1][v] as f32 * wx;
                let bottom = luts[ty1 * tiles_x + tx0][v] as f32 * (1.0 - wx)
                    + luts[ty1 * tiles_x + tx1][v] as f32 * wx;
                let value = top * (1.0 - wy) + bottom * wy;

                output.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
            }
        }

        output
    }

    /// Light 3x3 Gaussian smoothing (kernel 1-2-1), edges clamped
    ///
    /// 3x3 is the smallest kernel that changes the image; a 1x1 blur would
    /// pass it through untouched. Step edges soften by at most one pixel
    /// on each side.
    fn gaussian_smooth(&self, gray: &GrayImage) -> GrayImage {
        const KERNEL: [u32; 3] = [1, 2, 1];
        let (width, height) = gray.dimensions();

        GrayImage::from_fn(width, height, |x, y| {
            let mut sum = 0u32;
            for (ky, wy) in KERNEL.iter().enumerate() {
                let sy = (y as i64 + ky as i64 - 1).clamp(0, height as i64 - 1) as u32;
                for (kx, wx) in KERNEL.iter().enumerate() {
                    let sx = (x as i64 + kx as i64 - 1).clamp(0, width as i64 - 1) as u32;
                    sum += wy * wx * gray.get_pixel(sx, sy)[0] as u32;
                }
            }
            Luma([((sum + 8) / 16) as u8])
        })
    }

    /// Calculate optimal threshold using Otsu's method
    fn calculate_otsu_threshold(&self, gray: &GrayImage) -> u8 {
        // Build histogram
        let mut histogram = [0u32; 256];
        for pixel in gray.pixels() {
            histogram[pixel[0] as usize] += 1;
        }

        let total_pixels = gray.width() * gray.height();

        let mut sum = 0u64;
        for (i, count) in histogram.iter().enumerate() {
            sum += (i as u64) * (*count as u64);
        }

        let mut sum_background = 0u64;
        let mut weight_background = 0u32;
        let mut max_variance = 0.0;
        let mut threshold = 0u8;

        for (i, count) in histogram.iter().enumerate() {
            weight_background += count;
            if weight_background == 0 {
                continue;
            }

            let weight_foreground = total_pixels - weight_background;
            if weight_foreground == 0 {
                break;
            }

            sum_background += (i as u64) * (*count as u64);

            let mean_background = sum_background as f64 / weight_background as f64;
            let mean_foreground = (sum - sum_background) as f64 / weight_foreground as f64;

            // Maximizing between-class variance minimizes within-class variance
            let variance = (weight_background as f64)
                * (weight_foreground as f64)
                * (mean_background - mean_foreground).powi(2);

            if variance > max_variance {
                max_variance = variance;
                threshold = i as u8;
            }
        }

        threshold
    }

    /// Pixels strictly above the threshold become white
    fn binarize(&self, gray: &GrayImage, threshold: u8) -> GrayImage {
        let mut binary = gray.clone();
        for pixel in binary.pixels_mut() {
            pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
        }
        binary
    }

    /// 2x2 erosion: minimum over the pixel and its left/upper neighbours
    fn erode(&self, image: &GrayImage) -> GrayImage {
        morph_2x2(image, |a, b| a.min(b))
    }

    /// 2x2 dilation: maximum over the pixel and its left/upper neighbours
    fn dilate(&self, image: &GrayImage) -> GrayImage {
        morph_2x2(image, |a, b| a.max(b))
    }
}

/// Clip the histogram at the CLAHE limit, spread the excess evenly and
/// return the cumulative mapping for one tile.
fn clipped_equalization_lut(histogram: &mut [u32; 256], area: u32) -> [u8; 256] {
    let clip = ((CLAHE_CLIP_LIMIT * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let bonus = excess / 256;
    let residual = (excess % 256) as usize;
    for (i, count) in histogram.iter_mut().enumerate() {
        *count += bonus;
        if i < residual {
            *count += 1;
        }
    }

    let mut lut = [0u8; 256];
    let scale = 255.0 / area.max(1) as f32;
    let mut cumulative = 0u32;
    for (i, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[i] = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Neighbouring tile indices and blend weight for one coordinate
fn interpolation_axis(pos: u32, tile: u32, tiles: usize) -> (usize, usize, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }

    let i0 = f.floor() as usize;
    if i0 + 1 >= tiles {
        return (tiles - 1, tiles - 1, 0.0);
    }

    (i0, i0 + 1, f - i0 as f32)
}

/// Apply a 2x2 rank filter anchored at the bottom-right cell.
/// Out-of-bounds neighbours are ignored.
fn morph_2x2(image: &GrayImage, combine: impl Fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = image.dimensions();

    GrayImage::from_fn(width, height, |x, y| {
        let mut value = image.get_pixel(x, y)[0];
        if x > 0 {
            value = combine(value, image.get_pixel(x - 1, y)[0]);
        }
        if y > 0 {
            value = combine(value, image.get_pixel(x, y - 1)[0]);
        }
        if x > 0 && y > 0 {
            value = combine(value, image.get_pixel(x - 1, y - 1)[0]);
        }
        Luma([value])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn bimodal_gray(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Luma([50])
            } else {
                Luma([200])
            }
        })
    }

    #[test]
    fn test_preprocess_output_is_scaled_and_binary() {
        let preprocessor = ImagePreprocessor::new();
        let img = RgbImage::from_fn(40, 20, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgb([20, 20, 30])
            } else {
                Rgb([230, 220, 210])
            }
        });

        let bitmap = preprocessor
            .preprocess(&DynamicImage::ImageRgb8(img))
            .unwrap();

        assert_eq!(bitmap.image.dimensions(), (100, 50));
        assert!(bitmap.image.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let preprocessor = ImagePreprocessor::new();
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(30, 30, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
        }));

        let first = preprocessor.preprocess(&img).unwrap();
        let second = preprocessor.preprocess(&img).unwrap();
        assert_eq!(first.image, second.image);
        assert_eq!(first.threshold, second.threshold);
    }

    #[test]
    fn test_preprocess_zero_size_region() {
        let preprocessor = ImagePreprocessor::new();
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 10));

        assert!(matches!(
            preprocessor.preprocess(&img),
            Err(NicknameError::PreprocessFailed(_))
        ));
    }

    #[test]
    fn test_rgb_to_grayscale() {
        let preprocessor = ImagePreprocessor::new();

        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        img.put_pixel(2, 0, Rgb([0, 255, 0]));

        let gray = preprocessor.rgb_to_grayscale(&img);

        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
        // Green dominates luma: (150 * 255) >> 8
        assert_eq!(gray.get_pixel(2, 0)[0], 149);
    }

    #[test]
    fn test_calculate_otsu_threshold() {
        let preprocessor = ImagePreprocessor::new();
        let threshold = preprocessor.calculate_otsu_threshold(&bimodal_gray(100, 100));
        assert!(threshold >= 50 && threshold < 200);
    }

    #[test]
    fn test_binarize_splits_on_threshold() {
        let preprocessor = ImagePreprocessor::new();
        let gray = bimodal_gray(10, 2);
        let binary = preprocessor.binarize(&gray, 100);

        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(9, 0)[0], 255);
    }

    #[test]
    fn test_clahe_preserves_uniform_image() {
        let preprocessor = ImagePreprocessor::new();
        let gray = GrayImage::from_pixel(64, 64, Luma([120]));
        let equalized = preprocessor.apply_clahe(&gray);

        let first = equalized.get_pixel(0, 0)[0];
        assert!(equalized.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_clahe_stretches_low_contrast() {
        let preprocessor = ImagePreprocessor::new();
        let gray = GrayImage::from_fn(256, 256, |x, _| Luma([100 + (x % 2) as u8 * 10]));
        let equalized = preprocessor.apply_clahe(&gray);

        let min = equalized.pixels().map(|p| p[0]).min().unwrap();
        let max = equalized.pixels().map(|p| p[0]).max().unwrap();
        assert!(max - min > 10, "contrast should grow, got {}..{}", min, max);
    }

    #[test]
    fn test_clahe_tiny_image() {
        let preprocessor = ImagePreprocessor::new();
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 40 + y * 90) as u8]));
        let equalized = preprocessor.apply_clahe(&gray);
        assert_eq!(equalized.dimensions(), (3, 2));
    }

    #[test]
    fn test_gaussian_keeps_flat_regions() {
        let preprocessor = ImagePreprocessor::new();
        let gray = GrayImage::from_pixel(5, 5, Luma([77]));
        let smoothed = preprocessor.gaussian_smooth(&gray);
        assert!(smoothed.pixels().all(|p| p[0] == 77));
    }

    #[test]
    fn test_gaussian_softens_step_edge() {
        let preprocessor = ImagePreprocessor::new();
        let gray = GrayImage::from_fn(6, 3, |x, _| if x < 3 { Luma([0]) } else { Luma([160]) });
        let smoothed = preprocessor.gaussian_smooth(&gray);

        // Columns next to the edge blend (1-2-1 weights), the rest stay put
        let row: Vec<u8> = (0..6).map(|x| smoothed.get_pixel(x, 1)[0]).collect();
        assert_eq!(row, vec![0, 0, 40, 120, 160, 160]);
    }

    #[test]
    fn test_open_removes_isolated_speck() {
        let preprocessor = ImagePreprocessor::new();
        let mut binary = GrayImage::new(9, 9);
        binary.put_pixel(4, 4, Luma([255]));

        let opened = preprocessor.dilate(&preprocessor.erode(&binary));
        assert!(opened.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_close_fills_pinhole() {
        let preprocessor = ImagePreprocessor::new();
        let mut binary = GrayImage::from_pixel(9, 9, Luma([255]));
        binary.put_pixel(4, 4, Luma([0]));

        let closed = preprocessor.erode(&preprocessor.dilate(&binary));
        assert_eq!(closed.get_pixel(4, 4)[0], 255);
    }
}
