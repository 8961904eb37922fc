//! # Localiser
//!
//! Finds the target in a conveyor camera image. The rest of the controller only relies on the
//! `Localiser` trait, so a learnt detector can replace the bright spot localiser without
//! touching the tracker.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::DynamicImage;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something that can find the target in an image.
pub trait Localiser {
    /// Pixel space estimate `(u, v)` of the target, where `u` is the column and `v` the row.
    ///
    /// When no target is visible both components are NaN.
    fn localise(&mut self, image: &DynamicImage) -> [f64; 2];
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Localises the target as the centroid of every pixel at least as bright as a threshold.
///
/// Works for a light object on a dark belt, which is how the conveyor cell is lit.
#[derive(Debug, Clone, Copy)]
pub struct BrightSpotLocaliser {
    /// Minimum luma value of a target pixel.
    pub threshold: u8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Localiser for BrightSpotLocaliser {
    fn localise(&mut self, image: &DynamicImage) -> [f64; 2] {
        let luma = image.to_luma8();

        let mut sum_u = 0f64;
        let mut sum_v = 0f64;
        let mut count = 0u64;

        for (u, v, pixel) in luma.enumerate_pixels() {
            if pixel[0] >= self.threshold {
                sum_u += u as f64;
                sum_v += v as f64;
                count += 1;
            }
        }

        if count == 0 {
            return [std::f64::NAN, std::f64::NAN];
        }

        [sum_u / count as f64, sum_v / count as f64]
    }
}

impl<F> Localiser for F
where
    F: FnMut(&DynamicImage) -> [f64; 2],
{
    fn localise(&mut self, image: &DynamicImage) -> [f64; 2] {
        self(image)
    }
}
