//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_nanoseconds, DateTime, Utc};
use image::{DynamicImage, ImageResult};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An individual frame from the conveyor camera, as sent over the network.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SensorFrame {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_nanoseconds")]
    pub timestamp: DateTime<Utc>,

    /// The format of this frame
    pub format: ImageFormat,

    /// The formatted image data, encoded in base64
    pub b64_data: String,
}

/// A decoded camera frame.
#[derive(Clone)]
pub struct SensorImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: DynamicImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible formats for camera images. This is used rather than image::ImageFormat to:
///     1. Restrict the formats that can be sent back and forth
///     2. Allow serialisation as image::ImageFormat does not implement serde.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub enum ImageFormat {
    /// PNG image
    Png,

    /// JPEG image with a quality value between 1 and 100, where 100 is best.
    Jpeg(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum CamError {
    #[error("Failed to decode the frame data from base64: {0}")]
    Base64DecodeError(base64::DecodeError),

    #[error("Failed to decode the frame image: {0}")]
    ImageDecodeError(image::ImageError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensorFrame {
    /// Decode this frame into an image.
    pub fn to_sensor_image(&self) -> Result<SensorImage, CamError> {
        let bytes = base64::decode(&self.b64_data).map_err(CamError::Base64DecodeError)?;

        let format = match self.format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg(_) => image::ImageFormat::Jpeg,
        };

        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(CamError::ImageDecodeError)?;

        Ok(SensorImage {
            timestamp: self.timestamp,
            image,
        })
    }
}

impl SensorImage {
    /// Encode this image into a frame with the given format
    pub fn to_sensor_frame(&self, format: ImageFormat) -> ImageResult<SensorFrame> {
        let mut data = Vec::<u8>::new();

        let output_format = match format {
            ImageFormat::Png => image::ImageOutputFormat::Png,
            ImageFormat::Jpeg(q) => image::ImageOutputFormat::Jpeg(q),
        };

        self.image.write_to(&mut data, output_format)?;

        Ok(SensorFrame {
            timestamp: self.timestamp,
            format,
            b64_data: base64::encode(&data),
        })
    }
}
