use super::media::MediaHandle;
use crate::app_log;
use crate::error::{EditorError, EditorResult};
use crate::logger::LogLevel;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// One scrubber thumbnail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Source position the frame was taken from
    pub time: f64,
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
}

/// Size and quality of sampled thumbnails
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailSpec {
    pub count: usize,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            count: 10,
            width: 60,
            height: 80,
            quality: 60,
        }
    }
}

/// Evenly spaced sample positions across `[0, duration)`
pub fn sample_times(duration: f64, count: usize) -> Vec<f64> {
    if count == 0 || duration <= 0.0 {
        return Vec::new();
    }
    let step = duration / count as f64;
    (0..count).map(|i| i as f64 * step).collect()
}

/// Downscale a frame and encode it as a JPEG data URL
pub fn encode_thumbnail(frame: RgbaImage, spec: &ThumbnailSpec) -> EditorResult<String> {
    let scaled = DynamicImage::ImageRgba8(frame)
        .resize_exact(spec.width, spec.height, FilterType::Triangle)
        .to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, spec.quality.clamp(1, 100))
        .encode_image(&scaled)
        .map_err(|e| EditorError::ThumbnailCreationFailed(e.to_string()))?;

    let encoded = general_purpose::STANDARD.encode(&jpeg);
    Ok(format!("data:image/jpeg;base64,{}", encoded))
}

/// Sample `spec.count` frames from `media`.
///
/// Seeks are issued one at a time, each awaited before the next. The handle
/// is returned to position 0 afterwards, including when sampling fails.
pub async fn generate(
    media: &dyn MediaHandle,
    duration: f64,
    spec: &ThumbnailSpec,
) -> EditorResult<Vec<Thumbnail>> {
    let result = sample_serially(media, duration, spec).await;

    if let Err(e) = media.seek(0.0).await {
        app_log!(
            LogLevel::Warn,
            "timeline",
            "Failed to return to start after sampling: {}",
            e
        );
    }

    result
}

async fn sample_serially(
    media: &dyn MediaHandle,
    duration: f64,
    spec: &ThumbnailSpec,
) -> EditorResult<Vec<Thumbnail>> {
    let mut thumbnails = Vec::with_capacity(spec.count);
    for time in sample_times(duration, spec.count) {
        media.seek(time).await?;
        let frame = media.capture_frame().await?;
        thumbnails.push(Thumbnail {
            time,
            data_url: encode_thumbnail(frame, spec)?,
        });
    }
    Ok(thumbnails)
}
