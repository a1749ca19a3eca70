//! Calendar snapshot: SVG from the screenshot endpoint -> JPEG (base64).

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use contracts::domain::a001_driver::Driver;
use contracts::usecases::u103_leave_notification::{ChatMedia, ScreenshotResponse};
use once_cell::sync::Lazy;
use resvg::{tiny_skia, usvg};
use thiserror::Error;

use crate::shared::api_client::{ApiError, LeaveApi};
use crate::shared::dates;
use crate::shared::format::sanitize_filename_part;

pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("{0}")]
    Unavailable(String),

    #[error("Snapshot payload missing SVG data.")]
    MissingSvg,

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Failed to decode snapshot image: {0}")]
    Decode(String),

    #[error("Snapshot image has invalid dimensions.")]
    InvalidDimensions,

    #[error("Unable to render snapshot: {0}")]
    Canvas(String),

    #[error("Failed to encode snapshot image: {0}")]
    Encode(String),

    #[error(transparent)]
    Transport(#[from] ApiError),
}

/// Снимок календаря, готовый к отправке
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotAttachment {
    pub base64_image: String,
    pub image_filename: String,
    pub snapshot_month: String,
    pub caption: String,
}

impl SnapshotAttachment {
    pub fn to_media(&self) -> ChatMedia {
        ChatMedia {
            mimetype: JPEG_MIME.to_string(),
            data: self.base64_image.clone(),
            filename: self.image_filename.clone(),
            caption: (!self.caption.is_empty()).then(|| self.caption.clone()),
        }
    }
}

static FONT_DB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

/// Raw SVG markup as a base64 data URL
pub fn svg_string_to_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// Ready data URL first, then raw markup
pub fn svg_payload_to_data_url(payload: &ScreenshotResponse) -> Result<String, SnapshotError> {
    if let Some(url) = payload.svg_data_url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(url.to_string());
    }
    if let Some(svg) = payload.svg.as_deref().filter(|s| !s.is_empty()) {
        return Ok(svg_string_to_data_url(svg));
    }
    Err(SnapshotError::MissingSvg)
}

/// Bytes of a `data:` URL (base64 or percent-encoded)
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, SnapshotError> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| SnapshotError::InvalidDataUrl("missing data: scheme".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| SnapshotError::InvalidDataUrl("missing payload".into()))?;

    if header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| SnapshotError::InvalidDataUrl(e.to_string()))
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

/// Растеризация SVG в JPEG на белом фоне, размер = натуральный размер SVG
pub fn svg_to_jpeg_base64(svg: &[u8], quality: u8) -> Result<String, SnapshotError> {
    let options = usvg::Options {
        fontdb: FONT_DB.clone(),
        ..usvg::Options::default()
    };
    let tree =
        usvg::Tree::from_data(svg, &options).map_err(|e| SnapshotError::Decode(e.to_string()))?;

    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    if width == 0 || height == 0 {
        return Err(SnapshotError::InvalidDimensions);
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| SnapshotError::Canvas(format!("cannot allocate {}x{} canvas", width, height)))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // opaque background: premultiplied RGBA equals straight RGBA
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let image = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| SnapshotError::Encode("pixel buffer size mismatch".into()))?;

    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&image)
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;

    if jpeg.is_empty() {
        return Err(SnapshotError::Encode("empty JPEG output".into()));
    }
    Ok(STANDARD.encode(jpeg))
}

/// fetchMonthSnapshotAsBase64
pub async fn fetch_month_snapshot_as_base64<A: LeaveApi + ?Sized>(
    api: &A,
    month: &str,
    quality: u8,
) -> Result<String, SnapshotError> {
    let payload = api.calendar_screenshot(month).await?;
    if !payload.ok {
        return Err(SnapshotError::Unavailable(
            payload
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Snapshot not available.".to_string()),
        ));
    }

    let data_url = svg_payload_to_data_url(&payload)?;
    let svg = decode_data_url(&data_url)?;

    tokio::task::spawn_blocking(move || svg_to_jpeg_base64(&svg, quality))
        .await
        .map_err(|e| SnapshotError::Canvas(e.to_string()))?
}

/// "Name (CATEGORY) 2024-03-05 - 2024-03-07"
pub fn build_snapshot_caption(driver: Option<&Driver>, applied: &[NaiveDate]) -> String {
    let range = dates::format_date_range_caption(applied);
    let Some(driver) = driver else {
        return range;
    };
    let name_source = if driver.display_name.is_empty() {
        &driver.driver_id
    } else {
        &driver.display_name
    };
    let name = match name_source.trim() {
        "" => "Driver",
        n => n,
    };
    let category = driver.category.trim();
    if category.is_empty() {
        format!("{} {}", name, range)
    } else {
        format!("{} ({}) {}", name, category, range)
    }
}

/// Вложение для уведомления; любая ошибка даёт None (отправка без вложения)
pub async fn build_snapshot_attachment<A: LeaveApi + ?Sized>(
    api: &A,
    applied: &[NaiveDate],
    driver: Option<&Driver>,
    quality: u8,
) -> Option<SnapshotAttachment> {
    let driver = driver?;
    let snapshot_month = dates::unique_months(applied).into_iter().next()?;

    match fetch_month_snapshot_as_base64(api, &snapshot_month, quality).await {
        Ok(base64_image) => {
            let driver_part = sanitize_filename_part(if driver.driver_id.is_empty() {
                &driver.display_name
            } else {
                &driver.driver_id
            });
            tracing::info!("Calendar snapshot ready for {}", snapshot_month);
            Some(SnapshotAttachment {
                base64_image,
                image_filename: format!("calendar-{}-{}.jpg", snapshot_month, driver_part),
                caption: build_snapshot_caption(Some(driver), applied),
                snapshot_month,
            })
        }
        Err(e) => {
            tracing::warn!(
                "Failed to get calendar snapshot for notification ({}): {}",
                snapshot_month,
                e
            );
            None
        }
    }
}
