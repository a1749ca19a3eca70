use serde::{Deserialize, Serialize};

/// GET calendar_screenshot?month
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenshotResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Готовый data URL (`data:image/svg+xml;...`)
    #[serde(default, rename = "svgDataUrl")]
    pub svg_data_url: Option<String>,
    /// Сырая SVG-разметка
    #[serde(default)]
    pub svg: Option<String>,
}
