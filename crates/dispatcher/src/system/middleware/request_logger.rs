use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use chrono_tz::Tz;
use once_cell::sync::OnceCell;

use crate::shared::dates::{parse_timezone, DEFAULT_TIMEZONE};
use crate::shared::format::format_number;

static LOG_TIMEZONE: OnceCell<Tz> = OnceCell::new();

/// Часовой пояс для времени в логе запросов (один раз при старте)
pub fn set_timezone(tz: Tz) {
    if LOG_TIMEZONE.set(tz).is_err() {
        tracing::warn!("Request log timezone already set");
    }
}

fn log_timezone() -> Tz {
    *LOG_TIMEZONE.get_or_init(|| parse_timezone(DEFAULT_TIMEZONE))
}

/// Middleware для логирования HTTP запросов
///
/// Prints time (dispatcher timezone), duration, response size, status,
/// method and path.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();
    let timestamp = Utc::now().with_timezone(&log_timezone());

    // Читаем тело ответа, чтобы узнать реальный размер
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(_) => {
            println!(
                "\x1b[33m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
                timestamp.format("%H:%M:%S"),
                start.elapsed().as_millis(),
                "error",
                parts.status.as_u16(),
                method,
                uri.path()
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    // голубой для 2xx, коричневый для остальных
    let color_code = if parts.status.is_success() { "36" } else { "33" };

    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
        color_code,
        timestamp.format("%H:%M:%S"),
        start.elapsed().as_millis(),
        format_number(bytes.len()),
        parts.status.as_u16(),
        method,
        uri.path()
    );

    Response::from_parts(parts, Body::from(bytes))
}
