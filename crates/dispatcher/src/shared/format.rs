/// Форматирует число с разделителями тысяч (точками)
///
/// # Примеры
/// ```
/// use dispatcher::shared::format::format_number;
/// assert_eq!(format_number(1234567), "1.234.567");
/// assert_eq!(format_number(42), "42");
/// ```
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Безопасная часть имени файла: всё кроме `[A-Za-z0-9_.-]` заменяется на `_`
pub fn sanitize_filename_part(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "file".to_string();
    }
    let mut clean = String::with_capacity(trimmed.len());
    let mut in_run = false;
    for ch in trimmed.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || ch == '-' {
            clean.push(ch);
            in_run = false;
        } else if !in_run {
            clean.push('_');
            in_run = true;
        }
    }
    clean
}
