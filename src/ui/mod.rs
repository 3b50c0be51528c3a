//! Terminal rendering boundary. The controller owns all dashboard state;
//! this layer only reads it and maps key presses back to operations.

pub mod app;
pub use app::DashboardApp;

/// Format an integer with `.` thousands separators (es-CL convention).
pub fn format_count(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format an optional price as `$1234.56`, or a dash when absent.
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(price) => format!("${:.2}", price),
        None => "—".to_string(),
    }
}

/// Format an optional volume with separators, or a dash when absent.
pub fn format_volume(value: Option<f64>) -> String {
    match value {
        Some(volume) => format_count(volume.round() as i64),
        None => "—".to_string(),
    }
}
