use std::time::Duration;

pub(crate) fn format_rate(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.0}")
    } else {
        "0".to_string()
    }
}

pub(crate) fn format_pct(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.1}%")
    } else {
        "0.0%".to_string()
    }
}

pub(crate) fn format_ms(v: u64) -> String {
    format!("{v}ms")
}

/// One rounded component: ms below a second, s otherwise.
pub(crate) fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1_000 {
        return format!("{}s", (ms + 500) / 1_000);
    }
    format!("{ms}ms")
}
