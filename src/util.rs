use chrono::{DateTime, Datelike, Utc};

pub fn format_post_age(timestamp_ms: f64, now: DateTime<Utc>) -> String {
    let Some(posted) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64) else {
        return String::new();
    };

    let seconds = (now - posted).num_seconds();
    match seconds {
        i64::MIN..=4 => "now".to_owned(),
        5..=59 => format!("{seconds}s"),
        60..=3_599 => format!("{}m", seconds / 60),
        3_600..=86_399 => format!("{}h", seconds / 3_600),
        86_400..=604_799 => format!("{}d", seconds / 86_400),
        _ if posted.year() == now.year() => posted.format("%b %-d").to_string(),
        _ => posted.format("%b %-d, %Y").to_string(),
    }
}

pub fn display_handle(handle: &str) -> String {
    format!("@{}", handle.trim().trim_start_matches('@'))
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }
    let mut truncated = label.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    truncated.push('…');
    truncated
}
