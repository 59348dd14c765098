use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

/// Local wall-clock time as `HH:MM`, the way the message list shows it.
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    let date = js_sys::Date::new(&(timestamp.timestamp_millis() as f64).into());
    format!("{:02}:{:02}", date.get_hours(), date.get_minutes())
}

pub fn debug_enabled(window: &web_sys::Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1")
        || search.contains("debug=true")
        || search.contains("log=1")
        || search.contains("log=true")
}
