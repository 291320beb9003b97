use chrono::{DateTime, Duration, Utc};

/// 将时长格式化为 `1h2m3s` 形式，不足一秒返回 "just now"
pub fn format_duration(delta: Duration) -> String {
    let mut secs = delta.num_seconds();
    if secs <= 0 {
        return "just now".to_string();
    }

    let mut out = String::new();
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        let count = secs / size;
        if count > 0 {
            out.push_str(&format!("{}{}", count, unit));
            secs -= count * size;
        }
    }
    out
}

/// 距离某个时间点的可读描述，时间未知时返回 "always"
pub fn format_since(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match since {
        None => "always".to_string(),
        Some(t) => {
            let delta = now - t;
            if delta.num_seconds() <= 0 {
                "just now".to_string()
            } else {
                format!("{} ago", format_duration(delta))
            }
        }
    }
}
