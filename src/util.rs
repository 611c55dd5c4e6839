use std::time::Duration;

pub fn clicks_per_sec(clicks: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    match secs {
        positive if positive > 0.0 => clicks as f64 / positive,
        _ => 0.0,
    }
}

/// `12.3s` below a minute, `2m 05.0s` above.
pub fn format_secs(duration: Duration) -> String {
    let total = duration.as_secs_f64();
    if total < 60.0 {
        format!("{total:.1}s")
    } else {
        let minutes = (total / 60.0).floor();
        let secs = total - minutes * 60.0;
        format!("{}m {:04.1}s", minutes as u64, secs)
    }
}

/// Splits `total` into sleep slices no longer than `slice`.
pub fn sleep_slices(total: Duration, slice: Duration) -> impl Iterator<Item = Duration> {
    let slice = slice.max(Duration::from_millis(1));
    let mut remaining = total;
    std::iter::from_fn(move || {
        if remaining.is_zero() {
            return None;
        }
        let next = remaining.min(slice);
        remaining -= next;
        Some(next)
    })
}
