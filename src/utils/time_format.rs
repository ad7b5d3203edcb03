//! Second counts rendered as clock strings

/// Format seconds as `HH:MM:SS`
pub fn format_hms(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a track length as `MM:SS`, or `HH:MM:SS` once it passes an hour.
/// Missing or zero durations render as `00:00`.
pub fn format_duration_short(seconds: Option<u64>) -> String {
    let total = match seconds {
        Some(s) if s > 0 => s,
        _ => return "00:00".to_string(),
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_pads_every_field() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(3600), "01:00:00");
        assert_eq!(format_hms(3 * 3600 + 25 * 60 + 7), "03:25:07");
    }

    #[test]
    fn short_duration_drops_hours_when_zero() {
        assert_eq!(format_duration_short(None), "00:00");
        assert_eq!(format_duration_short(Some(0)), "00:00");
        assert_eq!(format_duration_short(Some(212)), "03:32");
        assert_eq!(format_duration_short(Some(3725)), "01:02:05");
    }
}
