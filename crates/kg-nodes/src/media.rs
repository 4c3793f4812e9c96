//! Duration, MIME type and file size helpers for media cards.

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Extension fragments and their video MIME types, checked in order.
///
/// Storage backends may suffix extensions (`mp4-1`), so a fragment matches
/// anywhere in the extension. `mov` is served as mp4 for wider playback
/// support.
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("ogv", "video/ogg"),
    ("mov", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("avi", "video/x-msvideo"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
    ("3gp", "video/3gpp"),
    ("3g2", "video/3gpp2"),
];

/// MIME type of a video from its file name or URL.
pub fn video_mime_type(file_name: &str) -> Option<&'static str> {
    if file_name.is_empty() {
        return None;
    }
    let extension = file_name.rsplit('.').next().unwrap_or_default().to_lowercase();
    VIDEO_TYPES
        .iter()
        .find(|(fragment, _)| extension.contains(fragment))
        .map(|(_, mime)| *mime)
}

/// `m:ss` for a duration in seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Seconds in an `m:ss` duration. A missing seconds part counts as zero.
pub fn parse_duration(text: &str) -> Option<f64> {
    let mut parts = text.trim().splitn(2, ':');
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    let seconds: u32 = match parts.next() {
        Some(seconds) => seconds.trim().parse().ok()?,
        None => 0,
    };
    Some(f64::from(minutes * 60 + seconds))
}

/// Human-readable size such as `2 MB`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn bytes_to_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Byte".to_owned();
    }
    let bytes = bytes as f64;
    let exponent = (bytes.ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(SIZE_UNITS.len() - 1);
    let scaled = (bytes / 1024_f64.powi(exponent as i32)).round();
    format!("{scaled} {}", SIZE_UNITS[exponent])
}

/// Bytes in a size written by [`bytes_to_size`]. Unknown units give zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn size_to_bytes(size: &str) -> u64 {
    let mut parts = size.split(' ');
    let Some(number) = parts.next().and_then(|n| n.parse::<f64>().ok()) else {
        return 0;
    };
    let Some(exponent) = parts
        .next()
        .and_then(|unit| SIZE_UNITS.iter().position(|u| *u == unit))
    else {
        return 0;
    };
    (number * 1024_f64.powi(exponent as i32)).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_video_mime_type() {
        assert_eq!(video_mime_type("clip.MOV"), Some("video/mp4"));
        assert_eq!(video_mime_type("https://cdn.test/a.webm"), Some("video/webm"));
        assert_eq!(video_mime_type("a.mp4-1"), Some("video/mp4"));
        assert_eq!(video_mime_type("a.txt"), None);
        assert_eq!(video_mime_type(""), None);
    }

    #[test]
    fn test_durations() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.9), "1:05");
        assert_eq!(format_duration(3600.0), "60:00");
        assert_eq!(parse_duration("1:05"), Some(65.0));
        assert_eq!(parse_duration("2"), Some(120.0));
        assert_eq!(parse_duration("x:10"), None);
    }

    #[test]
    fn test_sizes() {
        assert_eq!(bytes_to_size(0), "0 Byte");
        assert_eq!(bytes_to_size(512), "512 Bytes");
        assert_eq!(bytes_to_size(2048), "2 KB");
        assert_eq!(bytes_to_size(1_572_864), "2 MB");
        assert_eq!(size_to_bytes("2 KB"), 2048);
        assert_eq!(size_to_bytes("1.5 MB"), 1_572_864);
        assert_eq!(size_to_bytes("12 parsecs"), 0);
        assert_eq!(size_to_bytes(""), 0);
    }
}
