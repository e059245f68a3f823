//! SRT subtitle assembly from timed transcript segments.

use crate::models::transcript::TimedSegment;

/// Format seconds as an SRT timestamp, `HH:MM:SS,mmm`.
fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let total_ms = (seconds * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Build SRT content from segments, optionally substituting translated texts.
///
/// `texts`, when given, must be positionally aligned with `segments` (the
/// batch coordinator preserves order, so index i is segment i's translation).
pub fn build_srt(segments: &[&TimedSegment], texts: Option<&[String]>) -> String {
    let mut lines = Vec::with_capacity(segments.len() * 4);
    for (i, segment) in segments.iter().enumerate() {
        let text = match texts {
            Some(t) => t[i].trim(),
            None => segment.text.trim(),
        };
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            format_timestamp(segment.start),
            format_timestamp(segment.end)
        ));
        lines.push(text.to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}
