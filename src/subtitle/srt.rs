// SRT subtitle format
use super::{CaptionCue, SubtitleFormatter};

pub struct SrtFormatter;

impl SubtitleFormatter for SrtFormatter {
    fn format(&self, cues: &[CaptionCue]) -> String {
        cues.iter()
            .enumerate()
            .map(|(i, cue)| {
                format!(
                    "{}\n{} --> {}\n{}\n",
                    i + 1,
                    format_timestamp(cue.start),
                    format_timestamp(cue.end),
                    cue.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn extension(&self) -> &'static str {
        "srt"
    }
}

/// Render seconds as `HH:MM:SS,mmm`. Every unit is truncated, never rounded.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

    let hours = (seconds / 3600.0).floor();
    let remainder = seconds - hours * 3600.0;
    let minutes = (remainder / 60.0).floor();
    let remainder = remainder - minutes * 60.0;
    let secs = remainder.floor();
    let millis = ((remainder - secs) * 1000.0).floor();

    format!(
        "{:02}:{:02}:{:02},{:03}",
        hours as u64, minutes as u64, secs as u64, millis as u64
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64, end: f64, text: &str) -> CaptionCue {
        CaptionCue {
            start,
            end,
            text: text.to_string(),
            word_confidences: Vec::new(),
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(1.5), "00:00:01,500");
        assert_eq!(format_timestamp(3661.2345), "01:01:01,234");
    }

    #[test]
    fn test_format_timestamp_truncates() {
        assert_eq!(format_timestamp(59.9999), "00:00:59,999");
        assert_eq!(format_timestamp(0.0015), "00:00:00,001");
    }

    #[test]
    fn test_format_timestamp_long_media() {
        assert_eq!(format_timestamp(360000.0), "100:00:00,000");
        assert_eq!(format_timestamp(-2.0), "00:00:00,000");
    }

    #[test]
    fn test_srt_format() {
        let cues = vec![
            cue(1.5, 4.0, "Hello, world!"),
            cue(4.5, 7.0, "This is a test."),
        ];

        let output = SrtFormatter.format(&cues);

        assert_eq!(
            output,
            "1\n00:00:01,500 --> 00:00:04,000\nHello, world!\n\n\
             2\n00:00:04,500 --> 00:00:07,000\nThis is a test.\n"
        );
    }

    #[test]
    fn test_srt_format_empty() {
        assert_eq!(SrtFormatter.format(&[]), "");
    }
}
