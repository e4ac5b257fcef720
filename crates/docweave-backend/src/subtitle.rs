//! Subtitle backend (SRT and WebVTT)
//!
//! Every cue becomes one `subtitle` item whose `start`/`end` metadata hold
//! `HH:MM:SS,mmm` timestamps, whichever of the two formats the input uses.
//! WebVTT voice tags (`<v Speaker>`) are recorded as `speaker` metadata and
//! all other cue markup is stripped.

use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static VTT_TIMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})[ \t]+-->[ \t]+(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})",
    )
    .expect("static VTT timing regex is valid")
});

static VTT_VOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<v(?:\.[\w.-]+)?\s+([^>]+)>").expect("static VTT voice regex is valid"));

static CUE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("static cue tag regex is valid"));

/// A parsed subtitle cue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SubtitleEntry {
    start_time: Duration,
    end_time: Duration,
    text: String,
    speaker: Option<String>,
}

/// Subtitle backend for SRT and WebVTT tracks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SubtitleBackend;

impl SubtitleBackend {
    /// Create a new subtitle backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    /// Format a duration as SRT timestamp (HH:MM:SS,mmm)
    fn format_timestamp(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let millis = duration.subsec_millis();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
    }

    /// `h:m:s.ms` as a duration; `None` when the total does not fit in `u64` milliseconds.
    fn cue_time(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Duration> {
        let secs = hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(seconds)?;
        secs.checked_mul(1000)?
            .checked_add(millis)
            .map(Duration::from_millis)
    }

    fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>> {
        let mut normalized = content.replace("\r\n", "\n");
        if !normalized.ends_with('\n') {
            normalized.push('\n');
        }
        let parsed = srtparse::from_str(&normalized)
            .map_err(|e| DocweaveError::BackendError(format!("SRT parsing failed: {e}")))?;

        Ok(parsed
            .iter()
            .filter_map(|sub| {
                let time = |t: &srtparse::Time| Self::cue_time(t.hours, t.minutes, t.seconds, t.milliseconds);
                let (Some(start_time), Some(end_time)) = (time(&sub.start_time), time(&sub.end_time))
                else {
                    log::warn!("Dropping SRT cue {} with out-of-range timestamp", sub.pos);
                    return None;
                };
                Some(SubtitleEntry {
                    start_time,
                    end_time,
                    text: sub.text.trim().to_string(),
                    speaker: None,
                })
            })
            .collect())
    }

    fn vtt_time(caps: &regex::Captures<'_>, first: usize) -> Option<Duration> {
        let field = |i: usize| -> Option<u64> {
            caps.get(first + i).map_or(Some(0), |m| m.as_str().parse().ok())
        };
        Self::cue_time(field(0)?, field(1)?, field(2)?, field(3)?)
    }

    fn parse_vtt(content: &str) -> Vec<SubtitleEntry> {
        let normalized = content.replace("\r\n", "\n");
        let mut entries = Vec::new();

        for block in normalized.split("\n\n") {
            let mut lines = block.lines().skip_while(|l| l.trim().is_empty());
            let mut timing = None;
            // the optional cue identifier precedes the timing line
            for line in lines.by_ref().take(2) {
                if let Some(caps) = VTT_TIMING.captures(line.trim()) {
                    timing = Self::vtt_time(&caps, 1).zip(Self::vtt_time(&caps, 5));
                    if timing.is_none() {
                        log::warn!("Dropping WebVTT cue with out-of-range timestamp: {line}");
                    }
                    break;
                }
            }
            let Some((start_time, end_time)) = timing else {
                continue;
            };

            let raw: Vec<&str> = lines.collect();
            let raw = raw.join("\n");
            let speaker = VTT_VOICE
                .captures(&raw)
                .map(|caps| caps[1].trim().to_string());
            let text = CUE_TAG.replace_all(&raw, "").trim().to_string();
            if text.is_empty() {
                continue;
            }
            entries.push(SubtitleEntry {
                start_time,
                end_time,
                text,
                speaker,
            });
        }
        entries
    }

    fn create_docitems(entries: &[SubtitleEntry]) -> Vec<DocItem> {
        entries
            .iter()
            .map(|entry| {
                let item = DocItem::subtitle(
                    entry.text.clone(),
                    &Self::format_timestamp(entry.start_time),
                    &Self::format_timestamp(entry.end_time),
                );
                match &entry.speaker {
                    Some(speaker) => item.with_metadata("speaker", speaker.clone()),
                    None => item,
                }
            })
            .collect()
    }
}

impl DocumentBackend for SubtitleBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Subtitle]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        std::str::from_utf8(input.data).is_ok() && input.text().contains("-->")
    }

    fn convert(&self, input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
        let text = input.text();
        let is_vtt = text.trim_start().starts_with("WEBVTT");
        let entries = if is_vtt {
            Self::parse_vtt(&text)
        } else {
            Self::parse_srt(&text)?
        };
        log::debug!(
            "Parsed {} {} cues",
            entries.len(),
            if is_vtt { "WebVTT" } else { "SRT" }
        );

        let duration = entries.iter().map(|e| e.end_time).max().unwrap_or_default();
        let metadata = DocumentMetadata::new(input.display_name(), InputFormat::Subtitle)
            .with_title(input.file_stem())
            .with_extra("subtitle_format", if is_vtt { "vtt" } else { "srt" })
            .with_extra("num_cues", entries.len())
            .with_extra("duration", Self::format_timestamp(duration));
        Ok(Document::new(metadata, Self::create_docitems(&entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(text: &str, name: &str) -> Document {
        let input = BackendInput::new(text.as_bytes(), InputFormat::Subtitle).with_filename(Some(name));
        SubtitleBackend::new()
            .convert(&input, &BackendOptions::default())
            .unwrap()
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(SubtitleBackend::format_timestamp(Duration::from_millis(0)), "00:00:00,000");
        assert_eq!(
            SubtitleBackend::format_timestamp(Duration::from_millis(3_723_456)),
            "01:02:03,456"
        );
    }

    #[test]
    fn test_srt_cues() {
        let doc = convert(
            "1\n00:00:01,000 --> 00:00:02,500\nHello there\n\n2\n00:00:03,000 --> 00:00:04,000\nSecond\nline\n",
            "talk.srt",
        );
        assert_eq!(doc.content.len(), 2);
        assert_eq!(doc.content[0], DocItem::subtitle("Hello there", "00:00:01,000", "00:00:02,500"));
        let second = doc.content[1].text().unwrap();
        assert!(second.starts_with("Second") && second.ends_with("line"), "got: {second}");
        assert_eq!(doc.metadata.title.as_deref(), Some("talk"));
        assert_eq!(doc.metadata.extra["subtitle_format"].as_str(), Some("srt"));
        assert_eq!(doc.metadata.extra["duration"].as_str(), Some("00:00:04,000"));
    }

    #[test]
    fn test_cue_time_overflow_is_rejected() {
        assert_eq!(
            SubtitleBackend::cue_time(1, 2, 3, 456),
            Some(Duration::from_millis(3_723_456))
        );
        assert_eq!(SubtitleBackend::cue_time(999_999_999_999_999_999, 0, 0, 0), None);
        assert_eq!(SubtitleBackend::cue_time(0, 0, u64::MAX / 1000, 999), None);
    }

    #[test]
    fn test_vtt_absurd_hours_drop_cue() {
        let vtt = "WEBVTT\n\n999999999999999999:00:00.000 --> 999999999999999999:00:01.000\nNever\n\n00:01.000 --> 00:02.000\nKept\n";
        let doc = convert(vtt, "huge.vtt");
        assert_eq!(doc.content, vec![DocItem::subtitle("Kept", "00:00:01,000", "00:00:02,000")]);
    }

    #[test]
    fn test_vtt_cues_with_identifiers_and_voices() {
        let vtt = "WEBVTT - demo\n\nNOTE a comment\n\nintro\n00:00.500 --> 00:02.000 align:start\n<v Roger Bingham>We are in <i>New York</i>\n\n01:00:00.000 --> 01:00:01.250\nLater\n";
        let doc = convert(vtt, "demo.vtt");
        assert_eq!(doc.content.len(), 2, "NOTE block is not a cue");

        let first = &doc.content[0];
        assert_eq!(first.text(), Some("We are in New York"));
        assert_eq!(first.metadata_value("start").and_then(|v| v.as_str()), Some("00:00:00,500"));
        assert_eq!(
            first.metadata_value("speaker").and_then(|v| v.as_str()),
            Some("Roger Bingham")
        );
        assert_eq!(
            doc.content[1].metadata_value("end").and_then(|v| v.as_str()),
            Some("01:00:01,250")
        );
        assert_eq!(doc.metadata.extra["num_cues"].as_i64(), Some(2));
    }

    #[test]
    fn test_crlf_srt() {
        let doc = convert("1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n", "a.srt");
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].text(), Some("Hi"));
    }

    #[test]
    fn test_is_valid_requires_arrow() {
        let input = BackendInput::new(b"just text", InputFormat::Subtitle);
        assert!(!SubtitleBackend.is_valid(&input));
    }
}
