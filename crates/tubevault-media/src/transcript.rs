//! Timed-text (`/api/timedtext`) XML parsing.

use serde::Deserialize;
use tubevault_models::TranscriptEntry;

/// `<transcript>` root
#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(rename = "text", default)]
    cues: Vec<Cue>,
}

/// One `<text start=".." dur="..">..</text>` cue
#[derive(Debug, Deserialize)]
struct Cue {
    #[serde(rename = "@start", default)]
    start: Option<String>,
    #[serde(rename = "@dur", default)]
    dur: Option<String>,
    #[serde(rename = "$text", default)]
    text: String,
}

/// Extract timed-text cues in document order.
///
/// The XML layer is unescaped by the reader, so `We&amp;#39;re` comes back as
/// `We&#39;re`. The HTML entities underneath are left for
/// [`tubevault_models::normalize_transcript`]. Cues without a parseable
/// `start` are skipped; a missing `dur` counts as zero.
pub fn parse_timed_text(xml: &str) -> Result<Vec<TranscriptEntry>, quick_xml::DeError> {
    let document: TimedText = quick_xml::de::from_str(xml)?;

    Ok(document
        .cues
        .into_iter()
        .filter_map(|cue| {
            let offset: f64 = cue.start.as_deref()?.trim().parse().ok()?;
            let duration: f64 = cue
                .dur
                .as_deref()
                .and_then(|d| d.trim().parse().ok())
                .unwrap_or(0.0);
            Some(TranscriptEntry::new(cue.text, offset, duration))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubevault_models::normalize_transcript;

    #[test]
    fn test_parses_cues_in_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.1">We&amp;#39;re no strangers</text>
<text start="2.6" dur="3">to love &amp;quot;you&amp;quot;
know the rules</text>
<text dur="1" start="5.6">and so do I</text>
</transcript>"#;

        let entries = parse_timed_text(xml).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].text, "We&#39;re no strangers");
        assert_eq!(entries[0].offset, 0.5);
        assert_eq!(entries[0].duration, 2.1);
        assert!(entries[1].text.contains('\n'));
        assert_eq!(entries[2].offset, 5.6);
        assert_eq!(entries[2].duration, 1.0);
    }

    #[test]
    fn test_timed_text_normalizes_to_plain_text() {
        let xml = r#"<transcript><text start="0" dur="1">We&amp;#39;re &amp;quot;no&amp;quot; strangers &amp;amp; friends</text><text start="1" dur="2">you know
the rules</text></transcript>"#;

        let entries = normalize_transcript(parse_timed_text(xml).unwrap());
        assert_eq!(entries[0].text, r#"We're "no" strangers & friends"#);
        assert_eq!(entries[1].text, "you know the rules");
    }

    #[test]
    fn test_skips_cues_without_start() {
        let xml = r#"<transcript><text dur="1">orphan</text><text start="1">no dur</text></transcript>"#;
        let entries = parse_timed_text(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "no dur");
        assert_eq!(entries[0].duration, 0.0);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_timed_text("<transcript></transcript>").unwrap().is_empty());
        assert!(parse_timed_text("<transcript/>").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document() {
        assert!(parse_timed_text("<transcript><text start=\"0\">open").is_err());
    }
}
