//! Payload normalization applied before auxiliary artifacts are stored.
//!
//! - Transcript text: HTML entities decoded, newlines collapsed to single spaces
//! - Metadata duration: ISO-8601 (`PT1H2M3S`) rendered as `MM:SS`, with hours
//!   folded into the minutes field (`62:03`)

use crate::metadata::VideoMetadataRecord;
use crate::transcript::TranscriptEntry;

/// Longest entity body we try to decode (`&#x10FFFF;` fits).
const MAX_ENTITY_LEN: usize = 10;

/// Decode the HTML entities that appear in YouTube timed text.
///
/// Named entities `&amp; &quot; &#39; &apos; &lt; &gt; &nbsp;` and numeric
/// references (`&#NN;`, `&#xHH;`) are decoded in a single left-to-right pass,
/// so `&amp;quot;` becomes `&quot;` rather than `"`. Unknown entities are left
/// untouched.
pub fn decode_html_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= MAX_ENTITY_LEN)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(body: &str) -> Option<char> {
    match body {
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "nbsp" => Some(' '),
        _ => {
            let code = body.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Decode entities and collapse every run of line breaks into one space.
pub fn normalize_transcript_text(text: &str) -> String {
    let decoded = decode_html_entities(text);
    let mut out = String::with_capacity(decoded.len());
    let mut in_break = false;

    for c in decoded.chars() {
        if c == '\n' || c == '\r' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }

    out.trim().to_string()
}

/// Normalize every entry, preserving order.
pub fn normalize_transcript(entries: Vec<TranscriptEntry>) -> Vec<TranscriptEntry> {
    entries
        .into_iter()
        .map(|entry| TranscriptEntry {
            text: normalize_transcript_text(&entry.text),
            ..entry
        })
        .collect()
}

/// Render an ISO-8601 duration as `MM:SS`.
///
/// Days and hours are folded into minutes; fractional seconds are truncated.
/// Returns `None` for anything that is not a `P[nW][nD][T[nH][nM][nS]]` value.
pub fn format_iso8601_duration(iso: &str) -> Option<String> {
    let body = iso.trim().strip_prefix('P')?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut total_seconds: u64 = 0;

    for (value, unit) in duration_components(date_part)? {
        let factor = match unit {
            'W' => 7 * 86_400,
            'D' => 86_400,
            _ => return None,
        };
        total_seconds = add_component(total_seconds, value, factor)?;
    }

    if let Some(time) = time_part {
        if time.is_empty() {
            return None;
        }
        for (value, unit) in duration_components(time)? {
            let factor = match unit {
                'H' => 3_600,
                'M' => 60,
                'S' => 1,
                _ => return None,
            };
            total_seconds = add_component(total_seconds, value, factor)?;
        }
    }

    Some(format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60))
}

/// `total + value * factor`, or `None` once the result no longer fits in `u64`.
fn add_component(total: u64, value: f64, factor: u64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 || value >= u64::MAX as f64 {
        return None;
    }
    (value as u64).checked_mul(factor)?.checked_add(total)
}

/// Split `1H2M3.5S` into `[(1,'H'), (2,'M'), (3.5,'S')]`.
fn duration_components(part: &str) -> Option<Vec<(f64, char)>> {
    let mut components = Vec::new();
    let mut number = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            number.push(if c == ',' { '.' } else { c });
        } else {
            if number.is_empty() {
                return None;
            }
            let value: f64 = number.parse().ok()?;
            components.push((value.trunc(), c));
            number.clear();
        }
    }

    if !number.is_empty() {
        return None;
    }
    Some(components)
}

/// Apply duration formatting to a freshly fetched metadata record.
///
/// An unparseable duration is kept verbatim.
pub fn normalize_metadata(record: VideoMetadataRecord) -> VideoMetadataRecord {
    match format_iso8601_duration(&record.duration) {
        Some(duration) => VideoMetadataRecord { duration, ..record },
        None => record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_hours_fold_into_minutes() {
        assert_eq!(format_iso8601_duration("PT1H2M3S").as_deref(), Some("62:03"));
    }

    #[test]
    fn test_duration_seconds_only() {
        assert_eq!(format_iso8601_duration("PT45S").as_deref(), Some("00:45"));
    }

    #[test]
    fn test_duration_other_shapes() {
        assert_eq!(format_iso8601_duration("PT3M33S").as_deref(), Some("03:33"));
        assert_eq!(format_iso8601_duration("PT10M").as_deref(), Some("10:00"));
        assert_eq!(format_iso8601_duration("PT2H").as_deref(), Some("120:00"));
        assert_eq!(format_iso8601_duration("P1DT1M").as_deref(), Some("1441:00"));
        assert_eq!(format_iso8601_duration("P0D").as_deref(), Some("00:00"));
        assert_eq!(format_iso8601_duration("PT4.9S").as_deref(), Some("00:04"));
    }

    #[test]
    fn test_duration_rejects_garbage() {
        assert_eq!(format_iso8601_duration(""), None);
        assert_eq!(format_iso8601_duration("3:33"), None);
        assert_eq!(format_iso8601_duration("PT"), None);
        assert_eq!(format_iso8601_duration("PT5"), None);
        assert_eq!(format_iso8601_duration("PTM"), None);
        assert_eq!(format_iso8601_duration("PT1Y"), None);
    }

    #[test]
    fn test_oversized_duration_is_rejected() {
        assert_eq!(format_iso8601_duration("P99999999999999999999W"), None);
        assert_eq!(format_iso8601_duration("P30000000000000000W"), None);
        assert_eq!(format_iso8601_duration("PT18446744073709551615H"), None);
        assert_eq!(
            format_iso8601_duration("P30000000000000W").as_deref(),
            Some("302400000000000000:00")
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_html_entities("rock &amp; roll &quot;live&quot; it&#39;s"),
            "rock & roll \"live\" it's"
        );
        assert_eq!(decode_html_entities("&lt;b&gt; &#x41;&#66;"), "<b> AB");
        // Single pass only
        assert_eq!(decode_html_entities("&amp;quot;"), "&quot;");
        // Unknown or unterminated entities stay as they are
        assert_eq!(decode_html_entities("AT&T &bogus; & end"), "AT&T &bogus; & end");
    }

    #[test]
    fn test_transcript_text_normalization() {
        assert_eq!(
            normalize_transcript_text("we&#39;re no\nstrangers &amp; &quot;love&quot;"),
            "we're no strangers & \"love\""
        );
        assert_eq!(normalize_transcript_text("one\r\n\ntwo\n"), "one two");
    }

    #[test]
    fn test_normalize_transcript_keeps_order_and_timing() {
        let entries = vec![
            TranscriptEntry::new("first\nline", 0.0, 1.5),
            TranscriptEntry::new("second &amp; last", 1.5, 2.0),
        ];
        let normalized = normalize_transcript(entries);
        assert_eq!(normalized[0].text, "first line");
        assert_eq!(normalized[1].text, "second & last");
        assert_eq!(normalized[1].offset, 1.5);
        assert_eq!(normalized[1].duration, 2.0);
    }

    #[test]
    fn test_normalize_metadata_duration() {
        let record = VideoMetadataRecord {
            title: "t".to_string(),
            description: String::new(),
            caption_flag: false,
            duration: "PT1H2M3S".to_string(),
            thumbnail_url: None,
            channel_title: None,
        };
        assert_eq!(normalize_metadata(record.clone()).duration, "62:03");

        let odd = VideoMetadataRecord {
            duration: "live".to_string(),
            ..record
        };
        assert_eq!(normalize_metadata(odd.clone()).duration, "live");

        let huge = VideoMetadataRecord {
            duration: "P99999999999999999999W".to_string(),
            ..odd
        };
        assert_eq!(normalize_metadata(huge).duration, "P99999999999999999999W");
    }
}
