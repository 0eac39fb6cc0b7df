use std::collections::HashSet;

/// A single SRT cue.
#[derive(Debug, Clone)]
pub struct SrtEntry {
    pub start_secs: f64,
    /// Cue text with any "Speaker: " prefix removed.
    pub text: String,
}

/// Parses SRT content, deduplicates by (start_time, text), and sorts by time.
///
/// Malformed cues are skipped.
pub fn parse_srt(content: &str) -> Vec<SrtEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let Some(index_line) = lines.next() else {
            break;
        };
        if index_line.trim().trim_start_matches('\u{feff}').parse::<usize>().is_err() {
            continue;
        }

        // "HH:MM:SS,mmm --> HH:MM:SS,mmm"
        let Some(ts_line) = lines.next() else {
            break;
        };
        let Some(start_secs) = parse_start_time(ts_line.trim()) else {
            continue;
        };

        let mut text_parts = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            text_parts.push(line.trim());
        }

        entries.push(SrtEntry {
            start_secs,
            text: strip_speaker(&text_parts.join(" ")).to_string(),
        });
    }

    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(((e.start_secs * 1000.0).round() as i64, e.text.clone())));
    entries.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
    entries
}

/// Drops a leading "Speaker: " label.
fn strip_speaker(text: &str) -> &str {
    match text.split_once(": ") {
        Some((label, rest)) if label.chars().count() < 50 && !label.contains("  ") => rest,
        _ => text,
    }
}

/// Start of "00:00:02,965 --> 00:00:04,277"; the end must parse too.
fn parse_start_time(line: &str) -> Option<f64> {
    let (start, end) = line.split_once("-->")?;
    parse_srt_time(end.trim())?;
    parse_srt_time(start.trim())
}

/// Parses "HH:MM:SS,mmm" (or with a dot) to seconds.
fn parse_srt_time(s: &str) -> Option<f64> {
    let s = s.replace(',', ".");
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_srt_time() {
        assert!((parse_srt_time("00:00:02,965").unwrap() - 2.965).abs() < 0.001);
        assert!((parse_srt_time("01:00:00.000").unwrap() - 3600.0).abs() < 0.001);
        assert!(parse_srt_time("00:02,965").is_none());
    }

    #[test]
    fn test_parse_dedup_and_sort() {
        let content = "2\n00:00:05,000 --> 00:00:06,000\nHost: um, welcome\n\n\
                       1\n00:00:01,000 --> 00:00:02,000\nえー、始めます\n\n\
                       3\n00:00:05,000 --> 00:00:06,000\nHost: um, welcome\n";
        let texts: Vec<String> = parse_srt(content).into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["えー、始めます", "um, welcome"]);
    }

    #[test]
    fn test_malformed_cue_skipped() {
        let content = "1\nnot a timestamp\nlost\n\n2\n00:00:01,000 --> 00:00:02,000\nkept\n";
        let texts: Vec<String> = parse_srt(content).into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["kept"]);
    }
}
