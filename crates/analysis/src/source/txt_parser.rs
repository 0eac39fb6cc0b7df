//! Speaker/timestamp transcript blocks:
//!
//! ```text
//! SPK_N
//! M:SS
//! Transcript text here.
//!
//! ```

/// Whether `content` uses speaker/timestamp blocks rather than plain prose.
pub fn is_speaker_format(content: &str) -> bool {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    matches!(
        (lines.next(), lines.next()),
        (Some(speaker), Some(ts)) if speaker.starts_with("SPK_") && parse_mm_ss(ts).is_some()
    )
}

/// Parses speaker/timestamp blocks separated by blank lines, returning the
/// text of each turn in file order.
///
/// Malformed blocks are skipped.
pub fn parse_txt(content: &str) -> Vec<String> {
    let mut turns = Vec::new();
    let mut lines = content.lines().peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        match lines.next() {
            Some(l) if l.trim().starts_with("SPK_") => {}
            Some(_) => continue,
            None => break,
        }

        if lines.next().and_then(|l| parse_mm_ss(l.trim())).is_none() {
            continue;
        }

        let mut text_parts = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty() && !l.trim().starts_with("SPK_")) {
            text_parts.push(line.trim());
        }

        if !text_parts.is_empty() {
            turns.push(text_parts.join(" "));
        }
    }

    turns
}

/// Parses "M:SS" to seconds (e.g. "1:06" -> 66.0, "25:07" -> 1507.0).
fn parse_mm_ss(s: &str) -> Option<f64> {
    let (minutes, seconds) = s.split_once(':')?;
    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    Some(minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mm_ss() {
        assert!((parse_mm_ss("0:00").unwrap() - 0.0).abs() < 0.001);
        assert!((parse_mm_ss("1:06").unwrap() - 66.0).abs() < 0.001);
        assert!((parse_mm_ss("25:07").unwrap() - 1507.0).abs() < 0.001);
        assert!(parse_mm_ss("1:2:3").is_none());
    }

    #[test]
    fn test_parse_txt_format() {
        let turns = parse_txt("SPK_1\n0:00\nえー、こんにちは。\n\nSPK_2\n0:05\nあの、よろしく\nお願いします。\n");
        assert_eq!(turns, vec!["えー、こんにちは。", "あの、よろしく お願いします。"]);
    }

    #[test]
    fn test_block_without_timestamp_skipped() {
        let turns = parse_txt("SPK_1\nnope\nlost\n\nSPK_2\n0:05\nkept\n");
        assert_eq!(turns, vec!["kept"]);
    }

    #[test]
    fn test_detects_format() {
        assert!(is_speaker_format("\nSPK_1\n0:00\nHello.\n"));
        assert!(!is_speaker_format("Um, so today I want to talk about..."));
        assert!(!is_speaker_format(""));
    }
}
