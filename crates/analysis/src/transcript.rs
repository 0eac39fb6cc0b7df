/// An immutable transcript plus the speech rate its duration is estimated from.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    text: String,
    char_count: usize,
    chars_per_minute: f64,
}

impl Transcript {
    pub fn new(text: impl Into<String>, chars_per_minute: f64) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        Self {
            text,
            char_count,
            chars_per_minute,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in Unicode scalar values, not bytes.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn chars_per_minute(&self) -> f64 {
        self.chars_per_minute
    }

    /// Estimated speaking time: character count / assumed speech rate.
    pub fn estimated_duration_minutes(&self) -> f64 {
        if self.chars_per_minute <= 0.0 {
            return 0.0;
        }
        self.char_count as f64 / self.chars_per_minute
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
