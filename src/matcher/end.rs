use anyhow::Result;
use regex::Regex;

/// Farewell and dismissal phrases that close a conversation
pub const DEFAULT_END_PATTERNS: &[&str] = &[
    r"^안녕[\s.!~]*$",
    r"안녕히\s*(가|계세요|주무세요)",
    r"잘\s*(자|있어|가)",
    r"그만\s*(하자|할게|해|얘기하자)",
    r"^(그만|됐어|끝)[\s.!~]*$",
    r"다음에\s*(봐|또|얘기)",
    r"바이\s*바이",
    r"(?i)\b(good\s*bye|bye|stop listening)\b",
];

/// Detects explicit end-of-conversation phrases
#[derive(Debug, Clone)]
pub struct EndPhraseMatcher {
    patterns: Vec<Regex>,
}

impl EndPhraseMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Ok(Self {
            patterns: super::compile_patterns(patterns)?,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_END_PATTERNS)
    }

    /// True if any pattern matches the trimmed text
    pub fn is_end_phrase(&self, text: &str) -> bool {
        let normalized = text.trim();
        !normalized.is_empty() && self.patterns.iter().any(|p| p.is_match(normalized))
    }
}
