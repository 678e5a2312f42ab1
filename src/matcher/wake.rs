use anyhow::Result;
use regex::Regex;
use tracing::debug;

/// Wake phrase variants in priority order.
///
/// Includes spellings the Samsung recognizer tends to produce. The last entry
/// catches a bare "비비" at the end of the utterance.
pub const DEFAULT_WAKE_PATTERNS: &[&str] = &[
    "비비야", "비비아", "베비야", "베베야",
    "비비얌", "비비요", "삐삐야", "베비아",
    "비비 야", "비비 아",
    "BB야", "bb야", "비 비야", "비 비아",
    "빼비야", "뻬비야", "피비야", "피피야",
    "비비$",
];

/// Result of a successful wake phrase match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeMatch {
    /// Index of the pattern that matched
    pub pattern_index: usize,

    /// Trimmed text following the wake phrase (may be empty)
    pub command: String,
}

/// Detects the wake phrase in recognizer output
#[derive(Debug, Clone)]
pub struct WakePhraseMatcher {
    patterns: Vec<Regex>,
}

impl WakePhraseMatcher {
    /// Compile the given patterns, keeping their order as match priority
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Ok(Self {
            patterns: super::compile_patterns(patterns)?,
        })
    }

    /// Matcher over `DEFAULT_WAKE_PATTERNS`
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_WAKE_PATTERNS)
    }

    /// Find the wake phrase in `text`.
    ///
    /// Patterns are tried in order and the first one that matches anywhere in
    /// the trimmed text wins, even if a later pattern would match earlier in
    /// the string.
    pub fn detect(&self, text: &str) -> Option<WakeMatch> {
        let normalized = text.trim();

        self.patterns.iter().enumerate().find_map(|(index, pattern)| {
            pattern.find(normalized).map(|m| {
                let command = normalized[m.end()..].trim().to_string();
                debug!(
                    "Wake phrase matched: /{}/ -> command: {:?}",
                    pattern.as_str(),
                    command
                );
                WakeMatch {
                    pattern_index: index,
                    command,
                }
            })
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
