//! Pattern-based transcript matching
//!
//! Two independent matchers interpret raw recognizer text:
//! - `WakePhraseMatcher` finds the wake phrase and splits off the command after it
//! - `EndPhraseMatcher` recognizes farewells that end a conversation
//!
//! Both are plain regex tests. No scoring and no semantic interpretation.

mod end;
mod wake;

pub use end::{EndPhraseMatcher, DEFAULT_END_PATTERNS};
pub use wake::{WakeMatch, WakePhraseMatcher, DEFAULT_WAKE_PATTERNS};

use anyhow::{Context, Result};
use regex::Regex;

fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(p).with_context(|| format!("Invalid phrase pattern: {}", p))
        })
        .collect()
}
