// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agent reading its summary aloud as one labeled sentence.

use std::sync::LazyLock;

use intervox_core::{InterviewSpec, TranscriptMessage};
use regex::{Captures, Regex};

use super::{joined, Extractor};

static LABELED_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)interview data.*?type.*?(\w+).*?role.*?([^,]+).*?level.*?(\w+).*?tech stack.*?([^,]+).*?amount.*?(\d+)",
    )
    .unwrap()
});

/// Matches "interview data … type … role … level … tech stack … amount …"
/// in the last message, then across the whole transcript.
pub struct LabeledSentenceExtractor;

impl Extractor for LabeledSentenceExtractor {
    fn name(&self) -> &'static str {
        "labeled_sentence"
    }

    fn extract(&self, transcript: &[TranscriptMessage]) -> Option<InterviewSpec> {
        let last = transcript.last()?;
        if let Some(spec) = LABELED_SENTENCE.captures(&last.content).and_then(to_spec) {
            return Some(spec);
        }
        let conversation = joined(transcript);
        LABELED_SENTENCE.captures(&conversation).and_then(to_spec)
    }
}

fn to_spec(caps: Captures<'_>) -> Option<InterviewSpec> {
    let amount = caps.get(5)?.as_str().parse().ok()?;
    InterviewSpec::new(
        caps.get(1)?.as_str().to_lowercase(),
        clean(caps.get(2)?.as_str()),
        caps.get(3)?.as_str().to_lowercase(),
        clean(caps.get(4)?.as_str()),
        amount,
    )
}

/// Trims filler left between a label and its value (`"role: Dev"` captures `": Dev"`).
fn clean(value: &str) -> String {
    value
        .trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-')
        .to_string()
}
