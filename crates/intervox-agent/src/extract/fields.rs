// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Each field found on its own, anywhere in the conversation.

use std::sync::LazyLock;

use intervox_core::{InterviewSpec, TranscriptMessage};
use regex::Regex;

use super::{joined, Extractor};

static ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:role|position|job).*?:\s*([^.\n]+)").unwrap());
static LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:level|experience).*?:\s*(junior|mid|senior)").unwrap());
static STACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:tech|stack|skills).*?:\s*([^.\n]+)").unwrap());
static KIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:type|focus).*?:\s*(technical|behavioral|mixed)").unwrap()
});
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:amount|number|questions).*?:\s*(\d+)").unwrap());

/// Succeeds only when all five `label: value` pairs are present.
pub struct IndependentFieldsExtractor;

impl Extractor for IndependentFieldsExtractor {
    fn name(&self) -> &'static str {
        "independent_fields"
    }

    fn extract(&self, transcript: &[TranscriptMessage]) -> Option<InterviewSpec> {
        if transcript.is_empty() {
            return None;
        }
        let conversation = joined(transcript);
        let field = |pattern: &Regex| {
            pattern
                .captures(&conversation)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        };

        let role = field(&ROLE)?;
        let level = field(&LEVEL)?.to_lowercase();
        let techstack = field(&STACK)?;
        let interview_type = field(&KIND)?.to_lowercase();
        let amount = field(&AMOUNT)?.parse().ok()?;

        InterviewSpec::new(interview_type, role, level, techstack, amount)
    }
}
