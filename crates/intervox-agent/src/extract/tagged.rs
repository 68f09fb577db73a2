// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marker-tagged JSON payload in the most recent message.

use intervox_core::{InterviewSpec, IntervoxError, TranscriptMessage};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::Extractor;

/// Parses `<marker> {json}` from the last transcript message.
///
/// The object runs greedily to the last `}` of the message, so trailing
/// prose after the payload makes the JSON invalid rather than truncated.
pub struct TaggedPayloadExtractor {
    marker: String,
    pattern: Regex,
}

impl TaggedPayloadExtractor {
    pub fn new(marker: &str) -> Result<Self, IntervoxError> {
        let pattern = Regex::new(&format!(r"{}\s*(\{{[\s\S]*\}})", regex::escape(marker)))
            .map_err(|e| IntervoxError::Config(format!("invalid payload marker `{marker}`: {e}")))?;
        Ok(Self {
            marker: marker.to_string(),
            pattern,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

#[derive(Debug, Deserialize)]
struct TaggedPayload {
    #[serde(rename = "type")]
    interview_type: String,
    role: String,
    level: String,
    techstack: StackField,
    amount: AmountField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StackField {
    Text(String),
    Items(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AmountField {
    Number(u32),
    Text(String),
}

impl StackField {
    fn into_text(self) -> String {
        match self {
            StackField::Text(text) => text,
            StackField::Items(items) => items.join(", "),
        }
    }
}

impl AmountField {
    fn value(&self) -> Option<u32> {
        match self {
            AmountField::Number(n) => Some(*n),
            AmountField::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl Extractor for TaggedPayloadExtractor {
    fn name(&self) -> &'static str {
        "tagged_payload"
    }

    fn extract(&self, transcript: &[TranscriptMessage]) -> Option<InterviewSpec> {
        let last = transcript.last()?;
        if !last.content.contains(&self.marker) {
            return None;
        }

        let body = self.pattern.captures(&last.content)?.get(1)?.as_str();
        let payload: TaggedPayload = match serde_json::from_str(body) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(error = %e, "tagged payload is not valid interview JSON");
                return None;
            }
        };

        let amount = payload.amount.value()?;
        InterviewSpec::new(
            payload.interview_type,
            payload.role,
            payload.level,
            payload.techstack.into_text(),
            amount,
        )
    }
}
