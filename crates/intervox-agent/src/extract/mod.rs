// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript-to-interview extraction strategies.
//!
//! Each [`Extractor`] either yields a complete [`InterviewSpec`] or nothing.
//! The [`ExtractionCascade`] runs them in configured order and hands every
//! produced candidate to the caller, so a candidate rejected downstream lets
//! the next strategy try.

mod fields;
mod labeled;
mod tagged;

use intervox_config::model::ExtractorKind;
use intervox_core::{InterviewSpec, IntervoxError, TranscriptMessage};
use tracing::debug;

pub use fields::IndependentFieldsExtractor;
pub use labeled::LabeledSentenceExtractor;
pub use tagged::TaggedPayloadExtractor;

/// One extraction strategy. Never fails; no match is `None`.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, transcript: &[TranscriptMessage]) -> Option<InterviewSpec>;
}

/// Ordered list of strategies; the first accepted candidate wins.
pub struct ExtractionCascade {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractionCascade {
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Builds the cascade from configured strategy names.
    pub fn from_kinds(kinds: &[ExtractorKind], marker: &str) -> Result<Self, IntervoxError> {
        let mut extractors: Vec<Box<dyn Extractor>> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match kind {
                ExtractorKind::TaggedPayload => {
                    extractors.push(Box::new(TaggedPayloadExtractor::new(marker)?));
                }
                ExtractorKind::LabeledSentence => {
                    extractors.push(Box::new(LabeledSentenceExtractor));
                }
                ExtractorKind::IndependentFields => {
                    extractors.push(Box::new(IndependentFieldsExtractor));
                }
            }
        }
        Ok(Self { extractors })
    }

    /// Strategy names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Lazily yields `(strategy, spec)` for every strategy that matches.
    pub fn candidates<'a>(
        &'a self,
        transcript: &'a [TranscriptMessage],
    ) -> impl Iterator<Item = (&'static str, InterviewSpec)> + 'a {
        self.extractors.iter().filter_map(move |extractor| {
            let found = extractor.extract(transcript);
            if found.is_none() {
                debug!(strategy = extractor.name(), "no interview data found");
            }
            found.map(|spec| (extractor.name(), spec))
        })
    }

    /// The first candidate, without any submission in between.
    pub fn first_match(&self, transcript: &[TranscriptMessage]) -> Option<(&'static str, InterviewSpec)> {
        self.candidates(transcript).next()
    }
}

/// Message contents joined with single spaces, in transcript order.
pub(crate) fn joined(transcript: &[TranscriptMessage]) -> String {
    transcript
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
