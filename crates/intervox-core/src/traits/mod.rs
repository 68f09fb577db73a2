// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every collaborator extends the [`PluginAdapter`] base trait and uses
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod backend;
pub mod feedback;
pub mod interview;

pub use adapter::PluginAdapter;
pub use backend::{CallBackend, StartedCall};
pub use feedback::FeedbackStore;
pub use interview::InterviewStore;
