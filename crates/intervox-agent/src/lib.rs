// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call session control for the Intervox call orchestrator.
//!
//! The [`CallController`] starts a call on the provider pool and hands back
//! an [`ActiveCall`], which follows backend events through the session FSM
//! and reconciles the finished transcript:
//! - **Generation calls**: the extraction cascade proposes interview specs,
//!   each submitted until one is accepted; a timeout fallback covers calls
//!   that never produced usable data.
//! - **Interview calls**: the transcript is turned into feedback.

pub mod assistant;
pub mod controller;
pub mod deadline;
pub mod extract;
pub mod reconcile;
pub mod registry;
pub mod session;
pub mod shutdown;

pub use controller::{ActiveCall, CallController, CallRequest, CallSnapshot};
pub use deadline::FallbackDeadline;
pub use extract::{ExtractionCascade, Extractor};
pub use reconcile::{CallContext, Reconciler};
pub use registry::CallRegistry;
pub use session::CallSession;
