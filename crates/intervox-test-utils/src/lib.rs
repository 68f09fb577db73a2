// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Intervox integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockBackend`] - Mock call backend with scripted events and injectable failures
//! - [`MockBackendSet`] - Backend factory handing out one mock per account
//! - [`MockInterviewStore`] / [`MockFeedbackStore`] - Capturing persistence mocks
//! - [`TestHarness`] - Pool, reconciler, and controller wired over the mocks

pub mod harness;
pub mod mock_backend;
pub mod mock_store;

pub use harness::TestHarness;
pub use mock_backend::{scripted_call, said, MockBackend, MockBackendSet};
pub use mock_store::{MockFeedbackStore, MockInterviewStore};
