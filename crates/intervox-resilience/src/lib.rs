// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider account pool for the Intervox call orchestrator.
//!
//! - [`ProviderPool`]: selects the healthiest credentialed account, hands out
//!   its backend handle, and retries an operation across accounts with
//!   failure accounting.
//! - [`StatusMonitor`]: summarizes pool health, recommends operator action,
//!   and logs status periodically until cancelled.

pub mod account;
pub mod monitor;
pub mod pool;

pub use account::AccountStatus;
pub use monitor::{PoolSummary, Recommendation, StatusMonitor};
pub use pool::{BackendFactory, ProviderPool, DEFAULT_ERROR_THRESHOLD};
