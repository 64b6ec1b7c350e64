// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Wisp integration tests.
//!
//! Provides mock implementations of the transport and state seams for
//! fast, deterministic, CI-runnable tests without a backend.
//!
//! # Components
//!
//! - [`MockTransport`] - Scriptable socket transport with frame injection and capture
//! - [`MemoryStateStore`] - In-memory replacement for the persisted client state

pub mod memory_state;
pub mod mock_transport;

pub use memory_state::MemoryStateStore;
pub use mock_transport::{DialOutcome, MockSocket, MockTransport};
