//! Shared test utilities for fieldwork integration tests.
//!
//! - `TestHarness`: a full core over an on-disk database in a temp directory,
//!   talking to a scripted in-process remote
//! - `WorkOrderBuilder`: raw form payloads in current and legacy shapes

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FakeRemote, TestHarness};
