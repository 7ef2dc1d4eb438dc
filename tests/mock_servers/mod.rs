//! Mock servers for integration testing
//!
//! Simulates the receiver's HTTP API so controller behavior can be exercised
//! without real hardware.
#![allow(dead_code)]

pub mod receiver;

pub use receiver::{MockReceiver, RecordedRequest};
