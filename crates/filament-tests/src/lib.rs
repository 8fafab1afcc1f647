//! Integration test suite for Filament.
//!
//! Property tests for the address codec, end-to-end send/balance/wait flows
//! against an in-memory node, and opt-in tests against a live Lotus node.

pub mod helpers;
