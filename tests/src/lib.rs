//! # Quorum-Chain Test Suite
//!
//! Unified test crate for flows that span more than one adapter or more
//! than one generator instance.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Generator + file-backed pending slot + chain
//!     └── flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # With generator logs
//! RUST_LOG=qc_generator=debug cargo test -p qc-tests -- --nocapture
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
