//! Integration and property tests for blocktime.
//!
//! Cross-crate scenarios run the engine against a synthetic chain served by
//! a scripted block source, so refinement, single-flight ordering and live
//! updates can be checked without network access.

pub mod helpers;
