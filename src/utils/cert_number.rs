// src/utils/cert_number.rs
//! Certificate number generation.
//!
//! Produces the human-readable identifier printed on certificates:
//! a millisecond timestamp (sortable by issuance order) joined with a
//! short slice of the student id. This is a readability aid, not the
//! security boundary; the store's unique constraint is authoritative,
//! and the issuance coordinator regenerates on conflict.

use crate::utils::clock::Clock;

/// Number of leading student-id characters included in the number.
const STUDENT_SLICE_LEN: usize = 8;

/// Builds a certificate number of the form `CERT-{millis}-{student[..8]}`.
///
/// Student ids shorter than eight characters are used whole.
pub fn generate(clock: &dyn Clock, student_id: &str) -> String {
    let millis = clock.now().timestamp_millis();
    let slice: String = student_id.chars().take(STUDENT_SLICE_LEN).collect();
    format!("CERT-{}-{}", millis, slice)
}
