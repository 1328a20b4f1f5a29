// src/utils/hash.rs
//! Verification fingerprint codec.
//!
//! Builds the canonical fact string for a certificate and hashes it with
//! SHA-256 into the lowercase-hex token used as the public lookup key.
//!
//! The fingerprint is computed exactly once at issuance, over the exact
//! `issued_at` that gets persisted, and stored verbatim. Verification
//! never recomputes it: because the timestamp is part of the input, the
//! token is an opaque capability, not a checksum a relying party could
//! derive on their own.

use chrono::{DateTime, Utc};
use ring::digest::{digest, SHA256};

/// Fixed-precision timestamp serialization used inside the canonical
/// string. Millisecond precision, always UTC with a literal `Z`, so the
/// codec stays deterministic across environments.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Computes the verification fingerprint for a certificate's immutable
/// fact tuple.
///
/// The canonical form is the four fields joined with `:` in fixed order.
/// Output is always 64 lowercase hex characters.
pub fn fingerprint(
    certificate_number: &str,
    student_id: &str,
    course_id: &str,
    issued_at: DateTime<Utc>,
) -> String {
    let canonical = format!(
        "{}:{}:{}:{}",
        certificate_number,
        student_id,
        course_id,
        issued_at.format(TIMESTAMP_FORMAT),
    );
    hex::encode(digest(&SHA256, canonical.as_bytes()).as_ref())
}
