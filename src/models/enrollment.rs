// src/models/enrollment.rs
//! Enrollment facts consumed from the course-management collaborator.
//!
//! This engine never writes enrollments; it reads completion status to
//! gate issuance, and the student/course display data needed by the
//! document renderer and the public verification projection.

use serde::{Deserialize, Serialize};

/// Progress state of a student in a course, as reported by the external
/// enrollment system. Only `Completed` makes a pair eligible for a
/// certificate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Enrolled,
    InProgress,
    Completed,
    Dropped,
}

/// A (student, course) enrollment with the display fields this engine
/// needs alongside the status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
    pub status: EnrollmentStatus,
    /// Recipient display name, printed on the artifact and returned in
    /// the verification projection.
    pub student_name: String,
    /// Course title, printed on the artifact and returned in the
    /// verification projection.
    pub course_title: String,
}

impl Enrollment {
    pub fn is_completed(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }
}

/// Read-only view onto the external enrollment system.
pub trait EnrollmentDirectory: Send + Sync {
    /// Looks up the enrollment for a (student, course) pair, if any.
    fn find(&self, student_id: &str, course_id: &str) -> Option<Enrollment>;
}
