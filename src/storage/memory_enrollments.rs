// src/storage/memory_enrollments.rs
//! In-memory enrollment directory.
//!
//! Stand-in for the external course-management system: the binary seeds
//! it from a JSON fixture, tests seed it directly. A deployment embeds
//! this engine next to the real enrollment store and implements
//! [`EnrollmentDirectory`] against that instead.

use crate::models::enrollment::{Enrollment, EnrollmentDirectory};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MemoryEnrollmentDirectory {
    entries: Mutex<HashMap<(String, String), Enrollment>>,
}

impl MemoryEnrollmentDirectory {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts or replaces the enrollment for its (student, course) pair.
    pub fn upsert(&self, enrollment: Enrollment) {
        let key = (enrollment.student_id.clone(), enrollment.course_id.clone());
        self.entries
            .lock()
            .expect("enrollment mutex poisoned")
            .insert(key, enrollment);
    }
}

impl Default for MemoryEnrollmentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrollmentDirectory for MemoryEnrollmentDirectory {
    fn find(&self, student_id: &str, course_id: &str) -> Option<Enrollment> {
        self.entries
            .lock()
            .expect("enrollment mutex poisoned")
            .get(&(student_id.to_string(), course_id.to_string()))
            .cloned()
    }
}
