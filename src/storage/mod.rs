pub mod certificate_store;
pub mod memory_enrollments;
pub mod memory_store;
