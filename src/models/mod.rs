pub mod certificate;
pub mod enrollment;
