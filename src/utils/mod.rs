pub mod cert_number;
pub mod clock;
pub mod hash;
