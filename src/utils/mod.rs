pub mod error;
pub mod logger;
pub mod random;
pub mod validation;
