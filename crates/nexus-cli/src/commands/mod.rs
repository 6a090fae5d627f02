pub mod prompt;
pub mod smoke;
