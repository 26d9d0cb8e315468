pub mod exam;
pub mod result;
