pub mod extract;
pub mod sanitize;
