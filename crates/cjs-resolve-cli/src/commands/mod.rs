pub mod categories;
pub mod resolve;
pub mod version;
