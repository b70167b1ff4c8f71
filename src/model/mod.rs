pub mod rhythm;
pub mod settings;
