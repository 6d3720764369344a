pub mod archive;
pub mod health;
pub mod upload;
