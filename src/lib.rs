pub mod config;
pub mod error;
pub mod output;
pub mod profile;
pub mod repository;

pub use error::{ProfileError, ProfileResult};
