//! Domain models.

pub mod catalog;
pub mod upload;
