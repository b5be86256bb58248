//! HTTP handlers.

pub mod catalog;
pub mod publish;
