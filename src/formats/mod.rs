//! Artifact metadata formats.

pub mod pom;
