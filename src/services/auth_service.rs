//! Publish authorization gate.
//!
//! A pure membership test over data attached to the upload; no external
//! call is ever made here.

use crate::models::catalog::RepositoryIdentity;
use crate::models::upload::Principal;

/// Decide whether a principal may publish metadata claiming `identity`.
pub fn authorize(principal: &Principal, identity: &RepositoryIdentity) -> bool {
    principal.trusted || principal.known_repos.contains(identity)
}
