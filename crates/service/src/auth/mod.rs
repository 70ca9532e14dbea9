//! Auth module: three-layer architecture (domain, repository, service).
//!
//! This module centralizes registration, login, token verification and profile upkeep.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{AuthConfig, AuthService};
