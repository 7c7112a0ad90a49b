//! Core business logic for photoshare.
//!
//! Services sit between the HTTP layer and the repositories. The
//! [`GuardService`] holds every cross-entity authorization rule; the other
//! services assume the caller has already been authorized.

pub mod services;

pub use services::*;
