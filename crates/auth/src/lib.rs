//! `tallybank-auth`: credential checks for the HTTP boundary.
//!
//! Decoupled from HTTP and storage: the API layer extracts raw header values
//! and hands them to the types in this crate.

pub mod api_key;
pub mod claims;
pub mod validator;

pub use api_key::ApiKey;
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use validator::{Hs256JwtValidator, JwtValidator};
