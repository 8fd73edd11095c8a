//! Core protocol vocabulary for Tablestore.
//!
//! This crate provides the pieces of the wire protocol that do not depend on
//! any particular HTTP stack, shared by `tablestore-client` and any test
//! server that wants to speak the same dialect.
//!
//! ## Modules
//!
//! - [`ErrorCode`]: Service error codes and their retry classification
//! - [`digest`]: Content-MD5 computation and verification
//! - [`headers`]: Header names read and written by the protocol

pub mod digest;
mod error;
pub mod headers;

pub use digest::{DigestMismatch, content_md5, verify_content_md5};
pub use error::*;
