//! GitHub webhook authentication

pub mod verify;

pub use verify::{sign, verify_signature, SIGNATURE_HEADER, SIGNATURE_PREFIX};
