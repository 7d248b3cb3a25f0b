//! Tessera Core - Foundational types for the Tessera asset catalog
//!
//! This crate provides the types every other Tessera crate depends on:
//! - `ContentId` - Stable, globally unique resource identities
//! - `ContentHash` - SHA-256 fingerprints of source files
//! - `ByteBuffer` - Growable binary buffer with typed read/write codecs
//! - `Vec2`, `Vec3`, `Color` - Small value types used by resource payloads
//! - Error types and Result alias

mod buffer;
mod error;
mod hash;
mod id;
mod types;

pub use buffer::{BinaryCodec, ByteBuffer, DEFAULT_CAPACITY};
pub use error::{Result, TesseraError};
pub use hash::ContentHash;
pub use id::ContentId;
pub use types::{Color, Vec2, Vec3};
