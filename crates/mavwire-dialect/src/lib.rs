//! Message dialects for the mavwire packet codec.
//!
//! A dialect maps single-byte message ids to the "crc-extra" seed byte that is
//! folded into every frame checksum. Frames cannot be verified without knowing
//! the dialect that defines their message id, so the registry in this crate is
//! the only place where message-id validity is judged.
//!
//! Several dialects can be combined in a [`DialectRegistry`]. Lookups walk the
//! dialects in registration order and the first one defining an id wins.

pub mod builtin;
pub mod dialect;
pub mod error;
pub mod registry;

pub use dialect::{Dialect, MessageInfo, MAX_DIALECT_FILE_SIZE};
pub use error::{DialectError, Result};
pub use registry::DialectRegistry;
