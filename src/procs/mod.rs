//! [`Transformer`](crate::dataset::Transformer) implementations.

pub mod binary;
pub mod func;

pub use binary::{BinaryConfig, BinaryTransform};
pub use func::{FnTransform, Identity};
