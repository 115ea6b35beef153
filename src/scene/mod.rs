//! Point cloud scene made of named per-point properties.

pub mod point;
pub mod property;

pub use crate::error::Error;
pub use burn::tensor::{backend::Backend, Tensor, TensorData};
pub use point::*;
pub use property::*;
