#![allow(clippy::excessive_precision)]
#![allow(missing_docs)]

pub mod depth;
pub mod error;
pub mod optimizer;
pub mod scene;
pub mod spherical_harmonics;
pub mod surgeon;
