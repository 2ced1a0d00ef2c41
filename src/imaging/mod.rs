//! Image probing: pure Rust, header-only.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `image::ImageReader::into_dimensions` |
//!
//! The module is split into:
//! - **Backend**: [`ImageProbe`] trait, [`Dimensions`], [`ProbeError`]
//! - **Rust backend**: [`RustProbe`], the implementation the binary uses

pub mod backend;
pub mod rust_backend;

pub use backend::{Dimensions, ImageProbe, ProbeError};
pub use rust_backend::RustProbe;
