//! # pdf3d-core
//!
//! Core crate for the 3D PDF pipeline. Contains the configuration schemas,
//! the resolved filesystem [`Layout`], and the unified error system.
//!
//! This crate has **no** internal dependencies on other pipeline crates.

pub mod config;
pub mod error;
pub mod layout;
pub mod result;

pub use config::AppConfig;
pub use error::{AppError, ErrorKind};
pub use layout::{Layout, move_replacing};
pub use result::AppResult;
