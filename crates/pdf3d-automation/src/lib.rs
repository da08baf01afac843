//! # pdf3d-automation
//!
//! Hands one job at a time to an external, long-running CAD application and
//! observes the result purely through filesystem side effects.
//!
//! The application itself is an opaque [`CadApplication`] capability. The
//! [`CompletionWatcher`] never talks to it: it only polls a [`SignalProbe`],
//! so classification can be exercised against scripted signals.

pub mod application;
pub mod bridge;
pub mod controller;
pub mod error;
pub mod job;
pub mod source;
pub mod watcher;

pub use application::{CadApplication, DocumentHandle};
pub use bridge::CommandBridge;
pub use controller::{ApplicationSession, ExportController};
pub use error::AutomationError;
pub use job::{Job, JobDescriptorWriter};
pub use source::{SourceKind, discover_sources};
pub use watcher::{CompletionWatcher, FsProbe, Observation, Outcome, SignalProbe};
