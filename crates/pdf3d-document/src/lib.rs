//! # pdf3d-document
//!
//! Produces the final report: renders the LaTeX template around the U3D
//! asset, runs the compiler as a black box, and moves the resulting PDF into
//! the output area under the source document's name.

pub mod assembler;
pub mod compiler;
pub mod error;
pub mod template;

pub use assembler::{AssemblyOutcome, DocumentAssembler};
pub use compiler::{DocumentCompiler, LatexCompiler, expected_output};
pub use error::DocumentError;
pub use template::{DocumentTemplate, escape_latex};
