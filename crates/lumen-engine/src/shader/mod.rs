//! WGSL shader programs.
//!
//! Pipeline:
//! - `ShaderSource` reads the vertex and fragment text (no GPU work)
//! - `CompiledStage` parses, validates and reflects one stage
//! - `ShaderProgram::link` checks the stage interfaces and builds the GPU program
//!
//! Compilation and link checks run on the CPU through naga, so diagnostics
//! are available before any pipeline exists.

mod link;
mod program;
mod reflect;
mod source;
mod stage;
mod uniform;

pub use link::{link_interfaces, ProgramInterface, ProgramResource};
pub use program::ShaderProgram;
pub use reflect::{Member, Resource, ResourceKind, ScalarType, StageInterface, ValueType, Varying};
pub use source::ShaderSource;
pub use stage::{compile_module, CompiledStage, StageKind, StageModule};
pub use uniform::{UniformStorage, UniformValue, UniformWrite};
