//! Invokable tools exposed over the protocol endpoint
//!
//! Provides the static descriptor table consumed by the dispatcher and the
//! handler seam each tool implements.

pub mod hello;
pub mod random;
pub mod registry;
pub mod summarize;
pub mod weather;

pub use registry::{ParamKind, ParamSpec, ToolDescriptor, ToolHandler, ToolRegistry};
