//! Core domain types shared across the docplan workspace.
//!
//! - [`SymbolPath`] identifies a callable inside a root namespace.
//! - [`FunctionSpec`] is the structured description the planner sees.
//! - [`Plan`], [`Task`] and [`Parameter`] model the task graph returned by
//!   the backend.
//! - [`markers`] implements the delimiter protocol used to recover generated
//!   text from raw backend output.

pub mod markers;
mod function;
mod plan;
mod symbol;

pub use function::FunctionSpec;
pub use markers::{Marker, MissingMarker};
pub use plan::{
    DanglingReference, ParamValue, Parameter, Plan, PlanSchemaViolation, Task, TaskDependency,
};
pub use symbol::SymbolPath;
