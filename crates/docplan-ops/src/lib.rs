//! Docplan operations layer.
//!
//! Everything here talks to a language model through
//! [`GenerationBackend`](docplan_backend::GenerationBackend) and recovers
//! structured output from delimited text:
//!
//! - [`DocGenerator`]: docstrings for one snippet or a whole namespace graph
//!   (cancellable through [`Interrupt`]).
//! - [`SqlGenerator`]: SQL from a schema and a question.
//! - [`FunctionRegistry`]: the ordered, duplicate-free list of functions the
//!   planner may use.
//! - [`Planner`]: plan generation, plan-to-code rendering and single
//!   function-call generation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docplan_backend::{create_backend, BackendConfig};
//! use docplan_ops::Planner;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = create_backend(&BackendConfig::load()?)?;
//!     let mut planner = Planner::new(backend);
//!     planner.add_function("read_csv", "(path: str)", Some("reads a csv".into()))?;
//!
//!     let plan = planner.generate_plan("load data.csv", "")?;
//!     println!("{plan}");
//!     println!("{}", planner.plan_to_code(&plan)?);
//!     Ok(())
//! }
//! ```

mod docs;
mod error;
mod limits;
mod planner;
mod prompts;
mod registry;
mod sql;

pub use docs::{DocBatch, DocGenerator, Interrupt};
pub use error::{
    CodeRenderError, DocGenerationError, FunctionCallError, PlanError, PlanGenerationError,
    PlanValidationError, RegistrationError, SqlGenerationError,
};
pub use limits::GenerationLimits;
pub use planner::Planner;
pub use registry::{CallableDescriptor, FunctionRegistry};
pub use sql::SqlGenerator;
