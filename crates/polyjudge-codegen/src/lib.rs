//! Code generation for polyjudge: per-language type mapping, starter
//! templates, value marshaling, node-structure helpers, entry-point
//! detection and harness composition.

mod detect;
pub mod harness;
pub mod lang;
mod literal;
pub mod source;
pub mod structures;
pub mod toolchain;

pub use harness::{marshal_args, GeneratedProgram, HarnessBuilder};
pub use lang::{CppToolchain, JavaScriptToolchain, JavaToolchain, PythonToolchain};
pub use structures::{HelperPlan, Placement};
pub use toolchain::{
    toolchain_for, HarnessRequest, LanguageToolchain, MarshaledArg, ResultNormalizer,
};
