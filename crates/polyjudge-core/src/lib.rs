//! Core types for polyjudge: the canonical type system, the stored problem
//! model, test-case input parsing and schema normalization. Everything here
//! is pure and synchronous.

pub mod config;
pub mod error;
pub mod language;
pub mod naming;
pub mod problem;
pub mod schema;
pub mod signature;
pub mod types;
pub mod value;

pub use config::{Judge0Config, LocalConfig, PollingConfig, PolyjudgeConfig};
pub use error::{PolyjudgeError, Result};
pub use language::Language;
pub use naming::{derive_entry_point, sanitize_identifier};
pub use problem::{ProblemSpec, TestCase};
pub use schema::{normalize_schema, NormalizedSchema, Param};
pub use signature::{parse_signature, ParsedSignature, SignatureParam};
pub use types::{infer_from_value, CanonicalType, Position, QuestionType, StructuralKind};
pub use value::{parse_input, parse_line, ParsedValue};
