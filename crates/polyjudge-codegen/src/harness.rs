//! From a problem, one test case and user source to a runnable program.

use polyjudge_core::{
    infer_from_value, normalize_schema, parse_input, CanonicalType, Language, NormalizedSchema,
    ParsedValue, ProblemSpec,
};

use crate::toolchain::{toolchain_for, HarnessRequest, LanguageToolchain, MarshaledArg};

/// A composed program ready for submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedProgram {
    pub language: Language,
    pub entry_point: String,
    pub source: String,
}

/// Pair parsed input lines with schema parameters by position.
/// Surplus lines are typed by shape; missing lines marshal as null.
pub fn marshal_args(
    toolchain: &dyn LanguageToolchain,
    problem: &ProblemSpec,
    schema: &NormalizedSchema,
    inputs: &[ParsedValue],
) -> Vec<MarshaledArg> {
    let count = schema.params.len().max(inputs.len());

    (0..count)
        .map(|i| {
            let value = inputs.get(i).unwrap_or(&ParsedValue::Null);
            let ty = match schema.params.get(i) {
                Some(param) => param.ty,
                None => infer_from_value(value, problem.question_type).unwrap_or(CanonicalType::Any),
            };
            toolchain.marshal(value, ty)
        })
        .collect()
}

/// Normalizes a problem once and builds templates and harnesses from it
#[derive(Clone, Debug)]
pub struct HarnessBuilder<'a> {
    problem: &'a ProblemSpec,
    schema: NormalizedSchema,
}

impl<'a> HarnessBuilder<'a> {
    pub fn new(problem: &'a ProblemSpec) -> Self {
        Self {
            problem,
            schema: normalize_schema(problem),
        }
    }

    pub fn problem(&self) -> &ProblemSpec {
        self.problem
    }

    pub fn schema(&self) -> &NormalizedSchema {
        &self.schema
    }

    pub fn template(&self, language: Language) -> String {
        toolchain_for(language).render_template(
            &self.problem.fallback_entry_point(),
            &self.schema,
            self.problem.question_type,
        )
    }

    pub fn entry_point(&self, language: Language, source: &str) -> String {
        toolchain_for(language).detect_entry_point(source, &self.problem.fallback_entry_point())
    }

    /// Compose the program that runs `source` against one raw test-case input
    pub fn build(&self, language: Language, source: &str, input: &str) -> GeneratedProgram {
        let toolchain = toolchain_for(language);
        let entry_point = self.entry_point(language, source);
        let inputs = parse_input(input);
        let args = marshal_args(toolchain, self.problem, &self.schema, &inputs);

        tracing::debug!(
            language = %language,
            entry_point = %entry_point,
            args = args.len(),
            "composing harness"
        );

        let request = HarnessRequest::new(source, &entry_point, args, self.schema.return_type);
        let program = toolchain.compose_harness(&request);

        GeneratedProgram {
            language,
            entry_point,
            source: program,
        }
    }
}
