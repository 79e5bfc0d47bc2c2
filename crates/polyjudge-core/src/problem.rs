use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{derive_entry_point, Language, QuestionType};

/// A stored problem, as read from the persistence layer
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProblemSpec {
    pub title: String,
    #[serde(default, alias = "functionName")]
    pub function_name: Option<String>,
    #[serde(default, alias = "questionType")]
    pub question_type: QuestionType,
    /// Raw stored schema; may be an object, a JSON string, or absent
    #[serde(default, alias = "parameterSchema")]
    pub parameter_schema: Option<Value>,
    #[serde(default)]
    pub signatures: HashMap<Language, String>,
    #[serde(default, alias = "testCases")]
    pub test_cases: Vec<TestCase>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(alias = "expectedOutput", alias = "expected")]
    pub expected_output: String,
    #[serde(default, alias = "isHidden")]
    pub hidden: bool,
}

impl ProblemSpec {
    /// Entry-point name used when detection finds nothing: the stored
    /// `function_name`, else one derived from the title
    pub fn fallback_entry_point(&self) -> String {
        self.function_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derive_entry_point(&self.title))
    }
}
