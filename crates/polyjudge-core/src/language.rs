use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::PolyjudgeError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    Java,
    Cpp,
}

impl Language {
    pub fn label(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Language id understood by a Judge0 instance
    pub fn judge0_id(&self) -> u32 {
        match self {
            Language::Python => 71,
            Language::JavaScript => 63,
            Language::Java => 62,
            Language::Cpp => 54,
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::Java,
            Language::Cpp,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = PolyjudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Ok(Language::Python),
            "javascript" | "js" | "node" | "nodejs" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            _ => Err(PolyjudgeError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Accepts every alias `FromStr` does, so map keys such as `"python3"` or
/// `"c++"` load.
impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Python3".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("node".parse::<Language>().unwrap(), Language::JavaScript);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" java ".parse::<Language>().unwrap(), Language::Java);
    }

    #[test]
    fn test_unknown_language_fails_fast() {
        let err = "ruby".parse::<Language>().unwrap_err();
        assert!(matches!(err, PolyjudgeError::UnsupportedLanguage(ref l) if l == "ruby"));
        assert_eq!(err.to_string(), "Unsupported language: ruby");
    }

    #[test]
    fn test_deserialize_accepts_aliases() {
        let langs: Vec<Language> = serde_json::from_str(r#"["python3", "C++", "javascript"]"#).unwrap();
        assert_eq!(langs, vec![Language::Python, Language::Cpp, Language::JavaScript]);
        assert!(serde_json::from_str::<Language>(r#""ruby""#).is_err());
        assert_eq!(serde_json::to_string(&Language::JavaScript).unwrap(), r#""javascript""#);
    }

    #[test]
    fn test_judge0_ids_are_distinct() {
        let mut ids: Vec<u32> = Language::all().iter().map(|l| l.judge0_id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), Language::all().len());
    }
}
