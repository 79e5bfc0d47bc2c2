use std::path::Path;

use polyjudge_core::ProblemSpec;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProblemLoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProblemLoaderError>;

/// A problem file holds one problem, a bare list, or `{"problems": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ProblemFile {
    Set { problems: Vec<ProblemSpec> },
    List(Vec<ProblemSpec>),
    Single(Box<ProblemSpec>),
}

pub fn parse_problems(content: &str) -> Result<Vec<ProblemSpec>> {
    let file: ProblemFile = serde_json::from_str(content)?;
    Ok(match file {
        ProblemFile::Set { problems } => problems,
        ProblemFile::List(problems) => problems,
        ProblemFile::Single(problem) => vec![*problem],
    })
}

pub fn load_problems(path: &Path) -> Result<Vec<ProblemSpec>> {
    let content = std::fs::read_to_string(path)?;
    parse_problems(&content)
}

/// Every `*.json` problem file in a directory, in file-name order
pub fn load_all_problems(dir: &Path) -> Result<Vec<ProblemSpec>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut problems = Vec::new();
    for path in paths {
        let loaded = load_problems(&path)?;
        debug!(path = %path.display(), count = loaded.len(), "Loaded problem file");
        problems.extend(loaded);
    }
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use polyjudge_core::QuestionType;
    use tempfile::TempDir;

    use super::*;

    const TWO_SUM: &str = r#"{
        "title": "Two Sum",
        "question_type": "array",
        "parameter_schema": {"params": [{"name": "nums", "type": "int[]"}, {"name": "target", "type": "int"}], "returnType": "int[]"},
        "test_cases": [{"input": "[2,7,11,15]\n9", "expected_output": "[0,1]"}]
    }"#;

    #[test]
    fn test_single_problem_file() {
        let problems = parse_problems(TWO_SUM).unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].title, "Two Sum");
        assert_eq!(problems[0].question_type, QuestionType::Array);
        assert_eq!(problems[0].test_cases[0].expected_output, "[0,1]");
    }

    #[test]
    fn test_problem_set_and_list_files() {
        let set = format!(r#"{{"problems": [{TWO_SUM}, {{"title": "Reverse List"}}]}}"#);
        assert_eq!(parse_problems(&set).unwrap().len(), 2);

        let list = format!("[{TWO_SUM}]");
        assert_eq!(parse_problems(&list).unwrap()[0].title, "Two Sum");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(parse_problems("{"), Err(ProblemLoaderError::Json(_))));
    }

    #[test]
    fn test_load_all_reads_json_files_in_order() {
        let dir = TempDir::new().unwrap();
        for (name, body) in [
            ("b.json", r#"{"title": "Second"}"#),
            ("a.json", r#"[{"title": "First"}]"#),
            ("notes.txt", "ignored"),
        ] {
            let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(body.as_bytes()).unwrap();
        }

        let titles: Vec<String> = load_all_problems(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }
}
