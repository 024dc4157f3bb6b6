use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{HbToolError, TestCase, TESTCASE_SCHEMA_V1};

pub const CASE_FILE_NAME: &str = "testcase.json";

/// Every `testcase.json` below `root`, sorted by path.
pub fn discover_cases(root: &Path) -> Result<Vec<PathBuf>, HbToolError> {
    let mut cases = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == CASE_FILE_NAME)
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    cases.sort();

    if cases.is_empty() {
        return Err(HbToolError::CasesEmpty {
            path: root.to_path_buf(),
        });
    }
    Ok(cases)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, HbToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| HbToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| HbToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(HbToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

pub(crate) fn read_script(case_dir: &Path, case: &TestCase) -> Result<Vec<u8>, HbToolError> {
    let path = case_dir.join(&case.script);
    fs::read(&path).map_err(|source| HbToolError::ReadFile { path, source })
}
