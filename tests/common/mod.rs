#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_reconcile::{Dataset, Value};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn dataset(names: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
    Dataset::new(columns(names), rows).expect("valid dataset")
}

pub fn text(value: &str) -> Value {
    Value::text(value)
}

pub fn int(value: i64) -> Value {
    Value::Integer(value)
}

/// Primary/secondary pair from the reference walkthrough: ids 1,2 against 1,3.
pub fn walkthrough_pair() -> (Dataset, Dataset) {
    let primary = dataset(
        &["id", "name", "city"],
        vec![
            vec![int(1), text(""), text("Hanoi")],
            vec![int(2), text("Bao"), text("")],
        ],
    );
    let secondary = dataset(
        &["id", "name", "city"],
        vec![
            vec![int(1), text("An"), text("HN")],
            vec![int(3), text("Chi"), text("HCM")],
        ],
    );
    (primary, secondary)
}
