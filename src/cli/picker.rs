//! CSV discovery for the TUI's open-file dialog.
//!
//! The dialog lists `*.csv` files under the current working directory and also
//! accepts a typed path; both go through `validate_csv_path`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default directory recursion depth for finding CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Validate the provided path points to a `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        != Some(true)
    {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}).", path.display()),
        ));
    }

    Ok(path.to_path_buf())
}

/// Discover `*.csv` files under the current directory (deterministic order).
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn find_csv_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_csv_files_inner(&path, depth + 1, max_depth, out);
            continue;
        }

        if file_type.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                == Some(true)
        {
            out.push(path);
        }
    }
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

/// Display form of a discovered path (leading `./` removed).
pub fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stocks_picker_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn finds_csv_files_and_skips_build_dirs() {
        let dir = scratch_dir("find");
        fs::create_dir_all(dir.join("data")).unwrap();
        fs::create_dir_all(dir.join("target")).unwrap();
        fs::write(dir.join("b.csv"), "timestamp\n").unwrap();
        fs::write(dir.join("data").join("a.CSV"), "timestamp\n").unwrap();
        fs::write(dir.join("target").join("skip.csv"), "timestamp\n").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let found = find_csv_files(&dir, 2);
        let _ = fs::remove_dir_all(&dir);

        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"b.csv".to_string()));
        assert!(names.contains(&"a.CSV".to_string()));
    }

    #[test]
    fn validate_rejects_missing_dirs_and_other_extensions() {
        let dir = scratch_dir("validate");
        let txt = dir.join("prices.txt");
        fs::write(&txt, "x").unwrap();
        let csv = dir.join("prices.csv");
        fs::write(&csv, "timestamp\n").unwrap();

        assert!(validate_csv_path(&dir.join("nope.csv")).is_err());
        assert!(validate_csv_path(&dir).is_err());
        assert!(validate_csv_path(&txt).is_err());
        assert_eq!(validate_csv_path(&csv).unwrap(), csv);

        let _ = fs::remove_dir_all(&dir);
    }
}
