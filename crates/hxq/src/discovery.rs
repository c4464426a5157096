//! Finding sources and configuration on disk.
//!
//! Source files are every `*.hx` file under a directory, hidden entries
//! skipped. Configuration is an `hxq.toml` in the starting directory or the
//! nearest ancestor that has one.

use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILE: &str = "hxq.toml";

/// Dotted package a relative path implies.
///
/// - `Main.hx` -> `""`
/// - `app/model/User.hx` -> `"app.model"`
pub fn path_to_package(relative_path: &Path) -> String {
    let Some(parent) = relative_path.parent() else {
        return String::new();
    };
    parent
        .components()
        .filter_map(|c| match c {
            Component::Normal(os) => os.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Recursively discover all `.hx` files under `root`.
///
/// Returns paths relative to `root`, sorted for determinism.
pub fn discover_hx_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    discover_recursive(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

fn discover_recursive(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry_path.is_dir() {
            discover_recursive(root, &entry_path, files)?;
        } else if entry_path.extension().and_then(|e| e.to_str()) == Some("hx") {
            let relative = entry_path
                .strip_prefix(root)
                .unwrap_or(&entry_path)
                .to_path_buf();
            files.push(relative);
        }
    }
    Ok(())
}

/// The nearest `hxq.toml` at or above `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn package_from_path() {
        assert_eq!(path_to_package(Path::new("Main.hx")), "");
        assert_eq!(path_to_package(Path::new("app/model/User.hx")), "app.model");
    }

    #[test]
    fn discovers_hx_files_sorted_and_skips_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("Main.hx"), "").unwrap();
        fs::create_dir_all(root.join("app/model")).unwrap();
        fs::write(root.join("app/model/User.hx"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join(".cache/Old.hx"), "").unwrap();

        let files = discover_hx_files(root).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["Main.hx", "app/model/User.hx"]);
    }

    #[test]
    fn config_is_found_in_an_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join(CONFIG_FILE), "").unwrap();
        fs::create_dir_all(root.join("src/app")).unwrap();
        assert_eq!(find_config(&root.join("src/app")), Some(root.join(CONFIG_FILE)));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover_hx_files(&tmp.path().join("absent")).is_err());
    }
}
