//! Directory tree loading

use std::path::Path;

use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::common::{Error, Result};

use super::{Case, Dir, File, GroupConfig, CONTEXT_FILE_STEM};

const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Load a data root into a directory model
///
/// Entries are visited in name order. Hidden entries and files whose name
/// starts with `_` (other than the context file) are skipped.
pub fn load(root: &Path) -> Result<Dir> {
    if !root.is_dir() {
        return Err(Error::load(root, "not a directory"));
    }
    let mut dir = load_dir(root)?;
    dir.count_cases();
    tracing::debug!("Loaded {} cases from {}", dir.case_num, root.display());
    Ok(dir)
}

fn load_dir(path: &Path) -> Result<Dir> {
    let mut dir = Dir {
        path: path.to_path_buf(),
        ..Default::default()
    };

    let walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut context = None;
    for entry in walker {
        let entry = entry.map_err(|e| Error::load(path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let entry_path = entry.path().to_path_buf();

        if entry.file_type().is_dir() {
            dir.dirs.insert(name, load_dir(&entry_path)?);
            continue;
        }

        let (stem, supported) = match entry_path.extension().and_then(|e| e.to_str()) {
            Some(ext) if EXTENSIONS.contains(&ext) => (
                entry_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                true,
            ),
            _ => (String::new(), false),
        };
        if !supported {
            continue;
        }

        if stem == CONTEXT_FILE_STEM {
            if context.is_some() {
                return Err(Error::load(path, "more than one context file"));
            }
            context = Some(parse_file::<GroupConfig>(&entry_path)?);
        } else if !stem.starts_with('_') {
            let case = parse_file::<Case>(&entry_path)?;
            if case.flow.is_empty() {
                tracing::warn!("Case {} has no steps", entry_path.display());
            }
            dir.files.insert(
                name,
                File {
                    path: entry_path,
                    case,
                },
            );
        }
    }

    let mut context = context.unwrap_or_default();
    if context.summary.is_empty() {
        context.summary = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    dir.context = context;
    Ok(dir)
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::load(path, e))?;
    // YAML is a superset of JSON, one parser covers every extension
    serde_yaml::from_str(&content).map_err(|e| Error::load(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_tree_counts_whole_subtree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, "_context.yaml", "summary: users api\ncleaner: db-reset\n");
        write(root, "create.yaml", "description: create user\nflow:\n  - request:\n      path: /users\n");
        write(root, "list.json", r#"{"description": "list users", "flow": [{}]}"#);
        write(root, "admin/_context.yml", "summary: admin\n");
        write(root, "admin/promote.yaml", "description: promote\nflow: [{}]\n");
        write(root, "admin/nested/deep.yaml", "description: deep\nflow: [{}]\n");
        write(root, "README.md", "ignored");
        write(root, "_shared.yaml", "ignored: true");
        write(root, ".hidden/skip.yaml", "description: hidden\n");

        let dir = load(root).unwrap();
        assert_eq!(dir.context.summary, "users api");
        assert_eq!(dir.context.cleaner.as_deref(), Some("db-reset"));
        assert_eq!(dir.case_num, 4);
        assert_eq!(dir.files.len(), 2);
        assert!(dir.files.contains_key("create.yaml"));
        assert!(dir.files.contains_key("list.json"));

        let admin = &dir.dirs["admin"];
        assert_eq!(admin.case_num, 2);
        assert_eq!(admin.context.summary, "admin");
        assert_eq!(admin.dirs["nested"].case_num, 1);
        assert_eq!(admin.dirs["nested"].context.summary, "nested");
        assert!(!dir.dirs.contains_key(".hidden"));
    }

    #[test]
    fn test_missing_root_is_load_error() {
        let err = load(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_malformed_case_is_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "bad.yaml", "flow: {not: [a list}\n");
        let err = load(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_two_context_files_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "_context.yaml", "summary: a\n");
        write(tmp.path(), "_context.json", r#"{"summary": "b"}"#);
        let err = load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("more than one context file"), "{}", err);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_group_is_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let shared = tmp.path().join("shared");
        write(&shared, "ping.yaml", "description: ping\nflow: [{}]\n");
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(&shared, root.join("linked")).unwrap();

        let dir = load(&root).unwrap();
        assert_eq!(dir.case_num, 1);
        assert!(dir.dirs["linked"].files.contains_key("ping.yaml"));
    }

    #[test]
    fn test_group_config_fields() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "_context.yaml",
            r#"
summary: orders
roundTripTemplate:
  request:
    headers:
      Accept: application/json
presetters:
  - name: request-header
    args:
      X-Tenant: acme
variables:
  tenant: acme
flow:
  - description: create namespace
    request:
      method: POST
      path: /namespaces
"#,
        );
        let dir = load(tmp.path()).unwrap();
        let cfg = &dir.context;
        assert!(cfg.round_trip_template.is_some());
        assert_eq!(cfg.presetters[0].name, "request-header");
        assert_eq!(cfg.variables["tenant"], serde_json::json!("acme"));
        assert_eq!(cfg.flow.len(), 1);
        assert_eq!(dir.case_num, 0);
    }
}
