//! Gathering specification texts named on the command line or in
//! `.restgen.yaml`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::debug;
use restgen_core::diagnostics::normalize_path;
use restgen_core::source::is_spec_file_name;
use walkdir::WalkDir;

/// Read every specification named by `entries`, resolved against `base`.
/// A file is taken as is; a directory contributes every `.yaml`/`.yml`
/// file below it. The result is sorted by path and free of duplicates.
pub fn collect(base: &Path, entries: &[String]) -> Result<Vec<(String, Arc<str>)>> {
    let mut paths = Vec::new();
    for entry in entries {
        let path = base.join(entry);
        if path.is_dir() {
            for found in WalkDir::new(&path).sort_by_file_name() {
                let found = found.with_context(|| format!("failed to walk {}", path.display()))?;
                let name = found.path().to_string_lossy().into_owned();
                if found.file_type().is_file() && is_spec_file_name(&name) {
                    paths.push(found.into_path());
                }
            }
        } else if path.is_file() {
            paths.push(path);
        } else {
            bail!("specification {} does not exist", path.display());
        }
    }

    let mut specs: Vec<(String, Arc<str>)> = Vec::with_capacity(paths.len());
    for path in paths {
        let key = normalize_path(&path.to_string_lossy());
        if specs.iter().any(|(k, _)| *k == key) {
            continue;
        }
        let text = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        specs.push((key, Arc::from(text)));
    }
    specs.sort_by(|a, b| a.0.cmp(&b.0));
    debug!("collected {} specification file(s)", specs.len());
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_contribute_yaml_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("api/nested")).unwrap();
        fs::write(root.join("api/Shop.yaml"), "openapi: 3.0.3").unwrap();
        fs::write(root.join("api/nested/Shop_Orders.yml"), "openapi: 3.0.3").unwrap();
        fs::write(root.join("api/notes.txt"), "ignored").unwrap();

        let specs = collect(root, &["api".to_string(), "api/Shop.yaml".to_string()]).unwrap();
        let names: Vec<&str> = specs
            .iter()
            .map(|(k, _)| k.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["Shop.yaml", "Shop_Orders.yml"]);
    }

    #[test]
    fn missing_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect(dir.path(), &["nope.yaml".to_string()]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
