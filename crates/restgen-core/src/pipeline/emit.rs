use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::EmitError;
use crate::{FileKind, GeneratedFile};

use super::GenerationOutput;
use super::key::content_hash;
use super::signature::{SignatureOutcome, reconcile_signature};

/// Written into the output directory after every emit.
pub const STATE_FILE_NAME: &str = ".restgen-state.json";

/// What the last emit wrote: the key fingerprint and a content hash per
/// generated file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmitState {
    fingerprint: Option<String>,
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// The recorded state matched and every output existed; nothing was
    /// touched.
    pub up_to_date: bool,
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    /// Generated files from the previous emit that are no longer produced.
    pub removed: Vec<String>,
    pub scaffolds_created: Vec<String>,
    /// Existing scaffolds whose signature was rewritten.
    pub scaffolds_reconciled: Vec<String>,
    /// Existing scaffolds left as they were, with the reason.
    pub scaffolds_kept: Vec<(String, String)>,
}

impl EmitReport {
    /// Number of files created, rewritten or deleted.
    pub fn writes(&self) -> usize {
        self.written.len() + self.removed.len() + self.scaffolds_created.len() + self.scaffolds_reconciled.len()
    }
}

/// Writes pipeline output to disk.
///
/// Generated files are rewritten only when their content changed.
/// Scaffolds are never overwritten: a new one is created atomically, an
/// existing one only has its handler signature reconciled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitter {
    /// Leave existing scaffolds untouched.
    pub skip_reconcile: bool,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, output: &GenerationOutput, out_dir: &Path) -> Result<EmitReport, EmitError> {
        let state_path = out_dir.join(STATE_FILE_NAME);
        let previous = load_state(&state_path);

        if output.fingerprint.is_some()
            && previous.fingerprint == output.fingerprint
            && output.files.iter().all(|f| out_dir.join(&f.path).exists())
        {
            debug!("{} is up to date", out_dir.display());
            return Ok(EmitReport {
                up_to_date: true,
                ..EmitReport::default()
            });
        }

        let mut report = EmitReport::default();
        let mut next = EmitState {
            fingerprint: output.fingerprint.clone(),
            files: BTreeMap::new(),
        };

        for file in &output.files {
            let target = out_dir.join(&file.path);
            match &file.kind {
                FileKind::Generated => {
                    let hash = content_hash(&file.content);
                    if previous.files.get(&file.path) == Some(&hash) && target.exists() {
                        report.unchanged.push(file.path.clone());
                    } else {
                        write_file(&target, &file.content)?;
                        report.written.push(file.path.clone());
                    }
                    next.files.insert(file.path.clone(), hash);
                }
                FileKind::Scaffold(signature) => {
                    if create_scaffold(&target, file)? {
                        report.scaffolds_created.push(file.path.clone());
                        continue;
                    }
                    if self.skip_reconcile {
                        report
                            .scaffolds_kept
                            .push((file.path.clone(), "reconciliation disabled".to_string()));
                        continue;
                    }
                    let current = fs::read_to_string(&target).map_err(|source| EmitError::Read {
                        path: target.display().to_string(),
                        source,
                    })?;
                    match reconcile_signature(&current, signature) {
                        SignatureOutcome::Rewritten(content) => {
                            replace_file(&target, &content)?;
                            report.scaffolds_reconciled.push(file.path.clone());
                        }
                        SignatureOutcome::Unchanged => report
                            .scaffolds_kept
                            .push((file.path.clone(), "signature up to date".to_string())),
                        SignatureOutcome::NoMatch => {
                            warn!("{}: no {} method found to reconcile", file.path, signature.method);
                            report
                                .scaffolds_kept
                                .push((file.path.clone(), format!("no {} method found", signature.method)));
                        }
                        SignatureOutcome::Skipped(reason) => {
                            warn!("{}: signature not reconciled: {reason}", file.path);
                            report.scaffolds_kept.push((file.path.clone(), reason));
                        }
                    }
                }
            }
        }

        for stale in previous.files.keys().filter(|p| !next.files.contains_key(*p)) {
            let path = out_dir.join(stale);
            match fs::remove_file(&path) {
                Ok(()) => report.removed.push(stale.clone()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(EmitError::Write {
                        path: path.display().to_string(),
                        source,
                    });
                }
            }
        }

        let state = serde_json::to_string_pretty(&next).map_err(|source| EmitError::State {
            path: state_path.display().to_string(),
            source,
        })?;
        write_file(&state_path, &state)?;

        info!(
            "emitted into {}: {} written, {} unchanged, {} removed, {} scaffold(s) created, {} reconciled",
            out_dir.display(),
            report.written.len(),
            report.unchanged.len(),
            report.removed.len(),
            report.scaffolds_created.len(),
            report.scaffolds_reconciled.len()
        );
        Ok(report)
    }
}

/// A missing or unreadable state file means "nothing recorded".
fn load_state(path: &Path) -> EmitState {
    let Ok(text) = fs::read_to_string(path) else {
        return EmitState::default();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!("ignoring unreadable {}: {e}", path.display());
        EmitState::default()
    })
}

fn ensure_parent(path: &Path) -> Result<PathBuf, EmitError> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent).map_err(|source| EmitError::Write {
        path: parent.display().to_string(),
        source,
    })?;
    Ok(parent)
}

fn write_file(path: &Path, content: &str) -> Result<(), EmitError> {
    ensure_parent(path)?;
    fs::write(path, content).map_err(|source| EmitError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// `content` in a temporary file next to `path`, ready to be persisted.
fn staged(path: &Path, content: &str) -> Result<NamedTempFile, EmitError> {
    let parent = ensure_parent(path)?;
    let write_err = |source| EmitError::Write {
        path: path.display().to_string(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    Ok(tmp)
}

/// Swap in new content for a user-owned file. Readers see the old file or
/// the new one, never a partial write.
fn replace_file(path: &Path, content: &str) -> Result<(), EmitError> {
    staged(path, content)?
        .persist(path)
        .map(|_| ())
        .map_err(|source| EmitError::Persist {
            path: path.display().to_string(),
            source,
        })
}

/// Create `path` with the scaffold content unless it already exists.
/// Returns whether the file was created.
fn create_scaffold(path: &Path, file: &GeneratedFile) -> Result<bool, EmitError> {
    if path.exists() {
        return Ok(false);
    }
    match staged(path, &file.content)?.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(EmitError::Persist {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::signature::ExpectedSignature;

    fn signature() -> ExpectedSignature {
        ExpectedSignature {
            method: "HandleAsync".into(),
            result_type: "GetPetResult".into(),
            parameters: "GetPetParameters parameters, CancellationToken cancellationToken".into(),
            qualify_task: false,
        }
    }

    fn output(fingerprint: &str, model: &str) -> GenerationOutput {
        GenerationOutput {
            files: vec![
                GeneratedFile::generated("Models/Pet.cs", model),
                GeneratedFile::scaffold(
                    "Pets/GetPetHandler.cs",
                    "class GetPetHandler { public async Task<GetPetResult> HandleAsync(GetPetParameters parameters, CancellationToken cancellationToken) {} }",
                    signature(),
                ),
            ],
            diagnostics: Vec::new(),
            fingerprint: Some(fingerprint.to_string()),
        }
    }

    #[test]
    fn second_emit_with_same_fingerprint_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let first = Emitter::new().emit(&output("k1", "record Pet;"), dir.path()).unwrap();
        assert_eq!(first.written, vec!["Models/Pet.cs"]);
        assert_eq!(first.scaffolds_created, vec!["Pets/GetPetHandler.cs"]);
        assert!(dir.path().join(STATE_FILE_NAME).exists());

        let second = Emitter::new().emit(&output("k1", "record Pet;"), dir.path()).unwrap();
        assert!(second.up_to_date);
        assert_eq!(second.writes(), 0);
    }

    #[test]
    fn only_changed_files_are_written_and_scaffolds_survive() {
        let dir = tempfile::tempdir().unwrap();
        Emitter::new().emit(&output("k1", "record Pet;"), dir.path()).unwrap();
        let handler = dir.path().join("Pets/GetPetHandler.cs");
        fs::write(
            &handler,
            "class GetPetHandler { public async Task<GetPetResult> HandleAsync(GetPetParameters parameters) { return Mine(); } }",
        )
        .unwrap();

        let report = Emitter::new().emit(&output("k2", "record Pet;"), dir.path()).unwrap();
        assert!(!report.up_to_date);
        assert_eq!(report.unchanged, vec!["Models/Pet.cs"]);
        assert_eq!(report.scaffolds_reconciled, vec!["Pets/GetPetHandler.cs"]);
        let text = fs::read_to_string(&handler).unwrap();
        assert!(text.contains("return Mine();"));
        assert!(text.contains("CancellationToken cancellationToken)"));

        let leftovers: Vec<_> = fs::read_dir(handler.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec!["GetPetHandler.cs"]);
    }

    #[test]
    fn replacing_a_file_keeps_a_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Handlers/Handler.cs");
        replace_file(&path, "old").unwrap();
        replace_file(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn stale_generated_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        Emitter::new().emit(&output("k1", "record Pet;"), dir.path()).unwrap();
        let empty = GenerationOutput {
            fingerprint: Some("k2".into()),
            ..GenerationOutput::default()
        };
        let report = Emitter::new().emit(&empty, dir.path()).unwrap();
        assert_eq!(report.removed, vec!["Models/Pet.cs"]);
        assert!(!dir.path().join("Models/Pet.cs").exists());
        assert!(dir.path().join("Pets/GetPetHandler.cs").exists());
    }
}
