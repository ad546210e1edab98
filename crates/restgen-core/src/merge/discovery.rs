use log::debug;

use crate::config::{DiscoveryMode, MultiPartConfiguration};
use crate::diagnostics::Diagnostic;
use crate::source::{SpecificationFile, is_spec_file_name};

use super::{MULTIPART_AMBIGUOUS_BASE, MULTIPART_MISSING_PART};

/// A base document and the parts that merge into it.
#[derive(Debug, Clone)]
pub struct FileGroup {
    pub base: SpecificationFile,
    pub parts: Vec<SpecificationFile>,
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub groups: Vec<FileGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Group files into bases and parts according to the configuration.
/// With multi-part disabled every file stands alone.
pub fn discover_with(files: &[SpecificationFile], config: &MultiPartConfiguration) -> Discovery {
    if !config.enabled {
        let groups = yaml_files(files)
            .into_iter()
            .map(|f| FileGroup {
                base: f.as_base(),
                parts: Vec::new(),
            })
            .collect();
        return Discovery {
            groups,
            diagnostics: Vec::new(),
        };
    }
    match config.discovery {
        DiscoveryMode::Auto => discover(files),
        DiscoveryMode::Explicit => discover_explicit(files, &config.part_files),
    }
}

/// Group files by the `{Base}_{Part}` naming convention.
///
/// A stem is a base when no other stem `P` exists such that it starts with
/// `P_`. Every other stem belongs to the base that prefixes it, so chains
/// (`A_B_C` next to `A_B` and `A`) flatten onto `A`. When every file looks
/// like a part, the shortest name becomes the base.
pub fn discover(files: &[SpecificationFile]) -> Discovery {
    let mut files = yaml_files(files);
    files.sort_by(|a, b| a.stem().cmp(b.stem()));
    let mut diagnostics = Vec::new();

    if files.is_empty() {
        return Discovery::default();
    }

    let stems: Vec<&str> = files.iter().map(|f| f.stem()).collect();
    let is_base = |stem: &str| {
        !stems
            .iter()
            .any(|p| *p != stem && has_part_prefix(stem, p))
    };

    let all_look_like_parts =
        files.len() > 1 && stems.iter().all(|s| s.contains('_') && is_base(*s));

    if all_look_like_parts {
        let shortest = stems.iter().map(|s| s.len()).min().unwrap_or(0);
        // `files` is sorted, so the first shortest stem is alphabetically first.
        let tied: Vec<&str> = stems.iter().copied().filter(|s| s.len() == shortest).collect();
        let base_stem = tied[0].to_string();
        if tied.len() > 1 {
            diagnostics.push(
                Diagnostic::warning(
                    MULTIPART_AMBIGUOUS_BASE,
                    format!(
                        "every file looks like a part; picked '{base_stem}' as the base among equally short names: {}",
                        tied.join(", ")
                    ),
                )
                .with_suggestion(format!(
                    "add a base file named '{}.yaml'",
                    base_stem.split('_').next().unwrap_or(&base_stem)
                )),
            );
        }
        debug!("no base file found, falling back to '{base_stem}'");
        let prefix = base_stem.split('_').next().unwrap_or(&base_stem).to_string();
        let mut base = None;
        let mut parts = Vec::new();
        for f in &files {
            if f.stem() == base_stem && base.is_none() {
                base = Some(f.clone().as_base());
            } else {
                parts.push(f.clone().as_part_of(&prefix));
            }
        }
        let groups = base
            .map(|base| FileGroup { base, parts })
            .into_iter()
            .collect();
        return Discovery {
            groups,
            diagnostics,
        };
    }

    let mut groups: Vec<FileGroup> = files
        .iter()
        .filter(|f| is_base(f.stem()))
        .map(|f| FileGroup {
            base: f.clone().as_base(),
            parts: Vec::new(),
        })
        .collect();

    for f in &files {
        if is_base(f.stem()) {
            continue;
        }
        let owner = groups
            .iter_mut()
            .find(|g| has_part_prefix(f.stem(), g.base.stem()));
        if let Some(group) = owner {
            let base_stem = group.base.stem().to_string();
            group.parts.push(f.clone().as_part_of(&base_stem));
        }
    }

    for g in &groups {
        debug!(
            "discovered base '{}' with {} part(s)",
            g.base.stem(),
            g.parts.len()
        );
    }

    Discovery {
        groups,
        diagnostics,
    }
}

/// Parts are exactly the files named in `part_files`; the first remaining
/// file is their base and any other file stands alone.
pub fn discover_explicit(files: &[SpecificationFile], part_files: &[String]) -> Discovery {
    let files = yaml_files(files);
    let mut diagnostics = Vec::new();

    let listed = |f: &SpecificationFile| part_files.iter().any(|p| names_file(p, f));

    let mut bases = files.iter().filter(|&f| !listed(f));
    let Some(first) = bases.next() else {
        diagnostics.push(Diagnostic::error(
            MULTIPART_MISSING_PART,
            "every specification file is listed as a part; no base file remains",
        ));
        return Discovery {
            groups: Vec::new(),
            diagnostics,
        };
    };

    let mut parts = Vec::new();
    for name in part_files {
        match files.iter().find(|f| names_file(name, f)) {
            Some(f) => parts.push(f.clone().as_part_of(first.stem())),
            None => diagnostics.push(
                Diagnostic::error(
                    MULTIPART_MISSING_PART,
                    format!("part file '{name}' listed in partFiles was not found"),
                )
                .at("multiPartConfiguration.partFiles"),
            ),
        }
    }

    let mut groups = vec![FileGroup {
        base: first.clone().as_base(),
        parts,
    }];
    groups.extend(bases.map(|f| FileGroup {
        base: f.clone().as_base(),
        parts: Vec::new(),
    }));

    Discovery {
        groups,
        diagnostics,
    }
}

fn yaml_files(files: &[SpecificationFile]) -> Vec<SpecificationFile> {
    files
        .iter()
        .filter(|f| is_spec_file_name(f.path()))
        .cloned()
        .collect()
}

fn has_part_prefix(stem: &str, prefix: &str) -> bool {
    stem.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('_') && rest.len() > 1)
}

fn names_file(name: &str, file: &SpecificationFile) -> bool {
    let name = name.replace('\\', "/");
    file.path() == name || file.file_name() == name || file.path().ends_with(&format!("/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseCache;

    fn files(names: &[&str]) -> Vec<SpecificationFile> {
        let cache = ParseCache::new();
        names
            .iter()
            .map(|n| SpecificationFile::new(n, "paths: {}\n", &cache))
            .collect()
    }

    fn summary(d: &Discovery) -> Vec<(String, Vec<String>)> {
        d.groups
            .iter()
            .map(|g| {
                (
                    g.base.stem().to_string(),
                    g.parts
                        .iter()
                        .map(|p| p.part_name().unwrap_or_default().to_string())
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn base_with_parts() {
        let d = discover(&files(&["Api.yaml", "Api_Pets.yaml", "Api_Users.yml", "notes.txt"]));
        assert_eq!(
            summary(&d),
            vec![("Api".to_string(), vec!["Pets".to_string(), "Users".to_string()])]
        );
        assert!(d.diagnostics.is_empty());
    }

    #[test]
    fn chains_flatten_to_root() {
        let d = discover(&files(&["A.yaml", "A_B.yaml", "A_B_C.yaml"]));
        assert_eq!(
            summary(&d),
            vec![("A".to_string(), vec!["B".to_string(), "B_C".to_string()])]
        );
    }

    #[test]
    fn independent_bases() {
        let d = discover(&files(&["Orders.yaml", "Pets.yaml", "Pets_Vets.yaml"]));
        assert_eq!(d.groups.len(), 2);
        assert_eq!(d.groups[0].base.stem(), "Orders");
        assert_eq!(d.groups[1].parts.len(), 1);
    }

    #[test]
    fn shortest_wins_when_everything_is_a_part() {
        let d = discover(&files(&["Api_Users.yaml", "Api_Pets.yaml", "Api_Orderbook.yaml"]));
        assert_eq!(d.groups.len(), 1);
        assert_eq!(d.groups[0].base.stem(), "Api_Pets");
        assert!(d.groups[0].base.is_base());
        assert!(d.diagnostics.is_empty());
    }

    #[test]
    fn ambiguous_fallback_is_flagged() {
        let d = discover(&files(&["Api_Dogs.yaml", "Api_Cats.yaml"]));
        assert_eq!(d.groups[0].base.stem(), "Api_Cats");
        assert_eq!(d.diagnostics.len(), 1);
        assert_eq!(d.diagnostics[0].code, MULTIPART_AMBIGUOUS_BASE);
    }

    #[test]
    fn explicit_listing() {
        let d = discover_explicit(
            &files(&["Main.yaml", "Extra.yaml", "Other.yaml"]),
            &["Extra.yaml".to_string(), "Missing.yaml".to_string()],
        );
        assert_eq!(d.groups[0].base.stem(), "Main");
        assert_eq!(d.groups[0].parts[0].stem(), "Extra");
        assert_eq!(d.groups.len(), 2);
        assert_eq!(d.diagnostics.len(), 1);
        assert_eq!(d.diagnostics[0].code, MULTIPART_MISSING_PART);
    }

    #[test]
    fn disabled_keeps_files_apart() {
        let config = MultiPartConfiguration {
            enabled: false,
            ..Default::default()
        };
        let d = discover_with(&files(&["Api.yaml", "Api_Pets.yaml"]), &config);
        assert_eq!(d.groups.len(), 2);
        assert!(d.groups.iter().all(|g| g.parts.is_empty() && g.base.is_base()));
    }
}
