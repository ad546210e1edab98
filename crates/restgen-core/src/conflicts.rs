//! Type naming across segments. Every component schema gets a simple C#
//! name and a home namespace once per document; each segment then asks a
//! cheap per-segment view how to spell a reference.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;

use crate::naming::normalize_name;
use crate::parse::spec::OpenApiSpec;
use crate::partition::Partition;

/// Framework types generated code refers to by short name, with the
/// spelling to use when a schema shadows them.
const FRAMEWORK_TYPES: &[(&str, &str)] = &[
    ("Task", "System.Threading.Tasks.Task"),
    ("CancellationToken", "System.Threading.CancellationToken"),
    ("Results", "Microsoft.AspNetCore.Http.Results"),
    ("TypedResults", "Microsoft.AspNetCore.Http.TypedResults"),
    ("IResult", "Microsoft.AspNetCore.Http.IResult"),
    ("HttpContext", "Microsoft.AspNetCore.Http.HttpContext"),
    ("IFormFile", "Microsoft.AspNetCore.Http.IFormFile"),
    ("Guid", "System.Guid"),
    ("DateTime", "System.DateTime"),
    ("DateTimeOffset", "System.DateTimeOffset"),
    ("DateOnly", "System.DateOnly"),
    ("Uri", "System.Uri"),
    ("Stream", "System.IO.Stream"),
    ("File", "System.IO.File"),
    ("Action", "System.Action"),
    ("Object", "System.Object"),
    ("String", "System.String"),
    ("HttpClient", "System.Net.Http.HttpClient"),
    ("JsonElement", "System.Text.Json.JsonElement"),
];

/// Where a schema's type is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHome {
    pub simple_name: String,
    /// Owning segment; `None` for the shared models.
    pub segment: Option<String>,
}

/// Namespace for the models of `segment` (`None` for shared models).
pub fn models_namespace(project: &str, segment: Option<&str>) -> String {
    match segment {
        Some(s) => format!("{project}.Generated.{s}.Models"),
        None => format!("{project}.Generated.Models"),
    }
}

/// Document-wide naming decisions, computed once per run.
#[derive(Debug, Default)]
pub struct ConflictSet {
    homes: HashMap<String, TypeHome>,
    /// Simple name to the homes that declare it.
    by_simple_name: HashMap<String, Vec<Option<String>>>,
}

impl ConflictSet {
    /// Assign every component schema its simple name and home. Names that
    /// collide inside one namespace get numeric suffixes in document order.
    pub fn scan(doc: &OpenApiSpec, partition: &Partition) -> Self {
        let mut set = ConflictSet::default();
        let mut taken: HashSet<(Option<String>, String)> = HashSet::new();
        let homes = partition.homes();
        for key in doc.schemas().into_iter().flat_map(|s| s.keys()) {
            let segment = homes.get(key.as_str()).copied().flatten().map(str::to_string);
            let base = normalize_name(key).pascal_case;
            let mut simple = base.clone();
            let mut n = 2;
            while taken.contains(&(segment.clone(), simple.clone())) {
                simple = format!("{base}{n}");
                n += 1;
            }
            taken.insert((segment.clone(), simple.clone()));
            set.by_simple_name
                .entry(simple.clone())
                .or_default()
                .push(segment.clone());
            set.homes.insert(
                key.clone(),
                TypeHome {
                    simple_name: simple,
                    segment,
                },
            );
        }
        debug!(
            "type registry: {} schemas, {} names declared in several namespaces",
            set.homes.len(),
            set.by_simple_name.values().filter(|h| h.len() > 1).count()
        );
        set
    }

    pub fn home(&self, key: &str) -> Option<&TypeHome> {
        self.homes.get(key)
    }

    pub fn len(&self) -> usize {
        self.homes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.homes.is_empty()
    }

    pub fn declares(&self, simple_name: &str) -> bool {
        self.by_simple_name.contains_key(simple_name)
    }

    /// Simple names declared in more than one namespace, sorted.
    pub fn collisions(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = self
            .by_simple_name
            .iter()
            .filter(|(_, homes)| homes.len() > 1)
            .map(|(name, homes)| (name.as_str(), homes.len()))
            .collect();
        out.sort();
        out
    }
}

/// The view of a [`ConflictSet`] from one segment.
#[derive(Debug, Clone)]
pub struct TypeConflictRegistry {
    set: Arc<ConflictSet>,
    project: String,
    segment: Option<String>,
}

impl TypeConflictRegistry {
    pub fn for_segment(set: &Arc<ConflictSet>, project: &str, segment: Option<&str>) -> Self {
        Self {
            set: Arc::clone(set),
            project: project.to_string(),
            segment: segment.map(str::to_string),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    /// Namespace of the segment's endpoints, handlers and records.
    pub fn namespace(&self) -> String {
        match &self.segment {
            Some(s) => format!("{}.Generated.{s}", self.project),
            None => format!("{}.Generated", self.project),
        }
    }

    pub fn models_namespace(&self) -> String {
        models_namespace(&self.project, self.segment.as_deref())
    }

    /// Model namespaces code in this segment imports: the shared models
    /// first, then the segment's own.
    pub fn imported_namespaces(&self) -> Vec<String> {
        let mut out = vec![models_namespace(&self.project, None)];
        if self.segment.is_some() {
            out.push(self.models_namespace());
        }
        out
    }

    pub fn simple_name(&self, key: &str) -> Option<&str> {
        self.set.home(key).map(|h| h.simple_name.as_str())
    }

    /// Fully qualified type name; the same from every segment.
    pub fn qualified_name(&self, key: &str) -> Option<String> {
        let home = self.set.home(key)?;
        Some(format!(
            "{}.{}",
            models_namespace(&self.project, home.segment.as_deref()),
            home.simple_name
        ))
    }

    /// Whether `simple_name` can mean more than one type here: it shadows a
    /// framework type, or both namespaces this segment imports declare it.
    pub fn is_ambiguous(&self, simple_name: &str) -> bool {
        if FRAMEWORK_TYPES.iter().any(|(short, _)| *short == simple_name) {
            return true;
        }
        self.set
            .by_simple_name
            .get(simple_name)
            .is_some_and(|homes| homes.iter().filter(|h| self.sees(h.as_deref())).count() > 1)
    }

    fn sees(&self, home: Option<&str>) -> bool {
        home.is_none() || home == self.segment.as_deref()
    }

    /// How code in this segment spells a reference to schema `key`.
    pub fn type_reference(&self, key: &str) -> String {
        let Some(home) = self.set.home(key) else {
            return normalize_name(key).pascal_case;
        };
        if self.is_ambiguous(&home.simple_name) || !self.sees(home.segment.as_deref()) {
            self.qualified_name(key)
                .unwrap_or_else(|| home.simple_name.clone())
        } else {
            home.simple_name.clone()
        }
    }

    /// Spelling for a framework type: qualified when a schema shadows it.
    pub fn builtin_reference(&self, name: &str) -> String {
        match FRAMEWORK_TYPES.iter().find(|(short, _)| *short == name) {
            Some((_, full)) if self.set.declares(name) => full.to_string(),
            _ => name.to_string(),
        }
    }
}
