// src/resolve.rs
use std::path::Path;

use crate::config::{SourceConfig, SourcePath};

/// Where a file sits in the configured tree. All `None` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceIdentity {
    pub country: Option<String>,
    pub subdivision: Option<String>,
    pub source: Option<String>,
}

impl SourceIdentity {
    pub fn is_resolved(&self) -> bool {
        self.country.is_some()
    }

    /// Present components joined with `/`, e.g. `us/ny/city`.
    pub fn label(&self) -> String {
        [&self.country, &self.subdivision, &self.source]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl From<&SourcePath> for SourceIdentity {
    fn from(p: &SourcePath) -> Self {
        Self {
            country: Some(p.country.clone()),
            subdivision: p.subdivision.clone(),
            source: Some(p.source.clone()),
        }
    }
}

fn dir_name(path: Option<&Path>) -> Option<&str> {
    path.and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|n| n.trim_end_matches('/'))
}

/// Match `file_path` against `config`: first as `country/source.csv`,
/// then as `country/subdivision/source.csv`.
pub fn resolve(config: &SourceConfig, file_path: impl AsRef<Path>) -> SourceIdentity {
    let file_path = file_path.as_ref();
    let source = match file_path.file_stem().and_then(|s| s.to_str()) {
        Some(s) => s,
        None => return SourceIdentity::default(),
    };
    let expected = format!("{}.csv", source);

    let parent = file_path.parent();
    let l1 = match dir_name(parent) {
        Some(d) => d,
        None => return SourceIdentity::default(),
    };

    if let Some(country) = config.country(l1) {
        if country.has_file(&expected) {
            return SourceIdentity {
                country: Some(l1.to_string()),
                subdivision: None,
                source: Some(source.to_string()),
            };
        }
    }

    let l2 = dir_name(parent.and_then(Path::parent));
    let matched = l2
        .and_then(|l2| config.country(l2))
        .and_then(|country| country.subdir(l1))
        .map_or(false, |subdir| subdir.has_file(&expected));
    if let (true, Some(l2)) = (matched, l2) {
        return SourceIdentity {
            country: Some(l2.to_string()),
            subdivision: Some(l1.to_string()),
            source: Some(source.to_string()),
        };
    }

    SourceIdentity::default()
}

/// Object key for an identity under `base`. `None` unless country and source are known.
pub fn remote_path(base: &str, identity: &SourceIdentity) -> Option<String> {
    let country = identity.country.as_deref()?;
    let source = identity.source.as_deref()?;
    let file = format!("{}.geojson", source);

    let mut parts = vec![base.trim_end_matches('/'), country];
    if let Some(sub) = identity.subdivision.as_deref() {
        parts.push(sub);
    }
    parts.push(&file);
    Some(parts.join("/"))
}
