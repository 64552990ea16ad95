// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Source layout shipped with the crate. Compiled in, so the binary does not
/// depend on the directory it is started from.
pub const BUNDLED_CONFIG: &str = include_str!("../resources/openaddresses.yaml");

/// One expected file inside a country or subdivision directory.
/// Other keys in the YAML entry (urls, column hints, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub filename: String,
}

impl FileEntry {
    /// Filename minus its extension, which is what the source is called.
    pub fn source_name(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.filename)
    }
}

/// Directory layout of a country, or of a subdivision inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryConfig {
    subdirs: Vec<(String, CountryConfig)>,
    files: Vec<FileEntry>,
}

impl CountryConfig {
    pub fn subdir(&self, name: &str) -> Option<&CountryConfig> {
        self.subdirs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cfg)| cfg)
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Exact, case-sensitive filename match.
    pub fn has_file(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f.filename == filename)
    }
}

/// A declared `(country[, subdivision], source)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    pub country: String,
    pub subdivision: Option<String>,
    pub source: String,
}

impl SourcePath {
    /// Directory components in order, without the source itself.
    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.country.as_str()).chain(self.subdivision.as_deref())
    }
}

/// Immutable description of which source files live where.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceConfig {
    countries: Vec<(String, CountryConfig)>,
    sources: Vec<SourcePath>,
}

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    countries: Mapping,
}

#[derive(Deserialize, Default)]
struct RawCountry {
    #[serde(default)]
    subdirs: Mapping,
    #[serde(default)]
    files: Vec<FileEntry>,
}

impl SourceConfig {
    /// The layout bundled with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_yaml_str(BUNDLED_CONFIG).context("parsing bundled source config")
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<RawConfig> = serde_yaml::from_str(text).context("invalid YAML")?;
        let countries = ordered_configs(raw.unwrap_or_default().countries)?;
        Ok(Self::new(countries))
    }

    /// Build a config directly; countries and their subdirs keep the given order.
    pub fn new(countries: Vec<(String, CountryConfig)>) -> Self {
        let mut sources = Vec::new();
        for (country, cfg) in &countries {
            for file in &cfg.files {
                sources.push(SourcePath {
                    country: country.clone(),
                    subdivision: None,
                    source: file.source_name().to_string(),
                });
            }
            for (subdir, sub_cfg) in &cfg.subdirs {
                for file in &sub_cfg.files {
                    sources.push(SourcePath {
                        country: country.clone(),
                        subdivision: Some(subdir.clone()),
                        source: file.source_name().to_string(),
                    });
                }
            }
        }
        Self { countries, sources }
    }

    pub fn country(&self, name: &str) -> Option<&CountryConfig> {
        self.countries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cfg)| cfg)
    }

    /// Every declared source, in document order: a country's own files, then its subdirs'.
    pub fn sources(&self) -> &[SourcePath] {
        &self.sources
    }
}

impl CountryConfig {
    pub fn new(subdirs: Vec<(String, CountryConfig)>, files: Vec<FileEntry>) -> Self {
        Self { subdirs, files }
    }

    /// Shorthand for a directory that only lists files.
    pub fn with_files<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subdirs: Vec::new(),
            files: filenames
                .into_iter()
                .map(|f| FileEntry { filename: f.into() })
                .collect(),
        }
    }
}

fn ordered_configs(mapping: Mapping) -> Result<Vec<(String, CountryConfig)>> {
    let mut out = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let name = match key {
            Value::String(s) => s,
            other => return Err(anyhow!("directory name must be a string, got {:?}", other)),
        };
        let raw: RawCountry = if value.is_null() {
            RawCountry::default()
        } else {
            serde_yaml::from_value(value).with_context(|| format!("in entry {:?}", name))?
        };
        let subdirs = ordered_configs(raw.subdirs)?;
        out.push((name, CountryConfig::new(subdirs, raw.files)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const SAMPLE: &str = r#"
countries:
  us:
    files:
      - filename: statewide.csv
        url: http://example.com/statewide.zip
    subdirs:
      ny:
        files:
          - filename: city.csv
          - filename: city_of_buffalo.csv
      ca:
        files:
          - filename: san_francisco.csv
  de:
    files:
      - filename: berlin.csv
  fr:
"#;

    #[test]
    fn parses_tree_and_lookups() -> Result<()> {
        let cfg = SourceConfig::from_yaml_str(SAMPLE)?;

        let us = cfg.country("us").expect("us configured");
        assert!(us.has_file("statewide.csv"));
        assert!(!us.has_file("Statewide.csv"));
        assert!(us.subdir("ny").expect("ny").has_file("city.csv"));
        assert!(us.subdir("tx").is_none());
        assert!(cfg.country("fr").expect("fr").files().is_empty());
        assert!(cfg.country("xx").is_none());
        Ok(())
    }

    #[test]
    fn sources_follow_document_order() -> Result<()> {
        let cfg = SourceConfig::from_yaml_str(SAMPLE)?;
        let got: Vec<String> = cfg
            .sources()
            .iter()
            .map(|s| {
                s.dirs()
                    .chain(std::iter::once(s.source.as_str()))
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();
        assert_eq!(
            got,
            vec![
                "us/statewide",
                "us/ny/city",
                "us/ny/city_of_buffalo",
                "us/ca/san_francisco",
                "de/berlin",
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_document_is_empty_config() -> Result<()> {
        let cfg = SourceConfig::from_yaml_str("")?;
        assert!(cfg.sources().is_empty());
        Ok(())
    }

    #[test]
    fn bundled_config_is_compiled_in() -> Result<()> {
        let cfg = SourceConfig::bundled()?;
        assert!(!cfg.sources().is_empty());
        let first = &cfg.sources()[0];
        assert_eq!(first.country, "us");
        assert_eq!(first.subdivision.as_deref(), Some("ny"));
        assert_eq!(first.source, "city_of_new_york");
        Ok(())
    }

    #[test]
    fn bundled_config_resolves_configured_source() -> Result<()> {
        let cfg = SourceConfig::bundled()?;
        let id = crate::resolve::resolve(&cfg, "/srv/oa/us/ny/city_of_new_york.csv");
        assert_eq!(id.label(), "us/ny/city_of_new_york");
        Ok(())
    }

    #[test]
    fn rejects_malformed_files_list() {
        let bad = "countries:\n  us:\n    files: 12\n";
        assert!(SourceConfig::from_yaml_str(bad).is_err());
    }
}
