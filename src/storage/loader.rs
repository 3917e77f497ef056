//! Definition loading
//!
//! Raw definitions are read from:
//! 1. a folder of `.yaml`/`.yml`/`.json` files (optionally a `<reference>` subfolder)
//! 2. a single file
//! 3. a URL, fetched with a blocking HTTP client
//! 4. an embedded document given inline in the configuration

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Specification source unavailable: {location}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: BoxError,
    },

    #[error("No definitions left in {location} after exclusions")]
    EmptyDefinitionSet { location: String },

    #[error("Invalid definition '{name}' ({origin}): {reason}")]
    InvalidDefinition {
        name: String,
        origin: String,
        reason: String,
    },
}

impl LoadError {
    fn unavailable(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        LoadError::SourceUnavailable {
            location: location.into(),
            source: source.into(),
        }
    }
}

/// Where raw definitions come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLocation {
    Folder(PathBuf),
    File(PathBuf),
    /// `{reference}` in the URL is replaced by the requested reference
    Url(String),
    Embedded { name: String, content: String },
}

impl SourceLocation {
    /// Resolves relative paths against `base`
    pub fn relative_to(&self, base: &Path) -> SourceLocation {
        match self {
            SourceLocation::Folder(path) => SourceLocation::Folder(base.join(path)),
            SourceLocation::File(path) => SourceLocation::File(base.join(path)),
            other => other.clone(),
        }
    }

    /// Short description for messages
    pub fn describe(&self) -> String {
        match self {
            SourceLocation::Folder(path) => format!("folder {}", path.display()),
            SourceLocation::File(path) => format!("file {}", path.display()),
            SourceLocation::Url(url) => format!("url {}", url),
            SourceLocation::Embedded { name, .. } => format!("embedded {}", name),
        }
    }
}

/// Serialization format of a raw definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Detects the format from a file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
            Some("json") => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    /// Guesses the format from document text
    pub fn sniff(content: &str) -> Self {
        match content.trim_start().chars().next() {
            Some('{') | Some('[') => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// One unparsed specification fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDefinition {
    /// Definition name, used for exclusion (file stem for files)
    pub name: String,

    /// Where the definition was read from
    pub origin: String,

    pub format: DocumentFormat,

    pub content: String,
}

impl RawDefinition {
    pub fn new(name: impl Into<String>, origin: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            origin: origin.into(),
            format: DocumentFormat::sniff(&content),
            content,
        }
    }

    /// Deserializes the definition into a typed record
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, LoadError> {
        let result = match self.format {
            DocumentFormat::Json => serde_json::from_str(&self.content).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(&self.content).map_err(|e| e.to_string()),
        };

        result.map_err(|reason| LoadError::InvalidDefinition {
            name: self.name.clone(),
            origin: self.origin.clone(),
            reason,
        })
    }
}

/// Loads all raw definitions from a source, minus the excluded names
///
/// Exclusion is an exact, case-sensitive match on the definition name.
pub fn load(
    location: &SourceLocation,
    reference: Option<&str>,
    excluded: &[String],
) -> Result<Vec<RawDefinition>, LoadError> {
    let definitions = match location {
        SourceLocation::Folder(path) => read_folder(&versioned_folder(path, reference))?,
        SourceLocation::File(path) => vec![read_file(path)?],
        SourceLocation::Url(url) => vec![fetch_url(url, reference)?],
        SourceLocation::Embedded { name, content } => {
            vec![RawDefinition::new(name.clone(), "embedded", content.clone())]
        }
    };

    let total = definitions.len();
    let definitions: Vec<_> = definitions
        .into_iter()
        .filter(|d| !excluded.contains(&d.name))
        .collect();

    info!(
        source = %location.describe(),
        loaded = definitions.len(),
        excluded = total - definitions.len(),
        "loaded definitions"
    );

    if definitions.is_empty() {
        return Err(LoadError::EmptyDefinitionSet {
            location: location.describe(),
        });
    }

    Ok(definitions)
}

/// Prefers `<folder>/<reference>` when that subfolder exists
fn versioned_folder(folder: &Path, reference: Option<&str>) -> PathBuf {
    match reference {
        Some(reference) if folder.join(reference).is_dir() => folder.join(reference),
        _ => folder.to_path_buf(),
    }
}

fn read_folder(dir: &Path) -> Result<Vec<RawDefinition>, LoadError> {
    let location = dir.display().to_string();
    let entries = fs::read_dir(dir).map_err(|e| LoadError::unavailable(&location, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LoadError::unavailable(&location, e))?.path();
        if path.is_file() && DocumentFormat::from_extension(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    paths.iter().map(|path| read_file(path)).collect()
}

fn read_file(path: &Path) -> Result<RawDefinition, LoadError> {
    let content =
        fs::read_to_string(path).map_err(|e| LoadError::unavailable(path.display().to_string(), e))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    debug!(definition = %name, path = %path.display(), "read definition");

    Ok(RawDefinition {
        name,
        origin: path.display().to_string(),
        format: DocumentFormat::from_extension(path).unwrap_or_else(|| DocumentFormat::sniff(&content)),
        content,
    })
}

fn fetch_url(url: &str, reference: Option<&str>) -> Result<RawDefinition, LoadError> {
    let url = url.replace("{reference}", reference.unwrap_or("master"));
    debug!(url = %url, "fetching definition");

    let content = reqwest::blocking::get(&url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|e| LoadError::unavailable(&url, e))?;

    let file_name = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .unwrap_or_default();
    let path = Path::new(file_name);
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string();

    Ok(RawDefinition {
        name,
        format: DocumentFormat::from_extension(path).unwrap_or_else(|| DocumentFormat::sniff(&content)),
        origin: url,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn reads_folder_in_name_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docker_run.yaml", "command: docker run\n");
        write(dir.path(), "docker_build.yaml", "command: docker build\n");
        write(dir.path(), "README.md", "not a definition");

        let definitions = load(&SourceLocation::Folder(dir.path().to_path_buf()), None, &[]).unwrap();

        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["docker_build", "docker_run"]);
        assert_eq!(definitions[0].format, DocumentFormat::Yaml);
    }

    #[test]
    fn exclusion_is_exact_and_case_sensitive() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docker_run.yaml", "command: docker run\n");
        write(dir.path(), "docker_build.yaml", "command: docker build\n");

        let location = SourceLocation::Folder(dir.path().to_path_buf());
        let excluded = vec!["Docker_Run".to_string(), "docker_bu".to_string()];
        assert_eq!(load(&location, None, &excluded).unwrap().len(), 2);

        let excluded = vec!["docker_run".to_string()];
        let definitions = load(&location, None, &excluded).unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "docker_build");
    }

    #[test]
    fn everything_excluded_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docker_run.yaml", "command: docker run\n");

        let err = load(
            &SourceLocation::Folder(dir.path().to_path_buf()),
            None,
            &["docker_run".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::EmptyDefinitionSet { .. }));
    }

    #[test]
    fn missing_folder_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = load(&SourceLocation::Folder(dir.path().join("nope")), None, &[]).unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
    }

    #[test]
    fn reference_selects_versioned_subfolder() {
        let dir = TempDir::new().unwrap();
        let versioned = dir.path().join("v20.10");
        fs::create_dir_all(&versioned).unwrap();
        write(dir.path(), "docker_old.yaml", "command: docker old\n");
        write(&versioned, "docker_new.yaml", "command: docker new\n");

        let location = SourceLocation::Folder(dir.path().to_path_buf());
        let definitions = load(&location, Some("v20.10"), &[]).unwrap();
        assert_eq!(definitions[0].name, "docker_new");

        let definitions = load(&location, Some("v99"), &[]).unwrap();
        assert_eq!(definitions[0].name, "docker_old");
    }

    #[test]
    fn embedded_source_sniffs_format() {
        let location = SourceLocation::Embedded {
            name: "inline".to_string(),
            content: r#"{"command": "docker run"}"#.to_string(),
        };

        let definitions = load(&location, None, &[]).unwrap();
        assert_eq!(definitions[0].format, DocumentFormat::Json);
        assert_eq!(definitions[0].origin, "embedded");
    }

    #[test]
    fn parse_reports_invalid_definition() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Record {
            command: String,
        }

        let ok = RawDefinition::new("a", "test", "command: docker run\n");
        assert_eq!(ok.parse::<Record>().unwrap().command, "docker run");

        let bad = RawDefinition::new("b", "test", "usage: nothing\n");
        let err = bad.parse::<Record>().unwrap_err();
        assert!(matches!(err, LoadError::InvalidDefinition { ref name, .. } if name == "b"));
    }

    #[test]
    fn source_location_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            source: SourceLocation,
        }

        let folder: Wrapper = toml::from_str(r#"source = { folder = "docs/reference" }"#).unwrap();
        assert_eq!(folder.source, SourceLocation::Folder(PathBuf::from("docs/reference")));

        let embedded: Wrapper =
            toml::from_str(r#"source = { embedded = { name = "x", content = "a: 1" } }"#).unwrap();
        assert!(matches!(embedded.source, SourceLocation::Embedded { .. }));
    }
}
