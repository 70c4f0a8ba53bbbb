//! Translation catalogs for system-defined entities.
//!
//! Each language is a flat JSON object mapping the stored (English) text of
//! a system category, task, or wish to its localized form:
//!
//! ```json
//! { "Groceries": "Lebensmittel", "Cleaning": "Putzen" }
//! ```
//!
//! Catalogs live in `<dir>/<lang>.json`. A lookup miss is not an error:
//! callers fall back to the stored text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Key → localized string lookup.
pub trait Localizer {
    /// The localized string for `key`, or `None` when the catalog has no entry.
    fn lookup(&self, key: &str) -> Option<&str>;
}

#[derive(Debug, thiserror::Error)]
pub enum LocalizationError {
    #[error("Failed to read locale file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Locale file {path} is not a flat JSON string map: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One language's strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Localizer for Catalog {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// All loaded catalogs plus the language used when a request names none.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    catalogs: HashMap<String, Catalog>,
    default_language: String,
    empty: Catalog,
}

impl Translations {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            catalogs: HashMap::new(),
            default_language: default_language.into().to_ascii_lowercase(),
            empty: Catalog::default(),
        }
    }

    /// Load every `*.json` file in `dir`; the file stem is the language tag.
    ///
    /// A missing directory yields no catalogs; every lookup then falls back
    /// to stored text.
    pub fn load_dir(
        dir: impl AsRef<Path>,
        default_language: impl Into<String>,
    ) -> Result<Self, LocalizationError> {
        let dir = dir.as_ref();
        let mut translations = Self::new(default_language);

        if !dir.is_dir() {
            tracing::warn!(
                dir = %dir.display(),
                "Locale directory not found, translations disabled"
            );
            return Ok(translations);
        }

        let entries = std::fs::read_dir(dir).map_err(|source| LocalizationError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let path = entry
                .map_err(|source| LocalizationError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let language = language.to_ascii_lowercase();

            let text = std::fs::read_to_string(&path).map_err(|source| LocalizationError::Io {
                path: path.clone(),
                source,
            })?;
            let catalog = Catalog::from_json(&text).map_err(|source| LocalizationError::Parse {
                path: path.clone(),
                source,
            })?;

            tracing::debug!(language = %language, entries = catalog.len(), "Loaded locale");
            translations.insert(language, catalog);
        }

        Ok(translations)
    }

    pub fn insert(&mut self, language: impl Into<String>, catalog: Catalog) {
        self.catalogs
            .insert(language.into().to_ascii_lowercase(), catalog);
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    /// Catalog for `language` (case-insensitive), else the default
    /// language's, else an empty one.
    pub fn catalog(&self, language: Option<&str>) -> &Catalog {
        language
            .and_then(|l| self.catalogs.get(&l.to_ascii_lowercase()))
            .or_else(|| self.catalogs.get(&self.default_language))
            .unwrap_or(&self.empty)
    }

    /// Pick a catalog from an `Accept-Language` header value.
    ///
    /// Entries are tried by descending `q` weight; each entry matches on
    /// its full tag first and then on its primary subtag (`de-AT` → `de`).
    pub fn negotiate(&self, accept_language: Option<&str>) -> &Catalog {
        let Some(header) = accept_language else {
            return self.catalog(None);
        };

        for tag in parse_accept_language(header) {
            let primary = tag.split('-').next().unwrap_or(&tag);
            for candidate in [tag.as_str(), primary] {
                if let Some(catalog) = self.catalogs.get(candidate) {
                    return catalog;
                }
            }
        }
        self.catalog(None)
    }
}

/// Language tags from an `Accept-Language` value, highest weight first.
fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.trim().split(';');
            let tag = pieces.next()?.trim().to_ascii_lowercase();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let q = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((tag, q))
        })
        .collect();
    // Stable sort keeps header order among equal weights.
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}
