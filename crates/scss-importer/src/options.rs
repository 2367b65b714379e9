//! Session configuration.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A session is configured with a [`SessionOptions`]. A handful of keys are
//! understood by the compiler itself; everything else is carried along
//! untouched so custom importers can read it:
//!
//! ```json
//! {
//!   "filename": "site.scss",
//!   "load_paths": ["vendor", "themes/base"],
//!   "minified": false,
//!   "cdn_host": "https://cdn.example.com"
//! }
//! ```
//!
//! The importer itself is not representable as data and must be registered
//! with [`SessionOptions::with_importer`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::importer::Importer;

/// Key naming the custom importer.
pub const OPTION_IMPORTER: &str = "importer";
/// Key holding the ordered list of load paths.
pub const OPTION_LOAD_PATHS: &str = "load_paths";
/// Key holding the logical path of the root document.
pub const OPTION_FILENAME: &str = "filename";
/// Key selecting compressed output.
pub const OPTION_MINIFIED: &str = "minified";

/// Parent path reported for top-level imports when no `filename` is set.
pub const DEFAULT_FILENAME: &str = "stdin";

/// String-keyed option values visible to importers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Configuration for one compilation session.
#[derive(Clone, Default)]
pub struct SessionOptions {
    /// Custom importer consulted before the filesystem.
    pub importer: Option<Arc<dyn Importer>>,

    /// Directories searched after the importing file's own directory,
    /// in order. The first match wins.
    pub load_paths: Vec<PathBuf>,

    /// Logical path of the root document; the parent path of top-level
    /// imports. Defaults to [`DEFAULT_FILENAME`].
    pub filename: Option<String>,

    /// Whether the compiler core should produce compressed output.
    pub minified: bool,

    /// Options not recognized by the compiler, passed through verbatim.
    pub extra: Options,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_importer(mut self, importer: impl Importer + 'static) -> Self {
        self.importer = Some(Arc::new(importer));
        self
    }

    pub fn with_shared_importer(mut self, importer: Arc<dyn Importer>) -> Self {
        self.importer = Some(importer);
        self
    }

    pub fn with_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    pub fn with_load_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.load_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_minified(mut self, minified: bool) -> Self {
        self.minified = minified;
        self
    }

    /// Add a pass-through option.
    ///
    /// A string `filename` sets the root filename. Other recognized keys set
    /// this way are overridden by the typed fields when the session builds
    /// its options mapping.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        match value.into() {
            Value::String(filename) if key == OPTION_FILENAME => self.filename = Some(filename),
            value => {
                self.extra.insert(key, value);
            }
        }
        self
    }

    /// The parent path reported for top-level imports.
    pub fn root_filename(&self) -> &str {
        self.filename.as_deref().unwrap_or(DEFAULT_FILENAME)
    }

    /// Build options from a JSON object.
    ///
    /// Recognized keys are validated and moved into the typed fields; all
    /// other keys are kept as pass-through options.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidOption` if the value is not an object,
    /// a recognized key has the wrong type, or an `importer` key is present.
    pub fn from_json(value: &Value) -> Result<Self, CompileError> {
        let Some(map) = value.as_object() else {
            return Err(CompileError::InvalidOption {
                key: "<root>".to_string(),
                reason: "options must be a JSON object".to_string(),
            });
        };

        let mut options = Self::new();
        for (key, value) in map {
            match key.as_str() {
                OPTION_IMPORTER => {
                    return Err(CompileError::InvalidOption {
                        key: key.clone(),
                        reason: "importers must be registered with `with_importer`".to_string(),
                    });
                }
                OPTION_LOAD_PATHS => options.load_paths = parse_load_paths(value)?,
                OPTION_FILENAME => {
                    let filename = value.as_str().ok_or_else(|| CompileError::InvalidOption {
                        key: key.clone(),
                        reason: "expected a string".to_string(),
                    })?;
                    options.filename = Some(filename.to_string());
                }
                OPTION_MINIFIED => {
                    options.minified =
                        value.as_bool().ok_or_else(|| CompileError::InvalidOption {
                            key: key.clone(),
                            reason: "expected a boolean".to_string(),
                        })?;
                }
                _ => {
                    options.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(options)
    }

    /// The complete mapping importers see: pass-through keys plus the
    /// recognized `load_paths`, `minified` and (when set) `filename`.
    pub fn to_options(&self) -> Options {
        let mut mapping = self.extra.clone();
        mapping.insert(
            OPTION_LOAD_PATHS,
            Value::Array(
                self.load_paths
                    .iter()
                    .map(|p| Value::String(p.to_string_lossy().into_owned()))
                    .collect(),
            ),
        );
        mapping.insert(OPTION_MINIFIED, self.minified);
        mapping.remove(OPTION_FILENAME);
        if let Some(filename) = &self.filename {
            mapping.insert(OPTION_FILENAME, filename.clone());
        }
        mapping
    }
}

fn parse_load_paths(value: &Value) -> Result<Vec<PathBuf>, CompileError> {
    let invalid = || CompileError::InvalidOption {
        key: OPTION_LOAD_PATHS.to_string(),
        reason: "expected an array of strings".to_string(),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|entry| entry.as_str().map(PathBuf::from).ok_or_else(invalid))
        .collect()
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("importer", &self.importer.as_ref().map(|_| "<Importer>"))
            .field("load_paths", &self.load_paths)
            .field("filename", &self.filename)
            .field("minified", &self.minified)
            .field("extra", &self.extra)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{ImportContext, ImportResult, ImporterError};
    use serde_json::json;

    #[test]
    fn test_from_json_splits_recognized_keys() {
        let options = SessionOptions::from_json(&json!({
            "filename": "site.scss",
            "load_paths": ["vendor", "themes/base"],
            "minified": true,
            "cdn_host": "https://cdn.example.com"
        }))
        .unwrap();

        assert_eq!(options.filename.as_deref(), Some("site.scss"));
        assert_eq!(
            options.load_paths,
            vec![PathBuf::from("vendor"), PathBuf::from("themes/base")]
        );
        assert!(options.minified);
        assert_eq!(options.extra.len(), 1);
        assert_eq!(
            options.extra.get_str("cdn_host"),
            Some("https://cdn.example.com")
        );
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        let err = SessionOptions::from_json(&json!({"load_paths": "vendor"})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidOption { ref key, .. } if key == "load_paths"));

        let err = SessionOptions::from_json(&json!({"filename": 3})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidOption { ref key, .. } if key == "filename"));

        let err = SessionOptions::from_json(&json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, CompileError::InvalidOption { .. }));
    }

    #[test]
    fn test_from_json_rejects_importer_key() {
        let err = SessionOptions::from_json(&json!({"importer": "CustomImporter"})).unwrap_err();
        assert!(err.to_string().contains("with_importer"));
    }

    #[test]
    fn test_root_filename_defaults_to_stdin() {
        assert_eq!(SessionOptions::new().root_filename(), "stdin");
        assert_eq!(
            SessionOptions::new()
                .with_filename("import-parent-filename.scss")
                .root_filename(),
            "import-parent-filename.scss"
        );
    }

    #[test]
    fn test_to_options_includes_everything() {
        let options = SessionOptions::new()
            .with_filename("main.scss")
            .with_load_path("fonts")
            .with_option("custom_option_source", ".test { width: 30px; }")
            .with_option(OPTION_MINIFIED, "ignored")
            .to_options();

        assert_eq!(options.get_str("filename"), Some("main.scss"));
        assert_eq!(options.get("load_paths"), Some(&json!(["fonts"])));
        assert_eq!(options.get("minified"), Some(&json!(false)));
        assert_eq!(
            options.get_str("custom_option_source"),
            Some(".test { width: 30px; }")
        );
    }

    #[test]
    fn test_filename_option_sets_root_filename() {
        let options = SessionOptions::new().with_option(OPTION_FILENAME, "theme.scss");

        assert_eq!(options.root_filename(), "theme.scss");
        assert!(options.extra.is_empty());
        assert_eq!(options.to_options().get_str(OPTION_FILENAME), Some("theme.scss"));
    }

    #[test]
    fn test_unusable_filename_option_is_not_shown_to_importers() {
        let options = SessionOptions::new().with_option(OPTION_FILENAME, 42);

        assert_eq!(options.root_filename(), DEFAULT_FILENAME);
        assert!(!options.to_options().contains_key(OPTION_FILENAME));
    }

    #[test]
    fn test_options_serialize_transparently() {
        let options: Options = serde_json::from_value(json!({"a": 1, "b": [true]})).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"a": 1, "b": [true]})
        );
    }

    #[test]
    fn test_debug_hides_importer() {
        let options = SessionOptions::new().with_importer(
            |_: &ImportContext<'_>| -> Result<ImportResult, ImporterError> {
                Ok(ImportResult::NotHandled)
            },
        );
        let debug = format!("{:?}", options);
        assert!(debug.contains("<Importer>"));
    }
}
