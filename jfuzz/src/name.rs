//! Fully-qualified class names.
//!
//! Names are dot-separated paths like `javafuzz.T1`. All segments but the
//! last form the package; the last is the class. The source path mirrors
//! the package as nested directories.

use std::fmt;
use std::path::PathBuf;

use crate::tokens::Tokenizer;
use crate::{GenError, GenResult};

/// File extension of generated compilation units.
pub const SOURCE_EXTENSION: &str = "java";

/// `java.lang` types named by the generated `main`. A class with one of
/// these simple names would shadow it.
pub const SHADOWED_TYPES: [&str; 2] = ["System", "String"];

/// A validated fully-qualified class name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// Parses and validates a dot-separated name.
    pub fn parse(s: &str) -> GenResult<Self> {
        let segments: Vec<String> = s.split('.').map(String::from).collect();
        for segment in &segments {
            if let Err(reason) = check_segment(segment) {
                return Err(GenError::ClassName {
                    name: s.to_string(),
                    reason,
                });
            }
        }
        let name = Self { segments };
        if SHADOWED_TYPES.contains(&name.class_name()) {
            return Err(GenError::ClassName {
                name: s.to_string(),
                reason: format!("class `{}` would shadow java.lang.{0}", name.class_name()),
            });
        }
        Ok(name)
    }

    /// The simple class name (last segment).
    pub fn class_name(&self) -> &str {
        self.segments.last().map(|s| s.as_str()).unwrap_or("")
    }

    /// The package, if the name has more than one segment.
    pub fn package(&self) -> Option<String> {
        if self.segments.len() > 1 {
            Some(self.segments[..self.segments.len() - 1].join("."))
        } else {
            None
        }
    }

    /// Returns this name with `suffix` appended to the class segment.
    pub fn with_class_suffix(&self, suffix: impl fmt::Display) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.push_str(&suffix.to_string());
        }
        Self { segments }
    }

    /// Relative path of the compilation unit, e.g. `javafuzz/T1.java`.
    pub fn source_path(&self) -> PathBuf {
        let mut path: PathBuf = self.segments[..self.segments.len() - 1].iter().collect();
        path.push(format!("{}.{}", self.class_name(), SOURCE_EXTENSION));
        path
    }
}

/// Checks that `segment` is a Java identifier and not a keyword.
pub(crate) fn check_segment(segment: &str) -> Result<(), String> {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return Err("empty segment".to_string());
    };
    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return Err(format!("segment `{segment}` does not start with a letter"));
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        return Err(format!("segment `{segment}` contains invalid characters"));
    }
    if Tokenizer::is_keyword(segment) {
        return Err(format!("segment `{segment}` is a keyword"));
    }
    Ok(())
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QualifiedName({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_and_class() {
        let name = QualifiedName::parse("javafuzz.sub.T1").unwrap();
        assert_eq!(name.class_name(), "T1");
        assert_eq!(name.package().as_deref(), Some("javafuzz.sub"));
        assert_eq!(name.source_path(), PathBuf::from("javafuzz/sub/T1.java"));
        assert_eq!(name.to_string(), "javafuzz.sub.T1");
    }

    #[test]
    fn test_default_package() {
        let name = QualifiedName::parse("Main").unwrap();
        assert_eq!(name.package(), None);
        assert_eq!(name.source_path(), PathBuf::from("Main.java"));
    }

    #[test]
    fn test_class_suffix() {
        let name = QualifiedName::parse("javafuzz.T1").unwrap().with_class_suffix("_3");
        assert_eq!(name.to_string(), "javafuzz.T1_3");
    }

    #[test]
    fn test_rejects_shadowing_class_names() {
        for bad in ["javafuzz.System", "String"] {
            let err = QualifiedName::parse(bad).unwrap_err();
            assert!(err.to_string().contains("shadow"), "{err}");
        }
        // Only the class segment matters.
        assert!(QualifiedName::parse("System.T1").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "a..b", "pkg.1T", "pkg.class", "a.b-c"] {
            assert!(QualifiedName::parse(bad).is_err(), "`{bad}` should be rejected");
        }
    }
}
