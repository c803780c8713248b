//! Type-text analysis
//!
//! The IR carries C++ types as normalized text. This module owns the
//! normalization applied at extraction time and the questions later stages
//! ask of that text: is it const, what is the bare type, and which
//! marshalling category does it fall into.

use crate::config::{MarshalConfig, NormalizeConfig, OptionalWrapper, StringType};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

lazy_static! {
    /// Elaborated-type keywords the parser prints in front of record names
    static ref ELABORATED_REGEX: Regex =
        Regex::new(r"\b(?:struct|class|enum|union)\s+").unwrap();

    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();

    static ref CONST_REGEX: Regex = Regex::new(r"\bconst\b").unwrap();
}

/// Normalizes type text as the parser renders it
#[derive(Debug, Clone)]
pub struct TypeCleaner {
    qualifiers: Vec<(Regex, String)>,
}

impl TypeCleaner {
    /// Compile the requalification table
    pub fn new(config: &NormalizeConfig) -> Self {
        let qualifiers = config
            .qualify_names
            .iter()
            .filter_map(|name| {
                let pattern = format!(r"(^|[^:\w]){}\b", regex::escape(name));
                match Regex::new(&pattern) {
                    Ok(re) => Some((re, format!("${{1}}{}::{}", config.namespace, name))),
                    Err(e) => {
                        warn!(name = %name, error = %e, "Skipping unusable qualify name");
                        None
                    }
                }
            })
            .collect();

        Self { qualifiers }
    }

    /// Strip elaborated keywords, collapse whitespace and requalify known names
    pub fn clean(&self, text: &str) -> String {
        let stripped = ELABORATED_REGEX.replace_all(text, "");
        let mut cleaned = WHITESPACE_REGEX.replace_all(&stripped, " ").trim().to_string();

        for (re, replacement) in &self.qualifiers {
            if re.is_match(&cleaned) {
                cleaned = re.replace_all(&cleaned, replacement.as_str()).into_owned();
            }
        }

        cleaned
    }
}

impl Default for TypeCleaner {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

/// Whether the type text carries a `const` qualifier token
pub fn has_const_token(ty: &str) -> bool {
    CONST_REGEX.is_match(ty)
}

/// The type without cv-qualifiers, references or pointers
pub fn base_type(ty: &str) -> String {
    let without_const = CONST_REGEX.replace_all(ty, "");
    let without_decl: String = without_const
        .chars()
        .filter(|c| *c != '&' && *c != '*')
        .collect();
    WHITESPACE_REGEX
        .replace_all(&without_decl, " ")
        .trim()
        .to_string()
}

/// Byte offset of `prefix` in `ty` where it starts a name rather than ending one
fn wrapper_position(ty: &str, prefix: &str) -> Option<usize> {
    ty.match_indices(prefix).map(|(pos, _)| pos).find(|&pos| {
        ty[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}

/// Template argument of the wrapper, if the angle brackets balance
pub fn wrapper_inner(ty: &str, prefix: &str) -> Option<String> {
    let start = wrapper_position(ty, prefix)? + prefix.len();
    let mut depth = 1usize;

    for (offset, c) in ty[start..].char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    let inner = ty[start..start + offset].trim();
                    return (!inner.is_empty()).then(|| inner.to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Whether a parameter type is itself an optional wrapper
///
/// Only a namespace qualifier may precede the wrapper, so
/// `Optional<double>` and `const pcl::Optional<double>&` qualify while
/// `Array<Optional<double>>` does not.
pub fn is_optional_type(ty: &str, config: &MarshalConfig) -> bool {
    let base = base_type(ty);
    config.optional_wrappers.iter().any(|w| {
        wrapper_position(&base, &w.prefix).is_some_and(|pos| {
            base[..pos]
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == ':')
        })
    })
}

/// How a value of some type crosses into the scripting runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marshal<'c> {
    /// Bound as-is
    Direct,
    /// Host string type converted through the native string
    Text(&'c StringType),
    /// Host container that would need a table conversion
    Table(&'c str),
    /// Optional wrapper, with the inner type when it could be read
    Optional {
        wrapper: &'c OptionalWrapper,
        inner: Option<String>,
    },
}

impl Marshal<'_> {
    pub fn is_direct(&self) -> bool {
        matches!(self, Marshal::Direct)
    }
}

/// Marshalling category of a type, by substring match on the configured tables
///
/// Optional wrappers win over containers, containers over strings, so that
/// `QStringList` is a container and `Optional<String>` is optional.
pub fn marshal_of<'c>(ty: &str, config: &'c MarshalConfig) -> Marshal<'c> {
    if let Some(wrapper) = config
        .optional_wrappers
        .iter()
        .find(|w| wrapper_position(ty, &w.prefix).is_some())
    {
        return Marshal::Optional {
            wrapper,
            inner: wrapper_inner(ty, &wrapper.prefix),
        };
    }

    if let Some(table) = config.table_types.iter().find(|t| ty.contains(t.as_str())) {
        return Marshal::Table(table.as_str());
    }

    if let Some(text) = config.string_types.iter().find(|s| ty.contains(&s.host)) {
        return Marshal::Text(text);
    }

    Marshal::Direct
}

/// Substitute `expr` for `{}` in a conversion template
pub fn apply_template(template: &str, expr: &str) -> String {
    template.replace("{}", expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_elaborated_keywords() {
        let cleaner = TypeCleaner::default();
        assert_eq!(cleaner.clean("const  struct   Point &"), "const Point &");
        assert_eq!(cleaner.clean("enum Mode"), "Mode");
    }

    #[test]
    fn test_clean_requalifies_known_names() {
        let cleaner = TypeCleaner::default();
        assert_eq!(
            cleaner.clean("const AstrometricMetadata &"),
            "const pcl::AstrometricMetadata &"
        );
        assert_eq!(
            cleaner.clean("pcl::AstrometricMetadata"),
            "pcl::AstrometricMetadata"
        );
        assert_eq!(
            cleaner.clean("Array<PropertyArray, ImageWindow>"),
            "Array<pcl::PropertyArray, pcl::ImageWindow>"
        );
        // Only whole names
        assert_eq!(cleaner.clean("MyImageWindowProxy"), "MyImageWindowProxy");
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("const pcl::String &"), "pcl::String");
        assert_eq!(base_type("char const *"), "char");
    }

    #[test]
    fn test_wrapper_inner_balances_brackets() {
        assert_eq!(
            wrapper_inner("pcl::Optional<Array<double>>", "Optional<"),
            Some("Array<double>".to_string())
        );
        assert_eq!(wrapper_inner("Optional<", "Optional<"), None);
        assert_eq!(wrapper_inner("std::optional<int>", "Optional<"), None);
    }

    #[test]
    fn test_marshal_categories() {
        let config = MarshalConfig::default();
        assert!(marshal_of("double", &config).is_direct());
        assert!(matches!(
            marshal_of("const QStringList &", &config),
            Marshal::Table("QStringList")
        ));
        assert!(matches!(
            marshal_of("const QString &", &config),
            Marshal::Text(s) if s.host == "QString"
        ));
        assert!(matches!(
            marshal_of("pcl::IsoString", &config),
            Marshal::Text(s) if s.host == "pcl::IsoString"
        ));
        match marshal_of("Optional<double>", &config) {
            Marshal::Optional { wrapper, inner } => {
                assert_eq!(wrapper.prefix, "Optional<");
                assert_eq!(inner.as_deref(), Some("double"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_optional_parameter_type() {
        let config = MarshalConfig::default();
        assert!(is_optional_type("Optional<double>", &config));
        assert!(is_optional_type("const pcl::Optional<double> &", &config));
        assert!(!is_optional_type("Array<Optional<double>>", &config));
        assert!(!is_optional_type("double", &config));
    }
}
