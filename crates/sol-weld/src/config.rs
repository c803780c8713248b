//! Pipeline configuration
//!
//! Every heuristic table the pipeline consults lives here: the extractor's
//! skip filter, the type requalification list, keyword tables for the
//! classifier, the selector's allow/deny lists and the marshalling tables.
//! A [`WeldConfig`] is built once at pipeline start and only borrowed after
//! that.
//!
//! The defaults reproduce the tables the generator was tuned with. A TOML
//! file overrides only the fields it names. List-valued fields are replaced
//! whole; the metamethod table is merged entry by entry, and an empty
//! identifier removes an operator:
//!
//! ```toml
//! [select]
//! max_members = 24
//! known_bad_classes = ["pcl::Mutex"]
//!
//! [classify.metamethods]
//! "operator<<" = "bitwise_left_shift"
//! "operator%" = ""
//! ```

use crate::error::{WeldError, WeldResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeldConfig {
    /// Extractor skip filter
    pub filter: FilterConfig,
    /// Type text normalization
    pub normalize: NormalizeConfig,
    /// Compile flag assembly
    pub flags: FlagsConfig,
    /// Classifier keyword tables
    pub classify: ClassifyConfig,
    /// Binding selection lists and caps
    pub select: SelectConfig,
    /// Parameter/return marshalling tables
    pub marshal: MarshalConfig,
}

impl WeldConfig {
    /// Parse a TOML override document on top of the defaults
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load a TOML override file
    pub fn load(path: impl AsRef<Path>) -> WeldResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| WeldError::io(path, e))?;
        Self::from_toml_str(&text).map_err(|e| WeldError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from an optional path, falling back to the defaults
    pub fn load_or_default(path: Option<&Path>) -> WeldResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Skip filter applied to every record the extractor sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Names this short or shorter are rejected
    pub min_name_len: usize,
    /// Names longer than this are rejected
    pub max_name_len: usize,
    /// Noise-namespace prefixes, matched against simple and qualified names
    pub deny_prefixes: Vec<String>,
    /// Exact simple names that are always noise
    pub deny_names: Vec<String>,
    /// Include roots of the system toolchain
    pub system_roots: Vec<String>,
    /// Namespaces of the embedded scripting runtime
    pub runtime_namespaces: Vec<String>,
    /// Simple-name prefixes of the runtime's C API
    pub runtime_name_prefixes: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_name_len: 1,
            max_name_len: 50,
            deny_prefixes: strings(&["std::", "__", "_", "boost::", "detail::", "internal::"]),
            deny_names: strings(&[
                "type",
                "pair",
                "numeric_limits",
                "vector",
                "array",
                "string",
                "locale",
            ]),
            system_roots: strings(&[
                "/usr/",
                "/opt/",
                "/Applications/Xcode.app/",
                "/Library/",
                "/System/",
            ]),
            runtime_namespaces: strings(&["sol", "lua"]),
            runtime_name_prefixes: strings(&["sol_", "lua_", "luaL_"]),
        }
    }
}

/// Requalification of domain names the parser sometimes prints bare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Namespace prepended to bare occurrences
    pub namespace: String,
    /// Simple names that always live in `namespace`
    pub qualify_names: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            namespace: "pcl".to_string(),
            qualify_names: strings(&[
                "AstrometricMetadata",
                "ProjectionBase",
                "WorldTransformation",
                "ImageWindow",
                "XISFReader",
                "XISFWriter",
                "WCSKeywords",
                "PropertyArray",
                "FITSKeywordArray",
            ]),
        }
    }
}

/// Compile flag defaults for stage 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// Language standard used when the database has none
    pub language_standard: String,
    /// Defines always appended
    pub defines: Vec<String>,
    /// Groups of candidate include roots; the first existing one of each group is used
    pub probe_include_groups: Vec<Vec<String>>,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            language_standard: "c++17".to_string(),
            defines: strings(&["PCL_NO_PRECOMPILE", "EIGEN_USE_NEW_STDVECTOR"]),
            probe_include_groups: vec![
                strings(&[
                    "/usr/local/include/pcl-1.14",
                    "/usr/local/include/pcl-1.13",
                    "/usr/local/include/pcl-1.12",
                    "/opt/homebrew/include/pcl-1.14",
                    "/opt/homebrew/include/pcl-1.13",
                    "/opt/homebrew/include/pcl-1.12",
                ]),
                strings(&["/opt/homebrew/include/eigen3", "/usr/local/include/eigen3"]),
            ],
        }
    }
}

/// Keyword tables for method and class classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    pub getter_keywords: Vec<String>,
    pub setter_keywords: Vec<String>,
    pub validator_keywords: Vec<String>,
    pub converter_prefix: String,
    pub converter_keywords: Vec<String>,
    /// Exact (case-sensitive) stringification method names
    pub to_string_names: Vec<String>,
    pub operator_prefix: String,
    /// Operator method name to runtime metamethod identifier
    ///
    /// Overrides are merged over the built-in table; an empty identifier
    /// removes an entry.
    #[serde(deserialize_with = "merge_metamethods")]
    pub metamethods: BTreeMap<String, String>,
    /// Path the metamethod identifiers live under
    pub metamethod_path: String,
    pub metadata_keywords: Vec<String>,
    pub algorithm_keywords: Vec<String>,
    pub container_keywords: Vec<String>,
    pub value_type_keywords: Vec<String>,
    /// Qualified-name prefix of the wrapped library
    pub library_prefix: String,
    /// Simple-name prefix of GUI framework classes
    pub gui_name_prefix: String,
    /// Base class marking observable (signal/slot) objects
    pub observable_base: String,
}

fn default_metamethods() -> BTreeMap<String, String> {
    [
        ("operator==", "equal_to"),
        ("operator<", "less_than"),
        ("operator<=", "less_than_or_equal_to"),
        ("operator+", "addition"),
        ("operator-", "subtraction"),
        ("operator*", "multiplication"),
        ("operator/", "division"),
        ("operator%", "modulus"),
        ("operator^", "power_of"),
        ("operator[]", "index"),
        ("operator()", "call"),
    ]
    .iter()
    .map(|(op, id)| (op.to_string(), id.to_string()))
    .collect()
}

fn merge_metamethods<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, String>::deserialize(deserializer)?;
    let mut table = default_metamethods();
    for (op, id) in overrides {
        if id.is_empty() {
            table.remove(&op);
        } else {
            table.insert(op, id);
        }
    }
    Ok(table)
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            getter_keywords: strings(&[
                "get", "is", "has", "can", "width", "height", "size", "length", "count",
            ]),
            setter_keywords: strings(&[
                "set", "add", "remove", "clear", "reset", "update", "enable", "disable",
            ]),
            validator_keywords: strings(&["valid", "verify", "check"]),
            converter_prefix: "to".to_string(),
            converter_keywords: strings(&["from", "convert", "transform"]),
            to_string_names: strings(&["toString", "to_string", "ToString", "Summary"]),
            operator_prefix: "operator".to_string(),
            metamethods: default_metamethods(),
            metamethod_path: "sol::meta_function".to_string(),
            metadata_keywords: strings(&["metadata", "header", "properties"]),
            algorithm_keywords: strings(&[
                "filter", "segment", "extract", "compute", "estimate", "detect", "match",
            ]),
            container_keywords: strings(&["vector", "array", "list"]),
            value_type_keywords: strings(&["point", "size", "rect"]),
            library_prefix: "pcl::".to_string(),
            gui_name_prefix: "Q".to_string(),
            observable_base: "QObject".to_string(),
        }
    }
}

/// Hand-curated template for the flagship class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagshipConfig {
    pub qualified_name: String,
    /// Method names bound first, in this order
    pub priority_methods: Vec<String>,
    pub max_members: usize,
}

impl Default for FlagshipConfig {
    fn default() -> Self {
        Self {
            qualified_name: "pcl::AstrometricMetadata".to_string(),
            priority_methods: strings(&[
                "Build",
                "IsValid",
                "Width",
                "Height",
                "Bounds",
                "ImageToCelestial",
                "CelestialToImage",
                "ImageCenterToCelestial",
                "RawImageToCelestial",
                "Resolution",
                "SearchRadius",
                "ResolutionFromFocal",
                "FocalFromResolution",
                "ResolutionAt",
                "ObservationStartTime",
                "ObservationEndTime",
                "ObservationMiddleTime",
                "LocationLongitude",
                "LocationLatitude",
                "LocationHeight",
                "SetLocationLongitude",
                "SetLocationLatitude",
                "SetLocationHeight",
                "SetObservationStartTime",
                "SetObservationEndTime",
                "PixelSize",
                "SetPixelSize",
                "ReferenceSystem",
                "SetReferenceSystem",
                "HasSplineWorldTransformation",
                "Undistorted",
                "Validate",
                "Verify",
                "ToProperties",
                "Summary",
                "Projection",
                "WorldTransform",
                "Rotation",
                "CreationTime",
                "Catalog",
                "CreatorApplication",
                "CreatorModule",
                "CreatorOS",
            ]),
            max_members: 64,
        }
    }
}

/// Selection lists, per-method skip rule inputs and caps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    /// Qualified class names never bound
    pub known_bad_classes: Vec<String>,
    /// `Class::method` or bare method names never bound
    pub known_bad_methods: Vec<String>,
    /// Structs with bit-field members (their fields have no address)
    pub bitfield_structs: Vec<String>,
    /// Struct names bound with any number of fields
    pub struct_allow_names: Vec<String>,
    /// Name substrings that also qualify a struct with any number of fields
    pub struct_allow_patterns: Vec<String>,
    /// Name substrings marking internal structs
    pub struct_reject_patterns: Vec<String>,
    pub min_struct_fields: usize,
    pub min_class_methods: usize,
    /// Name substrings marking low-level classes
    pub class_deny_patterns: Vec<String>,
    /// Declaring-file substrings belonging to the scripting runtime
    pub runtime_file_markers: Vec<String>,
    /// Framework reflection methods
    pub reflection_methods: Vec<String>,
    pub flagship: FlagshipConfig,
    /// Member cap for every non-flagship binding
    pub max_members: usize,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            known_bad_classes: strings(&[
                "pcl::String",
                "pcl::IsoString",
                "pcl::Mutex",
                "pcl::PixelTraitsLUT",
                "pcl::StatusCallback",
            ]),
            known_bad_methods: strings(&[
                "pcl::AstrometricMetadata::EnsureSplineGridInterpolationsInitialized",
                "Transfer",
                "Swap",
            ]),
            bitfield_structs: strings(&["pcl::ImageOptions", "pcl::ImageSelections"]),
            struct_allow_names: strings(&["DescriptionItems"]),
            struct_allow_patterns: strings(&["Options"]),
            struct_reject_patterns: strings(&["Data", "Thread"]),
            min_struct_fields: 2,
            min_class_methods: 3,
            class_deny_patterns: strings(&[
                "iterator",
                "Thread",
                "PixelTraits",
                "Allocator",
                "AutoReentrancy",
                "AutoLock",
                "ReferenceCounter",
                "SharedPixelData",
                "CharTraits",
                "sol_",
                "detail",
                "impl",
            ]),
            runtime_file_markers: strings(&["sol", "lua"]),
            reflection_methods: strings(&[
                "metaObject",
                "qt_metacast",
                "qt_metacall",
                "staticMetaObject",
            ]),
            flagship: FlagshipConfig::default(),
            max_members: 40,
        }
    }
}

/// A host string type and the expressions converting it to/from `std::string`
///
/// `{}` in the conversion templates is replaced by the converted expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringType {
    /// Substring identifying the host type
    pub host: String,
    /// Builds the host value from a native string
    pub to_host: String,
    /// Builds a native string from the host value
    pub to_native: String,
}

impl StringType {
    fn new(host: &str, to_host: &str, to_native: &str) -> Self {
        Self {
            host: host.to_string(),
            to_host: to_host.to_string(),
            to_native: to_native.to_string(),
        }
    }
}

/// An optional-wrapper type and how to test and unwrap it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalWrapper {
    /// Template prefix, including the opening angle bracket
    pub prefix: String,
    pub is_defined: String,
    pub unwrap: String,
}

impl OptionalWrapper {
    fn new(prefix: &str, is_defined: &str, unwrap: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            is_defined: is_defined.to_string(),
            unwrap: unwrap.to_string(),
        }
    }
}

/// Marshalling tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalConfig {
    /// Host containers that would need a table conversion (unsupported)
    pub table_types: Vec<String>,
    /// Host string types, most specific first
    pub string_types: Vec<StringType>,
    pub optional_wrappers: Vec<OptionalWrapper>,
    pub native_string: String,
    pub native_table: String,
    pub native_optional: String,
    pub no_value: String,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            table_types: strings(&[
                "PropertyArray",
                "FITSKeywordArray",
                "QStringList",
                "QVector",
                "QList",
                "QMap",
                "QHash",
            ]),
            string_types: vec![
                StringType::new(
                    "pcl::IsoString",
                    "pcl::IsoString({}.c_str())",
                    "std::string({}.c_str())",
                ),
                StringType::new(
                    "pcl::String",
                    "pcl::String({}.c_str())",
                    "std::string({}.ToUTF8().c_str())",
                ),
                StringType::new("QString", "QString::fromStdString({})", "{}.toStdString()"),
            ],
            optional_wrappers: vec![
                OptionalWrapper::new("std::optional<", "{}.has_value()", "*{}"),
                OptionalWrapper::new("Optional<", "{}.IsDefined()", "{}()"),
            ],
            native_string: "std::string".to_string(),
            native_table: "sol::table".to_string(),
            native_optional: "sol::optional".to_string(),
            no_value: "sol::nullopt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_metamethod_table() {
        let config = WeldConfig::default();
        assert_eq!(
            config.classify.metamethods.get("operator==").map(String::as_str),
            Some("equal_to")
        );
        assert!(!config.classify.metamethods.contains_key("operator="));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WeldConfig::from_toml_str(
            r#"
            [select]
            max_members = 12
            known_bad_classes = ["demo::Broken"]
            "#,
        )
        .unwrap();

        assert_eq!(config.select.max_members, 12);
        assert_eq!(config.select.known_bad_classes, vec!["demo::Broken"]);
        // Untouched sections and fields keep their defaults
        assert_eq!(config.select.min_class_methods, 3);
        assert_eq!(config.filter, FilterConfig::default());
    }

    #[test]
    fn test_metamethod_overrides_merge_with_defaults() {
        let config = WeldConfig::from_toml_str(
            r#"
            [classify.metamethods]
            "operator<<" = "bitwise_left_shift"
            "operator%" = ""
            "operator==" = "equal_to"
            "#,
        )
        .unwrap();

        let table = &config.classify.metamethods;
        assert_eq!(table.get("operator<<").map(String::as_str), Some("bitwise_left_shift"));
        assert_eq!(table.get("operator<").map(String::as_str), Some("less_than"));
        assert_eq!(table.get("operator+").map(String::as_str), Some("addition"));
        assert!(!table.contains_key("operator%"));
        assert_eq!(table.len(), ClassifyConfig::default().metamethods.len());
    }

    #[test]
    fn test_load_reports_path_on_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weld.toml");
        fs::write(&path, "[select\nmax_members = ").unwrap();

        let err = WeldConfig::load(&path).unwrap_err();
        assert!(matches!(err, WeldError::Config { .. }));
        assert!(err.to_string().contains("weld.toml"));
    }
}
