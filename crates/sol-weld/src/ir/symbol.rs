//! Member metadata for extracted C++ records
//!
//! Parameters, methods and fields as the extractor records them and the
//! generator reads them back. Keys serialize in camelCase; a few legacy
//! spellings written by older extractors are accepted on read.

use serde::{Deserialize, Deserializer, Serialize};

/// C++ member access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Visibility {
    /// Reachable from bindings; also the reading of a missing key
    #[default]
    Public,
    /// Subclass access only
    Protected,
    /// Class access only
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

impl From<String> for Visibility {
    fn from(s: String) -> Self {
        match s.as_str() {
            "public" => Visibility::Public,
            "protected" => Visibility::Protected,
            // Anything unrecognised is treated as inaccessible
            _ => Visibility::Private,
        }
    }
}

/// Reads `""` and `null` as `None`
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// A method or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameter {
    /// Normalized type text
    #[serde(rename = "type")]
    pub ty: String,
    /// Declared name, empty when unnamed
    pub name: String,
    /// Default value expression, empty when none
    pub default_value: String,
    /// Whether the type carries a `const` token
    pub is_const: bool,
    /// Whether the type is a reference (`&`)
    pub is_reference: bool,
    /// Whether the type is a pointer (`*`)
    pub is_pointer: bool,
    /// Whether the type is an optional wrapper such as `Optional<T>`
    pub is_optional: bool,
}

impl Parameter {
    /// Create a parameter, deriving const/reference/pointer flags from the type text
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        let ty = ty.into();
        Self {
            is_const: crate::ir::types::has_const_token(&ty),
            is_reference: ty.contains('&'),
            is_pointer: ty.contains('*'),
            ty,
            name: name.into(),
            default_value: String::new(),
            is_optional: false,
        }
    }

    /// Set the default value expression
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Mark as an optional-wrapper parameter
    pub fn optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }
}

/// A method, constructor or destructor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Method {
    /// Simple name; the class name for constructors
    pub name: String,
    /// Normalized return type text, empty for constructors and destructors
    pub return_type: String,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// Whether this is a `const` member function
    pub is_const: bool,
    /// Whether this is a static member function
    pub is_static: bool,
    /// Whether this is declared `virtual`
    pub is_virtual: bool,
    /// Member access
    pub visibility: Visibility,
    /// Whether this is a constructor
    pub is_constructor: bool,
    /// Whether this is a destructor
    pub is_destructor: bool,

    // Derived by the classifier
    /// Whether the name or shape reads as an accessor
    pub is_getter: bool,
    /// Whether the name reads as a mutator
    pub is_setter: bool,
    /// Whether the name reads as a validity check
    pub is_validator: bool,
    /// Whether the name reads as a conversion
    pub is_converter: bool,
    /// Whether this is an operator overload other than assignment
    pub is_metamethod: bool,
    /// Whether this is one of the stringification methods
    pub is_to_string: bool,
    /// Runtime metamethod identifier for operator methods
    #[serde(alias = "luaMetamethod", deserialize_with = "empty_as_none")]
    pub mapped_metamethod: Option<String>,
}

impl Method {
    /// Create a public, non-const instance method
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            ..Default::default()
        }
    }

    /// Create a constructor for the named class
    pub fn constructor(class_name: impl Into<String>) -> Self {
        Self {
            name: class_name.into(),
            is_constructor: true,
            ..Default::default()
        }
    }

    /// Append a parameter
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.is_virtual = is_virtual;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the return type is `void`
    pub fn returns_void(&self) -> bool {
        let ret = self.return_type.trim();
        ret.is_empty() || ret == "void"
    }

    /// Parameter types joined as they appear in a C++ signature
    pub fn signature(&self) -> String {
        self.parameters
            .iter()
            .map(|p| p.ty.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A data member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    /// Declared name
    pub name: String,
    /// Normalized type text
    #[serde(rename = "type")]
    pub ty: String,
    /// Member access
    pub visibility: Visibility,
    /// Whether this is a static data member
    pub is_static: bool,
    /// Whether this is declared `mutable`
    pub is_mutable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Default::default()
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_mutable(mut self, is_mutable: bool) -> Self {
        self.is_mutable = is_mutable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_flags_from_type() {
        let p = Parameter::new("name", "const pcl::String &");
        assert!(p.is_const);
        assert!(p.is_reference);
        assert!(!p.is_pointer);

        let p = Parameter::new("data", "double *");
        assert!(!p.is_const);
        assert!(p.is_pointer);

        // `constant` is not the const qualifier
        let p = Parameter::new("c", "constant_t");
        assert!(!p.is_const);
    }

    #[test]
    fn test_unknown_visibility_reads_private() {
        let field: Field =
            serde_json::from_str(r#"{"name":"x","type":"int","visibility":"internal"}"#).unwrap();
        assert_eq!(field.visibility, Visibility::Private);

        let field: Field = serde_json::from_str(r#"{"name":"x","type":"int"}"#).unwrap();
        assert_eq!(field.visibility, Visibility::Public);
    }

    #[test]
    fn test_method_legacy_metamethod_key() {
        let method: Method =
            serde_json::from_str(r#"{"name":"operator==","luaMetamethod":"equal_to"}"#).unwrap();
        assert_eq!(method.mapped_metamethod.as_deref(), Some("equal_to"));

        let method: Method =
            serde_json::from_str(r#"{"name":"Width","luaMetamethod":""}"#).unwrap();
        assert_eq!(method.mapped_metamethod, None);
    }

    #[test]
    fn test_method_serializes_camel_case() {
        let method = Method::new("Width", "int").with_const(true);
        let json = serde_json::to_value(&method).unwrap();
        assert_eq!(json["returnType"], "int");
        assert_eq!(json["isConst"], true);
        assert_eq!(json["visibility"], "public");
        assert!(json["mappedMetamethod"].is_null());
    }

    #[test]
    fn test_signature_joins_types() {
        let method = Method::new("Resize", "void")
            .with_param(Parameter::new("w", "int"))
            .with_param(Parameter::new("h", "int"));
        assert_eq!(method.signature(), "int, int");
        assert_eq!(method.arity(), 2);
        assert!(method.returns_void());
    }
}
