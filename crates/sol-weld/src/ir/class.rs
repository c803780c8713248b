//! Class records
//!
//! A [`ClassInfo`] is created once per complete definition the extractor
//! accepts. The classifier fills in the derived flags; nothing mutates it
//! after that.

use crate::ir::{Field, Method};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Qualified name to class record
///
/// Ordered so that serialized artifacts and emitted output are reproducible.
pub type IrMap = BTreeMap<String, ClassInfo>;

/// An extracted class or struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassInfo {
    /// Simple name
    pub name: String,
    /// Fully scoped name, unique within one IR map
    pub qualified_name: String,
    /// File holding the definition
    #[serde(alias = "fileName")]
    pub declaring_file: String,
    pub is_struct: bool,
    pub is_template: bool,
    /// Direct bases in declaration order
    pub base_classes: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub constructors: Vec<Method>,

    // Derived by the classifier
    #[serde(alias = "isPCLClass")]
    pub is_library_class: bool,
    #[serde(alias = "isQtClass")]
    pub is_gui_class: bool,
    #[serde(alias = "hasQObject")]
    pub has_observable_base: bool,
    pub is_container: bool,
    pub is_value_type: bool,
    pub is_metadata: bool,
    pub is_algorithm: bool,
}

impl ClassInfo {
    /// Create an empty class record
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            ..Default::default()
        }
    }

    /// Create an empty struct record
    pub fn new_struct(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            is_struct: true,
            ..Self::new(name, qualified_name)
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.declaring_file = file.into();
        self
    }

    pub fn with_template(mut self, is_template: bool) -> Self {
        self.is_template = is_template;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_classes.push(base.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_constructor(mut self, constructor: Method) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Whether anything bindable was recorded
    pub fn has_members(&self) -> bool {
        !self.fields.is_empty() || !self.methods.is_empty() || !self.constructors.is_empty()
    }

    /// Whether a public zero-argument constructor exists
    pub fn has_default_constructor(&self) -> bool {
        self.constructors
            .iter()
            .any(|c| c.visibility.is_public() && c.parameters.is_empty())
    }

    /// Whether the qualified name contains a scope separator
    pub fn is_scoped(&self) -> bool {
        self.qualified_name.contains("::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Visibility;

    #[test]
    fn test_default_constructor_requires_public_zero_arg() {
        let private_ctor = Method::constructor("Point").with_visibility(Visibility::Private);
        let class = ClassInfo::new("Point", "geo::Point").with_constructor(private_ctor);
        assert!(!class.has_default_constructor());

        let class = class.with_constructor(Method::constructor("Point"));
        assert!(class.has_default_constructor());
    }

    #[test]
    fn test_legacy_class_keys() {
        let class: ClassInfo = serde_json::from_str(
            r#"{"name":"QWidgetHost","fileName":"host.hpp","isQtClass":true,"hasQObject":true}"#,
        )
        .unwrap();
        assert_eq!(class.declaring_file, "host.hpp");
        assert!(class.is_gui_class);
        assert!(class.has_observable_base);
        assert!(!class.is_library_class);
    }

    #[test]
    fn test_has_members() {
        let class = ClassInfo::new_struct("Empty", "Empty");
        assert!(!class.has_members());
        assert!(class
            .with_field(crate::ir::Field::new("x", "int"))
            .has_members());
    }
}
