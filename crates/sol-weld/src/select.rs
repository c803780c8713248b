//! Binding selection
//!
//! Decides which classes get a registration block and which of their
//! methods take part. The decision per class is first-match-wins:
//!
//! 1. known-bad classes and class templates are excluded
//! 2. the flagship class gets its curated, priority-ordered template
//! 3. qualifying structs get a field-only binding
//! 4. classes with enough surviving methods get a full binding

use crate::config::WeldConfig;
use crate::ir::{ClassInfo, IrMap, Method};
use std::path::Path;
use tracing::{debug, info};

/// Shape of an emitted binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Curated template for the flagship class
    Flagship,
    /// Public fields only
    FieldStruct,
    /// Surviving methods and public fields
    FullClass,
}

/// A class chosen for emission with the methods it exposes
#[derive(Debug, Clone, PartialEq)]
pub struct BindingPlan<'a> {
    pub class: &'a ClassInfo,
    pub kind: BindingKind,
    /// Surviving methods in emission order
    pub methods: Vec<&'a Method>,
    /// Cap on method and field bindings
    pub max_members: usize,
}

/// Applies the selection rules of a [`WeldConfig`]
#[derive(Debug, Clone, Copy)]
pub struct Selector<'c> {
    config: &'c WeldConfig,
}

impl<'c> Selector<'c> {
    pub fn new(config: &'c WeldConfig) -> Self {
        Self { config }
    }

    /// Select every bindable class, sorted by qualified name
    pub fn select<'a>(&self, ir: &'a IrMap) -> Vec<BindingPlan<'a>> {
        let mut plans: Vec<_> = ir.values().filter_map(|c| self.plan(c, ir)).collect();
        plans.sort_by(|a, b| a.class.qualified_name.cmp(&b.class.qualified_name));
        info!(selected = plans.len(), total = ir.len(), "Selected classes for binding");
        plans
    }

    /// Decide one class; `ir` is consulted to recognise nested structs
    pub fn plan<'a>(&self, class: &'a ClassInfo, ir: &IrMap) -> Option<BindingPlan<'a>> {
        let select = &self.config.select;
        let name = class.qualified_name.as_str();

        if select.known_bad_classes.iter().any(|c| c == name) {
            debug!(class = %name, "Excluded: known bad");
            return None;
        }
        if class.is_template {
            debug!(class = %name, "Excluded: class template");
            return None;
        }

        if name == select.flagship.qualified_name {
            return Some(BindingPlan {
                class,
                kind: BindingKind::Flagship,
                methods: self.flagship_methods(class),
                max_members: select.flagship.max_members,
            });
        }

        if class.is_struct {
            return if self.is_bindable_struct(class, ir) {
                Some(BindingPlan {
                    class,
                    kind: BindingKind::FieldStruct,
                    methods: Vec::new(),
                    max_members: select.max_members,
                })
            } else {
                debug!(class = %name, "Excluded: struct rule");
                None
            };
        }

        if !self.is_candidate_class(class) {
            debug!(class = %name, "Excluded: low-level class");
            return None;
        }

        let methods = self.surviving_methods(class);
        if methods.len() < select.min_class_methods {
            debug!(class = %name, methods = methods.len(), "Excluded: too few methods");
            return None;
        }

        Some(BindingPlan {
            class,
            kind: BindingKind::FullClass,
            methods,
            max_members: select.max_members,
        })
    }

    /// Per-method skip rule; `true` when the method may be bound
    pub fn keeps_method(&self, class: &ClassInfo, method: &Method) -> bool {
        let select = &self.config.select;
        let name = method.name.as_str();
        let assignment = format!("{}=", self.config.classify.operator_prefix);

        if !method.visibility.is_public() || method.is_destructor || method.is_constructor {
            return false;
        }
        if name.is_empty() || name.starts_with('~') || name.starts_with('_') {
            return false;
        }
        if name == assignment {
            return false;
        }
        if select.reflection_methods.iter().any(|r| r == name) {
            return false;
        }

        let qualified = format!("{}::{}", class.qualified_name, name);
        !select
            .known_bad_methods
            .iter()
            .any(|bad| *bad == qualified || bad == name)
    }

    /// Surviving methods in declaration order
    pub fn surviving_methods<'a>(&self, class: &'a ClassInfo) -> Vec<&'a Method> {
        class
            .methods
            .iter()
            .filter(|m| self.keeps_method(class, m))
            .collect()
    }

    /// Priority names in list order, then metamethods, then the rest
    fn flagship_methods<'a>(&self, class: &'a ClassInfo) -> Vec<&'a Method> {
        let priority = &self.config.select.flagship.priority_methods;
        let surviving = self.surviving_methods(class);

        let mut ordered: Vec<&Method> = priority
            .iter()
            .flat_map(|p| surviving.iter().copied().filter(move |m| m.name == *p))
            .collect();
        ordered.extend(
            surviving
                .iter()
                .copied()
                .filter(|m| !priority.contains(&m.name) && m.mapped_metamethod.is_some()),
        );
        ordered.extend(
            surviving
                .iter()
                .copied()
                .filter(|m| !priority.contains(&m.name) && m.mapped_metamethod.is_none()),
        );

        debug!(
            class = %class.qualified_name,
            priority = ordered.iter().filter(|m| priority.contains(&m.name)).count(),
            "Flagship methods ordered"
        );
        ordered
    }

    fn is_bindable_struct(&self, class: &ClassInfo, ir: &IrMap) -> bool {
        let select = &self.config.select;
        let name = class.name.as_str();

        if class.fields.is_empty()
            || select
                .bitfield_structs
                .iter()
                .any(|b| *b == class.qualified_name)
        {
            return false;
        }

        if select.struct_allow_names.iter().any(|n| n == name)
            || select
                .struct_allow_patterns
                .iter()
                .any(|p| name.contains(p.as_str()))
        {
            return true;
        }

        if name.contains("::") || is_nested(class, ir) {
            return false;
        }
        if select
            .struct_reject_patterns
            .iter()
            .any(|p| name.contains(p.as_str()))
        {
            return false;
        }

        class.fields.len() >= select.min_struct_fields
    }

    fn is_candidate_class(&self, class: &ClassInfo) -> bool {
        let select = &self.config.select;

        if select
            .class_deny_patterns
            .iter()
            .any(|p| class.name.contains(p.as_str()))
        {
            return false;
        }

        let file_name = Path::new(&class.declaring_file)
            .file_name()
            .map(|f| f.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        !select
            .runtime_file_markers
            .iter()
            .any(|m| file_name.contains(m.as_str()))
    }
}

/// Whether the enclosing scope of a record is itself a recorded class
fn is_nested(class: &ClassInfo, ir: &IrMap) -> bool {
    class
        .qualified_name
        .rsplit_once("::")
        .is_some_and(|(parent, _)| ir.contains_key(parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, Parameter, Visibility};

    fn ir_of(classes: Vec<ClassInfo>) -> IrMap {
        classes
            .into_iter()
            .map(|c| (c.qualified_name.clone(), c))
            .collect()
    }

    fn class_with(name: &str, methods: &[&str]) -> ClassInfo {
        methods.iter().fold(
            ClassInfo::new(name.rsplit("::").next().unwrap_or(name), name),
            |c, m| c.with_method(Method::new(*m, "void")),
        )
    }

    #[test]
    fn test_skip_rule() {
        let config = WeldConfig::default();
        let selector = Selector::new(&config);
        let class = ClassInfo::new("Image", "gfx::Image");

        assert!(selector.keeps_method(&class, &Method::new("Width", "int")));
        assert!(selector.keeps_method(&class, &Method::new("operator==", "bool")));
        assert!(selector.keeps_method(&class, &Method::new("operator+=", "Image &")));

        for rejected in [
            Method::new("Width", "int").with_visibility(Visibility::Protected),
            Method::new("_internal", "void"),
            Method::new("~Image", "void"),
            Method::new("operator=", "Image &").with_param(Parameter::new("", "const Image &")),
            Method::new("qt_metacast", "void *"),
            Method::new("Swap", "void"),
        ] {
            assert!(!selector.keeps_method(&class, &rejected), "{}", rejected.name);
        }

        let flagship = ClassInfo::new("AstrometricMetadata", "pcl::AstrometricMetadata");
        let ensure = Method::new("EnsureSplineGridInterpolationsInitialized", "void");
        assert!(!selector.keeps_method(&flagship, &ensure));
        assert!(selector.keeps_method(&class, &ensure));
    }

    #[test]
    fn test_generic_class_needs_three_methods() {
        let config = WeldConfig::default();
        let selector = Selector::new(&config);
        let two = class_with("gfx::Brush", &["Color", "SetColor", "_hidden"]);
        let three = class_with("gfx::Pen", &["Color", "SetColor", "Width"]);
        let ir = ir_of(vec![two, three]);

        let plans = selector.select(&ir);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].class.qualified_name, "gfx::Pen");
        assert_eq!(plans[0].kind, BindingKind::FullClass);
        assert_eq!(plans[0].max_members, 40);
    }

    #[test]
    fn test_known_bad_and_templates_excluded() {
        let config = WeldConfig::default();
        let selector = Selector::new(&config);
        let bad = class_with("pcl::Mutex", &["Lock", "Unlock", "TryLock"]);
        let template = class_with("gfx::Array", &["Size", "At", "Clear"]).with_template(true);
        let ir = ir_of(vec![bad, template]);

        assert!(selector.select(&ir).is_empty());
    }

    #[test]
    fn test_low_level_classes_excluded() {
        let config = WeldConfig::default();
        let selector = Selector::new(&config);
        let iterator = class_with("gfx::const_iterator", &["Next", "Prev", "Get"]);
        let runtime = class_with("gfx::Bridge", &["Push", "Pop", "Call"]).with_file("/src/sol_bridge.hpp");
        let console = class_with("gfx::Panel", &["Show", "Hide", "Move"]).with_file("/src/console/panel.h");
        let ir = ir_of(vec![iterator, runtime, console]);

        let plans = selector.select(&ir);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].class.qualified_name, "gfx::Panel");
    }

    #[test]
    fn test_struct_rules() {
        let config = WeldConfig::default();
        let selector = Selector::new(&config);

        let span = ClassInfo::new_struct("Span", "geo::Span")
            .with_field(Field::new("start", "int"))
            .with_field(Field::new("end", "int"));
        let single = ClassInfo::new_struct("Tag", "geo::Tag").with_field(Field::new("id", "int"));
        let options =
            ClassInfo::new_struct("WriteOptions", "geo::WriteOptions").with_field(Field::new("q", "int"));
        let data = ClassInfo::new_struct("PixelData", "geo::PixelData")
            .with_field(Field::new("a", "int"))
            .with_field(Field::new("b", "int"));
        let bitfield = ClassInfo::new_struct("ImageOptions", "pcl::ImageOptions")
            .with_field(Field::new("a", "bool"))
            .with_field(Field::new("b", "bool"));
        let outer = class_with("geo::Grid", &["Rows"]);
        let nested = ClassInfo::new_struct("Cell", "geo::Grid::Cell")
            .with_field(Field::new("r", "int"))
            .with_field(Field::new("c", "int"));

        let ir = ir_of(vec![span, single, options, data, bitfield, outer, nested]);
        let selected: Vec<_> = selector
            .select(&ir)
            .into_iter()
            .map(|p| {
                assert_eq!(p.kind, BindingKind::FieldStruct);
                p.class.qualified_name.as_str()
            })
            .collect();

        assert_eq!(selected, vec!["geo::Span", "geo::WriteOptions"]);
    }

    #[test]
    fn test_flagship_ordering_and_cap() {
        let config = WeldConfig::default();
        let selector = Selector::new(&config);

        let mut equal = Method::new("operator==", "bool");
        equal.mapped_metamethod = Some("equal_to".to_string());
        let flagship = ClassInfo::new("AstrometricMetadata", "pcl::AstrometricMetadata")
            .with_method(Method::new("Extra", "void"))
            .with_method(equal)
            .with_method(Method::new("Width", "int"))
            .with_method(Method::new("Build", "void"));
        let ir = ir_of(vec![flagship]);

        let plans = selector.select(&ir);
        assert_eq!(plans[0].kind, BindingKind::Flagship);
        assert_eq!(plans[0].max_members, 64);
        let order: Vec<_> = plans[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(order, vec!["Build", "Width", "operator==", "Extra"]);
    }
}
