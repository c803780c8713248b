//! Semantic tagging of extracted classes and methods
//!
//! Every rule is a keyword heuristic over names; the flags it sets are
//! independent and may be wrong. Later stages decide what to do when
//! several flags overlap.

use crate::config::ClassifyConfig;
use crate::ir::{ClassInfo, IrMap, Method};

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|n| !n.is_empty() && haystack.contains(n.to_lowercase().as_str()))
}

/// Runtime metamethod identifier for an operator method name
///
/// `None` for every name outside the configured operator table, which
/// includes the assignment operator.
pub fn metamethod_for<'c>(name: &str, config: &'c ClassifyConfig) -> Option<&'c str> {
    config.metamethods.get(name).map(String::as_str)
}

/// Whether a method name is an operator overload
///
/// The prefix must be followed by something that cannot continue an
/// identifier, so `operator==` and `operator()` qualify but `operatorCount`
/// does not.
pub fn is_operator_name(name: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && name
            .strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| !(c.is_alphanumeric() || c == '_'))
}

/// Tag one method
pub fn classify_method(mut method: Method, config: &ClassifyConfig) -> Method {
    let lower = method.name.to_lowercase();

    method.is_getter = contains_any(&lower, &config.getter_keywords)
        || (method.parameters.is_empty() && method.is_const && !method.returns_void());
    method.is_setter = contains_any(&lower, &config.setter_keywords)
        || (lower.starts_with("set") && method.returns_void());
    method.is_validator = contains_any(&lower, &config.validator_keywords);
    method.is_converter = (!config.converter_prefix.is_empty()
        && lower.starts_with(config.converter_prefix.to_lowercase().as_str()))
        || contains_any(&lower, &config.converter_keywords);
    method.is_to_string = config.to_string_names.iter().any(|n| *n == method.name);

    let is_operator = is_operator_name(&method.name, &config.operator_prefix);
    method.is_metamethod = is_operator && method.name != format!("{}=", config.operator_prefix);
    method.mapped_metamethod = if is_operator {
        metamethod_for(&method.name, config).map(str::to_string)
    } else {
        None
    };

    method
}

/// Tag a class and all of its methods
pub fn classify_class(mut class: ClassInfo, config: &ClassifyConfig) -> ClassInfo {
    let lower = class.name.to_lowercase();

    class.is_library_class =
        !config.library_prefix.is_empty() && class.qualified_name.starts_with(&config.library_prefix);
    class.is_gui_class = is_gui_name(&class.name, &config.gui_name_prefix);
    class.has_observable_base = class.has_observable_base
        || (!config.observable_base.is_empty()
            && class
                .base_classes
                .iter()
                .any(|b| b.contains(config.observable_base.as_str())));
    class.is_container = contains_any(&lower, &config.container_keywords);
    class.is_value_type = class.is_struct || contains_any(&lower, &config.value_type_keywords);
    class.is_metadata = contains_any(&lower, &config.metadata_keywords);
    class.is_algorithm = contains_any(&lower, &config.algorithm_keywords);

    class.methods = class
        .methods
        .into_iter()
        .map(|m| classify_method(m, config))
        .collect();

    class
}

/// Tag every class in an IR map
pub fn classify(ir: IrMap, config: &ClassifyConfig) -> IrMap {
    ir.into_iter()
        .map(|(name, class)| (name, classify_class(class, config)))
        .collect()
}

/// GUI framework convention: the prefix followed by an uppercase letter
fn is_gui_name(name: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && name
            .strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase())
}
