//! sol2 registration generator
//!
//! Renders each [`BindingPlan`] as one `lua->new_usertype<T>(...)` block:
//! an optional default-constructor declaration, the method bindings, then
//! the field bindings.

use crate::classify::is_operator_name;
use crate::codegen::adapter::{needs_adapter, to_string_adapter, AdapterGenerator};
use crate::config::WeldConfig;
use crate::ir::document::simple_name;
use crate::ir::{ClassInfo, Method};
use crate::select::{BindingKind, BindingPlan};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Rewrite a C++ identifier in the runtime's lower snake case
///
/// A separator goes before every uppercase letter that follows a lowercase
/// one, so `ImageToCelestial` becomes `image_to_celestial` and `CreatorOS`
/// becomes `creator_os`. Lower snake case input is returned unchanged.
pub fn to_lua_name(name: &str) -> String {
    let mut output = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for c in name.chars() {
        if prev_lower && c.is_uppercase() {
            output.push('_');
        }
        prev_lower = c.is_lowercase();
        output.extend(c.to_lowercase());
    }

    output
}

/// Generator for sol2 usertype registrations
pub struct Sol2Generator<'a> {
    plans: &'a [BindingPlan<'a>],
    total_classes: usize,
    config: &'a WeldConfig,
}

impl<'a> Sol2Generator<'a> {
    /// Create a generator; `total_classes` is the size of the IR it was selected from
    pub fn new(plans: &'a [BindingPlan<'a>], total_classes: usize, config: &'a WeldConfig) -> Self {
        Self {
            plans,
            total_classes,
            config,
        }
    }

    /// Generate the complete registration source
    pub fn generate(&self) -> String {
        let mut output = String::new();

        output.push_str("// Generated Sol2 Lua bindings\n");
        output.push_str(&format!("// Total classes: {}\n\n", self.total_classes));

        for plan in self.plans {
            output.push_str(&self.generate_block(plan));
            output.push_str("\n\n");
        }

        output.push_str(&format!(
            "// Generated bindings for {} classes\n",
            self.plans.len()
        ));
        output
    }

    /// Generate one registration block
    pub fn generate_block(&self, plan: &BindingPlan<'_>) -> String {
        let class = plan.class;
        let qualified = class.qualified_name.as_str();

        let comment = match plan.kind {
            BindingKind::Flagship => format!("    // Specialized binding for {}\n", qualified),
            BindingKind::FieldStruct => format!("    // Bind {} structure\n", qualified),
            BindingKind::FullClass => format!("    // Bind {} class\n", qualified),
        };

        let mut used = HashSet::new();
        let mut members = self.method_bindings(class, &plan.methods, &mut used);
        members.extend(self.field_bindings(class, &mut used));

        if members.len() > plan.max_members {
            warn!(
                class = %qualified,
                cap = plan.max_members,
                dropped = members.len() - plan.max_members,
                "Binding list exceeds cap, truncating"
            );
            members.truncate(plan.max_members);
        }

        let mut entries = Vec::new();
        if class.has_default_constructor() {
            entries.push(format!("        sol::constructors<{}()>()", qualified));
        }
        entries.extend(members);

        let usertype = if class.name.is_empty() {
            simple_name(qualified)
        } else {
            class.name.as_str()
        };

        if entries.is_empty() {
            format!(
                "{}    lua->new_usertype<{}>(\"{}\");",
                comment, qualified, usertype
            )
        } else {
            format!(
                "{}    lua->new_usertype<{}>(\"{}\",\n{}\n    );",
                comment,
                qualified,
                usertype,
                entries.join(",\n")
            )
        }
    }

    fn method_bindings(
        &self,
        class: &ClassInfo,
        methods: &[&Method],
        used: &mut HashSet<String>,
    ) -> Vec<String> {
        let classify = &self.config.classify;
        let mut groups: IndexMap<&str, Vec<&Method>> = IndexMap::new();
        for method in methods {
            groups.entry(method.name.as_str()).or_default().push(method);
        }

        let mut bindings = Vec::new();
        let mut has_to_string = false;

        for (name, overloads) in groups {
            if is_operator_name(name, &classify.operator_prefix) {
                match overloads.iter().find_map(|m| m.mapped_metamethod.as_deref()) {
                    Some(id) => {
                        let key = format!("{}::{}", classify.metamethod_path, id);
                        if used.insert(key.clone()) {
                            bindings.extend(
                                self.metamethod_bindings(class, &key, id, &overloads, used),
                            );
                        }
                    }
                    None => debug!(class = %class.qualified_name, operator = %name, "No runtime metamethod, dropping"),
                }
                continue;
            }

            let lua_name = to_lua_name(name);
            if !used.insert(lua_name.clone()) {
                debug!(class = %class.qualified_name, name = %lua_name, "Duplicate binding name, dropping");
                continue;
            }
            bindings.extend(self.named_bindings(class, &lua_name, &overloads, used));

            if !has_to_string {
                if let Some(method) = overloads
                    .iter()
                    .find(|m| m.is_to_string && m.parameters.is_empty())
                {
                    let key = format!("{}::to_string", classify.metamethod_path);
                    if used.insert(key.clone()) {
                        bindings.push(format!(
                            "        {}, {}",
                            key,
                            to_string_adapter(class, method, &self.config.marshal)
                        ));
                    }
                    has_to_string = true;
                }
            }
        }

        bindings
    }

    fn named_bindings(
        &self,
        class: &ClassInfo,
        lua_name: &str,
        overloads: &[&Method],
        used: &mut HashSet<String>,
    ) -> Vec<String> {
        let marshal = &self.config.marshal;
        let key = format!("\"{}\"", lua_name);

        if let [method] = overloads {
            let value = if needs_adapter(method, marshal) {
                AdapterGenerator::new(class, method, marshal).generate()
            } else {
                format!("&{}::{}", class.qualified_name, method.name)
            };
            return vec![format!("        {}, {}", key, value)];
        }

        if !overloads.iter().any(|m| needs_adapter(m, marshal)) {
            let casts: Vec<_> = overloads
                .iter()
                .map(|m| member_cast(class, m))
                .collect();
            return vec![format!(
                "        {}, sol::overload({})",
                key,
                casts.join(", ")
            )];
        }

        // One distinctly named binding per overload once any needs marshalling
        overloads
            .iter()
            .enumerate()
            .filter_map(|(index, method)| {
                let name = if index == 0 {
                    lua_name.to_string()
                } else {
                    format!("{}_{}", lua_name, index)
                };
                if index > 0 && !used.insert(name.clone()) {
                    debug!(class = %class.qualified_name, name = %name, "Duplicate binding name, dropping");
                    return None;
                }
                let value = if needs_adapter(method, marshal) {
                    AdapterGenerator::new(class, method, marshal).generate()
                } else {
                    member_cast(class, method)
                };
                Some(format!("        \"{}\", {}", name, value))
            })
            .collect()
    }

    /// Bindings for one operator group
    ///
    /// The metamethod key takes the overloads that bind by member pointer.
    /// Each overload needing marshalling gets its own adapter under
    /// `<id>_<n>`; when no overload binds directly the first adapter takes
    /// the key instead.
    fn metamethod_bindings(
        &self,
        class: &ClassInfo,
        key: &str,
        id: &str,
        overloads: &[&Method],
        used: &mut HashSet<String>,
    ) -> Vec<String> {
        let marshal = &self.config.marshal;
        let (marshalled, direct): (Vec<&Method>, Vec<&Method>) = overloads
            .iter()
            .copied()
            .partition(|m| needs_adapter(m, marshal));
        let mut adapters = marshalled.into_iter();

        let value = match direct.as_slice() {
            [] => adapters
                .next()
                .map(|m| AdapterGenerator::new(class, m, marshal).generate()),
            [method] if overloads.len() == 1 => {
                Some(format!("&{}::{}", class.qualified_name, method.name))
            }
            [method] => Some(member_cast(class, method)),
            _ => {
                let casts: Vec<_> = direct.iter().map(|m| member_cast(class, m)).collect();
                Some(format!("sol::overload({})", casts.join(", ")))
            }
        };

        let mut bindings: Vec<String> = value
            .map(|value| format!("        {}, {}", key, value))
            .into_iter()
            .collect();

        for (index, method) in adapters.enumerate() {
            let name = format!("{}_{}", id, index + 1);
            if !used.insert(name.clone()) {
                debug!(class = %class.qualified_name, name = %name, "Duplicate binding name, dropping");
                continue;
            }
            bindings.push(format!(
                "        \"{}\", {}",
                name,
                AdapterGenerator::new(class, method, marshal).generate()
            ));
        }

        bindings
    }

    fn field_bindings(&self, class: &ClassInfo, used: &mut HashSet<String>) -> Vec<String> {
        class
            .fields
            .iter()
            .filter(|f| f.visibility.is_public() && !f.name.is_empty() && !f.ty.is_empty())
            .filter_map(|field| {
                let lua_name = to_lua_name(&field.name);
                if !used.insert(lua_name.clone()) {
                    debug!(class = %class.qualified_name, name = %lua_name, "Duplicate binding name, dropping");
                    return None;
                }
                let value = if field.is_static {
                    format!("sol::var(std::ref({}::{}))", class.qualified_name, field.name)
                } else {
                    format!("&{}::{}", class.qualified_name, field.name)
                };
                Some(format!("        \"{}\", {}", lua_name, value))
            })
            .collect()
    }
}

/// Member pointer disambiguated by its exact signature
///
/// Static methods never get here; they always bind through an adapter.
fn member_cast(class: &ClassInfo, method: &Method) -> String {
    let ret = if method.return_type.trim().is_empty() {
        "void"
    } else {
        method.return_type.as_str()
    };

    format!(
        "static_cast<{} ({}::*)({}){}>(&{}::{})",
        ret,
        class.qualified_name,
        method.signature(),
        if method.is_const { " const" } else { "" },
        class.qualified_name,
        method.name
    )
}
