//! Forwarding lambdas for methods that cannot be bound by member pointer
//!
//! An adapter declares runtime-native parameter types in place of host
//! types, converts them back before the call, and converts the result on
//! the way out. Parameters it knows it cannot convert produce a stub that
//! throws on first call.

use crate::config::MarshalConfig;
use crate::ir::types::{apply_template, marshal_of, Marshal};
use crate::ir::{ClassInfo, Method};
use tracing::warn;

const BODY_INDENT: &str = "            ";

/// Whether a method must go through an adapter
pub fn needs_adapter(method: &Method, config: &MarshalConfig) -> bool {
    if method.is_static {
        return true;
    }

    let params = method
        .parameters
        .iter()
        .any(|p| p.is_optional || !marshal_of(&p.ty, config).is_direct());

    params
        || matches!(
            marshal_of(&method.return_type, config),
            Marshal::Text(_) | Marshal::Optional { .. }
        )
}

/// Adapter synthesis for one method of one class
pub struct AdapterGenerator<'a> {
    class: &'a ClassInfo,
    method: &'a Method,
    config: &'a MarshalConfig,
}

impl<'a> AdapterGenerator<'a> {
    pub fn new(class: &'a ClassInfo, method: &'a Method, config: &'a MarshalConfig) -> Self {
        Self {
            class,
            method,
            config,
        }
    }

    /// The lambda expression, starting at `[]` and ending at the closing brace
    pub fn generate(&self) -> String {
        let mut declared = Vec::new();
        if !self.method.is_static {
            declared.push(object_param(self.class, self.method));
        }

        let mut args = Vec::new();
        let mut unsupported = None;

        for (index, param) in self.method.parameters.iter().enumerate() {
            let name = param_name(&param.name, index);
            match marshal_of(&param.ty, self.config) {
                Marshal::Table(table) => {
                    declared.push(format!("{} {}", self.config.native_table, name));
                    if unsupported.is_none() {
                        unsupported = Some((name.clone(), table.to_string()));
                    }
                    args.push(name);
                }
                Marshal::Text(text) => {
                    declared.push(format!("const {}& {}", self.config.native_string, name));
                    args.push(apply_template(&text.to_host, &name));
                }
                Marshal::Optional { .. } | Marshal::Direct => {
                    declared.push(format!("{} {}", param.ty, name));
                    args.push(name);
                }
            }
        }

        let mut output = String::new();

        if let Some((name, table)) = unsupported {
            output.push_str(&format!("[]({}) {{\n", declared.join(", ")));
            output.push_str(&format!(
                "{}throw std::runtime_error(\"{}::{}: parameter '{}' needs a Lua table conversion to {} that is not supported\");\n",
                BODY_INDENT, self.class.qualified_name, self.method.name, name, table
            ));
            output.push_str("        }");
            return output;
        }

        let call = self.call_expression(&args);
        let (return_decl, body) = self.return_handling(&call);

        output.push_str(&format!("[]({}){} {{\n", declared.join(", "), return_decl));
        for line in body {
            output.push_str(BODY_INDENT);
            output.push_str(&line);
            output.push('\n');
        }
        output.push_str("        }");
        output
    }

    fn call_expression(&self, args: &[String]) -> String {
        if self.method.is_static {
            format!(
                "{}::{}({})",
                self.class.qualified_name,
                self.method.name,
                args.join(", ")
            )
        } else {
            format!("obj.{}({})", self.method.name, args.join(", "))
        }
    }

    /// Trailing return declaration and body lines
    fn return_handling(&self, call: &str) -> (String, Vec<String>) {
        if self.method.returns_void() {
            return (String::new(), vec![format!("{};", call)]);
        }

        let result = format!("auto result = {};", call);

        match marshal_of(&self.method.return_type, self.config) {
            Marshal::Optional {
                wrapper,
                inner: Some(inner),
            } => {
                let unwrapped = apply_template(&wrapper.unwrap, "result");
                let (native, value) = match marshal_of(&inner, self.config) {
                    Marshal::Text(text) => (
                        self.config.native_string.clone(),
                        apply_template(&text.to_native, &unwrapped),
                    ),
                    _ => (inner.clone(), unwrapped),
                };
                (
                    format!(" -> {}<{}>", self.config.native_optional, native),
                    vec![
                        result,
                        format!("if ({}) {{", apply_template(&wrapper.is_defined, "result")),
                        format!("    return {};", value),
                        "}".to_string(),
                        format!("return {};", self.config.no_value),
                    ],
                )
            }
            Marshal::Optional { inner: None, .. } => {
                warn!(
                    class = %self.class.qualified_name,
                    method = %self.method.name,
                    return_type = %self.method.return_type,
                    "Optional return without a readable inner type, passing through"
                );
                (String::new(), vec![result, "return result;".to_string()])
            }
            Marshal::Text(text) => (
                format!(" -> {}", self.config.native_string),
                vec![
                    result,
                    format!("return {};", apply_template(&text.to_native, "result")),
                ],
            ),
            Marshal::Table(_) | Marshal::Direct => {
                (String::new(), vec![result, "return result;".to_string()])
            }
        }
    }
}

/// `to_string` metamethod body normalizing any return to a plain string
pub fn to_string_adapter(class: &ClassInfo, method: &Method, config: &MarshalConfig) -> String {
    let call = format!("obj.{}()", method.name);
    let mut body = Vec::new();

    match marshal_of(&method.return_type, config) {
        Marshal::Text(text) => body.push(format!("return {};", apply_template(&text.to_native, &call))),
        _ if method.return_type.contains(config.native_string.as_str()) => {
            body.push(format!("return {}({});", config.native_string, call));
        }
        _ => {
            body.push("std::ostringstream stream;".to_string());
            body.push(format!("stream << {};", call));
            body.push("return stream.str();".to_string());
        }
    }

    let mut output = format!("[]({}) {{\n", object_param(class, method));
    for line in body {
        output.push_str(BODY_INDENT);
        output.push_str(&line);
        output.push('\n');
    }
    output.push_str("        }");
    output
}

fn object_param(class: &ClassInfo, method: &Method) -> String {
    if method.is_const {
        format!("const {}& obj", class.qualified_name)
    } else {
        format!("{}& obj", class.qualified_name)
    }
}

fn param_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        format!("arg{}", index)
    } else {
        name.to_string()
    }
}
