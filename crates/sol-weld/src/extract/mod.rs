//! Stage 1: C++ declarations to IR
//!
//! A [`Frontend`] parses one translation unit into a [`Decl`] tree; the
//! [`Extractor`] walks that tree, applies the [`SkipFilter`] and builds a
//! [`ClassInfo`] for every accepted definition.
//!
//! # Architecture
//!
//! - `decl`: closed declaration tree the frontend produces
//! - `filter`: ordered record skip filter
//! - `flags`: compile flag assembly from a compilation database
//! - `libclang`: libclang frontend (cargo feature `libclang`)

pub mod decl;
pub mod filter;
pub mod flags;

#[cfg(feature = "libclang")]
pub mod libclang;

pub use decl::*;
pub use filter::{SkipFilter, SkipReason};
pub use flags::compile_flags;

#[cfg(feature = "libclang")]
pub use libclang::ClangFrontend;

use crate::config::WeldConfig;
use crate::error::WeldResult;
use crate::ir::{types, ClassInfo, Field, IrMap, Method, Parameter, TypeCleaner, Visibility};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Parser strictness, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Full parse, any error fails
    Strict,
    /// Function bodies skipped, incomplete units tolerated
    SkipFunctionBodies,
    /// As above, and problems inside included files are ignored
    IgnoreIncludedErrors,
}

impl ParseMode {
    pub const ALL: [ParseMode; 3] = [
        ParseMode::Strict,
        ParseMode::SkipFunctionBodies,
        ParseMode::IgnoreIncludedErrors,
    ];
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMode::Strict => write!(f, "strict"),
            ParseMode::SkipFunctionBodies => write!(f, "skip-function-bodies"),
            ParseMode::IgnoreIncludedErrors => write!(f, "ignore-included-errors"),
        }
    }
}

/// Parses one translation unit into a declaration tree
pub trait Frontend {
    fn parse(&self, source: &Path, flags: &[String], mode: ParseMode) -> WeldResult<Vec<Decl>>;
}

impl<F: Frontend + ?Sized> Frontend for &F {
    fn parse(&self, source: &Path, flags: &[String], mode: ParseMode) -> WeldResult<Vec<Decl>> {
        (**self).parse(source, flags, mode)
    }
}

/// Walks declaration trees into IR maps
pub struct Extractor<'c, F> {
    frontend: F,
    config: &'c WeldConfig,
    cleaner: TypeCleaner,
}

impl<'c, F: Frontend> Extractor<'c, F> {
    /// Create an extractor over a frontend
    pub fn new(frontend: F, config: &'c WeldConfig) -> Self {
        Self {
            frontend,
            config,
            cleaner: TypeCleaner::new(&config.normalize),
        }
    }

    /// Parse and extract one source file
    ///
    /// Each [`ParseMode`] is tried in turn. When every mode fails the result
    /// is an empty map; the failure is logged, never returned.
    pub fn extract(&self, source: &Path, flags: &[String]) -> IrMap {
        for mode in ParseMode::ALL {
            match self.frontend.parse(source, flags, mode) {
                Ok(decls) => {
                    debug!(source = %source.display(), %mode, "Parsed translation unit");
                    let classes = self.collect(&decls);
                    info!(count = classes.len(), source = %source.display(), "Extracted classes");
                    return classes;
                }
                Err(e) => warn!(source = %source.display(), %mode, error = %e, "Parse attempt failed"),
            }
        }

        error!(source = %source.display(), "All parse modes failed, extracting nothing");
        IrMap::new()
    }

    /// Extract every accepted record from a declaration tree
    pub fn collect(&self, decls: &[Decl]) -> IrMap {
        decls
            .iter()
            .fold(IrMap::new(), |acc, decl| self.visit(decl, &[], acc))
    }

    fn visit(&self, decl: &Decl, scope: &[&str], acc: IrMap) -> IrMap {
        match decl {
            Decl::Namespace { name, children } => {
                let mut inner = scope.to_vec();
                if !name.is_empty() {
                    inner.push(name.as_str());
                }
                children
                    .iter()
                    .fold(acc, |acc, child| self.visit(child, &inner, acc))
            }
            Decl::Record(record) => self.visit_record(record, scope, acc),
            Decl::Other { children } => children
                .iter()
                .fold(acc, |acc, child| self.visit(child, scope, acc)),
        }
    }

    fn visit_record(&self, record: &RecordDecl, scope: &[&str], mut acc: IrMap) -> IrMap {
        let mut path = scope.to_vec();
        path.push(record.name.as_str());
        let qualified = path.join("::");

        if let Err(reason) = SkipFilter::new(&self.config.filter).check(record, &qualified) {
            debug!(class = %qualified, %reason, "Skipping record");
            return acc;
        }

        let class = self.build_class(record, &qualified);
        if !class.has_members() {
            debug!(class = %qualified, "Skipping record without public members");
        } else if acc.contains_key(&qualified) {
            debug!(class = %qualified, "Keeping first definition");
        } else {
            debug!(
                class = %qualified,
                methods = class.methods.len(),
                fields = class.fields.len(),
                "Extracted record"
            );
            acc.insert(qualified, class);
        }

        record
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Record(nested) => Some(nested),
                _ => None,
            })
            .fold(acc, |acc, nested| self.visit_record(nested, &path, acc))
    }

    fn build_class(&self, record: &RecordDecl, qualified: &str) -> ClassInfo {
        let mut class = match record.kind {
            RecordKind::Struct => ClassInfo::new_struct(&record.name, qualified),
            RecordKind::Class => ClassInfo::new(&record.name, qualified),
        }
        .with_file(&record.file)
        .with_template(record.is_template);

        let default_access = record.default_access();
        let observable = &self.config.classify.observable_base;

        for member in &record.members {
            match member {
                Member::Field(field) => {
                    if field.access.unwrap_or(default_access).is_public() {
                        class.fields.push(
                            Field::new(&field.name, self.cleaner.clean(&field.ty))
                                .with_static(field.is_static)
                                .with_mutable(field.is_mutable),
                        );
                    }
                }
                Member::Method(method) => {
                    if !method.name.is_empty()
                        && method.access.unwrap_or(default_access).is_public()
                    {
                        class.methods.push(self.build_method(method));
                    }
                }
                Member::Constructor(ctor) => {
                    if ctor.access.unwrap_or(default_access).is_public() {
                        let mut built = self.build_method(ctor);
                        built.is_constructor = true;
                        built.return_type.clear();
                        class.constructors.push(built);
                    }
                }
                Member::Base(base) => {
                    let base = self.cleaner.clean(base);
                    if !observable.is_empty() && base.contains(observable.as_str()) {
                        class.has_observable_base = true;
                    }
                    class.base_classes.push(base);
                }
                Member::Destructor(_) | Member::Record(_) | Member::Other => {}
            }
        }

        class
    }

    fn build_method(&self, decl: &MethodDecl) -> Method {
        let mut method = Method::new(&decl.name, self.cleaner.clean(&decl.return_type))
            .with_const(decl.is_const)
            .with_static(decl.is_static)
            .with_virtual(decl.is_virtual)
            .with_visibility(Visibility::Public);

        for param in &decl.params {
            let ty = self.cleaner.clean(&param.ty);
            let is_optional = types::is_optional_type(&ty, &self.config.marshal);
            let mut built = Parameter::new(&param.name, ty).optional(is_optional);
            if let Some(value) = &param.default_value {
                built = built.with_default(value);
            }
            method.parameters.push(built);
        }

        method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeldError;
    use std::cell::RefCell;

    /// Frontend that fails a fixed number of times, then returns a tree
    struct ScriptedFrontend {
        failures: usize,
        tree: Vec<Decl>,
        modes: RefCell<Vec<ParseMode>>,
    }

    impl ScriptedFrontend {
        fn new(failures: usize, tree: Vec<Decl>) -> Self {
            Self {
                failures,
                tree,
                modes: RefCell::new(Vec::new()),
            }
        }
    }

    impl Frontend for ScriptedFrontend {
        fn parse(&self, _: &Path, _: &[String], mode: ParseMode) -> WeldResult<Vec<Decl>> {
            let mut modes = self.modes.borrow_mut();
            modes.push(mode);
            if modes.len() <= self.failures {
                Err(WeldError::frontend(format!("{} failed", mode)))
            } else {
                Ok(self.tree.clone())
            }
        }
    }

    fn image_record() -> RecordDecl {
        RecordDecl::class("Image")
            .with_file("/home/dev/src/image.h")
            .with_member(Member::Base("QObject".into()))
            .with_member(Member::Constructor(MethodDecl::new("Image", "").public()))
            .with_member(Member::Field(FieldDecl::new("hidden", "int")))
            .with_member(Member::Field(
                FieldDecl::new("tag", "struct Tag").with_access(Visibility::Public),
            ))
            .with_member(Member::Method(
                MethodDecl::new("Width", "int").with_const(true).public(),
            ))
            .with_member(Member::Method(
                MethodDecl::new("Secret", "void").with_access(Visibility::Private),
            ))
            .with_member(Member::Destructor(MethodDecl::new("~Image", "").public()))
            .with_member(Member::Method(
                MethodDecl::new("Resize", "void")
                    .public()
                    .with_param(ParamDecl::new("w", "int"))
                    .with_param(ParamDecl::new("scale", "Optional<double>").with_default("{}")),
            ))
    }

    fn tree() -> Vec<Decl> {
        vec![Decl::namespace(
            "gfx",
            vec![
                image_record().into(),
                RecordDecl::class("Pending").forward().into(),
                RecordDecl::structure("Opaque")
                    .with_member(Member::Field(
                        FieldDecl::new("x", "int").with_access(Visibility::Private),
                    ))
                    .into(),
            ],
        )]
    }

    #[test]
    fn test_collect_builds_public_members() {
        let config = WeldConfig::default();
        let extractor = Extractor::new(ScriptedFrontend::new(0, vec![]), &config);
        let ir = extractor.collect(&tree());

        assert_eq!(ir.keys().collect::<Vec<_>>(), vec!["gfx::Image"]);
        let image = &ir["gfx::Image"];
        assert_eq!(image.name, "Image");
        assert!(!image.is_struct);
        assert!(image.has_observable_base);
        assert_eq!(image.base_classes, vec!["QObject"]);
        assert_eq!(image.fields.len(), 1);
        assert_eq!(image.fields[0].ty, "Tag");
        assert_eq!(
            image.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            vec!["Width", "Resize"]
        );
        assert_eq!(image.constructors.len(), 1);
        assert!(image.constructors[0].is_constructor);

        let resize = &image.methods[1];
        assert_eq!(resize.arity(), 2);
        assert!(resize.parameters[1].is_optional);
        assert_eq!(resize.parameters[1].default_value, "{}");
    }

    #[test]
    fn test_struct_members_default_public() {
        let config = WeldConfig::default();
        let extractor = Extractor::new(ScriptedFrontend::new(0, vec![]), &config);
        let decls = vec![RecordDecl::structure("Span")
            .with_member(Member::Field(FieldDecl::new("start", "int")))
            .with_member(Member::Field(FieldDecl::new("end", "int")))
            .into()];

        let ir = extractor.collect(&decls);
        assert!(ir["Span"].is_struct);
        assert_eq!(ir["Span"].fields.len(), 2);
    }

    #[test]
    fn test_nested_records_are_scoped() {
        let config = WeldConfig::default();
        let extractor = Extractor::new(ScriptedFrontend::new(0, vec![]), &config);
        let inner = RecordDecl::structure("Options")
            .with_member(Member::Field(FieldDecl::new("quality", "int")));
        let outer = RecordDecl::class("Writer")
            .with_member(Member::Method(MethodDecl::new("Close", "void").public()))
            .with_member(Member::Record(inner));
        let decls = vec![Decl::namespace("io", vec![outer.into()])];

        let ir = extractor.collect(&decls);
        assert!(ir.contains_key("io::Writer"));
        assert_eq!(ir["io::Writer::Options"].name, "Options");
    }

    #[test]
    fn test_retry_until_mode_succeeds() {
        let config = WeldConfig::default();
        let frontend = ScriptedFrontend::new(2, tree());
        let extractor = Extractor::new(&frontend, &config);

        let ir = extractor.extract(Path::new("image.h"), &[]);
        assert_eq!(ir.len(), 1);
        assert_eq!(*frontend.modes.borrow(), ParseMode::ALL.to_vec());
    }

    #[test]
    fn test_all_modes_failing_yields_empty_map() {
        let config = WeldConfig::default();
        let frontend = ScriptedFrontend::new(3, tree());
        let extractor = Extractor::new(&frontend, &config);

        assert!(extractor.extract(Path::new("image.h"), &[]).is_empty());
        assert_eq!(frontend.modes.borrow().len(), 3);
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let config = WeldConfig::default();
        let extractor = Extractor::new(ScriptedFrontend::new(0, tree()), &config);
        let first = extractor.extract(Path::new("image.h"), &[]);
        let second = extractor.extract(Path::new("image.h"), &[]);
        assert_eq!(first, second);
    }
}
