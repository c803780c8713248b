//! libclang frontend
//!
//! Loads libclang at runtime through the `clang` crate and maps its entity
//! tree onto [`Decl`]. Only the entity kinds the extractor cares about are
//! converted; everything else becomes `Other` or is dropped.

use super::{
    Decl, FieldDecl, Frontend, Member, MethodDecl, ParamDecl, ParseMode, RecordDecl, RecordKind,
};
use crate::error::{WeldError, WeldResult};
use crate::ir::Visibility;
use clang::diagnostic::Severity;
use clang::{Accessibility, Clang, Entity, EntityKind, Index};
use std::path::Path;
use tracing::debug;

/// Frontend backed by the system libclang
#[derive(Debug, Clone, Copy, Default)]
pub struct ClangFrontend;

impl ClangFrontend {
    pub fn new() -> Self {
        Self
    }
}

impl Frontend for ClangFrontend {
    fn parse(&self, source: &Path, flags: &[String], mode: ParseMode) -> WeldResult<Vec<Decl>> {
        let clang = Clang::new().map_err(WeldError::frontend)?;
        let index = Index::new(&clang, false, false);

        let mut parser = index.parser(source);
        parser.arguments(flags).detailed_preprocessing_record(true);
        match mode {
            ParseMode::Strict => {}
            ParseMode::SkipFunctionBodies => {
                parser.skip_function_bodies(true).incomplete(true);
            }
            ParseMode::IgnoreIncludedErrors => {
                parser
                    .skip_function_bodies(true)
                    .incomplete(true)
                    .ignore_non_errors_from_included_files(true)
                    .keep_going(true);
            }
        }

        let unit = parser
            .parse()
            .map_err(|e| WeldError::frontend(format!("{}: {}", source.display(), e)))?;

        let mut errors = 0usize;
        let mut fatal = 0usize;
        for diagnostic in unit.get_diagnostics() {
            match diagnostic.get_severity() {
                Severity::Fatal => fatal += 1,
                Severity::Error => errors += 1,
                _ => {}
            }
            debug!(%mode, "{}", diagnostic);
        }

        let failed = match mode {
            ParseMode::Strict => errors + fatal > 0,
            ParseMode::SkipFunctionBodies => fatal > 0,
            ParseMode::IgnoreIncludedErrors => false,
        };
        if failed {
            return Err(WeldError::frontend(format!(
                "{}: {} errors, {} fatal",
                source.display(),
                errors,
                fatal
            )));
        }

        Ok(convert_children(&unit.get_entity()))
    }
}

fn convert_children(entity: &Entity) -> Vec<Decl> {
    entity
        .get_children()
        .iter()
        .filter_map(convert_decl)
        .collect()
}

fn convert_decl(entity: &Entity) -> Option<Decl> {
    match entity.get_kind() {
        EntityKind::Namespace => Some(Decl::Namespace {
            name: entity.get_name().unwrap_or_default(),
            children: convert_children(entity),
        }),
        EntityKind::StructDecl | EntityKind::ClassDecl | EntityKind::ClassTemplate => {
            convert_record(entity).map(Decl::Record)
        }
        EntityKind::LinkageSpec | EntityKind::UnexposedDecl => Some(Decl::Other {
            children: convert_children(entity),
        }),
        _ => None,
    }
}

fn convert_record(entity: &Entity) -> Option<RecordDecl> {
    let is_template = entity.get_kind() == EntityKind::ClassTemplate;
    let kind = match entity.get_kind() {
        EntityKind::StructDecl => RecordKind::Struct,
        EntityKind::ClassDecl => RecordKind::Class,
        EntityKind::ClassTemplate => match entity.get_template_kind() {
            Some(EntityKind::StructDecl) => RecordKind::Struct,
            _ => RecordKind::Class,
        },
        _ => return None,
    };

    // Anonymous records have nothing to bind by name
    let name = entity.get_name()?;
    let is_definition = entity.is_definition();
    let members = if is_definition {
        entity.get_children().iter().map(convert_member).collect()
    } else {
        Vec::new()
    };

    Some(RecordDecl {
        kind,
        name,
        file: declaring_file(entity),
        is_definition,
        is_template,
        members,
    })
}

fn convert_member(entity: &Entity) -> Member {
    match entity.get_kind() {
        EntityKind::FieldDecl => Member::Field(FieldDecl {
            name: entity.get_name().unwrap_or_default(),
            ty: type_text(entity),
            access: access(entity),
            is_static: false,
            is_mutable: entity.is_mutable(),
        }),
        // Static data members
        EntityKind::VarDecl => Member::Field(FieldDecl {
            name: entity.get_name().unwrap_or_default(),
            ty: type_text(entity),
            access: access(entity),
            is_static: true,
            is_mutable: false,
        }),
        EntityKind::Method => Member::Method(convert_method(entity)),
        EntityKind::Constructor => Member::Constructor(convert_method(entity)),
        EntityKind::Destructor => Member::Destructor(convert_method(entity)),
        EntityKind::BaseSpecifier => entity
            .get_type()
            .map(|ty| Member::Base(ty.get_display_name()))
            .unwrap_or(Member::Other),
        EntityKind::StructDecl | EntityKind::ClassDecl | EntityKind::ClassTemplate => {
            convert_record(entity)
                .map(Member::Record)
                .unwrap_or(Member::Other)
        }
        _ => Member::Other,
    }
}

fn convert_method(entity: &Entity) -> MethodDecl {
    let params = entity
        .get_arguments()
        .unwrap_or_default()
        .iter()
        .map(|arg| ParamDecl {
            name: arg.get_name().unwrap_or_default(),
            ty: type_text(arg),
            default_value: default_value(arg),
        })
        .collect();

    MethodDecl {
        name: entity.get_name().unwrap_or_default(),
        return_type: entity
            .get_result_type()
            .map(|ty| ty.get_display_name())
            .unwrap_or_default(),
        params,
        is_const: entity.is_const_method(),
        is_static: entity.is_static_method(),
        is_virtual: entity.is_virtual_method(),
        access: access(entity),
    }
}

fn type_text(entity: &Entity) -> String {
    entity
        .get_type()
        .map(|ty| ty.get_display_name())
        .unwrap_or_default()
}

fn access(entity: &Entity) -> Option<Visibility> {
    entity.get_accessibility().map(|a| match a {
        Accessibility::Public => Visibility::Public,
        Accessibility::Protected => Visibility::Protected,
        Accessibility::Private => Visibility::Private,
    })
}

/// Token text after `=` in a parameter declaration
fn default_value(param: &Entity) -> Option<String> {
    let tokens = param.get_range()?.tokenize();
    let eq = tokens.iter().position(|t| t.get_spelling() == "=")?;
    let value: String = tokens[eq + 1..].iter().map(|t| t.get_spelling()).collect();
    (!value.is_empty()).then_some(value)
}

fn declaring_file(entity: &Entity) -> String {
    entity
        .get_location()
        .and_then(|location| location.get_expansion_location().file)
        .map(|file| file.get_path().display().to_string())
        .unwrap_or_default()
}
