//! Declaration tree produced by a [`Frontend`](super::Frontend)
//!
//! A closed set of declaration kinds: the extractor matches on these
//! instead of dispatching over parser cursors, so any parser (or a test)
//! can feed it.

use crate::ir::Visibility;

/// A top-level or namespace-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// A namespace; anonymous namespaces have an empty name
    Namespace { name: String, children: Vec<Decl> },
    /// A struct, class or class template
    Record(RecordDecl),
    /// Any other declaration that may still contain records (linkage specs, ...)
    Other { children: Vec<Decl> },
}

impl Decl {
    pub fn namespace(name: impl Into<String>, children: Vec<Decl>) -> Self {
        Decl::Namespace {
            name: name.into(),
            children,
        }
    }
}

impl From<RecordDecl> for Decl {
    fn from(record: RecordDecl) -> Self {
        Decl::Record(record)
    }
}

/// Record keyword, which decides the default member access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Class,
}

/// A struct or class declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub kind: RecordKind,
    pub name: String,
    /// File the declaration expands in
    pub file: String,
    /// False for forward declarations
    pub is_definition: bool,
    pub is_template: bool,
    pub members: Vec<Member>,
}

impl RecordDecl {
    fn new(kind: RecordKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            file: String::new(),
            is_definition: true,
            is_template: false,
            members: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(RecordKind::Class, name)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(RecordKind::Struct, name)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Mark as a forward declaration
    pub fn forward(mut self) -> Self {
        self.is_definition = false;
        self
    }

    pub fn with_template(mut self, is_template: bool) -> Self {
        self.is_template = is_template;
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Access applied to members that carry no explicit specifier
    pub fn default_access(&self) -> Visibility {
        match self.kind {
            RecordKind::Struct => Visibility::Public,
            RecordKind::Class => Visibility::Private,
        }
    }
}

/// A record member
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(MethodDecl),
    Destructor(MethodDecl),
    /// Base specifier type text
    Base(String),
    /// Nested record
    Record(RecordDecl),
    /// Anything else (typedefs, enums, friend declarations, ...)
    Other,
}

/// A data member, static or not
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: String,
    /// `None` when the parser reported no access specifier
    pub access: Option<Visibility>,
    pub is_static: bool,
    pub is_mutable: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            access: None,
            is_static: false,
            is_mutable: false,
        }
    }

    pub fn with_access(mut self, access: Visibility) -> Self {
        self.access = Some(access);
        self
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

/// A function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: String,
    pub default_value: Option<String>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// A method, constructor or destructor
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    /// Empty for constructors and destructors
    pub return_type: String,
    pub params: Vec<ParamDecl>,
    pub is_const: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub access: Option<Visibility>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params: Vec::new(),
            is_const: false,
            is_static: false,
            is_virtual: false,
            access: None,
        }
    }

    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
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

    pub fn with_access(mut self, access: Visibility) -> Self {
        self.access = Some(access);
        self
    }

    /// Shorthand for an explicitly public member
    pub fn public(self) -> Self {
        self.with_access(Visibility::Public)
    }
}
