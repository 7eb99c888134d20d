// Copyright (c) 2024-2026 The mealy developers

//! Named entities and the scopes that contain them.
//!
//! Symbols form a tree: every non-root symbol has exactly one parent scope,
//! and scopes are owned by the symbol that introduces them. All links are
//! ids into the compilation's tables, so the parent link is non-owning by
//! construction.
//!
//! Scopes materialize their members lazily. A scope stores the syntax of
//! its deferred members and promotes them to real symbols on the first
//! lookup. Promotion sets the `initialized` flag before it processes any
//! member, so a lookup re-entering the scope mid-promotion sees the partial
//! view instead of recursing forever; this re-entrance is deliberate and is
//! what makes forward references within a scope work.

use crate::context::Compilation;
use crate::expr::Expression;
use crate::stmt::Statement;
use crate::syntax::{
    Direction, ExprSyntax, Lifetime, MemberSyntax, SubroutineSyntax, TypeSyntax, TypeSyntaxKind,
};
use crate::ty::Type;
use crate::value::ConstantValue;
use mealy_common::errors::{Diag, DiagCode, DiagEmitter};
use mealy_common::name::Name;
use mealy_common::source::{Location, Span, Spanned, INVALID_SPAN};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// The id of a symbol within its compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// The id of a scope within its compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// A named entity.
#[derive(Debug)]
pub struct Symbol<'a> {
    pub id: SymbolId,
    /// The declared name. Empty-string names mark anonymous symbols, which
    /// never participate in lookup.
    pub name: Name,
    pub span: Span,
    /// The scope this symbol was declared in. `None` only for the
    /// compilation unit itself.
    pub parent: Option<ScopeId>,
    pub kind: SymbolKind<'a>,
}

/// The kind-specific payload of a symbol.
#[derive(Debug)]
pub enum SymbolKind<'a> {
    /// The compilation unit root.
    CompilationUnit { scope: ScopeId },
    /// A package.
    Package { scope: ScopeId },
    /// A module instance. The core only traverses these; elaborating their
    /// bodies is the outer layers' business.
    Instance { scope: ScopeId },
    /// A generate or statement block scope.
    Block { scope: ScopeId },
    Parameter(ParameterSymbol<'a>),
    Variable(VariableSymbol<'a>),
    FormalArgument(FormalArgSymbol<'a>),
    Subroutine(SubroutineSymbol<'a>),
    TypeAlias(TypeAliasSymbol<'a>),
    /// A field of a struct type. Lives in an anonymous scope hanging off the
    /// struct's typedef.
    Field(FieldSymbol<'a>),
    /// A variant of an enum type. The value lives on the resolved enum type
    /// of the aliased typedef.
    EnumMember(EnumMemberSymbol),
}

impl<'a> SymbolKind<'a> {
    /// The scope this symbol introduces, if any.
    pub fn scope(&self) -> Option<ScopeId> {
        match *self {
            SymbolKind::CompilationUnit { scope }
            | SymbolKind::Package { scope }
            | SymbolKind::Instance { scope }
            | SymbolKind::Block { scope } => Some(scope),
            SymbolKind::Subroutine(ref sub) => Some(sub.scope),
            _ => None,
        }
    }

    /// A human-readable kind name for diagnostics.
    pub fn desc(&self) -> &'static str {
        match self {
            SymbolKind::CompilationUnit { .. } => "compilation unit",
            SymbolKind::Package { .. } => "package",
            SymbolKind::Instance { .. } => "instance",
            SymbolKind::Block { .. } => "block",
            SymbolKind::Parameter(_) => "parameter",
            SymbolKind::Variable(_) => "variable",
            SymbolKind::FormalArgument(_) => "argument",
            SymbolKind::Subroutine(_) => "subroutine",
            SymbolKind::TypeAlias(_) => "typedef",
            SymbolKind::Field(_) => "field",
            SymbolKind::EnumMember(_) => "enum variant",
        }
    }
}

/// A `parameter` or `localparam`.
#[derive(Debug)]
pub struct ParameterSymbol<'a> {
    /// The declared type syntax; implicit if absent.
    pub ty_syntax: Option<&'a TypeSyntax>,
    /// The initializer syntax.
    pub init_syntax: Option<&'a ExprSyntax>,
    pub is_local: bool,
    /// The resolved type, cached on first use.
    pub ty: Cell<Option<Type<'a>>>,
    /// The evaluated value, cached on first use.
    pub value: RefCell<Option<ConstantValue>>,
    /// Guard against recursive evaluation.
    pub evaluating: Cell<bool>,
}

/// A variable declaration.
#[derive(Debug)]
pub struct VariableSymbol<'a> {
    pub ty_syntax: Option<&'a TypeSyntax>,
    pub init_syntax: Option<&'a ExprSyntax>,
    pub lifetime: Lifetime,
    /// The resolved type, cached on first use.
    pub ty: Cell<Option<Type<'a>>>,
    /// The bound initializer, cached on first use. The outer `Option` is
    /// the cache state, the inner one whether an initializer exists.
    pub init: Cell<Option<Option<&'a Expression<'a>>>>,
}

/// A formal argument of a subroutine. Created during subroutine
/// initialization, with its type already resolved.
#[derive(Debug)]
pub struct FormalArgSymbol<'a> {
    pub ty: Type<'a>,
    pub direction: Direction,
    /// The bound default value, if the port declared one.
    pub default: Option<&'a Expression<'a>>,
}

/// A function or task.
#[derive(Debug)]
pub struct SubroutineSymbol<'a> {
    pub syntax: Option<&'a SubroutineSyntax>,
    /// The scope containing the formal arguments and body locals.
    pub scope: ScopeId,
    pub is_task: bool,
    pub lifetime: Lifetime,
    /// Set before the prototype is elaborated, so that recursive calls see
    /// the partially initialized subroutine.
    pub initialized: Cell<bool>,
    pub return_ty: Cell<Option<Type<'a>>>,
    pub args: RefCell<Vec<SymbolId>>,
    pub body: Cell<Option<&'a Statement<'a>>>,
}

/// A typedef.
#[derive(Debug)]
pub struct TypeAliasSymbol<'a> {
    pub ty_syntax: &'a TypeSyntax,
    /// The resolved type, cached on first use.
    pub ty: Cell<Option<Type<'a>>>,
    /// Guard against recursive resolution.
    pub resolving: Cell<bool>,
    /// For struct typedefs, the anonymous scope holding the field symbols.
    pub field_scope: Cell<Option<ScopeId>>,
}

/// A field of a struct type.
#[derive(Debug)]
pub struct FieldSymbol<'a> {
    pub ty: Type<'a>,
    /// Bit offset from the LSB for packed structs, field index otherwise.
    pub offset: u32,
    pub index: usize,
}

/// A variant of an enum type.
#[derive(Debug)]
pub struct EnumMemberSymbol {
    /// The typedef whose enum type defines this variant.
    pub alias: SymbolId,
    /// The variant index within the enum.
    pub index: usize,
}

/// A name-binding region.
#[derive(Debug)]
pub struct ScopeData<'a> {
    pub id: ScopeId,
    /// The symbol that introduced this scope.
    pub owner: Cell<Option<SymbolId>>,
    /// The lexically enclosing scope.
    pub parent: Option<ScopeId>,
    /// The materialized members, in declaration order.
    members: RefCell<Vec<SymbolId>>,
    /// Name-indexed view of the members.
    names: RefCell<HashMap<Name, SymbolId>>,
    /// Member syntax that has not been promoted to symbols yet.
    deferred: RefCell<Vec<&'a MemberSyntax>>,
    /// Set once promotion has started.
    initialized: Cell<bool>,
}

impl<'a> ScopeData<'a> {
    /// Create a new, empty scope.
    pub fn new(id: ScopeId, parent: Option<ScopeId>, owner: Option<SymbolId>) -> ScopeData<'a> {
        ScopeData {
            id,
            owner: Cell::new(owner),
            parent,
            members: Default::default(),
            names: Default::default(),
            deferred: Default::default(),
            initialized: Cell::new(false),
        }
    }

    /// Queue member syntax for lazy promotion. Re-arms an already
    /// materialized scope so the new members get promoted on next touch.
    pub fn defer(&self, member: &'a MemberSyntax) {
        self.deferred.borrow_mut().push(member);
        self.initialized.set(false);
    }

    /// Add a materialized symbol to this scope.
    ///
    /// Anonymous symbols are recorded in the member list but not in the
    /// name index. Duplicate names are diagnosed and the first declaration
    /// wins.
    pub fn insert(&self, cx: &Compilation<'a>, name: Name, id: SymbolId) {
        self.members.borrow_mut().push(id);
        if name.is_empty() {
            return;
        }
        let mut names = self.names.borrow_mut();
        if let Some(&existing) = names.get(&name) {
            let prev = cx.symbol(existing);
            cx.emit(
                Diag::error(
                    DiagCode::DuplicateDeclaration,
                    format!("`{}` is already declared in this scope", name),
                )
                .span(cx.symbol(id).span)
                .add_note(format!("previous declaration is this {}", prev.kind.desc()))
                .span(prev.span),
            );
            return;
        }
        names.insert(name, id);
    }

    /// The members of this scope in declaration order, materializing first.
    pub fn members(&self, cx: &Compilation<'a>) -> Vec<SymbolId> {
        self.materialize(cx);
        self.members.borrow().clone()
    }

    /// Look up a name in this scope only, materializing first.
    pub fn get(&self, cx: &Compilation<'a>, name: Name) -> Option<SymbolId> {
        self.materialize(cx);
        self.names.borrow().get(&name).cloned()
    }

    /// Promote all deferred member syntax to symbols. Idempotent; the flag
    /// is set before any member is processed, so a lookup re-entering this
    /// scope during promotion sees the members promoted so far.
    pub fn materialize(&self, cx: &Compilation<'a>) {
        if self.initialized.get() {
            return;
        }
        self.initialized.set(true);
        trace!("materializing scope {:?}", self.id);
        loop {
            // Members may queue further members (e.g. nested packages);
            // drain until quiescent.
            let pending = std::mem::replace(&mut *self.deferred.borrow_mut(), vec![]);
            if pending.is_empty() {
                break;
            }
            for member in pending {
                self.promote(cx, member);
            }
        }
    }

    fn promote(&self, cx: &Compilation<'a>, member: &'a MemberSyntax) {
        match member {
            MemberSyntax::Parameter(param) => {
                let id = cx.alloc_symbol(
                    param.name.value,
                    param.name.span,
                    Some(self.id),
                    SymbolKind::Parameter(ParameterSymbol {
                        ty_syntax: param.ty.as_ref(),
                        init_syntax: param.init.as_ref(),
                        is_local: param.is_local,
                        ty: Cell::new(None),
                        value: RefCell::new(None),
                        evaluating: Cell::new(false),
                    }),
                );
                self.insert(cx, param.name.value, id);
            }
            MemberSyntax::Variable(decl) => {
                let id = cx.alloc_symbol(
                    decl.name.value,
                    decl.name.span,
                    Some(self.id),
                    SymbolKind::Variable(VariableSymbol {
                        ty_syntax: Some(&decl.ty),
                        init_syntax: decl.init.as_ref(),
                        lifetime: Lifetime::Static,
                        ty: Cell::new(None),
                        init: Cell::new(None),
                    }),
                );
                self.insert(cx, decl.name.value, id);
            }
            MemberSyntax::Subroutine(sub) => {
                let scope = cx.alloc_scope(Some(self.id), None);
                let id = cx.alloc_symbol(
                    sub.name.value,
                    sub.name.span,
                    Some(self.id),
                    SymbolKind::Subroutine(SubroutineSymbol {
                        syntax: Some(sub),
                        scope,
                        is_task: sub.is_task,
                        lifetime: sub.lifetime,
                        initialized: Cell::new(false),
                        return_ty: Cell::new(None),
                        args: RefCell::new(vec![]),
                        body: Cell::new(None),
                    }),
                );
                cx.scope(scope).owner.set(Some(id));
                self.insert(cx, sub.name.value, id);
            }
            MemberSyntax::Typedef(def) => {
                let id = cx.alloc_symbol(
                    def.name.value,
                    def.name.span,
                    Some(self.id),
                    SymbolKind::TypeAlias(TypeAliasSymbol {
                        ty_syntax: &def.ty,
                        ty: Cell::new(None),
                        resolving: Cell::new(false),
                        field_scope: Cell::new(None),
                    }),
                );
                self.insert(cx, def.name.value, id);
                // Enum variants become members of the enclosing scope.
                if let TypeSyntaxKind::Enum { ref variants, .. } = def.ty.kind {
                    for (index, variant) in variants.iter().enumerate() {
                        let vid = cx.alloc_symbol(
                            variant.name.value,
                            variant.name.span,
                            Some(self.id),
                            SymbolKind::EnumMember(EnumMemberSymbol { alias: id, index }),
                        );
                        self.insert(cx, variant.name.value, vid);
                    }
                }
            }
            MemberSyntax::Package(pkg) => {
                let scope = cx.alloc_scope(Some(self.id), None);
                let id = cx.alloc_symbol(
                    pkg.name.value,
                    pkg.name.span,
                    Some(self.id),
                    SymbolKind::Package { scope },
                );
                cx.scope(scope).owner.set(Some(id));
                for m in &pkg.members {
                    cx.scope(scope).defer(m);
                }
                self.insert(cx, pkg.name.value, id);
            }
        }
    }
}

/// What a lookup is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// Lookup from a declarative context; all members of a scope are
    /// visible regardless of declaration order.
    Definition,
    /// Lookup from procedural code at the given location; only symbols
    /// declared at or before that location are visible.
    Procedural(Location),
}

/// Why a lookup failed.
#[derive(Debug, Clone, Copy)]
pub enum LookupError {
    /// The name did not resolve in any scope.
    NotFound(Spanned<Name>),
    /// A segment of a qualified name resolved to a symbol that has no
    /// scope.
    NotAScope(Spanned<Name>),
}

fn visible_at(sym: &Symbol, kind: LookupKind) -> bool {
    match kind {
        LookupKind::Definition => true,
        LookupKind::Procedural(loc) => {
            sym.span == INVALID_SPAN || sym.span.begin <= loc.offset
        }
    }
}

/// Resolve an unqualified name by walking from the origin scope outward.
/// The first scope that resolves the identifier wins.
pub fn lookup_unqualified<'gcx>(
    cx: &Compilation<'gcx>,
    name: Name,
    origin: ScopeId,
    kind: LookupKind,
) -> Option<SymbolId> {
    let mut next = Some(origin);
    while let Some(scope_id) = next {
        let scope = cx.scope(scope_id);
        if let Some(id) = scope.get(cx, name) {
            if visible_at(cx.symbol(id), kind) {
                return Some(id);
            }
        }
        next = scope.parent;
    }
    None
}

/// Resolve a dotted name. The first segment resolves by unqualified lookup
/// and must yield a scope-bearing symbol; subsequent segments resolve within
/// that scope only. Returns the symbol and whether the path crossed an
/// instance boundary, which makes the reference hierarchical.
pub fn lookup_qualified<'gcx>(
    cx: &Compilation<'gcx>,
    segments: &[Spanned<Name>],
    origin: ScopeId,
    kind: LookupKind,
) -> Result<(SymbolId, bool), LookupError> {
    assert!(!segments.is_empty());
    let unit = mealy_common::name::intern("$unit");
    let first = segments[0];
    let mut hierarchical = false;
    let (mut current, rest) = if first.value == unit {
        let root = cx.scope(cx.root());
        (root.owner.get().expect("root scope has an owner"), &segments[1..])
    } else {
        let id = lookup_unqualified(cx, first.value, origin, kind)
            .ok_or(LookupError::NotFound(first))?;
        (id, &segments[1..])
    };
    for (i, segment) in rest.iter().enumerate() {
        let sym = cx.symbol(current);
        if let SymbolKind::Instance { .. } = sym.kind {
            hierarchical = true;
        }
        let scope = sym
            .kind
            .scope()
            .ok_or(LookupError::NotAScope(Spanned::new(sym.name, segments[i].span)))?;
        // Order restrictions only apply to the unqualified head.
        current = cx
            .scope(scope)
            .get(cx, segment.value)
            .ok_or(LookupError::NotFound(*segment))?;
    }
    Ok((current, hierarchical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Compilation, GlobalArenas};
    use crate::syntax::*;
    use mealy_common::name::intern;
    use mealy_common::source::INVALID_SPAN;
    use mealy_common::Session;

    fn param(name: &str) -> MemberSyntax {
        MemberSyntax::Parameter(ParameterSyntax {
            name: Spanned::new(intern(name), INVALID_SPAN),
            ty: None,
            init: Some(ExprSyntax::new(ExprSyntaxKind::IntegerLiteral {
                width: None,
                signed: true,
                base: crate::svint::LiteralBase::Decimal,
                digits: "1".into(),
            })),
            is_local: false,
        })
    }

    #[test]
    fn promotion_is_lazy_and_idempotent() {
        let sess = Session::new();
        let arena = GlobalArenas::new();
        let cx = Compilation::new(&sess, &arena);
        let root = cx.scope(cx.root());
        root.defer(cx.alloc_member_syntax(param("P")));

        let name = intern("P");
        let first = lookup_unqualified(&cx, name, cx.root(), LookupKind::Definition);
        assert!(first.is_some());
        // Repeated lookup returns the same symbol.
        for _ in 0..3 {
            assert_eq!(
                lookup_unqualified(&cx, name, cx.root(), LookupKind::Definition),
                first
            );
        }
    }

    #[test]
    fn lookup_walks_outward() {
        let sess = Session::new();
        let arena = GlobalArenas::new();
        let cx = Compilation::new(&sess, &arena);
        let root = cx.scope(cx.root());
        root.defer(cx.alloc_member_syntax(param("outer")));
        let inner = cx.alloc_scope(Some(cx.root()), None);
        assert!(
            lookup_unqualified(&cx, intern("outer"), inner, LookupKind::Definition).is_some()
        );
        assert!(
            lookup_unqualified(&cx, intern("missing"), inner, LookupKind::Definition).is_none()
        );
    }

    #[test]
    fn qualified_lookup_through_package() {
        let sess = Session::new();
        let arena = GlobalArenas::new();
        let cx = Compilation::new(&sess, &arena);
        let pkg = MemberSyntax::Package(PackageSyntax {
            name: Spanned::new(intern("pkg"), INVALID_SPAN),
            members: vec![param("WIDTH")],
        });
        cx.scope(cx.root()).defer(cx.alloc_member_syntax(pkg));

        let path = [
            Spanned::new(intern("pkg"), INVALID_SPAN),
            Spanned::new(intern("WIDTH"), INVALID_SPAN),
        ];
        let (id, hierarchical) =
            lookup_qualified(&cx, &path, cx.root(), LookupKind::Definition).unwrap();
        assert!(!hierarchical);
        assert_eq!(cx.symbol(id).name, intern("WIDTH"));
        // Inner segments resolve within the package only.
        let bad = [
            Spanned::new(intern("pkg"), INVALID_SPAN),
            Spanned::new(intern("nope"), INVALID_SPAN),
        ];
        assert!(lookup_qualified(&cx, &bad, cx.root(), LookupKind::Definition).is_err());
    }

    #[test]
    fn duplicate_declaration_is_diagnosed() {
        let sess = Session::new();
        let arena = GlobalArenas::new();
        let cx = Compilation::new(&sess, &arena);
        let root = cx.scope(cx.root());
        root.defer(cx.alloc_member_syntax(param("P")));
        root.defer(cx.alloc_member_syntax(param("P")));
        root.materialize(&cx);
        assert!(sess.has_diag(DiagCode::DuplicateDeclaration));
    }
}
