// Copyright (c) 2024-2026 The mealy developers

//! The central data structure of the semantic core.
//!
//! A [`Compilation`] owns the tables produced during elaboration and hands
//! out references into the [`GlobalArenas`], which own everything allocated
//! or interned while the compilation is alive. Symbols, scopes, types, and
//! bound trees are all arena-allocated and freed collectively when the
//! compilation is torn down; cross-links between them are plain references.

use crate::{
    expr::Expression,
    stmt::Statement,
    symbols::{ScopeData, ScopeId, Symbol, SymbolId, SymbolKind},
    syntax::MemberSyntax,
    ty::{DefId, Type, TypeKind},
};
use mealy_common::errors::{Diag, DiagEmitter};
use mealy_common::name::Name;
use mealy_common::source::INVALID_SPAN;
use mealy_common::Session;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use typed_arena::Arena;

/// The arenas that own everything allocated during a compilation.
///
/// One bump arena per node family. Nothing is freed individually; the
/// entire set is released together when the compilation is dropped, which
/// is what lets symbols, types, and bound trees link to each other with
/// plain references.
pub struct GlobalArenas<'a> {
    types: Arena<TypeKind<'a>>,
    symbols: Arena<Symbol<'a>>,
    scopes: Arena<ScopeData<'a>>,
    exprs: Arena<Expression<'a>>,
    stmts: Arena<Statement<'a>>,
    syntax: Arena<MemberSyntax>,
}

impl<'a> GlobalArenas<'a> {
    /// Create a fresh set of empty arenas.
    pub fn new() -> GlobalArenas<'a> {
        GlobalArenas {
            types: Arena::new(),
            symbols: Arena::new(),
            scopes: Arena::new(),
            exprs: Arena::new(),
            stmts: Arena::new(),
            syntax: Arena::new(),
        }
    }
}

impl Default for GlobalArenas<'_> {
    fn default() -> Self {
        GlobalArenas::new()
    }
}

/// The central context of a compilation.
pub struct Compilation<'gcx> {
    /// The compiler session acting as the diagnostic sink.
    pub sess: &'gcx Session,
    /// The arena that owns all references handed out by this context.
    pub arena: &'gcx GlobalArenas<'gcx>,
    /// The interned types.
    types: RefCell<HashSet<&'gcx TypeKind<'gcx>>>,
    /// All symbols, indexed by [`SymbolId`].
    symbols: RefCell<Vec<&'gcx Symbol<'gcx>>>,
    /// All scopes, indexed by [`ScopeId`].
    scopes: RefCell<Vec<&'gcx ScopeData<'gcx>>>,
    /// The next nominal type definition id.
    next_def: Cell<u32>,
    /// The root scope of the design.
    root: ScopeId,
    /// External cancellation request, polled by the evaluator at statement
    /// granularity.
    cancelled: AtomicBool,
}

impl<'gcx> Compilation<'gcx> {
    /// Create a new compilation with an empty root scope.
    pub fn new(sess: &'gcx Session, arena: &'gcx GlobalArenas<'gcx>) -> Compilation<'gcx> {
        let cx = Compilation {
            sess,
            arena,
            types: Default::default(),
            symbols: Default::default(),
            scopes: Default::default(),
            next_def: Cell::new(0),
            root: ScopeId(0),
            cancelled: AtomicBool::new(false),
        };
        let root = cx.alloc_scope(None, None);
        debug_assert_eq!(root, cx.root);
        let unit = cx.alloc_symbol(
            mealy_common::name::intern("$unit"),
            INVALID_SPAN,
            None,
            SymbolKind::CompilationUnit { scope: root },
        );
        cx.scope(root).owner.set(Some(unit));
        cx
    }

    /// The root scope of the design.
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Internalize a type and return a reference with compilation lifetime.
    pub fn intern_type(&self, ty: TypeKind<'gcx>) -> Type<'gcx> {
        if let Some(&x) = self.types.borrow().get(&ty) {
            return x;
        }
        let ty = &*self.arena.types.alloc(ty);
        self.types.borrow_mut().insert(ty);
        ty
    }

    /// Allocate a fresh nominal type definition id.
    pub fn alloc_def_id(&self) -> DefId {
        let id = self.next_def.get();
        self.next_def.set(id + 1);
        DefId(id)
    }

    /// Allocate a new scope.
    pub fn alloc_scope(&self, parent: Option<ScopeId>, owner: Option<SymbolId>) -> ScopeId {
        let mut scopes = self.scopes.borrow_mut();
        let id = ScopeId(scopes.len() as u32);
        let scope = &*self.arena.scopes.alloc(ScopeData::new(id, parent, owner));
        scopes.push(scope);
        id
    }

    /// Get a scope by id.
    pub fn scope(&self, id: ScopeId) -> &'gcx ScopeData<'gcx> {
        self.scopes.borrow()[id.0 as usize]
    }

    /// Allocate a new symbol.
    pub fn alloc_symbol(
        &self,
        name: Name,
        span: mealy_common::source::Span,
        parent: Option<ScopeId>,
        kind: SymbolKind<'gcx>,
    ) -> SymbolId {
        let mut symbols = self.symbols.borrow_mut();
        let id = SymbolId(symbols.len() as u32);
        let sym = &*self.arena.symbols.alloc(Symbol {
            id,
            name,
            span,
            parent,
            kind,
        });
        symbols.push(sym);
        id
    }

    /// Get a symbol by id.
    pub fn symbol(&self, id: SymbolId) -> &'gcx Symbol<'gcx> {
        self.symbols.borrow()[id.0 as usize]
    }

    /// Move a member syntax node into the arena, so scopes can defer it.
    pub fn alloc_member_syntax(&self, member: MemberSyntax) -> &'gcx MemberSyntax {
        self.arena.syntax.alloc(member)
    }

    /// Allocate a bound expression.
    pub fn alloc_expr(&self, expr: Expression<'gcx>) -> &'gcx Expression<'gcx> {
        self.arena.exprs.alloc(expr)
    }

    /// Allocate a bound statement.
    pub fn alloc_stmt(&self, stmt: Statement<'gcx>) -> &'gcx Statement<'gcx> {
        self.arena.stmts.alloc(stmt)
    }

    /// Request cancellation of any in-flight constant evaluation.
    pub fn request_cancellation(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl DiagEmitter for Compilation<'_> {
    fn emit(&self, diag: Diag) {
        self.sess.emit(diag)
    }
}
