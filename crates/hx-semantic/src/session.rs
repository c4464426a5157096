//! Evaluation session: memo table, recursion guard and cancellation.
//!
//! A [`Session`] is created for one outermost query and dropped when it
//! returns. Everything mutable during analysis lives here, so concurrent
//! queries on different threads share nothing but the read-only catalog and
//! the [`SharedCache`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::AnalysisSection;
use crate::error::{Cancelled, Fault};
use crate::model::{DeclId, DeclarationCatalog, FileId, MemberId, NodePtr};
use crate::resolve::Target;
use crate::ty::TypeRef;
use hx_parser::SyntaxNode;

// ── Cancellation ─────────────────────────────────────────────────────────

/// A cloneable flag a caller can flip to stop a running query.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

// ── Results ──────────────────────────────────────────────────────────────

/// A computed type plus whether it may be memoized.
///
/// Results that passed through a tripped recursion guard, or that depended
/// on an externally supplied hint, are not cacheable; the flag travels up
/// with the value so every caller on the path knows.
#[derive(Debug, Clone, PartialEq)]
pub struct Typed {
    pub ty: TypeRef,
    pub cacheable: bool,
}

impl Typed {
    pub fn new(ty: TypeRef) -> Self {
        Self { ty, cacheable: true }
    }

    pub fn uncached(ty: TypeRef) -> Self {
        Self {
            ty,
            cacheable: false,
        }
    }

    pub fn unknown() -> Self {
        Self::new(TypeRef::Unknown)
    }

    /// Replace the type, keeping the flag.
    pub fn map(self, f: impl FnOnce(TypeRef) -> TypeRef) -> Self {
        Self {
            ty: f(self.ty),
            cacheable: self.cacheable,
        }
    }

    /// Fold `other`'s flag into this result.
    pub fn absorb(&mut self, other: &Typed) {
        self.cacheable &= other.cacheable;
    }
}

/// What a recursion guard protects. Entering the same key twice on one
/// stack is a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardKey {
    Eval(NodePtr, u64),
    Resolve(NodePtr),
    Typedef(DeclId),
    Member(MemberId),
    Usage(NodePtr),
    /// Implicit casts of an abstract, while checking assignability.
    Cast(DeclId),
    Supertypes(DeclId),
    /// Structural check against a structure type.
    Structure(DeclId),
}

// ── Shared cache ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SharedInner {
    stamp: u64,
    resolved: FxHashMap<(NodePtr, u64), Vec<Target>>,
}

/// Resolve results kept across sessions until the sources change.
#[derive(Debug, Default)]
pub struct SharedCache {
    inner: Mutex<SharedInner>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SharedInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, stamp: u64, key: &(NodePtr, u64)) -> Option<Vec<Target>> {
        let inner = self.lock();
        if inner.stamp != stamp {
            return None;
        }
        inner.resolved.get(key).cloned()
    }

    pub fn insert(&self, stamp: u64, key: (NodePtr, u64), targets: Vec<Target>) {
        let mut inner = self.lock();
        if inner.stamp != stamp {
            inner.resolved.clear();
            inner.stamp = stamp;
        }
        inner.resolved.insert(key, targets);
    }

    pub fn clear(&self) {
        self.lock().resolved.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Session ──────────────────────────────────────────────────────────────

/// State of one outermost query.
pub struct Session<'a> {
    pub catalog: &'a dyn DeclarationCatalog,
    pub config: &'a AnalysisSection,
    token: CancellationToken,
    shared: Option<&'a SharedCache>,
    /// Syntax roots materialised for this session, one per file.
    roots: FxHashMap<FileId, SyntaxNode>,
    root_files: FxHashMap<SyntaxNode, FileId>,
    /// Memoized evaluations, keyed by node and generic fingerprint.
    memo: FxHashMap<(NodePtr, u64), TypeRef>,
    resolve_memo: FxHashMap<(NodePtr, u64), Vec<Target>>,
    /// Keys currently being computed, innermost last.
    guard: Vec<GuardKey>,
    /// Calls whose argument types are being inferred, to stop lambdas from
    /// re-entering their own call.
    pub in_flight_calls: FxHashSet<NodePtr>,
    depth: usize,
    /// Guard trips so far. A computation that saw one is not cacheable,
    /// whether or not its callees passed the flag up.
    cycles: u64,
    builtins: FxHashMap<&'static str, Option<DeclId>>,
    /// Expected type supplied by the caller for one node.
    hint: Option<(NodePtr, TypeRef)>,
}

impl<'a> Session<'a> {
    pub fn new(
        catalog: &'a dyn DeclarationCatalog,
        config: &'a AnalysisSection,
        token: CancellationToken,
        shared: Option<&'a SharedCache>,
    ) -> Self {
        Session {
            catalog,
            config,
            token,
            shared,
            roots: FxHashMap::default(),
            root_files: FxHashMap::default(),
            memo: FxHashMap::default(),
            resolve_memo: FxHashMap::default(),
            guard: Vec::new(),
            in_flight_calls: FxHashSet::default(),
            depth: 0,
            cycles: 0,
            builtins: FxHashMap::default(),
            hint: None,
        }
    }

    /// Cooperative cancellation point, polled between recursive steps.
    pub fn step(&self) -> Result<(), Fault> {
        self.token.check()?;
        Ok(())
    }

    // ── Syntax access ───────────────────────────────────────────────────

    /// The syntax root of a file, built once per session.
    pub fn root(&mut self, file: FileId) -> Option<SyntaxNode> {
        if let Some(root) = self.roots.get(&file) {
            return Some(root.clone());
        }
        let root = self.catalog.file(file)?.syntax();
        self.roots.insert(file, root.clone());
        self.root_files.insert(root.clone(), file);
        Some(root)
    }

    /// Turn a pointer back into a node of this session's trees.
    pub fn node(&mut self, ptr: &NodePtr) -> Result<SyntaxNode, Fault> {
        self.root(ptr.file)
            .and_then(|root| ptr.to_node(&root))
            .ok_or(Fault::DanglingNode(*ptr))
    }

    /// Pointer to a node of one of this session's trees.
    pub fn ptr(&self, node: &SyntaxNode) -> Option<NodePtr> {
        let root = node.ancestors().last()?;
        let file = self.root_files.get(&root)?;
        Some(NodePtr::new(*file, node))
    }

    pub fn file_of(&self, node: &SyntaxNode) -> Option<FileId> {
        let root = node.ancestors().last()?;
        self.root_files.get(&root).copied()
    }

    // ── Recursion guard ─────────────────────────────────────────────────

    /// Push `key` on the guard stack. Returns `Ok(false)` if it is already
    /// there, which means the caller hit a cycle.
    pub fn enter(&mut self, key: GuardKey) -> Result<bool, Fault> {
        self.step()?;
        if self.guard.contains(&key) {
            log::debug!("recursion guard tripped on {key:?}");
            self.cycles += 1;
            return Ok(false);
        }
        if self.depth >= self.config.max_depth {
            return Err(Fault::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        self.guard.push(key);
        Ok(true)
    }

    pub fn leave(&mut self, key: GuardKey) {
        if let Some(pos) = self.guard.iter().rposition(|k| *k == key) {
            self.guard.remove(pos);
            self.depth = self.depth.saturating_sub(1);
        }
    }

    /// Run `f` under `key`. A cycle returns `on_cycle` without running it.
    pub fn guarded<T>(
        &mut self,
        key: GuardKey,
        on_cycle: T,
        f: impl FnOnce(&mut Self) -> Result<T, Fault>,
    ) -> Result<T, Fault> {
        if !self.enter(key)? {
            return Ok(on_cycle);
        }
        let result = f(self);
        self.leave(key);
        result
    }

    pub fn is_guarded(&self, key: &GuardKey) -> bool {
        self.guard.contains(key)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of guard trips so far in this session.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    // ── Caches ──────────────────────────────────────────────────────────

    /// Whether results may be stored at all right now. Nothing computed
    /// under a caller-supplied hint is kept.
    pub fn may_cache(&self) -> bool {
        self.config.memoize && !self.catalog.is_indexing_in_progress() && self.hint.is_none()
    }

    pub fn set_hint(&mut self, ptr: NodePtr, ty: TypeRef) {
        self.hint = Some((ptr, ty));
    }

    /// The caller's expected type for `ptr`, if one was given.
    pub fn hint_for(&self, ptr: &NodePtr) -> Option<&TypeRef> {
        self.hint
            .as_ref()
            .filter(|(hinted, _)| hinted == ptr)
            .map(|(_, ty)| ty)
    }

    pub fn memo_get(&self, key: &(NodePtr, u64)) -> Option<TypeRef> {
        let hit = self.memo.get(key).cloned();
        if hit.is_some() {
            log::trace!("memo hit for {:?}", key.0);
        }
        hit
    }

    pub fn memo_put(&mut self, key: (NodePtr, u64), ty: TypeRef) {
        if self.may_cache() {
            self.memo.insert(key, ty);
        }
    }

    pub fn resolved_get(&self, key: &(NodePtr, u64)) -> Option<Vec<Target>> {
        if let Some(hit) = self.resolve_memo.get(key) {
            log::trace!("resolve memo hit for {:?}", key.0);
            return Some(hit.clone());
        }
        if !self.config.shared_cache {
            return None;
        }
        let hit = self
            .shared
            .and_then(|cache| cache.get(self.catalog.modification_stamp(), key));
        if hit.is_some() {
            log::trace!("shared cache hit for {:?}", key.0);
        }
        hit
    }

    pub fn resolved_put(&mut self, key: (NodePtr, u64), targets: Vec<Target>) {
        if !self.may_cache() {
            return;
        }
        if self.config.shared_cache {
            if let Some(cache) = self.shared {
                cache.insert(self.catalog.modification_stamp(), key, targets.clone());
            }
        }
        self.resolve_memo.insert(key, targets);
    }

    // ── Builtins ────────────────────────────────────────────────────────

    /// A prelude declaration by name (`Array`, `Null`, `Class`, ...).
    pub fn builtin(&mut self, name: &'static str) -> Option<DeclId> {
        if let Some(found) = self.builtins.get(name) {
            return *found;
        }
        let catalog = self.catalog;
        let found = catalog.find_by_qualified_name(name).filter(|id| {
            catalog
                .declaration(*id)
                .and_then(|d| catalog.file(d.file))
                .is_some_and(|f| f.is_prelude)
        });
        self.builtins.insert(name, found);
        found
    }

    /// Whether `decl` is the prelude declaration called `name`.
    pub fn is_builtin(&mut self, decl: DeclId, name: &'static str) -> bool {
        self.builtin(name) == Some(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ProjectIndex;
    use crate::model::FileId;
    use rowan::{TextRange, TextSize};

    fn ptr(n: u32) -> NodePtr {
        NodePtr {
            file: FileId(0),
            kind: hx_parser::SyntaxKind::NAME_REF,
            range: TextRange::new(TextSize::from(n), TextSize::from(n + 1)),
        }
    }

    #[test]
    fn guard_detects_cycles_and_unwinds() {
        let index = ProjectIndex::new();
        let config = AnalysisSection::default();
        let mut s = Session::new(&index, &config, CancellationToken::new(), None);
        let key = GuardKey::Resolve(ptr(0));
        let inner = s
            .guarded(key, "cycle", |s| s.guarded(key, "cycle", |_| Ok("inner")))
            .unwrap();
        assert_eq!(inner, "cycle");
        assert_eq!(s.cycles(), 1);
        assert_eq!(s.depth(), 0);
        assert!(!s.is_guarded(&key));
    }

    #[test]
    fn depth_limit_is_a_fault() {
        let index = ProjectIndex::new();
        let config = AnalysisSection {
            max_depth: 2,
            ..AnalysisSection::default()
        };
        let mut s = Session::new(&index, &config, CancellationToken::new(), None);
        assert!(s.enter(GuardKey::Resolve(ptr(0))).unwrap());
        assert!(s.enter(GuardKey::Resolve(ptr(1))).unwrap());
        assert_eq!(
            s.enter(GuardKey::Resolve(ptr(2))),
            Err(Fault::DepthExceeded(2))
        );
    }

    #[test]
    fn cancellation_stops_the_next_step() {
        let index = ProjectIndex::new();
        let config = AnalysisSection::default();
        let token = CancellationToken::new();
        let s = Session::new(&index, &config, token.clone(), None);
        assert!(s.step().is_ok());
        token.cancel();
        assert_eq!(s.step(), Err(Fault::Cancelled));
    }

    #[test]
    fn nothing_is_cached_while_indexing() {
        let index = ProjectIndex::new();
        let config = AnalysisSection::default();
        let shared = SharedCache::new();
        index.set_indexing(true);
        let mut s = Session::new(&index, &config, CancellationToken::new(), Some(&shared));
        assert!(!s.may_cache());
        s.memo_put((ptr(0), 0), TypeRef::int());
        s.resolved_put((ptr(0), 0), Vec::new());
        assert_eq!(s.memo_get(&(ptr(0), 0)), None);
        assert_eq!(s.resolved_get(&(ptr(0), 0)), None);
        assert!(shared.is_empty());

        index.set_indexing(false);
        assert!(s.may_cache());
        s.memo_put((ptr(0), 0), TypeRef::int());
        s.resolved_put((ptr(0), 0), Vec::new());
        assert_eq!(s.memo_get(&(ptr(0), 0)), Some(TypeRef::int()));
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn shared_cache_drops_entries_from_older_stamps() {
        let cache = SharedCache::new();
        cache.insert(1, (ptr(0), 0), Vec::new());
        assert!(cache.get(1, &(ptr(0), 0)).is_some());
        assert!(cache.get(2, &(ptr(0), 0)).is_none());
        cache.insert(2, (ptr(1), 0), Vec::new());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn uncached_results_stay_uncached() {
        let mut typed = Typed::new(TypeRef::int());
        typed.absorb(&Typed::uncached(TypeRef::Unknown));
        assert!(!typed.cacheable);
        assert!(typed.map(|_| TypeRef::bool()).ty == TypeRef::bool());
    }
}
