//! Name resolution and type evaluation for hx sources.
//!
//! Given a project of parsed files, this crate answers four questions: what
//! declaration a reference denotes, what static type an expression has,
//! whether one type may be assigned to another, and what common type two
//! types share.
//!
//! # Architecture
//!
//! - [`index`]: the [`ProjectIndex`] catalog. Parses files, collects their
//!   declarations into a flat model and serves [`DeclarationCatalog`]
//!   lookups. Ships a small prelude of builtin types.
//! - [`resolve`]: an ordered chain of resolution strategies, from generic
//!   parameters in scope to imported enum constructors.
//! - [`eval`]: the type evaluator, one handler per expression kind.
//! - [`generics`], [`unify`], [`compat`]: generic bindings, unification and
//!   assignability.
//! - [`session`]: per-query state. Memo tables, the recursion guard and
//!   cooperative cancellation all live in a [`session::Session`] that is
//!   passed through every recursive call.
//! - [`analyzer`]: the [`Analyzer`] façade tools call into.
//!
//! Nothing here fails on bad input. Unresolved names come back empty and
//! unknown types come back as [`TypeRef::Unknown`]; the only error a caller
//! sees is [`Cancelled`].

pub mod analyzer;
pub mod compat;
pub mod config;
pub mod error;
pub mod eval;
pub mod generics;
pub mod index;
pub mod model;
pub mod report;
pub mod resolve;
pub mod session;
pub mod ty;
pub mod unify;

pub use analyzer::Analyzer;
pub use config::{AnalysisConfig, AnalysisSection, ConfigError};
pub use error::Cancelled;
pub use generics::GenericResolver;
pub use index::ProjectIndex;
pub use model::{DeclarationCatalog, FileId, NodePtr};
pub use report::{FileReport, TargetView};
pub use resolve::{LocalKind, Target};
pub use session::CancellationToken;
pub use ty::TypeRef;
pub use unify::UnifyRule;
