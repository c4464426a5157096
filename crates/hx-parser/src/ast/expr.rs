//! Typed AST nodes for expressions.
//!
//! Statements are expressions too, so [`Expr`] covers `if`, `switch`,
//! loops, `var` declarations and `return`.

use crate::ast::item::{GenericParamList, Name, NameRef, ParamList, TypeTag};
use crate::ast::ty::TypeRef;
use crate::ast::{ast_node, child_node, child_nodes, child_token, has_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(Literal),
    NameRef(NameRef),
    This(ThisExpr),
    Super(SuperExpr),
    Paren(ParenExpr),
    Call(CallExpr),
    FieldAccess(FieldAccess),
    Index(IndexExpr),
    New(NewExpr),
    Binary(BinaryExpr),
    Prefix(PrefixExpr),
    Postfix(PostfixExpr),
    Ternary(TernaryExpr),
    CheckType(CheckTypeExpr),
    Cast(CastExpr),
    Untyped(UntypedExpr),
    Block(BlockExpr),
    If(IfExpr),
    Switch(SwitchExpr),
    While(WhileExpr),
    DoWhile(DoWhileExpr),
    For(ForExpr),
    Try(TryExpr),
    Return(ReturnExpr),
    Break(BreakExpr),
    Continue(ContinueExpr),
    Throw(ThrowExpr),
    VarDecl(VarDecl),
    Function(FunctionExpr),
    Lambda(LambdaExpr),
    ArrayLiteral(ArrayLiteral),
    MapLiteral(MapLiteral),
    Comprehension(ArrayComprehension),
    ObjectLiteral(ObjectLiteral),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let expr = match node.kind() {
            SyntaxKind::LITERAL => Expr::Literal(Literal { syntax: node }),
            SyntaxKind::NAME_REF => Expr::NameRef(NameRef { syntax: node }),
            SyntaxKind::THIS_EXPR => Expr::This(ThisExpr { syntax: node }),
            SyntaxKind::SUPER_EXPR => Expr::Super(SuperExpr { syntax: node }),
            SyntaxKind::PAREN_EXPR => Expr::Paren(ParenExpr { syntax: node }),
            SyntaxKind::CALL_EXPR => Expr::Call(CallExpr { syntax: node }),
            SyntaxKind::FIELD_ACCESS => Expr::FieldAccess(FieldAccess { syntax: node }),
            SyntaxKind::INDEX_EXPR => Expr::Index(IndexExpr { syntax: node }),
            SyntaxKind::NEW_EXPR => Expr::New(NewExpr { syntax: node }),
            SyntaxKind::BINARY_EXPR => Expr::Binary(BinaryExpr { syntax: node }),
            SyntaxKind::PREFIX_EXPR => Expr::Prefix(PrefixExpr { syntax: node }),
            SyntaxKind::POSTFIX_EXPR => Expr::Postfix(PostfixExpr { syntax: node }),
            SyntaxKind::TERNARY_EXPR => Expr::Ternary(TernaryExpr { syntax: node }),
            SyntaxKind::CHECK_TYPE_EXPR => Expr::CheckType(CheckTypeExpr { syntax: node }),
            SyntaxKind::CAST_EXPR => Expr::Cast(CastExpr { syntax: node }),
            SyntaxKind::UNTYPED_EXPR => Expr::Untyped(UntypedExpr { syntax: node }),
            SyntaxKind::BLOCK => Expr::Block(BlockExpr { syntax: node }),
            SyntaxKind::IF_EXPR => Expr::If(IfExpr { syntax: node }),
            SyntaxKind::SWITCH_EXPR => Expr::Switch(SwitchExpr { syntax: node }),
            SyntaxKind::WHILE_EXPR => Expr::While(WhileExpr { syntax: node }),
            SyntaxKind::DO_WHILE_EXPR => Expr::DoWhile(DoWhileExpr { syntax: node }),
            SyntaxKind::FOR_EXPR => Expr::For(ForExpr { syntax: node }),
            SyntaxKind::TRY_EXPR => Expr::Try(TryExpr { syntax: node }),
            SyntaxKind::RETURN_EXPR => Expr::Return(ReturnExpr { syntax: node }),
            SyntaxKind::BREAK_EXPR => Expr::Break(BreakExpr { syntax: node }),
            SyntaxKind::CONTINUE_EXPR => Expr::Continue(ContinueExpr { syntax: node }),
            SyntaxKind::THROW_EXPR => Expr::Throw(ThrowExpr { syntax: node }),
            SyntaxKind::VAR_DECL => Expr::VarDecl(VarDecl { syntax: node }),
            SyntaxKind::FUNCTION_EXPR => Expr::Function(FunctionExpr { syntax: node }),
            SyntaxKind::LAMBDA_EXPR => Expr::Lambda(LambdaExpr { syntax: node }),
            SyntaxKind::ARRAY_LITERAL => Expr::ArrayLiteral(ArrayLiteral { syntax: node }),
            SyntaxKind::MAP_LITERAL => Expr::MapLiteral(MapLiteral { syntax: node }),
            SyntaxKind::ARRAY_COMPREHENSION => {
                Expr::Comprehension(ArrayComprehension { syntax: node })
            }
            SyntaxKind::OBJECT_LITERAL => Expr::ObjectLiteral(ObjectLiteral { syntax: node }),
            _ => return None,
        };
        Some(expr)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(e) => &e.syntax,
            Expr::NameRef(e) => &e.syntax,
            Expr::This(e) => &e.syntax,
            Expr::Super(e) => &e.syntax,
            Expr::Paren(e) => &e.syntax,
            Expr::Call(e) => &e.syntax,
            Expr::FieldAccess(e) => &e.syntax,
            Expr::Index(e) => &e.syntax,
            Expr::New(e) => &e.syntax,
            Expr::Binary(e) => &e.syntax,
            Expr::Prefix(e) => &e.syntax,
            Expr::Postfix(e) => &e.syntax,
            Expr::Ternary(e) => &e.syntax,
            Expr::CheckType(e) => &e.syntax,
            Expr::Cast(e) => &e.syntax,
            Expr::Untyped(e) => &e.syntax,
            Expr::Block(e) => &e.syntax,
            Expr::If(e) => &e.syntax,
            Expr::Switch(e) => &e.syntax,
            Expr::While(e) => &e.syntax,
            Expr::DoWhile(e) => &e.syntax,
            Expr::For(e) => &e.syntax,
            Expr::Try(e) => &e.syntax,
            Expr::Return(e) => &e.syntax,
            Expr::Break(e) => &e.syntax,
            Expr::Continue(e) => &e.syntax,
            Expr::Throw(e) => &e.syntax,
            Expr::VarDecl(e) => &e.syntax,
            Expr::Function(e) => &e.syntax,
            Expr::Lambda(e) => &e.syntax,
            Expr::ArrayLiteral(e) => &e.syntax,
            Expr::MapLiteral(e) => &e.syntax,
            Expr::Comprehension(e) => &e.syntax,
            Expr::ObjectLiteral(e) => &e.syntax,
        }
    }
}

fn nth_expr(node: &SyntaxNode, n: usize) -> Option<Expr> {
    node.children().filter_map(Expr::cast).nth(n)
}

/// Significant tokens directly under `node` (not inside child nodes).
fn own_tokens(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| !t.kind().is_trivia())
}

// ── Literals and names ───────────────────────────────────────────────────

ast_node!(Literal, LITERAL);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Float,
    String,
    Bool,
    Null,
}

impl Literal {
    pub fn token(&self) -> Option<SyntaxToken> {
        own_tokens(&self.syntax).next()
    }

    pub fn kind(&self) -> Option<LiteralKind> {
        let kind = match self.token()?.kind() {
            SyntaxKind::INT_LITERAL => LiteralKind::Int,
            SyntaxKind::FLOAT_LITERAL => LiteralKind::Float,
            SyntaxKind::STRING_LITERAL => LiteralKind::String,
            SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => LiteralKind::Bool,
            SyntaxKind::NULL_KW => LiteralKind::Null,
            _ => return None,
        };
        Some(kind)
    }

    /// Source text of the literal, quotes included for strings.
    pub fn text(&self) -> String {
        self.token().map(|t| t.text().to_string()).unwrap_or_default()
    }
}

ast_node!(ThisExpr, THIS_EXPR);
ast_node!(SuperExpr, SUPER_EXPR);

ast_node!(ParenExpr, PAREN_EXPR);

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

// ── Calls, access, construction ──────────────────────────────────────────

ast_node!(ArgList, ARG_LIST);

impl ArgList {
    pub fn args(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(CallExpr, CALL_EXPR);

impl CallExpr {
    pub fn callee(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }

    pub fn args(&self) -> Vec<Expr> {
        self.arg_list()
            .map(|l| l.args().collect())
            .unwrap_or_default()
    }
}

ast_node!(FieldAccess, FIELD_ACCESS);

impl FieldAccess {
    pub fn receiver(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    /// The name after the dot. `None` while the user is still typing `a.`.
    pub fn field(&self) -> Option<NameRef> {
        let mut after_dot = false;
        for element in self.syntax.children_with_tokens() {
            match element {
                rowan::NodeOrToken::Token(t) if t.kind() == SyntaxKind::DOT => after_dot = true,
                rowan::NodeOrToken::Node(n) if after_dot => return NameRef::cast(n),
                _ => {}
            }
        }
        None
    }
}

ast_node!(IndexExpr, INDEX_EXPR);

impl IndexExpr {
    pub fn base(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn index(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }
}

ast_node!(NewExpr, NEW_EXPR);

impl NewExpr {
    pub fn ty(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }

    pub fn args(&self) -> Vec<Expr> {
        child_node::<ArgList>(&self.syntax)
            .map(|l| l.args().collect())
            .unwrap_or_default()
    }
}

// ── Operators ────────────────────────────────────────────────────────────

/// Binary operator of a [`BinaryExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    /// `+=` and friends.
    CompoundAssign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    /// `a...b`
    Interval,
    /// `a ?? b`
    NullCoalesce,
    /// `e is T`
    Is,
    /// Extractor pattern `f(_) => p`.
    Extractor,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Shl
                | BinaryOp::Shr
                | BinaryOp::UShr
        )
    }
}

ast_node!(BinaryExpr, BINARY_EXPR);

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn rhs(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }

    /// Right-hand type of `e is T`.
    pub fn rhs_type(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }

    pub fn op_token(&self) -> Option<SyntaxToken> {
        own_tokens(&self.syntax).next()
    }

    pub fn op(&self) -> Option<BinaryOp> {
        let mut tokens = own_tokens(&self.syntax);
        let first = tokens.next()?;
        let op = match first.kind() {
            SyntaxKind::EQ => BinaryOp::Assign,
            SyntaxKind::COMPOUND_ASSIGN => BinaryOp::CompoundAssign,
            SyntaxKind::PLUS => BinaryOp::Add,
            SyntaxKind::MINUS => BinaryOp::Sub,
            SyntaxKind::STAR => BinaryOp::Mul,
            SyntaxKind::SLASH => BinaryOp::Div,
            SyntaxKind::PERCENT => BinaryOp::Mod,
            SyntaxKind::EQ_EQ => BinaryOp::Eq,
            SyntaxKind::NOT_EQ => BinaryOp::NotEq,
            SyntaxKind::LT => BinaryOp::Lt,
            SyntaxKind::LT_EQ => BinaryOp::LtEq,
            SyntaxKind::GT_EQ => BinaryOp::GtEq,
            SyntaxKind::GT => match tokens.filter(|t| t.kind() == SyntaxKind::GT).count() {
                0 => BinaryOp::Gt,
                1 => BinaryOp::Shr,
                _ => BinaryOp::UShr,
            },
            SyntaxKind::AMP_AMP => BinaryOp::And,
            SyntaxKind::PIPE_PIPE => BinaryOp::Or,
            SyntaxKind::AMP => BinaryOp::BitAnd,
            SyntaxKind::PIPE => BinaryOp::BitOr,
            SyntaxKind::CARET => BinaryOp::BitXor,
            SyntaxKind::SHL => BinaryOp::Shl,
            SyntaxKind::ELLIPSIS => BinaryOp::Interval,
            SyntaxKind::QUESTION_QUESTION => BinaryOp::NullCoalesce,
            SyntaxKind::FAT_ARROW => BinaryOp::Extractor,
            SyntaxKind::IDENT if first.text() == "is" => BinaryOp::Is,
            _ => return None,
        };
        Some(op)
    }
}

ast_node!(PrefixExpr, PREFIX_EXPR);

impl PrefixExpr {
    pub fn op_kind(&self) -> Option<SyntaxKind> {
        own_tokens(&self.syntax).next().map(|t| t.kind())
    }

    pub fn operand(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(PostfixExpr, POSTFIX_EXPR);

impl PostfixExpr {
    pub fn op_kind(&self) -> Option<SyntaxKind> {
        own_tokens(&self.syntax).next().map(|t| t.kind())
    }

    pub fn operand(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(TernaryExpr, TERNARY_EXPR);

impl TernaryExpr {
    pub fn condition(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn then_branch(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }

    pub fn else_branch(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 2)
    }
}

ast_node!(CheckTypeExpr, CHECK_TYPE_EXPR);

impl CheckTypeExpr {
    pub fn expr(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn ty(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }
}

ast_node!(CastExpr, CAST_EXPR);

impl CastExpr {
    pub fn expr(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    /// Target of a checked `cast(e, T)`; `None` for unchecked casts.
    pub fn ty(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }
}

ast_node!(UntypedExpr, UNTYPED_EXPR);

impl UntypedExpr {
    pub fn expr(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

// ── Blocks and control flow ──────────────────────────────────────────────

ast_node!(BlockExpr, BLOCK);

impl BlockExpr {
    pub fn statements(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }

    /// The last statement, whose value is the value of the block.
    pub fn tail(&self) -> Option<Expr> {
        self.statements().last()
    }
}

ast_node!(IfExpr, IF_EXPR);

impl IfExpr {
    pub fn condition(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn then_branch(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }

    pub fn else_branch(&self) -> Option<Expr> {
        self.syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::ELSE_BRANCH)
            .and_then(|e| nth_expr(&e, 0))
    }
}

ast_node!(SwitchExpr, SWITCH_EXPR);

impl SwitchExpr {
    /// The switched-on value, with redundant parentheses removed.
    pub fn subject(&self) -> Option<Expr> {
        let mut expr = nth_expr(&self.syntax, 0)?;
        while let Expr::Paren(p) = &expr {
            expr = p.inner()?;
        }
        Some(expr)
    }

    pub fn cases(&self) -> impl Iterator<Item = SwitchCase> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn has_default(&self) -> bool {
        self.cases().any(|c| c.is_default())
    }
}

ast_node!(SwitchCase, SWITCH_CASE);

impl SwitchCase {
    pub fn is_default(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::DEFAULT_KW)
    }

    /// The comma-separated patterns of a `case`.
    pub fn patterns(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }

    pub fn guard(&self) -> Option<Expr> {
        self.syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::GUARD)
            .and_then(|g| nth_expr(&g, 0))
    }

    pub fn body(&self) -> Option<CaseBody> {
        child_node(&self.syntax)
    }
}

ast_node!(CaseBody, CASE_BODY);

impl CaseBody {
    pub fn statements(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(WhileExpr, WHILE_EXPR);

impl WhileExpr {
    pub fn condition(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn body(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }
}

ast_node!(DoWhileExpr, DO_WHILE_EXPR);

impl DoWhileExpr {
    pub fn body(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn condition(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }
}

ast_node!(ForExpr, FOR_EXPR);

impl ForExpr {
    pub fn head(&self) -> Option<ForHead> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(ForHead, FOR_HEAD);

impl ForHead {
    /// `k` in `for (k => v in m)`.
    pub fn key(&self) -> Option<Name> {
        if has_token(&self.syntax, SyntaxKind::FAT_ARROW) {
            child_node(&self.syntax)
        } else {
            None
        }
    }

    /// The loop variable (`v` in both `for (v in xs)` and `for (k => v in m)`).
    pub fn value(&self) -> Option<Name> {
        let names: Vec<Name> = child_nodes(&self.syntax).collect();
        names.into_iter().last()
    }

    pub fn iterable(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(TryExpr, TRY_EXPR);

impl TryExpr {
    pub fn body(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn catches(&self) -> impl Iterator<Item = CatchClause> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(CatchClause, CATCH_CLAUSE);

impl CatchClause {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(ReturnExpr, RETURN_EXPR);

impl ReturnExpr {
    pub fn value(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(BreakExpr, BREAK_EXPR);
ast_node!(ContinueExpr, CONTINUE_EXPR);

ast_node!(ThrowExpr, THROW_EXPR);

impl ThrowExpr {
    pub fn value(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

// ── Declarations ─────────────────────────────────────────────────────────

ast_node!(VarDecl, VAR_DECL);

impl VarDecl {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        child_node(&self.syntax)
    }

    pub fn initializer(&self) -> Option<Expr> {
        self.syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::INITIALIZER)
            .and_then(|i| nth_expr(&i, 0))
    }

    pub fn is_final(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::FINAL_KW)
    }
}

ast_node!(FunctionExpr, FUNCTION_EXPR);

impl FunctionExpr {
    /// Present for local named functions.
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn generic_param_list(&self) -> Option<GenericParamList> {
        child_node(&self.syntax)
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn return_tag(&self) -> Option<TypeTag> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(LambdaExpr, LAMBDA_EXPR);

impl LambdaExpr {
    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

/// Anything with parameters and a body: methods, function literals and
/// arrow lambdas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnyFunction {
    Method(crate::ast::item::MethodDef),
    Function(FunctionExpr),
    Lambda(LambdaExpr),
}

impl AnyFunction {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::METHOD_DEF => crate::ast::item::MethodDef::cast(node).map(Self::Method),
            SyntaxKind::FUNCTION_EXPR => FunctionExpr::cast(node).map(Self::Function),
            SyntaxKind::LAMBDA_EXPR => LambdaExpr::cast(node).map(Self::Lambda),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            AnyFunction::Method(m) => m.syntax(),
            AnyFunction::Function(f) => f.syntax(),
            AnyFunction::Lambda(l) => l.syntax(),
        }
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(self.syntax())
    }

    /// Declared return type; lambdas never have one.
    pub fn return_tag(&self) -> Option<TypeTag> {
        match self {
            AnyFunction::Lambda(_) => None,
            _ => child_node(self.syntax()),
        }
    }

    pub fn body(&self) -> Option<Expr> {
        nth_expr(self.syntax(), 0)
    }
}

// ── Collection and object literals ───────────────────────────────────────

ast_node!(ArrayLiteral, ARRAY_LITERAL);

impl ArrayLiteral {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(MapLiteral, MAP_LITERAL);

impl MapLiteral {
    pub fn entries(&self) -> impl Iterator<Item = MapEntry> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(MapEntry, MAP_ENTRY);

impl MapEntry {
    pub fn key(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn value(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }
}

ast_node!(ArrayComprehension, ARRAY_COMPREHENSION);

impl ArrayComprehension {
    /// The `for` or `while` loop producing the elements.
    pub fn generator(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    /// The innermost loop body: the produced element.
    pub fn element(&self) -> Option<Expr> {
        let mut current = self.generator()?;
        loop {
            let next = match &current {
                Expr::For(f) => f.body(),
                Expr::While(w) => w.body(),
                Expr::If(i) => i.then_branch(),
                Expr::Block(b) => b.tail(),
                _ => return Some(current),
            };
            current = next?;
        }
    }
}

ast_node!(ObjectLiteral, OBJECT_LITERAL);

impl ObjectLiteral {
    pub fn fields(&self) -> impl Iterator<Item = ObjectField> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(ObjectField, OBJECT_FIELD);

impl ObjectField {
    /// Field name; quoted names are unquoted.
    pub fn name_text(&self) -> String {
        if let Some(name) = child_node::<Name>(&self.syntax) {
            return name.text();
        }
        child_token(&self.syntax, SyntaxKind::STRING_LITERAL)
            .map(|t| {
                let text = t.text();
                text.get(1..text.len().saturating_sub(1))
                    .unwrap_or_default()
                    .to_string()
            })
            .unwrap_or_default()
    }

    pub fn value(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}
