//! Type values produced by the evaluator.
//!
//! A [`TypeRef`] is an immutable value: every transformation returns a new
//! one. There is no "null type"; absence of information is
//! [`TypeRef::Unknown`], which every operation accepts and propagates.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::model::DeclId;

/// Compile-time value attached to a literal type.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
    /// Every element of an array literal, when all of them are constant.
    Array(Vec<Constant>),
}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Constant::Int(i) => i.hash(state),
            // `0.0 == -0.0`, so both hash alike.
            Constant::Float(f) => (if *f == 0.0 { 0 } else { f.to_bits() }).hash(state),
            Constant::Bool(b) => b.hash(state),
            Constant::Str(s) => s.hash(state),
            Constant::Null => {}
            Constant::Array(items) => items.hash(state),
        }
    }
}

impl Constant {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Int(i) => Some(*i as f64),
            Constant::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Float(x) => write!(f, "{x:?}"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Null => write!(f, "null"),
            Constant::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    Bool,
    String,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "Int",
            Primitive::Float => "Float",
            Primitive::Bool => "Bool",
            Primitive::String => "String",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Int" => Some(Primitive::Int),
            "Float" => Some(Primitive::Float),
            "Bool" => Some(Primitive::Bool),
            "String" => Some(Primitive::String),
            _ => None,
        }
    }
}

/// A use of a declared type: the declaration plus its generic arguments.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct ClassType {
    pub decl: DeclId,
    /// Rendered name. Typedef aliases keep the alias name here while `decl`
    /// points at the structure they expand to.
    pub name: String,
    pub args: Vec<TypeRef>,
    pub constant: Option<Constant>,
    /// Inclusive index range, recorded for constant arrays.
    pub range: Option<(i64, i64)>,
}

impl ClassType {
    pub fn new(decl: DeclId, name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            decl,
            name: name.into(),
            args,
            constant: None,
            range: None,
        }
    }

    /// Same declaration and structurally equal arguments.
    pub fn same_type(&self, other: &ClassType) -> bool {
        self.decl == other.decl
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.same_type(b))
    }

    pub fn without_constant(&self) -> ClassType {
        ClassType {
            decl: self.decl,
            name: self.name.clone(),
            args: self.args.iter().map(TypeRef::without_constant).collect(),
            constant: None,
            range: None,
        }
    }
}

/// One argument of a function type.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct FnArg {
    pub name: Option<String>,
    pub optional: bool,
    pub rest: bool,
    pub ty: TypeRef,
}

impl FnArg {
    pub fn positional(ty: TypeRef) -> Self {
        Self {
            name: None,
            optional: false,
            rest: false,
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Hash)]
pub struct FunctionType {
    pub args: Vec<FnArg>,
    pub ret: Box<TypeRef>,
}

impl FunctionType {
    /// Number of arguments a call must supply.
    pub fn required_arity(&self) -> usize {
        self.args.iter().filter(|a| !a.optional && !a.rest).count()
    }
}

/// The type of a value.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum TypeRef {
    /// Nothing is known. Never an error; simply propagates.
    Unknown,
    /// Result of combining incompatible function signatures.
    Invalid,
    /// Dynamic, optionally carrying a constant (`null` is `Dynamic(Null)`).
    Dynamic(Option<Constant>),
    Void,
    Primitive(Primitive, Option<Constant>),
    Class(ClassType),
    Function(FunctionType),
    /// A constructor of an enum used as a value.
    EnumValue {
        enum_type: ClassType,
        ctor: String,
        args: Vec<TypeRef>,
    },
    /// A generic parameter that no resolver has bound yet.
    TypeParameter {
        name: String,
        constraint: Option<Box<TypeRef>>,
    },
}

impl TypeRef {
    pub fn int() -> Self {
        TypeRef::Primitive(Primitive::Int, None)
    }

    pub fn float() -> Self {
        TypeRef::Primitive(Primitive::Float, None)
    }

    pub fn bool() -> Self {
        TypeRef::Primitive(Primitive::Bool, None)
    }

    pub fn string() -> Self {
        TypeRef::Primitive(Primitive::String, None)
    }

    pub fn dynamic() -> Self {
        TypeRef::Dynamic(None)
    }

    pub fn null() -> Self {
        TypeRef::Dynamic(Some(Constant::Null))
    }

    pub fn function(args: Vec<FnArg>, ret: TypeRef) -> Self {
        TypeRef::Function(FunctionType {
            args,
            ret: Box::new(ret),
        })
    }

    pub fn param(name: impl Into<String>) -> Self {
        TypeRef::TypeParameter {
            name: name.into(),
            constraint: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeRef::Unknown)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, TypeRef::Invalid)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, TypeRef::Dynamic(_))
    }

    /// `Dynamic` that came from a `null` literal.
    pub fn is_null_constant(&self) -> bool {
        matches!(self, TypeRef::Dynamic(Some(Constant::Null)))
    }

    pub fn constant(&self) -> Option<&Constant> {
        match self {
            TypeRef::Dynamic(c) | TypeRef::Primitive(_, c) => c.as_ref(),
            TypeRef::Class(ct) => ct.constant.as_ref(),
            _ => None,
        }
    }

    pub fn with_constant(&self, constant: Constant) -> TypeRef {
        match self {
            TypeRef::Dynamic(_) => TypeRef::Dynamic(Some(constant)),
            TypeRef::Primitive(p, _) => TypeRef::Primitive(*p, Some(constant)),
            TypeRef::Class(ct) => TypeRef::Class(ClassType {
                constant: Some(constant),
                ..ct.clone()
            }),
            other => other.clone(),
        }
    }

    /// The same type with every constant and range removed.
    pub fn without_constant(&self) -> TypeRef {
        match self {
            TypeRef::Dynamic(_) => TypeRef::Dynamic(None),
            TypeRef::Primitive(p, _) => TypeRef::Primitive(*p, None),
            TypeRef::Class(ct) => TypeRef::Class(ct.without_constant()),
            TypeRef::Function(f) => TypeRef::Function(FunctionType {
                args: f
                    .args
                    .iter()
                    .map(|a| FnArg {
                        ty: a.ty.without_constant(),
                        ..a.clone()
                    })
                    .collect(),
                ret: Box::new(f.ret.without_constant()),
            }),
            other => other.clone(),
        }
    }

    /// Structural equality ignoring constants, ranges and display names.
    pub fn same_type(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (TypeRef::Unknown, TypeRef::Unknown)
            | (TypeRef::Invalid, TypeRef::Invalid)
            | (TypeRef::Void, TypeRef::Void)
            | (TypeRef::Dynamic(_), TypeRef::Dynamic(_)) => true,
            (TypeRef::Primitive(a, _), TypeRef::Primitive(b, _)) => a == b,
            (TypeRef::Class(a), TypeRef::Class(b)) => a.same_type(b),
            (TypeRef::Function(a), TypeRef::Function(b)) => {
                a.args.len() == b.args.len()
                    && a.args.iter().zip(&b.args).all(|(x, y)| {
                        x.optional == y.optional && x.rest == y.rest && x.ty.same_type(&y.ty)
                    })
                    && a.ret.same_type(&b.ret)
            }
            (
                TypeRef::EnumValue {
                    enum_type: a,
                    ctor: ca,
                    ..
                },
                TypeRef::EnumValue {
                    enum_type: b,
                    ctor: cb,
                    ..
                },
            ) => ca == cb && a.same_type(b),
            (TypeRef::TypeParameter { name: a, .. }, TypeRef::TypeParameter { name: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            TypeRef::Class(ct) => Some(ct),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            TypeRef::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Enum values are treated as their enum's class type.
    pub fn enum_class(&self) -> Option<&ClassType> {
        match self {
            TypeRef::EnumValue { enum_type, .. } => Some(enum_type),
            _ => None,
        }
    }

    /// Whether an unbound generic parameter occurs anywhere in the type.
    pub fn has_type_parameters(&self) -> bool {
        match self {
            TypeRef::TypeParameter { .. } => true,
            TypeRef::Class(ct) => ct.args.iter().any(TypeRef::has_type_parameters),
            TypeRef::Function(f) => {
                f.args.iter().any(|a| a.ty.has_type_parameters()) || f.ret.has_type_parameters()
            }
            TypeRef::EnumValue { enum_type, .. } => {
                enum_type.args.iter().any(TypeRef::has_type_parameters)
            }
            _ => false,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeRef]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() && !self.name.starts_with('{') {
            write!(f, "<")?;
            write_list(f, &self.args)?;
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Unknown => write!(f, "Unknown"),
            TypeRef::Invalid => write!(f, "Invalid"),
            TypeRef::Dynamic(_) => write!(f, "Dynamic"),
            TypeRef::Void => write!(f, "Void"),
            TypeRef::Primitive(p, _) => write!(f, "{}", p.name()),
            TypeRef::Class(ct) => write!(f, "{ct}"),
            TypeRef::Function(func) => {
                write!(f, "(")?;
                for (i, arg) in func.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if arg.optional {
                        write!(f, "?")?;
                    }
                    if arg.rest {
                        write!(f, "...")?;
                    }
                    write!(f, "{}", arg.ty)?;
                }
                write!(f, ") -> {}", func.ret)
            }
            TypeRef::EnumValue { enum_type, .. } => write!(f, "{enum_type}"),
            TypeRef::TypeParameter { name, .. } => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_of(arg: TypeRef) -> TypeRef {
        TypeRef::Class(ClassType::new(DeclId(7), "Array", vec![arg]))
    }

    #[test]
    fn renders_source_syntax() {
        assert_eq!(array_of(TypeRef::int()).to_string(), "Array<Int>");
        let f = TypeRef::function(
            vec![
                FnArg::positional(TypeRef::int()),
                FnArg {
                    name: Some("s".into()),
                    optional: true,
                    rest: false,
                    ty: TypeRef::string(),
                },
            ],
            TypeRef::Void,
        );
        assert_eq!(f.to_string(), "(Int, ?String) -> Void");
        assert_eq!(TypeRef::function(vec![], TypeRef::int()).to_string(), "() -> Int");
        assert_eq!(TypeRef::null().to_string(), "Dynamic");
        assert_eq!(TypeRef::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn structure_names_are_not_followed_by_arguments() {
        let anon = ClassType::new(DeclId(3), "{ x : T }", vec![TypeRef::int()]);
        assert_eq!(anon.to_string(), "{ x : T }");
    }

    #[test]
    fn same_type_ignores_constants() {
        let one = TypeRef::Primitive(Primitive::Int, Some(Constant::Int(1)));
        let two = TypeRef::Primitive(Primitive::Int, Some(Constant::Int(2)));
        assert!(one.same_type(&two));
        assert_ne!(one, two);
        assert_eq!(one.without_constant(), TypeRef::int());
        assert!(!one.same_type(&TypeRef::float()));
    }

    #[test]
    fn same_type_compares_arguments() {
        assert!(array_of(TypeRef::int()).same_type(&array_of(TypeRef::int())));
        assert!(!array_of(TypeRef::int()).same_type(&array_of(TypeRef::string())));
    }

    #[test]
    fn type_parameters_are_detected() {
        assert!(array_of(TypeRef::param("T")).has_type_parameters());
        assert!(!array_of(TypeRef::int()).has_type_parameters());
    }
}
