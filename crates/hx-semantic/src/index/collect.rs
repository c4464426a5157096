//! Turns a parsed file into declarations and members.

use hx_parser::ast::expr::{Expr, ObjectLiteral};
use hx_parser::ast::item::{
    GenericParamList, Member as AstMember, Metadata, ParamList, SourceFile, TypeDef,
};
use hx_parser::ast::ty::{AnonType, TypeRef as AstType};
use hx_parser::ast::{child_node, has_token, AstNode};
use hx_parser::{SyntaxKind, SyntaxNode};

use crate::model::{
    DeclId, DeclShape, Declaration, FileId, GenericOwner, GenericParam, Member, MemberId,
    MemberKind, Meta, Modifiers, NodePtr, Param, TypeTag,
};

/// Declarations and members found in one file.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub decls: Vec<Declaration>,
    pub members: Vec<Member>,
    /// Ids of the top-level declarations, in source order.
    pub top_level: Vec<DeclId>,
}

pub(crate) struct Collector {
    file: FileId,
    package: String,
    module: String,
    next_decl: u32,
    next_member: u32,
    out: Collected,
}

impl Collector {
    pub(crate) fn new(
        file: FileId,
        package: String,
        module: String,
        first_decl: u32,
        first_member: u32,
    ) -> Self {
        Self {
            file,
            package,
            module,
            next_decl: first_decl,
            next_member: first_member,
            out: Collected::default(),
        }
    }

    pub(crate) fn collect(mut self, file: &SourceFile) -> Collected {
        for def in file.type_defs() {
            let id = self.type_def(&def);
            self.out.top_level.push(id);
        }
        // Structure types and object literals anywhere in the file.
        for node in file.syntax().descendants() {
            match node.kind() {
                SyntaxKind::ANON_TYPE => {
                    if let Some(anon) = AnonType::cast(node) {
                        self.anon_type(&anon);
                    }
                }
                SyntaxKind::OBJECT_LITERAL => {
                    if let Some(lit) = ObjectLiteral::cast(node) {
                        self.object_literal(&lit);
                    }
                }
                _ => {}
            }
        }
        self.out
    }

    fn ptr(&self, node: &SyntaxNode) -> NodePtr {
        NodePtr::new(self.file, node)
    }

    fn tag(&self, ty: Option<AstType>) -> Option<TypeTag> {
        ty.map(|ty| TypeTag {
            ptr: self.ptr(ty.syntax()),
            text: collapse_whitespace(&ty.syntax().text().to_string()),
        })
    }

    fn alloc_decl(&mut self) -> DeclId {
        let id = DeclId(self.next_decl);
        self.next_decl += 1;
        id
    }

    fn alloc_member(&mut self) -> MemberId {
        let id = MemberId(self.next_member);
        self.next_member += 1;
        id
    }

    fn generics(&self, list: Option<GenericParamList>, owner: GenericOwner) -> Vec<GenericParam> {
        let Some(list) = list else {
            return Vec::new();
        };
        list.params()
            .enumerate()
            .map(|(index, param)| GenericParam {
                name: param.name().map(|n| n.text()).unwrap_or_default(),
                index,
                constraints: param.constraints().filter_map(|c| self.tag(Some(c))).collect(),
                owner,
                ptr: self.ptr(param.syntax()),
            })
            .collect()
    }

    fn params(&self, list: Option<ParamList>) -> Vec<Param> {
        let Some(list) = list else {
            return Vec::new();
        };
        list.params()
            .map(|param| Param {
                name: param.name().map(|n| n.text()).unwrap_or_default(),
                type_tag: self.tag(param.type_tag().and_then(|t| t.ty())),
                optional: param.is_optional(),
                rest: param.is_rest(),
                default: param.default_value().map(|e| self.ptr(e.syntax())),
                ptr: self.ptr(param.syntax()),
            })
            .collect()
    }

    // ── Top-level declarations ───────────────────────────────────────────

    fn type_def(&mut self, def: &TypeDef) -> DeclId {
        let id = self.alloc_decl();
        let node = def.syntax();
        let generics = self.generics(def.generic_param_list(), GenericOwner::Decl(id));
        let (shape, ast_members) = match def {
            TypeDef::Class(class) => (
                DeclShape::Class {
                    extends: self.tag(class.extends()),
                    implements: class.implements().filter_map(|t| self.tag(Some(t))).collect(),
                },
                class.members().collect::<Vec<_>>(),
            ),
            TypeDef::Interface(iface) => (
                DeclShape::Interface {
                    extends: iface.extends().filter_map(|t| self.tag(Some(t))).collect(),
                },
                iface.members().collect(),
            ),
            TypeDef::Enum(_) => (DeclShape::Enum, Vec::new()),
            TypeDef::Abstract(abs) => (
                DeclShape::Abstract {
                    underlying: self.tag(abs.underlying()),
                    from: abs.from_types().filter_map(|t| self.tag(Some(t))).collect(),
                    to: abs.to_types().filter_map(|t| self.tag(Some(t))).collect(),
                    is_enum_abstract: abs.is_enum_abstract(),
                },
                abs.members().collect(),
            ),
            TypeDef::Typedef(td) => (
                DeclShape::Typedef {
                    target: self.tag(td.target()),
                },
                Vec::new(),
            ),
        };
        let implicit_static = matches!(
            shape,
            DeclShape::Abstract {
                is_enum_abstract: true,
                ..
            }
        );

        let mut members = Vec::new();
        if let TypeDef::Enum(en) = def {
            for ctor in en.ctors() {
                let member_id = self.alloc_member();
                let member = Member {
                    id: member_id,
                    owner: id,
                    name: ctor.name().map(|n| n.text()).unwrap_or_default(),
                    kind: MemberKind::EnumCtor,
                    ptr: self.ptr(ctor.syntax()),
                    name_ptr: ctor.name().map(|n| self.ptr(n.syntax())),
                    type_tag: None,
                    params: self.params(ctor.param_list()),
                    generics: self.generics(
                        ctor.generic_param_list(),
                        GenericOwner::Member(member_id),
                    ),
                    modifiers: Modifiers {
                        is_static: true,
                        is_public: true,
                        ..Modifiers::default()
                    },
                    accessors: None,
                    meta: metadata(ctor.metadata()),
                    body: None,
                    optional: false,
                };
                members.push(member_id);
                self.out.members.push(member);
            }
        }
        for ast_member in &ast_members {
            let member_id = self.member(id, ast_member, implicit_static);
            members.push(member_id);
        }

        let decl = Declaration {
            id,
            name: def.name().map(|n| n.text()).unwrap_or_default(),
            package: self.package.clone(),
            module: self.module.clone(),
            file: self.file,
            ptr: self.ptr(node),
            name_ptr: def.name().map(|n| self.ptr(n.syntax())),
            generics,
            members,
            modifiers: Modifiers {
                is_public: !def.is_private(),
                is_private: def.is_private(),
                is_extern: def.is_extern(),
                is_final: has_token(node, SyntaxKind::FINAL_KW),
                ..Modifiers::default()
            },
            meta: metadata(def.metadata()),
            shape,
        };
        self.out.decls.push(decl);
        id
    }

    fn member(&mut self, owner: DeclId, member: &AstMember, implicit_static: bool) -> MemberId {
        let id = self.alloc_member();
        let node = member.syntax();
        let meta = metadata(member.metadata());
        let modifiers = Modifiers {
            is_static: member.is_static() || (implicit_static && matches!(member, AstMember::Field(_))),
            is_public: member.is_public(),
            is_private: member.is_private(),
            is_inline: member.is_inline(),
            is_extern: has_token(node, SyntaxKind::EXTERN_KW),
            is_final: member.is_final(),
            is_override: member.is_override(),
            is_dynamic: has_token(node, SyntaxKind::DYNAMIC_KW),
            is_macro: has_token(node, SyntaxKind::MACRO_KW),
        };
        let optional = meta.iter().any(|m| m.name == "optional");
        let built = match member {
            AstMember::Field(field) => Member {
                id,
                owner,
                name: field.name().map(|n| n.text()).unwrap_or_default(),
                kind: MemberKind::Field,
                ptr: self.ptr(node),
                name_ptr: field.name().map(|n| self.ptr(n.syntax())),
                type_tag: self.tag(field.type_tag().and_then(|t| t.ty())),
                params: Vec::new(),
                generics: Vec::new(),
                modifiers,
                accessors: field.accessors(),
                meta,
                body: field.initializer().map(|e| self.ptr(e.syntax())),
                optional,
            },
            AstMember::Method(method) => Member {
                id,
                owner,
                name: method.name().map(|n| n.text()).unwrap_or_default(),
                kind: MemberKind::Method,
                ptr: self.ptr(node),
                name_ptr: method.name().map(|n| self.ptr(n.syntax())),
                type_tag: self.tag(method.return_tag().and_then(|t| t.ty())),
                params: self.params(method.param_list()),
                generics: self.generics(method.generic_param_list(), GenericOwner::Member(id)),
                modifiers,
                accessors: None,
                meta,
                body: method.body().map(|e| self.ptr(e.syntax())),
                optional,
            },
        };
        self.out.members.push(built);
        id
    }

    // ── Structure types ──────────────────────────────────────────────────

    fn anon_type(&mut self, anon: &AnonType) {
        let id = self.alloc_decl();
        // Structures written as a typedef's target see its generic parameters.
        let typedef_generics = anon
            .syntax()
            .ancestors()
            .find(|n| n.kind() == SyntaxKind::TYPEDEF_DEF)
            .and_then(|td| child_node::<GenericParamList>(&td));
        let generics = self.generics(typedef_generics, GenericOwner::Decl(id));

        let mut members = Vec::new();
        let mut rendered = Vec::new();
        for ext in anon.extensions() {
            rendered.push(format!("> {}", collapse_whitespace(&ext.syntax().text().to_string())));
        }
        for field in anon.fields() {
            let member_id = self.alloc_member();
            let name = field.name().map(|n| n.text()).unwrap_or_default();
            let type_tag = self.tag(field.type_tag().and_then(|t| t.ty()));
            rendered.push(format!(
                "{}{} : {}",
                if field.is_optional() { "?" } else { "" },
                name,
                type_tag.as_ref().map_or("Unknown", |t| t.text.as_str())
            ));
            let member = Member {
                id: member_id,
                owner: id,
                name,
                kind: MemberKind::Field,
                ptr: self.ptr(field.syntax()),
                name_ptr: field.name().map(|n| self.ptr(n.syntax())),
                type_tag,
                params: Vec::new(),
                generics: Vec::new(),
                modifiers: Modifiers {
                    is_public: true,
                    ..Modifiers::default()
                },
                accessors: None,
                meta: Vec::new(),
                body: None,
                optional: field.is_optional(),
            };
            members.push(member_id);
            self.out.members.push(member);
        }
        for ast_member in anon.members() {
            let member_id = self.member(id, &ast_member, false);
            if let Some(m) = self.out.members.last() {
                rendered.push(render_member(m));
            }
            members.push(member_id);
        }

        let name = if rendered.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", rendered.join(", "))
        };
        let decl = Declaration {
            id,
            name,
            package: self.package.clone(),
            module: self.module.clone(),
            file: self.file,
            ptr: self.ptr(anon.syntax()),
            name_ptr: None,
            generics,
            members,
            modifiers: Modifiers::default(),
            meta: Vec::new(),
            shape: DeclShape::Anonymous {
                extensions: anon.extensions().filter_map(|t| self.tag(Some(t))).collect(),
            },
        };
        self.out.decls.push(decl);
    }

    fn object_literal(&mut self, lit: &ObjectLiteral) {
        let id = self.alloc_decl();
        let mut members = Vec::new();
        let mut names = Vec::new();
        for field in lit.fields() {
            let member_id = self.alloc_member();
            let name = field.name_text();
            names.push(name.clone());
            let name_ptr = field
                .syntax()
                .children()
                .find(|c| c.kind() == SyntaxKind::NAME)
                .map(|n| self.ptr(&n));
            let member = Member {
                id: member_id,
                owner: id,
                name,
                kind: MemberKind::Field,
                ptr: self.ptr(field.syntax()),
                name_ptr,
                type_tag: None,
                params: Vec::new(),
                generics: Vec::new(),
                modifiers: Modifiers {
                    is_public: true,
                    ..Modifiers::default()
                },
                accessors: None,
                meta: Vec::new(),
                body: field.value().map(|e: Expr| self.ptr(e.syntax())),
                optional: false,
            };
            members.push(member_id);
            self.out.members.push(member);
        }
        let decl = Declaration {
            id,
            name: format!("{{ {} }}", names.join(", ")),
            package: self.package.clone(),
            module: self.module.clone(),
            file: self.file,
            ptr: self.ptr(lit.syntax()),
            name_ptr: None,
            generics: Vec::new(),
            members,
            modifiers: Modifiers::default(),
            meta: Vec::new(),
            shape: DeclShape::ObjectLiteral,
        };
        self.out.decls.push(decl);
    }
}

fn metadata(items: impl Iterator<Item = Metadata>) -> Vec<Meta> {
    items
        .map(|m| Meta {
            name: m.name(),
            args: m
                .args()
                .map(|a| collapse_whitespace(&a.syntax().text().to_string()))
                .collect(),
        })
        .collect()
}

fn render_member(member: &Member) -> String {
    let ty = member.type_tag.as_ref().map_or("Unknown", |t| t.text.as_str());
    if member.is_method() {
        let params: Vec<&str> = member
            .params
            .iter()
            .map(|p| p.type_tag.as_ref().map_or("Unknown", |t| t.text.as_str()))
            .collect();
        format!("{} : ({}) -> {}", member.name, params.join(", "), ty)
    } else {
        format!("{} : {}", member.name, ty)
    }
}

/// Replace every run of whitespace with one space.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(src: &str) -> Collected {
        let parse = hx_parser::parse(src);
        assert!(parse.ok(), "{:?}", parse.errors());
        Collector::new(FileId(0), "app".into(), "Main".into(), 0, 0).collect(&parse.tree())
    }

    fn member<'a>(c: &'a Collected, name: &str) -> &'a Member {
        c.members.iter().find(|m| m.name == name).unwrap()
    }

    #[test]
    fn class_members_and_generics() {
        let c = collect(
            "class Box<T> extends Base implements IBox<T> {
                public var value:T;
                static inline function make<U>(v:U, ?tag:String):Box<U> return null;
            }",
        );
        assert_eq!(c.top_level.len(), 1);
        let decl = &c.decls[0];
        assert_eq!(decl.name, "Box");
        assert_eq!(decl.generics[0].name, "T");
        assert_eq!(decl.members.len(), 2);
        match &decl.shape {
            DeclShape::Class { extends, implements } => {
                assert_eq!(extends.as_ref().unwrap().text, "Base");
                assert_eq!(implements[0].text, "IBox<T>");
            }
            other => panic!("unexpected shape {other:?}"),
        }
        let make = member(&c, "make");
        assert!(make.is_static() && make.modifiers.is_inline);
        assert_eq!(make.generics[0].name, "U");
        assert_eq!(make.params.len(), 2);
        assert!(make.params[1].optional);
        assert_eq!(make.type_tag.as_ref().unwrap().text, "Box<U>");
        assert!(make.body.is_some());
        assert!(member(&c, "value").modifiers.is_public);
    }

    #[test]
    fn enum_constructors_are_static_members() {
        let c = collect("enum Shape { Circle(r:Float); Empty; }");
        let circle = member(&c, "Circle");
        assert_eq!(circle.kind, MemberKind::EnumCtor);
        assert!(circle.is_static());
        assert_eq!(circle.params[0].name, "r");
        assert!(member(&c, "Empty").params.is_empty());
    }

    #[test]
    fn enum_abstract_fields_are_static() {
        let c = collect("enum abstract Level(Int) { var Low = 1; var High = 2; }");
        assert!(c.decls[0].is_enum_abstract());
        assert!(member(&c, "Low").is_static());
    }

    #[test]
    fn structures_inherit_typedef_generics() {
        let c = collect("typedef Pair<A, B> = { first:A, ?second:B };");
        let anon = c
            .decls
            .iter()
            .find(|d| d.kind() == crate::model::DeclKind::Anonymous)
            .unwrap();
        assert_eq!(anon.name, "{ first : A, ?second : B }");
        let names: Vec<_> = anon.generics.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert!(member(&c, "second").optional);
    }

    #[test]
    fn object_literals_become_declarations() {
        let c = collect("class A { var o = { x: 1, \"y\": 2 }; }");
        let lit = c
            .decls
            .iter()
            .find(|d| d.kind() == crate::model::DeclKind::ObjectLiteral)
            .unwrap();
        assert_eq!(lit.name, "{ x, y }");
        assert_eq!(lit.members.len(), 2);
        assert!(member(&c, "y").body.is_some());
    }

    #[test]
    fn metadata_arguments_are_text() {
        let c = collect("@:forward(length, push) abstract Stack(Array<Int>) {}");
        let meta = &c.decls[0].meta[0];
        assert_eq!(meta.name, "forward");
        assert_eq!(meta.args, ["length", "push"]);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(collapse_whitespace("Map< String,\n  Int >"), "Map< String, Int >");
    }
}
