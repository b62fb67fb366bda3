//! Syntactic type attribution for TypeScript trees.
//!
//! This is not type inference. The pass reads what the source states
//! outright and attaches it to nodes:
//!
//! - literals get their primitive type;
//! - identifiers declared with an annotation or a literal initialiser get
//!   the declared type;
//! - calls to declared functions with an annotated return type get that
//!   return type;
//! - `new` expressions of declared or imported classes get the class type;
//! - function declarations with at least one annotation get a signature.
//!
//! Imports (named, aliased, namespace, default) resolve type names to the
//! module they come from so [`TypeInfo::canonical_name`] agrees across
//! import styles.

use std::collections::HashMap;

use crate::literal::LiteralValue;
use crate::tree::SyntaxNode;
use crate::types::{Primitive, TypeInfo};

/// Attaches the types a TypeScript tree states explicitly.
#[must_use]
pub fn attribute_types(root: SyntaxNode) -> SyntaxNode {
    let declarations = Declarations::collect(&root);
    declarations.annotate(root)
}

#[derive(Debug, Clone)]
enum ImportBinding {
    Named { module: String, imported: String },
    Namespace { module: String },
    Default { module: String },
}

#[derive(Debug, Default)]
struct Declarations {
    imports: HashMap<String, ImportBinding>,
    variables: HashMap<String, TypeInfo>,
    returns: HashMap<String, TypeInfo>,
}

impl Declarations {
    fn collect(root: &SyntaxNode) -> Self {
        let mut declarations = Self::default();
        for node in root.descendants() {
            match node.kind() {
                "import_statement" => declarations.record_import(node),
                "variable_declarator" => declarations.record_variable(node),
                "required_parameter" | "optional_parameter" => declarations.record_parameter(node),
                "function_declaration" | "function_signature" => {
                    declarations.record_function(node);
                }
                _ => {}
            }
        }
        declarations
    }

    fn record_import(&mut self, node: &SyntaxNode) {
        let Some(module) = node
            .child_by_field("source")
            .and_then(LiteralValue::of)
            .and_then(|value| match value {
                LiteralValue::String(module) => Some(module),
                _ => None,
            })
        else {
            return;
        };
        let Some(clause) = node.named_children().find(|child| child.kind() == "import_clause")
        else {
            return;
        };
        for part in clause.named_children() {
            match part.kind() {
                "identifier" => {
                    self.imports.insert(
                        part.text(),
                        ImportBinding::Default {
                            module: module.clone(),
                        },
                    );
                }
                "namespace_import" => {
                    if let Some(alias) = part.named_children().next() {
                        self.imports.insert(
                            alias.text(),
                            ImportBinding::Namespace {
                                module: module.clone(),
                            },
                        );
                    }
                }
                "named_imports" => self.record_specifiers(part, &module),
                _ => {}
            }
        }
    }

    fn record_specifiers(&mut self, named_imports: &SyntaxNode, module: &str) {
        for specifier in named_imports
            .named_children()
            .filter(|child| child.kind() == "import_specifier")
        {
            let Some(name) = specifier.child_by_field("name") else {
                continue;
            };
            let local = specifier.child_by_field("alias").unwrap_or(name);
            self.imports.insert(
                local.text(),
                ImportBinding::Named {
                    module: module.to_owned(),
                    imported: name.text(),
                },
            );
        }
    }

    fn record_variable(&mut self, node: &SyntaxNode) {
        let Some(name) = node
            .child_by_field("name")
            .filter(|name| name.kind() == "identifier")
        else {
            return;
        };
        let declared = node
            .child_by_field("type")
            .map(|annotation| self.annotation_type(annotation))
            .or_else(|| node.child_by_field("value").and_then(literal_type));
        if let Some(ty) = declared {
            self.variables.insert(name.text(), ty);
        }
    }

    fn record_parameter(&mut self, node: &SyntaxNode) {
        let (Some(pattern), Some(annotation)) =
            (node.child_by_field("pattern"), node.child_by_field("type"))
        else {
            return;
        };
        if pattern.kind() == "identifier" {
            let ty = self.annotation_type(annotation);
            self.variables.insert(pattern.text(), ty);
        }
    }

    fn record_function(&mut self, node: &SyntaxNode) {
        let (Some(name), Some(annotation)) =
            (node.child_by_field("name"), node.child_by_field("return_type"))
        else {
            return;
        };
        let ty = self.annotation_type(annotation);
        self.returns.insert(name.text(), ty);
    }

    fn annotate(&self, node: SyntaxNode) -> SyntaxNode {
        let ty = self.type_of(&node);
        let annotated = node.map_children(|child| self.annotate(child));
        match ty {
            Some(found) => annotated.with_type(found),
            None => annotated,
        }
    }

    fn type_of(&self, node: &SyntaxNode) -> Option<TypeInfo> {
        match node.kind() {
            "identifier" => self.variables.get(&node.text()).cloned(),
            "call_expression" => node
                .child_by_field("function")
                .filter(|callee| callee.kind() == "identifier")
                .and_then(|callee| self.returns.get(&callee.text()))
                .cloned(),
            "new_expression" => node
                .child_by_field("constructor")
                .filter(|class| matches!(class.kind(), "identifier" | "member_expression"))
                .map(|class| self.resolve_name(&class.text())),
            "function_declaration" => self.signature(node),
            "template_string" => Some(TypeInfo::Primitive(Primitive::String)),
            _ => literal_type(node),
        }
    }

    fn signature(&self, node: &SyntaxNode) -> Option<TypeInfo> {
        let return_annotation = node.child_by_field("return_type");
        let mut annotated = return_annotation.is_some();
        let params = node
            .child_by_field("parameters")
            .map(|parameters| {
                parameters
                    .named_children()
                    .filter(|param| {
                        matches!(param.kind(), "required_parameter" | "optional_parameter")
                    })
                    .map(|param| match param.child_by_field("type") {
                        Some(annotation) => {
                            annotated = true;
                            self.annotation_type(annotation)
                        }
                        None => TypeInfo::Unknown,
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if !annotated {
            return None;
        }
        let returns = return_annotation.map_or(TypeInfo::Unknown, |annotation| {
            self.annotation_type(annotation)
        });
        Some(TypeInfo::Function {
            params,
            returns: Box::new(returns),
        })
    }

    /// Resolves a `type_annotation` node (`: T`).
    fn annotation_type(&self, annotation: &SyntaxNode) -> TypeInfo {
        let inner = if annotation.kind() == "type_annotation" {
            annotation.named_children().next()
        } else {
            Some(annotation)
        };
        inner.map_or(TypeInfo::Unknown, |ty| self.resolve_type(ty))
    }

    fn resolve_type(&self, node: &SyntaxNode) -> TypeInfo {
        match node.kind() {
            "predefined_type" => {
                Primitive::from_keyword(&node.text()).map_or(TypeInfo::Unknown, TypeInfo::Primitive)
            }
            "type_identifier" | "nested_type_identifier" => self.resolve_name(&node.text()),
            "generic_type" => {
                let base = node
                    .child_by_field("name")
                    .map_or(TypeInfo::Unknown, |name| self.resolve_type(name));
                let arguments: Vec<_> = node
                    .child_by_field("type_arguments")
                    .map(|args| {
                        args.named_children()
                            .map(|arg| self.resolve_type(arg))
                            .collect()
                    })
                    .unwrap_or_default();
                match base {
                    TypeInfo::Named { module, name, .. } => TypeInfo::Named {
                        module,
                        name,
                        arguments,
                    },
                    other => other,
                }
            }
            "array_type" => node
                .named_children()
                .next()
                .map_or(TypeInfo::Unknown, |element| {
                    TypeInfo::Array(Box::new(self.resolve_type(element)))
                }),
            "union_type" => {
                let mut members = Vec::new();
                for member in node.named_children() {
                    match self.resolve_type(member) {
                        TypeInfo::Union(nested) => members.extend(nested),
                        other => members.push(other),
                    }
                }
                TypeInfo::Union(members)
            }
            "parenthesized_type" => node
                .named_children()
                .next()
                .map_or(TypeInfo::Unknown, |inner| self.resolve_type(inner)),
            "literal_type" => node
                .named_children()
                .next()
                .and_then(literal_type)
                .unwrap_or(TypeInfo::Unknown),
            _ => TypeInfo::Unknown,
        }
    }

    /// Resolves a possibly namespace-qualified type name through imports.
    fn resolve_name(&self, text: &str) -> TypeInfo {
        let (head, rest) = text.split_once('.').unwrap_or((text, ""));
        match self.imports.get(head) {
            Some(ImportBinding::Named { module, imported }) => {
                let name = if rest.is_empty() {
                    imported.clone()
                } else {
                    format!("{imported}.{rest}")
                };
                TypeInfo::in_module(module.as_str(), name)
            }
            Some(ImportBinding::Namespace { module }) if !rest.is_empty() => {
                TypeInfo::in_module(module.as_str(), text)
            }
            Some(ImportBinding::Default { module }) if rest.is_empty() => {
                TypeInfo::in_module(module.as_str(), "default")
            }
            _ => TypeInfo::named(text),
        }
    }
}

fn literal_type(node: &SyntaxNode) -> Option<TypeInfo> {
    if node.kind() == "undefined" {
        return Some(TypeInfo::Primitive(Primitive::Undefined));
    }
    let primitive = match LiteralValue::of(node)? {
        LiteralValue::Number(_) if node.text().ends_with('n') => Primitive::BigInt,
        LiteralValue::Number(_) => Primitive::Number,
        LiteralValue::String(_) => Primitive::String,
        LiteralValue::Boolean(_) => Primitive::Boolean,
        LiteralValue::Null => Primitive::Null,
    };
    Some(TypeInfo::Primitive(primitive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parser, SupportedLanguage};

    fn attributed(source: &str) -> SyntaxNode {
        let mut parser =
            Parser::new(SupportedLanguage::TypeScript).unwrap_or_else(|err| panic!("parser: {err}"));
        parser
            .parse_tree(source)
            .unwrap_or_else(|err| panic!("parse: {err}"))
            .into_root()
    }

    fn type_of_last(root: &SyntaxNode, kind: &str) -> Option<TypeInfo> {
        root.descendants()
            .filter(|node| node.kind() == kind)
            .last()
            .and_then(|node| node.ty().cloned())
    }

    #[test]
    fn literals_carry_primitive_types() {
        let root = attributed("f(1, 'a', true);");
        assert_eq!(
            type_of_last(&root, "number"),
            Some(TypeInfo::Primitive(Primitive::Number))
        );
        assert_eq!(
            type_of_last(&root, "string"),
            Some(TypeInfo::Primitive(Primitive::String))
        );
    }

    #[test]
    fn annotated_variables_type_their_uses() {
        let root = attributed("let count: number = compute();\nuse(count);");
        assert_eq!(
            type_of_last(&root, "identifier"),
            Some(TypeInfo::Primitive(Primitive::Number))
        );
    }

    #[test]
    fn calls_take_declared_return_types() {
        let root = attributed("declare function foo(n: number): string;\nfoo(1);");
        assert_eq!(
            type_of_last(&root, "call_expression"),
            Some(TypeInfo::Primitive(Primitive::String))
        );
    }

    #[test]
    fn namespace_and_named_imports_resolve_to_the_same_type() {
        let root = attributed(
            "import * as ui from 'ui';\nimport { Button as B } from 'ui';\n\
             const a = new ui.Button();\nconst b = new B();",
        );
        let types: Vec<_> = root
            .descendants()
            .filter(|node| node.kind() == "new_expression")
            .filter_map(|node| node.ty().cloned())
            .collect();
        let [first, second] = types.as_slice() else {
            panic!("expected two typed new expressions, got {types:?}");
        };
        assert!(first.is_equivalent(second));
        assert_eq!(first.canonical_name().as_deref(), Some("ui.Button"));
    }

    #[test]
    fn function_declarations_with_annotations_get_signatures() {
        let root = attributed("function f(x: number) { return x; }\nfunction g(y) {}");
        let signatures: Vec<_> = root
            .descendants()
            .filter(|node| node.kind() == "function_declaration")
            .map(|node| node.ty().cloned())
            .collect();
        assert_eq!(
            signatures,
            vec![
                Some(TypeInfo::Function {
                    params: vec![TypeInfo::Primitive(Primitive::Number)],
                    returns: Box::new(TypeInfo::Unknown),
                }),
                None,
            ]
        );
    }
}
