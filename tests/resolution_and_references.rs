//! Name resolution and reference emission over whole documents.

use phpdex::{FileId, ParsedDocument, PhpParser, Reference, SymbolKind};

fn parse(code: &str) -> ParsedDocument {
    let mut parser = PhpParser::new().expect("Failed to create parser");
    parser.parse(code, "file:///refs.php", FileId(1))
}

fn find_ref<'a>(doc: &'a ParsedDocument, kind: SymbolKind, name: &str) -> Option<&'a Reference> {
    doc.references
        .iter()
        .find(|r| r.kind == kind && r.name.as_ref() == name)
}

#[test]
fn test_function_call_resolves_through_namespace() {
    let code = "<?php namespace App; strlen($s);";
    let doc = parse(code);

    let call = find_ref(&doc, SymbolKind::Function, "App\\strlen")
        .expect("unqualified calls resolve into the current namespace");
    assert_eq!(
        call.unresolved_name.as_deref(),
        Some("strlen"),
        "the written form is kept for the global-namespace fallback"
    );
}

#[test]
fn test_function_alias() {
    let code = "<?php use function Util\\helpers\\map as fmap; fmap([]);";
    let doc = parse(code);

    let call = find_ref(&doc, SymbolKind::Function, "Util\\helpers\\map")
        .expect("aliased function call resolves to the alias target");
    assert_eq!(call.unresolved_name.as_deref(), Some("fmap"));
}

#[test]
fn test_constant_alias() {
    let code = "<?php use const Math\\TAU; echo TAU;";
    let doc = parse(code);

    let reference = find_ref(&doc, SymbolKind::Constant, "Math\\TAU")
        .expect("const import applies to constant references");
    assert_eq!(reference.unresolved_name.as_deref(), Some("TAU"));
}

#[test]
fn test_fully_qualified_names_pass_through() {
    let code = "<?php namespace App; use Other\\Thing; new \\Vendor\\Widget();";
    let doc = parse(code);

    let reference = find_ref(&doc, SymbolKind::Class, "Vendor\\Widget")
        .expect("fully-qualified names are taken verbatim");
    assert!(
        reference.unresolved_name.is_none(),
        "no rewrite happened, nothing to preserve"
    );
}

#[test]
fn test_qualified_name_first_segment_alias() {
    let code = r#"<?php
namespace App;
use Domain\Models;
new Models\User();
"#;
    let doc = parse(code);
    assert!(
        find_ref(&doc, SymbolKind::Class, "Domain\\Models\\User").is_some(),
        "the first segment of a qualified name goes through the class alias table"
    );
}

#[test]
fn test_relative_namespace_form() {
    let code = "<?php namespace A\\B; new namespace\\Sub\\Thing();";
    let doc = parse(code);
    assert!(
        find_ref(&doc, SymbolKind::Class, "A\\B\\Sub\\Thing").is_some(),
        "namespace\\ names are prefixed with the current namespace"
    );
}

#[test]
fn test_group_use_clauses() {
    let code = r#"<?php
use Symfony\Component\{HttpFoundation\Request, HttpFoundation\Response as Resp, function dump};
new Request();
new Resp();
dump(1);
"#;
    let doc = parse(code);

    assert!(
        find_ref(
            &doc,
            SymbolKind::Class,
            "Symfony\\Component\\HttpFoundation\\Request"
        )
        .is_some(),
        "group prefix joins with the clause path"
    );
    assert!(
        find_ref(
            &doc,
            SymbolKind::Class,
            "Symfony\\Component\\HttpFoundation\\Response"
        )
        .is_some(),
        "aliased group clause resolves to its target"
    );
    assert!(
        find_ref(&doc, SymbolKind::Function, "Symfony\\Component\\dump").is_some(),
        "function keyword inside a group clause switches the alias kind"
    );
}

#[test]
fn test_use_rules_apply_only_after_their_clause() {
    // The name appears before the import: it resolves at its own position,
    // against the namespace only.
    let code = "<?php namespace App; new Widget(); use Toolkit\\Widget; new Widget();";
    let doc = parse(code);

    let names: Vec<&str> = doc
        .references
        .iter()
        .filter(|r| r.kind == SymbolKind::Class)
        .map(|r| r.name.as_ref())
        .collect();
    assert_eq!(names, vec!["App\\Widget", "Toolkit\\Widget"]);
}

#[test]
fn test_reserved_words_stay_unqualified() {
    let code = "<?php namespace App; function f(int $a, string $b, iterable $c): void {}";
    let doc = parse(code);

    let function = doc.symbol.children[0]
        .children
        .iter()
        .find(|s| s.kind == SymbolKind::Function)
        .expect("function symbol");
    assert_eq!(function.type_hint.as_deref(), Some("void"));

    let types: Vec<Option<&str>> = function
        .children
        .iter()
        .filter(|s| s.kind == SymbolKind::Parameter)
        .map(|s| s.type_hint.as_deref())
        .collect();
    assert_eq!(types, vec![Some("int"), Some("string"), Some("iterable")]);
}

#[test]
fn test_scoped_access_references() {
    let code = r#"<?php
namespace N;

class A extends Base
{
    public function go()
    {
        self::helper();
        static::helper();
        parent::helper();
        A::FLAG;
        B::$shared;
        C::make();
    }
}
"#;
    let doc = parse(code);

    let class_refs: Vec<&str> = doc
        .references
        .iter()
        .filter(|r| r.kind == SymbolKind::Class)
        .map(|r| r.name.as_ref())
        .collect();
    // self and static resolve to the enclosing class, parent to its base.
    assert!(class_refs.iter().filter(|n| **n == "N\\A").count() >= 3);
    assert!(class_refs.contains(&"N\\Base"));
    assert!(class_refs.contains(&"N\\B"));
    assert!(class_refs.contains(&"N\\C"));

    assert!(
        doc.references
            .iter()
            .filter(|r| r.kind == SymbolKind::Method && r.name.as_ref() == "helper")
            .count()
            >= 3,
        "each scoped call emits a method reference"
    );
    assert!(
        doc.references
            .iter()
            .any(|r| r.kind == SymbolKind::ClassConstant && r.name.as_ref() == "FLAG")
    );
    assert!(
        doc.references
            .iter()
            .any(|r| r.kind == SymbolKind::Property && r.name.as_ref() == "$shared")
    );
}

#[test]
fn test_instanceof_right_operand_is_a_class() {
    let code = "<?php namespace App; $ok = $x instanceof Model;";
    let doc = parse(code);
    assert!(
        doc.references
            .iter()
            .any(|r| r.kind == SymbolKind::Class && r.name.as_ref() == "App\\Model"),
        "instanceof right operands are class references"
    );
}

#[test]
fn test_references_in_walk_order() {
    let code = "<?php class A {} class B {} new A(); new B();";
    let doc = parse(code);

    let names: Vec<&str> = doc.references.iter().map(|r| r.name.as_ref()).collect();
    assert_eq!(names, vec!["A", "B", "A", "B"]);
}

#[test]
fn test_declaration_references_carry_types() {
    let code = "<?php function f(): int { return 1; }";
    let doc = parse(code);

    let decl = find_ref(&doc, SymbolKind::Function, "f").expect("declaration reference");
    assert_eq!(
        decl.type_hint.as_deref(),
        Some("int"),
        "declaration references expose the learned type"
    );
}

#[test]
fn test_unresolvable_names_are_best_effort() {
    let code = "<?php namespace App; new Nowhere\\ToBeFound();";
    let doc = parse(code);
    assert!(
        find_ref(&doc, SymbolKind::Class, "App\\Nowhere\\ToBeFound").is_some(),
        "unknown qualified names still get a namespace-prefixed best effort"
    );
}
