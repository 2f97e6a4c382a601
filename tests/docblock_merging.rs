//! PHPDoc attachment: descriptions, parameter types, and magic members.

use phpdex::{FileId, ParsedDocument, PhpParser, Symbol, SymbolKind, SymbolModifiers};

fn parse(code: &str) -> ParsedDocument {
    let mut parser = PhpParser::new().expect("Failed to create parser");
    parser.parse(code, "file:///doc.php", FileId(1))
}

fn find<'a>(symbols: &'a [Symbol], kind: SymbolKind, name: &str) -> Option<&'a Symbol> {
    symbols
        .iter()
        .find(|s| s.kind == kind && s.name.as_ref() == name)
}

#[test]
fn test_magic_property_from_doc_tag() {
    let code = "<?php /** @property int $x */ class K {}";
    let doc = parse(code);

    let class = find(&doc.symbol.children, SymbolKind::Class, "K").expect("class K");
    let magic = find(&class.children, SymbolKind::Property, "$x").expect("magic property $x");
    assert!(magic.modifiers.contains(SymbolModifiers::MAGIC | SymbolModifiers::PUBLIC));
    assert_eq!(magic.type_hint.as_deref(), Some("int"));
    assert_eq!(magic.scope, "K");
}

#[test]
fn test_magic_property_read_write_variants() {
    let code = r#"<?php
/**
 * @property-read string $id
 * @property-write array $payload
 */
class Message {}
"#;
    let doc = parse(code);
    let class = find(&doc.symbol.children, SymbolKind::Class, "Message").expect("class");

    let id = find(&class.children, SymbolKind::Property, "$id").expect("$id");
    assert!(id.modifiers.contains(SymbolModifiers::READ_ONLY));
    assert!(!id.modifiers.contains(SymbolModifiers::WRITE_ONLY));

    let payload = find(&class.children, SymbolKind::Property, "$payload").expect("$payload");
    assert!(payload.modifiers.contains(SymbolModifiers::WRITE_ONLY));
}

#[test]
fn test_magic_method_with_static_and_params() {
    let code = r#"<?php
namespace App;

/**
 * @method static Builder query(string $column)
 * @method void flush()
 */
class Model {}
"#;
    let doc = parse(code);
    let namespace = &doc.symbol.children[0];
    let class = find(&namespace.children, SymbolKind::Class, "App\\Model").expect("class");

    let query = find(&class.children, SymbolKind::Method, "query").expect("magic query");
    assert!(query.modifiers.contains(
        SymbolModifiers::MAGIC | SymbolModifiers::PUBLIC | SymbolModifiers::STATIC
    ));
    assert_eq!(
        query.type_hint.as_deref(),
        Some("App\\Builder"),
        "doc types are expanded through the name resolver"
    );
    let column = find(&query.children, SymbolKind::Parameter, "$column").expect("$column");
    assert_eq!(column.type_hint.as_deref(), Some("string"));

    let flush = find(&class.children, SymbolKind::Method, "flush").expect("magic flush");
    assert!(!flush.modifiers.contains(SymbolModifiers::STATIC));
}

#[test]
fn test_param_tag_attaches_by_name() {
    let code = r#"<?php
namespace App;

/**
 * Render a template.
 *
 * @param Template $tpl the template
 * @param array $vars
 * @return string
 */
function render($tpl, $vars) {}
"#;
    let doc = parse(code);
    let namespace = &doc.symbol.children[0];
    let function =
        find(&namespace.children, SymbolKind::Function, "App\\render").expect("function");

    assert_eq!(function.type_hint.as_deref(), Some("string"));
    let doc_info = function.doc.as_ref().expect("function doc attached");
    assert_eq!(doc_info.description, "Render a template.");

    let tpl = find(&function.children, SymbolKind::Parameter, "$tpl").expect("$tpl");
    assert_eq!(
        tpl.type_hint.as_deref(),
        Some("App\\Template"),
        "@param types resolve against the namespace"
    );
    assert_eq!(
        tpl.doc.as_ref().map(|d| d.description.as_str()),
        Some("the template")
    );

    let vars = find(&function.children, SymbolKind::Parameter, "$vars").expect("$vars");
    assert_eq!(vars.type_hint.as_deref(), Some("array"));
}

#[test]
fn test_declared_types_beat_doc_types() {
    let code = r#"<?php
/** @return string */
function f(): int {}
"#;
    let doc = parse(code);
    let function = find(&doc.symbol.children, SymbolKind::Function, "f").expect("function");
    assert_eq!(
        function.type_hint.as_deref(),
        Some("int"),
        "a declared return type wins over @return"
    );
}

#[test]
fn test_var_tag_types_properties_and_constants() {
    let code = r#"<?php
class C
{
    /** @var Model[] the loaded rows */
    private $rows;
}
"#;
    let doc = parse(code);
    let class = find(&doc.symbol.children, SymbolKind::Class, "C").expect("class");
    let rows = find(&class.children, SymbolKind::Property, "$rows").expect("$rows");
    assert_eq!(rows.type_hint.as_deref(), Some("Model[]"));
    assert_eq!(
        rows.doc.as_ref().map(|d| d.description.as_str()),
        Some("the loaded rows")
    );
}

#[test]
fn test_doc_is_consumed_by_first_claimant() {
    let code = r#"<?php
/** @var int */
const FIRST = 1;
const SECOND = 2;
"#;
    let doc = parse(code);

    let first = find(&doc.symbol.children, SymbolKind::Constant, "FIRST").expect("FIRST");
    assert!(first.doc.is_some(), "the declaration claims the comment");

    let second = find(&doc.symbol.children, SymbolKind::Constant, "SECOND").expect("SECOND");
    assert!(
        second.doc.is_none(),
        "a consumed comment does not leak into later declarations"
    );
}

#[test]
fn test_close_brace_clears_pending_doc() {
    let code = r#"<?php
class A
{
    public function m()
    {
        /** @var int $x */
    }

    public $later;
}
"#;
    let doc = parse(code);
    let class = find(&doc.symbol.children, SymbolKind::Class, "A").expect("class");
    let later = find(&class.children, SymbolKind::Property, "$later").expect("$later");
    assert!(
        later.doc.is_none() && later.type_hint.is_none(),
        "a doc comment left before a closing brace is dropped"
    );
}

#[test]
fn test_plain_comments_are_not_docs() {
    let code = r#"<?php
// not a doc block
/* also not one */
function f() {}
"#;
    let doc = parse(code);
    let function = find(&doc.symbol.children, SymbolKind::Function, "f").expect("function");
    assert!(function.doc.is_none());
}

#[test]
fn test_class_doc_description() {
    let code = r#"<?php
/**
 * A thing that does things.
 */
class Thing {}
"#;
    let doc = parse(code);
    let class = find(&doc.symbol.children, SymbolKind::Class, "Thing").expect("class");
    assert_eq!(
        class.doc.as_ref().map(|d| d.description.as_str()),
        Some("A thing that does things.")
    );
}
