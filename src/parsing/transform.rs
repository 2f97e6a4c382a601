//! The transformer stack that turns an ordered tree walk into symbols.
//!
//! Every interesting phrase node gets a transformer when the walk enters it;
//! uninteresting phrases get a placeholder so the stack stays aligned with
//! the tree. When the walk leaves a node, its transformer is popped,
//! finalised, and offered to the nearest enclosing transformer, which
//! narrows on the child's variant tag and absorbs what it understands.
//! Finished output accumulates in the root file transformer; resolved names
//! are appended to a flat reference list the moment their bearing node is
//! entered, so references come out in walk order.
//!
//! Transformers read leaf tokens (modifiers, initializers, keywords)
//! directly off their own node: the parsed tree is random-access, so the
//! composition protocol only has to carry phrase-level results upward.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::parsing::docblock::{DocBlock, PropertyAccess, Tag};
use crate::parsing::resolution::{NameKind, NameResolver, UseRule};
use crate::parsing::type_string::resolve_type_string;
use crate::symbol::{keys, Reference, Symbol, SymbolDoc, UniqueSymbolCollection};
use crate::types::{FileId, Location, Range, SymbolKind, SymbolModifiers};

/// Mutable per-file state threaded through the walk: the name resolver, the
/// reference list, and the last-seen doc comment.
pub struct PassState<'s> {
    src: &'s str,
    uri: &'s str,
    file_id: FileId,
    pub resolver: NameResolver,
    pub references: Vec<Reference>,
    /// Attachment of references to their bearing node, by tree-sitter node id.
    pub node_references: HashMap<usize, usize>,
    pending_doc: Option<PendingDoc>,
}

struct PendingDoc {
    block: DocBlock,
}

impl<'s> PassState<'s> {
    pub fn new(src: &'s str, uri: &'s str, file_id: FileId) -> Self {
        Self {
            src,
            uri,
            file_id,
            resolver: NameResolver::new(),
            references: Vec::new(),
            node_references: HashMap::new(),
            pending_doc: None,
        }
    }

    fn text(&self, node: Node) -> &'s str {
        &self.src[node.byte_range()]
    }

    fn location(&self, node: Node) -> Location {
        Location::new(self.file_id, Range::from_node(&node))
    }

    /// Append a reference and attach it to its bearing node.
    fn emit(&mut self, node: Node, reference: Reference) -> usize {
        let index = self.references.len();
        self.node_references.insert(node.id(), index);
        self.references.push(reference);
        index
    }

    /// Cache a doc comment until the next declaration claims it.
    fn remember_doc(&mut self, node: Node) {
        if let Some(block) = DocBlock::parse(self.text(node)) {
            self.pending_doc = Some(PendingDoc { block });
        }
    }

    fn take_doc(&mut self) -> Option<DocBlock> {
        self.pending_doc.take().map(|d| d.block)
    }

    fn clear_doc(&mut self) {
        self.pending_doc = None;
    }

    /// Deterministic opaque name for an anonymous class or closure:
    /// stable for the same document and node start offset.
    fn anonymous_name(&self, node: Node) -> String {
        let short = self.uri.rsplit('/').next().unwrap_or(self.uri);
        format!("#anon#{short}#{}", node.start_byte())
    }
}

/// The tagged sum of all transformer variants. Parents narrow on the
/// variant instead of downcasting.
pub enum Transform {
    File(FileTransform),
    Namespace(NamespaceTransform),
    UseDecl(UseDeclTransform),
    UseClause(UseClauseTransform),
    ClassLike(ClassLikeTransform),
    BaseClause(NameListTransform),
    InterfaceClause(NameListTransform),
    TraitUse(NameListTransform),
    Callable(CallableTransform),
    Parameter(ParameterTransform),
    Type(TypeTransform),
    MemberGroup(MemberGroupTransform),
    PropertyElement(PropertyElementTransform),
    ConstDecl(ConstDeclTransform),
    ConstElement(ConstElementTransform),
    Variable(VariableTransform),
    CatchClause(CatchClauseTransform),
    ClosureUse(ClosureUseTransform),
    Call(CallTransform),
    Name(NameTransform),
}

impl Transform {
    /// Offer a finished child to this transformer.
    fn push(&mut self, child: Transform, st: &mut PassState) {
        match self {
            Transform::File(t) => t.push(child),
            Transform::Namespace(t) => t.push(child),
            Transform::UseDecl(t) => t.push(child),
            Transform::ClassLike(t) => t.push(child, st),
            Transform::Callable(t) => t.push(child, st),
            Transform::Parameter(t) => t.push(child),
            Transform::Type(t) => t.push(child),
            Transform::MemberGroup(t) => t.push(child, st),
            Transform::ConstDecl(t) => t.push(child, st),
            Transform::CatchClause(t) => t.push(child),
            Transform::Call(t) => t.push(child, st),
            Transform::BaseClause(t) | Transform::InterfaceClause(t) => t.push(child, st, None),
            Transform::TraitUse(t) => t.push(child, st, Some(SymbolKind::Trait)),
            // Leaf-like transformers compose nothing.
            Transform::UseClause(_)
            | Transform::PropertyElement(_)
            | Transform::ConstElement(_)
            | Transform::Variable(_)
            | Transform::ClosureUse(_)
            | Transform::Name(_) => {}
        }
    }

    /// Complete this transformer when its node is left.
    fn finalize(&mut self, st: &mut PassState) {
        match self {
            Transform::File(t) => t.finalize(),
            Transform::Namespace(t) => t.finalize(),
            Transform::ClassLike(t) => t.finalize(st),
            Transform::Callable(t) => t.finalize(st),
            Transform::Type(t) => t.finalize(),
            _ => {}
        }
    }

    /// The symbols a finished child contributes to a collecting parent.
    fn take_symbols(self) -> Vec<Symbol> {
        match self {
            Transform::Namespace(t) => vec![t.symbol],
            Transform::UseDecl(t) => t.symbols,
            Transform::UseClause(t) => vec![t.symbol],
            Transform::ClassLike(t) => vec![t.symbol],
            Transform::Callable(t) => vec![t.symbol],
            Transform::Parameter(t) => vec![t.symbol],
            Transform::MemberGroup(t) => t.symbols,
            Transform::PropertyElement(t) => vec![t.symbol],
            Transform::ConstDecl(t) => t.symbols,
            Transform::ConstElement(t) => vec![t.symbol],
            Transform::Variable(t) => vec![t.symbol],
            Transform::CatchClause(t) => t.variable.into_iter().collect(),
            Transform::ClosureUse(t) => t.symbols,
            Transform::Call(t) => {
                let mut out: Vec<Symbol> = t.constant.into_iter().collect();
                out.extend(t.carried);
                out
            }
            Transform::File(_)
            | Transform::BaseClause(_)
            | Transform::InterfaceClause(_)
            | Transform::TraitUse(_)
            | Transform::Type(_)
            | Transform::Name(_) => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Root transformer: accumulates every top-level declaration into a
/// [`UniqueSymbolCollection`] and exposes the file symbol once the walk
/// completes, grouping what follows an unbracketed `namespace` statement
/// under that namespace symbol.
pub struct FileTransform {
    pub symbol: Symbol,
    collection: UniqueSymbolCollection,
}

impl FileTransform {
    fn new(node: Node, st: &PassState) -> Self {
        let symbol = Symbol::new(SymbolKind::File, st.uri, st.location(node));
        Self {
            symbol,
            collection: UniqueSymbolCollection::new(),
        }
    }

    fn push(&mut self, child: Transform) {
        self.collection.extend(child.take_symbols());
    }

    /// Fold the collected declarations into the file tree. A namespace
    /// symbol becomes the owner of everything that follows it.
    fn finalize(&mut self) {
        let mut namespace_index = None;
        for mut symbol in std::mem::take(&mut self.collection).into_vec() {
            if symbol.kind == SymbolKind::Namespace {
                symbol.scope = String::new();
                self.symbol.children.push(symbol);
                namespace_index = Some(self.symbol.children.len() - 1);
                continue;
            }
            match namespace_index {
                Some(index) => {
                    let namespace = &mut self.symbol.children[index];
                    symbol.scope = namespace.name.as_ref().to_string();
                    namespace.children.push(symbol);
                }
                None => {
                    symbol.scope = String::new();
                    self.symbol.children.push(symbol);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Namespaces and use-imports
// ---------------------------------------------------------------------------

pub struct NamespaceTransform {
    symbol: Symbol,
    collection: UniqueSymbolCollection,
}

impl NamespaceTransform {
    /// Reading the header name happens on entry so that every node that
    /// follows resolves against the new namespace.
    fn new(node: Node, st: &mut PassState) -> Self {
        let name = node
            .child_by_field_name("name")
            .map(|n| st.text(n).to_string())
            .unwrap_or_default();
        st.resolver.set_namespace(&name);

        let symbol = Symbol::new(
            SymbolKind::Namespace,
            st.resolver.namespace_name(),
            st.location(node),
        );
        Self {
            symbol,
            collection: UniqueSymbolCollection::new(),
        }
    }

    fn push(&mut self, child: Transform) {
        let scope = self.symbol.name.as_ref().to_string();
        for mut symbol in child.take_symbols() {
            symbol.scope = scope.clone();
            self.collection.push(symbol);
        }
    }

    fn finalize(&mut self) {
        self.symbol.children = std::mem::take(&mut self.collection).into_vec();
    }
}

pub struct UseDeclTransform {
    kind: NameKind,
    prefix: String,
    symbols: Vec<Symbol>,
}

impl UseDeclTransform {
    fn new(node: Node, st: &PassState) -> Self {
        let mut kind = NameKind::Class;
        let mut prefix = String::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "function" => kind = NameKind::Function,
                "const" => kind = NameKind::Constant,
                // A namespace_name directly under the declaration is the
                // group prefix of `use Foo\{...}`.
                "namespace_name" => prefix = st.text(child).trim_matches('\\').to_string(),
                _ => {}
            }
        }

        Self {
            kind,
            prefix,
            symbols: Vec::new(),
        }
    }

    fn push(&mut self, child: Transform) {
        self.symbols.extend(child.take_symbols());
    }
}

pub struct UseClauseTransform {
    symbol: Symbol,
}

impl UseClauseTransform {
    /// The use-rule is registered on entry, so it applies to every name that
    /// appears after this clause in the file.
    fn new(node: Node, st: &mut PassState, decl_kind: NameKind, prefix: &str) -> Self {
        let mut kind = decl_kind;
        let mut target = String::new();
        let mut target_range = Range::from_node(&node);
        let mut alias: Option<String> = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "function" => kind = NameKind::Function,
                "const" => kind = NameKind::Constant,
                "name" | "qualified_name" | "namespace_name" => {
                    target = st.text(child).to_string();
                    target_range = Range::from_node(&child);
                }
                "namespace_aliasing_clause" => {
                    alias = child
                        .named_child(0)
                        .map(|alias_node| st.text(alias_node).to_string());
                }
                _ => {}
            }
        }

        let fqn = keys::join_namespace(prefix, target.trim_start_matches('\\'));
        let short = alias.unwrap_or_else(|| keys::short_name(&fqn).to_string());

        st.resolver.add_rule(UseRule {
            alias: short.clone(),
            fqn: fqn.clone(),
            kind,
        });

        let symbol_kind = match kind {
            NameKind::Class => SymbolKind::Class,
            NameKind::Function => SymbolKind::Function,
            NameKind::Constant => SymbolKind::Constant,
        };
        let mut symbol = Symbol::new(symbol_kind, &short, st.location(node));
        symbol.modifiers = SymbolModifiers::USE;
        symbol
            .associated
            .push(Reference::new(symbol_kind, &fqn, target_range));

        Self { symbol }
    }
}

// ---------------------------------------------------------------------------
// Class-likes
// ---------------------------------------------------------------------------

pub struct ClassLikeTransform {
    symbol: Symbol,
    members: Vec<Symbol>,
}

impl ClassLikeTransform {
    fn new(node: Node, kind: SymbolKind, st: &mut PassState) -> Self {
        let modifiers = scan_modifiers(node, st);
        let location = st.location(node);
        let scope = st.resolver.namespace_name().to_string();

        let (name, anonymous) = match node.child_by_field_name("name") {
            Some(name_node) => {
                let fqn = st.resolver.resolve_relative(st.text(name_node));
                st.emit(
                    name_node,
                    Reference::new(kind, &fqn, Range::from_node(&name_node)),
                );
                (fqn, false)
            }
            None => (st.anonymous_name(node), true),
        };

        let mut symbol = Symbol::new(kind, &name, location);
        symbol.scope = scope;
        symbol.modifiers = modifiers.normalized();
        if anonymous {
            symbol.modifiers |= SymbolModifiers::ANONYMOUS;
        }

        if let Some(doc) = st.take_doc() {
            symbol.doc = SymbolDoc::new(&doc.description, None);
            let magic = magic_members(&doc, &name, location, st);
            symbol.children.extend(magic);
        }

        st.resolver.push_class(&name);
        Self {
            symbol,
            members: Vec::new(),
        }
    }

    fn push(&mut self, child: Transform, st: &mut PassState) {
        match child {
            Transform::BaseClause(list) => {
                if self.symbol.kind == SymbolKind::Class {
                    if let Some(base) = list.references.first() {
                        st.resolver.set_current_base(&base.name);
                    }
                }
                self.symbol.associated.extend(list.references);
            }
            Transform::InterfaceClause(list) | Transform::TraitUse(list) => {
                self.symbol.associated.extend(list.references);
            }
            member @ (Transform::Callable(_) | Transform::MemberGroup(_)) => {
                let scope = self.symbol.name.as_ref().to_string();
                for mut symbol in member.take_symbols() {
                    symbol.scope = scope.clone();
                    self.members.push(symbol);
                }
            }
            _ => {}
        }
    }

    fn finalize(&mut self, st: &mut PassState) {
        st.resolver.pop_class();
        self.symbol.children.append(&mut self.members);
    }
}

/// Shared collector for base clauses, interface clauses, and trait use
/// declarations: a list of class-like name references.
pub struct NameListTransform {
    references: Vec<Reference>,
}

impl NameListTransform {
    fn new() -> Self {
        Self {
            references: Vec::new(),
        }
    }

    fn push(&mut self, child: Transform, st: &mut PassState, retag: Option<SymbolKind>) {
        if let Transform::Name(mut name) = child {
            if let Some(kind) = retag {
                name.set_kind(kind, st);
            }
            self.references.push(name.reference(st));
        }
    }
}

// ---------------------------------------------------------------------------
// Functions, methods, closures
// ---------------------------------------------------------------------------

pub struct CallableTransform {
    symbol: Symbol,
    /// Qualified name children are scoped under.
    qualified: String,
    collection: UniqueSymbolCollection,
    doc: Option<DocBlock>,
    doc_return: Option<String>,
    declared_return: Option<String>,
    return_type_id: Option<usize>,
    reference_index: Option<usize>,
}

impl CallableTransform {
    fn new(node: Node, st: &mut PassState) -> Self {
        let location = st.location(node);
        let is_method = node.kind() == "method_declaration";
        let mut modifiers = scan_modifiers(node, st).normalized();
        if is_method {
            modifiers = modifiers.with_default_visibility();
        }

        let doc = st.take_doc();

        let (kind, name, scope, qualified, reference_index) =
            match node.child_by_field_name("name") {
                Some(name_node) if is_method => {
                    let name = st.text(name_node).to_string();
                    let class = st.resolver.current_class().unwrap_or_default().to_string();
                    let qualified = format!("{class}::{name}");
                    let index = st.emit(
                        name_node,
                        Reference::new(SymbolKind::Method, &name, Range::from_node(&name_node)),
                    );
                    (SymbolKind::Method, name, class, qualified, Some(index))
                }
                Some(name_node) => {
                    let fqn = st.resolver.resolve_relative(st.text(name_node));
                    let index = st.emit(
                        name_node,
                        Reference::new(SymbolKind::Function, &fqn, Range::from_node(&name_node)),
                    );
                    let scope = st.resolver.namespace_name().to_string();
                    (SymbolKind::Function, fqn.clone(), scope, fqn, Some(index))
                }
                None => {
                    let name = st.anonymous_name(node);
                    modifiers |= SymbolModifiers::ANONYMOUS;
                    (
                        SymbolKind::Function,
                        name.clone(),
                        String::new(),
                        name,
                        None,
                    )
                }
            };

        let doc_return = doc.as_ref().and_then(|d| {
            d.return_tag()
                .map(|(t, _)| resolve_type_string(t, &st.resolver))
        });

        let mut symbol = Symbol::new(kind, &name, location);
        symbol.scope = scope;
        symbol.modifiers = modifiers;
        if let Some(block) = &doc {
            symbol.doc = SymbolDoc::new(&block.description, doc_return.clone());
        }

        Self {
            symbol,
            qualified,
            collection: UniqueSymbolCollection::new(),
            doc,
            doc_return,
            declared_return: None,
            return_type_id: node.child_by_field_name("return_type").map(|n| n.id()),
            reference_index,
        }
    }

    fn push(&mut self, child: Transform, st: &mut PassState) {
        match child {
            Transform::Parameter(mut parameter) => {
                self.merge_param_doc(&mut parameter, st);
                let mut symbol = parameter.symbol;
                symbol.scope = self.qualified.clone();
                self.collection.push(symbol);
            }
            Transform::Type(t) if Some(t.node_id) == self.return_type_id => {
                self.declared_return = Some(t.resolved);
            }
            other => {
                for mut symbol in other.take_symbols() {
                    symbol.scope = self.qualified.clone();
                    self.collection.push(symbol);
                }
            }
        }
    }

    fn merge_param_doc(&self, parameter: &mut ParameterTransform, st: &mut PassState) {
        let Some(doc) = &self.doc else { return };
        let Some((type_string, description)) = doc.param(&parameter.symbol.name) else {
            return;
        };
        let resolved = if type_string.is_empty() {
            None
        } else {
            Some(resolve_type_string(type_string, &st.resolver))
        };
        parameter.symbol.doc = SymbolDoc::new(description, resolved.clone());
        if parameter.symbol.type_hint.is_none() {
            parameter.symbol.type_hint = resolved.clone();
        }
        if let (Some(resolved), Some(index)) = (resolved, parameter.reference_index) {
            if st.references[index].type_hint.is_none() {
                st.references[index].type_hint = Some(resolved);
            }
        }
    }

    fn finalize(&mut self, st: &mut PassState) {
        self.symbol.type_hint = self
            .declared_return
            .take()
            .or_else(|| self.doc_return.take());
        if let Some(index) = self.reference_index {
            st.references[index].type_hint = self.symbol.type_hint.clone();
        }
        self.symbol.children = std::mem::take(&mut self.collection).into_vec();
    }
}

pub struct ParameterTransform {
    symbol: Symbol,
    reference_index: Option<usize>,
}

impl ParameterTransform {
    fn new(node: Node, st: &mut PassState) -> Self {
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| st.text(n)).unwrap_or_default();

        let mut modifiers = scan_modifiers(node, st);
        if node.kind() == "variadic_parameter" || has_token(node, "...") {
            modifiers |= SymbolModifiers::VARIADIC;
        }

        let mut symbol = Symbol::new(SymbolKind::Parameter, name, st.location(node));
        symbol.modifiers = modifiers.normalized();
        symbol.value = node
            .child_by_field_name("default_value")
            .map(|n| st.text(n).to_string());

        let reference_index = name_node.map(|n| {
            st.emit(
                n,
                Reference::new(SymbolKind::Parameter, name, Range::from_node(&n)),
            )
        });

        Self {
            symbol,
            reference_index,
        }
    }

    fn push(&mut self, child: Transform) {
        if let Transform::Type(t) = child {
            if self.symbol.type_hint.is_none() {
                self.symbol.type_hint = Some(t.resolved);
            }
        }
    }
}

pub struct ClosureUseTransform {
    symbols: Vec<Symbol>,
}

impl ClosureUseTransform {
    fn new(node: Node, st: &mut PassState) -> Self {
        let mut symbols = Vec::new();
        let mut by_ref = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "&" | "reference_modifier" => by_ref = true,
                "variable_name" => {
                    let name = st.text(child);
                    let mut symbol = Symbol::new(SymbolKind::Variable, name, st.location(child));
                    symbol.modifiers = SymbolModifiers::USE;
                    if by_ref {
                        symbol.modifiers |= SymbolModifiers::REFERENCE;
                    }
                    st.emit(
                        child,
                        Reference::new(SymbolKind::Variable, name, Range::from_node(&child)),
                    );
                    symbols.push(symbol);
                    by_ref = false;
                }
                _ => {}
            }
        }

        Self { symbols }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

enum TypeShape {
    /// `Foo\Bar` wrapped in a named type node.
    Named,
    /// `int`, `callable`, `array`, ...
    Primitive,
    /// `?T`
    Optional,
    /// `A|B` and `A&B` composites.
    Composite { separator: &'static str },
}

pub struct TypeTransform {
    node_id: usize,
    shape: TypeShape,
    parts: Vec<String>,
    resolved: String,
}

impl TypeTransform {
    fn new(node: Node, st: &PassState) -> Self {
        let (shape, resolved) = match node.kind() {
            "primitive_type" => (TypeShape::Primitive, st.text(node).to_string()),
            "optional_type" => (TypeShape::Optional, String::new()),
            "intersection_type" => (TypeShape::Composite { separator: "&" }, String::new()),
            "union_type" | "type_list" | "disjunctive_normal_form_type" => {
                (TypeShape::Composite { separator: "|" }, String::new())
            }
            _ => (TypeShape::Named, String::new()),
        };
        Self {
            node_id: node.id(),
            shape,
            parts: Vec::new(),
            resolved,
        }
    }

    fn push(&mut self, child: Transform) {
        match child {
            Transform::Name(name) => self.parts.push(name.resolved.clone()),
            Transform::Type(t) => self.parts.push(t.resolved),
            _ => {}
        }
    }

    fn finalize(&mut self) {
        match &self.shape {
            TypeShape::Primitive => {}
            TypeShape::Named => {
                if let Some(part) = self.parts.first() {
                    self.resolved = part.clone();
                }
            }
            TypeShape::Optional => {
                if let Some(part) = self.parts.first() {
                    self.resolved = format!("?{part}");
                }
            }
            TypeShape::Composite { separator } => {
                self.resolved = self.parts.join(separator);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Properties and constants
// ---------------------------------------------------------------------------

/// Transformer for `property_declaration` and class `const_declaration`
/// lists: group modifiers and the declared type are stamped onto every
/// element symbol.
pub struct MemberGroupTransform {
    kind: SymbolKind,
    modifiers: SymbolModifiers,
    class_fqn: String,
    doc: Option<DocBlock>,
    group_type: Option<String>,
    symbols: Vec<Symbol>,
}

impl MemberGroupTransform {
    fn new(node: Node, kind: SymbolKind, st: &mut PassState) -> Self {
        let mut modifiers = scan_modifiers(node, st)
            .normalized()
            .with_default_visibility();
        if kind == SymbolKind::ClassConstant {
            // Class constants are always accessed statically.
            modifiers |= SymbolModifiers::STATIC;
        }

        Self {
            kind,
            modifiers,
            class_fqn: st.resolver.current_class().unwrap_or_default().to_string(),
            doc: st.take_doc(),
            group_type: None,
            symbols: Vec::new(),
        }
    }

    fn push(&mut self, child: Transform, st: &mut PassState) {
        match child {
            Transform::Type(t) => self.group_type = Some(t.resolved),
            Transform::PropertyElement(element) => {
                self.absorb(element.symbol, element.reference_index, st);
            }
            Transform::ConstElement(element) => {
                self.absorb(element.symbol, element.reference_index, st);
            }
            _ => {}
        }
    }

    fn absorb(&mut self, mut symbol: Symbol, reference_index: Option<usize>, st: &mut PassState) {
        symbol.kind = self.kind;
        symbol.modifiers = (symbol.modifiers | self.modifiers).normalized();
        symbol.scope = self.class_fqn.clone();

        if symbol.type_hint.is_none() {
            symbol.type_hint = self.group_type.clone();
        }
        if let Some(doc) = &self.doc {
            if let Some((type_string, description)) = doc.var_tag(&symbol.name) {
                let resolved = resolve_type_string(type_string, &st.resolver);
                if symbol.type_hint.is_none() {
                    symbol.type_hint = Some(resolved);
                }
                if symbol.doc.is_none() {
                    symbol.doc = SymbolDoc::new(description, symbol.type_hint.clone());
                }
            } else if symbol.doc.is_none() {
                symbol.doc = SymbolDoc::new(&doc.description, None);
            }
        }

        if let Some(index) = reference_index {
            st.references[index].kind = symbol.kind;
            st.references[index].type_hint = symbol.type_hint.clone();
        }
        self.symbols.push(symbol);
    }
}

pub struct PropertyElementTransform {
    symbol: Symbol,
    reference_index: Option<usize>,
}

impl PropertyElementTransform {
    fn new(node: Node, st: &mut PassState) -> Self {
        let mut name = String::new();
        let mut value = None;
        let mut reference_index = None;
        let mut name_id = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "variable_name" && name_id.is_none() {
                name = st.text(child).to_string();
                name_id = Some(child.id());
                reference_index = Some(st.emit(
                    child,
                    Reference::new(SymbolKind::Property, &name, Range::from_node(&child)),
                ));
            } else if child.is_named() {
                value = Some(st.text(child).to_string());
            }
        }

        let mut symbol = Symbol::new(SymbolKind::Property, &name, st.location(node));
        symbol.value = value;
        Self {
            symbol,
            reference_index,
        }
    }
}

pub struct ConstDeclTransform {
    doc: Option<DocBlock>,
    symbols: Vec<Symbol>,
}

impl ConstDeclTransform {
    fn new(st: &mut PassState) -> Self {
        Self {
            doc: st.take_doc(),
            symbols: Vec::new(),
        }
    }

    fn push(&mut self, child: Transform, st: &mut PassState) {
        for mut symbol in child.take_symbols() {
            if let Some(doc) = &self.doc {
                if symbol.doc.is_none() {
                    if let Some((type_string, description)) = doc.var_tag(&symbol.name) {
                        let resolved = resolve_type_string(type_string, &st.resolver);
                        if symbol.type_hint.is_none() {
                            symbol.type_hint = Some(resolved);
                        }
                        symbol.doc = SymbolDoc::new(description, symbol.type_hint.clone());
                    } else {
                        symbol.doc = SymbolDoc::new(&doc.description, None);
                    }
                }
            }
            self.symbols.push(symbol);
        }
    }
}

pub struct ConstElementTransform {
    symbol: Symbol,
    reference_index: Option<usize>,
}

impl ConstElementTransform {
    fn new(node: Node, class_mode: bool, st: &mut PassState) -> Self {
        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.named_child(0));

        let mut name = String::new();
        let mut reference_index = None;
        if let Some(name_node) = name_node {
            let written = st.text(name_node);
            let kind = if class_mode {
                name = written.to_string();
                SymbolKind::ClassConstant
            } else {
                name = st.resolver.resolve_relative(written);
                SymbolKind::Constant
            };
            reference_index = Some(st.emit(
                name_node,
                Reference::new(kind, &name, Range::from_node(&name_node)),
            ));
        }

        let kind = if class_mode {
            SymbolKind::ClassConstant
        } else {
            SymbolKind::Constant
        };
        let mut symbol = Symbol::new(kind, &name, st.location(node));

        // The initializer is the named child after the name.
        let name_id = name_node.map(|n| n.id());
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.is_named() && Some(child.id()) != name_id {
                symbol.value = Some(st.text(child).to_string());
                symbol.type_hint = scalar_type_of(child.kind()).map(str::to_string);
            }
        }
        if let (Some(index), Some(type_hint)) = (reference_index, symbol.type_hint.clone()) {
            st.references[index].type_hint = Some(type_hint);
        }

        Self {
            symbol,
            reference_index,
        }
    }
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

pub struct VariableTransform {
    symbol: Symbol,
}

impl VariableTransform {
    fn new(node: Node, st: &mut PassState) -> Self {
        Self::with_modifiers(node, SymbolModifiers::empty(), st)
    }

    fn with_modifiers(node: Node, modifiers: SymbolModifiers, st: &mut PassState) -> Self {
        let name = st.text(node);
        let mut symbol = Symbol::new(SymbolKind::Variable, name, st.location(node));
        symbol.modifiers = modifiers;
        st.emit(
            node,
            Reference::new(SymbolKind::Variable, name, Range::from_node(&node)),
        );
        Self { symbol }
    }
}

pub struct CatchClauseTransform {
    variable: Option<Symbol>,
}

impl CatchClauseTransform {
    fn new(node: Node, st: &mut PassState) -> Self {
        let variable = node.child_by_field_name("name").map(|name_node| {
            let name = st.text(name_node);
            st.emit(
                name_node,
                Reference::new(SymbolKind::Variable, name, Range::from_node(&name_node)),
            );
            Symbol::new(SymbolKind::Variable, name, st.location(name_node))
        });
        Self { variable }
    }

    fn push(&mut self, child: Transform) {
        let resolved = match child {
            Transform::Type(t) => t.resolved,
            Transform::Name(name) => name.resolved,
            _ => return,
        };
        if let Some(variable) = &mut self.variable {
            if variable.type_hint.is_none() && !resolved.is_empty() {
                variable.type_hint = Some(resolved);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// Transformer for `function_call_expression`. A callee that is a plain
/// name confirms the name's kind as Function; a literal `define(...)` call
/// becomes a constant definition instead.
pub struct CallTransform {
    callee_id: Option<usize>,
    constant: Option<Symbol>,
    carried: Vec<Symbol>,
}

impl CallTransform {
    fn new(node: Node, st: &mut PassState) -> Self {
        let callee = node.child_by_field_name("function");
        let is_define = callee
            .map(|c| {
                matches!(c.kind(), "name" | "qualified_name")
                    && st.text(c).trim_start_matches('\\') == "define"
            })
            .unwrap_or(false);

        if is_define {
            let constant = Self::extract_define(node, st);
            return Self {
                callee_id: None,
                constant,
                carried: Vec::new(),
            };
        }

        Self {
            callee_id: callee
                .filter(|c| matches!(c.kind(), "name" | "qualified_name"))
                .map(|c| c.id()),
            constant: None,
            carried: Vec::new(),
        }
    }

    fn extract_define(node: Node, st: &mut PassState) -> Option<Symbol> {
        let arguments = node.child_by_field_name("arguments")?;
        let mut name: Option<(String, Node)> = None;
        let mut value: Option<(String, &'static str)> = None;

        let mut cursor = arguments.walk();
        let mut position = 0;
        for argument in arguments.children(&mut cursor) {
            if argument.kind() != "argument" {
                continue;
            }
            let Some(expr) = argument.named_child(0) else {
                position += 1;
                continue;
            };
            if position == 0 {
                // The constant name must be a quoted string.
                if matches!(expr.kind(), "string" | "encapsed_string") {
                    let text = st.text(expr).trim_matches(['\'', '"']);
                    let text = text.trim_start_matches('\\');
                    if !text.is_empty() {
                        name = Some((text.to_string(), expr));
                    }
                }
            } else if position == 1 {
                value = Some((
                    st.text(expr).to_string(),
                    scalar_type_of(expr.kind()).unwrap_or(""),
                ));
            }
            position += 1;
        }

        let (name, name_node) = name?;
        let mut symbol = Symbol::new(SymbolKind::Constant, &name, st.location(node));
        if let Some((text, scalar)) = value {
            symbol.value = Some(text);
            if !scalar.is_empty() {
                symbol.type_hint = Some(scalar.to_string());
            }
        }
        if let Some(doc) = st.take_doc() {
            symbol.doc = SymbolDoc::new(&doc.description, None);
        }

        let mut reference =
            Reference::new(SymbolKind::Constant, &name, Range::from_node(&name_node));
        reference.type_hint = symbol.type_hint.clone();
        st.emit(name_node, reference);

        Some(symbol)
    }

    fn push(&mut self, child: Transform, st: &mut PassState) {
        match child {
            Transform::Name(mut name) if Some(name.node_id) == self.callee_id => {
                name.set_kind(SymbolKind::Function, st);
            }
            other => self.carried.extend(other.take_symbols()),
        }
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

enum NameForm {
    /// Plain or namespace-qualified: resolved through the use table.
    Resolvable,
    /// `\Fully\Qualified`: taken verbatim.
    FullyQualified,
    /// `namespace\Relative`: prefixed with the current namespace.
    Relative,
    /// Member names and `self`/`static`/`parent`: no re-resolution.
    Fixed,
}

/// Transformer for a name occurrence. The reference is appended on entry
/// (so the flat list stays in walk order) with a provisional kind; parents
/// that know better confirm the kind afterwards, which re-runs resolution
/// under the matching alias namespace.
pub struct NameTransform {
    node_id: usize,
    reference_index: usize,
    original: String,
    form: NameForm,
    resolved: String,
}

impl NameTransform {
    fn resolvable(node: Node, kind: SymbolKind, st: &mut PassState) -> Self {
        let written = st.text(node).to_string();
        let (form, resolved) = if let Some(stripped) = written.strip_prefix('\\') {
            (NameForm::FullyQualified, stripped.to_string())
        } else if let Some(rest) = written
            .strip_prefix("namespace\\")
            .or_else(|| written.strip_prefix("Namespace\\"))
        {
            (
                NameForm::Relative,
                st.resolver.resolve_relative_to_namespace(rest),
            )
        } else {
            (
                NameForm::Resolvable,
                st.resolver
                    .resolve_not_fully_qualified(&written, NameKind::from_symbol_kind(kind)),
            )
        };

        let mut reference = Reference::new(kind, &resolved, Range::from_node(&node));
        if matches!(kind, SymbolKind::Function | SymbolKind::Constant) && resolved != written {
            reference.unresolved_name = Some(written.as_str().into());
        }
        let reference_index = st.emit(node, reference);
        Self {
            node_id: node.id(),
            reference_index,
            original: written,
            form,
            resolved,
        }
    }

    /// A member name (property, method, class constant): recorded as
    /// written, with instance properties normalised to carry their `$`.
    fn member(node: Node, kind: SymbolKind, name: String, st: &mut PassState) -> Self {
        let reference_index = st.emit(node, Reference::new(kind, &name, Range::from_node(&node)));
        Self {
            node_id: node.id(),
            reference_index,
            original: name.clone(),
            form: NameForm::Fixed,
            resolved: name,
        }
    }

    /// `self`, `static`, or `parent` in scope position, resolved through
    /// the enclosing class stack.
    fn relative_scope(node: Node, st: &mut PassState) -> Self {
        let written = st.text(node).to_string();
        let resolved = match written.as_str() {
            "parent" => st.resolver.current_base().unwrap_or(&written).to_string(),
            _ => st.resolver.current_class().unwrap_or(&written).to_string(),
        };
        let reference_index = st.emit(
            node,
            Reference::new(SymbolKind::Class, &resolved, Range::from_node(&node)),
        );
        Self {
            node_id: node.id(),
            reference_index,
            original: written,
            form: NameForm::Fixed,
            resolved,
        }
    }

    /// Confirm the kind of this name. Function and constant names resolve
    /// through their own alias namespaces, and keep the written form when
    /// resolution rewrote it so lookup can fall back to the global
    /// namespace later.
    fn set_kind(&mut self, kind: SymbolKind, st: &mut PassState) {
        st.references[self.reference_index].kind = kind;

        if matches!(self.form, NameForm::Resolvable) {
            let resolved = st
                .resolver
                .resolve_not_fully_qualified(&self.original, NameKind::from_symbol_kind(kind));
            if matches!(kind, SymbolKind::Function | SymbolKind::Constant)
                && resolved != self.original
            {
                st.references[self.reference_index].unresolved_name =
                    Some(self.original.as_str().into());
            }
            self.resolved = resolved.clone();
            st.references[self.reference_index].name = resolved.into();
        }
    }

    fn reference(&self, st: &PassState) -> Reference {
        st.references[self.reference_index].clone()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn scan_modifiers(node: Node, st: &PassState) -> SymbolModifiers {
    let mut modifiers = SymbolModifiers::empty();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        if kind == "reference_modifier" {
            modifiers |= SymbolModifiers::REFERENCE;
        } else if kind.ends_with("_modifier") {
            modifiers |= SymbolModifiers::from_keyword(st.text(child));
        }
    }
    modifiers
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    result
}

fn scalar_type_of(node_kind: &str) -> Option<&'static str> {
    match node_kind {
        "integer" => Some("int"),
        "float" => Some("float"),
        "string" | "encapsed_string" => Some("string"),
        _ => None,
    }
}

/// Synthesise class members from `@property*` and `@method` tags.
fn magic_members(
    doc: &DocBlock,
    class_fqn: &str,
    location: Location,
    st: &PassState,
) -> Vec<Symbol> {
    let mut members = Vec::new();

    for tag in &doc.tags {
        match tag {
            Tag::Property {
                access,
                type_string,
                name,
                description,
            } => {
                let mut symbol = Symbol::new(SymbolKind::Property, name, location);
                symbol.modifiers = SymbolModifiers::MAGIC | SymbolModifiers::PUBLIC;
                match access {
                    PropertyAccess::ReadOnly => symbol.modifiers |= SymbolModifiers::READ_ONLY,
                    PropertyAccess::WriteOnly => symbol.modifiers |= SymbolModifiers::WRITE_ONLY,
                    PropertyAccess::ReadWrite => {}
                }
                if !type_string.is_empty() {
                    symbol.type_hint = Some(resolve_type_string(type_string, &st.resolver));
                }
                symbol.doc = SymbolDoc::new(description, symbol.type_hint.clone());
                symbol.scope = class_fqn.to_string();
                members.push(symbol);
            }
            Tag::Method {
                is_static,
                return_type,
                name,
                parameters,
                description,
            } => {
                let mut symbol = Symbol::new(SymbolKind::Method, name, location);
                symbol.modifiers = SymbolModifiers::MAGIC | SymbolModifiers::PUBLIC;
                if *is_static {
                    symbol.modifiers |= SymbolModifiers::STATIC;
                }
                symbol.type_hint = return_type
                    .as_deref()
                    .map(|t| resolve_type_string(t, &st.resolver));
                symbol.doc = SymbolDoc::new(description, symbol.type_hint.clone());
                symbol.scope = class_fqn.to_string();

                let method_scope = format!("{class_fqn}::{name}");
                for parameter in parameters {
                    let mut param = Symbol::new(SymbolKind::Parameter, &parameter.name, location);
                    param.modifiers = SymbolModifiers::MAGIC | SymbolModifiers::PUBLIC;
                    if parameter.is_variadic {
                        param.modifiers |= SymbolModifiers::VARIADIC;
                    }
                    if parameter.by_ref {
                        param.modifiers |= SymbolModifiers::REFERENCE;
                    }
                    param.type_hint = parameter
                        .type_string
                        .as_deref()
                        .map(|t| resolve_type_string(t, &st.resolver));
                    param.value = parameter.default.clone();
                    param.scope = method_scope.clone();
                    symbol.children.push(param);
                }
                members.push(symbol);
            }
            _ => {}
        }
    }

    members
}

// ---------------------------------------------------------------------------
// The pass: walker-driven stack machine
// ---------------------------------------------------------------------------

/// The symbol pass. Implements [`crate::parsing::walker::TreeVisitor`] and
/// accumulates one file symbol plus the reference list.
pub struct SymbolPass<'s> {
    state: PassState<'s>,
    stack: Vec<Option<Transform>>,
    file: Option<Symbol>,
}

impl<'s> SymbolPass<'s> {
    pub fn new(src: &'s str, uri: &'s str, file_id: FileId) -> Self {
        Self {
            state: PassState::new(src, uri, file_id),
            stack: Vec::new(),
            file: None,
        }
    }

    /// The finished file symbol, present once the walk has completed.
    pub fn into_output(self) -> Option<(Symbol, Vec<Reference>, HashMap<usize, usize>)> {
        let file = self.file?;
        Some((file, self.state.references, self.state.node_references))
    }

    /// Whether the nearest enclosing transformer matches a predicate.
    fn nearest_is(&self, predicate: impl Fn(&Transform) -> bool) -> bool {
        self.stack
            .iter()
            .rev()
            .find_map(|slot| slot.as_ref())
            .map(predicate)
            .unwrap_or(false)
    }

    fn enclosing_use_decl(&self) -> Option<(NameKind, String)> {
        self.stack.iter().rev().find_map(|slot| match slot {
            Some(Transform::UseDecl(decl)) => Some((decl.kind, decl.prefix.clone())),
            _ => None,
        })
    }

    /// Decide whether `node` gets a transformer, and build it.
    fn create(&mut self, node: Node) -> Option<Transform> {
        match node.kind() {
            "program" => Some(Transform::File(FileTransform::new(node, &self.state))),
            "namespace_definition" => Some(Transform::Namespace(NamespaceTransform::new(
                node,
                &mut self.state,
            ))),
            "namespace_use_declaration" => {
                Some(Transform::UseDecl(UseDeclTransform::new(node, &self.state)))
            }
            "namespace_use_clause" | "namespace_use_group_clause" => {
                let (kind, prefix) = self
                    .enclosing_use_decl()
                    .unwrap_or((NameKind::Class, String::new()));
                Some(Transform::UseClause(UseClauseTransform::new(
                    node,
                    &mut self.state,
                    kind,
                    &prefix,
                )))
            }
            "class_declaration" | "anonymous_class" => Some(Transform::ClassLike(
                ClassLikeTransform::new(node, SymbolKind::Class, &mut self.state),
            )),
            "interface_declaration" => Some(Transform::ClassLike(ClassLikeTransform::new(
                node,
                SymbolKind::Interface,
                &mut self.state,
            ))),
            "trait_declaration" => Some(Transform::ClassLike(ClassLikeTransform::new(
                node,
                SymbolKind::Trait,
                &mut self.state,
            ))),
            "object_creation_expression" => {
                // `new class (...) { ... }` without a dedicated grammar node.
                if has_named_child(node, "declaration_list") {
                    Some(Transform::ClassLike(ClassLikeTransform::new(
                        node,
                        SymbolKind::Class,
                        &mut self.state,
                    )))
                } else {
                    None
                }
            }
            "base_clause" => Some(Transform::BaseClause(NameListTransform::new())),
            "class_interface_clause" => Some(Transform::InterfaceClause(NameListTransform::new())),
            "use_declaration" => Some(Transform::TraitUse(NameListTransform::new())),
            "function_definition"
            | "method_declaration"
            | "anonymous_function_creation_expression"
            | "anonymous_function"
            | "arrow_function" => Some(Transform::Callable(CallableTransform::new(
                node,
                &mut self.state,
            ))),
            "anonymous_function_use_clause" => Some(Transform::ClosureUse(
                ClosureUseTransform::new(node, &mut self.state),
            )),
            "simple_parameter" | "variadic_parameter" | "property_promotion_parameter" => Some(
                Transform::Parameter(ParameterTransform::new(node, &mut self.state)),
            ),
            "named_type" | "primitive_type" | "optional_type" | "union_type"
            | "intersection_type" | "type_list" | "disjunctive_normal_form_type" => {
                Some(Transform::Type(TypeTransform::new(node, &self.state)))
            }
            "property_declaration" => Some(Transform::MemberGroup(MemberGroupTransform::new(
                node,
                SymbolKind::Property,
                &mut self.state,
            ))),
            "const_declaration" | "class_const_declaration" => {
                // Inside a class body these declare class constants.
                let in_class_body = node
                    .parent()
                    .map(|p| p.kind() == "declaration_list")
                    .unwrap_or(false);
                if in_class_body {
                    Some(Transform::MemberGroup(MemberGroupTransform::new(
                        node,
                        SymbolKind::ClassConstant,
                        &mut self.state,
                    )))
                } else {
                    Some(Transform::ConstDecl(ConstDeclTransform::new(
                        &mut self.state,
                    )))
                }
            }
            "property_element" => Some(Transform::PropertyElement(PropertyElementTransform::new(
                node,
                &mut self.state,
            ))),
            "const_element" => {
                let class_mode = self.nearest_is(|t| matches!(t, Transform::MemberGroup(_)));
                Some(Transform::ConstElement(ConstElementTransform::new(
                    node,
                    class_mode,
                    &mut self.state,
                )))
            }
            "function_call_expression" => Some(Transform::Call(CallTransform::new(
                node,
                &mut self.state,
            ))),
            "catch_clause" => Some(Transform::CatchClause(CatchClauseTransform::new(
                node,
                &mut self.state,
            ))),
            "static_variable_declaration" => node.child_by_field_name("name").map(|name_node| {
                Transform::Variable(VariableTransform::with_modifiers(
                    name_node,
                    SymbolModifiers::STATIC,
                    &mut self.state,
                ))
            }),
            "variable_name" => self.create_variable(node),
            "name" | "qualified_name" => self.create_name(node),
            "relative_scope" => Some(Transform::Name(NameTransform::relative_scope(
                node,
                &mut self.state,
            ))),
            _ => None,
        }
    }

    /// Decide whether a `variable_name` node is a plain variable occurrence.
    /// Names that are the subject of another transformer (parameters,
    /// property elements, catch variables, closure captures) stay silent;
    /// `Foo::$bar` in name position becomes a property reference.
    fn create_variable(&mut self, node: Node) -> Option<Transform> {
        let parent = node.parent()?;
        match parent.kind() {
            "property_element"
            | "simple_parameter"
            | "variadic_parameter"
            | "property_promotion_parameter"
            | "anonymous_function_use_clause"
            | "catch_clause"
            | "static_variable_declaration" => None,
            "member_access_expression" | "nullsafe_member_access_expression" => {
                // `$obj->$dynamic` carries no static member name.
                if is_in_field(parent, "name", node) {
                    None
                } else {
                    Some(Transform::Variable(VariableTransform::new(
                        node,
                        &mut self.state,
                    )))
                }
            }
            "scoped_property_access_expression" => {
                if is_scope_position(parent, node) {
                    Some(Transform::Variable(VariableTransform::new(
                        node,
                        &mut self.state,
                    )))
                } else {
                    let name = self.state.text(node).to_string();
                    Some(Transform::Name(NameTransform::member(
                        node,
                        SymbolKind::Property,
                        name,
                        &mut self.state,
                    )))
                }
            }
            _ => Some(Transform::Variable(VariableTransform::new(
                node,
                &mut self.state,
            ))),
        }
    }

    /// Decide whether a `name` or `qualified_name` node denotes something,
    /// and with what provisional kind.
    fn create_name(&mut self, node: Node) -> Option<Transform> {
        let parent = node.parent()?;
        let parent_kind = parent.kind();

        // Names consumed structurally by their parent transformer.
        if matches!(
            parent_kind,
            "namespace_name"
                | "qualified_name"
                | "namespace_aliasing_clause"
                | "namespace_use_clause"
                | "namespace_use_group_clause"
                | "namespace_definition"
                | "variable_name"
        ) {
            return None;
        }

        // Declaration headers already emitted their own reference.
        if matches!(
            parent_kind,
            "function_definition"
                | "method_declaration"
                | "class_declaration"
                | "interface_declaration"
                | "trait_declaration"
        ) {
            return None;
        }

        let st = &mut self.state;
        match parent_kind {
            "base_clause" | "class_interface_clause" | "use_declaration" | "named_type"
            | "attribute" | "object_creation_expression" | "type_list" | "union_type"
            | "intersection_type" | "optional_type" | "disjunctive_normal_form_type"
            | "catch_clause" => Some(Transform::Name(NameTransform::resolvable(
                node,
                SymbolKind::Class,
                st,
            ))),
            "function_call_expression" => {
                if is_in_field(parent, "function", node) {
                    if st.text(node).trim_start_matches('\\') == "define" {
                        // The call transformer owns this occurrence.
                        None
                    } else {
                        // Provisionally a class reference; the call
                        // transformer confirms Function on absorption.
                        Some(Transform::Name(NameTransform::resolvable(
                            node,
                            SymbolKind::Class,
                            st,
                        )))
                    }
                } else {
                    Some(Transform::Name(NameTransform::resolvable(
                        node,
                        SymbolKind::Constant,
                        st,
                    )))
                }
            }
            "scoped_call_expression" => {
                if is_scope_position(parent, node) {
                    Some(Transform::Name(NameTransform::resolvable(
                        node,
                        SymbolKind::Class,
                        st,
                    )))
                } else {
                    let name = st.text(node).to_string();
                    Some(Transform::Name(NameTransform::member(
                        node,
                        SymbolKind::Method,
                        name,
                        st,
                    )))
                }
            }
            "class_constant_access_expression" => {
                if is_scope_position(parent, node) {
                    Some(Transform::Name(NameTransform::resolvable(
                        node,
                        SymbolKind::Class,
                        st,
                    )))
                } else {
                    let name = st.text(node).to_string();
                    Some(Transform::Name(NameTransform::member(
                        node,
                        SymbolKind::ClassConstant,
                        name,
                        st,
                    )))
                }
            }
            "scoped_property_access_expression" => {
                if is_scope_position(parent, node) {
                    Some(Transform::Name(NameTransform::resolvable(
                        node,
                        SymbolKind::Class,
                        st,
                    )))
                } else {
                    None
                }
            }
            "member_access_expression" | "nullsafe_member_access_expression" => {
                if is_in_field(parent, "name", node) {
                    // Instance properties are normalised to carry their `$`.
                    let name = format!("${}", st.text(node));
                    Some(Transform::Name(NameTransform::member(
                        node,
                        SymbolKind::Property,
                        name,
                        st,
                    )))
                } else {
                    None
                }
            }
            "member_call_expression" | "nullsafe_member_call_expression" => {
                if is_in_field(parent, "name", node) {
                    let name = st.text(node).to_string();
                    Some(Transform::Name(NameTransform::member(
                        node,
                        SymbolKind::Method,
                        name,
                        st,
                    )))
                } else {
                    None
                }
            }
            "binary_expression" => {
                let kind = if follows_instanceof(node) {
                    SymbolKind::Class
                } else {
                    SymbolKind::Constant
                };
                Some(Transform::Name(NameTransform::resolvable(node, kind, st)))
            }
            "argument" => {
                if is_in_field(parent, "name", node) {
                    // Named-argument label, not a constant.
                    None
                } else {
                    Some(Transform::Name(NameTransform::resolvable(
                        node,
                        SymbolKind::Constant,
                        st,
                    )))
                }
            }
            "const_element" | "property_element" => {
                // The declared name is handled by the element transformer;
                // a bare name in the initializer denotes a constant.
                if is_first_named_child(parent, node) && parent_kind == "const_element" {
                    None
                } else {
                    Some(Transform::Name(NameTransform::resolvable(
                        node,
                        SymbolKind::Constant,
                        st,
                    )))
                }
            }
            // Bare names in expression position denote global constants.
            "assignment_expression"
            | "return_statement"
            | "echo_statement"
            | "print_intrinsic"
            | "expression_statement"
            | "parenthesized_expression"
            | "unary_op_expression"
            | "conditional_expression"
            | "array_element_initializer"
            | "subscript_expression"
            | "match_condition_list"
            | "match_conditional_expression"
            | "case_statement"
            | "sequence_expression" => Some(Transform::Name(NameTransform::resolvable(
                node,
                SymbolKind::Constant,
                st,
            ))),
            _ => None,
        }
    }
}

impl crate::parsing::walker::TreeVisitor for SymbolPass<'_> {
    fn enter(&mut self, node: Node) {
        if !node.is_named() {
            // The last-seen doc comment does not survive a block close.
            if node.kind() == "}" {
                self.state.clear_doc();
            }
            return;
        }

        let transform = if node.kind() == "comment" {
            self.state.remember_doc(node);
            None
        } else {
            self.create(node)
        };
        self.stack.push(transform);
    }

    fn leave(&mut self, node: Node) {
        if !node.is_named() {
            return;
        }
        let Some(slot) = self.stack.pop() else {
            return;
        };
        let Some(mut transform) = slot else {
            return;
        };

        transform.finalize(&mut self.state);

        if self.stack.is_empty() {
            if let Transform::File(file) = transform {
                self.file = Some(file.symbol);
            }
            return;
        }

        // Offer the finished child to the nearest enclosing transformer,
        // taking it out of the stack while it absorbs the child.
        if let Some(index) = self.stack.iter().rposition(|slot| slot.is_some()) {
            let mut parent = self.stack[index].take().expect("slot checked above");
            parent.push(transform, &mut self.state);
            self.stack[index] = Some(parent);
        }
    }
}

fn has_named_child(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.named_children(&mut cursor).any(|c| c.kind() == kind);
    result
}

fn is_in_field(parent: Node, field: &str, node: Node) -> bool {
    parent
        .child_by_field_name(field)
        .map(|n| n.id() == node.id())
        .unwrap_or(false)
}

fn is_first_named_child(parent: Node, node: Node) -> bool {
    parent
        .named_child(0)
        .map(|n| n.id() == node.id())
        .unwrap_or(false)
}

/// Scope position of `X::...` expressions: the field when the grammar
/// names it, the first named child otherwise.
fn is_scope_position(parent: Node, node: Node) -> bool {
    if parent.child_by_field_name("scope").is_some() {
        return is_in_field(parent, "scope", node);
    }
    is_first_named_child(parent, node)
}

fn follows_instanceof(node: Node) -> bool {
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if !s.is_named() {
            return s.kind() == "instanceof";
        }
        sibling = s.prev_sibling();
    }
    false
}
