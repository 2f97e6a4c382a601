//! Ordered traversal of a parsed tree.
//!
//! The symbol pass is driven by one synchronous walk: every node is entered
//! in pre-order and left in post-order, with no recursion (the cursor keeps
//! the path). A cancellation flag is checked between sibling nodes; a
//! cancelled walk yields no output at all.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tree_sitter::Node;

/// Shared flag used to abandon an in-flight extraction.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Receiver for walk events.
pub trait TreeVisitor {
    fn enter(&mut self, node: Node);
    fn leave(&mut self, node: Node);
}

/// Walk `root` depth-first, calling `enter` on the way down and `leave` on
/// the way up. Returns `false` when the walk was cancelled between
/// siblings.
pub fn walk_tree(root: Node, visitor: &mut impl TreeVisitor, cancel: &CancellationFlag) -> bool {
    let mut cursor = root.walk();

    'descend: loop {
        visitor.enter(cursor.node());

        if cursor.goto_first_child() {
            continue 'descend;
        }

        // Leaf reached: unwind until a sibling exists or the root is left.
        loop {
            visitor.leave(cursor.node());

            if cursor.goto_next_sibling() {
                if cancel.is_cancelled() {
                    return false;
                }
                continue 'descend;
            }
            if !cursor.goto_parent() {
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        events: Vec<(String, bool)>,
    }

    impl TreeVisitor for Recorder {
        fn enter(&mut self, node: Node) {
            self.events.push((node.kind().to_string(), true));
        }
        fn leave(&mut self, node: Node) {
            self.events.push((node.kind().to_string(), false));
        }
    }

    fn parse(code: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .unwrap();
        parser.parse(code, None).unwrap()
    }

    #[test]
    fn test_enter_and_leave_balance() {
        let tree = parse("<?php function f() { return 1; }");
        let mut rec = Recorder { events: Vec::new() };
        let done = walk_tree(tree.root_node(), &mut rec, &CancellationFlag::new());
        assert!(done);

        let enters = rec.events.iter().filter(|(_, e)| *e).count();
        let leaves = rec.events.iter().filter(|(_, e)| !*e).count();
        assert_eq!(enters, leaves);

        // The root program node opens first and closes last.
        assert_eq!(rec.events.first().unwrap(), &("program".to_string(), true));
        assert_eq!(rec.events.last().unwrap(), &("program".to_string(), false));
    }

    #[test]
    fn test_pre_cancelled_walk_stops() {
        let tree = parse("<?php $a = 1; $b = 2; $c = 3;");
        let cancel = CancellationFlag::new();
        cancel.cancel();
        let mut rec = Recorder { events: Vec::new() };
        let done = walk_tree(tree.root_node(), &mut rec, &cancel);
        assert!(!done);
    }
}
