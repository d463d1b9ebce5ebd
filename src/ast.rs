use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstNodeKind {
    Program,
    IntDeclaration,
    Expression,
    Assignment,
    Primary,
    Multiplicative,
    Additive,
    Identifier,
    IntLiteral,
}

impl Display for AstNodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AstNodeKind::Program => "Program",
            AstNodeKind::IntDeclaration => "IntDeclaration",
            AstNodeKind::Expression => "Expression",
            AstNodeKind::Assignment => "Assignment",
            AstNodeKind::Primary => "Primary",
            AstNodeKind::Multiplicative => "Multiplicative",
            AstNodeKind::Additive => "Additive",
            AstNodeKind::Identifier => "Identifier",
            AstNodeKind::IntLiteral => "IntLiteral",
        };
        f.write_str(name)
    }
}

/// Handle of a node inside its [`Ast`]. Only meaningful for the tree that
/// created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode<'de> {
    pub kind: AstNodeKind,
    /// Operator symbol, identifier name or literal digits. Empty for
    /// structural nodes.
    pub text: &'de str,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl<'de> AstNode<'de> {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena owning every node of one syntax tree. Children and parents are
/// stored as [`NodeId`] handles into the arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast<'de> {
    nodes: Vec<AstNode<'de>>,
    root: Option<NodeId>,
}

impl<'de> Ast<'de> {
    pub(crate) fn add_node(&mut self, kind: AstNodeKind, text: &'de str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode {
            kind,
            text,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Attaches `child`, which must not have a parent yet, under `parent`.
    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none(), "node already attached");
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// The root node. `None` only for a tree that is still being built.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Panics when `id` belongs to another tree; see [`Ast::get`].
    pub fn node(&self, id: NodeId) -> &AstNode<'de> {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode<'de>> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks from the parent of `id` up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, |&id| self.node(id).parent)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Depth-indented rendering of the tree, one line per node.
    pub fn dump(&self) -> DumpAst<'_, 'de> {
        DumpAst(self)
    }
}

pub struct DumpAst<'a, 'de>(&'a Ast<'de>);

impl DumpAst<'_, '_> {
    fn write_node(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        id: NodeId,
        indent: &mut String,
    ) -> std::fmt::Result {
        stacker::maybe_grow(crate::STACK_RED_ZONE, crate::STACK_GROWTH, || -> std::fmt::Result {
            let node = self.0.node(id);
            if node.text.is_empty() {
                writeln!(f, "{indent}{}", node.kind)?;
            } else {
                writeln!(f, "{indent}{} {}", node.kind, node.text)?;
            }

            indent.push('\t');
            for &child in node.children() {
                self.write_node(f, child, indent)?;
            }
            indent.pop();
            Ok(())
        })
    }
}

impl Display for DumpAst<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.root() {
            Some(root) => self.write_node(f, root, &mut String::new()),
            None => Ok(()),
        }
    }
}
