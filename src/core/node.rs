//! Purpose: Recursive AST node with an opaque kind and owned children.
//! Exports: `Node`, `NodeKind`, `NodeList`.
//! Role: The `ast` member of a `ParserResult`.
//! Invariants: Release and inspection walk the tree with an explicit work list,
//! so depth is bounded by heap, not stack.
use std::fmt;
use std::mem;

use crate::core::blob::Blob;
use crate::core::bytes::Bytes;
use crate::core::list::List;
use crate::core::loc::Loc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Begin,
    Int { value: String },
    Str { value: Bytes },
    Nil,
    True,
    False,
    Self_,
    Lvar { name: String },
    Lvasgn { name: String },
    /// With `has_receiver`, the receiver is the first child and the arguments follow.
    Send { method: String, has_receiver: bool },
    Const { name: String },
    /// `name` is absent when the definition was missing one; children are `args` then the body.
    Def { name: Option<String> },
    Args,
    Arg { name: String },
    /// Placeholder produced by error recovery.
    Error,
}

impl NodeKind {
    pub fn str_type(&self) -> &'static str {
        match self {
            NodeKind::Begin => "begin",
            NodeKind::Int { .. } => "int",
            NodeKind::Str { .. } => "str",
            NodeKind::Nil => "nil",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::Self_ => "self",
            NodeKind::Lvar { .. } => "lvar",
            NodeKind::Lvasgn { .. } => "lvasgn",
            NodeKind::Send { .. } => "send",
            NodeKind::Const { .. } => "const",
            NodeKind::Def { .. } => "def",
            NodeKind::Args => "args",
            NodeKind::Arg { .. } => "arg",
            NodeKind::Error => "error",
        }
    }

    // Inline attributes printed after the type name.
    fn attributes(&self) -> String {
        match self {
            NodeKind::Int { value } => format!(" {value}"),
            NodeKind::Str { value } => format!(" {value:?}"),
            NodeKind::Lvar { name } | NodeKind::Lvasgn { name } | NodeKind::Arg { name } => {
                format!(" :{name}")
            }
            NodeKind::Send {
                method,
                has_receiver: false,
            } => format!(" nil :{method}"),
            NodeKind::Const { name } => format!(" nil :{name}"),
            NodeKind::Def { name: Some(name) } => format!(" :{name}"),
            NodeKind::Def { name: None } => " nil".to_string(),
            _ => String::new(),
        }
    }
}

#[repr(C)]
pub struct Node {
    kind: Blob<NodeKind>,
    loc: Loc,
    children: List<Node>,
}

pub type NodeList = List<Node>;

enum Frame<'a> {
    Open(&'a Node, usize),
    Text(String),
    Close,
}

impl Node {
    pub fn new(kind: NodeKind, loc: Loc, children: Vec<Node>) -> Self {
        Self {
            kind: Blob::pack(kind),
            loc,
            children: List::from(children),
        }
    }

    pub fn leaf(kind: NodeKind, loc: Loc) -> Self {
        Self::new(kind, loc, Vec::new())
    }

    pub fn kind(&self) -> &NodeKind {
        self.kind.get()
    }

    pub fn loc(&self) -> &Loc {
        &self.loc
    }

    pub fn children(&self) -> &List<Node> {
        &self.children
    }

    pub fn push_child(&mut self, child: Node) {
        self.loc = self.loc.join(child.loc());
        self.children.push(child);
    }

    /// Widens `loc` to cover `other` as well.
    pub fn extend_loc(&mut self, other: &Loc) {
        self.loc = self.loc.join(other);
    }

    pub fn str_type(&self) -> &'static str {
        self.kind().str_type()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Releases the whole subtree and returns how many nodes were released.
    pub fn release(self) -> usize {
        let mut released = 0;
        let mut stack = vec![self];
        while let Some(mut node) = stack.pop() {
            released += 1;
            stack.extend(mem::take(&mut node.children));
        }
        released
    }

    /// S-expression rendering, one child per indented line.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![Frame::Open(self, 0)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Open(node, depth) => {
                    if depth > 0 {
                        out.push('\n');
                        out.push_str(&"  ".repeat(depth));
                    }
                    out.push('(');
                    out.push_str(node.str_type());

                    stack.push(Frame::Close);
                    let children = node.children.as_slice();
                    let (receiver, rest) = match node.kind() {
                        NodeKind::Send {
                            method,
                            has_receiver: true,
                        } if !children.is_empty() => {
                            (Some((&children[0], method)), &children[1..])
                        }
                        _ => {
                            out.push_str(&node.kind().attributes());
                            (None, children)
                        }
                    };
                    for child in rest.iter().rev() {
                        stack.push(Frame::Open(child, depth + 1));
                    }
                    if let Some((receiver, method)) = receiver {
                        stack.push(Frame::Text(format!(" :{method}")));
                        stack.push(Frame::Open(receiver, depth + 1));
                    }
                }
                Frame::Text(text) => out.push_str(&text),
                Frame::Close => out.push(')'),
            }
        }
        out
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut stack: Vec<Node> = mem::take(&mut self.children).into_vec();
        while let Some(mut node) = stack.pop() {
            stack.extend(mem::take(&mut node.children));
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}
