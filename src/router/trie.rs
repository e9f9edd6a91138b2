use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::route::Route;

/// Path parameter bindings collected during a lookup.
///
/// Stack-allocated for the common case of a handful of parameters.
pub type PathBindings = SmallVec<[(String, String); 4]>;

/// Registration-time conflicts the trie refuses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteConflict {
    /// Two differently named `:param` children of the same parent.
    #[error("conflicting parameter segment :{new}; parent already has :{existing}")]
    ParamName { existing: String, new: String },
    /// Two differently named `*catchall` children of the same parent.
    #[error("conflicting catch-all segment *{new}; parent already has *{existing}")]
    CatchAllName { existing: String, new: String },
}

/// Lookup outcome.
pub enum Found<'a> {
    /// A route is bound at the path under the request method.
    Route {
        route: &'a Arc<Route>,
        bindings: PathBindings,
    },
    /// The path matches but only other methods are bound there.
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Literal,
    Param,
    CatchAll,
}

/// One node per path segment.
///
/// `segment` holds the literal text, or the extracted name for parameter and
/// catch-all nodes (the sigil is stripped at registration). Children keep
/// registration order, which is the matching order within a class.
struct TrieNode {
    segment: String,
    kind: SegmentKind,
    children: Vec<TrieNode>,
    handlers: HashMap<Method, Arc<Route>>,
}

impl TrieNode {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            children: Vec::new(),
            handlers: HashMap::new(),
        }
    }
}

/// Per-method routing trie over path segments.
///
/// Patterns are `/seg(/seg)*` where each segment is a literal, `:name`
/// (consumes one segment), or `*name` (consumes the remaining path; must be
/// final). Lookup precedence at every node is literal, then parameter, then
/// catch-all, with backtracking across parameter choices.
pub struct Trie {
    root: TrieNode,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new("", SegmentKind::Literal),
        }
    }

    /// Register a route under (method, pattern).
    ///
    /// Returns whether an existing binding for the same (pattern, method) was
    /// replaced; the caller is expected to diagnose replacements. Segments
    /// after a catch-all are ignored.
    pub fn add(
        &mut self,
        method: Method,
        pattern: &str,
        route: Arc<Route>,
    ) -> Result<bool, RouteConflict> {
        let mut node = &mut self.root;
        for seg in pattern.split('/').filter(|s| !s.is_empty()) {
            let (kind, text) = classify(seg);
            // Literals coexist freely; params and catch-alls must agree on the name.
            let idx = match kind {
                SegmentKind::Literal => node
                    .children
                    .iter()
                    .position(|c| c.kind == SegmentKind::Literal && c.segment == text),
                _ => match node.children.iter().position(|c| c.kind == kind) {
                    Some(i) if node.children[i].segment != text => {
                        let existing = node.children[i].segment.clone();
                        return Err(match kind {
                            SegmentKind::Param => RouteConflict::ParamName {
                                existing,
                                new: text.to_string(),
                            },
                            _ => RouteConflict::CatchAllName {
                                existing,
                                new: text.to_string(),
                            },
                        });
                    }
                    found => found,
                },
            };
            let idx = match idx {
                Some(i) => i,
                None => {
                    node.children.push(TrieNode::new(text, kind));
                    node.children.len() - 1
                }
            };
            let is_catch_all = kind == SegmentKind::CatchAll;
            node = &mut node.children[idx];
            if is_catch_all {
                break;
            }
        }
        Ok(node.handlers.insert(method, route).is_some())
    }

    /// Resolve (method, path) to a route and its path parameter bindings.
    ///
    /// Trailing slashes are equivalent to their absence; the empty path
    /// queries the root. Bindings collected on failed branches are discarded.
    pub fn find(&self, method: &Method, path: &str) -> Found<'_> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut bindings = PathBindings::new();
        let mut allowed = Vec::new();
        match search(&self.root, &segments, method, &mut bindings, &mut allowed) {
            Some(route) => Found::Route { route, bindings },
            None if !allowed.is_empty() => Found::MethodNotAllowed { allowed },
            None => Found::NotFound,
        }
    }
}

fn classify(seg: &str) -> (SegmentKind, &str) {
    match seg.as_bytes().first() {
        Some(b':') => (SegmentKind::Param, &seg[1..]),
        Some(b'*') => (SegmentKind::CatchAll, &seg[1..]),
        _ => (SegmentKind::Literal, seg),
    }
}

fn note_methods(node: &TrieNode, allowed: &mut Vec<Method>) {
    for m in node.handlers.keys() {
        if !allowed.contains(m) {
            allowed.push(m.clone());
        }
    }
}

fn search<'a>(
    node: &'a TrieNode,
    segments: &[&str],
    method: &Method,
    bindings: &mut PathBindings,
    allowed: &mut Vec<Method>,
) -> Option<&'a Arc<Route>> {
    if segments.is_empty() {
        if let Some(route) = node.handlers.get(method) {
            return Some(route);
        }
        note_methods(node, allowed);
        // A catch-all child binds the empty string when no segments remain.
        for child in &node.children {
            if child.kind == SegmentKind::CatchAll {
                if let Some(route) = child.handlers.get(method) {
                    bindings.push((child.segment.clone(), String::new()));
                    return Some(route);
                }
                note_methods(child, allowed);
            }
        }
        return None;
    }

    let seg = segments[0];
    let rest = &segments[1..];

    for child in &node.children {
        if child.kind == SegmentKind::Literal && child.segment == seg {
            let mark = bindings.len();
            if let Some(route) = search(child, rest, method, bindings, allowed) {
                return Some(route);
            }
            bindings.truncate(mark);
        }
    }

    for child in &node.children {
        if child.kind == SegmentKind::Param {
            let mark = bindings.len();
            bindings.push((child.segment.clone(), seg.to_string()));
            if let Some(route) = search(child, rest, method, bindings, allowed) {
                return Some(route);
            }
            bindings.truncate(mark);
        }
    }

    for child in &node.children {
        if child.kind == SegmentKind::CatchAll {
            if let Some(route) = child.handlers.get(method) {
                bindings.push((child.segment.clone(), segments.join("/")));
                return Some(route);
            }
            note_methods(child, allowed);
        }
    }

    None
}
