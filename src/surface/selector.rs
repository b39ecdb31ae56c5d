//! Selector resolution.
//!
//! Turns a [`Target`] (selector string or node handle) into the live nodes it
//! identifies. Supported grammar:
//!
//! ```text
//! selector := group ("," group)*
//! group    := compound (WS+ compound)*          descendant combinator only
//! compound := (type | "*")? ("#" id | "." class | "[" name ("=" value)? "]")*
//! ```
//!
//! Matches come back in document order without duplicates. The engine
//! itself never resolves selectors; only the mount registry does.

use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use super::Surface;
use crate::error::{Error, Result};

// =============================================================================
// Target
// =============================================================================

/// Something that identifies zero, one or many live nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<N> {
    Selector(String),
    Node(N),
}

impl<N> Target<N> {
    pub fn node(node: N) -> Self {
        Target::Node(node)
    }
}

impl<N> From<&str> for Target<N> {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl<N> From<String> for Target<N> {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<super::NodeId> for Target<super::NodeId> {
    fn from(node: super::NodeId) -> Self {
        Target::Node(node)
    }
}

impl<N: fmt::Display> fmt::Display for Target<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Selector(s) => f.write_str(s),
            Target::Node(n) => write!(f, "{n}"),
        }
    }
}

/// Resolve a target against the surface, in document order.
///
/// A handle resolves to itself when attached and to nothing otherwise.
pub fn resolve<S: Surface>(surface: &S, target: &Target<S::Node>) -> Result<Vec<S::Node>> {
    match target {
        Target::Node(node) => Ok(if surface.is_attached(*node) {
            vec![*node]
        } else {
            Vec::new()
        }),
        Target::Selector(selector) => {
            let selector: Selector = selector.parse()?;
            Ok(selector.query_all(surface, surface.root()))
        }
    }
}

// =============================================================================
// Selector
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches<S: Surface>(&self, surface: &S, node: S::Node) -> bool {
        let Some(tag) = surface.tag_name(node) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if surface.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = surface.attribute(node, "class").unwrap_or("");
            let present = |class: &String| class_attr.split_whitespace().any(|c| c == class);
            if !self.classes.iter().all(present) {
                return false;
            }
        }
        self.attrs.iter().all(|m| match (&m.value, surface.attribute(node, &m.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        Parser::new(source).parse()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches any group.
    pub fn matches<S: Surface>(&self, surface: &S, node: S::Node) -> bool {
        self.groups
            .iter()
            .any(|chain| chain_matches(chain, surface, node))
    }

    /// Every descendant of `scope` (excluding `scope`) that matches.
    pub fn query_all<S: Surface>(&self, surface: &S, scope: S::Node) -> Vec<S::Node> {
        let mut found = Vec::new();
        let mut stack: Vec<S::Node> = surface.children(scope).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.matches(surface, node) {
                found.push(node);
            }
            stack.extend(surface.children(node).into_iter().rev());
        }
        found
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Right-to-left descendant matching with greedy ancestor search.
fn chain_matches<S: Surface>(chain: &[Compound], surface: &S, node: S::Node) -> bool {
    let Some((last, ancestors)) = chain.split_last() else {
        return false;
    };
    if !last.matches(surface, node) {
        return false;
    }
    let mut current = surface.parent(node);
    for compound in ancestors.iter().rev() {
        loop {
            let Some(candidate) = current else {
                return false;
            };
            current = surface.parent(candidate);
            if compound.matches(surface, candidate) {
                break;
            }
        }
    }
    true
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::InvalidSelector {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn parse(mut self) -> Result<Selector> {
        let mut groups = Vec::new();
        loop {
            groups.push(self.group()?);
            match self.chars.next() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
            }
        }
        Ok(Selector {
            source: self.source.trim().to_string(),
            groups,
        })
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn group(&mut self) -> Result<Vec<Compound>> {
        let mut chain = Vec::new();
        self.skip_whitespace();
        loop {
            let compound = self.compound()?;
            if compound.is_empty() {
                return Err(self.error("empty compound selector"));
            }
            chain.push(compound);
            self.skip_whitespace();
            match self.chars.peek() {
                None | Some(',') => return Ok(chain),
                Some(_) => {}
            }
        }
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        match self.chars.peek().copied() {
            Some('*') => {
                self.chars.next();
                compound.universal = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?);
            }
            _ => {}
        }
        loop {
            match self.chars.peek().copied() {
                Some('#') => {
                    self.chars.next();
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.chars.next();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.chars.next();
                    compound.attrs.push(self.attribute()?);
                }
                Some(c) if c.is_whitespace() || c == ',' => break,
                None => break,
                Some(c) => return Err(self.error(format!("unsupported character `{c}`"))),
            }
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String> {
        let mut ident = String::new();
        while let Some(c) = self.chars.next_if(|c| is_ident_char(*c)) {
            ident.push(c);
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }

    fn attribute(&mut self) -> Result<AttrMatch> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();
        let value = match self.chars.next() {
            Some(']') => return Ok(AttrMatch { name, value: None }),
            Some('=') => {
                self.skip_whitespace();
                self.attribute_value()?
            }
            _ => return Err(self.error("unterminated attribute selector")),
        };
        self.skip_whitespace();
        match self.chars.next() {
            Some(']') => Ok(AttrMatch {
                name,
                value: Some(value),
            }),
            _ => Err(self.error("unterminated attribute selector")),
        }
    }

    fn attribute_value(&mut self) -> Result<String> {
        match self.chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some(c) if c == quote => return Ok(value),
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
            }
            _ => self.ident(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Document, NodeId};

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let app = doc
            .append_element(body, "div", &[("id", "app"), ("class", "shell main")])
            .unwrap();
        let list = doc.append_element(app, "ul", &[("data-role", "list")]).unwrap();
        let side = doc.append_element(body, "div", &[("class", "side")]).unwrap();
        (doc, app, list, side)
    }

    #[test]
    fn test_id_and_class_selectors() {
        let (doc, app, _, side) = sample();
        let body = doc.body();
        assert_eq!(Selector::parse("#app").unwrap().query_all(&doc, body), vec![app]);
        assert_eq!(Selector::parse(".main").unwrap().query_all(&doc, body), vec![app]);
        assert_eq!(Selector::parse("div.shell.main").unwrap().query_all(&doc, body), vec![app]);
        assert_eq!(Selector::parse("div").unwrap().query_all(&doc, body), vec![app, side]);
        assert!(Selector::parse("#missing").unwrap().query_all(&doc, body).is_empty());
    }

    #[test]
    fn test_descendant_and_attribute_selectors() {
        let (doc, _, list, _) = sample();
        let body = doc.body();
        let sel: Selector = "#app ul[data-role=list]".parse().unwrap();
        assert_eq!(sel.query_all(&doc, body), vec![list]);
        let sel: Selector = "body [data-role]".parse().unwrap();
        assert_eq!(sel.query_all(&doc, body), vec![list]);
        let sel: Selector = ".side ul".parse().unwrap();
        assert!(sel.query_all(&doc, body).is_empty());
    }

    #[test]
    fn test_groups_and_universal_in_document_order() {
        let (doc, app, list, side) = sample();
        let body = doc.body();
        let sel = Selector::parse(".side, #app").unwrap();
        assert_eq!(sel.query_all(&doc, body), vec![app, side]);
        let sel = Selector::parse("*").unwrap();
        assert_eq!(sel.query_all(&doc, body), vec![app, list, side]);
        assert_eq!(sel.to_string(), "*");
    }

    #[test]
    fn test_tag_match_is_case_insensitive() {
        let (doc, _, list, _) = sample();
        let sel = Selector::parse("UL").unwrap();
        assert_eq!(sel.query_all(&doc, doc.body()), vec![list]);
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "   ", "div >", "#", "[x", "a,,b", "div!"] {
            assert!(
                matches!(Selector::parse(bad), Err(Error::InvalidSelector { .. })),
                "`{bad}` should not parse"
            );
        }
    }

    #[test]
    fn test_resolve_targets() {
        let (mut doc, app, _, _) = sample();
        assert_eq!(resolve(&doc, &Target::from("#app")).unwrap(), vec![app]);
        assert_eq!(resolve(&doc, &Target::node(app)).unwrap(), vec![app]);

        let detached = doc.create_element("div", crate::types::Namespace::Html);
        assert!(resolve(&doc, &Target::node(detached)).unwrap().is_empty());
        assert!(resolve(&doc, &Target::from("div[")).is_err());
    }
}
