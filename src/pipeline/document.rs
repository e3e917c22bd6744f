//! A mutable HTML document tree for body assembly.
//!
//! Thin wrapper over `markup5ever_rcdom`: parse with html5ever, edit nodes
//! in place, serialize back. `RcDom` handles are `Rc`-based and therefore
//! not `Send`; a [`MailDocument`] is built, edited and serialized inside one
//! synchronous call and never held across an `.await`.

use crate::error::ConvertError;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;
use std::rc::Rc;

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

const EMPTY_SHELL: &str =
    "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head><body></body></html>";

pub struct MailDocument {
    dom: RcDom,
}

impl MailDocument {
    /// Parse a full HTML document; html5ever repairs anything malformed.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        Self { dom }
    }

    /// Wrap plain text: each line becomes a text node, separated by `<br>`.
    pub fn from_text(text: &str) -> Self {
        let doc = Self::parse(EMPTY_SHELL);
        if let Some(body) = doc.body() {
            let normalized = text.replace("\r\n", "\n");
            for (i, line) in normalized.split('\n').enumerate() {
                if i > 0 {
                    append_child(&body, create_element("br"));
                }
                if !line.is_empty() {
                    append_child(&body, create_text(line));
                }
            }
        }
        doc
    }

    pub fn document(&self) -> &Handle {
        &self.dom.document
    }

    pub fn body(&self) -> Option<Handle> {
        self.elements("body").into_iter().next()
    }

    /// All elements named `tag`, in document order.
    pub fn elements(&self, tag: &str) -> Vec<Handle> {
        let mut found = Vec::new();
        collect(&self.dom.document, tag, &mut found);
        found
    }

    pub fn serialize(&self) -> Result<String, ConvertError> {
        let mut out = Vec::new();
        let handle: SerializableHandle = self.dom.document.clone().into();
        html5ever::serialize(&mut out, &handle, Default::default())
            .map_err(|e| ConvertError::Internal(format!("HTML serialization failed: {e}")))?;
        String::from_utf8(out)
            .map_err(|e| ConvertError::Internal(format!("HTML serialization produced invalid UTF-8: {e}")))
    }
}

fn collect(node: &Handle, tag: &str, found: &mut Vec<Handle>) {
    if tag_name(node).as_deref() == Some(tag) {
        found.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        collect(child, tag, found);
    }
}

// ── Node helpers ─────────────────────────────────────────────────────────

/// Lowercase local name of an element node.
pub fn tag_name(node: &Handle) -> Option<String> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

pub fn attr(node: &Handle, name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| (&*a.name.local).eq_ignore_ascii_case(name))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs
            .iter_mut()
            .find(|a| (&*a.name.local).eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = StrTendril::from(value),
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: StrTendril::from(value),
            }),
        }
    }
}

pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        attrs
            .borrow_mut()
            .retain(|a| !(&*a.name.local).eq_ignore_ascii_case(name));
    }
}

/// Concatenated text of all descendant text nodes.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    push_text(node, &mut out);
    out
}

fn push_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { ref contents } = node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        push_text(child, out);
    }
}

/// A detached HTML element with no attributes.
pub fn create_element(tag: &str) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(XHTML_NS), LocalName::from(tag)),
        attrs: RefCell::new(Vec::new()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// A detached text node. Content is escaped on serialization.
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

pub fn detach(node: &Handle) {
    let parent = node.parent.take().and_then(|weak| weak.upgrade());
    if let Some(parent) = parent {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

pub fn append_child(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

pub fn prepend_child(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, child);
}

/// Put `replacement` where `old` is; `old` ends up detached.
///
/// Returns `false`, leaving `old` untouched, when `old` is not a child of a
/// live parent.
pub fn replace_node(old: &Handle, replacement: Handle) -> bool {
    let Some(weak) = old.parent.take() else {
        return false;
    };
    let parent = weak.upgrade();
    let pos = parent
        .as_ref()
        .and_then(|p| p.children.borrow().iter().position(|c| Rc::ptr_eq(c, old)));
    let (Some(parent), Some(pos)) = (parent, pos) else {
        old.parent.set(Some(weak));
        return false;
    };

    detach(&replacement);
    replacement.parent.set(Some(Rc::downgrade(&parent)));
    parent.children.borrow_mut()[pos] = replacement;
    true
}
