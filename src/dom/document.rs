use std::io;

use crate::error::{Result, WFError};
use crate::parser::{EventType, PullParser};
use crate::writer::Serializer;

use super::node::{Child, Element, ElementId, NodeId};
use super::TreeError;

/// A document: the top-level children and an arena holding every element
/// created for it.
///
/// At most one top-level child is an element, the root element. Detached
/// elements (created but not added, or removed again) stay in the arena
/// until the document is dropped.
#[derive(Debug, Clone, Default)]
pub struct Document {
	elements: Vec<Element>,
	children: Vec<Child>,
	root_index: Option<usize>,
	encoding: Option<String>,
	standalone: Option<bool>,
}

impl Document {
	pub fn new() -> Document {
		Document::default()
	}

	/// Build a document from the events of `parser`.
	///
	/// The parser must not have been advanced yet. Events are read in
	/// token mode, so CDATA sections, comments and unresolved entity
	/// references are kept as separate children. Elements without any
	/// content get a single empty whitespace child.
	pub fn parse(parser: &mut PullParser<'_>) -> Result<Document> {
		parser.require(EventType::StartDocument, None, None)?;
		parser.advance_raw()?;
		let mut doc = Document::new();
		doc.encoding = parser.input_encoding().map(String::from);
		doc.standalone = parser.standalone();
		doc.parse_children(parser, NodeId::Document)?;
		if parser.event_type() != EventType::EndDocument {
			return Err(WFError::UnexpectedEvent {
				expected: EventType::EndDocument.to_string(),
				found: parser.position_description(),
			}
			.into());
		}
		doc.root_element()?;
		Ok(doc)
	}

	fn parse_children(&mut self, parser: &mut PullParser<'_>, parent: NodeId) -> Result<()> {
		loop {
			match parser.event_type() {
				EventType::StartTag => {
					let id = self.create_element(parser.namespace(), parser.name().unwrap_or(""));
					self.add_child(parent, None, Child::Element(id))?;
					self.parse_element(parser, id)?;
				}
				EventType::EndTag | EventType::EndDocument => return Ok(()),
				ev => {
					let child = match (parser.text(), ev) {
						// resolved references are plain text
						(Some(text), EventType::EntityRef) => Some(Child::Text(text.to_string())),
						(Some(text), ev) => Child::from_event(ev, text.to_string()),
						(None, EventType::EntityRef) => {
							parser.name().map(|name| Child::EntityRef(name.to_string()))
						}
						(None, _) => None,
					};
					if let Some(child) = child {
						self.add_child(parent, None, child)?;
					}
					parser.advance_raw()?;
				}
			}
		}
	}

	fn parse_element(&mut self, parser: &mut PullParser<'_>, id: ElementId) -> Result<()> {
		let depth = parser.depth();
		let first = parser.namespace_count(depth.saturating_sub(1))?;
		let end = parser.namespace_count(depth)?;
		for i in first..end {
			let prefix = parser.namespace_prefix(i)?.to_string();
			let uri = parser.namespace_uri(i)?.to_string();
			self.elements[id.0].prefixes.push((prefix, uri));
		}
		for a in parser.attributes() {
			self.elements[id.0].set_attribute(Some(&*a.namespace), &a.name, Some(a.value.as_str()));
		}

		let empty = parser.is_empty_element_tag()?;
		parser.advance_raw()?;
		if !empty {
			self.parse_children(parser, NodeId::Element(id))?;
		}
		if self.elements[id.0].children.is_empty() {
			self.elements[id.0]
				.children
				.push(Child::IgnorableWhitespace(String::new()));
		}

		let el = &self.elements[id.0];
		parser.require(
			EventType::EndTag,
			Some(el.namespace.as_str()),
			Some(el.name.as_str()),
		)?;
		parser.advance_raw()?;
		Ok(())
	}

	/// Encoding reported by the parser the document was built from.
	pub fn encoding(&self) -> Option<&str> {
		self.encoding.as_deref()
	}

	pub fn set_encoding(&mut self, encoding: Option<&str>) {
		self.encoding = encoding.map(String::from);
	}

	/// `standalone` from the XML declaration of the parsed input.
	pub fn standalone(&self) -> Option<bool> {
		self.standalone
	}

	pub fn set_standalone(&mut self, standalone: Option<bool>) {
		self.standalone = standalone;
	}

	/// Create a detached element. `None` means no namespace.
	pub fn create_element(&mut self, namespace: Option<&str>, name: &str) -> ElementId {
		let id = ElementId(self.elements.len());
		self.elements.push(Element::new(namespace.unwrap_or(""), name));
		id
	}

	pub fn element(&self, id: ElementId) -> Option<&Element> {
		self.elements.get(id.0)
	}

	pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
		self.elements.get_mut(id.0)
	}

	fn check_id(&self, id: ElementId) -> Result<()> {
		if id.0 < self.elements.len() {
			Ok(())
		} else {
			Err(TreeError::UnknownElement(id.0).into())
		}
	}

	pub fn children(&self, node: NodeId) -> &[Child] {
		match node {
			NodeId::Document => &self.children,
			NodeId::Element(id) => match self.elements.get(id.0) {
				Some(el) => &el.children,
				None => &[],
			},
		}
	}

	pub fn child_count(&self, node: NodeId) -> usize {
		self.children(node).len()
	}

	fn children_mut(&mut self, node: NodeId) -> Result<&mut Vec<Child>> {
		match node {
			NodeId::Document => Ok(&mut self.children),
			NodeId::Element(id) => match self.elements.get_mut(id.0) {
				Some(el) => Ok(&mut el.children),
				None => Err(TreeError::UnknownElement(id.0).into()),
			},
		}
	}

	/// The root element.
	pub fn root_element(&self) -> Result<ElementId> {
		match self
			.root_index
			.and_then(|i| self.children.get(i))
			.and_then(|c| c.as_element())
		{
			Some(id) => Ok(id),
			None => Err(TreeError::NoRootElement.into()),
		}
	}

	/// Insert `child` into `parent` at `index`, or append it.
	///
	/// An element child must be detached and must not be `parent` itself
	/// or one of its ancestors. The document accepts a single element
	/// child.
	pub fn add_child(&mut self, parent: NodeId, index: Option<usize>, child: Child) -> Result<()> {
		let len = self.child_count(parent);
		let index = index.unwrap_or(len);
		if index > len {
			return Err(TreeError::IndexOutOfBounds(index).into());
		}
		if let NodeId::Element(pid) = parent {
			self.check_id(pid)?;
		}
		if let Child::Element(id) = child {
			self.check_id(id)?;
			if self.elements[id.0].parent.is_some() {
				return Err(TreeError::AlreadyAttached.into());
			}
			let mut cursor = parent;
			while let NodeId::Element(ancestor) = cursor {
				if ancestor == id {
					return Err(TreeError::Cycle.into());
				}
				cursor = match self.elements[ancestor.0].parent {
					Some(p) => p,
					None => break,
				};
			}
		}

		if parent == NodeId::Document {
			match (&child, self.root_index) {
				(Child::Element(_), Some(_)) => return Err(TreeError::MultipleRootElements.into()),
				(Child::Element(_), None) => self.root_index = Some(index),
				(_, Some(root)) if root >= index => self.root_index = Some(root + 1),
				_ => (),
			}
		}
		if let Child::Element(id) = child {
			self.elements[id.0].parent = Some(parent);
		}
		self.children_mut(parent)?.insert(index, child);
		Ok(())
	}

	/// Remove and return the child at `index`. A removed element stays in
	/// the arena, detached. The root element cannot be removed.
	pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<Child> {
		if index >= self.child_count(parent) {
			return Err(TreeError::IndexOutOfBounds(index).into());
		}
		if parent == NodeId::Document {
			match self.root_index {
				Some(root) if root == index => return Err(TreeError::RootRemoval.into()),
				Some(root) if root > index => self.root_index = Some(root - 1),
				_ => (),
			}
		}
		let child = self.children_mut(parent)?.remove(index);
		if let Child::Element(id) = child {
			self.elements[id.0].parent = None;
		}
		Ok(child)
	}

	/// Drop all attributes and children of `id` and return the children.
	/// Child elements stay in the arena, detached.
	pub fn clear_element(&mut self, id: ElementId) -> Result<Vec<Child>> {
		self.check_id(id)?;
		let el = &mut self.elements[id.0];
		el.attributes.clear();
		let children = std::mem::replace(&mut el.children, Vec::new());
		for child in children.iter() {
			if let Child::Element(c) = child {
				self.elements[c.0].parent = None;
			}
		}
		Ok(children)
	}

	/// Position of the first element child of `node` at or after `start`
	/// called `name`; with `namespace` set, only elements in that namespace
	/// match.
	pub fn index_of(&self, node: NodeId, namespace: Option<&str>, name: &str, start: usize) -> Option<usize> {
		self.children(node)
			.iter()
			.enumerate()
			.skip(start)
			.find(|(_, c)| match c.as_element().and_then(|id| self.element(id)) {
				Some(el) => el.name == name && namespace.map_or(true, |ns| el.namespace == ns),
				None => false,
			})
			.map(|(i, _)| i)
	}

	/// The single element child of `node` matching `namespace` and `name`.
	pub fn find_element(&self, node: NodeId, namespace: Option<&str>, name: &str) -> Result<ElementId> {
		let qname = || format!("{{{}}}{}", namespace.unwrap_or(""), name);
		let first = match self.index_of(node, namespace, name, 0) {
			Some(i) => i,
			None => return Err(TreeError::ElementNotFound(qname()).into()),
		};
		if self.index_of(node, namespace, name, first + 1).is_some() {
			return Err(TreeError::AmbiguousElement(qname()).into());
		}
		match self.children(node)[first].as_element() {
			Some(id) => Ok(id),
			None => Err(TreeError::ElementNotFound(qname()).into()),
		}
	}

	/// Resolve `prefix` through the bindings declared on `element` and its
	/// ancestors.
	pub fn namespace_uri(&self, element: ElementId, prefix: &str) -> Option<&str> {
		let mut cursor = Some(element);
		while let Some(id) = cursor {
			let el = self.element(id)?;
			if let Some((_, uri)) = el.prefixes.iter().find(|(p, _)| p == prefix) {
				return Some(uri);
			}
			cursor = match el.parent {
				Some(NodeId::Element(parent)) => Some(parent),
				_ => None,
			};
		}
		None
	}

	/// Serialize all top-level children and flush.
	pub fn write<W: io::Write>(&self, s: &mut Serializer<W>) -> Result<()> {
		self.write_children(&self.children, s)?;
		s.flush()
	}

	/// Serialize a single node and flush.
	pub fn write_node<W: io::Write>(&self, node: NodeId, s: &mut Serializer<W>) -> Result<()> {
		match node {
			NodeId::Document => self.write(s),
			NodeId::Element(id) => {
				self.write_element(id, s)?;
				s.flush()
			}
		}
	}

	fn write_element<W: io::Write>(&self, id: ElementId, s: &mut Serializer<W>) -> Result<()> {
		let el = match self.element(id) {
			Some(el) => el,
			None => return Err(TreeError::UnknownElement(id.0).into()),
		};
		for (prefix, uri) in el.prefixes.iter() {
			s.set_prefix(prefix, uri)?;
		}
		s.start_tag(Some(el.namespace.as_str()), &el.name)?;
		for a in el.attributes.iter() {
			s.attribute(Some(a.namespace.as_str()), &a.name, &a.value)?;
		}
		self.write_children(&el.children, s)?;
		s.end_tag(Some(el.namespace.as_str()), &el.name)
	}

	fn write_children<W: io::Write>(&self, children: &[Child], s: &mut Serializer<W>) -> Result<()> {
		for child in children {
			match child {
				Child::Element(id) => self.write_element(*id, s)?,
				Child::Text(t) => s.text(t)?,
				Child::IgnorableWhitespace(t) => s.ignorable_whitespace(t)?,
				Child::Cdata(t) => s.cdata(t)?,
				Child::Comment(t) => s.comment(t)?,
				Child::EntityRef(name) => s.entity_ref(name)?,
				Child::ProcessingInstruction(t) => s.processing_instruction(t)?,
				Child::DocDecl(t) => s.docdecl(t)?,
			}
		}
		Ok(())
	}
}
