use crate::parser::EventType;

/// Index of an element in the arena of its [`Document`](super::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) usize);

/// Something which can have children: the document itself or an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
	Document,
	Element(ElementId),
}

impl From<ElementId> for NodeId {
	fn from(id: ElementId) -> NodeId {
		NodeId::Element(id)
	}
}

/// A child node, tagged with the kind of event it was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
	Element(ElementId),
	Text(String),
	Cdata(String),
	/// Name of an entity which was not resolved while parsing.
	EntityRef(String),
	IgnorableWhitespace(String),
	ProcessingInstruction(String),
	Comment(String),
	DocDecl(String),
}

impl Child {
	/// Wrap the payload of a non-structural event.
	///
	/// Returns `None` for document boundaries and tags.
	pub fn from_event(ev: EventType, payload: String) -> Option<Child> {
		Some(match ev {
			EventType::Text => Child::Text(payload),
			EventType::Cdata => Child::Cdata(payload),
			EventType::EntityRef => Child::EntityRef(payload),
			EventType::IgnorableWhitespace => Child::IgnorableWhitespace(payload),
			EventType::ProcessingInstruction => Child::ProcessingInstruction(payload),
			EventType::Comment => Child::Comment(payload),
			EventType::DocDecl => Child::DocDecl(payload),
			EventType::StartDocument
			| EventType::EndDocument
			| EventType::StartTag
			| EventType::EndTag => return None,
		})
	}

	/// The event type this child replays as. Elements report
	/// [`EventType::StartTag`].
	pub fn event_type(&self) -> EventType {
		match self {
			Child::Element(_) => EventType::StartTag,
			Child::Text(_) => EventType::Text,
			Child::Cdata(_) => EventType::Cdata,
			Child::EntityRef(_) => EventType::EntityRef,
			Child::IgnorableWhitespace(_) => EventType::IgnorableWhitespace,
			Child::ProcessingInstruction(_) => EventType::ProcessingInstruction,
			Child::Comment(_) => EventType::Comment,
			Child::DocDecl(_) => EventType::DocDecl,
		}
	}

	/// Character data of text, whitespace and CDATA children.
	pub fn text(&self) -> Option<&str> {
		match self {
			Child::Text(s) | Child::Cdata(s) | Child::IgnorableWhitespace(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_element(&self) -> Option<ElementId> {
		match self {
			Child::Element(id) => Some(*id),
			_ => None,
		}
	}
}

/// An attribute stored on an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
	/// Empty for no namespace.
	pub namespace: String,
	pub name: String,
	pub value: String,
}

/// An element node.
///
/// Elements live in the arena of a [`Document`](super::Document); links
/// to children and to the parent are ids into that arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub(crate) namespace: String,
	pub(crate) name: String,
	pub(crate) attributes: Vec<Attr>,
	pub(crate) prefixes: Vec<(String, String)>,
	pub(crate) children: Vec<Child>,
	pub(crate) parent: Option<NodeId>,
}

impl Element {
	pub(crate) fn new(namespace: &str, name: &str) -> Element {
		Element {
			namespace: namespace.to_string(),
			name: name.to_string(),
			attributes: Vec::new(),
			prefixes: Vec::new(),
			children: Vec::new(),
			parent: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn set_name(&mut self, name: &str) {
		self.name = name.to_string();
	}

	/// Namespace URI, empty for no namespace.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn set_namespace(&mut self, namespace: &str) {
		self.namespace = namespace.to_string();
	}

	/// Parent node; `None` while the element is detached.
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	pub fn children(&self) -> &[Child] {
		&self.children
	}

	pub fn child_count(&self) -> usize {
		self.children.len()
	}

	pub fn attributes(&self) -> &[Attr] {
		&self.attributes
	}

	pub fn attribute_count(&self) -> usize {
		self.attributes.len()
	}

	/// Value of the first attribute called `name`; with `namespace` set,
	/// only attributes in that namespace match.
	pub fn attribute_value(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|a| a.name == name && namespace.map_or(true, |ns| a.namespace == ns))
			.map(|a| a.value.as_str())
	}

	/// Set, replace or (with `value` set to `None`) remove an attribute.
	pub fn set_attribute(&mut self, namespace: Option<&str>, name: &str, value: Option<&str>) {
		let namespace = namespace.unwrap_or("");
		let pos = self
			.attributes
			.iter()
			.rposition(|a| a.namespace == namespace && a.name == name);
		match (pos, value) {
			(Some(i), Some(v)) => self.attributes[i].value = v.to_string(),
			(Some(i), None) => {
				self.attributes.remove(i);
			}
			(None, Some(v)) => self.attributes.push(Attr {
				namespace: namespace.to_string(),
				name: name.to_string(),
				value: v.to_string(),
			}),
			(None, None) => (),
		}
	}

	/// Namespace bindings declared on this element, as `(prefix, uri)`.
	pub fn prefixes(&self) -> &[(String, String)] {
		&self.prefixes
	}

	/// Declare a namespace binding on this element.
	pub fn set_prefix(&mut self, prefix: &str, namespace: &str) {
		self.prefixes.push((prefix.to_string(), namespace.to_string()));
	}
}
