/*!
# Document trees

A small generic tree on top of the pull parser. [`Document::parse`] reads
the token stream of a [`PullParser`](crate::PullParser) into an arena of
[`Element`]s, and [`Document::write`] replays the tree through a
[`Serializer`](crate::Serializer).

```
use pullxml::{Document, PullParser, Serializer};

let mut p = PullParser::new();
p.set_source_str("<list><item>one</item><item/></list>");
let doc = Document::parse(&mut p).unwrap();
let root = doc.root_element().unwrap();
assert_eq!(doc.element(root).unwrap().child_count(), 2);

let mut s = Serializer::with_output(Vec::new(), false);
doc.write(&mut s).unwrap();
assert_eq!(
	std::str::from_utf8(&s.into_inner().unwrap()).unwrap(),
	"<list><item>one</item><item></item></list>",
);
```
*/
use std::error;
use std::fmt;

mod document;
pub mod flat;
mod node;

pub use document::Document;
pub use flat::{to_flat_mapping, FlatFlags};
pub use node::{Attr, Child, Element, ElementId, NodeId};

/// A tree operation which would break the document structure.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
	/// A second element was added at the top level.
	MultipleRootElements,
	/// The document has no root element.
	NoRootElement,
	/// The element already has a parent.
	AlreadyAttached,
	/// The element would become its own ancestor.
	Cycle,
	/// A child index past the end of the child list.
	IndexOutOfBounds(usize),
	/// The root element cannot be removed from the document.
	RootRemoval,
	/// An element id which does not belong to the document.
	UnknownElement(usize),
	/// No element child with the given `{namespace}name`.
	ElementNotFound(String),
	/// More than one element child with the given `{namespace}name`.
	AmbiguousElement(String),
}

impl error::Error for TreeError {}

impl fmt::Display for TreeError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::MultipleRootElements => f.write_str("document already has a root element"),
			Self::NoRootElement => f.write_str("document has no root element"),
			Self::AlreadyAttached => f.write_str("element already has a parent"),
			Self::Cycle => f.write_str("element cannot be added below itself"),
			Self::IndexOutOfBounds(i) => write!(f, "child index {} out of bounds", i),
			Self::RootRemoval => f.write_str("cannot remove the root element"),
			Self::UnknownElement(i) => write!(f, "element #{} does not belong to this document", i),
			Self::ElementNotFound(name) => write!(f, "element {} not found", name),
			Self::AmbiguousElement(name) => write!(f, "element {} found more than once", name),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;
	use crate::parser::{ParserOptions, PullParser};
	use crate::writer::Serializer;

	fn parse_with(xml: &str, opts: ParserOptions) -> Document {
		let mut p = PullParser::with_options(opts);
		p.set_source_str(xml);
		Document::parse(&mut p).unwrap()
	}

	fn parse(xml: &str) -> Document {
		parse_with(xml, ParserOptions::default().process_namespaces(true))
	}

	fn write(doc: &Document) -> String {
		let mut s = Serializer::with_output(Vec::new(), false);
		doc.write(&mut s).unwrap();
		String::from_utf8(s.into_inner().unwrap()).unwrap()
	}

	#[test]
	fn empty_and_self_closing_elements_look_alike() {
		let a = parse("<a/>");
		let b = parse("<a></a>");
		let ra = a.root_element().unwrap();
		let rb = b.root_element().unwrap();
		assert_eq!(a.element(ra), b.element(rb));
		assert_eq!(
			a.children(NodeId::Element(ra)),
			&[Child::IgnorableWhitespace(String::new())]
		);
	}

	#[test]
	fn token_kinds_are_kept() {
		let d = parse("<!DOCTYPE r><r>a&amp;<![CDATA[c]]><!--x--><?pi d?></r>");
		match d.children(NodeId::Document) {
			[Child::DocDecl(dd), Child::Element(_)] => assert_eq!(dd, " r"),
			other => panic!("unexpected children: {:?}", other),
		}
		let r = d.root_element().unwrap();
		assert_eq!(
			d.children(r.into()),
			&[
				Child::Text("a".into()),
				Child::Text("&".into()),
				Child::Cdata("c".into()),
				Child::Comment("x".into()),
				Child::ProcessingInstruction("pi d".into()),
			]
		);
	}

	#[test]
	fn namespace_bindings_and_attributes_are_captured() {
		let d = parse("<a xmlns:p='urn:p' p:x='1' y='2'><p:b/></a>");
		let a = d.root_element().unwrap();
		let el = d.element(a).unwrap();
		assert_eq!(el.prefixes(), &[("p".to_string(), "urn:p".to_string())]);
		assert_eq!(el.attribute_value(Some("urn:p"), "x"), Some("1"));
		assert_eq!(el.attribute_value(None, "y"), Some("2"));
		let b = d.find_element(a.into(), Some("urn:p"), "b").unwrap();
		assert_eq!(d.element(b).unwrap().namespace(), "urn:p");
		assert_eq!(d.element(b).unwrap().parent(), Some(NodeId::Element(a)));
		assert_eq!(d.namespace_uri(b, "p"), Some("urn:p"));
		assert_eq!(d.namespace_uri(b, "q"), None);
	}

	#[test]
	fn encoding_and_standalone_come_from_the_declaration() {
		let d = parse("<?xml version='1.0' encoding='UTF-8' standalone='yes'?><r/>");
		assert_eq!(d.encoding(), Some("UTF-8"));
		assert_eq!(d.standalone(), Some(true));
	}

	#[test]
	fn parse_requires_a_root_element() {
		let mut p = PullParser::new();
		p.set_source_str("<!-- nothing -->");
		match Document::parse(&mut p) {
			Err(Error::Tree(TreeError::NoRootElement)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn unresolved_entities_stay_references() {
		let d = parse_with("<r>&foo;</r>", ParserOptions::default().relaxed(true));
		let r = d.root_element().unwrap();
		assert_eq!(d.children(r.into()), &[Child::EntityRef("foo".into())]);
		assert_eq!(write(&d), "<r>&foo;</r>");
	}

	#[test]
	fn round_trip_is_stable() {
		let src = "<a xmlns='urn:d' xmlns:p='urn:p' p:k='v &amp; w'><b>t<![CDATA[<c>]]></b><p:e/><!--n--></a>";
		let first = parse(src);
		let out = write(&first);
		let second = parse(&out);
		let r1 = first.root_element().unwrap();
		let r2 = second.root_element().unwrap();
		assert_eq!(first.element(r1).unwrap().attributes(), second.element(r2).unwrap().attributes());
		assert_eq!(write(&second), out);
	}

	#[test]
	fn root_is_unique_and_not_removable() {
		let mut d = Document::new();
		let a = d.create_element(None, "a");
		let b = d.create_element(None, "b");
		d.add_child(NodeId::Document, None, Child::Comment("c".into()))
			.unwrap();
		d.add_child(NodeId::Document, None, Child::Element(a)).unwrap();
		assert_eq!(d.root_element().unwrap(), a);
		match d.add_child(NodeId::Document, None, Child::Element(b)) {
			Err(Error::Tree(TreeError::MultipleRootElements)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		d.add_child(NodeId::Document, Some(0), Child::Comment("first".into()))
			.unwrap();
		assert_eq!(d.root_element().unwrap(), a);
		match d.remove_child(NodeId::Document, 2) {
			Err(Error::Tree(TreeError::RootRemoval)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		d.remove_child(NodeId::Document, 0).unwrap();
		assert_eq!(d.root_element().unwrap(), a);
		assert_eq!(write(&d), "<!--c--><a />");
	}

	#[test]
	fn attach_rules() {
		let mut d = Document::new();
		let a = d.create_element(None, "a");
		let b = d.create_element(Some("urn:b"), "b");
		d.add_child(a.into(), None, Child::Element(b)).unwrap();
		match d.add_child(a.into(), None, Child::Element(b)) {
			Err(Error::Tree(TreeError::AlreadyAttached)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match d.add_child(b.into(), None, Child::Element(a)) {
			Err(Error::Tree(TreeError::Cycle)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match d.add_child(a.into(), Some(5), Child::Text("x".into())) {
			Err(Error::Tree(TreeError::IndexOutOfBounds(5))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match d.remove_child(a.into(), 0).unwrap() {
			Child::Element(id) => assert_eq!(id, b),
			other => panic!("unexpected child: {:?}", other),
		}
		assert_eq!(d.element(b).unwrap().parent(), None);
		d.add_child(b.into(), None, Child::Element(a)).unwrap();
		let removed = d.clear_element(b).unwrap();
		assert_eq!(removed, vec![Child::Element(a)]);
		assert_eq!(d.element(a).unwrap().parent(), None);
		assert_eq!(d.child_count(b.into()), 0);
	}

	#[test]
	fn find_element_wants_exactly_one_match() {
		let d = parse("<r><x/><x/><y/></r>");
		let r = d.root_element().unwrap();
		assert_eq!(d.index_of(r.into(), None, "x", 1), Some(1));
		match d.find_element(r.into(), None, "x") {
			Err(Error::Tree(TreeError::AmbiguousElement(name))) => assert_eq!(name, "{}x"),
			other => panic!("unexpected result: {:?}", other),
		}
		match d.find_element(r.into(), None, "z") {
			Err(Error::Tree(TreeError::ElementNotFound(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		assert!(d.find_element(r.into(), Some(""), "y").is_ok());
	}
}
