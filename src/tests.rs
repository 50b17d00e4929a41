use crate::dom::{Child, Document, NodeId};
use crate::error::{Error, NWFError, WFError};
use crate::parser::{EventType, ParserOptions, PullParser};
use crate::writer::Serializer;

fn ns_opts() -> ParserOptions {
	ParserOptions::default().process_namespaces(true)
}

fn parse_doc(xml: &str) -> Document {
	let mut p = PullParser::with_options(ns_opts());
	p.set_source_str(xml);
	Document::parse(&mut p).unwrap()
}

fn serialize(doc: &Document) -> String {
	let mut s = Serializer::with_output(Vec::new(), false);
	doc.write(&mut s).unwrap();
	String::from_utf8(s.into_inner().unwrap()).unwrap()
}

// Structure and content of a subtree, with adjacent text merged.
fn describe(doc: &Document, node: NodeId, out: &mut Vec<String>) {
	let mut text: Option<String> = None;
	for child in doc.children(node) {
		if let Child::Text(t) = child {
			text.get_or_insert_with(String::new).push_str(t);
			continue;
		}
		if let Some(t) = text.take() {
			out.push(format!("text {:?}", t));
		}
		match child {
			Child::Element(id) => {
				let el = doc.element(*id).unwrap();
				let mut attrs: Vec<String> = el
					.attributes()
					.iter()
					.map(|a| format!("{{{}}}{}={:?}", a.namespace, a.name, a.value))
					.collect();
				attrs.sort();
				out.push(format!("<{{{}}}{} {}>", el.namespace(), el.name(), attrs.join(" ")));
				describe(doc, NodeId::Element(*id), out);
				out.push("</>".to_string());
			}
			other => out.push(format!("{:?}", other)),
		}
	}
	if let Some(t) = text {
		out.push(format!("text {:?}", t));
	}
}

fn describe_doc(doc: &Document) -> Vec<String> {
	let mut out = Vec::new();
	describe(doc, NodeId::Document, &mut out);
	out
}

#[test]
fn reparse_of_serialized_tree_is_identical() {
	let docs = [
		"<r a='1' b=\"x&quot;y\">text &lt; more<c/><!-- note --><?pi data?><![CDATA[ raw <stuff> ]]></r>",
		"<x:r xmlns:x='urn:x' xmlns='urn:d'><e x:at='v'>t</e><f xmlns=''/></x:r>",
		"<?xml version='1.0'?>\n<!DOCTYPE r>\n<r>\n  <i>caf\u{e9} &amp; more</i>\n  <i/>\n</r>\n",
	];
	for src in docs.iter() {
		let first = parse_doc(src);
		let text = serialize(&first);
		let second = parse_doc(&text);
		assert_eq!(describe_doc(&first), describe_doc(&second), "via {}", text);
	}
}

#[test]
fn depth_follows_open_elements_even_when_recovering() {
	let mut p = PullParser::with_options(ParserOptions::default().relaxed(true));
	p.set_source_str("<a><b><c></a><d>x</q></d><e>");
	let mut open = 0usize;
	loop {
		match p.advance_raw().unwrap() {
			EventType::StartTag => {
				open += 1;
				assert_eq!(p.depth(), open);
			}
			EventType::EndTag => {
				assert_eq!(p.depth(), open);
				open -= 1;
			}
			EventType::EndDocument => {
				assert_eq!(p.depth(), 0);
				break;
			}
			_ => assert_eq!(p.depth(), open),
		}
	}
	assert_eq!(open, 0);
}

#[test]
fn empty_element_tag_is_start_then_end() {
	fn step(p: &mut PullParser<'_>, raw: bool) -> crate::Result<EventType> {
		if raw {
			p.advance_raw()
		} else {
			p.advance()
		}
	}

	for &raw in [false, true].iter() {
		let mut p = PullParser::new();
		p.set_source_str("<a/>");
		assert_eq!(step(&mut p, raw).unwrap(), EventType::StartTag);
		assert!(p.is_empty_element_tag().unwrap());
		assert_eq!(p.depth(), 1);
		assert_eq!(step(&mut p, raw).unwrap(), EventType::EndTag);
		assert_eq!(p.name(), Some("a"));
		assert_eq!(step(&mut p, raw).unwrap(), EventType::EndDocument);
	}
}

#[test]
fn relaxed_mismatch_inserts_flagged_end_tag() {
	let mut p = PullParser::with_options(ParserOptions::default().relaxed(true));
	p.set_source_str("<a><b></a>");
	assert_eq!(p.advance_raw().unwrap(), EventType::StartTag);
	assert_eq!(p.advance_raw().unwrap(), EventType::StartTag);
	assert_eq!(p.advance_raw().unwrap(), EventType::EndTag);
	assert_eq!(p.name(), Some("b"));
	match p.diagnostic() {
		Some(Error::NotWellFormed(WFError::ElementMismatch { expected, found })) => {
			assert_eq!(expected, "b");
			assert_eq!(found, "a");
		}
		other => panic!("unexpected diagnostic: {:?}", other),
	}
	assert_eq!(p.advance_raw().unwrap(), EventType::Comment);
	assert_eq!(p.text(), Some("ERR: not-well-formed: expected: /b read: a"));
	assert_eq!(p.advance_raw().unwrap(), EventType::EndTag);
	assert_eq!(p.name(), Some("a"));
	assert!(p.diagnostic().is_none());
	assert_eq!(p.advance_raw().unwrap(), EventType::EndDocument);
}

#[test]
fn strict_mismatch_fails_before_any_end_tag() {
	let mut p = PullParser::new();
	p.set_source_str("<a><b></a>");
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	match p.advance() {
		Err(Error::NotWellFormed(WFError::ElementMismatch { .. })) => (),
		other => panic!("unexpected result: {:?}", other),
	}
	match p.advance() {
		Err(Error::NotWellFormed(WFError::ElementMismatch { .. })) => (),
		other => panic!("unexpected result: {:?}", other),
	}
}

#[test]
fn prefixed_element_resolves_through_outer_declaration() {
	let mut p = PullParser::with_options(ns_opts());
	p.set_source_str("<a xmlns:p=\"urn:x\"><p:b/></a>");
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.attribute_count(), 0);
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.name(), Some("b"));
	assert_eq!(p.prefix(), Some("p"));
	assert_eq!(p.namespace(), Some("urn:x"));
	assert_eq!(p.lookup_namespace(Some("p")), Some("urn:x"));
}

#[test]
fn undefined_prefix_fails_in_strict_mode() {
	let mut p = PullParser::with_options(ns_opts());
	p.set_source_str("<a xmlns:p=\"urn:x\"><c:b/></a>");
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	match p.advance() {
		Err(Error::NotNamespaceWellFormed(NWFError::UndeclaredNamespacePrefix(prefix))) => {
			assert_eq!(prefix, "c")
		}
		other => panic!("unexpected result: {:?}", other),
	}
}

#[test]
fn references_expand() {
	let mut p = PullParser::new();
	p.set_source_str("<r>&amp;&#65;&#x41;</r>");
	p.advance().unwrap();
	assert_eq!(p.advance().unwrap(), EventType::Text);
	assert_eq!(p.text(), Some("&AA"));
}

#[test]
fn unknown_entity_fails_strict_and_survives_raw() {
	let mut p = PullParser::new();
	p.set_source_str("<r>&foo;</r>");
	p.advance().unwrap();
	match p.advance() {
		Err(Error::NotWellFormed(WFError::UndeclaredEntity(name))) => assert_eq!(name, "foo"),
		other => panic!("unexpected result: {:?}", other),
	}

	let mut p = PullParser::new();
	p.set_source_str("<r a='x&foo;'>&foo;</r>");
	assert_eq!(p.advance_raw().unwrap(), EventType::StartTag);
	assert_eq!(p.attribute_value(None, "a"), Some("x&foo;"));
	assert_eq!(p.advance_raw().unwrap(), EventType::EntityRef);
	assert_eq!(p.name(), Some("foo"));
	assert_eq!(p.text(), None);
	assert_eq!(p.advance_raw().unwrap(), EventType::EndTag);
}

fn utf16le(s: &str) -> Vec<u8> {
	s.encode_utf16().flat_map(|u| u.to_le_bytes().to_vec()).collect()
}

fn utf16be(s: &str) -> Vec<u8> {
	s.encode_utf16().flat_map(|u| u.to_be_bytes().to_vec()).collect()
}

#[test]
fn byte_order_mark_selects_utf16le() {
	let mut data = vec![0xff, 0xfe];
	data.extend(utf16le("<a>\u{e9}</a>"));
	let mut p = PullParser::new();
	p.set_source(&data[..], None).unwrap();
	assert_eq!(p.input_encoding(), Some("UTF-16LE"));
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.advance().unwrap(), EventType::Text);
	assert_eq!(p.text(), Some("\u{e9}"));
}

#[test]
fn utf8_byte_order_mark_is_stripped() {
	let mut data = vec![0xef, 0xbb, 0xbf];
	data.extend_from_slice(b"<a/>");
	let mut p = PullParser::new();
	p.set_source(&data[..], None).unwrap();
	assert_eq!(p.input_encoding(), Some("UTF-8"));
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.name(), Some("a"));
}

#[test]
fn utf16be_declaration_without_bom_is_detected() {
	let data = utf16be("<?xml version='1.0'?><a/>");
	let mut p = PullParser::new();
	p.set_source(&data[..], None).unwrap();
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.input_encoding(), Some("UTF-16BE"));
	assert_eq!(p.xml_version(), Some("1.0"));
}

#[test]
fn declared_legacy_encoding_is_honoured() {
	let data = b"<?xml version='1.0' encoding='ISO-8859-1'?><a>\xe9</a>";
	let mut p = PullParser::new();
	p.set_source(&data[..], None).unwrap();
	p.advance().unwrap();
	assert_eq!(p.advance().unwrap(), EventType::Text);
	assert_eq!(p.text(), Some("\u{e9}"));
	assert_eq!(p.input_encoding(), Some("ISO-8859-1"));
}

#[test]
fn auto_prefixes_are_declared_once_and_parse_back() {
	let mut s = Serializer::with_output(Vec::new(), false);
	s.start_tag(Some("urn:one"), "a").unwrap();
	s.start_tag(Some("urn:two"), "b").unwrap();
	s.text("x").unwrap();
	s.end_tag(Some("urn:two"), "b").unwrap();
	s.end_tag(Some("urn:one"), "a").unwrap();
	let out = String::from_utf8(s.into_inner().unwrap()).unwrap();
	assert_eq!(out.matches("xmlns:n0=").count(), 1);
	assert_eq!(out.matches("xmlns:n1=").count(), 1);

	let mut p = PullParser::with_options(ns_opts());
	p.set_source_str(&out);
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.namespace(), Some("urn:one"));
	assert_eq!(p.advance().unwrap(), EventType::StartTag);
	assert_eq!(p.namespace(), Some("urn:two"));
	assert_ne!(p.prefix(), Some("n0"));
}
