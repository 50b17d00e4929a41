/*!
# Streaming XML serializer

[`Serializer`] writes XML text from a sequence of calls mirroring the
parser events. Start tags stay open until the next call which is not an
[`attribute`](Serializer::attribute), so that elements without content can
be written as `<name />`.

Namespaces are handled through a scoped prefix stack: prefixes assigned via
[`set_prefix`](Serializer::set_prefix) before a start tag are declared on
that element, and namespaces without a visible prefix get an automatically
generated one (`n0`, `n1`, ...) declared where it is first needed.

```
use pullxml::Serializer;
let mut s = Serializer::with_output(Vec::new(), false);
s.start_tag(Some("urn:example"), "greeting").unwrap();
s.attribute(None, "lang", "en").unwrap();
s.text("Hello & welcome").unwrap();
s.end_tag(Some("urn:example"), "greeting").unwrap();
let out = s.into_inner().unwrap();
assert_eq!(
	std::str::from_utf8(&out).unwrap(),
	"<n0:greeting xmlns:n0=\"urn:example\" lang=\"en\">Hello &amp; welcome</n0:greeting>",
);
```
*/
use std::fmt;
use std::fmt::Write as _;
use std::io;

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::namespaces::{Binding, NamespaceStack, RcPtr, PREFIX_XML, XMLNS_XML};

// Staged output is handed to the sink once it grows beyond this.
const SPILL_THRESHOLD: usize = 8192;

/// Misuse of the serializer.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
	/// Attributes may only follow a start tag directly.
	AttributeNotAllowed,

	/// An end tag which does not match the innermost open element.
	EndTagMismatch {
		/// `{namespace}name` of the innermost open element.
		expected: String,
		/// `{namespace}name` passed to the end tag call.
		found: String,
	},

	/// An end tag without any open element.
	NoOpenElement,

	/// Output was attempted before [`Serializer::set_output`].
	NoOutput,

	/// An element in no namespace would be written with a non-empty
	/// default namespace declared on it.
	DefaultNamespaceInNoNamespace,
}

impl fmt::Display for EncodeError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::AttributeNotAllowed => f.write_str("illegal position for attribute"),
			Self::EndTagMismatch { expected, found } => {
				write!(f, "</{}> does not match start <{}>", found, expected)
			}
			Self::NoOpenElement => f.write_str("no open element"),
			Self::NoOutput => f.write_str("no output specified"),
			Self::DefaultNamespaceInNoNamespace => {
				f.write_str("cannot set default namespace for elements in no namespace")
			}
		}
	}
}

impl std::error::Error for EncodeError {}

/// Switchable serializer behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializerFeature {
	/// Put every start and end tag on its own line, indented by two spaces
	/// per level. Disabled below any element which received text.
	Indent,
}

/// Escape `data` into `out`.
///
/// Within a quoted value (`quote` set), the quote character and line
/// breaks and tabs are escaped too. Characters outside printable ASCII are
/// escaped numerically unless `unicode` is set.
fn escape(out: &mut BytesMut, data: &str, quote: Option<char>, unicode: bool) {
	let mut last = 0;
	for (i, ch) in data.char_indices() {
		let named: Option<&'static str> = match ch {
			'\n' | '\r' | '\t' if quote.is_none() => continue,
			'\n' | '\r' | '\t' => None,
			'&' => Some("&amp;"),
			'<' => Some("&lt;"),
			'>' => Some("&gt;"),
			'"' if quote == Some('"') => Some("&quot;"),
			'\'' if quote == Some('\'') => Some("&apos;"),
			c if c >= ' ' && (c < '\u{7f}' || unicode) => continue,
			_ => None,
		};
		out.put_slice(data[last..i].as_bytes());
		match named {
			Some(s) => out.put_slice(s.as_bytes()),
			None => {
				let _ = write!(out, "&#{};", ch as u32);
			}
		}
		last = i + ch.len_utf8();
	}
	out.put_slice(data[last..].as_bytes());
}

#[derive(Debug, Clone)]
struct Frame {
	namespace: String,
	prefix: String,
	name: String,
}

impl Frame {
	fn describe(namespace: &str, name: &str) -> String {
		format!("{{{}}}{}", namespace, name)
	}
}

/// Streaming XML serializer writing UTF-8 into an [`io::Write`].
pub struct Serializer<W> {
	out: Option<W>,
	buf: BytesMut,
	write_empty_prefix: bool,
	pending: bool,
	unicode: bool,
	auto: usize,
	depth: usize,
	frames: Vec<Frame>,
	ns: NamespaceStack,
	indent: Vec<bool>,
}

impl<W: io::Write> Serializer<W> {
	/// Create a serializer without output; call
	/// [`set_output`](Self::set_output) before writing.
	pub fn new() -> Self {
		Self {
			out: None,
			buf: BytesMut::new(),
			write_empty_prefix: false,
			pending: false,
			unicode: false,
			auto: 0,
			depth: 0,
			frames: Vec::new(),
			ns: Self::initial_namespaces(),
			indent: vec![false],
		}
	}

	pub fn with_output(out: W, write_empty_prefix: bool) -> Self {
		let mut s = Self::new();
		s.set_output(out, write_empty_prefix);
		s
	}

	fn initial_namespaces() -> NamespaceStack {
		NamespaceStack::seeded(vec![
			Binding::new("", RcPtr::from("")),
			Binding::new(PREFIX_XML, RcPtr::from(XMLNS_XML)),
		])
	}

	/// Direct output to `out` and reset all state.
	///
	/// With `write_empty_prefix` set, an element whose namespace has no
	/// visible prefix declares it as the default namespace instead of
	/// generating a prefix. Attributes always get a named prefix.
	pub fn set_output(&mut self, out: W, write_empty_prefix: bool) {
		self.out = Some(out);
		self.buf.clear();
		self.write_empty_prefix = write_empty_prefix;
		self.pending = false;
		self.unicode = false;
		self.auto = 0;
		self.depth = 0;
		self.frames.clear();
		self.ns = Self::initial_namespaces();
		self.indent = vec![false];
	}

	pub fn set_feature(&mut self, feature: SerializerFeature, enabled: bool) {
		match feature {
			SerializerFeature::Indent => {
				self.ensure_indent_slot(self.depth);
				self.indent[self.depth] = enabled;
			}
		}
	}

	pub fn feature(&self, feature: SerializerFeature) -> bool {
		match feature {
			SerializerFeature::Indent => self.indent.get(self.depth).copied().unwrap_or(false),
		}
	}

	fn ensure_indent_slot(&mut self, depth: usize) {
		if self.indent.len() <= depth {
			self.indent.resize(depth + 1, false);
		}
	}

	fn ensure_output(&self) -> Result<()> {
		match self.out {
			Some(_) => Ok(()),
			None => Err(EncodeError::NoOutput.into()),
		}
	}

	fn spill(&mut self, force: bool) -> Result<()> {
		if !force && self.buf.len() < SPILL_THRESHOLD {
			return Ok(());
		}
		let out = match self.out.as_mut() {
			Some(out) => out,
			None => return Err(EncodeError::NoOutput.into()),
		};
		out.write_all(&self.buf).map_err(Error::io)?;
		self.buf.clear();
		Ok(())
	}

	fn put(&mut self, s: &str) {
		self.buf.put_slice(s.as_bytes());
	}

	fn newline_indent(&mut self, levels: usize) {
		self.put("\r\n");
		for _ in 0..levels {
			self.put("  ");
		}
	}

	/// Finish a pending start tag with `>` (or ` />` if `close` is set),
	/// declaring the namespaces of its scope.
	fn check(&mut self, close: bool) -> Result<()> {
		if !self.pending {
			return Ok(());
		}
		self.depth += 1;
		self.pending = false;
		self.ensure_indent_slot(self.depth);
		self.indent[self.depth] = self.indent[self.depth - 1];

		let no_namespace = self
			.frames
			.last()
			.map_or(true, |f| f.namespace.is_empty());
		for b in self.ns.scope_bindings(self.depth) {
			self.buf.put_slice(b" xmlns");
			if !b.prefix.is_empty() {
				self.buf.put_u8(b':');
				self.buf.put_slice(b.prefix.as_bytes());
			} else if no_namespace && !b.uri.is_empty() {
				return Err(EncodeError::DefaultNamespaceInNoNamespace.into());
			}
			self.buf.put_slice(b"=\"");
			escape(&mut self.buf, &b.uri, Some('"'), self.unicode);
			self.buf.put_u8(b'"');
		}
		self.ns.push_scope();
		self.put(if close { " />" } else { ">" });
		Ok(())
	}

	/// Find the prefix bound to `namespace`, optionally creating one.
	///
	/// Bindings shadowed by a later binding of the same prefix are skipped.
	/// The empty prefix is only considered if `include_default` is set.
	fn get_prefix(&mut self, namespace: &str, create: bool, include_default: bool) -> Option<String> {
		let bindings = self.ns.bindings();
		for (i, b) in bindings.iter().enumerate().rev() {
			if &*b.uri != namespace || (!include_default && b.prefix.is_empty()) {
				continue;
			}
			let shadowed = bindings[i + 1..].iter().any(|later| later.prefix == b.prefix);
			if !shadowed {
				return Some(b.prefix.to_string());
			}
		}
		if !create {
			return None;
		}
		let prefix = if namespace.is_empty() {
			String::new()
		} else {
			loop {
				let candidate = format!("n{}", self.auto);
				self.auto += 1;
				if !bindings.iter().any(|b| b.prefix.as_str() == candidate) {
					log::trace!("auto-generated prefix {} for {}", candidate, namespace);
					break candidate;
				}
			}
		};
		self.ns.declare(&prefix, RcPtr::from(namespace));
		Some(prefix)
	}

	/// Prefix visible for `namespace`, ignoring the default namespace.
	///
	/// With `create` set, a prefix is generated and declared on the next
	/// element if none is visible.
	pub fn prefix_for(&mut self, namespace: &str, create: bool) -> Option<String> {
		self.get_prefix(namespace, create, false)
	}

	/// Bind `prefix` to `namespace` on the next start tag.
	///
	/// Nothing is declared if the binding is already visible. An empty
	/// prefix declares the default namespace.
	pub fn set_prefix(&mut self, prefix: &str, namespace: &str) -> Result<()> {
		self.ensure_output()?;
		self.check(false)?;
		if self.get_prefix(namespace, false, true).as_deref() == Some(prefix) {
			return Ok(());
		}
		self.ns.declare(prefix, RcPtr::from(namespace));
		Ok(())
	}

	/// Write the XML declaration.
	///
	/// An encoding starting with `utf` (in any case) allows non-ASCII
	/// characters to be written unescaped. The output itself is always
	/// UTF-8.
	pub fn start_document(&mut self, encoding: Option<&str>, standalone: Option<bool>) -> Result<()> {
		self.ensure_output()?;
		self.put("<?xml version='1.0' ");
		if let Some(enc) = encoding {
			if enc.to_ascii_lowercase().starts_with("utf") {
				self.unicode = true;
			}
			self.put("encoding='");
			self.put(enc);
			self.put("' ");
		}
		if let Some(sa) = standalone {
			self.put("standalone='");
			self.put(if sa { "yes" } else { "no" });
			self.put("' ");
		}
		self.put("?>");
		self.spill(false)
	}

	/// Open an element; `None` means no namespace.
	pub fn start_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<()> {
		self.ensure_output()?;
		self.check(false)?;
		if self.indent.get(self.depth).copied().unwrap_or(false) {
			self.newline_indent(self.depth);
		}
		let namespace = namespace.unwrap_or("");
		let prefix = if namespace.is_empty() {
			self.get_prefix("", true, true).unwrap_or_default()
		} else {
			match self.get_prefix(namespace, false, true) {
				Some(p) => p,
				None if self.write_empty_prefix && !self.scope_declares_default() => {
					self.ns.declare("", RcPtr::from(namespace));
					String::new()
				}
				None => self.get_prefix(namespace, true, true).unwrap_or_default(),
			}
		};
		if namespace.is_empty() {
			let conflict = self
				.ns
				.scope_bindings(self.depth + 1)
				.iter()
				.any(|b| b.prefix.is_empty() && !b.uri.is_empty());
			if conflict {
				return Err(EncodeError::DefaultNamespaceInNoNamespace.into());
			}
		}
		self.put("<");
		if !prefix.is_empty() {
			self.put(&prefix);
			self.put(":");
		}
		self.put(name);
		self.frames.push(Frame {
			namespace: namespace.to_string(),
			prefix,
			name: name.to_string(),
		});
		self.pending = true;
		self.spill(false)
	}

	fn scope_declares_default(&self) -> bool {
		self.ns
			.scope_bindings(self.depth + 1)
			.iter()
			.any(|b| b.prefix.is_empty())
	}

	/// Add an attribute to the start tag just written.
	///
	/// The value is quoted with `"` unless it contains one.
	pub fn attribute(&mut self, namespace: Option<&str>, name: &str, value: &str) -> Result<()> {
		self.ensure_output()?;
		if !self.pending {
			return Err(EncodeError::AttributeNotAllowed.into());
		}
		let namespace = namespace.unwrap_or("");
		let prefix = if namespace.is_empty() {
			String::new()
		} else {
			self.get_prefix(namespace, true, false).unwrap_or_default()
		};
		self.put(" ");
		if !prefix.is_empty() {
			self.put(&prefix);
			self.put(":");
		}
		self.put(name);
		self.put("=");
		let quote = if value.contains('"') { '\'' } else { '"' };
		self.buf.put_u8(quote as u8);
		escape(&mut self.buf, value, Some(quote), self.unicode);
		self.buf.put_u8(quote as u8);
		self.spill(false)
	}

	/// Close the innermost element, which must have the given namespace and
	/// name. An element without content is written as `<name />`.
	pub fn end_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<()> {
		self.ensure_output()?;
		let namespace = namespace.unwrap_or("");
		let frame = match self.frames.last() {
			Some(f) if f.namespace == namespace && f.name == name => f.clone(),
			Some(f) => {
				return Err(EncodeError::EndTagMismatch {
					expected: Frame::describe(&f.namespace, &f.name),
					found: Frame::describe(namespace, name),
				}
				.into())
			}
			None => return Err(EncodeError::NoOpenElement.into()),
		};
		if self.pending {
			self.check(true)?;
			self.depth -= 1;
		} else {
			self.depth -= 1;
			if self.indent.get(self.depth + 1).copied().unwrap_or(false) {
				self.newline_indent(self.depth);
			}
			self.put("</");
			if !frame.prefix.is_empty() {
				self.put(&frame.prefix);
				self.put(":");
			}
			self.put(&frame.name);
			self.put(">");
		}
		self.frames.pop();
		self.ns.pop_scope();
		self.ns.clear_scope();
		self.spill(false)
	}

	/// Write character data, escaped. Disables indentation inside the
	/// current element.
	pub fn text(&mut self, text: &str) -> Result<()> {
		self.ensure_output()?;
		self.check(false)?;
		self.ensure_indent_slot(self.depth);
		self.indent[self.depth] = false;
		escape(&mut self.buf, text, None, self.unicode);
		self.spill(false)
	}

	pub fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
		self.text(text)
	}

	/// Write a CDATA section. `data` must not contain `]]>`.
	pub fn cdata(&mut self, data: &str) -> Result<()> {
		self.raw_markup("<![CDATA[", data, "]]>")
	}

	pub fn comment(&mut self, text: &str) -> Result<()> {
		self.raw_markup("<!--", text, "-->")
	}

	pub fn processing_instruction(&mut self, text: &str) -> Result<()> {
		self.raw_markup("<?", text, "?>")
	}

	pub fn entity_ref(&mut self, name: &str) -> Result<()> {
		self.raw_markup("&", name, ";")
	}

	/// Write a document type declaration; `text` is everything between
	/// `<!DOCTYPE` and the closing `>`.
	pub fn docdecl(&mut self, text: &str) -> Result<()> {
		self.raw_markup("<!DOCTYPE", text, ">")
	}

	fn raw_markup(&mut self, open: &str, body: &str, close: &str) -> Result<()> {
		self.ensure_output()?;
		self.check(false)?;
		self.put(open);
		self.put(body);
		self.put(close);
		self.spill(false)
	}

	/// Close all open elements and flush.
	pub fn end_document(&mut self) -> Result<()> {
		while let Some(frame) = self.frames.last().cloned() {
			self.end_tag(Some(&frame.namespace), &frame.name)?;
		}
		self.flush()
	}

	/// Finish a pending start tag and hand all output to the sink.
	pub fn flush(&mut self) -> Result<()> {
		self.ensure_output()?;
		self.check(false)?;
		self.spill(true)?;
		match self.out.as_mut() {
			Some(out) => out.flush().map_err(Error::io),
			None => Err(EncodeError::NoOutput.into()),
		}
	}

	/// Number of open elements, including a pending start tag.
	pub fn depth(&self) -> usize {
		if self.pending {
			self.depth + 1
		} else {
			self.depth
		}
	}

	/// Name of the innermost open element.
	pub fn name(&self) -> Option<&str> {
		self.frames.last().map(|f| f.name.as_str())
	}

	/// Namespace of the innermost open element.
	pub fn namespace(&self) -> Option<&str> {
		self.frames.last().map(|f| f.namespace.as_str())
	}

	/// Flush and return the sink.
	pub fn into_inner(mut self) -> Result<W> {
		self.flush()?;
		match self.out.take() {
			Some(out) => Ok(out),
			None => Err(EncodeError::NoOutput.into()),
		}
	}
}

impl<W: io::Write> Default for Serializer<W> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mk() -> Serializer<Vec<u8>> {
		Serializer::with_output(Vec::new(), false)
	}

	fn finish(s: Serializer<Vec<u8>>) -> String {
		String::from_utf8(s.into_inner().unwrap()).unwrap()
	}

	#[test]
	fn escape_text_and_quoted_values() {
		let mut buf = BytesMut::new();
		escape(&mut buf, "a<b>&\"'\n\t", None, false);
		assert_eq!(&buf[..], b"a&lt;b&gt;&amp;\"'\n\t");

		let mut buf = BytesMut::new();
		escape(&mut buf, "\"'\n\r\t", Some('"'), false);
		assert_eq!(&buf[..], b"&quot;'&#10;&#13;&#9;");

		let mut buf = BytesMut::new();
		escape(&mut buf, "'", Some('\''), false);
		assert_eq!(&buf[..], b"&apos;");
	}

	#[test]
	fn escape_non_ascii_unless_unicode() {
		let mut buf = BytesMut::new();
		escape(&mut buf, "é\u{1}@", None, false);
		assert_eq!(&buf[..], b"&#233;&#1;@");

		let mut buf = BytesMut::new();
		escape(&mut buf, "é", None, true);
		assert_eq!(&buf[..], "é".as_bytes());
	}

	#[test]
	fn empty_element_is_self_closed() {
		let mut s = mk();
		s.start_tag(None, "a").unwrap();
		s.end_tag(None, "a").unwrap();
		assert_eq!(finish(s), "<a />");
	}

	#[test]
	fn attributes_pick_quotes() {
		let mut s = mk();
		s.start_tag(None, "a").unwrap();
		s.attribute(None, "x", "say \"hi\"").unwrap();
		s.attribute(None, "y", "it's").unwrap();
		s.text("t").unwrap();
		s.end_tag(None, "a").unwrap();
		assert_eq!(finish(s), "<a x='say \"hi\"' y=\"it's\">t</a>");
	}

	#[test]
	fn attribute_outside_start_tag_is_rejected() {
		let mut s = mk();
		s.start_tag(None, "a").unwrap();
		s.text("x").unwrap();
		match s.attribute(None, "x", "1") {
			Err(Error::Encode(EncodeError::AttributeNotAllowed)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn end_tag_must_match() {
		let mut s = mk();
		s.start_tag(Some("urn:a"), "a").unwrap();
		match s.end_tag(None, "a") {
			Err(Error::Encode(EncodeError::EndTagMismatch { expected, found })) => {
				assert_eq!(expected, "{urn:a}a");
				assert_eq!(found, "{}a");
			}
			other => panic!("unexpected result: {:?}", other),
		}
		let mut s = mk();
		match s.end_tag(None, "a") {
			Err(Error::Encode(EncodeError::NoOpenElement)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn output_is_required() {
		let mut s: Serializer<Vec<u8>> = Serializer::new();
		match s.start_tag(None, "a") {
			Err(Error::Encode(EncodeError::NoOutput)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn auto_prefixes_are_distinct_and_declared_once() {
		let mut s = mk();
		s.start_tag(Some("urn:a"), "x").unwrap();
		s.start_tag(Some("urn:b"), "y").unwrap();
		s.start_tag(Some("urn:a"), "z").unwrap();
		s.end_document().unwrap();
		assert_eq!(
			finish(s),
			"<n0:x xmlns:n0=\"urn:a\"><n1:y xmlns:n1=\"urn:b\"><n0:z /></n1:y></n0:x>"
		);
	}

	#[test]
	fn auto_prefixes_skip_bound_prefixes() {
		let mut s = mk();
		s.set_prefix("n0", "urn:x").unwrap();
		s.start_tag(Some("urn:x"), "a").unwrap();
		s.start_tag(Some("urn:y"), "b").unwrap();
		s.attribute(Some("urn:z"), "c", "1").unwrap();
		s.end_document().unwrap();
		assert_eq!(
			finish(s),
			"<n0:a xmlns:n0=\"urn:x\"><n1:b n2:c=\"1\" xmlns:n1=\"urn:y\" xmlns:n2=\"urn:z\" /></n0:a>"
		);
	}

	#[test]
	fn explicit_prefixes_are_used() {
		let mut s = mk();
		s.set_prefix("p", "urn:p").unwrap();
		s.set_prefix("", "urn:d").unwrap();
		s.start_tag(Some("urn:p"), "a").unwrap();
		s.attribute(Some("urn:p"), "at", "v").unwrap();
		s.start_tag(Some("urn:d"), "b").unwrap();
		s.end_tag(Some("urn:d"), "b").unwrap();
		s.end_tag(Some("urn:p"), "a").unwrap();
		assert_eq!(
			finish(s),
			"<p:a p:at=\"v\" xmlns:p=\"urn:p\" xmlns=\"urn:d\"><b /></p:a>"
		);
	}

	#[test]
	fn no_namespace_child_resets_default_namespace() {
		let mut s = mk();
		s.set_prefix("", "urn:d").unwrap();
		s.start_tag(Some("urn:d"), "a").unwrap();
		s.start_tag(None, "b").unwrap();
		s.end_document().unwrap();
		assert_eq!(finish(s), "<a xmlns=\"urn:d\"><b xmlns=\"\" /></a>");
	}

	#[test]
	fn default_namespace_on_no_namespace_element_is_rejected() {
		let mut s = mk();
		s.set_prefix("", "urn:d").unwrap();
		match s.start_tag(None, "a") {
			Err(Error::Encode(EncodeError::DefaultNamespaceInNoNamespace)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn write_empty_prefix_uses_default_namespace() {
		let mut s = Serializer::with_output(Vec::new(), true);
		s.start_tag(Some("urn:a"), "x").unwrap();
		s.start_tag(Some("urn:a"), "z").unwrap();
		s.attribute(Some("urn:a"), "y", "1").unwrap();
		s.end_document().unwrap();
		assert_eq!(
			finish(s),
			"<x xmlns=\"urn:a\"><z n0:y=\"1\" xmlns:n0=\"urn:a\" /></x>"
		);
	}

	#[test]
	fn indentation_stops_at_mixed_content() {
		let mut s = mk();
		s.set_feature(SerializerFeature::Indent, true);
		s.start_tag(None, "a").unwrap();
		s.start_tag(None, "b").unwrap();
		s.text("t").unwrap();
		s.end_tag(None, "b").unwrap();
		s.start_tag(None, "c").unwrap();
		s.end_tag(None, "c").unwrap();
		s.end_tag(None, "a").unwrap();
		assert_eq!(
			finish(s),
			"\r\n<a>\r\n  <b>t</b>\r\n  <c />\r\n</a>"
		);
	}

	#[test]
	fn document_declaration_and_markup() {
		let mut s = mk();
		s.start_document(Some("UTF-8"), Some(true)).unwrap();
		s.docdecl(" r").unwrap();
		s.start_tag(None, "r").unwrap();
		s.comment(" c ").unwrap();
		s.processing_instruction("pi x").unwrap();
		s.cdata("<&>").unwrap();
		s.entity_ref("foo").unwrap();
		s.text("é").unwrap();
		assert_eq!(s.depth(), 1);
		assert_eq!(s.name(), Some("r"));
		s.end_document().unwrap();
		assert_eq!(
			finish(s),
			"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><!DOCTYPE r><r><!-- c --><?pi x?><![CDATA[<&>]]>&foo;é</r>"
		);
	}
}
