/*!
# Pull parser

[`PullParser`] tokenizes a document on demand: each call to
[`PullParser::advance`] (or [`PullParser::advance_raw`]) moves to the next
event, whose details are then available through accessor methods until the
next call.

There are two ways of advancing:

* [`advance`](PullParser::advance) hides comments, processing instructions
  and the document type declaration, resolves references and merges
  adjacent character data (including CDATA sections) into a single
  [`EventType::Text`] event.
* [`advance_raw`](PullParser::advance_raw) reports every lexical unit as
  its own event, with references as [`EventType::EntityRef`].

## Relaxed mode

With [`ParserOptions::relaxed`] set, errors in the input do not stop the
parser. The first error encountered is available from
[`PullParser::diagnostic`] on the event during which it was found and is
additionally reported as a [`EventType::Comment`] reading `ERR: ...` when
advancing in token mode. Missing end tags are inserted so that every
[`EventType::StartTag`] is balanced by an [`EventType::EndTag`].

## Example

```
use pullxml::{EventType, PullParser};
let mut p = PullParser::new();
p.set_source_str("<greeting lang='en'>Hello &amp; welcome</greeting>");
assert_eq!(p.advance().unwrap(), EventType::StartTag);
assert_eq!(p.name(), Some("greeting"));
assert_eq!(p.attribute_value(None, "lang"), Some("en"));
assert_eq!(p.advance().unwrap(), EventType::Text);
assert_eq!(p.text(), Some("Hello & welcome"));
assert_eq!(p.advance().unwrap(), EventType::EndTag);
assert_eq!(p.advance().unwrap(), EventType::EndDocument);
```
*/
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io;

use smartstring::alias::String as SmartString;

use crate::error::{Error, MisuseError, Result, WFError};
use crate::namespaces::{NamespaceName, NamespaceStack, RcPtr, XMLNS_XML, XMLNS_XMLNS};
use crate::source::SourceCursor;

mod common;
mod entities;
mod raw;

pub use common::{Attribute, EventType, Feature, ParserOptions};
pub use entities::EntityMap;

use common::{ElementFrame, Lookahead};

/// Events produced without consuming input.
#[derive(Debug)]
enum Synthetic {
	/// Closes an empty element tag.
	EndTag,
	/// Closes the innermost element on behalf of a mismatched end tag or
	/// the end of the input.
	ImpliedEndTag { diagnose: bool },
	/// Reports a recorded error as a comment.
	Diagnostic(Error),
}

/// Streaming XML tokenizer.
///
/// See the [module documentation](self) for an overview.
pub struct PullParser<'x> {
	source: Option<SourceCursor<'x>>,
	opts: ParserOptions,
	entities: EntityMap,
	token: bool,

	event: EventType,
	name: Option<SmartString>,
	prefix: Option<SmartString>,
	namespace: Option<NamespaceName>,
	attributes: Vec<Attribute>,
	txt: String,
	whitespace: bool,
	unresolved: bool,
	degenerate: bool,
	diagnostic: Option<Error>,

	elements: Vec<ElementFrame>,
	ns: NamespaceStack,
	pending: VecDeque<Synthetic>,

	version: Option<String>,
	standalone: Option<bool>,
	declared_encoding: Option<String>,
	poison: Option<Error>,
	empty_ns: NamespaceName,
}

impl<'x> PullParser<'x> {
	pub fn new() -> Self {
		Self::with_options(ParserOptions::default())
	}

	pub fn with_options(opts: ParserOptions) -> Self {
		Self {
			source: None,
			opts,
			entities: EntityMap::new(),
			token: false,
			event: EventType::StartDocument,
			name: None,
			prefix: None,
			namespace: None,
			attributes: Vec::new(),
			txt: String::new(),
			whitespace: true,
			unresolved: false,
			degenerate: false,
			diagnostic: None,
			elements: Vec::new(),
			ns: NamespaceStack::new(),
			pending: VecDeque::new(),
			version: None,
			standalone: None,
			declared_encoding: None,
			poison: None,
			empty_ns: RcPtr::from(""),
		}
	}

	fn reset(&mut self, source: SourceCursor<'x>) {
		self.source = Some(source);
		self.entities = EntityMap::new();
		self.event = EventType::StartDocument;
		self.name = None;
		self.prefix = None;
		self.namespace = None;
		self.attributes.clear();
		self.txt.clear();
		self.whitespace = true;
		self.unresolved = false;
		self.degenerate = false;
		self.diagnostic = None;
		self.elements.clear();
		self.ns.reset();
		self.pending.clear();
		self.version = None;
		self.standalone = None;
		self.declared_encoding = None;
		self.poison = None;
	}

	/// Read from a byte stream.
	///
	/// With `encoding` set, the input is decoded with that encoding.
	/// Otherwise the encoding is detected from a byte order mark, the first
	/// characters or the XML declaration, defaulting to UTF-8.
	///
	/// An unknown encoding label fails here. The input is decoded in chunks
	/// as it is read, so a malformed byte sequence is only reported as an
	/// [`EncodingError`](crate::error::EncodingError) by the
	/// [`advance`](Self::advance) call which first decodes its chunk.
	///
	/// Resets all parser state, including entity definitions, but keeps the
	/// feature settings.
	pub fn set_source<R: io::Read + 'x>(&mut self, r: R, encoding: Option<&str>) -> Result<()> {
		let cursor = SourceCursor::from_reader(r, encoding)?;
		self.reset(cursor);
		Ok(())
	}

	/// Read from a string.
	///
	/// Resets all parser state, including entity definitions, but keeps the
	/// feature settings.
	pub fn set_source_str(&mut self, text: &'x str) {
		self.reset(SourceCursor::from_str(text))
	}

	pub fn set_feature(&mut self, feature: Feature, enabled: bool) {
		self.opts.set(feature, enabled)
	}

	pub fn feature(&self, feature: Feature) -> bool {
		self.opts.get(feature)
	}

	pub fn options(&self) -> ParserOptions {
		self.opts
	}

	/// Define the replacement text for `&name;`.
	///
	/// Definitions are dropped when a new source is set.
	pub fn define_entity(&mut self, name: &str, text: &str) {
		self.entities.define(name, text)
	}

	fn check_poison(&self) -> Result<()> {
		match self.poison {
			Some(ref e) => Err(e.clone()),
			None => Ok(()),
		}
	}

	fn poisoned<T>(&mut self, r: Result<T>) -> Result<T> {
		if let Err(ref e) = r {
			match e {
				Error::Misuse(_) => (),
				_ => self.poison = Some(e.clone()),
			}
		}
		r
	}

	fn begin(&mut self, token: bool) -> Result<()> {
		self.check_poison()?;
		self.token = token;
		self.txt.clear();
		self.whitespace = true;
		self.diagnostic = None;
		Ok(())
	}

	fn trace_event(&self) {
		log::trace!(
			"{} at {}:{}",
			self.event,
			self.line(),
			self.column()
		);
	}

	/// Move to the next coalesced event.
	///
	/// Comments, processing instructions and the document type declaration
	/// are skipped. Text, CDATA sections and references which follow each
	/// other are merged into one [`EventType::Text`] event, or
	/// [`EventType::IgnorableWhitespace`] if it is whitespace outside the
	/// root element.
	///
	/// Returns the new event type. Once an error was returned, every further
	/// call returns it again.
	pub fn advance(&mut self) -> Result<EventType> {
		self.begin(false)?;
		let r = self.advance_coalesced();
		let ev = self.poisoned(r)?;
		self.trace_event();
		Ok(ev)
	}

	fn advance_coalesced(&mut self) -> Result<EventType> {
		let mut min = self.next_impl()?;
		while self.continues_run(min)? {
			let ev = self.next_impl()?;
			if ev < min {
				min = ev;
			}
		}
		self.event = match min {
			EventType::IgnorableWhitespace => EventType::IgnorableWhitespace,
			ev if ev.is_text_like() => EventType::Text,
			ev => ev,
		};
		Ok(self.event)
	}

	fn continues_run(&mut self, min: EventType) -> Result<bool> {
		match min {
			EventType::ProcessingInstruction | EventType::Comment | EventType::DocDecl => Ok(true),
			ev if ev.is_text_like() => Ok(self.peek_type()?.continues_text()),
			_ => Ok(false),
		}
	}

	/// Move to the next event without merging or skipping anything.
	///
	/// Every comment, processing instruction, CDATA section, reference and
	/// document type declaration becomes its own event, and in relaxed mode
	/// recorded errors are reported as comments.
	pub fn advance_raw(&mut self) -> Result<EventType> {
		self.begin(true)?;
		let r = self.next_impl();
		let ev = self.poisoned(r)?;
		self.trace_event();
		Ok(ev)
	}

	fn next_impl(&mut self) -> Result<EventType> {
		if self.source.is_none() {
			return Err(MisuseError::NoSource.into());
		}
		if self.event == EventType::EndTag {
			self.elements.pop();
			self.ns.pop_scope();
		}
		self.attributes.clear();
		self.unresolved = false;
		self.degenerate = false;

		if let Some(synthetic) = self.pending.pop_front() {
			match synthetic {
				Synthetic::EndTag => {
					self.expose_top_element();
				}
				Synthetic::ImpliedEndTag { diagnose } => {
					self.expose_top_element();
					if diagnose {
						self.record_next(WFError::MissingEndTag(self.top_raw_name()).into());
					}
				}
				Synthetic::Diagnostic(err) => {
					self.clear_name();
					if self.token {
						let _ = write!(self.txt, "ERR: {}", err);
						self.whitespace = false;
						if self.diagnostic.is_none() {
							self.diagnostic = Some(err);
						}
					}
					self.event = EventType::Comment;
					return Ok(self.event);
				}
			}
			self.event = EventType::EndTag;
			return Ok(self.event);
		}

		self.clear_name();
		loop {
			self.event = match self.peek_type()? {
				Lookahead::Eof if self.elements.is_empty() => EventType::EndDocument,
				Lookahead::Eof => {
					let err: Error = WFError::MissingEndTag(self.top_raw_name()).into();
					if !self.opts.relaxed {
						return Err(err);
					}
					self.expose_top_element();
					self.record_next(err);
					EventType::EndTag
				}
				Lookahead::EntityRef => {
					self.push_entity(true)?;
					EventType::EntityRef
				}
				Lookahead::StartTag => {
					self.parse_start_tag()?;
					EventType::StartTag
				}
				Lookahead::EndTag => self.parse_end_tag()?,
				Lookahead::Text => {
					let resolve = !self.token;
					self.push_text(Some('<'), resolve, false)?;
					if self.elements.is_empty() && self.whitespace {
						EventType::IgnorableWhitespace
					} else {
						EventType::Text
					}
				}
				Lookahead::Legacy => match self.parse_legacy(self.token)? {
					Some(ev) => ev,
					// the XML declaration does not produce an event
					None => continue,
				},
			};
			return Ok(self.event);
		}
	}

	fn clear_name(&mut self) {
		self.name = None;
		self.prefix = None;
		self.namespace = None;
	}

	fn expose_top_element(&mut self) {
		if let Some(frame) = self.elements.last() {
			self.name = Some(frame.name.clone());
			self.prefix = frame.prefix.clone();
			self.namespace = Some(frame.namespace.clone());
		}
	}

	fn top_raw_name(&self) -> String {
		match self.elements.last() {
			Some(frame) => frame.raw.to_string(),
			None => String::new(),
		}
	}

	fn has_pending_diagnostic(&self) -> bool {
		self.pending
			.iter()
			.any(|s| matches!(s, Synthetic::Diagnostic(_)))
	}

	/// Handle malformed input.
	///
	/// Strict mode fails with `err`. Relaxed mode flags the current event
	/// and schedules a diagnostic comment, unless one is already scheduled.
	pub(crate) fn error(&mut self, err: Error) -> Result<()> {
		if !self.opts.relaxed {
			return Err(err);
		}
		log::debug!("recovering from {} at {}:{}", err, self.line(), self.column());
		if !self.has_pending_diagnostic() {
			self.pending.push_back(Synthetic::Diagnostic(err.clone()));
		}
		if self.diagnostic.is_none() {
			self.diagnostic = Some(err);
		}
		Ok(())
	}

	// Like error(), but the diagnostic is reported right after the current
	// event, ahead of anything else which is scheduled.
	fn record_next(&mut self, err: Error) {
		log::debug!("recovering from {} at {}:{}", err, self.line(), self.column());
		if !self.has_pending_diagnostic() {
			self.pending.push_front(Synthetic::Diagnostic(err.clone()));
		}
		if self.diagnostic.is_none() {
			self.diagnostic = Some(err);
		}
	}

	fn source(&mut self) -> Result<&mut SourceCursor<'x>> {
		match self.source.as_mut() {
			Some(s) => Ok(s),
			None => Err(MisuseError::NoSource.into()),
		}
	}

	pub(crate) fn peek(&mut self, offset: usize) -> Result<Option<char>> {
		self.source()?.peek(offset)
	}

	pub(crate) fn read(&mut self) -> Result<Option<char>> {
		self.source()?.read()
	}

	fn peek_type(&mut self) -> Result<Lookahead> {
		Ok(match self.peek(0)? {
			None => Lookahead::Eof,
			Some('&') => Lookahead::EntityRef,
			Some('<') => match self.peek(1)? {
				Some('/') => Lookahead::EndTag,
				Some('?') | Some('!') => Lookahead::Legacy,
				_ => Lookahead::StartTag,
			},
			Some(_) => Lookahead::Text,
		})
	}

	/// Require the current event to be of type `ty` and, if given, to have
	/// namespace `namespace` and name `name`.
	///
	/// An empty `namespace` matches any namespace.
	pub fn require(&self, ty: EventType, namespace: Option<&str>, name: Option<&str>) -> Result<()> {
		let ns_ok = match namespace {
			None | Some("") => true,
			Some(ns) => self.namespace() == Some(ns),
		};
		let name_ok = match name {
			None => true,
			Some(n) => self.name() == Some(n),
		};
		if ty == self.event && ns_ok && name_ok {
			return Ok(());
		}
		let mut expected = ty.to_string();
		if let Some(ns) = namespace {
			let _ = write!(expected, " {{{}}}", ns);
		}
		if let Some(n) = name {
			let _ = write!(expected, " {}", n);
		}
		Err(WFError::UnexpectedEvent {
			expected,
			found: self.position_description(),
		}
		.into())
	}

	/// Skip the current element, including everything it contains.
	///
	/// Must be positioned on a [`EventType::StartTag`]; afterwards the parser
	/// is positioned on the matching [`EventType::EndTag`].
	pub fn skip_subtree(&mut self) -> Result<()> {
		self.require(EventType::StartTag, None, None)?;
		let mut level = 1usize;
		while level > 0 {
			match self.advance()? {
				EventType::StartTag => level += 1,
				EventType::EndTag => level -= 1,
				EventType::EndDocument => return Err(Error::wfeof(crate::errctx::ERRCTX_ELEMENT)),
				_ => (),
			}
		}
		Ok(())
	}

	/// Advance, skipping a whitespace-only text event, and require a start
	/// or end tag.
	pub fn next_tag(&mut self) -> Result<EventType> {
		let mut ev = self.advance()?;
		if ev == EventType::IgnorableWhitespace || (ev == EventType::Text && self.whitespace) {
			ev = self.advance()?;
		}
		match ev {
			EventType::StartTag | EventType::EndTag => Ok(ev),
			_ => Err(WFError::UnexpectedEvent {
				expected: "START_TAG or END_TAG".to_string(),
				found: self.position_description(),
			}
			.into()),
		}
	}

	/// Read the text content of a text-only element.
	///
	/// Must be positioned on a [`EventType::StartTag`]; afterwards the parser
	/// is positioned on the matching [`EventType::EndTag`].
	pub fn next_text(&mut self) -> Result<String> {
		self.require(EventType::StartTag, None, None)?;
		let mut result = String::new();
		if self.advance()? == EventType::Text {
			result.push_str(&self.txt);
			self.advance()?;
		}
		if self.event != EventType::EndTag {
			return Err(WFError::UnexpectedEvent {
				expected: "END_TAG".to_string(),
				found: self.position_description(),
			}
			.into());
		}
		Ok(result)
	}

	/// Type of the current event.
	pub fn event_type(&self) -> EventType {
		self.event
	}

	/// Local name of the current element, or the entity name of an
	/// [`EventType::EntityRef`] in token mode.
	///
	/// Without namespace processing, the name includes any prefix.
	pub fn name(&self) -> Option<&str> {
		self.name.as_ref().map(|s| s.as_str())
	}

	/// Namespace URI of the current element.
	///
	/// Empty if the element is in no namespace or namespace processing is
	/// off; `None` if the current event is not a tag.
	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_ref().map(|s| &**s)
	}

	/// Prefix of the current element as written.
	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_ref().map(|s| s.as_str())
	}

	/// Number of open elements.
	///
	/// On a [`EventType::StartTag`] this includes the new element, on a
	/// [`EventType::EndTag`] it still includes the closed one.
	pub fn depth(&self) -> usize {
		self.elements.len()
	}

	/// Text of the current event.
	///
	/// `None` for document boundaries and tags, and for an unresolved
	/// [`EventType::EntityRef`].
	pub fn text(&self) -> Option<&str> {
		if self.event < EventType::Text || (self.event == EventType::EntityRef && self.unresolved) {
			None
		} else {
			Some(&self.txt)
		}
	}

	/// Line of the last character consumed, starting at 1.
	pub fn line(&self) -> usize {
		self.source.as_ref().map(|s| s.line()).unwrap_or(1)
	}

	/// Column of the last character consumed, starting at 1.
	pub fn column(&self) -> usize {
		self.source.as_ref().map(|s| s.column()).unwrap_or(0)
	}

	pub fn attribute_count(&self) -> usize {
		self.attributes.len()
	}

	pub fn attributes(&self) -> &[Attribute] {
		&self.attributes
	}

	pub fn attribute(&self, index: usize) -> Result<&Attribute> {
		match self.attributes.get(index) {
			Some(a) => Ok(a),
			None => Err(MisuseError::IndexOutOfBounds(index).into()),
		}
	}

	/// Value of the attribute with the given name.
	///
	/// With `namespace` set, only an attribute in that namespace matches.
	pub fn attribute_value(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|a| {
				a.name.as_str() == name
					&& match namespace {
						Some(ns) => &*a.namespace == ns,
						None => true,
					}
			})
			.map(|a| a.value.as_str())
	}

	/// Number of namespace bindings visible at `depth`.
	///
	/// `namespace_count(0)` is always zero; `namespace_count(depth())`
	/// covers the current element.
	pub fn namespace_count(&self, depth: usize) -> Result<usize> {
		if depth > self.depth() {
			return Err(MisuseError::IndexOutOfBounds(depth).into());
		}
		Ok(self.ns.count(depth).unwrap_or(0))
	}

	/// Prefix of the `index`th visible binding; empty for the default
	/// namespace.
	pub fn namespace_prefix(&self, index: usize) -> Result<&str> {
		match self.ns.bindings().get(index) {
			Some(b) => Ok(b.prefix.as_str()),
			None => Err(MisuseError::IndexOutOfBounds(index).into()),
		}
	}

	/// URI of the `index`th visible binding.
	pub fn namespace_uri(&self, index: usize) -> Result<&str> {
		match self.ns.bindings().get(index) {
			Some(b) => Ok(&*b.uri),
			None => Err(MisuseError::IndexOutOfBounds(index).into()),
		}
	}

	/// Resolve a prefix in the current scope; `None` looks up the default
	/// namespace.
	pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<&str> {
		match prefix {
			Some(crate::namespaces::PREFIX_XML) => Some(XMLNS_XML),
			Some(crate::namespaces::PREFIX_XMLNS) => Some(XMLNS_XMLNS),
			Some(p) => self.ns.resolve(p).map(|uri| &**uri),
			None => self.ns.resolve("").map(|uri| &**uri),
		}
	}

	/// Whether the current start tag was written as `<name/>`.
	pub fn is_empty_element_tag(&self) -> Result<bool> {
		match self.event {
			EventType::StartTag => Ok(self.degenerate),
			ev => Err(MisuseError::WrongEventType("is_empty_element_tag", ev).into()),
		}
	}

	/// Whether the text of the current event consists of whitespace only.
	pub fn is_whitespace(&self) -> Result<bool> {
		match self.event {
			EventType::Text | EventType::IgnorableWhitespace | EventType::Cdata => Ok(self.whitespace),
			ev => Err(MisuseError::WrongEventType("is_whitespace", ev).into()),
		}
	}

	/// Encoding of the input: the declared one if the XML declaration named
	/// one, else the detected one. `None` for string sources without a
	/// declaration.
	pub fn input_encoding(&self) -> Option<&str> {
		if let Some(ref enc) = self.declared_encoding {
			return Some(enc);
		}
		self.source
			.as_ref()
			.and_then(|s| s.encoding())
			.map(|e| e.name())
	}

	/// `version` from the XML declaration.
	pub fn xml_version(&self) -> Option<&str> {
		self.version.as_deref()
	}

	/// `standalone` from the XML declaration.
	pub fn standalone(&self) -> Option<bool> {
		self.standalone
	}

	/// The error recovered from while producing the current event (relaxed
	/// mode only).
	pub fn diagnostic(&self) -> Option<&Error> {
		self.diagnostic.as_ref()
	}

	/// Short human readable description of the current event and position,
	/// for error messages.
	pub fn position_description(&self) -> String {
		let mut buf = String::from(self.event.as_str());
		buf.push(' ');
		match self.event {
			EventType::StartTag | EventType::EndTag => {
				buf.push('<');
				if self.event == EventType::EndTag {
					buf.push('/');
				}
				if let Some(ref p) = self.prefix {
					let _ = write!(buf, "{{{}}}{}:", self.namespace().unwrap_or(""), p);
				}
				buf.push_str(self.name().unwrap_or(""));
				for a in self.attributes.iter() {
					buf.push(' ');
					if !a.namespace.is_empty() {
						let _ = write!(buf, "{{{}}}", a.namespace);
						if let Some(ref p) = a.prefix {
							let _ = write!(buf, "{}:", p);
						}
					}
					let _ = write!(buf, "{}='{}'", a.name, a.value);
				}
				buf.push('>');
			}
			EventType::IgnorableWhitespace => (),
			ev if ev >= EventType::Text => {
				if self.txt.chars().count() > 16 {
					let head: String = self.txt.chars().take(16).collect();
					let _ = write!(buf, "{}...", head);
				} else {
					buf.push_str(&self.txt);
				}
			}
			_ => (),
		}
		let _ = write!(buf, "@{}:{}", self.line(), self.column());
		buf
	}
}

impl<'x> Default for PullParser<'x> {
	fn default() -> Self {
		Self::new()
	}
}
