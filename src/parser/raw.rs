/*!
# Token scanners

The pieces of [`PullParser`] which consume characters: tags, attributes,
text, references and the `<?`/`<!` constructs.
*/
use smartstring::alias::String as SmartString;

use crate::errctx::*;
use crate::error::{Error, NWFError, Result, WFError};
use crate::namespaces::{NamespaceName, RcPtr, PREFIX_XML, PREFIX_XMLNS, XMLNS_XML, XMLNS_XMLNS};
use crate::selectors::{CharSelector, CLASS_BLANK, CLASS_ENTITY, CLASS_NAME, CLASS_NAMESTART};

use super::common::{Attribute, ElementFrame, EventType};
use super::{PullParser, Synthetic};

impl<'x> PullParser<'x> {
	pub(super) fn push(&mut self, c: char) {
		self.whitespace &= CLASS_BLANK.select(c);
		self.txt.push(c);
	}

	fn push_literal_reference(&mut self, code: &str) {
		self.push('&');
		for c in code.chars() {
			self.push(c);
		}
		self.push(';');
	}

	fn skip(&mut self) -> Result<()> {
		while let Some(c) = self.peek(0)? {
			if !CLASS_BLANK.select(c) {
				break;
			}
			self.read()?;
		}
		Ok(())
	}

	fn read_expect(&mut self, expected: char, ctx: &'static str) -> Result<()> {
		match self.read()? {
			Some(c) if c == expected => Ok(()),
			Some(c) => self.error(WFError::UnexpectedChar(ctx, c, Some(expected)).into()),
			None => self.error(Error::wfeof(ctx)),
		}
	}

	/// Read a name.
	///
	/// In relaxed mode, a character which may only continue a name is
	/// accepted at the start too; anything else yields an empty name without
	/// consuming input.
	fn read_name(&mut self, ctx: &'static str) -> Result<SmartString> {
		let mut name = SmartString::new();
		match self.peek(0)? {
			None => {
				self.error(WFError::NameExpected(ctx).into())?;
				return Ok(name);
			}
			Some(c) if !CLASS_NAMESTART.select(c) => {
				self.error(WFError::NameExpected(ctx).into())?;
				if !CLASS_NAME.select(c) {
					return Ok(name);
				}
			}
			Some(_) => (),
		}
		loop {
			match self.read()? {
				Some(c) => name.push(c),
				None => break,
			}
			match self.peek(0)? {
				Some(c) if CLASS_NAME.select(c) => (),
				_ => break,
			}
		}
		Ok(name)
	}

	/// Append character data up to `delim` (or, without one, up to
	/// whitespace or `>`) to the text buffer.
	///
	/// References are resolved if `resolve` is set; otherwise scanning stops
	/// in front of them.
	pub(super) fn push_text(
		&mut self,
		delim: Option<char>,
		resolve: bool,
		in_attribute: bool,
	) -> Result<()> {
		let mut brackets = 0usize;
		loop {
			let next = match self.peek(0)? {
				Some(c) => c,
				None => break,
			};
			match delim {
				Some(d) if next == d => break,
				None if CLASS_BLANK.select(next) || next == '>' => break,
				_ => (),
			}
			if next == '&' {
				if !resolve {
					break;
				}
				self.push_entity(false)?;
			} else {
				self.read()?;
				self.push(if next == '\n' && in_attribute { ' ' } else { next });
			}
			if next == '>' && brackets >= 2 && !in_attribute {
				self.error(WFError::InvalidSequence(ERRCTX_TEXT, "]]>").into())?;
			}
			if next == ']' {
				brackets += 1;
			} else {
				brackets = 0;
			}
		}
		Ok(())
	}

	/// Consume a reference starting at `&` and append its replacement text.
	///
	/// `standalone` is set when the reference is an event of its own; in
	/// token mode it then keeps its name and an unresolved reference has no
	/// text at all. Elsewhere unresolved references are kept literally.
	pub(super) fn push_entity(&mut self, standalone: bool) -> Result<()> {
		self.read()?;
		let amp = self.txt.len();
		self.push('&');
		let start = self.txt.len();
		loop {
			match self.peek(0)? {
				Some(';') => {
					self.read()?;
					break;
				}
				Some(c) if CLASS_ENTITY.select(c) => {
					self.read()?;
					self.push(c);
				}
				// the partial reference stays in the text
				None => return self.error(Error::wfeof(ERRCTX_REF)),
				_ => return self.error(WFError::UnterminatedReference.into()),
			}
		}

		let code = self.txt[start..].to_string();
		self.txt.truncate(amp);
		if standalone && self.token {
			self.name = Some(code.as_str().into());
		}

		if let Some(num) = code.strip_prefix('#') {
			let value = match num.strip_prefix('x') {
				Some(hex) => u32::from_str_radix(hex, 16),
				None => num.parse::<u32>(),
			};
			match value.ok().and_then(std::char::from_u32) {
				Some(c) => self.push(c),
				None => {
					self.error(WFError::InvalidCharReference(code.clone()).into())?;
					self.push_literal_reference(&code);
				}
			}
			return Ok(());
		}

		match self.entities.get(&code).map(String::from) {
			Some(text) => {
				for c in text.chars() {
					self.push(c);
				}
			}
			None => {
				self.unresolved = true;
				if !self.token {
					self.error(WFError::UndeclaredEntity(code.clone()).into())?;
				}
				if !(standalone && self.token) {
					self.push_literal_reference(&code);
				}
			}
		}
		Ok(())
	}

	/// Scan attributes up to and including the end of the tag.
	///
	/// In an XML declaration the tag ends with `?>`, otherwise with `>` or
	/// `/>`; the latter marks the element as degenerate.
	fn scan_attributes(&mut self, xmldecl: bool) -> Result<Vec<Attribute>> {
		let ctx = if xmldecl {
			ERRCTX_XML_DECL
		} else {
			ERRCTX_ELEMENT
		};
		let mut attrs = Vec::new();
		loop {
			self.skip()?;
			let c = match self.peek(0)? {
				Some(c) => c,
				None => {
					self.error(Error::wfeof(ctx))?;
					break;
				}
			};
			if xmldecl {
				if c == '?' {
					self.read()?;
					self.read_expect('>', ctx)?;
					break;
				}
			} else if c == '/' {
				self.degenerate = true;
				self.read()?;
				self.skip()?;
				self.read_expect('>', ctx)?;
				break;
			} else if c == '>' {
				self.read()?;
				break;
			}

			let name = self.read_name(ERRCTX_NAME)?;
			if name.is_empty() {
				break;
			}
			self.skip()?;
			let value = if self.peek(0)? != Some('=') {
				self.error(WFError::MissingAttributeValue(name.to_string()).into())?;
				"1".to_string()
			} else {
				self.read()?;
				self.skip()?;
				let delim = match self.peek(0)? {
					Some(q) if q == '\'' || q == '"' => {
						self.read()?;
						Some(q)
					}
					_ => {
						self.error(WFError::MissingValueDelimiter(name.to_string()).into())?;
						None
					}
				};
				let mark = self.txt.len();
				let whitespace = self.whitespace;
				self.push_text(delim, true, true)?;
				let value = self.txt[mark..].to_string();
				self.txt.truncate(mark);
				self.whitespace = whitespace;
				if let Some(d) = delim {
					self.read_expect(d, ERRCTX_ATTVAL)?;
				}
				value
			};
			attrs.push(Attribute {
				namespace: self.empty_ns.clone(),
				prefix: None,
				name,
				value,
			});
		}
		Ok(attrs)
	}

	fn lookup_prefix(&self, prefix: &str) -> Option<NamespaceName> {
		match prefix {
			PREFIX_XML => Some(RcPtr::from(XMLNS_XML)),
			PREFIX_XMLNS => Some(RcPtr::from(XMLNS_XMLNS)),
			p => self.ns.resolve(p).cloned(),
		}
	}

	/// Move `xmlns` attributes into the namespace stack and resolve the
	/// prefixes of the remaining attributes and of the element name `raw`.
	///
	/// Returns namespace, prefix and local name of the element.
	fn adjust_nsp(
		&mut self,
		raw: &str,
	) -> Result<(NamespaceName, Option<SmartString>, SmartString)> {
		let mut any_prefixed = false;
		let mut i = self.attributes.len();
		while i > 0 {
			i -= 1;
			let owned = self.attributes[i].name.clone();
			let full = owned.as_str();
			let declared = if full == PREFIX_XMLNS {
				""
			} else if let Some(p) = full.strip_prefix("xmlns:") {
				p
			} else {
				any_prefixed |= full.contains(':');
				continue;
			};
			let attr = self.attributes.remove(i);
			log::trace!("binding prefix {:?} to {:?}", declared, attr.value);
			self.ns.declare(declared, RcPtr::from(attr.value.as_str()));
			if !declared.is_empty() && attr.value.is_empty() {
				self.error(NWFError::EmptyNamespaceUri(declared.to_string()).into())?;
			}
		}

		if any_prefixed {
			let mut i = self.attributes.len();
			while i > 0 {
				i -= 1;
				let owned = self.attributes[i].name.clone();
				let full = owned.as_str();
				let cut = match full.find(':') {
					Some(cut) => cut,
					None => continue,
				};
				if cut == 0 {
					self.error(NWFError::EmptyPrefix(full.to_string()).into())?;
				}
				let (prefix, local) = (&full[..cut], &full[cut + 1..]);
				let namespace = match self.lookup_prefix(prefix) {
					Some(ns) => ns,
					None => {
						self.error(NWFError::UndeclaredNamespacePrefix(prefix.to_string()).into())?;
						self.empty_ns.clone()
					}
				};
				let attr = &mut self.attributes[i];
				attr.namespace = namespace;
				attr.prefix = Some(prefix.into());
				attr.name = local.into();
			}
		}

		let (prefix, local) = match raw.find(':') {
			Some(cut) => {
				if cut == 0 {
					self.error(NWFError::EmptyPrefix(raw.to_string()).into())?;
				}
				(Some(SmartString::from(&raw[..cut])), SmartString::from(&raw[cut + 1..]))
			}
			None => (None, SmartString::from(raw)),
		};
		let namespace = match prefix {
			Some(ref p) => self.lookup_prefix(p),
			None => self.ns.resolve("").cloned(),
		};
		let namespace = match namespace {
			Some(ns) => ns,
			None => {
				if let Some(ref p) = prefix {
					self.error(NWFError::UndeclaredNamespacePrefix(p.to_string()).into())?;
				}
				self.empty_ns.clone()
			}
		};
		Ok((namespace, prefix, local))
	}

	pub(super) fn parse_start_tag(&mut self) -> Result<()> {
		self.read()?;
		let raw = self.read_name(ERRCTX_ELEMENT)?;
		self.attributes = self.scan_attributes(false)?;
		self.ns.push_scope();
		let (namespace, prefix, name) = if self.opts.process_namespaces {
			self.adjust_nsp(&raw)?
		} else {
			(self.empty_ns.clone(), None, raw.clone())
		};
		self.elements.push(ElementFrame {
			namespace: namespace.clone(),
			prefix: prefix.clone(),
			name: name.clone(),
			raw,
		});
		self.namespace = Some(namespace);
		self.prefix = prefix;
		self.name = Some(name);
		if self.degenerate {
			self.pending.push_front(Synthetic::EndTag);
		}
		Ok(())
	}

	/// Parse an end tag.
	///
	/// Returns [`EventType::Comment`] for an end tag which does not close
	/// any open element (relaxed mode only).
	pub(super) fn parse_end_tag(&mut self) -> Result<EventType> {
		self.read()?;
		self.read()?;
		let name = self.read_name(ERRCTX_ELEMENT_FOOT)?;
		self.skip()?;
		self.read_expect('>', ERRCTX_ELEMENT_FOOT)?;

		let top = match self.elements.last() {
			Some(frame) => frame.raw.clone(),
			None => {
				self.error(WFError::ElementStackEmpty(name.to_string()).into())?;
				return Ok(EventType::Comment);
			}
		};
		if top != name {
			self.error(
				WFError::ElementMismatch {
					expected: top.to_string(),
					found: name.to_string(),
				}
				.into(),
			)?;
			let wanted = name.to_lowercase();
			let skipped = self
				.elements
				.iter()
				.rev()
				.position(|frame| frame.raw.to_lowercase() == wanted);
			match skipped {
				None => return Ok(EventType::Comment),
				Some(skipped) => {
					for i in 0..skipped {
						self.pending.push_back(Synthetic::ImpliedEndTag {
							diagnose: i + 1 < skipped,
						});
					}
				}
			}
		}
		self.expose_top_element();
		Ok(EventType::EndTag)
	}

	/// Parse `<?...?>` or `<!...>`.
	///
	/// Returns `None` for the XML declaration, which is not an event. The
	/// text is only collected when `push` is set, except for CDATA sections
	/// which always contribute text.
	pub(super) fn parse_legacy(&mut self, mut push: bool) -> Result<Option<EventType>> {
		let mark = self.txt.len();
		let whitespace = self.whitespace;
		self.read()?;
		let (ev, term, req, ctx) = match self.read()? {
			Some('?') => {
				if matches!(self.peek(0)?, Some('x') | Some('X'))
					&& matches!(self.peek(1)?, Some('m') | Some('M'))
				{
					for _ in 0..2 {
						if let Some(c) = self.read()? {
							if push {
								self.push(c);
							}
						}
					}
					if matches!(self.peek(0)?, Some('l') | Some('L'))
						&& self.peek(1)?.map_or(true, |c| CLASS_BLANK.select(c))
					{
						self.txt.truncate(mark);
						self.whitespace = whitespace;
						self.parse_xml_decl()?;
						return Ok(None);
					}
				}
				(EventType::ProcessingInstruction, '?', "", ERRCTX_PI)
			}
			Some('!') => match self.peek(0)? {
				Some('-') => (EventType::Comment, '-', "--", ERRCTX_COMMENT),
				Some('[') => {
					push = true;
					(EventType::Cdata, ']', "[CDATA[", ERRCTX_CDATA_SECTION)
				}
				_ => (EventType::DocDecl, '>', "DOCTYPE", ERRCTX_DOCTYPE),
			},
			Some(c) => {
				self.error(WFError::UnexpectedChar(ERRCTX_UNKNOWN, c, None).into())?;
				return Ok(Some(EventType::Comment));
			}
			None => {
				self.error(Error::wfeof(ERRCTX_UNKNOWN))?;
				return Ok(Some(EventType::Comment));
			}
		};

		for expected in req.chars() {
			self.read_expect(expected, ctx)?;
		}

		if ev == EventType::DocDecl {
			self.parse_doctype(push)?;
			return Ok(Some(ev));
		}

		let mut prev = None;
		loop {
			if ev == EventType::ProcessingInstruction
				&& self.peek(0)? == Some('?')
				&& self.peek(1)? == Some('>')
			{
				self.read()?;
				self.read()?;
				break;
			}
			let c = match self.read()? {
				Some(c) => c,
				None => {
					self.error(Error::wfeof(ctx))?;
					break;
				}
			};
			if ev != EventType::ProcessingInstruction
				&& c == term
				&& self.peek(0)? == Some(term)
				&& self.peek(1)? == Some('>')
			{
				if ev == EventType::Comment && prev == Some('-') {
					self.error(WFError::InvalidSequence(ctx, "--->").into())?;
				}
				self.read()?;
				self.read()?;
				break;
			}
			if push {
				self.push(c);
			}
			prev = Some(c);
		}
		Ok(Some(ev))
	}

	fn parse_xml_decl(&mut self) -> Result<()> {
		if self.line() != 1 || self.column() > 4 {
			self.error(WFError::MisplacedXmlDeclaration.into())?;
		}
		// the "l" of "xml"
		self.read_name(ERRCTX_XML_DECL)?;
		let mut attrs = self.scan_attributes(true)?.into_iter().peekable();

		match attrs.next() {
			Some(a) if a.name.as_str() == "version" => self.version = Some(a.value),
			_ => self.error(WFError::InvalidXmlDeclaration("version expected").into())?,
		}
		if attrs.peek().map_or(false, |a| a.name.as_str() == "encoding") {
			if let Some(a) = attrs.next() {
				self.declared_encoding = Some(a.value);
			}
		}
		if attrs.peek().map_or(false, |a| a.name.as_str() == "standalone") {
			if let Some(a) = attrs.next() {
				match a.value.as_str() {
					"yes" => self.standalone = Some(true),
					"no" => self.standalone = Some(false),
					_ => self.error(WFError::InvalidStandalone(a.value.clone()).into())?,
				}
			}
		}
		if attrs.next().is_some() {
			self.error(WFError::InvalidXmlDeclaration("unexpected pseudo attribute").into())?;
		}
		Ok(())
	}

	/// Consume the rest of a document type declaration after `<!DOCTYPE`.
	///
	/// Nested `<...>` pairs are skipped as a whole; brackets inside quoted
	/// strings do not count.
	fn parse_doctype(&mut self, push: bool) -> Result<()> {
		let mut nesting = 1usize;
		let mut quote: Option<char> = None;
		loop {
			let c = match self.read()? {
				Some(c) => c,
				None => return self.error(Error::wfeof(ERRCTX_DOCTYPE)),
			};
			match c {
				'\'' | '"' => match quote {
					None => quote = Some(c),
					Some(q) if q == c => quote = None,
					Some(_) => (),
				},
				'<' if quote.is_none() => nesting += 1,
				'>' if quote.is_none() => {
					nesting -= 1;
					if nesting == 0 {
						return Ok(());
					}
				}
				_ => (),
			}
			if push {
				self.push(c);
			}
		}
	}
}
