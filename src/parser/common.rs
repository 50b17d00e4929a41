use std::fmt;

use smartstring::alias::String as SmartString;

use crate::namespaces::NamespaceName;

/// Kind of a parser event.
///
/// The declaration order matters: when several low-level events are merged
/// into one by [`PullParser::advance`](super::PullParser::advance), the
/// merged event takes the smallest kind involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventType {
	/// Before the first call to advance.
	StartDocument,
	/// The input is exhausted. Sticky.
	EndDocument,
	/// An element header; attributes are available.
	StartTag,
	/// An element footer, also emitted right after the header of an empty
	/// element tag.
	EndTag,
	/// Character data.
	Text,
	/// A CDATA section (token mode only).
	Cdata,
	/// An entity or character reference (token mode only).
	EntityRef,
	/// Whitespace-only text outside the root element.
	IgnorableWhitespace,
	/// A processing instruction (token mode only).
	ProcessingInstruction,
	/// A comment (token mode only), also used to surface diagnostics in
	/// relaxed mode.
	Comment,
	/// A document type declaration (token mode only).
	DocDecl,
}

impl EventType {
	/// Whether events of this kind carry character data which merges into a
	/// single text event.
	pub fn is_text_like(&self) -> bool {
		match self {
			Self::Text | Self::Cdata | Self::EntityRef | Self::IgnorableWhitespace => true,
			_ => false,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::StartDocument => "START_DOCUMENT",
			Self::EndDocument => "END_DOCUMENT",
			Self::StartTag => "START_TAG",
			Self::EndTag => "END_TAG",
			Self::Text => "TEXT",
			Self::Cdata => "CDSECT",
			Self::EntityRef => "ENTITY_REF",
			Self::IgnorableWhitespace => "IGNORABLE_WHITESPACE",
			Self::ProcessingInstruction => "PROCESSING_INSTRUCTION",
			Self::Comment => "COMMENT",
			Self::DocDecl => "DOCDECL",
		}
	}
}

impl fmt::Display for EventType {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Switchable parser behaviour, see [`ParserOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
	/// Resolve prefixes and report namespace URIs.
	ProcessNamespaces,
	/// Recover from malformed input instead of failing.
	Relaxed,
}

/// Parser configuration.
///
/// ```
/// use pullxml::ParserOptions;
/// let opts = ParserOptions::default().process_namespaces(true);
/// assert!(!opts.relaxed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserOptions {
	/// Resolve namespace prefixes.
	///
	/// When disabled, names are reported verbatim (including any prefix) and
	/// every namespace is empty. `xmlns` attributes are ordinary attributes.
	pub process_namespaces: bool,

	/// Recover from malformed input.
	///
	/// Errors are recorded as diagnostics and parsing continues with a best
	/// guess: mismatched and missing end tags are inserted, unknown entities
	/// are kept literally and attribute values may be unquoted or missing.
	pub relaxed: bool,
}

impl ParserOptions {
	pub fn process_namespaces(mut self, enabled: bool) -> Self {
		self.process_namespaces = enabled;
		self
	}

	pub fn relaxed(mut self, enabled: bool) -> Self {
		self.relaxed = enabled;
		self
	}

	pub fn set(&mut self, feature: Feature, enabled: bool) {
		match feature {
			Feature::ProcessNamespaces => self.process_namespaces = enabled,
			Feature::Relaxed => self.relaxed = enabled,
		}
	}

	pub fn get(&self, feature: Feature) -> bool {
		match feature {
			Feature::ProcessNamespaces => self.process_namespaces,
			Feature::Relaxed => self.relaxed,
		}
	}
}

/// An attribute of the current start tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
	/// Namespace URI; empty for unprefixed attributes and when namespace
	/// processing is off.
	pub namespace: NamespaceName,
	/// Prefix as written, if namespace processing split one off.
	pub prefix: Option<SmartString>,
	/// Local name, or the full name when namespace processing is off.
	pub name: SmartString,
	/// Value with references resolved and newlines turned into spaces.
	pub value: String,
}

/// An open element.
#[derive(Debug, Clone)]
pub(crate) struct ElementFrame {
	pub namespace: NamespaceName,
	pub prefix: Option<SmartString>,
	pub name: SmartString,
	/// The name as written in the start tag, used to match end tags.
	pub raw: SmartString,
}

/// Kind of the next token, judging from the first one or two characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookahead {
	Eof,
	EntityRef,
	EndTag,
	/// `<?` or `<!`
	Legacy,
	StartTag,
	Text,
}

impl Lookahead {
	/// Whether a token of this kind may continue a merged text event.
	pub fn continues_text(&self) -> bool {
		match self {
			Self::Text | Self::EntityRef | Self::Legacy => true,
			_ => false,
		}
	}
}
