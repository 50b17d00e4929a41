/*!
# Error types

This module holds the error types returned by the parser, the serializer and
the tree builder.

Errors fall into a few classes:

* [`WFError`] and [`NWFError`] describe malformed input. They are fatal in
  strict mode and turn into diagnostics in relaxed mode.
* [`EncodingError`] describes byte sequences which cannot be decoded.
* [`MisuseError`], [`EncodeError`](crate::writer::EncodeError) and
  [`TreeError`](crate::dom::TreeError) describe bugs in the calling code and
  are fatal regardless of any parser feature.
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

use crate::dom::TreeError;
use crate::parser::EventType;
use crate::writer::EncodeError;

pub use crate::errctx::*;

/// Violation of a well-formedness constraint or the XML 1.0 grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum WFError {
	/// End-of-file encountered during a construct where more data was
	/// expected.
	///
	/// The contents are implementation details.
	InvalidEof(&'static str),

	/// Unicode codepoint which was not expected at that point in the
	/// grammar.
	///
	/// The contents are the context, the character found and the character
	/// which was expected (if a single one was).
	UnexpectedChar(&'static str, char, Option<char>),

	/// A name was required but the next character cannot start one.
	NameExpected(&'static str),

	/// An attribute without `=` and value.
	MissingAttributeValue(String),

	/// An attribute value without quotes.
	MissingValueDelimiter(String),

	/// A character sequence which is forbidden in the given context, such as
	/// `]]>` in text or `--->` at the end of a comment.
	InvalidSequence(&'static str, &'static str),

	/// An entity or character reference which is not terminated by `;` or
	/// contains an illegal character.
	UnterminatedReference,

	/// Attempt to refer to an entity which was not defined.
	UndeclaredEntity(String),

	/// Character reference which does not denote a Unicode scalar value.
	InvalidCharReference(String),

	/// Ending tag name does not match the innermost open element.
	ElementMismatch {
		/// Raw name of the innermost open element.
		expected: String,
		/// Raw name found in the end tag.
		found: String,
	},

	/// End tag without any open element.
	ElementStackEmpty(String),

	/// An end tag was inserted because the document ended or an outer
	/// element was closed first.
	MissingEndTag(String),

	/// An XML declaration which is not at the very start of the document.
	MisplacedXmlDeclaration,

	/// An XML declaration with missing, extra or misordered pseudo
	/// attributes.
	InvalidXmlDeclaration(&'static str),

	/// A `standalone` value other than `yes` or `no`.
	InvalidStandalone(String),

	/// The current event does not match what the caller required.
	UnexpectedEvent {
		/// Description of what was required.
		expected: String,
		/// Description of the current position.
		found: String,
	},
}

impl error::Error for WFError {}

impl fmt::Display for WFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::InvalidEof(ctx) => write!(f, "unexpected eof {}", ctx),
			Self::UnexpectedChar(ctx, ch, Some(expected)) => write!(
				f,
				"U+{:x} not allowed {} (expected '{}')",
				*ch as u32, ctx, expected
			),
			Self::UnexpectedChar(ctx, ch, None) => {
				write!(f, "U+{:x} not allowed {}", *ch as u32, ctx)
			}
			Self::NameExpected(ctx) => write!(f, "name expected {}", ctx),
			Self::MissingAttributeValue(name) => {
				write!(f, "attribute value missing for {}", name)
			}
			Self::MissingValueDelimiter(name) => {
				write!(f, "attribute value delimiter missing for {}", name)
			}
			Self::InvalidSequence(ctx, seq) => write!(f, "illegal {} {}", seq, ctx),
			Self::UnterminatedReference => f.write_str("unterminated entity ref"),
			Self::UndeclaredEntity(name) => write!(f, "unresolved: &{};", name),
			Self::InvalidCharReference(code) => {
				write!(f, "invalid character reference: &{};", code)
			}
			Self::ElementMismatch { expected, found } => {
				write!(f, "expected: /{} read: {}", expected, found)
			}
			Self::ElementStackEmpty(name) => write!(f, "element stack empty at /{}", name),
			Self::MissingEndTag(name) => write!(f, "missing end tag /{} inserted", name),
			Self::MisplacedXmlDeclaration => f.write_str("PI must not start with xml"),
			Self::InvalidXmlDeclaration(msg) => write!(f, "invalid xml declaration: {}", msg),
			Self::InvalidStandalone(value) => write!(f, "illegal standalone value: {}", value),
			Self::UnexpectedEvent { expected, found } => {
				write!(f, "expected: {} found: {}", expected, found)
			}
		}
	}
}

/// Violation of a namespace-well-formedness constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum NWFError {
	/// A non-empty prefix was bound to the empty namespace URI.
	EmptyNamespaceUri(String),

	/// Use of an undeclared namespace prefix.
	UndeclaredNamespacePrefix(String),

	/// A name starting with a colon.
	EmptyPrefix(String),
}

impl error::Error for NWFError {}

impl fmt::Display for NWFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::EmptyNamespaceUri(prefix) => {
				write!(f, "illegal empty namespace for prefix {}", prefix)
			}
			Self::UndeclaredNamespacePrefix(prefix) => write!(f, "undefined prefix: {}", prefix),
			Self::EmptyPrefix(name) => write!(f, "illegal name: {}", name),
		}
	}
}

/// Failure to turn input bytes into characters.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingError {
	/// The encoding label is not known.
	Unsupported(String),

	/// A byte sequence which is invalid in the named encoding.
	Malformed(&'static str),

	/// The input ended in the middle of a multi-byte sequence.
	Truncated(&'static str),
}

impl error::Error for EncodingError {}

impl fmt::Display for EncodingError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Unsupported(label) => write!(f, "unsupported encoding: {}", label),
			Self::Malformed(enc) => write!(f, "malformed {} byte sequence", enc),
			Self::Truncated(enc) => write!(f, "truncated {} byte sequence at end of input", enc),
		}
	}
}

/// Incorrect use of the parser API.
#[derive(Debug, Clone, PartialEq)]
pub enum MisuseError {
	/// The parser was advanced before a source was set.
	NoSource,

	/// An accessor was called while positioned on an event it does not
	/// apply to.
	WrongEventType(&'static str, EventType),

	/// An attribute, namespace or depth index is out of range.
	IndexOutOfBounds(usize),
}

impl error::Error for MisuseError {}

impl fmt::Display for MisuseError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::NoSource => f.write_str("no input specified"),
			Self::WrongEventType(op, ev) => write!(f, "{} is not available on {}", op, ev),
			Self::IndexOutOfBounds(i) => write!(f, "index {} out of bounds", i),
		}
	}
}

/// [`std::sync::Arc`]-based around [`std::io::Error`] to allow cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

/// Error types which may be returned from the parser, serializer or tree
/// builder.
///
/// Parser errors are sticky: once [`PullParser::advance`] returned an
/// error, it returns the same error on every further call.
///
///   [`PullParser::advance`]: crate::PullParser::advance
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// An I/O error was encountered while reading the source or writing
	/// the sink.
	IO(IOErrorWrapper),
	/// The input bytes could not be decoded.
	Encoding(EncodingError),
	/// A violation of the XML 1.0 grammar or a well-formedness constraint.
	NotWellFormed(WFError),
	/// A violation of the Namespaces in XML 1.0 constraints.
	NotNamespaceWellFormed(NWFError),
	/// The parser API was used incorrectly.
	Misuse(MisuseError),
	/// The serializer API was used incorrectly.
	Encode(EncodeError),
	/// A tree operation would break the document structure.
	Tree(TreeError),
}

pub type Result<T> = StdResult<T, Error>;

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::IO(IOErrorWrapper::wrap(e))
	}

	pub(crate) fn wfeof(ctx: &'static str) -> Error {
		Error::NotWellFormed(WFError::InvalidEof(ctx))
	}

	/// Whether the error describes malformed input, i.e. whether relaxed
	/// mode would have turned it into a diagnostic.
	pub fn is_recoverable(&self) -> bool {
		match self {
			Self::NotWellFormed(_) | Self::NotNamespaceWellFormed(_) => true,
			Self::IO(_) | Self::Encoding(_) | Self::Misuse(_) | Self::Encode(_) | Self::Tree(_) => {
				false
			}
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<WFError> for Error {
	fn from(e: WFError) -> Error {
		Error::NotWellFormed(e)
	}
}

impl From<NWFError> for Error {
	fn from(e: NWFError) -> Error {
		Error::NotNamespaceWellFormed(e)
	}
}

impl From<EncodingError> for Error {
	fn from(e: EncodingError) -> Error {
		Error::Encoding(e)
	}
}

impl From<MisuseError> for Error {
	fn from(e: MisuseError) -> Error {
		Error::Misuse(e)
	}
}

impl From<EncodeError> for Error {
	fn from(e: EncodeError) -> Error {
		Error::Encode(e)
	}
}

impl From<TreeError> for Error {
	fn from(e: TreeError) -> Error {
		Error::Tree(e)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::NotWellFormed(e) => write!(f, "not-well-formed: {}", e),
			Error::NotNamespaceWellFormed(e) => write!(f, "not namespace-well-formed: {}", e),
			Error::Encoding(e) => write!(f, "encoding error: {}", e),
			Error::Misuse(e) => write!(f, "invalid parser use: {}", e),
			Error::Encode(e) => write!(f, "invalid serializer use: {}", e),
			Error::Tree(e) => write!(f, "invalid tree operation: {}", e),
			Error::IO(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::IO(e) => Some(&**e),
			Error::NotWellFormed(e) => Some(e),
			Error::NotNamespaceWellFormed(e) => Some(e),
			Error::Encoding(e) => Some(e),
			Error::Misuse(e) => Some(e),
			Error::Encode(e) => Some(e),
			Error::Tree(e) => Some(e),
		}
	}
}
