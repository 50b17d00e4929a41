/*!
# Character source with lookahead

[`SourceCursor`] turns a [`CharRead`] into the character stream the
tokenizer consumes: it normalizes line endings (CR and CR LF both become a
single LF), offers two characters of lookahead and tracks the line and
column of the last character read.
*/
use std::io;

use crate::error::Result;

mod encoding;
mod read;

pub use encoding::InputEncoding;
pub use read::{CharRead, DecodingReader, StrReader, Utf32Reader};

/// Number of characters which can be looked at without consuming them.
pub const LOOKAHEAD: usize = 2;

/// Buffered, line-ending normalizing character cursor.
pub struct SourceCursor<'x> {
	backend: Box<dyn CharRead + 'x>,
	peeked: [Option<char>; LOOKAHEAD],
	npeeked: usize,
	was_cr: bool,
	line: usize,
	column: usize,
	encoding: Option<InputEncoding>,
}

impl<'x> SourceCursor<'x> {
	pub fn new(backend: Box<dyn CharRead + 'x>, encoding: Option<InputEncoding>) -> Self {
		Self {
			backend,
			peeked: [None; LOOKAHEAD],
			npeeked: 0,
			was_cr: false,
			line: 1,
			column: 0,
			encoding,
		}
	}

	/// Read from an already decoded string.
	pub fn from_str(text: &'x str) -> Self {
		Self::new(Box::new(StrReader::new(text)), None)
	}

	/// Read from a byte stream.
	///
	/// With `encoding` set, that encoding is used as is. Otherwise it is
	/// detected from the first bytes of `r`, which may already read from it.
	pub fn from_reader<R: io::Read + 'x>(r: R, encoding: Option<&str>) -> Result<Self> {
		let (backend, detected) = encoding::open(r, encoding)?;
		Ok(Self::new(backend, Some(detected)))
	}

	/// Encoding of the underlying byte stream, if any.
	pub fn encoding(&self) -> Option<InputEncoding> {
		self.encoding
	}

	/// Look at the character `offset` positions ahead without consuming it.
	///
	/// `offset` must be less than [`LOOKAHEAD`]. `None` means end of input.
	pub fn peek(&mut self, offset: usize) -> Result<Option<char>> {
		debug_assert!(offset < LOOKAHEAD);
		while self.npeeked <= offset {
			let ch = match self.backend.read_char()? {
				Some('\r') => {
					self.was_cr = true;
					Some('\n')
				}
				Some('\n') if self.was_cr => {
					self.was_cr = false;
					continue;
				}
				other => {
					self.was_cr = false;
					other
				}
			};
			self.peeked[self.npeeked] = ch;
			self.npeeked += 1;
		}
		Ok(self.peeked[offset])
	}

	/// Consume and return the next character.
	pub fn read(&mut self) -> Result<Option<char>> {
		let ch = self.peek(0)?;
		self.peeked[0] = self.peeked[1];
		self.npeeked -= 1;
		match ch {
			Some('\n') => {
				self.line += 1;
				self.column = 1;
			}
			Some(_) => self.column += 1,
			None => (),
		}
		Ok(ch)
	}

	/// Line of the last character read, starting at 1.
	pub fn line(&self) -> usize {
		self.line
	}

	/// Column of the last character read; 0 before anything was read.
	pub fn column(&self) -> usize {
		self.column
	}
}
