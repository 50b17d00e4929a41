use std::io;
use std::str::Chars;

use encoding_rs::{Decoder, DecoderResult, Encoding};

use crate::error::{EncodingError, Error, Result};

const RAW_CHUNK: usize = 4096;

/// Source of decoded characters.
///
/// `Ok(None)` signals the end of the input; once returned, every further
/// call returns it again.
pub trait CharRead {
	fn read_char(&mut self) -> Result<Option<char>>;

	fn read_all(&mut self) -> (String, Result<()>) {
		let mut result = String::new();
		loop {
			match self.read_char() {
				Ok(Some(ch)) => result.push(ch),
				Ok(None) => return (result, Ok(())),
				Err(e) => return (result, Err(e)),
			}
		}
	}
}

/// Characters of an already decoded string.
pub struct StrReader<'x> {
	chars: Chars<'x>,
}

impl<'x> StrReader<'x> {
	pub fn new(s: &'x str) -> Self {
		Self { chars: s.chars() }
	}
}

impl<'x> CharRead for StrReader<'x> {
	fn read_char(&mut self) -> Result<Option<char>> {
		Ok(self.chars.next())
	}
}

fn read_retrying<R: io::Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
	loop {
		match r.read(buf) {
			Ok(n) => return Ok(n),
			Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(Error::io(e)),
		}
	}
}

/// Decoder for all encodings known to `encoding_rs`.
///
/// Malformed byte sequences are reported as errors instead of being replaced.
pub struct DecodingReader<R> {
	backend: R,
	encoding: &'static Encoding,
	decoder: Decoder,
	raw: Vec<u8>,
	decoded: String,
	pos: usize,
	eof: bool,
}

impl<R: io::Read> DecodingReader<R> {
	/// Decode `backend` as `encoding`. No byte order mark is stripped.
	pub fn new(backend: R, encoding: &'static Encoding) -> Self {
		Self::with_decoder(backend, encoding, encoding.new_decoder_without_bom_handling())
	}

	/// Decode `backend` as `encoding`, dropping a leading byte order mark
	/// of that encoding. A mark of any other encoding is decoded as data.
	pub fn with_bom_removal(backend: R, encoding: &'static Encoding) -> Self {
		Self::with_decoder(backend, encoding, encoding.new_decoder_with_bom_removal())
	}

	fn with_decoder(backend: R, encoding: &'static Encoding, decoder: Decoder) -> Self {
		Self {
			backend,
			encoding,
			decoder,
			raw: vec![0u8; RAW_CHUNK],
			decoded: String::new(),
			pos: 0,
			eof: false,
		}
	}

	pub fn encoding(&self) -> &'static Encoding {
		self.encoding
	}

	fn fill(&mut self) -> Result<bool> {
		self.decoded.clear();
		self.pos = 0;
		while self.decoded.is_empty() {
			if self.eof {
				return Ok(false);
			}
			let n = read_retrying(&mut self.backend, &mut self.raw[..])?;
			let last = n == 0;
			if last {
				self.eof = true;
			}
			let mut src = &self.raw[..n];
			loop {
				let needed = self
					.decoder
					.max_utf8_buffer_length_without_replacement(src.len())
					.unwrap_or(src.len() * 3 + 16);
				self.decoded.reserve(needed);
				let (result, read) =
					self.decoder
						.decode_to_string_without_replacement(src, &mut self.decoded, last);
				src = &src[read..];
				match result {
					DecoderResult::InputEmpty => break,
					DecoderResult::OutputFull => continue,
					DecoderResult::Malformed(_, _) => {
						return Err(EncodingError::Malformed(self.encoding.name()).into())
					}
				}
			}
		}
		Ok(true)
	}
}

impl<R: io::Read> CharRead for DecodingReader<R> {
	fn read_char(&mut self) -> Result<Option<char>> {
		if self.pos >= self.decoded.len() && !self.fill()? {
			return Ok(None);
		}
		match self.decoded[self.pos..].chars().next() {
			Some(ch) => {
				self.pos += ch.len_utf8();
				Ok(Some(ch))
			}
			None => Ok(None),
		}
	}
}

/// Decoder for UTF-32 in either byte order.
pub struct Utf32Reader<R> {
	backend: R,
	big_endian: bool,
	buf: Vec<u8>,
	start: usize,
	end: usize,
}

impl<R: io::Read> Utf32Reader<R> {
	pub fn new(backend: R, big_endian: bool) -> Self {
		Self {
			backend,
			big_endian,
			buf: vec![0u8; RAW_CHUNK],
			start: 0,
			end: 0,
		}
	}

	fn name(&self) -> &'static str {
		if self.big_endian {
			"UTF-32BE"
		} else {
			"UTF-32LE"
		}
	}
}

impl<R: io::Read> CharRead for Utf32Reader<R> {
	fn read_char(&mut self) -> Result<Option<char>> {
		while self.end - self.start < 4 {
			self.buf.copy_within(self.start..self.end, 0);
			self.end -= self.start;
			self.start = 0;
			let n = read_retrying(&mut self.backend, &mut self.buf[self.end..])?;
			if n == 0 {
				if self.end == 0 {
					return Ok(None);
				}
				return Err(EncodingError::Truncated(self.name()).into());
			}
			self.end += n;
		}
		let mut unit = [0u8; 4];
		unit.copy_from_slice(&self.buf[self.start..self.start + 4]);
		self.start += 4;
		let cp = if self.big_endian {
			u32::from_be_bytes(unit)
		} else {
			u32::from_le_bytes(unit)
		};
		match std::char::from_u32(cp) {
			Some(ch) => Ok(Some(ch)),
			None => Err(EncodingError::Malformed(self.name()).into()),
		}
	}
}
