/*!
# Input encoding detection

Without an explicit encoding, the first bytes of the input decide:

1. a UTF-32, UTF-16 or UTF-8 byte order mark is honoured and skipped,
2. the byte patterns of `<?` in UTF-32 and UTF-16 select those encodings,
3. an ASCII `<?xm` makes the XML declaration itself authoritative, and
4. everything else is read as UTF-8.

All bytes which were looked at but are not a byte order mark are handed to
the decoder again.
*/
use std::io::{self, Read};

use encoding_rs::Encoding;

use crate::error::{EncodingError, Error, Result};

use super::read::{CharRead, DecodingReader, Utf32Reader};

// An XML declaration longer than this is not scanned for its encoding.
const MAX_DECL_SNIFF: usize = 1024;

/// Encoding of an input byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
	Utf32Be,
	Utf32Le,
	/// Any encoding supported by `encoding_rs`.
	Other(&'static Encoding),
}

impl InputEncoding {
	/// Look an encoding up by its label, ignoring case and surrounding
	/// whitespace.
	pub fn for_label(label: &str) -> Option<InputEncoding> {
		let trimmed = label.trim();
		match trimmed.to_ascii_lowercase().as_str() {
			"utf-32" | "utf-32be" | "utf32" | "ucs-4" | "iso-10646-ucs-4" => {
				Some(InputEncoding::Utf32Be)
			}
			"utf-32le" => Some(InputEncoding::Utf32Le),
			_ => Encoding::for_label(trimmed.as_bytes()).map(InputEncoding::Other),
		}
	}

	/// Canonical name of the encoding.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Utf32Be => "UTF-32BE",
			Self::Utf32Le => "UTF-32LE",
			Self::Other(enc) => enc.name(),
		}
	}

	/// Whether ASCII text is encoded as itself, which is what allows reading
	/// a declared encoding from the bytes of the XML declaration.
	pub fn is_ascii_compatible(&self) -> bool {
		match self {
			Self::Utf32Be | Self::Utf32Le => false,
			Self::Other(enc) => enc.is_ascii_compatible(),
		}
	}
}

/// Result of looking at the head of an input stream.
#[derive(Debug)]
pub(crate) struct Sniffed {
	pub encoding: InputEncoding,
	/// Bytes which were consumed but belong to the document.
	pub pending: Vec<u8>,
}

/// Match a byte order mark or a known `<?` pattern at the start of `head`.
///
/// Returns the encoding and the number of bytes to skip.
pub(crate) fn detect(head: &[u8]) -> Option<(InputEncoding, usize)> {
	use InputEncoding::*;
	match head {
		[0x00, 0x00, 0xfe, 0xff, ..] => Some((Utf32Be, 4)),
		[0xff, 0xfe, 0x00, 0x00, ..] => Some((Utf32Le, 4)),
		[0x00, 0x00, 0x00, 0x3c, ..] => Some((Utf32Be, 0)),
		[0x3c, 0x00, 0x00, 0x00, ..] => Some((Utf32Le, 0)),
		[0x00, 0x3c, 0x00, 0x3f, ..] => Some((Other(encoding_rs::UTF_16BE), 0)),
		[0x3c, 0x00, 0x3f, 0x00, ..] => Some((Other(encoding_rs::UTF_16LE), 0)),
		[0xfe, 0xff, ..] => Some((Other(encoding_rs::UTF_16BE), 2)),
		[0xff, 0xfe, ..] => Some((Other(encoding_rs::UTF_16LE), 2)),
		[0xef, 0xbb, 0xbf, ..] => Some((Other(encoding_rs::UTF_8), 3)),
		_ => None,
	}
}

/// Extract the value of the `encoding` pseudo attribute from the raw bytes of
/// an XML declaration.
fn declared_label(decl: &[u8]) -> Option<&str> {
	const KEY: &[u8] = b"encoding";
	let at = decl.windows(KEY.len()).position(|w| w == KEY)?;
	let rest = &decl[at + KEY.len()..];
	let open = rest.iter().position(|b| *b == b'"' || *b == b'\'')?;
	let delim = rest[open];
	let value = &rest[open + 1..];
	let close = value.iter().position(|b| *b == delim)?;
	std::str::from_utf8(&value[..close]).ok()
}

fn read_up_to<R: io::Read>(r: &mut R, buf: &mut Vec<u8>, want: usize) -> Result<()> {
	let mut byte = [0u8; 1];
	while buf.len() < want {
		match r.read(&mut byte) {
			Ok(0) => break,
			Ok(_) => buf.push(byte[0]),
			Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(Error::io(e)),
		}
	}
	Ok(())
}

/// Determine the encoding of `r` from its first bytes.
pub(crate) fn sniff<R: io::Read>(r: &mut R) -> Result<Sniffed> {
	let mut head = Vec::with_capacity(4);
	read_up_to(r, &mut head, 4)?;

	if let Some((encoding, skip)) = detect(&head) {
		log::debug!("detected {} from leading bytes", encoding.name());
		return Ok(Sniffed {
			encoding,
			pending: head.split_off(skip),
		});
	}

	if head.as_slice() == b"<?xm" {
		let mut byte = [0u8; 1];
		while head.len() < MAX_DECL_SNIFF && head.last() != Some(&b'>') {
			match r.read(&mut byte) {
				Ok(0) => break,
				Ok(_) => head.push(byte[0]),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(Error::io(e)),
			}
		}
		if let Some(label) = declared_label(&head) {
			let encoding = match InputEncoding::for_label(label) {
				Some(enc) if enc.is_ascii_compatible() => enc,
				// the declaration itself was readable as ASCII, so a
				// UTF-16 or UTF-32 label cannot be right
				Some(_) => InputEncoding::Other(encoding_rs::UTF_8),
				None => return Err(EncodingError::Unsupported(label.to_string()).into()),
			};
			log::debug!("using declared encoding {}", encoding.name());
			return Ok(Sniffed {
				encoding,
				pending: head,
			});
		}
	}

	Ok(Sniffed {
		encoding: InputEncoding::Other(encoding_rs::UTF_8),
		pending: head,
	})
}

/// Wrap `r` into a character reader.
///
/// With `label` set, that encoding is used unconditionally; a byte order
/// mark matching it is dropped, any other one is not honoured. Otherwise the encoding is detected
/// with [`sniff`].
pub(crate) fn open<'x, R: io::Read + 'x>(
	mut r: R,
	label: Option<&str>,
) -> Result<(Box<dyn CharRead + 'x>, InputEncoding)> {
	let (encoding, pending, explicit) = match label {
		Some(label) => match InputEncoding::for_label(label) {
			Some(enc) => (enc, Vec::new(), true),
			None => return Err(EncodingError::Unsupported(label.to_string()).into()),
		},
		None => {
			let sniffed = sniff(&mut r)?;
			(sniffed.encoding, sniffed.pending, false)
		}
	};
	let src = io::Cursor::new(pending).chain(r);
	let reader: Box<dyn CharRead + 'x> = match encoding {
		InputEncoding::Utf32Be => Box::new(Utf32Reader::new(src, true)),
		InputEncoding::Utf32Le => Box::new(Utf32Reader::new(src, false)),
		InputEncoding::Other(enc) if explicit => Box::new(DecodingReader::with_bom_removal(src, enc)),
		InputEncoding::Other(enc) => Box::new(DecodingReader::new(src, enc)),
	};
	Ok((reader, encoding))
}
