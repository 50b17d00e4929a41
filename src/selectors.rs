/*!
# Character classes used by the tokenizer

Everything at or above U+00C0 may start a name, everything at or above
U+00B7 may continue one. Full XML 1.0 name validation is not performed.
*/

pub trait CharSelector {
	fn select(&self, c: char) -> bool;
}

/// Characters which may start an element or attribute name.
#[derive(Debug, Copy, Clone)]
pub struct NameStart;

impl CharSelector for NameStart {
	fn select(&self, c: char) -> bool {
		c.is_ascii_alphabetic() || c == '_' || c == ':' || c >= '\u{c0}'
	}
}

/// Characters which may continue a name.
#[derive(Debug, Copy, Clone)]
pub struct NameChar;

impl CharSelector for NameChar {
	fn select(&self, c: char) -> bool {
		c.is_ascii_alphanumeric()
			|| c == '_' || c == '-'
			|| c == ':' || c == '.'
			|| c >= '\u{b7}'
	}
}

/// Characters which may appear inside an entity name between `&` and `;`.
///
/// Anything outside ASCII is accepted, as well as `#` so that character
/// references share the same scanner.
#[derive(Debug, Copy, Clone)]
pub struct EntityChar;

impl CharSelector for EntityChar {
	fn select(&self, c: char) -> bool {
		!c.is_ascii() || c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '#'
	}
}

/// Whitespace and control characters, i.e. everything up to and including
/// U+0020.
#[derive(Debug, Copy, Clone)]
pub struct Blank;

impl CharSelector for Blank {
	fn select(&self, c: char) -> bool {
		c <= ' '
	}
}

pub static CLASS_NAMESTART: NameStart = NameStart;
pub static CLASS_NAME: NameChar = NameChar;
pub static CLASS_ENTITY: EntityChar = EntityChar;
pub static CLASS_BLANK: Blank = Blank;
