/*!
# Pull-based XML parsing and writing

This crate provides a streaming pull parser for XML 1.0 documents, a
streaming serializer producing XML text from the same kind of events and a
small document tree built on top of both.

## Features

* Pull-based: the caller asks for one event at a time
* Coalesced text events or raw token events, on demand
* Namespace processing (optional)
* Relaxed mode recovering from malformed input (optional)
* Predefined, numeric and caller-defined entities
* Encoding detection for UTF-8, UTF-16 and UTF-32 input, plus any
  ASCII-compatible encoding named in the XML declaration
* Automatic namespace prefixes and optional indentation when writing
* No DTD processing or validation

## Example

```
use pullxml::{EventType, PullParser};
let doc = b"<?xml version='1.0'?><hello>World!</hello>";
let mut p = PullParser::new();
p.set_source(&doc[..], None).unwrap();
let mut names = Vec::new();
loop {
	match p.advance().unwrap() {
		EventType::StartTag => names.push(p.name().unwrap_or("").to_string()),
		EventType::EndDocument => break,
		_ => (),
	}
}
assert_eq!(names, vec!["hello".to_string()]);
```

## High-level usage

### Parsing

A [`PullParser`] reads from any [`std::io::Read`] (via
[`PullParser::set_source`]) or from a string slice (via
[`PullParser::set_source_str`]). Its behaviour is configured through
[`ParserOptions`].

### Writing

A [`Serializer`] writes to any [`std::io::Write`]. Start tags are kept open
until the next call which is not an attribute, namespace prefixes are
generated where needed.

### Trees

[`Document::parse`] builds a [`Document`] from a parser and
[`Document::write`] writes it back through a serializer.
[`to_flat_mapping`](dom::to_flat_mapping) projects a document onto
[`serde_json`] objects.
*/
pub mod dom;
mod errctx;
pub mod error;
pub mod namespaces;
pub mod parser;
pub mod selectors;
pub mod source;
pub mod writer;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use dom::{Document, Element, ElementId, NodeId};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use namespaces::{NamespaceName, RcPtr, XMLNS_XML, XMLNS_XMLNS};
#[doc(inline)]
pub use parser::{Attribute, EventType, Feature, ParserOptions, PullParser};
#[doc(inline)]
pub use source::InputEncoding;
#[doc(inline)]
pub use writer::{EncodeError, Serializer, SerializerFeature};

/// Package version
pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
