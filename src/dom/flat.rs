/*!
# Flat mapping

Projection of a document onto nested [`serde_json`] objects: attributes of
an element become string members, child elements become nested objects
keyed by their local name. When a name occurs more than once among the
element children of one parent, all of them are collected into an array.
Namespaces are ignored.
*/
use serde_json::{Map, Value};

use crate::error::Result;

use super::{Child, Document, Element, ElementId};

/// Which optional content to include in the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlatFlags {
	/// Include CDATA sections as a `"#cdata"` member, encoded by the codec.
	pub cdata: bool,
}

/// Map the root element of `doc` to a JSON object.
///
/// CDATA sections are only included when [`FlatFlags::cdata`] is set and a
/// `codec` is given; if an element holds several, the last one wins.
pub fn to_flat_mapping(
	doc: &Document,
	flags: FlatFlags,
	codec: Option<&dyn Fn(&str) -> Value>,
) -> Result<Map<String, Value>> {
	let root = doc.root_element()?;
	Ok(element_to_map(doc, root, flags, codec))
}

fn element_to_map(
	doc: &Document,
	id: ElementId,
	flags: FlatFlags,
	codec: Option<&dyn Fn(&str) -> Value>,
) -> Map<String, Value> {
	let mut ctx = Map::new();
	let el = match doc.element(id) {
		Some(el) => el,
		None => return ctx,
	};
	for a in el.attributes() {
		ctx.entry(a.name.clone())
			.or_insert_with(|| Value::String(a.value.clone()));
	}

	let duplicates = duplicate_names(doc, el);
	for child in el.children() {
		if let Some(text) = child_cdata(child) {
			if let (true, Some(codec)) = (flags.cdata, codec) {
				ctx.insert("#cdata".to_string(), codec(text));
			}
			continue;
		}
		let child_id = match child.as_element() {
			Some(id) => id,
			None => continue,
		};
		let name = match doc.element(child_id) {
			Some(e) => e.name().to_string(),
			None => continue,
		};
		let value = Value::Object(element_to_map(doc, child_id, flags, codec));
		if duplicates.contains(&name.as_str()) {
			match ctx.get_mut(&name) {
				Some(Value::Array(items)) => items.push(value),
				_ => {
					ctx.insert(name, Value::Array(vec![value]));
				}
			}
		} else {
			ctx.insert(name, value);
		}
	}
	ctx
}

fn child_cdata(child: &Child) -> Option<&str> {
	match child {
		Child::Cdata(s) => Some(s),
		_ => None,
	}
}

/// Local names occurring on more than one element child of `el`.
fn duplicate_names<'d>(doc: &'d Document, el: &'d Element) -> Vec<&'d str> {
	let mut seen: Vec<&str> = Vec::new();
	let mut dups: Vec<&str> = Vec::new();
	for id in el.children().iter().filter_map(|c| c.as_element()) {
		let name = match doc.element(id) {
			Some(e) => e.name(),
			None => continue,
		};
		if seen.contains(&name) {
			if !dups.contains(&name) {
				dups.push(name);
			}
		} else {
			seen.push(name);
		}
	}
	dups
}
