use std::collections::HashMap;

use smartstring::alias::String as SmartString;

/// Replacement texts for named entity references.
///
/// Starts out with the five predefined XML entities.
#[derive(Debug, Clone)]
pub struct EntityMap {
	map: HashMap<SmartString, String>,
}

impl EntityMap {
	pub fn new() -> EntityMap {
		let mut map = HashMap::new();
		for (name, text) in &[
			("amp", "&"),
			("apos", "'"),
			("gt", ">"),
			("lt", "<"),
			("quot", "\""),
		] {
			map.insert(SmartString::from(*name), text.to_string());
		}
		EntityMap { map }
	}

	/// Define (or redefine) entity `name`.
	pub fn define(&mut self, name: &str, text: &str) {
		self.map.insert(name.into(), text.to_string());
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.map.get(name).map(|s| s.as_str())
	}
}

impl Default for EntityMap {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn predefined_entities_and_redefinition() {
		let mut m = EntityMap::new();
		assert_eq!(m.get("lt"), Some("<"));
		assert_eq!(m.get("quot"), Some("\""));
		assert_eq!(m.get("nbsp"), None);
		m.define("nbsp", "\u{a0}");
		m.define("amp", "and");
		assert_eq!(m.get("nbsp"), Some("\u{a0}"));
		assert_eq!(m.get("amp"), Some("and"));
	}
}
