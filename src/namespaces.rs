/*!
# Scoped namespace bindings

Both the parser and the serializer keep a stack of `(prefix, URI)` bindings
together with a per-depth count of how many of them are visible. Bindings
are never removed one by one; leaving a scope rolls the visible count back
and forgets everything declared inside.

The empty prefix denotes the default namespace, the empty URI denotes "no
namespace".
*/
#[cfg(not(feature = "mt"))]
use std::rc::Rc;
#[cfg(feature = "mt")]
use std::sync::Arc;

use smartstring::alias::String as SmartString;

/// Wrapper pointer around namespace URIs
///
/// In builds with the `mt` feature, this is a [`Arc`]. In non-`mt` builds,
/// this is a [`std::rc::Rc`]
#[cfg(feature = "mt")]
pub type RcPtr<T> = Arc<T>;
/// Wrapper pointer around namespace URIs
///
/// In builds with the `mt` feature, this is a [`std::sync::Arc`].
/// In non-`mt` builds, this is a [`Rc`].
#[cfg(not(feature = "mt"))]
pub type RcPtr<T> = Rc<T>;

/// Shared namespace URI
pub type NamespaceName = RcPtr<str>;

/// XML core namespace URI (for the `xml:` prefix)
pub const XMLNS_XML: &'static str = "http://www.w3.org/XML/1998/namespace";
/// XML namespace URI (for the `xmlns:` prefix)
pub const XMLNS_XMLNS: &'static str = "http://www.w3.org/2000/xmlns/";

pub const PREFIX_XML: &'static str = "xml";
pub const PREFIX_XMLNS: &'static str = "xmlns";

/// A single prefix to URI binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
	/// Prefix, empty for the default namespace.
	pub prefix: SmartString,
	/// Namespace URI, empty for "no namespace".
	pub uri: NamespaceName,
}

impl Binding {
	pub fn new(prefix: &str, uri: NamespaceName) -> Binding {
		Binding {
			prefix: prefix.into(),
			uri,
		}
	}
}

/// Stack of namespace bindings with per-depth visibility counts.
#[derive(Debug, Clone)]
pub struct NamespaceStack {
	bindings: Vec<Binding>,
	counts: Vec<usize>,
}

impl NamespaceStack {
	/// Create an empty stack with a single (outermost) scope.
	pub fn new() -> NamespaceStack {
		NamespaceStack {
			bindings: Vec::new(),
			counts: vec![0],
		}
	}

	/// Create a stack whose outermost scope holds `bindings` and which has
	/// an empty scope open on top of it.
	pub fn seeded(bindings: Vec<Binding>) -> NamespaceStack {
		let n = bindings.len();
		NamespaceStack {
			bindings,
			counts: vec![n, n],
		}
	}

	/// Number of scopes above the outermost one.
	pub fn depth(&self) -> usize {
		self.counts.len() - 1
	}

	/// Add a binding to the innermost scope.
	pub fn declare(&mut self, prefix: &str, uri: NamespaceName) {
		self.bindings.push(Binding::new(prefix, uri));
		// counts is never empty
		if let Some(top) = self.counts.last_mut() {
			*top += 1;
		}
	}

	/// Open a new, initially empty, scope.
	pub fn push_scope(&mut self) {
		let top = self.visible_count();
		self.counts.push(top);
	}

	/// Close the innermost scope and forget its bindings.
	///
	/// The outermost scope is never removed.
	pub fn pop_scope(&mut self) {
		if self.counts.len() > 1 {
			self.counts.pop();
		}
		self.bindings.truncate(self.visible_count());
	}

	/// Forget the bindings of the innermost scope, keeping the scope open.
	pub fn clear_scope(&mut self) {
		let n = self.counts.len();
		if n > 1 {
			self.counts[n - 1] = self.counts[n - 2];
		} else {
			self.counts[0] = 0;
		}
		self.bindings.truncate(self.visible_count());
	}

	/// Number of bindings visible at scope `depth`.
	pub fn count(&self, depth: usize) -> Option<usize> {
		self.counts.get(depth).copied()
	}

	/// Number of bindings visible in the innermost scope.
	pub fn visible_count(&self) -> usize {
		self.counts.last().copied().unwrap_or(0)
	}

	/// All visible bindings, outermost first.
	pub fn bindings(&self) -> &[Binding] {
		&self.bindings[..self.visible_count()]
	}

	/// Bindings declared by the scope at `depth` itself.
	pub fn scope_bindings(&self, depth: usize) -> &[Binding] {
		let end = match self.count(depth) {
			Some(v) => v,
			None => return &[],
		};
		let start = match depth.checked_sub(1) {
			Some(outer) => self.counts[outer],
			None => 0,
		};
		&self.bindings[start..end]
	}

	/// Resolve `prefix` to its innermost visible binding.
	pub fn resolve(&self, prefix: &str) -> Option<&NamespaceName> {
		self.bindings()
			.iter()
			.rev()
			.find(|b| b.prefix.as_str() == prefix)
			.map(|b| &b.uri)
	}

	/// Remove all bindings and scopes.
	pub fn reset(&mut self) {
		self.bindings.clear();
		self.counts.clear();
		self.counts.push(0);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn uri(s: &str) -> NamespaceName {
		RcPtr::from(s)
	}

	#[test]
	fn inner_scope_shadows_outer_binding() {
		let mut ns = NamespaceStack::new();
		ns.push_scope();
		ns.declare("p", uri("urn:outer"));
		ns.push_scope();
		ns.declare("p", uri("urn:inner"));
		assert_eq!(&**ns.resolve("p").unwrap(), "urn:inner");
		ns.pop_scope();
		assert_eq!(&**ns.resolve("p").unwrap(), "urn:outer");
		ns.pop_scope();
		assert!(ns.resolve("p").is_none());
	}

	#[test]
	fn counts_track_visible_bindings_per_depth() {
		let mut ns = NamespaceStack::new();
		ns.push_scope();
		ns.declare("a", uri("urn:a"));
		ns.declare("", uri("urn:d"));
		ns.push_scope();
		ns.declare("b", uri("urn:b"));
		assert_eq!(ns.count(0), Some(0));
		assert_eq!(ns.count(1), Some(2));
		assert_eq!(ns.count(2), Some(3));
		assert_eq!(ns.count(3), None);
		assert_eq!(ns.scope_bindings(1).len(), 2);
		assert_eq!(ns.scope_bindings(2)[0].prefix.as_str(), "b");
		assert_eq!(ns.depth(), 2);
	}

	#[test]
	fn seeded_stack_keeps_outer_bindings_on_clear() {
		let mut ns = NamespaceStack::seeded(vec![
			Binding::new("", uri("")),
			Binding::new("xml", uri(XMLNS_XML)),
		]);
		ns.declare("x", uri("urn:x"));
		assert_eq!(ns.bindings().len(), 3);
		ns.clear_scope();
		assert_eq!(ns.bindings().len(), 2);
		assert_eq!(&**ns.resolve("xml").unwrap(), XMLNS_XML);
	}
}
