pub const ERRCTX_UNKNOWN: &'static str = "in unknown context";
pub const ERRCTX_TEXT: &'static str = "in text node";
pub const ERRCTX_NAME: &'static str = "in name";
pub const ERRCTX_ELEMENT: &'static str = "in element header";
pub const ERRCTX_ELEMENT_FOOT: &'static str = "in element footer";
pub const ERRCTX_ATTVAL: &'static str = "in attribute value";
pub const ERRCTX_XML_DECL: &'static str = "in XML declaration";
pub const ERRCTX_COMMENT: &'static str = "in comment";
pub const ERRCTX_CDATA_SECTION: &'static str = "in CDATA section";
pub const ERRCTX_PI: &'static str = "in processing instruction";
pub const ERRCTX_DOCTYPE: &'static str = "in document type declaration";
pub const ERRCTX_REF: &'static str = "in entity or character reference";
