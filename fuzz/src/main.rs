#[macro_use]
extern crate afl;

use pullxml::{Document, EventType, ParserOptions, PullParser, Serializer};

fn drain(mut p: PullParser<'_>) {
	loop {
		match p.advance_raw() {
			Ok(EventType::EndDocument) | Err(_) => return,
			Ok(_) => (),
		}
	}
}

fn main() {
	fuzz!(|data: &[u8]| {
		let mut p = PullParser::with_options(ParserOptions::default().relaxed(true));
		if p.set_source(data, None).is_ok() {
			drain(p);
		}

		let mut p = PullParser::with_options(ParserOptions::default().process_namespaces(true));
		if p.set_source(data, None).is_err() {
			return;
		}
		if let Ok(doc) = Document::parse(&mut p) {
			let mut s = Serializer::with_output(Vec::new(), false);
			doc.write(&mut s).unwrap();
		}
	});
}
