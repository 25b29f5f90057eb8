use std::str::CharIndices;

use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED};
use tantivy::tokenizer::{LowerCaser, TextAnalyzer, Token, TokenStream, Tokenizer};
use tantivy::Index;

pub const ANALYZER_NAME: &str = "lexvec_whitespace";
pub const POSITION_FIELD: &str = "pos";
pub const CONTENT_FIELD: &str = "content";

/// Splits on Unicode whitespace (`char::is_whitespace`), so no-break and
/// em spaces separate tokens the same way ordinary spaces do.
#[derive(Clone, Default)]
pub struct UnicodeWhitespaceTokenizer {
	token: Token,
}

pub struct UnicodeWhitespaceTokenStream<'a> {
	text: &'a str,
	chars: CharIndices<'a>,
	token: &'a mut Token,
}

impl Tokenizer for UnicodeWhitespaceTokenizer {
	type TokenStream<'a> = UnicodeWhitespaceTokenStream<'a>;

	fn token_stream<'a>(&'a mut self, text: &'a str) -> UnicodeWhitespaceTokenStream<'a> {
		self.token.reset();
		UnicodeWhitespaceTokenStream { text, chars: text.char_indices(), token: &mut self.token }
	}
}

impl UnicodeWhitespaceTokenStream<'_> {
	fn token_end(&mut self) -> usize {
		(&mut self.chars)
			.find(|(_, c)| c.is_whitespace())
			.map_or(self.text.len(), |(offset, _)| offset)
	}
}

impl TokenStream for UnicodeWhitespaceTokenStream<'_> {
	fn advance(&mut self) -> bool {
		self.token.text.clear();
		self.token.position = self.token.position.wrapping_add(1);
		while let Some((offset_from, c)) = self.chars.next() {
			if !c.is_whitespace() {
				let offset_to = self.token_end();
				self.token.offset_from = offset_from;
				self.token.offset_to = offset_to;
				self.token.text.push_str(&self.text[offset_from..offset_to]);
				return true;
			}
		}
		false
	}

	fn token(&self) -> &Token {
		self.token
	}

	fn token_mut(&mut self) -> &mut Token {
		self.token
	}
}

/// Whitespace split + lower-casing. No stemming and no stop words, so section
/// citations such as `§` and `164(b)(6)` survive as literal terms.
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(UnicodeWhitespaceTokenizer::default())
		.filter(LowerCaser)
		.build()
}

pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut stream = analyzer.token_stream(text);
	stream.process(&mut |token: &Token| tokens.push(token.text.clone()));
	tokens
}

/// Corpus position (stored) plus the analyzed chunk content.
pub fn build_schema() -> (Schema, Field, Field) {
	let mut schema_builder = Schema::builder();
	let pos = schema_builder.add_u64_field(POSITION_FIELD, STORED);
	let indexing = TextFieldIndexing::default()
		.set_tokenizer(ANALYZER_NAME)
		.set_index_option(IndexRecordOption::WithFreqs);
	let content = schema_builder.add_text_field(CONTENT_FIELD, TextOptions::default().set_indexing_options(indexing));
	(schema_builder.build(), pos, content)
}

pub fn register_analyzer(index: &Index) {
	index.tokenizers().register(ANALYZER_NAME, build_analyzer());
}
