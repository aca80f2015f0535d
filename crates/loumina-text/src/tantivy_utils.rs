use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer};
use tantivy::Index;

use loumina_core::Error;

/// Analyzer for pre-tokenized text: documents are fed as the shared
/// tokenizer's output joined by spaces, so splitting on whitespace restores
/// the exact token list.
pub const TOKENIZER_NAME: &str = "loumina_tokens";

/// Heap budget for the single indexing thread.
pub const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Clone, Copy)]
pub struct Fields {
    /// Position of the document in the snapshot's document table.
    pub ord: Field,
    pub text: Field,
}

pub fn build_schema() -> (Schema, Fields) {
    let mut schema_builder = Schema::builder();
    let ord = schema_builder.add_u64_field("ord", STORED);
    let text_field_indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER_NAME)
        .set_index_option(IndexRecordOption::WithFreqs);
    let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
    let text = schema_builder.add_text_field("text", text_options);
    (schema_builder.build(), Fields { ord, text })
}

pub fn register_tokenizer(index: &Index) {
    let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default()).build();
    index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}

pub(crate) fn backend(err: tantivy::TantivyError) -> Error {
    Error::index(err)
}
