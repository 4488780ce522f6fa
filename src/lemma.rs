use tantivy::tokenizer::{
    LowerCaser,
    RemoveLongFilter,
    SimpleTokenizer,
    Stemmer,
    TextAnalyzer,
    TokenStream,
};

/// Name under which the analyzer chain is registered with the index.
pub const TOKENIZER_NAME: &str = "en_stem";

/// The analyzer chain shared by the index schema and the lemmatizer:
/// word splitting, long-token removal, lowercasing, English stemming.
/// Sharing one chain keeps stored terms and query terms in agreement.
pub fn english_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(Stemmer::new(tantivy::tokenizer::Language::English))
        .build()
}

/// Reduces free text to an ordered sequence of base-form tokens.
///
/// Pure: no failure mode. Words the stemmer has no rule for pass
/// through unchanged (lowercased).
pub trait Lemmatizer: Sync {
    fn lemmatize(&self, text: &str) -> Vec<String>;
}

/// Lemmatizer backed by the index's own analyzer chain.
#[derive(Clone)]
pub struct StemLemmatizer {
    analyzer: TextAnalyzer,
}

impl Default for StemLemmatizer {
    fn default() -> Self {
        Self {
            analyzer: english_analyzer(),
        }
    }
}

impl Lemmatizer for StemLemmatizer {
    fn lemmatize(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        terms
    }
}
