use std::path::Path;

use serde::Serialize;
use tantivy::{
    Index,
    IndexReader,
    IndexWriter,
    TantivyDocument,
    collector::{Count, TopDocs},
    query::QueryParser,
    schema::*,
};

use crate::{
    error::{Error, Result},
    lemma::{self, TOKENIZER_NAME},
    record::Record,
    transducer::RecordSink,
};

/// Field names used in the schema.
pub mod fields {
    pub const IMAGE_ID: &str = "image_id";
    pub const H: &str = "h";
    pub const W: &str = "w";
    pub const Y: &str = "y";
    pub const X: &str = "x";
    pub const ATTRIBUTE: &str = "attribute";
    pub const RELATIONSHIP: &str = "relationship";
}

/// Default memory budget for the index writer, in bytes.
const WRITER_MEMORY: usize = 50_000_000;

/// Manages the Tantivy index that holds flattened annotation records.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    schema: Schema,
}

/// Resolved field handles for the schema.
#[derive(Clone, Copy)]
pub struct SchemaFields {
    pub image_id: Field,
    pub h: Field,
    pub w: Field,
    pub y: Field,
    pub x: Field,
    pub attribute: Field,
    pub relationship: Field,
}

/// A search result from the index.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    pub terms: Vec<String>,
}

fn build_schema() -> (Schema, SchemaFields) {
    let mut builder = Schema::builder();

    // Geometry travels with the record but is never searched on.
    let image_id = builder.add_i64_field(fields::IMAGE_ID, STORED);
    let h = builder.add_i64_field(fields::H, STORED);
    let w = builder.add_i64_field(fields::W, STORED);
    let y = builder.add_i64_field(fields::Y, STORED);
    let x = builder.add_i64_field(fields::X, STORED);

    let term_opts = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TOKENIZER_NAME)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();
    let attribute = builder.add_text_field(fields::ATTRIBUTE, term_opts.clone());
    let relationship = builder.add_text_field(fields::RELATIONSHIP, term_opts);

    let schema = builder.build();
    let fields = SchemaFields {
        image_id,
        h,
        w,
        y,
        x,
        attribute,
        relationship,
    };

    (schema, fields)
}

fn register_tokenizers(index: &Index) {
    index
        .tokenizers()
        .register(TOKENIZER_NAME, lemma::english_analyzer());
}

fn destination_error(dir: &Path, reason: impl ToString) -> Error {
    Error::Destination {
        path: dir.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl SearchIndex {
    /// Open or create the index at the given directory. Every failure
    /// on this path means the destination is unusable.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| destination_error(dir, e))?;
        let (schema, _) = build_schema();

        let mmap_dir = tantivy::directory::MmapDirectory::open(dir)
            .map_err(|e| destination_error(dir, e))?;
        let index = if Index::exists(&mmap_dir)
            .map_err(|e| destination_error(dir, e))?
        {
            Index::open(mmap_dir).map_err(|e| destination_error(dir, e))?
        } else {
            Index::create(
                mmap_dir,
                schema.clone(),
                tantivy::IndexSettings::default(),
            )
            .map_err(|e| destination_error(dir, e))?
        };

        register_tokenizers(&index);
        let reader = index.reader()?;

        Ok(Self {
            index,
            reader,
            schema,
        })
    }

    /// Create an in-memory index (for testing).
    pub fn open_in_ram() -> Result<Self> {
        let (schema, _) = build_schema();
        let index = Index::create_in_ram(schema.clone());
        register_tokenizers(&index);
        let reader = index.reader()?;

        Ok(Self {
            index,
            reader,
            schema,
        })
    }

    /// Get the resolved field handles.
    pub fn fields(&self) -> SchemaFields {
        let f = |name: &str| self.schema.get_field(name).unwrap();
        SchemaFields {
            image_id: f(fields::IMAGE_ID),
            h: f(fields::H),
            w: f(fields::W),
            y: f(fields::Y),
            x: f(fields::X),
            attribute: f(fields::ATTRIBUTE),
            relationship: f(fields::RELATIONSHIP),
        }
    }

    fn terms_field(&self, name: &str) -> Result<Field> {
        self.schema.get_field(name).map_err(|_| {
            Error::Config(format!("no such terms field: {name}"))
        })
    }

    /// Search one terms field with BM25 scoring.
    pub fn search(
        &self,
        query_str: &str,
        field_name: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let field = self.terms_field(field_name)?;
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let parser = QueryParser::for_index(&self.index, vec![field]);
        let (query, _errors) = parser.parse_query_lenient(query_str);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let f = self.fields();
        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            results.push(SearchHit {
                score,
                image_id: extract_i64(&doc, f.image_id),
                h: extract_i64(&doc, f.h),
                w: extract_i64(&doc, f.w),
                y: extract_i64(&doc, f.y),
                x: extract_i64(&doc, f.x),
                terms: extract_terms(&doc, field),
            });
        }

        Ok(results)
    }

    /// Count records whose terms field matches every given term. This
    /// is the contract the vote classifier consumes: a count of
    /// matching records for a term combination in one field.
    pub fn count_matching(
        &self,
        field_name: &str,
        terms: &[&str],
    ) -> Result<usize> {
        let field = self.terms_field(field_name)?;
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let mut parser = QueryParser::for_index(&self.index, vec![field]);
        parser.set_conjunction_by_default();
        let (query, _errors) = parser.parse_query_lenient(&terms.join(" "));

        Ok(searcher.search(&query, &Count)?)
    }

    /// Number of records visible to searches.
    pub fn num_docs(&self) -> Result<u64> {
        self.reader.reload()?;
        Ok(self.reader.searcher().num_docs())
    }

    /// Create a writer with the given memory budget (in bytes).
    pub fn writer(&self, memory_budget: usize) -> Result<IndexWriter> {
        Ok(self.index.writer(memory_budget)?)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").finish_non_exhaustive()
    }
}

/// Writes completed records into the search index.
///
/// The underlying writer serializes concurrent adds, so one sink can be
/// shared (`&IndexSink` is itself a sink) by transducers running over
/// independent input files.
pub struct IndexSink {
    index: SearchIndex,
    writer: IndexWriter,
}

impl std::fmt::Debug for IndexSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSink").finish_non_exhaustive()
    }
}

impl IndexSink {
    /// Open the destination. Fails before a single input token is read
    /// if the directory or the writer lock is unusable.
    pub fn open(dir: &Path) -> Result<Self> {
        let index = SearchIndex::open(dir)?;
        let writer = index
            .writer(WRITER_MEMORY)
            .map_err(|e| destination_error(dir, e))?;
        Ok(Self { index, writer })
    }

    /// In-memory sink (for testing).
    pub fn open_in_ram() -> Result<Self> {
        let index = SearchIndex::open_in_ram()?;
        let writer = index.writer(WRITER_MEMORY)?;
        Ok(Self { index, writer })
    }

    /// Add one record under the given terms field. Unset geometry slots
    /// are omitted from the stored document; each term becomes one
    /// value of the multivalued text field, preserving order and
    /// duplicates.
    pub fn add(&self, record: &Record, terms_field: &str) -> Result<()> {
        let f = self.index.fields();
        let field = self.index.terms_field(terms_field)?;

        let mut doc = TantivyDocument::default();
        if let Some(v) = record.image_id {
            doc.add_i64(f.image_id, v);
        }
        if let Some(v) = record.h {
            doc.add_i64(f.h, v);
        }
        if let Some(v) = record.w {
            doc.add_i64(f.w, v);
        }
        if let Some(v) = record.y {
            doc.add_i64(f.y, v);
        }
        if let Some(v) = record.x {
            doc.add_i64(f.x, v);
        }
        for term in &record.terms {
            doc.add_text(field, term);
        }

        self.writer.add_document(doc)?;
        Ok(())
    }

    /// Commit pending records so searches can see them.
    pub fn commit(&mut self) -> Result<()> {
        self.writer.commit().map_err(Error::Flush)?;
        Ok(())
    }

    /// The index this sink writes into.
    pub fn index(&self) -> &SearchIndex {
        &self.index
    }
}

impl RecordSink for IndexSink {
    fn emit(&mut self, record: Record, terms_field: &'static str) -> Result<()> {
        self.add(&record, terms_field)
    }
}

impl RecordSink for &IndexSink {
    fn emit(&mut self, record: Record, terms_field: &'static str) -> Result<()> {
        self.add(&record, terms_field)
    }
}

fn extract_i64(doc: &TantivyDocument, field: Field) -> Option<i64> {
    doc.get_first(field).and_then(|v| v.as_i64())
}

fn extract_terms(doc: &TantivyDocument, field: Field) -> Vec<String> {
    doc.get_all(field)
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(terms: &[&str]) -> Record {
        Record {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            ..Record::default()
        }
    }

    #[test]
    fn add_and_search() {
        let mut sink = IndexSink::open_in_ram().unwrap();
        let mut rec = record(&["red", "apple"]);
        rec.image_id = Some(7);
        rec.x = Some(2);
        sink.add(&rec, fields::ATTRIBUTE).unwrap();
        sink.commit().unwrap();

        let hits = sink.index().search("red", fields::ATTRIBUTE, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].image_id, Some(7));
        assert_eq!(hits[0].x, Some(2));
        assert_eq!(hits[0].h, None);
        assert_eq!(hits[0].terms, vec!["red", "apple"]);
    }

    #[test]
    fn fields_are_isolated_per_mode() {
        let mut sink = IndexSink::open_in_ram().unwrap();
        sink.add(&record(&["on", "table"]), fields::RELATIONSHIP)
            .unwrap();
        sink.add(&record(&["red"]), fields::ATTRIBUTE).unwrap();
        sink.commit().unwrap();

        let idx = sink.index();
        assert_eq!(idx.search("table", fields::RELATIONSHIP, 10).unwrap().len(), 1);
        assert!(idx.search("table", fields::ATTRIBUTE, 10).unwrap().is_empty());
    }

    #[test]
    fn queries_stem_like_stored_terms() {
        // Stored terms went through the stemmer; a plural query must
        // still match because the query parser runs the same chain.
        let mut sink = IndexSink::open_in_ram().unwrap();
        sink.add(&record(&["dog"]), fields::ATTRIBUTE).unwrap();
        sink.commit().unwrap();

        let hits = sink.index().search("dogs", fields::ATTRIBUTE, 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn count_matching_is_conjunctive() {
        let mut sink = IndexSink::open_in_ram().unwrap();
        sink.add(&record(&["cup", "on", "table"]), fields::RELATIONSHIP)
            .unwrap();
        sink.add(&record(&["cup", "under", "table"]), fields::RELATIONSHIP)
            .unwrap();
        sink.commit().unwrap();

        let idx = sink.index();
        assert_eq!(
            idx.count_matching(fields::RELATIONSHIP, &["cup", "table"])
                .unwrap(),
            2
        );
        assert_eq!(
            idx.count_matching(fields::RELATIONSHIP, &["cup", "on", "table"])
                .unwrap(),
            1
        );
        assert_eq!(
            idx.count_matching(fields::RELATIONSHIP, &["cup", "beside"])
                .unwrap(),
            0
        );
    }

    #[test]
    fn duplicate_terms_are_stored() {
        let mut sink = IndexSink::open_in_ram().unwrap();
        sink.add(&record(&["red", "red", "round"]), fields::ATTRIBUTE)
            .unwrap();
        sink.commit().unwrap();

        let hits = sink.index().search("red", fields::ATTRIBUTE, 10).unwrap();
        assert_eq!(hits[0].terms, vec!["red", "red", "round"]);
    }

    #[test]
    fn unknown_field_is_a_config_error() {
        let idx = SearchIndex::open_in_ram().unwrap();
        match idx.search("x", "nonsense", 10) {
            Err(Error::Config(_)) => {}
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn disk_persistence() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");

        {
            let mut sink = IndexSink::open(&dir).unwrap();
            sink.add(&record(&["persistent"]), fields::ATTRIBUTE).unwrap();
            sink.commit().unwrap();
        }

        {
            let idx = SearchIndex::open(&dir).unwrap();
            let hits = idx.search("persistent", fields::ATTRIBUTE, 10).unwrap();
            assert_eq!(hits.len(), 1);
        }
    }

    #[test]
    fn unusable_destination_fails_up_front() {
        let tmp = tempfile::tempdir().unwrap();
        let file_in_the_way = tmp.path().join("not-a-dir");
        std::fs::write(&file_in_the_way, "x").unwrap();

        match IndexSink::open(&file_in_the_way) {
            Err(Error::Destination { path, .. }) => {
                assert_eq!(path, file_in_the_way);
            }
            other => panic!("expected destination error, got {other:?}"),
        }
    }
}
