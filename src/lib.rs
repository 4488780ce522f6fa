//! scenedex - a searchable index over Visual Genome region annotations.
//!
//! scenedex streams the large per-image JSON dumps that ship with
//! [Visual Genome](https://homes.cs.washington.edu/~ranjay/visualgenome/)
//! (object attributes and relationship triples) and flattens them into
//! compact records keyed by lemmatized text, stored in a
//! [Tantivy](https://github.com/quickwit-oss/tantivy) full-text index.
//! The conversion is a single forward pass over the token stream: the
//! dumps are far larger than working memory, so at most one pending
//! record exists at a time and record boundaries are inferred from
//! field names rather than array positions.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//!
//! use scenedex::{SearchIndex, ingestion, tantivy_index::fields};
//!
//! let inputs = vec![PathBuf::from("attributes.json")];
//! let index_dir = Path::new("index");
//!
//! let emitted = ingestion::index_attributes(&inputs, index_dir).unwrap();
//! println!("{emitted} records");
//!
//! let index = SearchIndex::open(index_dir).unwrap();
//! for hit in index.search("red apple", fields::ATTRIBUTE, 10).unwrap() {
//!     println!("{:?} (score: {:.3})", hit.image_id, hit.score);
//! }
//! ```

pub mod cli;
pub mod data_dir;
pub mod error;
pub mod ingestion;
pub mod lemma;
pub mod record;
pub mod search;
pub mod tantivy_index;
pub mod token_cursor;
pub mod transducer;
pub mod vote;

pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use lemma::{Lemmatizer, StemLemmatizer};
pub use record::{Record, RecordAccumulator};
pub use tantivy_index::{IndexSink, SearchHit, SearchIndex};
pub use token_cursor::{RawToken, TokenCursor};
pub use transducer::{Mode, RecordSink, Transducer, VecSink};
