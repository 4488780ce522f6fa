use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info};

use crate::{
    error::Result,
    lemma::StemLemmatizer,
    tantivy_index::IndexSink,
    token_cursor::TokenCursor,
    transducer::{Mode, Transducer},
};

/// Index one or more attribute dumps into `index_dir`.
///
/// Returns the number of records emitted.
pub fn index_attributes(inputs: &[PathBuf], index_dir: &Path) -> Result<usize> {
    index_files(Mode::Attributes, inputs, index_dir)
}

/// Index one or more relationship dumps into `index_dir`.
///
/// Returns the number of records emitted.
pub fn index_relationships(
    inputs: &[PathBuf],
    index_dir: &Path,
) -> Result<usize> {
    index_files(Mode::Relationships, inputs, index_dir)
}

/// Stream every input through its own cursor/transducer/accumulator
/// triple. The sink is opened before any input is read, so an unusable
/// destination fails the run up front. Inputs are independent and run
/// in parallel; the index writer serializes the actual adds.
fn index_files(mode: Mode, inputs: &[PathBuf], index_dir: &Path) -> Result<usize> {
    let mut sink = IndexSink::open(index_dir)?;
    let lemmatizer = StemLemmatizer::default();

    let outcome = inputs
        .par_iter()
        .map(|input| {
            let mut cursor = TokenCursor::open(input)?;
            let transducer = Transducer::new(mode, &lemmatizer);
            let mut shared = &sink;
            let count = transducer.run(&mut cursor, &mut shared)?;
            info!(input = %input.display(), records = count, "indexed");
            Ok(count)
        })
        .collect::<Result<Vec<usize>>>();

    // Commit before propagating any stream failure: records emitted
    // up to that point stay valid and searchable. A failed commit is
    // reported but never turns a successful run into a failed one.
    if let Err(flush) = sink.commit() {
        error!(index = %index_dir.display(), "{flush}");
    }

    Ok(outcome?.into_iter().sum())
}
