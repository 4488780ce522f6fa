//! Count-based vote queries against the persisted index.
//!
//! A vote is the number of indexed records that conjunctively match
//! every term of a combination in one field. Downstream classifiers
//! compare votes across candidate combinations.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::warn;

use crate::{
    error::Result,
    tantivy_index::{SearchIndex, fields},
};

/// Index support for a (subject, predicate, object) triple.
pub fn relationship_vote(
    index: &SearchIndex,
    subject: &str,
    predicate: &str,
    object: &str,
) -> Result<usize> {
    index.count_matching(fields::RELATIONSHIP, &[subject, predicate, object])
}

/// Index support for an (object name, attribute) pair.
pub fn attribute_vote(
    index: &SearchIndex,
    name: &str,
    attribute: &str,
) -> Result<usize> {
    index.count_matching(fields::ATTRIBUTE, &[name, attribute])
}

/// Index support for an arbitrary term combination in one field.
pub fn count_support(
    index: &SearchIndex,
    field_name: &str,
    terms: &[String],
) -> Result<usize> {
    let refs: Vec<&str> = terms.iter().map(String::as_str).collect();
    index.count_matching(field_name, &refs)
}

/// Batch-evaluate a truth file of relationship triples.
///
/// Each input line holds three comma-separated phrases; the output gets
/// the same line with the vote appended. Lines that do not split into
/// three parts are logged and skipped. Returns the number of evaluated
/// lines.
pub fn evaluate_truth_file(
    index: &SearchIndex,
    truth: &Path,
    output: &Path,
) -> Result<usize> {
    let content = std::fs::read_to_string(truth)?;
    let mut writer = BufWriter::new(File::create(output)?);
    let mut evaluated = 0;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            warn!(
                file = %truth.display(),
                line = line_no + 1,
                "skipping line without three comma-separated fields"
            );
            continue;
        }
        let (subject, predicate, object) = (parts[0], parts[1], parts[2]);

        let vote = relationship_vote(index, subject, predicate, object)?;
        writeln!(writer, "{subject},{predicate},{object},{vote}")?;
        evaluated += 1;
    }

    writer.flush()?;
    Ok(evaluated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record::Record, tantivy_index::IndexSink};

    fn seeded_sink() -> IndexSink {
        let mut sink = IndexSink::open_in_ram().unwrap();
        for terms in [
            &["cup", "on", "table"][..],
            &["plate", "on", "table"][..],
            &["cup", "under", "chair"][..],
        ] {
            let rec = Record {
                terms: terms.iter().map(|t| t.to_string()).collect(),
                ..Record::default()
            };
            sink.add(&rec, fields::RELATIONSHIP).unwrap();
        }
        let rec = Record {
            terms: vec!["apple".into(), "red".into()],
            ..Record::default()
        };
        sink.add(&rec, fields::ATTRIBUTE).unwrap();
        sink.commit().unwrap();
        sink
    }

    #[test]
    fn relationship_votes_count_conjunctive_matches() {
        let sink = seeded_sink();
        let idx = sink.index();
        assert_eq!(relationship_vote(idx, "cup", "on", "table").unwrap(), 1);
        assert_eq!(relationship_vote(idx, "fork", "on", "table").unwrap(), 0);
    }

    #[test]
    fn attribute_votes_use_the_attribute_field() {
        let sink = seeded_sink();
        let idx = sink.index();
        assert_eq!(attribute_vote(idx, "apple", "red").unwrap(), 1);
        // "table" lives only in the relationship field.
        assert_eq!(attribute_vote(idx, "table", "red").unwrap(), 0);
    }

    #[test]
    fn votes_normalize_through_the_analyzer() {
        let sink = seeded_sink();
        // Stored terms are raw here; queries stem both sides, so an
        // inflected query still counts.
        assert_eq!(
            relationship_vote(sink.index(), "cups", "on", "tables").unwrap(),
            1
        );
    }

    #[test]
    fn truth_file_round_trip() {
        let sink = seeded_sink();
        let tmp = tempfile::tempdir().unwrap();
        let truth = tmp.path().join("truth.txt");
        let results = tmp.path().join("votes.results");
        std::fs::write(
            &truth,
            "cup,on,table\n\nnot-enough-fields\nplate,on,table\n",
        )
        .unwrap();

        let evaluated =
            evaluate_truth_file(sink.index(), &truth, &results).unwrap();
        assert_eq!(evaluated, 2);

        let written = std::fs::read_to_string(&results).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["cup,on,table,1", "plate,on,table,1"]);
    }
}
