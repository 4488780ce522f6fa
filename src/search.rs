use crate::{
    cli::SearchArgs,
    error::Result,
    tantivy_index::{SearchHit, SearchIndex},
};

/// Execute a search over the chosen terms field.
pub fn execute_search(
    args: &SearchArgs,
    index: &SearchIndex,
) -> Result<Vec<SearchHit>> {
    index.search(&args.query, args.field.name(), args.count)
}

/// Format results for human-readable terminal output.
pub fn format_human(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results found.");
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        let image = hit
            .image_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "{:>3}. [{:.3}] image {image}: {}",
            i + 1,
            hit.score,
            hit.terms.join(" ")
        );
        if let (Some(x), Some(y), Some(w), Some(h)) = (hit.x, hit.y, hit.w, hit.h)
        {
            println!("     region {w}x{h} at ({x}, {y})");
        }
    }
    println!("\n{} result(s)", hits.len());
}

/// Format results as JSON output.
pub fn format_json(hits: &[SearchHit], query: &str) {
    let payload = serde_json::json!({
        "query": query,
        "result_count": hits.len(),
        "results": hits,
    });
    println!("{payload}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cli::TermsField,
        record::Record,
        tantivy_index::{IndexSink, fields},
    };

    fn make_search_args(query: &str, field: TermsField) -> SearchArgs {
        SearchArgs {
            query: query.to_string(),
            field,
            count: 10,
            json: false,
            index_dir: None,
        }
    }

    fn seeded_sink() -> IndexSink {
        let mut sink = IndexSink::open_in_ram().unwrap();
        let attribute = Record {
            image_id: Some(1),
            terms: vec!["red".into(), "round".into()],
            ..Record::default()
        };
        let relationship = Record {
            image_id: Some(2),
            terms: vec!["cup".into(), "on".into(), "table".into()],
            ..Record::default()
        };
        sink.add(&attribute, fields::ATTRIBUTE).unwrap();
        sink.add(&relationship, fields::RELATIONSHIP).unwrap();
        sink.commit().unwrap();
        sink
    }

    #[test]
    fn searches_the_requested_field() {
        let sink = seeded_sink();
        let args = make_search_args("red", TermsField::Attribute);
        let hits = execute_search(&args, sink.index()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].image_id, Some(1));
    }

    #[test]
    fn other_field_does_not_bleed_in() {
        let sink = seeded_sink();
        let args = make_search_args("red", TermsField::Relationship);
        let hits = execute_search(&args, sink.index()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn count_limits_results() {
        let mut sink = IndexSink::open_in_ram().unwrap();
        for _ in 0..5 {
            let rec = Record {
                terms: vec!["dog".into()],
                ..Record::default()
            };
            sink.add(&rec, fields::ATTRIBUTE).unwrap();
        }
        sink.commit().unwrap();

        let mut args = make_search_args("dog", TermsField::Attribute);
        args.count = 3;
        let hits = execute_search(&args, sink.index()).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn hits_serialize_without_absent_geometry() {
        let sink = seeded_sink();
        let args = make_search_args("red", TermsField::Attribute);
        let hits = execute_search(&args, sink.index()).unwrap();
        let json = serde_json::to_value(&hits[0]).unwrap();
        assert_eq!(json["image_id"], 1);
        assert!(json.get("x").is_none());
    }
}
