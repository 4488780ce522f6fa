use std::io::Read;

use crate::{
    error::Result,
    lemma::Lemmatizer,
    record::{GeometrySlot, Record, RecordAccumulator},
    token_cursor::{RawToken, TokenCursor},
};

/// Receives completed records, one at a time. `terms_field` names the
/// index field the record's terms belong under.
pub trait RecordSink {
    fn emit(&mut self, record: Record, terms_field: &'static str) -> Result<()>;
}

/// Collects records in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<Record>,
    pub terms_field: Option<&'static str>,
}

impl RecordSink for VecSink {
    fn emit(&mut self, record: Record, terms_field: &'static str) -> Result<()> {
        self.terms_field = Some(terms_field);
        self.records.push(record);
        Ok(())
    }
}

/// Which flavor of Visual Genome dump is being walked.
///
/// The two dumps share most of their shape; the mode picks the field
/// name that opens a new logical record, the fields that carry text,
/// and the index field completed records are stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Attributes,
    Relationships,
}

impl Mode {
    /// The field name whose appearance closes the previous record and
    /// opens the next one.
    pub fn boundary_key(self) -> &'static str {
        match self {
            Mode::Attributes => "synsets",
            Mode::Relationships => "predicate",
        }
    }

    /// The index field completed records are stored under.
    pub fn terms_field(self) -> &'static str {
        match self {
            Mode::Attributes => "attribute",
            Mode::Relationships => "relationship",
        }
    }

    /// In the relationship dumps the boundary key's own string value
    /// (the predicate) is itself a term.
    fn captures_boundary_value(self) -> bool {
        matches!(self, Mode::Relationships)
    }

    fn classify(self, key: &str) -> KeyKind {
        if let Some(slot) = GeometrySlot::from_key(key) {
            return KeyKind::Geometry(slot);
        }
        if key == self.boundary_key() {
            return KeyKind::Boundary;
        }
        match (self, key) {
            (Mode::Attributes, "attributes") => KeyKind::AmbiguousTermArray,
            (Mode::Attributes, "names") => KeyKind::TermArray,
            (Mode::Relationships, "names") => KeyKind::TermArray,
            (Mode::Relationships, "name") => KeyKind::TermValue,
            _ => KeyKind::Irrelevant,
        }
    }
}

/// What a field name means to the machine.
#[derive(Debug, Clone, Copy)]
enum KeyKind {
    Geometry(GeometrySlot),
    Boundary,
    /// Array of term strings, but the same field name one level deeper
    /// holds structured objects instead, so a lookahead is needed.
    AmbiguousTermArray,
    /// Array of term strings, no ambiguity.
    TermArray,
    /// Single string value holding terms.
    TermValue,
    Irrelevant,
}

/// Single-pass state machine turning a token stream into flat records.
///
/// Walks the stream strictly forward, holding at most one pending
/// record. Record boundaries are inferred from field names, not array
/// positions: the dumps nest the same field names at several depths
/// with different semantics.
pub struct Transducer<'a, L: Lemmatizer> {
    mode: Mode,
    lemmatizer: &'a L,
}

impl<'a, L: Lemmatizer> Transducer<'a, L> {
    pub fn new(mode: Mode, lemmatizer: &'a L) -> Self {
        Self { mode, lemmatizer }
    }

    /// Consume the whole stream, emitting one record per boundary hit
    /// with at least one term. Returns the number of records emitted.
    pub fn run<R: Read, S: RecordSink>(
        &self,
        cursor: &mut TokenCursor<R>,
        sink: &mut S,
    ) -> Result<usize> {
        let mut acc = RecordAccumulator::new();
        let mut emitted = 0;

        loop {
            let kind = match cursor.current() {
                None => break,
                Some(RawToken::FieldName(key)) => self.mode.classify(key),
                Some(_) => KeyKind::Irrelevant,
            };

            match kind {
                KeyKind::Geometry(slot) => {
                    self.read_geometry(cursor, &mut acc, slot)?;
                }
                KeyKind::Boundary => {
                    emitted += self.finish_record(&mut acc, sink)?;
                    self.read_boundary_value(cursor, &mut acc)?;
                }
                KeyKind::AmbiguousTermArray => {
                    self.collect_disambiguated(cursor, &mut acc)?;
                }
                KeyKind::TermArray => {
                    self.collect_term_array(cursor, &mut acc)?;
                }
                KeyKind::TermValue => {
                    self.collect_term_value(cursor, &mut acc)?;
                }
                KeyKind::Irrelevant => {
                    if !cursor.advance()? {
                        break;
                    }
                }
            }
        }

        // The last record has no trailing boundary key to flush it.
        emitted += self.finish_record(&mut acc, sink)?;
        Ok(emitted)
    }

    /// Emit the pending record if it holds any terms, otherwise drop
    /// it. Either way the next record starts fresh: a discarded
    /// record's geometry must not bleed into its successor.
    fn finish_record<S: RecordSink>(
        &self,
        acc: &mut RecordAccumulator,
        sink: &mut S,
    ) -> Result<usize> {
        if acc.is_empty() {
            acc.reset();
            return Ok(0);
        }
        sink.emit(acc.snapshot_and_reset(), self.mode.terms_field())?;
        Ok(1)
    }

    /// The value after a geometry key is stored last-write-wins;
    /// anything other than an integer leaves the slot untouched.
    fn read_geometry<R: Read>(
        &self,
        cursor: &mut TokenCursor<R>,
        acc: &mut RecordAccumulator,
        slot: GeometrySlot,
    ) -> Result<()> {
        cursor.advance()?;
        if let Some(&RawToken::IntValue(value)) = cursor.current() {
            acc.set_geometry(slot, value);
            cursor.advance()?;
        }
        Ok(())
    }

    /// Step past the boundary key onto its value; in relationship mode
    /// the value is the predicate and joins the new record's terms.
    fn read_boundary_value<R: Read>(
        &self,
        cursor: &mut TokenCursor<R>,
        acc: &mut RecordAccumulator,
    ) -> Result<()> {
        cursor.advance()?;
        if !self.mode.captures_boundary_value() {
            return Ok(());
        }
        let terms = match cursor.current() {
            Some(RawToken::StringValue(text)) if !text.trim().is_empty() => {
                self.lemmatizer.lemmatize(text)
            }
            _ => return Ok(()),
        };
        acc.append_terms(terms);
        cursor.advance()?;
        Ok(())
    }

    /// A single string value carrying terms (`name` in relationships).
    fn collect_term_value<R: Read>(
        &self,
        cursor: &mut TokenCursor<R>,
        acc: &mut RecordAccumulator,
    ) -> Result<()> {
        cursor.advance()?;
        let terms = match cursor.current() {
            Some(RawToken::StringValue(text)) if !text.trim().is_empty() => {
                self.lemmatizer.lemmatize(text)
            }
            _ => return Ok(()),
        };
        acc.append_terms(terms);
        cursor.advance()?;
        Ok(())
    }

    /// An array of term strings (`names`). Anything other than an array
    /// after the key is left for the outer loop to skip.
    fn collect_term_array<R: Read>(
        &self,
        cursor: &mut TokenCursor<R>,
        acc: &mut RecordAccumulator,
    ) -> Result<()> {
        cursor.advance()?;
        if !matches!(cursor.current(), Some(RawToken::StartArray)) {
            return Ok(());
        }
        cursor.advance()?;
        self.scan_string_elements(cursor, acc)
    }

    /// The overloaded `attributes` key: at region level an array of
    /// attribute strings, inside a synset object an array of structured
    /// objects. One token of lookahead past the array start settles
    /// which form this occurrence is.
    fn collect_disambiguated<R: Read>(
        &self,
        cursor: &mut TokenCursor<R>,
        acc: &mut RecordAccumulator,
    ) -> Result<()> {
        cursor.advance()?;
        if !matches!(cursor.current(), Some(RawToken::StartArray)) {
            return Ok(());
        }
        cursor.advance()?;
        if matches!(cursor.current(), Some(RawToken::StartObject)) {
            // Structured form: collect nothing here and leave the
            // object start in place, so the outer scan visits the
            // nested fields at their own depth.
            return Ok(());
        }
        self.scan_string_elements(cursor, acc)
    }

    /// Walk array elements until the closing bracket, lemmatizing every
    /// non-blank string. Non-string elements are skipped without
    /// recursion. Expects the cursor on the first element (or the
    /// closing bracket); leaves it on the closing bracket.
    fn scan_string_elements<R: Read>(
        &self,
        cursor: &mut TokenCursor<R>,
        acc: &mut RecordAccumulator,
    ) -> Result<()> {
        loop {
            let terms = match cursor.current() {
                None | Some(RawToken::EndArray) => return Ok(()),
                Some(RawToken::StringValue(text)) if !text.trim().is_empty() => {
                    Some(self.lemmatizer.lemmatize(text))
                }
                Some(_) => None,
            };
            if let Some(terms) = terms {
                acc.append_terms(terms);
            }
            if !cursor.advance()? {
                return Ok(());
            }
        }
    }
}
