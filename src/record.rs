/// Geometry slots a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySlot {
    ImageId,
    H,
    W,
    Y,
    X,
}

impl GeometrySlot {
    /// Map a JSON field name onto a slot.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "image_id" => Some(Self::ImageId),
            "h" => Some(Self::H),
            "w" => Some(Self::W),
            "y" => Some(Self::Y),
            "x" => Some(Self::X),
            _ => None,
        }
    }
}

/// One flattened, searchable unit of output: a region's attributes or
/// one relationship triple, reduced to lemmatized terms plus whatever
/// geometry the surrounding object carried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub image_id: Option<i64>,
    pub h: Option<i64>,
    pub w: Option<i64>,
    pub y: Option<i64>,
    pub x: Option<i64>,
    /// Lemmatized terms, insertion-ordered. Duplicates are meaningful
    /// (they weight the term) and are kept.
    pub terms: Vec<String>,
}

/// Accumulates the record currently being built.
///
/// All mutation funnels through these methods; the transducer is
/// single-threaded, so `snapshot_and_reset` is atomic from its
/// perspective.
#[derive(Debug, Default)]
pub struct RecordAccumulator {
    pending: Record,
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a geometry value, overwriting any prior value in the slot.
    pub fn set_geometry(&mut self, slot: GeometrySlot, value: i64) {
        let field = match slot {
            GeometrySlot::ImageId => &mut self.pending.image_id,
            GeometrySlot::H => &mut self.pending.h,
            GeometrySlot::W => &mut self.pending.w,
            GeometrySlot::Y => &mut self.pending.y,
            GeometrySlot::X => &mut self.pending.x,
        };
        *field = Some(value);
    }

    /// Append terms in order.
    pub fn append_terms<I>(&mut self, terms: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.pending.terms.extend(terms);
    }

    /// True until the first term is appended. Geometry alone does not
    /// make a record emittable.
    pub fn is_empty(&self) -> bool {
        self.pending.terms.is_empty()
    }

    /// Hand off the accumulated record and start the next one fresh.
    pub fn snapshot_and_reset(&mut self) -> Record {
        std::mem::take(&mut self.pending)
    }

    /// Drop everything accumulated so far, geometry included.
    pub fn reset(&mut self) {
        self.pending = Record::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_is_last_write_wins() {
        let mut acc = RecordAccumulator::new();
        acc.set_geometry(GeometrySlot::X, 1);
        acc.set_geometry(GeometrySlot::X, 2);
        acc.append_terms(["dog".to_string()]);
        let record = acc.snapshot_and_reset();
        assert_eq!(record.x, Some(2));
    }

    #[test]
    fn terms_keep_order_and_duplicates() {
        let mut acc = RecordAccumulator::new();
        acc.append_terms(["b".to_string(), "a".to_string()]);
        acc.append_terms(["b".to_string()]);
        let record = acc.snapshot_and_reset();
        assert_eq!(record.terms, vec!["b", "a", "b"]);
    }

    #[test]
    fn empty_tracks_terms_not_geometry() {
        let mut acc = RecordAccumulator::new();
        assert!(acc.is_empty());
        acc.set_geometry(GeometrySlot::ImageId, 7);
        assert!(acc.is_empty());
        acc.append_terms(["cat".to_string()]);
        assert!(!acc.is_empty());
    }

    #[test]
    fn snapshot_resets_everything() {
        let mut acc = RecordAccumulator::new();
        acc.set_geometry(GeometrySlot::H, 10);
        acc.append_terms(["cat".to_string()]);

        let record = acc.snapshot_and_reset();
        assert_eq!(record.h, Some(10));
        assert_eq!(record.terms, vec!["cat"]);

        assert!(acc.is_empty());
        let next = acc.snapshot_and_reset();
        assert_eq!(next, Record::default());
    }

    #[test]
    fn reset_discards_geometry() {
        let mut acc = RecordAccumulator::new();
        acc.set_geometry(GeometrySlot::W, 3);
        acc.reset();
        acc.append_terms(["cat".to_string()]);
        let record = acc.snapshot_and_reset();
        assert_eq!(record.w, None);
    }

    #[test]
    fn unknown_key_is_not_geometry() {
        assert_eq!(GeometrySlot::from_key("height"), None);
        assert_eq!(GeometrySlot::from_key("x"), Some(GeometrySlot::X));
        assert_eq!(GeometrySlot::from_key("image_id"), Some(GeometrySlot::ImageId));
    }
}
