//! Flat per-entry records produced by the accumulator.

/// Surface forms split by commonness marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tiered {
    pub priority: Vec<String>,
    pub ordinary: Vec<String>,
}

impl Tiered {
    pub fn push(&mut self, value: String, priority: bool) {
        if priority {
            self.priority.push(value);
        } else {
            self.ordinary.push(value);
        }
    }

    pub fn priority_field(&self) -> String {
        self.priority.join(" ")
    }

    pub fn ordinary_field(&self) -> String {
        self.ordinary.join(" ")
    }

    /// Inverse of [`Tiered::priority_field`] / [`Tiered::ordinary_field`].
    pub fn from_fields(priority: &str, ordinary: &str) -> Self {
        fn split(field: &str) -> Vec<String> {
            field
                .split(' ')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        }
        Self {
            priority: split(priority),
            ordinary: split(ordinary),
        }
    }
}

/// Per-sense metadata element kinds, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Pos,
    Xref,
    Ant,
    Misc,
    Lsource,
    Dial,
    SInf,
    Field,
}

impl MetadataKind {
    pub const ALL: [MetadataKind; 8] = [
        Self::Pos,
        Self::Xref,
        Self::Ant,
        Self::Misc,
        Self::Lsource,
        Self::Dial,
        Self::SInf,
        Self::Field,
    ];

    /// Source element name; also the store column name.
    pub fn element(self) -> &'static str {
        match self {
            Self::Pos => "pos",
            Self::Xref => "xref",
            Self::Ant => "ant",
            Self::Misc => "misc",
            Self::Lsource => "lsource",
            Self::Dial => "dial",
            Self::SInf => "s_inf",
            Self::Field => "field",
        }
    }

    pub fn from_element(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.element() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A metadata column value: either no data at all, or one list per sense
/// group. `Absent` is stored as SQL NULL, never as `[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataArray {
    Absent,
    Groups(Vec<Vec<String>>),
}

impl MetadataArray {
    /// `Absent` when every group is empty (or there are no groups).
    pub fn from_groups(groups: Vec<Vec<String>>) -> Self {
        if groups.iter().all(Vec::is_empty) {
            Self::Absent
        } else {
            Self::Groups(groups)
        }
    }

    /// JSON text for a store column, `None` for the absent marker.
    pub fn encode(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            Self::Absent => Ok(None),
            Self::Groups(groups) => serde_json::to_string(groups).map(Some),
        }
    }

    pub fn decode(column: Option<&str>) -> Result<Self, serde_json::Error> {
        match column {
            None => Ok(Self::Absent),
            Some(json) => serde_json::from_str(json).map(Self::Groups),
        }
    }
}

/// Metadata arrays of an entry, one list of values per primary-language
/// sense group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenseMetadata {
    arrays: [Vec<Vec<String>>; 8],
}

impl SenseMetadata {
    pub fn groups(&self, kind: MetadataKind) -> &[Vec<String>] {
        &self.arrays[kind.index()]
    }

    /// Append one sense group's worth of values for every kind.
    pub fn push_group(&mut self, group: SenseGroupMetadata) {
        for (array, values) in self.arrays.iter_mut().zip(group.values) {
            array.push(values);
        }
    }

    pub fn array(&self, kind: MetadataKind) -> MetadataArray {
        MetadataArray::from_groups(self.arrays[kind.index()].clone())
    }

    pub fn group_count(&self) -> usize {
        self.arrays[0].len()
    }
}

/// Metadata values collected inside a single sense element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenseGroupMetadata {
    values: [Vec<String>; 8],
}

impl SenseGroupMetadata {
    pub fn push(&mut self, kind: MetadataKind, value: String) {
        self.values[kind.index()].push(value);
    }
}

/// One dictionary headword record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub seq: i64,
    pub writings: Tiered,
    pub readings: Tiered,
    pub metadata: SenseMetadata,
}

/// Glosses of one entry in one language: sense groups of gloss strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub seq: i64,
    pub lang: String,
    pub senses: Vec<Vec<String>>,
}

impl Translation {
    /// The `[["gloss", ...], ...]` payload stored per row.
    pub fn gloss_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.senses)
    }
}

/// A completed entry together with every translation flushed while it was
/// being accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub entry: Entry,
    pub translations: Vec<Translation>,
}
