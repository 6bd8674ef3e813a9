use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::{Line, Placement, Rect};
use crate::tree::NodeId;

/// Position among a parent's children: a concrete index or "after the last child".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertionIndex {
    At(usize),
    End,
}

impl InsertionIndex {
    /// Concrete index for a parent with `len` children.
    #[inline]
    pub fn resolve(self, len: usize) -> usize {
        match self {
            InsertionIndex::At(index) => index.min(len),
            InsertionIndex::End => len,
        }
    }

    /// Same position with a concrete index pulled back into `0..=len`.
    #[inline]
    pub fn clamped(self, len: usize) -> Self {
        match self {
            InsertionIndex::At(index) => InsertionIndex::At(index.min(len)),
            InsertionIndex::End => InsertionIndex::End,
        }
    }
}

impl Serialize for InsertionIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InsertionIndex::At(index) => serializer.serialize_u64(*index as u64),
            InsertionIndex::End => serializer.serialize_str("end"),
        }
    }
}

impl<'de> Deserialize<'de> for InsertionIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            At(usize),
            Keyword(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::At(index) => Ok(InsertionIndex::At(index)),
            Repr::Keyword(keyword) if keyword == "end" => Ok(InsertionIndex::End),
            Repr::Keyword(other) => Err(D::Error::custom(format!(
                "expected an index or \"end\", found {other:?}"
            ))),
        }
    }
}

/// Zone of the hovered element the pointer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropArea {
    Top,
    Bottom,
    Middle,
    /// The node has no renderable children (collapsed or childless).
    InsideEmpty,
}

impl DropArea {
    /// Edge hits mean "insert as a sibling", so the container is the hovered node's parent.
    #[inline]
    pub fn is_edge(self) -> bool {
        matches!(self, DropArea::Top | DropArea::Bottom)
    }
}

/// Collision candidate before ancestor resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DropCandidate {
    pub node: NodeId,
    pub area: DropArea,
    pub rect: Rect,
}

/// Drop target as reported by the collision layer for an already swapped candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDropTarget {
    pub node: NodeId,
    pub insertion: InsertionIndex,
    pub area: DropArea,
    pub rect: Rect,
    /// Depth-zero insertion line; the engine indents it.
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDropTarget {
    pub parent: NodeId,
    pub insertion: InsertionIndex,
    pub placement: Placement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_index_serializes_as_number_or_end() {
        assert_eq!(
            serde_json::to_string(&InsertionIndex::At(3)).unwrap(),
            "3"
        );
        assert_eq!(
            serde_json::to_string(&InsertionIndex::End).unwrap(),
            "\"end\""
        );
        assert_eq!(
            serde_json::from_str::<InsertionIndex>("\"end\"").unwrap(),
            InsertionIndex::End
        );
        assert!(serde_json::from_str::<InsertionIndex>("\"start\"").is_err());
    }

    #[test]
    fn resolve_clamps_to_len() {
        assert_eq!(InsertionIndex::At(7).resolve(2), 2);
        assert_eq!(InsertionIndex::End.resolve(4), 4);
    }
}
