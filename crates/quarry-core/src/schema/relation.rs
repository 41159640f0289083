use super::{FieldId, ModelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    OneToOne,
    /// Many-to-one.
    ForeignKey,
    ReverseOne,
    ReverseMany,
    ManyToMany,
    ReverseManyToMany,
}

impl RelationKind {
    /// Returns `true` when the relation owns a column on its model.
    pub fn is_forward(&self) -> bool {
        matches!(self, RelationKind::OneToOne | RelationKind::ForeignKey)
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, RelationKind::ReverseOne | RelationKind::ReverseMany)
    }

    pub fn is_many_to_many(&self) -> bool {
        matches!(
            self,
            RelationKind::ManyToMany | RelationKind::ReverseManyToMany
        )
    }

    /// Returns `true` when the relation yields at most one related record.
    pub fn is_single(&self) -> bool {
        matches!(
            self,
            RelationKind::OneToOne | RelationKind::ForeignKey | RelationKind::ReverseOne
        )
    }
}

/// A resolved relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: ModelId,
    /// Reciprocal field on the target. Always set for reverse relations.
    pub pair: Option<FieldId>,
    /// Generated join model of a many-to-many relation.
    pub through: Option<ModelId>,
}
