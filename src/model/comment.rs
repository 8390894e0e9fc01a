use crate::framework::{Model, RelationDef};

/// A note attached to any commentable record (users, teams).
///
/// Comment rows carry `commentable_type` and `commentable_id`.
#[derive(Debug, Clone, Copy)]
pub struct Comment;

impl Model for Comment {
    fn name(&self) -> &'static str {
        "Comment"
    }

    fn fillable(&self) -> &'static [&'static str] {
        &["body"]
    }

    fn relations(&self) -> Vec<RelationDef> {
        vec![RelationDef::morph_to("commentable")]
    }
}
