use crate::framework::{Model, RelationDef};
use crate::model::{Comment, User};

/// A group of users sharing a schedule.
#[derive(Debug, Clone, Copy)]
pub struct Team;

impl Model for Team {
    fn name(&self) -> &'static str {
        "Team"
    }

    fn fillable(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn relations(&self) -> Vec<RelationDef> {
        vec![
            RelationDef::has_many("members", &User),
            RelationDef::has_one("lead", &User).key("leadOf"),
            RelationDef::morph_many("comments", &Comment).key("commentable"),
        ]
    }
}
