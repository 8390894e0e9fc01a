use crate::framework::{Casts, Model, RelationDef};
use crate::model::User;

/// One scheduled block of work for a [`User`].
#[derive(Debug, Clone, Copy)]
pub struct Shift;

impl Model for Shift {
    fn name(&self) -> &'static str {
        "Shift"
    }

    fn fillable(&self) -> &'static [&'static str] {
        &["*"]
    }

    fn casts(&self) -> Casts {
        Casts::from_tags([("hours", "number"), ("startsAt", "datetime")])
    }

    fn relations(&self) -> Vec<RelationDef> {
        vec![RelationDef::belongs_to("user", &User)]
    }
}
