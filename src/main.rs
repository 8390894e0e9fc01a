//! Demo: a staff schedule served from memory.
//!
//! 1. Start a [`RecordSystem`] with users, teams, shifts and comments.
//! 2. Fill a user through its guard policy and inspect dirty state.
//! 3. Load relations one at a time and together.

use record_kernel::framework::{Config, Field, Record};
use record_kernel::lifecycle::{setup_tracing, RecordSystem};
use record_kernel::model::{Comment, Shift, Team, User};
use serde_json::json;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let system = RecordSystem::builder()
        .model(&User)
        .model(&Team)
        .model(&Shift)
        .model(&Comment)
        .table(
            "users",
            vec![json!({ "id": 1, "name": "Alice", "email": "alice@example.com", "teamId": 5, "active": "1" })],
        )
        .table("teams", vec![json!({ "id": 5, "name": "Night" })])
        .table(
            "shifts",
            vec![
                json!({ "id": 10, "userId": 1, "hours": "8", "startsAt": "2024-03-01T22:00:00Z" }),
                json!({ "id": 11, "userId": 1, "hours": "6", "startsAt": "2024-03-02T22:00:00Z" }),
            ],
        )
        .table(
            "comments",
            vec![json!({ "id": 3, "body": "Swapped shifts", "commentable_type": "User", "commentable_id": 1 })],
        )
        .start(Config::new());

    let span = tracing::info_span!("editing");
    let mut user = async {
        let mut user = Record::hydrate(&User, system.config(), json!({ "id": 1, "name": "Alice", "teamId": 5 }))
            .map_err(|e| e.to_string())?;
        user.fill(json!({ "email": "  ALICE@Example.com ", "role": "admin", "active": "true" }))
            .map_err(|e| e.to_string())?;
        let display_name = user
            .get("displayName")
            .map_err(|e| e.to_string())?
            .and_then(Field::into_value)
            .unwrap_or_default();
        info!(
            %display_name,
            changed = ?user.get_changes(None).keys().collect::<Vec<_>>(),
            new = ?user.get_new_attributes(None).keys().collect::<Vec<_>>(),
            "User edited"
        );
        Ok::<_, String>(user)
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("loading");
    async {
        user.load(&system.client, &["team"], false)
            .await
            .map_err(|e| e.to_string())?;
        user.load(&system.client, &["shifts", "comments"], false)
            .await
            .map_err(|e| e.to_string())?;
        info!(relations = ?user.loaded_relation_keys(), "Relations loaded");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    info!(user = %user, "Final state");

    system.shutdown().await
}
