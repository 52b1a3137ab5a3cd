use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::profile::UserProfile;

pub async fn upsert_profile(
    conn: &mut SqliteConnection,
    profile: &UserProfile,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_profiles (id, display_name, email, contact_number, updated_at) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name, \
         email = excluded.email, contact_number = excluded.contact_number, \
         updated_at = excluded.updated_at",
    )
    .bind(profile.id)
    .bind(&profile.display_name)
    .bind(&profile.email)
    .bind(&profile.contact_number)
    .bind(profile.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_profile(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        "SELECT id, display_name, email, contact_number, updated_at FROM user_profiles WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}
