//! Profile MCP Tools
//!
//! Tools for creating, reading, and merge-updating user profiles.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::db::{Database, DbError};
use crate::models::{NutritionData, NutritionProfileUpdate, ProfileSummary, UserProfile};
use crate::nutrition::{NutritionReport, NutritionRequest};

const MAX_LIST_LIMIT: i64 = 200;

/// Response for save_nutrition_profile
#[derive(Debug, Serialize)]
pub struct SaveNutritionProfileResponse {
    pub user_id: String,
    pub report: NutritionReport,
    pub preferences: Vec<String>,
    pub restrictions: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub profile_complete: bool,
    pub updated_at: String,
}

/// Response for list_profiles
#[derive(Debug, Serialize)]
pub struct ListProfilesResponse {
    pub profiles: Vec<ProfileSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for delete_profile
#[derive(Debug, Serialize)]
pub struct DeleteProfileResponse {
    pub user_id: String,
    pub deleted: bool,
}

/// Create a profile with empty preference lists
pub fn create_profile(db: &Database, user_id: &str, name: &str, email: &str) -> Result<UserProfile, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    UserProfile::create(&conn, user_id, name, email).map_err(|e| match e {
        DbError::Conflict(what) => format!("{} already exists", what),
        other => format!("Failed to create profile: {}", other),
    })
}

pub fn get_profile(db: &Database, user_id: &str) -> Result<Option<UserProfile>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    UserProfile::get(&conn, user_id).map_err(|e| format!("Failed to get profile: {}", e))
}

/// Merge a partial JSON document into a profile
pub fn update_profile(db: &Database, user_id: &str, patch: &Value) -> Result<UserProfile, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    UserProfile::merge(&conn, user_id, patch).map_err(|e| format!("Failed to update profile: {}", e))
}

/// Store a calculation with the user's lists and mark the profile complete.
///
/// `report` must come from `request`; callers validate before saving.
pub fn save_nutrition_profile(
    db: &Database,
    user_id: &str,
    request: &NutritionRequest,
    report: &NutritionReport,
    preferences: Option<Vec<String>>,
    restrictions: Option<Vec<String>>,
) -> Result<SaveNutritionProfileResponse, String> {
    let update = NutritionProfileUpdate {
        nutrition_data: Some(NutritionData::new(request, report.result.clone())),
        preferences,
        restrictions,
        medical_conditions: Some(request.medical_conditions.clone()),
        profile_complete: Some(true),
    };
    let patch = update.to_patch().map_err(|e| format!("Failed to build profile update: {}", e))?;

    let profile = update_profile(db, user_id, &patch)?;
    info!(
        user_id,
        calorie_target = report.result.calorie_target,
        "Saved nutrition profile"
    );

    Ok(SaveNutritionProfileResponse {
        user_id: profile.user_id,
        report: report.clone(),
        preferences: profile.profile.preferences,
        restrictions: profile.profile.restrictions,
        medical_conditions: profile.profile.medical_conditions,
        profile_complete: profile.profile.profile_complete,
        updated_at: profile.updated_at,
    })
}

pub fn delete_profile(db: &Database, user_id: &str) -> Result<DeleteProfileResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = UserProfile::delete(&conn, user_id)
        .map_err(|e| format!("Failed to delete profile: {}", e))?;
    Ok(DeleteProfileResponse {
        user_id: user_id.to_string(),
        deleted,
    })
}

pub fn list_profiles(db: &Database, limit: i64, offset: i64) -> Result<ListProfilesResponse, String> {
    let limit = limit.clamp(1, MAX_LIST_LIMIT);
    let offset = offset.max(0);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let profiles = UserProfile::list(&conn, limit, offset)
        .map_err(|e| format!("Failed to list profiles: {}", e))?;
    let total = UserProfile::count(&conn).map_err(|e| format!("Failed to count profiles: {}", e))?;

    Ok(ListProfilesResponse {
        profiles,
        total,
        limit,
        offset,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::{migrations, Database};
    use tempfile::TempDir;

    /// A migrated database in a temporary directory
    pub fn test_database() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("nutriplan.db")).unwrap();
        db.with_conn(|conn| migrations::run_migrations(conn)).unwrap();
        (dir, db)
    }
}
