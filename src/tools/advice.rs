//! AI advice MCP Tools
//!
//! Diet plans, meal suggestions and the nutrition assistant chat. Profile data
//! is read before the model call and results are written after it, so no
//! pooled connection is held across an await.

use serde::Serialize;
use tracing::{info, warn};

use crate::advice::{advise_or_fallback, prompts, AdviceService};
use crate::db::Database;
use crate::models::{ChatMessage, DietPlan, PlanType, ProfileDocument, Sender, UserProfile};

const MAX_HISTORY_LIMIT: i64 = 500;
const MAX_PLAN_LIMIT: i64 = 100;

/// Response for generate_diet_plan
#[derive(Debug, Serialize)]
pub struct GenerateDietPlanResponse {
    pub title: String,
    pub plan: DietPlan,
}

/// Response for suggest_meal
#[derive(Debug, Serialize)]
pub struct MealSuggestionResponse {
    pub user_id: String,
    pub target_calories: f64,
    pub suggestion: String,
}

/// Response for ask_nutrition_assistant
#[derive(Debug, Serialize)]
pub struct AssistantReply {
    pub reply: String,
    pub used_profile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_message: Option<ChatMessage>,
}

/// Response for clear_chat_history
#[derive(Debug, Serialize)]
pub struct ClearChatResponse {
    pub user_id: String,
    pub messages_deleted: usize,
}

fn load_document(db: &Database, user_id: &str) -> Result<ProfileDocument, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    UserProfile::get(&conn, user_id)
        .map_err(|e| format!("Failed to get profile: {}", e))?
        .map(|p| p.profile)
        .ok_or_else(|| format!("Profile '{}' not found", user_id))
}

fn missing_nutrition_data(user_id: &str) -> String {
    format!(
        "Profile '{}' has no nutrition data; call save_nutrition_profile first",
        user_id
    )
}

/// Generate a plan from the stored profile and save it.
///
/// Generation failures are returned as errors and nothing is stored.
pub async fn generate_diet_plan(
    db: &Database,
    service: &dyn AdviceService,
    user_id: &str,
    plan_type: PlanType,
) -> Result<GenerateDietPlanResponse, String> {
    let profile = load_document(db, user_id)?;
    let data = profile
        .nutrition_data
        .as_ref()
        .ok_or_else(|| missing_nutrition_data(user_id))?;

    let prompt = prompts::diet_plan_prompt(&profile, data, plan_type);
    let content = service
        .generate(&prompt)
        .await
        .map_err(|e| format!("Failed to generate diet plan: {}", e))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let plan = DietPlan::create(&conn, user_id, plan_type, &content)
        .map_err(|e| format!("Failed to save diet plan: {}", e))?;
    info!(user_id, plan_id = plan.id, plan_type = plan_type.as_str(), "Generated diet plan");

    Ok(GenerateDietPlanResponse {
        title: prompts::plan_title(&plan),
        plan,
    })
}

pub fn list_diet_plans(db: &Database, user_id: &str, limit: i64) -> Result<Vec<DietPlan>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    DietPlan::list_for_user(&conn, user_id, limit.clamp(1, MAX_PLAN_LIMIT))
        .map_err(|e| format!("Failed to list diet plans: {}", e))
}

/// One meal matching the profile's calorie target, macros and lists
pub async fn suggest_meal(
    db: &Database,
    service: &dyn AdviceService,
    user_id: &str,
) -> Result<MealSuggestionResponse, String> {
    let profile = load_document(db, user_id)?;
    let data = profile
        .nutrition_data
        .as_ref()
        .ok_or_else(|| missing_nutrition_data(user_id))?;

    let target_calories = data.result.calorie_target;
    let prompt = prompts::meal_suggestion_prompt(
        &profile.preferences,
        &profile.restrictions,
        target_calories,
        &data.result.macros,
    );
    let suggestion = advise_or_fallback(service, &prompt)
        .await
        .map_err(|e| format!("Failed to suggest meal: {}", e))?;

    Ok(MealSuggestionResponse {
        user_id: user_id.to_string(),
        target_calories,
        suggestion,
    })
}

/// Answer a question, with the user's profile as context when a user is given.
///
/// With a user, the question and reply are appended to their transcript.
pub async fn ask_nutrition_assistant(
    db: &Database,
    service: &dyn AdviceService,
    user_id: Option<&str>,
    question: &str,
) -> Result<AssistantReply, String> {
    let question = question.trim();
    if question.is_empty() {
        return Err("Question must not be empty".to_string());
    }

    let profile = match user_id {
        Some(id) => Some(load_document(db, id)?),
        None => None,
    };

    let prompt = prompts::chat_prompt(profile.as_ref(), question);
    let reply = advise_or_fallback(service, &prompt)
        .await
        .map_err(|e| format!("Failed to get assistant reply: {}", e))?;

    let (user_message, ai_message) = match user_id {
        Some(id) => {
            let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
            let asked = ChatMessage::create(&conn, id, Sender::User, question)
                .map_err(|e| format!("Failed to save chat message: {}", e))?;
            let answered = ChatMessage::create(&conn, id, Sender::Ai, &reply)
                .map_err(|e| format!("Failed to save chat message: {}", e))?;
            (Some(asked), Some(answered))
        }
        None => {
            warn!("Assistant question without a user; transcript not stored");
            (None, None)
        }
    };

    Ok(AssistantReply {
        reply,
        used_profile: profile.is_some(),
        user_message,
        ai_message,
    })
}

pub fn get_chat_history(db: &Database, user_id: &str, limit: i64) -> Result<Vec<ChatMessage>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    ChatMessage::list_for_user(&conn, user_id, limit.clamp(1, MAX_HISTORY_LIMIT))
        .map_err(|e| format!("Failed to get chat history: {}", e))
}

pub fn clear_chat_history(db: &Database, user_id: &str) -> Result<ClearChatResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let messages_deleted = ChatMessage::clear_for_user(&conn, user_id)
        .map_err(|e| format!("Failed to clear chat history: {}", e))?;
    info!(user_id, messages_deleted, "Cleared chat history");

    Ok(ClearChatResponse {
        user_id: user_id.to_string(),
        messages_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{AdviceError, Unconfigured, FALLBACK_ADVICE};
    use crate::nutrition::{calculate_nutrition, NutritionRequest};
    use crate::tools::profile::test_support::test_database;
    use crate::tools::profile::{create_profile, save_nutrition_profile};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records prompts and answers with a fixed reply
    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AdviceService for Recorder {
        async fn generate(&self, prompt: &str) -> Result<String, AdviceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Oatmeal with berries.".to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl AdviceService for Broken {
        async fn generate(&self, _prompt: &str) -> Result<String, AdviceError> {
            Err(AdviceError::Api {
                status: 500,
                message: "backend down".to_string(),
            })
        }
    }

    fn setup_user(db: &Database, with_data: bool) {
        create_profile(db, "u1", "Ada", "ada@example.com").unwrap();
        if with_data {
            let request = NutritionRequest {
                height_cm: 175.0,
                weight_kg: 70.0,
                age_years: 30,
                gender: "male".to_string(),
                activity_level: "moderate".to_string(),
                goal: "weight_loss".to_string(),
                medical_conditions: vec![],
            };
            let report = calculate_nutrition(&request).unwrap();
            save_nutrition_profile(db, "u1", &request, &report, Some(vec!["Vegan".to_string()]), None)
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_generate_diet_plan_stores_plan() {
        let (_dir, db) = test_database();
        setup_user(&db, true);
        let service = Recorder::default();

        let response = generate_diet_plan(&db, &service, "u1", PlanType::Weekly).await.unwrap();
        assert_eq!(response.title, "Your Weekly Diet Plan");
        assert_eq!(response.plan.content, "Oatmeal with berries.");

        let prompts = service.prompts.lock().unwrap();
        assert!(prompts[0].contains("- Daily calorie target: 2045 kcal"));
        assert!(prompts[0].contains("- Dietary preferences: Vegan"));

        let plans = list_diet_plans(&db, "u1", 10).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].plan_type, PlanType::Weekly);
    }

    #[tokio::test]
    async fn test_generate_diet_plan_requires_nutrition_data() {
        let (_dir, db) = test_database();
        setup_user(&db, false);
        let err = generate_diet_plan(&db, &Recorder::default(), "u1", PlanType::Daily)
            .await
            .unwrap_err();
        assert!(err.contains("no nutrition data"));
    }

    #[tokio::test]
    async fn test_generate_diet_plan_failure_stores_nothing() {
        let (_dir, db) = test_database();
        setup_user(&db, true);
        let err = generate_diet_plan(&db, &Broken, "u1", PlanType::Daily).await.unwrap_err();
        assert!(err.contains("backend down"));
        assert!(list_diet_plans(&db, "u1", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suggest_meal_uses_profile_targets() {
        let (_dir, db) = test_database();
        setup_user(&db, true);
        let service = Recorder::default();

        let response = suggest_meal(&db, &service, "u1").await.unwrap();
        assert_eq!(response.target_calories, 2045.0);
        assert_eq!(response.suggestion, "Oatmeal with berries.");
        assert!(service.prompts.lock().unwrap()[0].contains("- Target calories: 2045 kcal"));
    }

    #[tokio::test]
    async fn test_suggest_meal_falls_back() {
        let (_dir, db) = test_database();
        setup_user(&db, true);
        let response = suggest_meal(&db, &Broken, "u1").await.unwrap();
        assert_eq!(response.suggestion, FALLBACK_ADVICE);
    }

    #[tokio::test]
    async fn test_assistant_stores_transcript() {
        let (_dir, db) = test_database();
        setup_user(&db, true);
        let service = Recorder::default();

        let reply = ask_nutrition_assistant(&db, &service, Some("u1"), "  Breakfast ideas?  ")
            .await
            .unwrap();
        assert!(reply.used_profile);
        assert_eq!(reply.reply, "Oatmeal with berries.");
        assert!(service.prompts.lock().unwrap()[0].contains("- BMI: 22.9 (Normal weight)"));

        let history = get_chat_history(&db, "u1", 50).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[0].content, "Breakfast ideas?");
        assert_eq!(history[1].sender, Sender::Ai);

        assert_eq!(clear_chat_history(&db, "u1").unwrap().messages_deleted, 2);
        assert!(get_chat_history(&db, "u1", 50).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assistant_fallback_is_stored() {
        let (_dir, db) = test_database();
        setup_user(&db, false);
        let reply = ask_nutrition_assistant(&db, &Broken, Some("u1"), "Hello?").await.unwrap();
        assert_eq!(reply.reply, FALLBACK_ADVICE);
        assert_eq!(get_chat_history(&db, "u1", 50).unwrap()[1].content, FALLBACK_ADVICE);
    }

    #[tokio::test]
    async fn test_assistant_without_user() {
        let (_dir, db) = test_database();
        let reply = ask_nutrition_assistant(&db, &Recorder::default(), None, "Is fruit healthy?")
            .await
            .unwrap();
        assert!(!reply.used_profile);
        assert!(reply.user_message.is_none());
    }

    #[tokio::test]
    async fn test_assistant_rejects_blank_and_unknown_user() {
        let (_dir, db) = test_database();
        let err = ask_nutrition_assistant(&db, &Recorder::default(), None, "   ").await.unwrap_err();
        assert_eq!(err, "Question must not be empty");

        let err = ask_nutrition_assistant(&db, &Recorder::default(), Some("ghost"), "Hi")
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let (_dir, db) = test_database();
        setup_user(&db, true);
        let err = suggest_meal(&db, &Unconfigured, "u1").await.unwrap_err();
        assert!(err.contains("GEMINI_API_KEY"));
        let err = ask_nutrition_assistant(&db, &Unconfigured, Some("u1"), "Hi").await.unwrap_err();
        assert!(err.contains("GEMINI_API_KEY"));
        assert!(get_chat_history(&db, "u1", 10).unwrap().is_empty());
    }
}
