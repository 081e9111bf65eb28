//! Nutriplan MCP Server Implementation
//!
//! Implements the MCP server with all Nutriplan tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::advice::AdviceService;
use crate::db::Database;
use crate::models::PlanType;
use crate::nutrition::{
    calculate_nutrition, calculate_water_intake, ensure_positive, CalcError, NutritionRequest,
};
use crate::tools::status::StatusTracker;
use crate::tools::{advice, profile};

/// Nutriplan MCP Service
#[derive(Clone)]
pub struct NutriplanService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    advice: Arc<dyn AdviceService>,
    tool_router: ToolRouter<NutriplanService>,
}

impl NutriplanService {
    /// `ai_model` names the configured model, or `None` when `advice` is a stand-in
    pub fn new(
        database_path: PathBuf,
        database: Database,
        advice: Arc<dyn AdviceService>,
        ai_model: Option<String>,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path, ai_model))),
            database,
            advice,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn invalid_input(e: CalcError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

fn parse_plan_type(s: Option<&str>) -> Result<PlanType, McpError> {
    match s {
        None => Ok(PlanType::default()),
        Some(s) => PlanType::from_str(s).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid plan_type '{}'. Use daily, weekly or monthly", s),
                None,
            )
        }),
    }
}

// ============================================================================
// Calculator Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateNutritionParams {
    /// Height in centimetres
    pub height_cm: f64,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Age in whole years
    pub age_years: u32,
    /// "male" (any case); anything else is treated as female
    pub gender: String,
    /// sedentary, light, moderate, active, very_active (lowercase)
    pub activity_level: String,
    /// weight_loss, maintenance, weight_gain, muscle_gain
    pub goal: String,
    /// Conditions such as "diabetes"
    #[serde(default)]
    pub medical_conditions: Vec<String>,
}

impl From<CalculateNutritionParams> for NutritionRequest {
    fn from(p: CalculateNutritionParams) -> Self {
        NutritionRequest {
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            age_years: p.age_years,
            gender: p.gender,
            activity_level: p.activity_level,
            goal: p.goal,
            medical_conditions: p.medical_conditions,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateWaterIntakeParams {
    /// Weight in kilograms
    pub weight_kg: f64,
    /// sedentary, light, moderate, active, very_active (lowercase)
    pub activity_level: String,
}

#[derive(Debug, Serialize)]
struct WaterIntakeResponse {
    weight_kg: f64,
    activity_level: String,
    water_intake_liters: f64,
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateProfileParams {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UserIdParams {
    pub user_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateProfileParams {
    pub user_id: String,
    /// Partial profile document. Nested objects merge, everything else replaces.
    pub patch: Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveNutritionProfileParams {
    pub user_id: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    /// Replaces stored preferences when given
    pub preferences: Option<Vec<String>>,
    /// Replaces stored restrictions when given
    pub restrictions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListProfilesParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

// ============================================================================
// Advice Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateDietPlanParams {
    pub user_id: String,
    /// daily (default), weekly or monthly
    pub plan_type: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDietPlansParams {
    pub user_id: String,
    #[serde(default = "default_plan_limit")]
    pub limit: i64,
}

fn default_plan_limit() -> i64 { 10 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AskAssistantParams {
    /// Profile used as context; the exchange is stored in its chat history
    pub user_id: Option<String>,
    pub question: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChatHistoryParams {
    pub user_id: String,
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 { 50 }

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutriplanService {
    // --- Status ---

    #[tool(description = "Get the current status of the Nutriplan service including build info, database status, AI configuration, and process information")]
    async fn nutriplan_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        to_json(&tracker.get_status())
    }

    #[tool(description = "Get instructions for calculating nutrition targets, saving profiles and using the AI advice tools. Call this first when unsure which tool to use.")]
    fn nutrition_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::NUTRITION_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(NUTRITION_INSTRUCTIONS)]))
    }

    // --- Calculator ---

    #[tool(description = "Calculate BMI, ideal body weight, BMR, TDEE, daily calorie target, macro grams and water intake. Nothing is stored.")]
    fn calculate_nutrition(&self, Parameters(p): Parameters<CalculateNutritionParams>) -> Result<CallToolResult, McpError> {
        let report = calculate_nutrition(&p.into()).map_err(invalid_input)?;
        to_json(&report)
    }

    #[tool(description = "Calculate recommended daily water intake in liters from weight and activity level")]
    fn calculate_water_intake(&self, Parameters(p): Parameters<CalculateWaterIntakeParams>) -> Result<CallToolResult, McpError> {
        ensure_positive("weight_kg", p.weight_kg).map_err(invalid_input)?;
        let water_intake_liters = calculate_water_intake(p.weight_kg, &p.activity_level);
        to_json(&WaterIntakeResponse {
            weight_kg: p.weight_kg,
            activity_level: p.activity_level,
            water_intake_liters,
        })
    }

    // --- Profiles ---

    #[tool(description = "Create a user profile with empty preference lists and goal 'maintenance'")]
    fn create_profile(&self, Parameters(p): Parameters<CreateProfileParams>) -> Result<CallToolResult, McpError> {
        let result = profile::create_profile(&self.database, &p.user_id, &p.name, &p.email)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a user's full profile document")]
    fn get_profile(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = profile::get_profile(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(profile) => to_json(&profile),
            None => to_json(&serde_json::json!({ "error": "Profile not found", "user_id": p.user_id })),
        }
    }

    #[tool(description = "Merge a partial JSON document into a user's profile. Creates the profile if it does not exist.")]
    fn update_profile(&self, Parameters(p): Parameters<UpdateProfileParams>) -> Result<CallToolResult, McpError> {
        if !p.patch.is_object() {
            return Err(McpError::invalid_params("patch must be a JSON object", None));
        }
        let result = profile::update_profile(&self.database, &p.user_id, &p.patch)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Calculate nutrition targets and store them in the user's profile with preferences, restrictions and medical conditions. Marks the profile complete.")]
    fn save_nutrition_profile(&self, Parameters(p): Parameters<SaveNutritionProfileParams>) -> Result<CallToolResult, McpError> {
        let request = NutritionRequest {
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            age_years: p.age_years,
            gender: p.gender,
            activity_level: p.activity_level,
            goal: p.goal,
            medical_conditions: p.medical_conditions,
        };
        let report = calculate_nutrition(&request).map_err(invalid_input)?;
        let result = profile::save_nutrition_profile(
            &self.database,
            &p.user_id,
            &request,
            &report,
            p.preferences,
            p.restrictions,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a user profile together with its diet plans and chat history")]
    fn delete_profile(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = profile::delete_profile(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List profile summaries with pagination")]
    fn list_profiles(&self, Parameters(p): Parameters<ListProfilesParams>) -> Result<CallToolResult, McpError> {
        let result = profile::list_profiles(&self.database, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- AI Advice ---

    #[tool(description = "Generate a personalized diet plan from the user's saved nutrition profile and store it. Requires save_nutrition_profile first.")]
    async fn generate_diet_plan(&self, Parameters(p): Parameters<GenerateDietPlanParams>) -> Result<CallToolResult, McpError> {
        let plan_type = parse_plan_type(p.plan_type.as_deref())?;
        let result = advice::generate_diet_plan(&self.database, self.advice.as_ref(), &p.user_id, plan_type)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List a user's stored diet plans, newest first")]
    fn list_diet_plans(&self, Parameters(p): Parameters<ListDietPlansParams>) -> Result<CallToolResult, McpError> {
        let result = advice::list_diet_plans(&self.database, &p.user_id, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Suggest one meal matching the user's calorie target, macros, preferences and restrictions")]
    async fn suggest_meal(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = advice::suggest_meal(&self.database, self.advice.as_ref(), &p.user_id)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Ask the nutrition assistant a question. With user_id, the user's profile is used as context and the exchange is stored.")]
    async fn ask_nutrition_assistant(&self, Parameters(p): Parameters<AskAssistantParams>) -> Result<CallToolResult, McpError> {
        if p.question.trim().is_empty() {
            return Err(McpError::invalid_params("question must not be empty", None));
        }
        let result = advice::ask_nutrition_assistant(
            &self.database,
            self.advice.as_ref(),
            p.user_id.as_deref(),
            &p.question,
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get the most recent assistant messages for a user, oldest first")]
    fn get_chat_history(&self, Parameters(p): Parameters<ChatHistoryParams>) -> Result<CallToolResult, McpError> {
        let result = advice::get_chat_history(&self.database, &p.user_id, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete all stored assistant messages for a user")]
    fn clear_chat_history(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = advice::clear_chat_history(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriplanService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutriplan".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Nutriplan".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Nutriplan - Nutrition targets, user profiles and AI diet advice. \
                 IMPORTANT: Call nutrition_instructions first. \
                 Calculator: calculate_nutrition, calculate_water_intake (nothing stored). \
                 Profiles: create/get/update/delete_profile, list_profiles, save_nutrition_profile \
                 (stores a calculation and marks the profile complete). \
                 AI: generate_diet_plan, list_diet_plans, suggest_meal, ask_nutrition_assistant, \
                 get_chat_history, clear_chat_history. AI tools need GEMINI_API_KEY; \
                 check nutriplan_status. \
                 activity_level is case sensitive; always send lowercase."
                    .into(),
            ),
        }
    }
}
