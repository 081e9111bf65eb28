//! Data models
//!
//! Rust structs representing database entities.

mod chat_message;
mod diet_plan;
mod profile;

pub use chat_message::{ChatMessage, Sender};
pub use diet_plan::{DietPlan, PlanType};
pub use profile::{
    merge_documents, NutritionData, NutritionProfileUpdate, ProfileDocument, ProfileSummary,
    UserProfile, DEFAULT_GOAL,
};
