//! Prompt templates
//!
//! Calculator output and profile lists are embedded as plain text lines.

use std::fmt::Write;

use crate::models::{DietPlan, NutritionData, PlanType, ProfileDocument};
use crate::nutrition::MacroSplit;

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn macros_line(macros: &MacroSplit) -> String {
    format!(
        "{}g protein, {}g carbs, {}g fat",
        macros.protein, macros.carbs, macros.fat
    )
}

/// A single meal matching calorie and macro targets
pub fn meal_suggestion_prompt(
    preferences: &[String],
    restrictions: &[String],
    calories: f64,
    macros: &MacroSplit,
) -> String {
    format!(
        "Generate a meal suggestion based on the following criteria:\n\
         - Dietary preferences: {}\n\
         - Dietary restrictions: {}\n\
         - Target calories: {} kcal\n\
         - Target macros: {}\n\
         \n\
         Please provide a detailed meal with ingredients, nutritional breakdown, and preparation instructions.",
        join_or(preferences, "None"),
        join_or(restrictions, "None"),
        calories,
        macros_line(macros),
    )
}

/// A personalized plan built from the stored profile
pub fn diet_plan_prompt(profile: &ProfileDocument, data: &NutritionData, plan_type: PlanType) -> String {
    let mut prompt = String::from("Generate a personalized diet plan based on the following user data:\n");
    // Writing into a String cannot fail
    let _ = writeln!(prompt, "- Age: {}", data.age_years);
    let _ = writeln!(prompt, "- Gender: {}", data.gender);
    let _ = writeln!(prompt, "- Weight: {} kg", data.weight_kg);
    let _ = writeln!(prompt, "- Height: {} cm", data.height_cm);
    let _ = writeln!(prompt, "- Activity level: {}", data.activity_level);
    let _ = writeln!(prompt, "- Goal: {}", data.goal);
    let _ = writeln!(prompt, "- Medical conditions: {}", join_or(&profile.medical_conditions, "None"));
    let _ = writeln!(prompt, "- Dietary preferences: {}", join_or(&profile.preferences, "None"));
    let _ = writeln!(prompt, "- Dietary restrictions: {}", join_or(&profile.restrictions, "None"));
    let _ = writeln!(prompt, "- Daily calorie target: {} kcal", data.result.calorie_target);
    let _ = writeln!(prompt, "- Macro targets: {}", macros_line(&data.result.macros));
    let _ = writeln!(prompt, "- Plan length: {}", plan_type.as_str());
    prompt.push_str(
        "\nPlease provide a comprehensive diet plan with:\n\
         1. Daily caloric target\n\
         2. Macronutrient breakdown\n\
         3. Meal timing recommendations\n\
         4. Sample meals for breakfast, lunch, dinner, and snacks\n\
         5. Specific nutritional considerations based on their medical conditions\n\
         6. Hydration recommendations\n\
         7. Supplement suggestions if appropriate",
    );
    prompt
}

/// Context-aware assistant prompt. Only facts that are present are listed.
pub fn chat_prompt(profile: Option<&ProfileDocument>, question: &str) -> String {
    let mut prompt = String::from(
        "You are a nutrition AI assistant helping a user with their diet and nutrition goals. ",
    );

    if let Some(profile) = profile {
        prompt.push_str("Here's some information about the user:\n");

        if let Some(data) = &profile.nutrition_data {
            let result = &data.result;
            let _ = writeln!(prompt, "- Age: {}", data.age_years);
            let _ = writeln!(prompt, "- Gender: {}", data.gender);
            let _ = writeln!(prompt, "- Height: {} cm", data.height_cm);
            let _ = writeln!(prompt, "- Weight: {} kg", data.weight_kg);
            let _ = writeln!(prompt, "- BMI: {} ({})", result.bmi, result.bmi_category);
            let _ = writeln!(prompt, "- Daily calorie target: {} kcal", result.calorie_target);
            let _ = writeln!(prompt, "- Macros: {}", macros_line(&result.macros));
        }
        if !profile.preferences.is_empty() {
            let _ = writeln!(prompt, "- Dietary preferences: {}", profile.preferences.join(", "));
        }
        if !profile.restrictions.is_empty() {
            let _ = writeln!(prompt, "- Dietary restrictions: {}", profile.restrictions.join(", "));
        }
        if !profile.medical_conditions.is_empty() {
            let _ = writeln!(prompt, "- Medical conditions: {}", profile.medical_conditions.join(", "));
        }
    }

    let _ = write!(
        prompt,
        "\nThe user's question is: \"{}\"\n\n\
         Provide a helpful, friendly, and informative response about nutrition, diet planning, \
         or healthy eating. Include specific advice when possible.",
        question
    );
    prompt
}

/// Header line shown above a saved plan
pub fn plan_title(plan: &DietPlan) -> String {
    format!("Your {} Diet Plan", plan.plan_type.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutritionData;
    use crate::nutrition::{calculate_nutrition, NutritionRequest};

    fn profile_with_data() -> ProfileDocument {
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
        ProfileDocument {
            uid: "u1".to_string(),
            preferences: vec!["Mediterranean".to_string(), "High-protein".to_string()],
            restrictions: vec![],
            medical_conditions: vec!["diabetes".to_string()],
            nutrition_data: Some(NutritionData::new(&request, report.result)),
            ..Default::default()
        }
    }

    #[test]
    fn test_meal_suggestion_prompt() {
        let macros = MacroSplit { protein: 187.0, carbs: 160.0, fat: 83.0 };
        let prompt = meal_suggestion_prompt(&["Vegetarian".to_string()], &[], 2139.0, &macros);
        assert!(prompt.contains("- Dietary preferences: Vegetarian\n"));
        assert!(prompt.contains("- Dietary restrictions: None\n"));
        assert!(prompt.contains("- Target calories: 2139 kcal\n"));
        assert!(prompt.contains("- Target macros: 187g protein, 160g carbs, 83g fat\n"));
    }

    #[test]
    fn test_diet_plan_prompt() {
        let profile = profile_with_data();
        let data = profile.nutrition_data.clone().unwrap();
        let prompt = diet_plan_prompt(&profile, &data, PlanType::Weekly);

        assert!(prompt.starts_with("Generate a personalized diet plan"));
        assert!(prompt.contains("- Age: 30\n"));
        assert!(prompt.contains("- Weight: 70 kg\n"));
        assert!(prompt.contains("- Goal: weight_loss\n"));
        assert!(prompt.contains("- Medical conditions: diabetes\n"));
        assert!(prompt.contains("- Dietary preferences: Mediterranean, High-protein\n"));
        assert!(prompt.contains("- Dietary restrictions: None\n"));
        assert!(prompt.contains("- Daily calorie target: 2045 kcal\n"));
        assert!(prompt.contains("- Plan length: weekly\n"));
        assert!(prompt.ends_with("7. Supplement suggestions if appropriate"));
    }

    #[test]
    fn test_chat_prompt_with_profile() {
        let profile = profile_with_data();
        let prompt = chat_prompt(Some(&profile), "What should I eat before a run?");

        assert!(prompt.contains("Here's some information about the user:\n"));
        assert!(prompt.contains("- BMI: 22.9 (Normal weight)\n"));
        assert!(prompt.contains("- Medical conditions: diabetes\n"));
        // Empty lists are left out entirely
        assert!(!prompt.contains("Dietary restrictions"));
        assert!(prompt.contains("The user's question is: \"What should I eat before a run?\""));
    }

    #[test]
    fn test_chat_prompt_without_profile() {
        let prompt = chat_prompt(None, "Is fruit healthy?");
        assert!(!prompt.contains("information about the user"));
        assert!(prompt.contains("\"Is fruit healthy?\""));
    }

    #[test]
    fn test_chat_prompt_profile_without_data() {
        let profile = ProfileDocument {
            uid: "u1".to_string(),
            restrictions: vec!["gluten".to_string()],
            ..Default::default()
        };
        let prompt = chat_prompt(Some(&profile), "Bread ideas?");
        assert!(!prompt.contains("- BMI"));
        assert!(prompt.contains("- Dietary restrictions: gluten\n"));
    }
}
