//! Nutriplan Status Tool
//!
//! Provides runtime status information about the Nutriplan service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Workflow guide for AI assistants
pub const NUTRITION_INSTRUCTIONS: &str = r#"
# Nutriplan Instructions

This guide explains how to take a user from body metrics to a stored plan
using the Nutriplan tools.

## Overview

1. **Calculate** - `calculate_nutrition` turns height, weight, age, gender,
   activity level and goal into BMI, ideal weight, BMR, TDEE, a daily calorie
   target and macro grams. Nothing is stored.
2. **Profile** - `create_profile` once per user, then `save_nutrition_profile`
   to store the calculation together with preferences, restrictions and
   medical conditions. This marks the profile complete.
3. **Advice** - `generate_diet_plan`, `suggest_meal` and
   `ask_nutrition_assistant` use the stored profile as context.

---

## Inputs

| Field | Unit | Accepted values |
|-------|------|-----------------|
| height_cm | cm | positive number |
| weight_kg | kg | positive number |
| age_years | years | positive whole number |
| gender | | `male` (any case); anything else is treated as female |
| activity_level | | `sedentary`, `light`, `moderate`, `active`, `very_active` |
| goal | | `weight_loss`, `moderate_weight_loss`, `mild_weight_loss`, `maintenance`, `mild_weight_gain`, `moderate_weight_gain`, `weight_gain`, `muscle_gain` |
| medical_conditions | | free text list; `diabetes` lowers the carb share |

**Activity level is case sensitive.** `Moderate` is not recognised and falls
back to the sedentary multiplier (1.2). Always send lowercase.

The calorie target lowercases the goal first, but the macro split matches it
exactly. An unknown goal keeps calories at TDEE and uses the default split.

---

## What the numbers mean

- **BMI** - weight / height², rounded to 1 decimal.
  Underweight < 18.5 ≤ Normal weight < 25 ≤ Overweight < 30 ≤ Obese.
- **BMR** - Mifflin-St Jeor: 10·kg + 6.25·cm - 5·age, +5 for men, -161 for women.
- **TDEE** - BMR × activity multiplier (1.2 / 1.375 / 1.55 / 1.725 / 1.9).
- **Calorie target** - TDEE × goal factor: weight_loss 0.80,
  moderate_weight_loss 0.85, mild_weight_loss 0.90, maintenance 1.00,
  mild_weight_gain 1.10, moderate_weight_gain 1.15, weight_gain 1.20.
  muscle_gain keeps calories at TDEE.
- **Macros** - percentages of the target at 4 kcal/g protein and carbs,
  9 kcal/g fat:

| Case | Protein | Carbs | Fat |
|------|---------|-------|-----|
| Default | 30% | 40% | 30% |
| weight_loss | 35% | 30% | 35% |
| weight_gain, muscle_gain | 30% | 45% | 25% |
| diabetes (any goal) | 35% | 30% | 35% |

`diabetes` must be written in lowercase to be recognised.

- **Water** - 0.033 L per kg, or 0.04 L per kg for active and very_active.

---

## Profiles

- `update_profile` merges a partial JSON object: nested objects merge key by
  key, lists and plain values replace what was stored. Send only what changed.
- `get_profile` returns the whole document; `list_profiles` pages summaries.
- `delete_profile` also removes the user's diet plans and chat history.

---

## Advice tools

- These tools need `GEMINI_API_KEY`. Without it they return a configuration
  error; check `nutriplan_status` (`ai_configured`).
- `generate_diet_plan` needs a saved calculation. Plans are stored; list them
  with `list_diet_plans`.
- `suggest_meal` uses the stored calorie target and macros.
- `ask_nutrition_assistant` stores the question and reply when a `user_id` is
  given. If the model call fails the reply is an apology message, not an error.
- `get_chat_history` / `clear_chat_history` manage the stored transcript.

Present AI output as general guidance, not medical advice.
"#;

/// Runtime status of the Nutriplan service
#[derive(Debug, Clone, Serialize)]
pub struct NutriplanStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// AI service
    pub ai_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    ai_model: Option<String>,
}

impl StatusTracker {
    /// `ai_model` is `None` when no API key is configured
    pub fn new(database_path: PathBuf, ai_model: Option<String>) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            ai_model,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> NutriplanStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutriplanStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            ai_configured: self.ai_model.is_some(),
            ai_model: self.ai_model.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_ai_configuration() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/nutriplan.db"), None);
        let status = tracker.get_status();
        assert!(!status.ai_configured);
        assert!(status.database_size_bytes.is_none());
        assert_eq!(status.process_id, std::process::id());

        let tracker = StatusTracker::new(PathBuf::from("nutriplan.db"), Some("gemini-pro".to_string()));
        let status = tracker.get_status();
        assert!(status.ai_configured);
        assert_eq!(status.ai_model.as_deref(), Some("gemini-pro"));
    }

    #[test]
    fn test_instructions_name_the_tools() {
        for tool in ["calculate_nutrition", "save_nutrition_profile", "generate_diet_plan"] {
            assert!(NUTRITION_INSTRUCTIONS.contains(tool), "missing {}", tool);
        }
    }
}
