//! Nutrition metrics calculator
//!
//! Closed-form body metrics used to build a nutrition profile:
//!
//! - BMI and its category
//! - Ideal body weight (Devine, 1974)
//! - Basal metabolic rate (Mifflin-St Jeor, 1990)
//! - Total daily energy expenditure (activity multipliers)
//! - Goal calorie target and macronutrient split
//! - Daily water intake
//!
//! Every formula is total: out-of-range numbers produce degenerate values,
//! never a panic. [`calculate_nutrition`] is the validating entry point that
//! rejects non-positive body metrics before running the pipeline.
//!
//! String matching is deliberately uneven and stored profiles depend on it:
//! gender is compared case-insensitively, the calorie target lowercases the
//! goal, while the activity table, the macro split goal and the medical
//! condition lookup are exact matches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Energy density of protein (kcal per gram)
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
/// Energy density of carbohydrate (kcal per gram)
pub const KCAL_PER_G_CARBS: f64 = 4.0;
/// Energy density of fat (kcal per gram)
pub const KCAL_PER_G_FAT: f64 = 9.0;

const CM_PER_INCH: f64 = 2.54;

// Devine: base weight at 60 inches, plus 2.3 kg per inch above it
const DEVINE_BASE_INCHES: f64 = 60.0;
const DEVINE_KG_PER_INCH: f64 = 2.3;
const DEVINE_MALE_BASE_KG: f64 = 50.0;
const DEVINE_FEMALE_BASE_KG: f64 = 45.5;

const MSJ_WEIGHT_COEF: f64 = 10.0;
const MSJ_HEIGHT_COEF: f64 = 6.25;
const MSJ_AGE_COEF: f64 = 5.0;
const MSJ_MALE_CONSTANT: f64 = 5.0;
const MSJ_FEMALE_CONSTANT: f64 = -161.0;

/// Litres of water per kg of body weight
const WATER_L_PER_KG: f64 = 0.033;
const WATER_L_PER_KG_ACTIVE: f64 = 0.04;

/// The only medical condition that changes the macro split
pub const DIABETES: &str = "diabetes";

/// Round to a fixed number of decimal places
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ============================================================================
// Enumerations
// ============================================================================

/// Gender used by the IBW and BMR formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse user input. Only `male` (any case) selects the male formulas;
    /// every other string, including unknown ones, is treated as female.
    pub fn from_input(s: &str) -> Self {
        if s.to_lowercase() == "male" {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Activity level for the TDEE multiplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    #[default]
    Sedentary,
    /// Light exercise 1-3 days/week
    Light,
    /// Moderate exercise 3-5 days/week
    Moderate,
    /// Hard exercise 6-7 days/week
    Active,
    /// Very hard exercise and a physical job, or training twice a day
    VeryActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::VeryActive,
    ];

    /// Exact, case-sensitive match against the wire names
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very_active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary (little or no exercise)",
            ActivityLevel::Light => "Light (exercise 1-3 days/week)",
            ActivityLevel::Moderate => "Moderate (exercise 3-5 days/week)",
            ActivityLevel::Active => "Active (exercise 6-7 days/week)",
            ActivityLevel::VeryActive => "Very Active (hard exercise & physical job)",
        }
    }
}

/// Nutrition goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    WeightLoss,
    ModerateWeightLoss,
    MildWeightLoss,
    Maintenance,
    MildWeightGain,
    ModerateWeightGain,
    WeightGain,
    /// Only recognized by the macro split; no calorie adjustment
    MuscleGain,
}

impl Goal {
    /// Exact, case-sensitive match against the wire names
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "weight_loss" => Some(Goal::WeightLoss),
            "moderate_weight_loss" => Some(Goal::ModerateWeightLoss),
            "mild_weight_loss" => Some(Goal::MildWeightLoss),
            "maintenance" => Some(Goal::Maintenance),
            "mild_weight_gain" => Some(Goal::MildWeightGain),
            "moderate_weight_gain" => Some(Goal::ModerateWeightGain),
            "weight_gain" => Some(Goal::WeightGain),
            "muscle_gain" => Some(Goal::MuscleGain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::WeightLoss => "weight_loss",
            Goal::ModerateWeightLoss => "moderate_weight_loss",
            Goal::MildWeightLoss => "mild_weight_loss",
            Goal::Maintenance => "maintenance",
            Goal::MildWeightGain => "mild_weight_gain",
            Goal::ModerateWeightGain => "moderate_weight_gain",
            Goal::WeightGain => "weight_gain",
            Goal::MuscleGain => "muscle_gain",
        }
    }

    /// Factor applied to TDEE, or `None` when the target is TDEE itself
    pub fn calorie_adjustment(&self) -> Option<f64> {
        match self {
            Goal::WeightLoss => Some(0.80),
            Goal::ModerateWeightLoss => Some(0.85),
            Goal::MildWeightLoss => Some(0.90),
            Goal::Maintenance | Goal::MuscleGain => None,
            Goal::MildWeightGain => Some(1.10),
            Goal::ModerateWeightGain => Some(1.15),
            Goal::WeightGain => Some(1.20),
        }
    }

    /// Macro profile selected by this goal, before any medical override
    pub fn macro_percentages(&self) -> MacroPercentages {
        match self {
            Goal::WeightLoss => MacroPercentages::LOW_CARB,
            Goal::WeightGain | Goal::MuscleGain => MacroPercentages::HIGH_CARB,
            _ => MacroPercentages::BALANCED,
        }
    }
}

/// BMI category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    #[serde(rename = "Underweight")]
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    #[serde(rename = "Overweight")]
    Overweight,
    #[serde(rename = "Obese")]
    Obese,
}

impl BmiCategory {
    /// Lower bounds are inclusive: 18.5 is normal, 25.0 overweight, 30.0 obese
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::NormalWeight
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Result types
// ============================================================================

/// Share of calories per macronutrient (fractions of 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroPercentages {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroPercentages {
    pub const BALANCED: Self = Self { protein: 0.30, carbs: 0.40, fat: 0.30 };
    /// Weight loss and the diabetes override
    pub const LOW_CARB: Self = Self { protein: 0.35, carbs: 0.30, fat: 0.35 };
    /// Weight or muscle gain
    pub const HIGH_CARB: Self = Self { protein: 0.30, carbs: 0.45, fat: 0.25 };
}

/// Daily macronutrient targets in grams
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroSplit {
    /// Calories implied by the rounded gram targets
    pub fn calories(&self) -> f64 {
        self.protein * KCAL_PER_G_PROTEIN + self.carbs * KCAL_PER_G_CARBS + self.fat * KCAL_PER_G_FAT
    }
}

/// Derived metrics for one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionResult {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub ibw: f64,
    pub bmr: f64,
    pub tdee: f64,
    pub calorie_target: f64,
    pub macros: MacroSplit,
}

// ============================================================================
// Formulas
// ============================================================================

/// Body Mass Index, rounded to 1 decimal
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_to(weight_kg / (height_m * height_m), 1)
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    BmiCategory::from_bmi(bmi)
}

/// Ideal body weight in kg (Devine), rounded to 1 decimal.
///
/// Heights under 60 inches make the height term negative; the result is not
/// clamped.
pub fn calculate_ibw(height_cm: f64, gender: &str) -> f64 {
    let height_inches = height_cm / CM_PER_INCH;
    let base = match Gender::from_input(gender) {
        Gender::Male => DEVINE_MALE_BASE_KG,
        Gender::Female => DEVINE_FEMALE_BASE_KG,
    };
    round_to(base + DEVINE_KG_PER_INCH * (height_inches - DEVINE_BASE_INCHES), 1)
}

/// Basal metabolic rate in kcal/day (Mifflin-St Jeor), rounded to integer
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age_years: u32, gender: &str) -> f64 {
    let constant = match Gender::from_input(gender) {
        Gender::Male => MSJ_MALE_CONSTANT,
        Gender::Female => MSJ_FEMALE_CONSTANT,
    };
    let bmr = MSJ_WEIGHT_COEF * weight_kg + MSJ_HEIGHT_COEF * height_cm
        - MSJ_AGE_COEF * f64::from(age_years)
        + constant;
    bmr.round()
}

/// Total daily energy expenditure, rounded to integer.
///
/// Unrecognized activity levels use the sedentary multiplier.
pub fn calculate_tdee(bmr: f64, activity_level: &str) -> f64 {
    let level = ActivityLevel::from_str(activity_level).unwrap_or_default();
    (bmr * level.multiplier()).round()
}

/// Daily calorie target for a goal.
///
/// The goal is lowercased before matching. Maintenance and unrecognized
/// goals return `tdee` unchanged.
pub fn calculate_calorie_target(tdee: f64, goal: &str) -> f64 {
    match Goal::from_str(&goal.to_lowercase()).and_then(|g| g.calorie_adjustment()) {
        Some(factor) => (tdee * factor).round(),
        None => tdee,
    }
}

/// Macro percentages for a goal and a set of medical conditions.
///
/// The goal is matched exactly. `diabetes` replaces whatever the goal chose.
pub fn macro_percentages<S: AsRef<str>>(goal: &str, medical_conditions: &[S]) -> MacroPercentages {
    if medical_conditions.iter().any(|c| c.as_ref() == DIABETES) {
        return MacroPercentages::LOW_CARB;
    }
    Goal::from_str(goal)
        .map(|g| g.macro_percentages())
        .unwrap_or(MacroPercentages::BALANCED)
}

/// Macro targets in grams. Each macro is rounded on its own, so the grams
/// need not add back up to exactly `calorie_target`.
pub fn calculate_macros<S: AsRef<str>>(
    calorie_target: f64,
    goal: &str,
    medical_conditions: &[S],
) -> MacroSplit {
    let pct = macro_percentages(goal, medical_conditions);
    MacroSplit {
        protein: (calorie_target * pct.protein / KCAL_PER_G_PROTEIN).round(),
        carbs: (calorie_target * pct.carbs / KCAL_PER_G_CARBS).round(),
        fat: (calorie_target * pct.fat / KCAL_PER_G_FAT).round(),
    }
}

/// Recommended water intake in litres, rounded to 1 decimal
pub fn calculate_water_intake(weight_kg: f64, activity_level: &str) -> f64 {
    let per_kg = match ActivityLevel::from_str(activity_level) {
        Some(ActivityLevel::Active | ActivityLevel::VeryActive) => WATER_L_PER_KG_ACTIVE,
        _ => WATER_L_PER_KG,
    };
    round_to(weight_kg * per_kg, 1)
}

// ============================================================================
// Validating entry point
// ============================================================================

/// Calculator error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Invalid input: {field} must be a positive number (got {value})")]
    InvalidInput { field: &'static str, value: f64 },
}

/// Validated body measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub gender: Gender,
}

impl BodyMetrics {
    pub fn new(height_cm: f64, weight_kg: f64, age_years: u32, gender: Gender) -> Result<Self, CalcError> {
        ensure_positive("height_cm", height_cm)?;
        ensure_positive("weight_kg", weight_kg)?;
        ensure_positive("age_years", f64::from(age_years))?;
        Ok(Self { height_cm, weight_kg, age_years, gender })
    }
}

/// Reject zero, negative and non-finite measurements
pub fn ensure_positive(field: &'static str, value: f64) -> Result<(), CalcError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::InvalidInput { field, value })
    }
}

/// Raw calculator input as entered by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionRequest {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
}

/// Full calculator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionReport {
    #[serde(flatten)]
    pub result: NutritionResult,
    pub macro_percentages: MacroPercentages,
    pub water_intake_liters: f64,
}

/// Validate the body metrics and run the full pipeline
pub fn calculate_nutrition(request: &NutritionRequest) -> Result<NutritionReport, CalcError> {
    let metrics = BodyMetrics::new(
        request.height_cm,
        request.weight_kg,
        request.age_years,
        Gender::from_input(&request.gender),
    )?;
    let gender = request.gender.as_str();

    let bmi = calculate_bmi(metrics.weight_kg, metrics.height_cm);
    let bmr = calculate_bmr(metrics.weight_kg, metrics.height_cm, metrics.age_years, gender);
    let tdee = calculate_tdee(bmr, &request.activity_level);
    let calorie_target = calculate_calorie_target(tdee, &request.goal);

    Ok(NutritionReport {
        result: NutritionResult {
            bmi,
            bmi_category: bmi_category(bmi),
            ibw: calculate_ibw(metrics.height_cm, gender),
            bmr,
            tdee,
            calorie_target,
            macros: calculate_macros(calorie_target, &request.goal, &request.medical_conditions),
        },
        macro_percentages: macro_percentages(&request.goal, &request.medical_conditions),
        water_intake_liters: calculate_water_intake(metrics.weight_kg, &request.activity_level),
    })
}
