//! Nutrition calculation module
//!
//! Body metrics, energy expenditure and macro targets.

pub mod calculator;

pub use calculator::{
    bmi_category, calculate_bmi, calculate_bmr, calculate_calorie_target, calculate_ibw,
    calculate_macros, calculate_nutrition, calculate_tdee, calculate_water_intake, ensure_positive,
    macro_percentages, ActivityLevel, BmiCategory, BodyMetrics, CalcError, Gender, Goal,
    MacroPercentages, MacroSplit, NutritionReport, NutritionRequest, NutritionResult,
};
