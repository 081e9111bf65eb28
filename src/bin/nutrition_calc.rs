//! Print nutrition targets for one person as JSON
//!
//! Usage: nutrition_calc <height_cm> <weight_kg> <age_years> <gender> <activity_level> <goal> [condition...]

use nutriplan::nutrition::{calculate_nutrition, NutritionRequest};

const USAGE: &str = "Usage: nutrition_calc <height_cm> <weight_kg> <age_years> <gender> <activity_level> <goal> [condition...]";

fn parse_args(args: &[String]) -> Result<NutritionRequest, String> {
    if args.len() < 6 {
        return Err(USAGE.to_string());
    }

    let number = |name: &str, value: &str| -> Result<f64, String> {
        value
            .parse::<f64>()
            .map_err(|_| format!("{} must be a number, got '{}'", name, value))
    };

    Ok(NutritionRequest {
        height_cm: number("height_cm", &args[0])?,
        weight_kg: number("weight_kg", &args[1])?,
        age_years: args[2]
            .parse::<u32>()
            .map_err(|_| format!("age_years must be a whole number, got '{}'", args[2]))?,
        gender: args[3].clone(),
        activity_level: args[4].clone(),
        goal: args[5].clone(),
        medical_conditions: args[6..].to_vec(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let request = match parse_args(&args) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let report = calculate_nutrition(&request)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
