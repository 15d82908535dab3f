//! Nutrition query models

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One nutrient line in a daily or period response
///
/// Daily responses fill `value`; period summaries fill `total` and
/// `average_per_day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientData {
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub average_per_day: Option<f64>,
    pub unit: String,
}

/// `GET /nutrition/daily`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyNutrition {
    pub date: NaiveDate,
    #[serde(default)]
    pub nutrients: Vec<NutrientData>,
    pub meal_count: u32,
}

/// `GET /nutrition/summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub period_days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub nutrients: Vec<NutrientData>,
    pub total_meals: u32,
}

impl NutritionSummary {
    /// Average daily amount of a nutrient, matched case-insensitively
    pub fn average_per_day(&self, name: &str) -> Option<f64> {
        self.nutrients
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
            .and_then(|n| n.average_per_day)
    }
}

/// `GET /nutrition/insights`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInsights {
    pub period_days: u32,
    #[serde(default)]
    pub nutrient_summary: BTreeMap<String, f64>,
    pub explanation: String,
    pub recommendations: String,
    pub disclaimer: String,
}

/// Headline numbers for today's dashboard
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TodayNutritionSummary {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub meal_count: u32,
}

impl TodayNutritionSummary {
    /// Pick the headline nutrients out of a daily response
    ///
    /// Names are matched against common aliases ("energy" counts as calories,
    /// "total fat" as fat, ...). Missing values count as zero.
    pub fn from_daily(daily: &DailyNutrition) -> Self {
        let mut summary = Self {
            meal_count: daily.meal_count,
            ..Self::default()
        };

        for nutrient in &daily.nutrients {
            let value = nutrient.value.unwrap_or(0.0);
            match nutrient.name.to_lowercase().as_str() {
                "calories" | "calorie" | "energy" => summary.calories = value,
                "protein" => summary.protein = value,
                "carbohydrates" | "carbs" | "carbohydrate" | "carb" => summary.carbs = value,
                "fat" | "total fat" | "total_fat" => summary.fat = value,
                "fiber" | "dietary fiber" | "dietary_fiber" => summary.fiber = Some(value),
                _ => {}
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nutrient(name: &str, value: Option<f64>) -> NutrientData {
        NutrientData {
            name: name.to_string(),
            value,
            total: None,
            average_per_day: None,
            unit: "g".to_string(),
        }
    }

    #[test]
    fn test_parse_daily_nutrition() {
        let json = r#"{
            "date": "2025-12-20",
            "nutrients": [
                {"name": "Calories", "value": 1850, "unit": "kcal"},
                {"name": "Protein", "value": 92.5, "unit": "g"}
            ],
            "meal_count": 3
        }"#;
        let daily: DailyNutrition = serde_json::from_str(json).unwrap();
        assert_eq!(daily.date, NaiveDate::from_ymd_opt(2025, 12, 20).unwrap());
        assert_eq!(daily.nutrients[0].value, Some(1850.0));
        assert_eq!(daily.meal_count, 3);
    }

    #[test]
    fn test_today_summary_aliases() {
        let daily = DailyNutrition {
            date: NaiveDate::from_ymd_opt(2025, 12, 20).unwrap(),
            nutrients: vec![
                nutrient("Energy", Some(2100.0)),
                nutrient("protein", Some(80.0)),
                nutrient("Carbohydrate", Some(250.0)),
                nutrient("Total Fat", Some(70.0)),
                nutrient("Dietary_Fiber", None),
                nutrient("Sodium", Some(1.9)),
            ],
            meal_count: 4,
        };

        let today = TodayNutritionSummary::from_daily(&daily);
        assert_eq!(today.calories, 2100.0);
        assert_eq!(today.protein, 80.0);
        assert_eq!(today.carbs, 250.0);
        assert_eq!(today.fat, 70.0);
        assert_eq!(today.fiber, Some(0.0));
        assert_eq!(today.meal_count, 4);
    }

    #[test]
    fn test_today_summary_empty_day() {
        let daily = DailyNutrition {
            date: NaiveDate::from_ymd_opt(2025, 12, 20).unwrap(),
            nutrients: vec![],
            meal_count: 0,
        };
        let today = TodayNutritionSummary::from_daily(&daily);
        assert_eq!(today, TodayNutritionSummary::default());
        assert_eq!(today.fiber, None);
    }

    #[test]
    fn test_summary_average_lookup() {
        let json = r#"{
            "period_days": 7,
            "start_date": "2025-12-14",
            "end_date": "2025-12-20",
            "nutrients": [
                {"name": "Protein", "total": 560, "average_per_day": 80, "unit": "g"}
            ],
            "total_meals": 19
        }"#;
        let summary: NutritionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.average_per_day("protein"), Some(80.0));
        assert_eq!(summary.average_per_day("fiber"), None);
    }

    #[test]
    fn test_parse_insights() {
        let json = r#"{
            "period_days": 7,
            "nutrient_summary": {"Protein": 560.0, "Calories": 14000},
            "explanation": "Protein intake is steady.",
            "recommendations": "Add leafy greens.",
            "disclaimer": "Not medical advice."
        }"#;
        let insights: HealthInsights = serde_json::from_str(json).unwrap();
        assert_eq!(insights.nutrient_summary.get("Calories"), Some(&14000.0));
        assert_eq!(insights.period_days, 7);
    }
}
