//! Meal models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which meal of the day an upload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    #[default]
    Other,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
        MealType::Other,
    ];

    /// Wire value sent in the `meal_type` form part
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
            MealType::Other => "Other",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| {
                format!(
                    "Invalid meal type: {}. Use breakfast, lunch, dinner, snack or other",
                    s
                )
            })
    }
}

/// A food item recognized in an uploaded meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub normalized_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
}

/// Meal created by `/meals/upload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: i64,
    pub user_id: i64,
    pub meal_type: MealType,
    /// image, pdf, csv or manual
    pub source_type: String,
    #[serde(default)]
    pub source_file_path: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub meal_date: Option<String>,
    #[serde(default)]
    pub food_items: Vec<FoodItem>,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_parse() {
        assert_eq!("breakfast".parse::<MealType>().unwrap(), MealType::Breakfast);
        assert_eq!(" Dinner ".parse::<MealType>().unwrap(), MealType::Dinner);
        assert!("brunch".parse::<MealType>().is_err());
        assert_eq!(MealType::default(), MealType::Other);
    }

    #[test]
    fn test_meal_type_serde() {
        assert_eq!(serde_json::to_string(&MealType::Snack).unwrap(), "\"snack\"");
        let parsed: MealType = serde_json::from_str("\"lunch\"").unwrap();
        assert_eq!(parsed, MealType::Lunch);
        assert_eq!(MealType::Lunch.display_name(), "Lunch");
    }

    #[test]
    fn test_parse_meal_record() {
        let json = r#"{
            "id": 7,
            "user_id": 42,
            "meal_type": "lunch",
            "source_type": "image",
            "source_file_path": "uploads/42/lunch.jpg",
            "raw_text": null,
            "notes": null,
            "meal_date": "2025-12-21T12:30:00",
            "food_items": [
                {
                    "id": 1,
                    "name": "Grilled chicken",
                    "normalized_name": "chicken breast",
                    "quantity": 150.0,
                    "unit": "g",
                    "created_at": "2025-12-21T12:31:00"
                }
            ],
            "created_at": "2025-12-21T12:31:00",
            "updated_at": "2025-12-21T12:31:00"
        }"#;

        let meal: MealRecord = serde_json::from_str(json).unwrap();
        assert_eq!(meal.meal_type, MealType::Lunch);
        assert_eq!(meal.food_items.len(), 1);
        assert_eq!(meal.food_items[0].quantity, Some(150.0));
        assert_eq!(meal.food_items[0].brand, None);
    }

    #[test]
    fn test_parse_meal_record_without_items() {
        let json = r#"{
            "id": 8,
            "user_id": 42,
            "meal_type": "other",
            "source_type": "csv",
            "created_at": "2025-12-21T12:31:00",
            "updated_at": "2025-12-21T12:31:00"
        }"#;
        let meal: MealRecord = serde_json::from_str(json).unwrap();
        assert!(meal.food_items.is_empty());
    }
}
