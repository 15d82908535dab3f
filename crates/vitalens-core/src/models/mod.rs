//! Data models for the VitaLens client
//!
//! Wire shapes for the backend's JSON bodies. Field names are snake_case on
//! the wire and in Rust, so no renames are needed.

pub mod auth;
pub mod meal;
pub mod nutrition;

pub use auth::{LoginRequest, RefreshTokenRequest, RegisterRequest, TokenResponse, UserProfile};
pub use meal::{FoodItem, MealRecord, MealType};
pub use nutrition::{
    DailyNutrition, HealthInsights, NutrientData, NutritionSummary, TodayNutritionSummary,
};
