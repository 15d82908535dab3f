//! Meal commands
//!
//! Upload meal photos, receipts and food logs for analysis.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use vitalens_core::{FoodItem, MealRecord, MealType, ProgressReporter};

use super::Context;
use crate::output::{
    format_amount, print_info, print_json, print_output, print_progress, print_single, OutputFormat,
};

#[derive(Subcommand)]
pub enum MealAction {
    /// Upload a meal file (jpg, jpeg, png, gif, bmp, pdf, csv)
    Upload {
        /// Path to the file
        file: PathBuf,

        /// Meal type: breakfast, lunch, dinner, snack, other
        #[arg(short = 't', long = "type", default_value = "other")]
        meal_type: MealType,

        /// When the meal was eaten (YYYY-MM-DD or RFC 3339)
        #[arg(short, long)]
        date: Option<String>,
    },
}

/// Created meal row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct MealRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Type")]
    pub meal_type: String,
    #[tabled(rename = "Source")]
    pub source_type: String,
    #[tabled(rename = "Items")]
    pub item_count: usize,
    #[tabled(rename = "Created")]
    pub created_at: String,
}

impl From<&MealRecord> for MealRow {
    fn from(meal: &MealRecord) -> Self {
        Self {
            id: meal.id,
            meal_type: meal.meal_type.display_name().to_string(),
            source_type: meal.source_type.clone(),
            item_count: meal.food_items.len(),
            created_at: meal.created_at.clone(),
        }
    }
}

/// Recognized food item row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct FoodItemRow {
    #[tabled(rename = "Food")]
    pub name: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[tabled(rename = "Brand")]
    pub brand: String,
}

impl From<&FoodItem> for FoodItemRow {
    fn from(item: &FoodItem) -> Self {
        Self {
            name: item.normalized_name.clone().unwrap_or_else(|| item.name.clone()),
            quantity: format_amount(item.quantity, item.unit.as_deref().unwrap_or("")),
            brand: item.brand.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub async fn execute(ctx: &Context, action: MealAction) -> Result<()> {
    match action {
        MealAction::Upload {
            file,
            meal_type,
            date,
        } => upload(ctx, file, meal_type, date).await,
    }
}

async fn upload(
    ctx: &Context,
    file: PathBuf,
    meal_type: MealType,
    date: Option<String>,
) -> Result<()> {
    let meal_date = date.as_deref().map(parse_meal_date).transpose()?;

    // Progress goes to stderr, so only draw it for human-readable output
    let reporter = if ctx.quiet || ctx.format == OutputFormat::Json {
        ProgressReporter::silent()
    } else {
        ProgressReporter::new(|fraction| print_progress("Uploading", fraction))
    };

    let meal = ctx
        .services
        .meals
        .upload_file(&file, meal_type, meal_date, &reporter)
        .await?;

    match ctx.format {
        OutputFormat::Json => print_json(&meal),
        OutputFormat::Table => {
            print_single(&MealRow::from(&meal), ctx.format)?;
            if meal.food_items.is_empty() {
                print_info("No food items recognized yet.", ctx.quiet);
                Ok(())
            } else {
                let rows: Vec<FoodItemRow> =
                    meal.food_items.iter().map(FoodItemRow::from).collect();
                print_output(&rows, ctx.format)
            }
        }
    }
}

/// Accept a calendar date (midnight UTC) or a full RFC 3339 timestamp
fn parse_meal_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            anyhow!(
                "Invalid date '{}'. Use YYYY-MM-DD or RFC 3339 (e.g. 2025-12-21T12:30:00Z)",
                raw
            )
        })
}
