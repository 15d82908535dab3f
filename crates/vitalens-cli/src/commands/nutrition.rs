//! Nutrition commands
//!
//! Daily totals, period summaries and generated insights.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use vitalens_core::{NutrientData, TodayNutritionSummary, DEFAULT_PERIOD_DAYS};

use super::Context;
use crate::output::{format_amount, print_info, print_json, print_output, print_single, OutputFormat};

#[derive(Subcommand)]
pub enum NutritionAction {
    /// Nutrient totals for one day
    Daily {
        /// Date (YYYY-MM-DD), defaults to today on the server
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Headline numbers for today
    Today,

    /// Totals and daily averages over a period
    Summary {
        /// Number of days to cover
        #[arg(short, long, default_value_t = DEFAULT_PERIOD_DAYS)]
        days: u32,
    },

    /// Generated explanation and recommendations for a period
    Insights {
        /// Number of days to cover
        #[arg(short, long, default_value_t = DEFAULT_PERIOD_DAYS)]
        days: u32,
    },
}

/// Daily nutrient row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct DailyRow {
    #[tabled(rename = "Nutrient")]
    pub name: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
}

impl From<&NutrientData> for DailyRow {
    fn from(nutrient: &NutrientData) -> Self {
        Self {
            name: nutrient.name.clone(),
            amount: format_amount(nutrient.value, &nutrient.unit),
        }
    }
}

/// Period nutrient row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Nutrient")]
    pub name: String,
    #[tabled(rename = "Total")]
    pub total: String,
    #[tabled(rename = "Per Day")]
    pub average_per_day: String,
}

impl From<&NutrientData> for SummaryRow {
    fn from(nutrient: &NutrientData) -> Self {
        Self {
            name: nutrient.name.clone(),
            total: format_amount(nutrient.total, &nutrient.unit),
            average_per_day: format_amount(nutrient.average_per_day, &nutrient.unit),
        }
    }
}

/// Today's headline row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct TodayRow {
    #[tabled(rename = "Calories")]
    pub calories: String,
    #[tabled(rename = "Protein")]
    pub protein: String,
    #[tabled(rename = "Carbs")]
    pub carbs: String,
    #[tabled(rename = "Fat")]
    pub fat: String,
    #[tabled(rename = "Fiber")]
    pub fiber: String,
    #[tabled(rename = "Meals")]
    pub meal_count: u32,
}

impl From<TodayNutritionSummary> for TodayRow {
    fn from(today: TodayNutritionSummary) -> Self {
        Self {
            calories: format_amount(Some(today.calories), "kcal"),
            protein: format_amount(Some(today.protein), "g"),
            carbs: format_amount(Some(today.carbs), "g"),
            fat: format_amount(Some(today.fat), "g"),
            fiber: format_amount(today.fiber, "g"),
            meal_count: today.meal_count,
        }
    }
}

pub async fn execute(ctx: &Context, action: NutritionAction) -> Result<()> {
    match action {
        NutritionAction::Daily { date } => daily(ctx, date).await,
        NutritionAction::Today => today(ctx).await,
        NutritionAction::Summary { days } => summary(ctx, days).await,
        NutritionAction::Insights { days } => insights(ctx, days).await,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD", raw))
}

async fn daily(ctx: &Context, date: Option<String>) -> Result<()> {
    let target_date = date.as_deref().map(parse_date).transpose()?;
    let daily = ctx.services.nutrition.daily(target_date).await?;

    if ctx.format == OutputFormat::Json {
        return print_json(&daily);
    }

    print_info(
        &format!("{} - {} meal(s)", daily.date.format("%Y-%m-%d"), daily.meal_count),
        ctx.quiet,
    );
    let rows: Vec<DailyRow> = daily.nutrients.iter().map(DailyRow::from).collect();
    print_output(&rows, ctx.format)
}

async fn today(ctx: &Context) -> Result<()> {
    let today = ctx.services.nutrition.today().await?;
    match ctx.format {
        OutputFormat::Json => print_json(&today),
        OutputFormat::Table => print_single(&TodayRow::from(today), ctx.format),
    }
}

async fn summary(ctx: &Context, days: u32) -> Result<()> {
    let summary = ctx.services.nutrition.summary(days).await?;

    if ctx.format == OutputFormat::Json {
        return print_json(&summary);
    }

    print_info(
        &format!(
            "{} to {} ({} days, {} meals)",
            summary.start_date, summary.end_date, summary.period_days, summary.total_meals
        ),
        ctx.quiet,
    );
    let rows: Vec<SummaryRow> = summary.nutrients.iter().map(SummaryRow::from).collect();
    print_output(&rows, ctx.format)
}

async fn insights(ctx: &Context, days: u32) -> Result<()> {
    let insights = ctx.services.nutrition.insights(days).await?;

    if ctx.format == OutputFormat::Json {
        return print_json(&insights);
    }

    println!("{}", format!("Last {} days", insights.period_days).bold());
    println!();
    println!("{}", insights.explanation);
    println!();
    println!("{}", "Recommendations".bold());
    println!("{}", insights.recommendations);
    println!();
    println!("{}", insights.disclaimer.dimmed());
    Ok(())
}
