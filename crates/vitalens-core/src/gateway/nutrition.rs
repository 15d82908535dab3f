//! Nutrition query gateway

use chrono::NaiveDate;

use super::client::ApiClient;
use crate::error::Result;
use crate::models::{DailyNutrition, HealthInsights, NutritionSummary, TodayNutritionSummary};

/// Period used when the caller does not pick one
pub const DEFAULT_PERIOD_DAYS: u32 = 7;

const DAILY_PATH: &str = "/nutrition/daily";
const SUMMARY_PATH: &str = "/nutrition/summary";
const INSIGHTS_PATH: &str = "/nutrition/insights";

#[derive(Debug, Clone)]
pub struct NutritionGateway {
    client: ApiClient,
}

impl NutritionGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Totals for one day; the server picks today when `target_date` is `None`
    pub async fn daily(&self, target_date: Option<NaiveDate>) -> Result<DailyNutrition> {
        let query: Vec<(&str, String)> = target_date
            .map(|d| ("target_date", d.format("%Y-%m-%d").to_string()))
            .into_iter()
            .collect();

        log::debug!("[nutrition] Fetching daily nutrition for {:?}", target_date);
        self.client.authorized_get(DAILY_PATH, &query).await
    }

    /// Headline numbers for the server's current day
    pub async fn today(&self) -> Result<TodayNutritionSummary> {
        let daily = self.daily(None).await?;
        Ok(TodayNutritionSummary::from_daily(&daily))
    }

    /// Totals and daily averages over the last `days` days
    pub async fn summary(&self, days: u32) -> Result<NutritionSummary> {
        log::debug!("[nutrition] Fetching {}-day summary", days);
        self.client
            .authorized_get(SUMMARY_PATH, &[("days", days.to_string())])
            .await
    }

    /// Generated explanation and recommendations for the last `days` days
    pub async fn insights(&self, days: u32) -> Result<HealthInsights> {
        log::debug!("[nutrition] Fetching {}-day insights", days);
        self.client
            .authorized_get(INSIGHTS_PATH, &[("days", days.to_string())])
            .await
    }
}
