//! Remote collaborators: the calendar that supplies working-day exceptions
//! and the billing API that supplies month-to-date usage.

use crate::calendar::YearOverrides;
use crate::data_structures::{round2, ActualSample, ModelBreakdown, UsageReport};
use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const GITHUB_API_VERSION: &str = "2022-11-28";

#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_year(&self, year: i32) -> Result<YearOverrides, SourceError>;
}

#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Month-to-date usage as of `today`. `Ok(None)` means the source is not
    /// configured for this run, which is different from zero usage.
    async fn fetch_usage(&self, today: NaiveDate) -> Result<Option<UsageReport>, SourceError>;
}

fn http_client() -> Result<reqwest::Client, SourceError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("quota-burndown/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Year documents published by the holiday-cn project, or any server
/// serving the same shape.
pub struct HolidayCnSource {
    http: reqwest::Client,
    url_template: String,
}

impl HolidayCnSource {
    pub fn new(url_template: impl Into<String>) -> Result<Self, SourceError> {
        Ok(Self {
            http: http_client()?,
            url_template: url_template.into(),
        })
    }
}

#[async_trait]
impl CalendarSource for HolidayCnSource {
    async fn fetch_year(&self, year: i32) -> Result<YearOverrides, SourceError> {
        let url = self.url_template.replace("{year}", &year.to_string());
        tracing::debug!("Fetching holidays for {} from {}", year, url);

        let resp = self.http.get(&url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => return Err(SourceError::NotFound(url)),
            status if !status.is_success() => return Err(SourceError::Status(status.as_u16())),
            _ => {}
        }

        resp.json::<YearOverrides>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumUsageResponse {
    #[serde(default)]
    usage_items: Vec<PremiumUsageItem>,
    #[serde(default)]
    limit: Option<f64>,
    #[serde(default)]
    quota: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumUsageItem {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    gross_quantity: f64,
}

impl PremiumUsageResponse {
    fn into_report(self, today: NaiveDate) -> UsageReport {
        let mut total = 0.0;
        let mut models = ModelBreakdown::new();

        for item in self.usage_items {
            total += item.gross_quantity;
            let name = item.model.unwrap_or_else(|| "Unknown".to_string());
            let entry = models.entry(name).or_insert(0.0);
            *entry = round2(*entry + item.gross_quantity);
        }

        let limit = self.limit.or(self.quota);
        UsageReport::new(today, ActualSample::new(round2(total), models), limit)
    }
}

/// GitHub's premium request billing report for a single user.
pub struct GitHubBillingSource {
    http: reqwest::Client,
    api_base: String,
    user: Option<String>,
    token: Option<String>,
}

impl GitHubBillingSource {
    pub fn new(
        api_base: impl Into<String>,
        user: Option<String>,
        token: Option<String>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            http: http_client()?,
            api_base: api_base.into(),
            user: user.filter(|u| !u.is_empty()),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Reads `GITHUB_TOKEN`, and `GITHUB_USER` falling back to `settings_user`.
    pub fn from_env(
        api_base: impl Into<String>,
        settings_user: Option<String>,
    ) -> Result<Self, SourceError> {
        let user = std::env::var("GITHUB_USER").ok().or(settings_user);
        let token = std::env::var("GITHUB_TOKEN").ok();
        Self::new(api_base, user, token)
    }

    fn usage_url(&self, user: &str, today: NaiveDate) -> String {
        format!(
            "{}/users/{}/settings/billing/premium_request/usage?year={}&month={}",
            self.api_base.trim_end_matches('/'),
            user,
            today.year(),
            today.month()
        )
    }
}

#[async_trait]
impl UsageSource for GitHubBillingSource {
    async fn fetch_usage(&self, today: NaiveDate) -> Result<Option<UsageReport>, SourceError> {
        let Some(token) = &self.token else {
            tracing::info!("GITHUB_TOKEN not set, skipping actual usage fetch");
            return Ok(None);
        };
        let Some(user) = &self.user else {
            tracing::info!("No GitHub user configured, skipping actual usage fetch");
            return Ok(None);
        };

        let url = self.usage_url(user, today);
        tracing::debug!("Fetching usage from {}", url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                return Err(SourceError::NotFound(format!(
                    "billing usage for user {}; the token needs read access to Plan",
                    user
                )))
            }
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(SourceError::Unauthorized(status.as_u16()))
            }
            status if !status.is_success() => return Err(SourceError::Status(status.as_u16())),
            _ => {}
        }

        let body: PremiumUsageResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(Some(body.into_report(today)))
    }
}

/// Fixed overrides, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    years: HashMap<i32, YearOverrides>,
}

impl StaticCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32, overrides: YearOverrides) -> Self {
        self.years.insert(year, overrides);
        self
    }
}

#[async_trait]
impl CalendarSource for StaticCalendar {
    async fn fetch_year(&self, year: i32) -> Result<YearOverrides, SourceError> {
        self.years
            .get(&year)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("calendar for {}", year)))
    }
}

/// Replays a fixed answer, or a failure when built with `failing`.
#[derive(Debug, Clone)]
pub struct StaticUsage {
    report: Option<UsageReport>,
    fail_with: Option<u16>,
}

impl StaticUsage {
    pub fn new(report: Option<UsageReport>) -> Self {
        Self {
            report,
            fail_with: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            report: None,
            fail_with: Some(status),
        }
    }
}

#[async_trait]
impl UsageSource for StaticUsage {
    async fn fetch_usage(&self, _today: NaiveDate) -> Result<Option<UsageReport>, SourceError> {
        match self.fail_with {
            Some(status @ (401 | 403)) => Err(SourceError::Unauthorized(status)),
            Some(404) => Err(SourceError::NotFound("static usage".to_string())),
            Some(status) => Err(SourceError::Status(status)),
            None => Ok(self.report.clone()),
        }
    }
}
