use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::{AppError, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Realtime,
    Morning,
    Evening,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Realtime, Frequency::Morning, Frequency::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Realtime => "realtime",
            Frequency::Morning => "morning",
            Frequency::Evening => "evening",
        }
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == value)
            .ok_or_else(|| AppError::internal(format!("unknown notification frequency {value}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub user_id: String,
    pub categories: Vec<String>,
    pub frequency: Frequency,
    pub price_change_threshold: u32,
    pub line_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_user_id: Option<String>,
    pub web_push_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotificationSettings {
    /// What a user without stored settings sees.
    pub fn defaults(user_id: impl Into<String>, threshold: u32) -> Self {
        Self {
            user_id: user_id.into(),
            categories: Vec::new(),
            frequency: Frequency::Realtime,
            price_change_threshold: threshold,
            line_connected: false,
            line_user_id: None,
            web_push_enabled: false,
            updated_at: None,
        }
    }

    pub fn apply(&mut self, update: NotificationUpdate) {
        if let Some(categories) = update.categories {
            self.categories = categories;
        }
        if let Some(frequency) = update.frequency {
            self.frequency = frequency;
        }
        if let Some(threshold) = update.price_change_threshold {
            self.price_change_threshold = threshold;
        }
        if let Some(web_push_enabled) = update.web_push_enabled {
            self.web_push_enabled = web_push_enabled;
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbNotificationSettings {
    pub user_id: String,
    pub categories: Json<Vec<String>>,
    pub frequency: String,
    pub price_change_threshold: i64,
    pub line_connected: bool,
    pub line_user_id: Option<String>,
    pub web_push_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbNotificationSettings> for NotificationSettings {
    type Error = AppError;

    fn try_from(value: DbNotificationSettings) -> Result<Self, Self::Error> {
        Ok(NotificationSettings {
            user_id: value.user_id,
            categories: value.categories.0,
            frequency: value.frequency.parse()?,
            price_change_threshold: u32::try_from(value.price_change_threshold)
                .map_err(|_| AppError::internal("stored price change threshold out of range"))?,
            line_connected: value.line_connected,
            line_user_id: value.line_user_id,
            web_push_enabled: value.web_push_enabled,
            updated_at: Some(value.updated_at),
        })
    }
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationUpdate {
    pub categories: Option<Vec<String>>,
    pub frequency: Option<Frequency>,
    pub price_change_threshold: Option<u32>,
    pub web_push_enabled: Option<bool>,
}

impl NotificationUpdate {
    /// Validates a raw JSON object, collecting every field complaint.
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        let object = body
            .as_object()
            .ok_or_else(|| AppError::bad_request("request body must be a JSON object"))?;
        let mut errors = Vec::new();
        let mut update = NotificationUpdate::default();

        if let Some(frequency) = object.get("frequency") {
            match frequency.as_str().and_then(|value| value.parse::<Frequency>().ok()) {
                Some(frequency) => update.frequency = Some(frequency),
                None => errors.push(FieldError::new(
                    "frequency",
                    "allowed values: realtime, morning, evening",
                )),
            }
        }

        if let Some(threshold) = object.get("priceChangeThreshold") {
            match threshold.as_i64() {
                Some(value) if (1..=100).contains(&value) => update.price_change_threshold = Some(value as u32),
                Some(_) => errors.push(FieldError::new("priceChangeThreshold", "must be between 1 and 100")),
                None => errors.push(FieldError::new("priceChangeThreshold", "must be a number")),
            }
        }

        if let Some(categories) = object.get("categories") {
            match categories.as_array() {
                Some(items) => {
                    let names: Option<Vec<String>> = items.iter().map(|item| item.as_str().map(str::to_string)).collect();
                    match names {
                        Some(names) => update.categories = Some(names),
                        None => errors.push(FieldError::new("categories", "must be an array of strings")),
                    }
                }
                None => errors.push(FieldError::new("categories", "must be an array")),
            }
        }

        if let Some(web_push) = object.get("webPushEnabled") {
            match web_push.as_bool() {
                Some(value) => update.web_push_enabled = Some(value),
                None => errors.push(FieldError::new("webPushEnabled", "must be a boolean")),
            }
        }

        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        Ok(update)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationUpdateResponse {
    pub message: String,
    pub settings: NotificationSettings,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineConnectRequest {
    pub line_user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineConnectResponse {
    pub message: String,
    pub line_user_id: String,
}
