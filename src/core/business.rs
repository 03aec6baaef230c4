//! Tenant ("business") configuration model

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for one tenant, parsed from its declarative document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessConfig {
    /// Tenant identifier (falls back to the lookup key when absent)
    pub id: String,

    pub display_name: String,

    /// IANA timezone name, e.g. "America/Chicago"
    pub timezone: String,

    /// ISO currency code
    pub currency: String,

    pub location: LocationConfig,

    /// CRM board mapping
    #[serde(rename = "monday")]
    pub crm: CrmConfig,

    /// Payment provider key reference
    #[serde(rename = "stripe")]
    pub payments: PaymentConfig,

    /// Outbound mail sender identity
    #[serde(rename = "gmail")]
    pub mail: MailConfig,

    pub contact: ContactConfig,

    /// Notification channel settings
    #[serde(rename = "slack")]
    pub notifications: NotificationConfig,

    pub templates: TemplateConfig,

    /// Default pipeline and trigger associations
    pub pipelines: BusinessPipelines,
}

impl BusinessConfig {
    /// Pipeline key configured for form events, if any
    pub fn default_form_pipeline(&self) -> Option<&str> {
        Some(self.pipelines.default_form.as_str()).filter(|key| !key.is_empty())
    }

    /// Pipeline key mapped to a trigger, if the trigger is known
    pub fn pipeline_for_trigger(&self, trigger_key: &str) -> Option<&str> {
        self.pipelines.triggers.get(trigger_key).map(String::as_str)
    }
}

/// Pipeline selection for a business
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessPipelines {
    /// Pipeline used for form events that do not name one
    pub default_form: String,

    /// Trigger key -> pipeline key
    pub triggers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrmConfig {
    /// Environment variable holding the API token
    pub api_token_env: String,

    /// Logical board name -> board id
    pub boards: HashMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentConfig {
    pub api_key_env: String,
    pub default_currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailConfig {
    pub sender: String,
    pub sender_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactConfig {
    pub support_email: String,
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    #[serde(rename = "logoURL")]
    pub logo_url: String,
    #[serde(rename = "bookAppointmentURL")]
    pub book_appointment_url: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub webhook_env: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateConfig {
    /// Template name -> template path
    pub email: HashMap<String, String>,
    pub email_template_settings: EmailTemplateSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailTemplateSettings {
    pub default_template: String,
    pub available_templates: Vec<String>,
}

/// Origin used for distance-based calculations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationConfig {
    pub office_address: String,

    /// Address or "lat,lng" pair; `lat`/`lng` take precedence when set
    pub distance_origin: String,

    pub lat: f64,
    pub lng: f64,
    pub service_radius_miles: f64,
}
