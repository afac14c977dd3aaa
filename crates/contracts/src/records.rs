//! Built-in none-stream record types
//!
//! User-managed configuration entities of the backend. Each type exposes a
//! `definition()` that the composition root registers at startup.

use serde::{Deserialize, Serialize};

use crate::{time_bucket, NoneStream, ScopeId, StreamDefinition, StreamDescriptor};

/// Dashboard template saved from the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiTemplate {
    pub template_id: String,
    /// Raw template configuration (JSON text authored by the UI)
    pub configuration: String,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub disabled: bool,
    /// Last update, unix millis
    pub update_time: i64,
}

impl UiTemplate {
    pub const STREAM: &'static str = "ui_template";

    pub fn definition() -> StreamDefinition<Self> {
        StreamDefinition::json(StreamDescriptor::none_stream(
            Self::STREAM,
            ScopeId::UI_TEMPLATE,
        ))
    }
}

impl NoneStream for UiTemplate {
    const KIND: &'static str = "ui_template";

    fn entity_id(&self) -> String {
        self.template_id.clone()
    }

    fn time_bucket(&self) -> i64 {
        time_bucket::from_millis(self.update_time).unwrap_or_default()
    }
}

/// Alarm rule edited at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRuleConfig {
    pub rule_name: String,
    /// Metric expression evaluated by the alarm core
    pub expression: String,
    /// Evaluation window, minutes
    #[serde(default = "default_period")]
    pub period: u32,
    /// Minutes to stay silent after firing
    #[serde(default)]
    pub silence_period: u32,
    #[serde(default)]
    pub message: String,
    /// Last update, unix millis
    pub update_time: i64,
}

fn default_period() -> u32 {
    10
}

impl AlarmRuleConfig {
    pub const STREAM: &'static str = "alarm_rule_config";

    pub fn definition() -> StreamDefinition<Self> {
        StreamDefinition::json(StreamDescriptor::none_stream(
            Self::STREAM,
            ScopeId::ALARM_RULE,
        ))
    }
}

impl NoneStream for AlarmRuleConfig {
    const KIND: &'static str = "alarm_rule_config";

    fn entity_id(&self) -> String {
        self.rule_name.clone()
    }

    fn time_bucket(&self) -> i64 {
        time_bucket::from_millis(self.update_time).unwrap_or_default()
    }
}

/// Profiling task created by an operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTaskRecord {
    pub task_id: String,
    pub service_id: String,
    pub endpoint_name: String,
    /// Task start, unix millis
    pub start_time: i64,
    /// Monitoring duration, minutes
    pub duration: u32,
    /// Slowest trace threshold, millis
    #[serde(default)]
    pub min_duration_threshold: u32,
    /// Thread dump period, millis
    #[serde(default = "default_dump_period")]
    pub dump_period: u32,
    #[serde(default = "default_max_sampling_count")]
    pub max_sampling_count: u32,
    /// Creation, unix millis
    pub create_time: i64,
}

fn default_dump_period() -> u32 {
    10
}

fn default_max_sampling_count() -> u32 {
    5
}

impl ProfileTaskRecord {
    pub const STREAM: &'static str = "profile_task";

    pub fn definition() -> StreamDefinition<Self> {
        StreamDefinition::json(StreamDescriptor::none_stream(
            Self::STREAM,
            ScopeId::PROFILE_TASK,
        ))
    }
}

impl NoneStream for ProfileTaskRecord {
    const KIND: &'static str = "profile_task";

    fn entity_id(&self) -> String {
        self.task_id.clone()
    }

    fn time_bucket(&self) -> i64 {
        time_bucket::from_millis(self.create_time).unwrap_or_default()
    }
}
