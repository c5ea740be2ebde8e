use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeScheduleInput {
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeScheduleOutput {
    #[serde(default)]
    pub schedule_actions: Vec<ScheduleAction>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduleAction {
    pub action_name: String,
    #[serde(default)]
    pub schedule_action_start_settings: ScheduleActionStartSettings,
    /// Action payload; its shape depends on the action type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_action_settings: Option<serde_json::Value>,
}

impl ScheduleAction {
    /// Name of the action this one follows, if it starts in follow mode.
    pub fn reference_action_name(&self) -> Option<&str> {
        self.schedule_action_start_settings
            .follow_mode_schedule_action_start_settings
            .as_ref()
            .map(|follow| follow.reference_action_name.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduleActionStartSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_mode_schedule_action_start_settings: Option<FixedModeStartSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_mode_schedule_action_start_settings: Option<FollowModeStartSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate_mode_schedule_action_start_settings: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FixedModeStartSettings {
    pub time: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FollowModeStartSettings {
    /// `END` or `START`.
    pub follow_point: String,
    pub reference_action_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchUpdateScheduleInput {
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletes: Option<BatchScheduleActionDeleteRequest>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchScheduleActionDeleteRequest {
    pub action_names: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchUpdateScheduleOutput {
    #[serde(default)]
    pub deletes: Option<BatchScheduleActionDeleteResult>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchScheduleActionDeleteResult {
    #[serde(default)]
    pub schedule_actions: Vec<ScheduleAction>,
}
