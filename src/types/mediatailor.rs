use serde::Serialize;

/// A playback configuration as free-form JSON.
///
/// MediaTailor adds settings often enough that a typed model would drop
/// fields on the way through a read-modify-write cycle.
pub type PlaybackConfiguration = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetPlaybackConfigurationInput {
    pub name: String,
}
