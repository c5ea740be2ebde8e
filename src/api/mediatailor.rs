//! MediaTailor partial configuration updates.

use crate::{
    error::Result,
    types::mediatailor::{GetPlaybackConfigurationInput, PlaybackConfiguration},
};

/// The MediaTailor calls the helpers need.
pub trait MediaTailorApi {
    fn get_playback_configuration(
        &self,
        input: &GetPlaybackConfigurationInput,
    ) -> Result<PlaybackConfiguration>;
    fn put_playback_configuration(
        &self,
        input: &PlaybackConfiguration,
    ) -> Result<PlaybackConfiguration>;
}

/// Fields `GetPlaybackConfiguration` returns that `PutPlaybackConfiguration`
/// does not accept.
const READ_ONLY_FIELDS: [&str; 6] = [
    "HlsConfiguration",
    "LogConfiguration",
    "PlaybackConfigurationArn",
    "PlaybackEndpointPrefix",
    "ResponseMetadata",
    "SessionInitializationEndpointPrefix",
];

/// Fetches configuration `name`, applies `changes` over it as top-level
/// replacements and writes the result back. Returns the service's response
/// to the put.
///
/// The read and the write are separate calls; a concurrent edit in between
/// is overwritten.
pub fn update_playback_configuration<C>(
    client: &C,
    name: &str,
    changes: PlaybackConfiguration,
) -> Result<PlaybackConfiguration>
where
    C: MediaTailorApi + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!("aws_helpers.mediatailor.update", name).entered();

    let mut config = client.get_playback_configuration(&GetPlaybackConfigurationInput {
        name: name.to_string(),
    })?;
    for field in READ_ONLY_FIELDS {
        config.remove(field);
    }
    if let Some(dash) = config
        .get_mut("DashConfiguration")
        .and_then(|dash| dash.as_object_mut())
    {
        dash.remove("ManifestEndpointPrefix");
    }
    config.extend(changes);

    client.put_playback_configuration(&config)
}
