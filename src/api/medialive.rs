//! MediaLive schedule helpers.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{Error, Result},
    paginate::{Page, Paginator},
    types::medialive::{
        BatchScheduleActionDeleteRequest, BatchUpdateScheduleInput, BatchUpdateScheduleOutput,
        DescribeScheduleInput, DescribeScheduleOutput, ScheduleAction,
    },
};

/// The MediaLive calls the helpers need.
pub trait MediaLiveApi {
    fn describe_schedule(&self, input: &DescribeScheduleInput) -> Result<DescribeScheduleOutput>;
    fn batch_update_schedule(
        &self,
        input: &BatchUpdateScheduleInput,
    ) -> Result<BatchUpdateScheduleOutput>;
}

/// Every action in the channel's schedule.
pub fn schedule_actions<'a, C>(
    client: &'a C,
    channel_id: &str,
) -> impl Iterator<Item = Result<ScheduleAction>> + 'a
where
    C: MediaLiveApi + ?Sized,
{
    let channel_id = channel_id.to_string();
    Paginator::new(move |token: Option<String>| {
        let page = client.describe_schedule(&DescribeScheduleInput {
            channel_id: channel_id.clone(),
            next_token: token,
            max_results: None,
        })?;
        Ok(Page::new(page.schedule_actions, page.next_token))
    })
}

/// Deletes `action_name` and every action that follows it, directly or
/// through other follow-mode actions. Returns the affected names, sorted.
///
/// With `dry_run` nothing is deleted; the names that would be are returned.
/// An action that is not in the schedule is [`Error::InvalidInput`].
/// MediaLive still refuses to delete a chain tied to the most recent input
/// switch; that error comes back from the service.
pub fn delete_schedule_action_chain<C>(
    client: &C,
    channel_id: &str,
    action_name: &str,
    dry_run: bool,
) -> Result<Vec<String>>
where
    C: MediaLiveApi + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _guard = tracing::info_span!(
        "aws_helpers.medialive.delete_chain",
        channel_id,
        action_name,
        dry_run
    )
    .entered();

    let actions = schedule_actions(client, channel_id).collect::<Result<Vec<_>>>()?;
    let chain = action_chain(&actions, action_name).ok_or_else(|| {
        Error::invalid_input(format!(
            "action {action_name} was not present in the schedule of channel {channel_id}"
        ))
    })?;
    let names: Vec<String> = chain.into_iter().map(str::to_string).collect();

    if !dry_run {
        client.batch_update_schedule(&BatchUpdateScheduleInput {
            channel_id: channel_id.to_string(),
            deletes: Some(BatchScheduleActionDeleteRequest {
                action_names: names.clone(),
            }),
        })?;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(count = names.len(), "schedule action chain resolved");

    Ok(names)
}

/// `root` and all of its follow-mode descendants, or `None` if `root` is not
/// one of `actions`.
fn action_chain<'s>(actions: &'s [ScheduleAction], root: &str) -> Option<BTreeSet<&'s str>> {
    let mut followers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut root_name = None;
    for action in actions {
        let name = action.action_name.as_str();
        if name == root {
            root_name = Some(name);
        }
        if let Some(parent) = action.reference_action_name() {
            followers.entry(parent).or_default().push(name);
        }
    }

    let mut chain = BTreeSet::new();
    let mut pending = vec![root_name?];
    while let Some(name) = pending.pop() {
        if chain.insert(name)
            && let Some(children) = followers.get(name)
        {
            pending.extend(children.iter().copied());
        }
    }
    Some(chain)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::types::medialive::{FollowModeStartSettings, ScheduleActionStartSettings};

    fn immediate(name: &str) -> ScheduleAction {
        ScheduleAction {
            action_name: name.to_string(),
            schedule_action_start_settings: ScheduleActionStartSettings {
                immediate_mode_schedule_action_start_settings: Some(serde_json::json!({})),
                ..ScheduleActionStartSettings::default()
            },
            schedule_action_settings: None,
        }
    }

    fn following(name: &str, parent: &str) -> ScheduleAction {
        ScheduleAction {
            action_name: name.to_string(),
            schedule_action_start_settings: ScheduleActionStartSettings {
                follow_mode_schedule_action_start_settings: Some(FollowModeStartSettings {
                    follow_point: "END".to_string(),
                    reference_action_name: parent.to_string(),
                }),
                ..ScheduleActionStartSettings::default()
            },
            schedule_action_settings: None,
        }
    }

    struct FakeChannel {
        pages: Vec<Vec<ScheduleAction>>,
        updates: RefCell<Vec<BatchUpdateScheduleInput>>,
    }

    impl FakeChannel {
        fn new() -> Self {
            // switch-1 <- slate-1 <- slate-2, slate-1 <- overlay; switch-2 alone.
            // The listing order puts children before parents on purpose.
            Self {
                pages: vec![
                    vec![following("slate-2", "slate-1"), immediate("switch-1")],
                    vec![
                        following("overlay", "slate-1"),
                        following("slate-1", "switch-1"),
                        immediate("switch-2"),
                    ],
                ],
                updates: RefCell::new(Vec::new()),
            }
        }
    }

    impl MediaLiveApi for FakeChannel {
        fn describe_schedule(
            &self,
            input: &DescribeScheduleInput,
        ) -> Result<DescribeScheduleOutput> {
            let index = usize::from(input.next_token.is_some());
            Ok(DescribeScheduleOutput {
                schedule_actions: self.pages[index].clone(),
                next_token: (index == 0).then(|| "page-2".to_string()),
            })
        }

        fn batch_update_schedule(
            &self,
            input: &BatchUpdateScheduleInput,
        ) -> Result<BatchUpdateScheduleOutput> {
            self.updates.borrow_mut().push(input.clone());
            Ok(BatchUpdateScheduleOutput::default())
        }
    }

    #[test]
    fn deletes_the_whole_follow_chain() {
        let channel = FakeChannel::new();
        let deleted = delete_schedule_action_chain(&channel, "24601", "switch-1", false).unwrap();

        assert_eq!(deleted, vec!["overlay", "slate-1", "slate-2", "switch-1"]);
        let updates = channel.updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].channel_id, "24601");
        assert_eq!(
            updates[0].deletes.as_ref().unwrap().action_names,
            vec!["overlay", "slate-1", "slate-2", "switch-1"]
        );
    }

    #[test]
    fn mid_chain_action_takes_only_its_followers() {
        let channel = FakeChannel::new();
        let deleted = delete_schedule_action_chain(&channel, "24601", "slate-1", true).unwrap();
        assert_eq!(deleted, vec!["overlay", "slate-1", "slate-2"]);
        assert!(channel.updates.borrow().is_empty());
    }

    #[test]
    fn unknown_action_is_rejected_before_any_delete() {
        let channel = FakeChannel::new();
        let err = delete_schedule_action_chain(&channel, "24601", "missing", false).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(channel.updates.borrow().is_empty());
    }

    #[test]
    fn standalone_action_is_its_own_chain() {
        let channel = FakeChannel::new();
        let deleted = delete_schedule_action_chain(&channel, "24601", "switch-2", true).unwrap();
        assert_eq!(deleted, vec!["switch-2"]);
    }

    #[test]
    fn follow_cycle_is_walked_once() {
        let actions = vec![
            following("a", "c"),
            following("b", "a"),
            following("c", "b"),
            following("d", "b"),
        ];
        let chain = action_chain(&actions, "b").unwrap();
        assert_eq!(chain.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
        assert!(action_chain(&actions, "e").is_none());
    }
}
