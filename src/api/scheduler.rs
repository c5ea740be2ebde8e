//! EventBridge Scheduler listings with full schedule details.

use crate::{
    error::Result,
    paginate::{Page, Paginator},
    types::scheduler::{GetScheduleInput, ListSchedulesInput, ListSchedulesOutput, Schedule},
};

/// The Scheduler calls the helpers need.
pub trait SchedulerApi {
    fn list_schedules(&self, input: &ListSchedulesInput) -> Result<ListSchedulesOutput>;
    fn get_schedule(&self, input: &GetScheduleInput) -> Result<Schedule>;
}

/// `GetSchedule` for every schedule `input` lists.
///
/// A schedule deleted between the listing and the lookup surfaces as the
/// client's not-found error for that item.
pub fn schedules_with_details<'a, C>(
    client: &'a C,
    input: ListSchedulesInput,
) -> impl Iterator<Item = Result<Schedule>> + 'a
where
    C: SchedulerApi + ?Sized,
{
    let start = input.next_token.clone();
    Paginator::starting_at(start, move |token: Option<String>| {
        let mut request = input.clone();
        request.next_token = token;
        let page = client.list_schedules(&request)?;
        Ok(Page::new(page.schedules, page.next_token))
    })
    .map(move |summary| {
        let summary = summary?;
        client.get_schedule(&GetScheduleInput {
            name: summary.name,
            group_name: summary.group_name,
        })
    })
}
