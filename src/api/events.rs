//! EventBridge rules joined with their targets.
//!
//! Rules and targets are read with separate calls, so a rule edited in
//! between may come back with a stale target list.

use crate::{
    error::Result,
    paginate::{Page, Paginator},
    types::events::{
        DescribeRuleInput, ListRuleNamesByTargetInput, ListRuleNamesByTargetOutput, ListRulesInput,
        ListRulesOutput, ListTargetsByRuleInput, ListTargetsByRuleOutput, Rule, RuleWithTargets,
        Target,
    },
};

/// The EventBridge calls the helpers need.
pub trait EventsApi {
    fn describe_rule(&self, input: &DescribeRuleInput) -> Result<Rule>;
    fn list_targets_by_rule(
        &self,
        input: &ListTargetsByRuleInput,
    ) -> Result<ListTargetsByRuleOutput>;
    fn list_rule_names_by_target(
        &self,
        input: &ListRuleNamesByTargetInput,
    ) -> Result<ListRuleNamesByTargetOutput>;
    fn list_rules(&self, input: &ListRulesInput) -> Result<ListRulesOutput>;
}

/// `DescribeRule` for `name` plus every target of the rule.
///
/// `event_bus_name` of `None` means the default bus.
pub fn describe_rule_with_targets<C>(
    client: &C,
    name: &str,
    event_bus_name: Option<&str>,
) -> Result<RuleWithTargets>
where
    C: EventsApi + ?Sized,
{
    let rule = client.describe_rule(&DescribeRuleInput {
        name: name.to_string(),
        event_bus_name: event_bus_name.map(str::to_string),
    })?;
    let targets = rule_targets(client, name, event_bus_name)?;
    Ok(RuleWithTargets { rule, targets })
}

/// Every rule that sends to `target_arn`, each with only the targets whose
/// ARN is `target_arn`.
pub fn rules_by_target<'a, C>(
    client: &'a C,
    target_arn: &str,
    event_bus_name: Option<&str>,
) -> impl Iterator<Item = Result<RuleWithTargets>> + 'a
where
    C: EventsApi + ?Sized,
{
    let input = ListRuleNamesByTargetInput {
        target_arn: target_arn.to_string(),
        event_bus_name: event_bus_name.map(str::to_string),
        ..ListRuleNamesByTargetInput::default()
    };
    let target_arn = input.target_arn.clone();
    let event_bus_name = input.event_bus_name.clone();

    let names = Paginator::new(move |token: Option<String>| {
        let mut request = input.clone();
        request.next_token = token;
        let page = client.list_rule_names_by_target(&request)?;
        Ok(Page::new(page.rule_names, page.next_token))
    });
    names.map(move |name| {
        let mut described = describe_rule_with_targets(client, &name?, event_bus_name.as_deref())?;
        described.targets.retain(|t| t.arn == target_arn);
        Ok(described)
    })
}

/// Every rule `input` lists, each with all of its targets.
///
/// Targets are looked up on the bus the rule reports, falling back to the
/// bus named in `input`.
pub fn rules_with_targets<'a, C>(
    client: &'a C,
    input: ListRulesInput,
) -> impl Iterator<Item = Result<RuleWithTargets>> + 'a
where
    C: EventsApi + ?Sized,
{
    let default_bus = input.event_bus_name.clone();
    let start = input.next_token.clone();
    let rules = Paginator::starting_at(start, move |token: Option<String>| {
        let mut request = input.clone();
        request.next_token = token;
        let page = client.list_rules(&request)?;
        Ok(Page::new(page.rules, page.next_token))
    });
    rules.map(move |rule| {
        let rule = rule?;
        let bus = rule.event_bus_name.as_deref().or(default_bus.as_deref());
        let targets = rule_targets(client, &rule.name, bus)?;
        Ok(RuleWithTargets { rule, targets })
    })
}

fn rule_targets<C>(client: &C, rule: &str, event_bus_name: Option<&str>) -> Result<Vec<Target>>
where
    C: EventsApi + ?Sized,
{
    let input = ListTargetsByRuleInput {
        rule: rule.to_string(),
        event_bus_name: event_bus_name.map(str::to_string),
        ..ListTargetsByRuleInput::default()
    };
    Paginator::new(|token: Option<String>| {
        let mut request = input.clone();
        request.next_token = token;
        let page = client.list_targets_by_rule(&request)?;
        Ok(Page::new(page.targets, page.next_token))
    })
    .collect()
}

#[cfg(feature = "client")]
impl EventsApi for crate::client::AwsClient {
    fn describe_rule(&self, input: &DescribeRuleInput) -> Result<Rule> {
        self.call_json(&crate::client::JsonService::EVENTS, "DescribeRule", input)
    }

    fn list_targets_by_rule(
        &self,
        input: &ListTargetsByRuleInput,
    ) -> Result<ListTargetsByRuleOutput> {
        self.call_json(&crate::client::JsonService::EVENTS, "ListTargetsByRule", input)
    }

    fn list_rule_names_by_target(
        &self,
        input: &ListRuleNamesByTargetInput,
    ) -> Result<ListRuleNamesByTargetOutput> {
        self.call_json(
            &crate::client::JsonService::EVENTS,
            "ListRuleNamesByTarget",
            input,
        )
    }

    fn list_rules(&self, input: &ListRulesInput) -> Result<ListRulesOutput> {
        self.call_json(&crate::client::JsonService::EVENTS, "ListRules", input)
    }
}
