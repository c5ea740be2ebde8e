//! Amazon Resource Names.
//!
//! Parsing keeps track of the separator between resource type and id so an
//! ARN formats back to the text it came from, whichever of the three
//! layouts it used:
//!
//! ```text
//! arn:partition:service:region:account:resource-id
//! arn:partition:service:region:account:resource-type/resource-id
//! arn:partition:service:region:account:resource-type:resource-id
//! ```

use std::{fmt, str::FromStr};

use crate::{
    api::sts::StsApi,
    error::{Error, Result},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    /// Empty for ARNs whose resource is a bare id.
    pub resource_type: String,
    pub resource_id: String,
    /// `/` or `:`.
    pub resource_separator: char,
}

impl Arn {
    /// Applies every field set in `overrides`.
    pub fn apply(&mut self, overrides: &ArnOverrides) {
        let fields = [
            (&mut self.partition, &overrides.partition),
            (&mut self.service, &overrides.service),
            (&mut self.region, &overrides.region),
            (&mut self.account_id, &overrides.account_id),
            (&mut self.resource_type, &overrides.resource_type),
            (&mut self.resource_id, &overrides.resource_id),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                field.clone_from(value);
            }
        }
        if let Some(separator) = overrides.resource_separator {
            self.resource_separator = separator;
        }
    }
}

impl FromStr for Arn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s.splitn(6, ':').collect::<Vec<_>>();
        let [prefix, partition, service, region, account_id, resource] = parts[..] else {
            return Err(Error::invalid_input(format!("not an ARN: {s}")));
        };
        if prefix != "arn" || resource.is_empty() {
            return Err(Error::invalid_input(format!("not an ARN: {s}")));
        }

        // A `:` before any `/` wins, so `function:f:alias/x` keeps its slash.
        let split = match (resource.find(':'), resource.find('/')) {
            (Some(colon), Some(slash)) if slash < colon => Some((slash, '/')),
            (Some(colon), _) => Some((colon, ':')),
            (None, Some(slash)) => Some((slash, '/')),
            (None, None) => None,
        };
        let (resource_type, resource_id, resource_separator) = match split {
            Some((at, separator)) => (&resource[..at], &resource[at + 1..], separator),
            None => ("", resource, '/'),
        };

        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            resource_separator,
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:",
            self.partition, self.service, self.region, self.account_id
        )?;
        if !self.resource_type.is_empty() {
            write!(f, "{}{}", self.resource_type, self.resource_separator)?;
        }
        f.write_str(&self.resource_id)
    }
}

/// Fields to replace when deriving one ARN from another. `None` keeps the
/// existing value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArnOverrides {
    pub partition: Option<String>,
    pub service: Option<String>,
    pub region: Option<String>,
    pub account_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub resource_separator: Option<char>,
}

/// Formats `existing` with `overrides` applied.
///
/// ```
/// use aws_helpers::arn::{ArnOverrides, construct_arn};
///
/// let queue = construct_arn(
///     "arn:aws:sns:us-east-2:000000000000:example-topic",
///     &ArnOverrides {
///         service: Some("sqs".to_string()),
///         resource_id: Some("example-queue".to_string()),
///         ..ArnOverrides::default()
///     },
/// )
/// .unwrap();
/// assert_eq!(queue, "arn:aws:sqs:us-east-2:000000000000:example-queue");
/// ```
pub fn construct_arn(existing: &str, overrides: &ArnOverrides) -> Result<String> {
    let mut arn = existing.parse::<Arn>()?;
    arn.apply(overrides);
    Ok(arn.to_string())
}

/// Like [`construct_arn`], starting from the caller's own identity.
///
/// The region defaults to the STS client's region, since identity ARNs
/// carry none.
pub fn caller_arn<C>(sts: &C, overrides: &ArnOverrides) -> Result<String>
where
    C: StsApi + ?Sized,
{
    let identity = sts.get_caller_identity()?;
    let mut overrides = overrides.clone();
    if overrides.region.is_none() {
        overrides.region = Some(sts.region().as_str().to_string());
    }
    construct_arn(&identity.arn, &overrides)
}
