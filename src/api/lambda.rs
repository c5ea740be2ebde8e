//! Lambda environment updates.

use std::collections::BTreeMap;

use crate::{
    error::Result,
    types::lambda::{
        Environment, FunctionConfiguration, GetFunctionConfigurationInput,
        UpdateFunctionConfigurationInput,
    },
};

/// The Lambda calls the helpers need.
pub trait LambdaApi {
    fn get_function_configuration(
        &self,
        input: &GetFunctionConfigurationInput,
    ) -> Result<FunctionConfiguration>;
    fn update_function_configuration(
        &self,
        input: &UpdateFunctionConfigurationInput,
    ) -> Result<FunctionConfiguration>;
}

/// Merges `new_env` into the function's environment variables and returns
/// the environment that was written.
///
/// Variables not named in `new_env` keep their current values. The read and
/// the write are separate calls.
pub fn update_environment_variables<C>(
    client: &C,
    function_name: &str,
    new_env: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>>
where
    C: LambdaApi + ?Sized,
{
    let current = client.get_function_configuration(&GetFunctionConfigurationInput {
        function_name: function_name.to_string(),
        qualifier: None,
    })?;
    let mut variables = current
        .environment
        .map(|env| env.variables)
        .unwrap_or_default();
    variables.extend(new_env);

    client.update_function_configuration(&UpdateFunctionConfigurationInput {
        function_name: function_name.to_string(),
        environment: Some(Environment {
            variables: variables.clone(),
        }),
    })?;
    Ok(variables)
}
