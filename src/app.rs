// The request pipeline: build, sign and send one request, then print the
// response. `main` only wires in the real process streams.

use crate::api::{ApiClient, ApiResponse};
use crate::config::Config;
use crate::error::CliError;
use crate::request::ApiRequest;
use crate::ui::{self, OutputCaps};
use std::io::{Read, Write};

/// One invocation's inputs after argument parsing.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub target: &'a str,
    pub body: Option<&'a str>,
}

/// Run the request and print the response to `out`. Returns the HTTP status;
/// the caller turns anything but 200 into a failing exit code.
pub fn run<R: Read, W: Write>(
    invocation: &Invocation<'_>,
    config: &Config,
    stdin: R,
    out: &mut W,
    caps: OutputCaps,
) -> Result<u16, CliError> {
    let request = ApiRequest::build(invocation.target, invocation.body, &config.apiserver, stdin)?;
    let response = dispatch(invocation.target, config, &request)?;
    ui::present(&response, caps, out)?;
    Ok(response.status)
}

fn dispatch(target: &str, config: &Config, request: &ApiRequest) -> Result<ApiResponse, CliError> {
    let client = ApiClient::new(config).map_err(|e| CliError::dispatch(target, e))?;
    let spinner = ui::spinner(format!("{} {}", request.method(), request.endpoint));
    let result = client.execute(request);
    spinner.finish_and_clear();
    result.map_err(|e| CliError::dispatch(target, e))
}

/// Exit code for a completed request.
pub fn status_exit_code(status: u16) -> i32 {
    if status == 200 {
        0
    } else {
        1
    }
}
