pub mod apply;
pub mod parse;
pub mod query;
pub mod schema;
pub mod search;

use serde_json::json;

use qsfilter::{FilterError, QueryParams};

use crate::output::OutputManager;

/// Decode the request query given on the command line
pub fn request_params(raw: &str, output: &OutputManager) -> QueryParams {
    let params = QueryParams::from_query_string(raw);
    output.verbose(&format!("decoded {} query parameter(s)", params.len()));
    params
}

/// Report a rejected request the way an API would answer it
pub fn filter_failure(err: FilterError, output: &OutputManager) -> anyhow::Error {
    let status = err.status();
    if output.is_json() {
        let body = json!({ "errors": [err.to_detail()] });
        match serde_json::to_string_pretty(&body) {
            Ok(rendered) => println!("{rendered}"),
            Err(render_err) => output.error(&format!("Failed to render error: {render_err}")),
        }
    } else {
        output.error(&err.to_string());
        if let Some(field) = err.field() {
            output.verbose(&format!("source parameter: filter[{field}]"));
        }
    }
    anyhow::Error::new(err).context(format!("Request rejected with status {}", status))
}
