//! Validate command handler - parent resolution and tracked-file checks

use crate::cli::ValidateArgs;
use crate::commands::{absolute, open_catalog, scope_for, CommandContext};
use crate::error::Result;
use crate::validate::validate;

/// Run the validate command over PATH (or the working directory).
///
/// Validation failures propagate as one `InconsistentMetadata` error.
pub fn run_validate(args: &ValidateArgs, ctx: &CommandContext) -> Result<String> {
    let target = absolute(args.path.as_deref())?;
    let mut cache = open_catalog(&target)?;
    let scope = scope_for(&cache, &target);

    let report = validate(&mut cache, &scope, !args.metadata_only)?;

    let json_value = serde_json::json!({
        "_type": "validation",
        "root": cache.root_dir().display().to_string(),
        "valid": true,
        "records_in_scope": report.in_scope,
        "records_checked": report.visited,
        "files_checked": report.files_checked,
        "metadata_only": args.metadata_only,
    });
    if let Some(output) = ctx.render_structured(&json_value) {
        return Ok(output);
    }

    let mut output = String::new();
    output.push_str(&format!("root: {}\n", cache.root_dir().display()));
    output.push_str(&format!("records_checked: {}\n", report.visited));
    if !args.metadata_only {
        output.push_str(&format!("files_checked: {}\n", report.files_checked));
    }
    output.push_str("status: ok\n");
    Ok(output)
}
