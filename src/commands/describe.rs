//! Describe command handler - one record, its parents and inherited data

use crate::cli::DescribeArgs;
use crate::commands::{absolute, inherited_json, open_catalog, CommandContext};
use crate::error::Result;
use crate::resolve::resolve_parents;
use crate::scc::calculate_scc_parent_keyvals;

/// Run the describe command
pub fn run_describe(args: &DescribeArgs, ctx: &CommandContext) -> Result<String> {
    let file = absolute(Some(args.file.as_path()))?;
    let mut cache = open_catalog(&file)?;
    let handle = cache.lookup_by_path(&file)?;

    let (parents, unresolved) = resolve_parents(&mut cache, handle);
    let keyvals = calculate_scc_parent_keyvals(&mut cache);
    let inherited = keyvals.for_handle(handle);
    let record = cache.get(handle);

    let parent_paths: Vec<String> = parents
        .iter()
        .map(|&p| cache.relative_path(p).display().to_string())
        .collect();
    let unresolved: Vec<String> = unresolved
        .into_iter()
        .map(|u| format!("{}: {}", u.parent, u.error))
        .collect();

    let json_value = serde_json::json!({
        "_type": "record",
        "path": cache.relative_path(handle).display().to_string(),
        "type": record.record_type,
        "name": record.name,
        "uid": record.uid,
        "parents": parent_paths,
        "unresolved_parents": unresolved,
        "files": record.tracked_files,
        "data": record.user_data,
        "inherited": inherited_json(inherited),
    });
    if let Some(output) = ctx.render_structured(&json_value) {
        return Ok(output);
    }

    let mut output = String::new();
    output.push_str(&format!("path: {}\n", cache.relative_path(handle).display()));
    output.push_str(&format!("type: {}\n", record.record_type));
    if !record.name.is_empty() {
        output.push_str(&format!("name: {}\n", record.name));
    }
    if !record.uid.is_empty() {
        output.push_str(&format!("uid: {}\n", record.uid));
    }
    if !parent_paths.is_empty() || !unresolved.is_empty() {
        output.push_str("parents:\n");
        for path in &parent_paths {
            output.push_str(&format!("  - {}\n", path));
        }
        for failure in &unresolved {
            output.push_str(&format!("  - UNRESOLVED {}\n", failure));
        }
    }
    if !record.tracked_files.is_empty() {
        output.push_str("files:\n");
        for entry in &record.tracked_files {
            output.push_str(&format!("  - {}\n", entry));
        }
    }
    if !record.user_data.is_empty() {
        output.push_str("data:\n");
        for (key, value) in &record.user_data {
            output.push_str(&format!("  {}: {}\n", key, value));
        }
    }
    if !inherited.is_empty() {
        output.push_str("inherited:\n");
        for (identity, data) in inherited {
            output.push_str(&format!("  {}:\n", identity));
            for (key, value) in data {
                output.push_str(&format!("    {}: {}\n", key, value));
            }
        }
    }
    Ok(output)
}
