//! Graph command handler - strongly connected components of the parent graph

use crate::cache::Handle;
use crate::cli::GraphArgs;
use crate::commands::{absolute, open_catalog, CommandContext};
use crate::error::Result;
use crate::resolve::ParentGraph;
use crate::scc::calculate_scc;

/// Run the graph command.
///
/// By default only components that form a cycle are listed: more than one
/// member, or a record that is its own parent.
pub fn run_graph(args: &GraphArgs, ctx: &CommandContext) -> Result<String> {
    let start = absolute(args.path.as_deref())?;
    let mut cache = open_catalog(&start)?;
    let (graph, unresolved) = ParentGraph::build(&mut cache);
    let scc = calculate_scc(&graph);

    let is_cycle =
        |members: &[Handle]| members.len() > 1 || graph.parents(members[0]).contains(&members[0]);
    let shown: Vec<&Vec<Handle>> = scc
        .components
        .iter()
        .filter(|members| args.all || is_cycle(members))
        .collect();
    let cycles = scc.components.iter().filter(|m| is_cycle(m)).count();

    let components: Vec<serde_json::Value> = shown
        .iter()
        .map(|members| {
            let paths: Vec<String> = members
                .iter()
                .map(|&h| cache.relative_path(h).display().to_string())
                .collect();
            serde_json::json!({ "cycle": is_cycle(members), "members": paths })
        })
        .collect();

    let json_value = serde_json::json!({
        "_type": "parent_graph",
        "records": graph.len(),
        "components": scc.len(),
        "cycles": cycles,
        "unresolved_parents": unresolved.len(),
        "shown": components,
    });
    if let Some(output) = ctx.render_structured(&json_value) {
        return Ok(output);
    }

    let mut output = String::new();
    output.push_str(&format!("records: {}\n", graph.len()));
    output.push_str(&format!("components: {}\n", scc.len()));
    output.push_str(&format!("cycles: {}\n", cycles));
    if !unresolved.is_empty() {
        output.push_str(&format!(
            "unresolved_parents: {} (run `tame validate` for details)\n",
            unresolved.len()
        ));
    }
    for (i, members) in shown.iter().enumerate() {
        let marker = if is_cycle(members) { " (cycle)" } else { "" };
        output.push_str(&format!("component {}{}:\n", i, marker));
        for &handle in members.iter() {
            output.push_str(&format!("  - {}\n", cache.relative_path(handle).display()));
        }
    }
    Ok(output)
}
