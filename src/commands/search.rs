//! Search command handler - key/value search across inherited metadata

use crate::cli::SearchArgs;
use crate::commands::{absolute, open_catalog, scope_for, CommandContext};
use crate::error::Result;
use crate::search::{search_scoped, AndMatcher, KeyValueMatcher, MatchType, Matcher, OrMatcher};

/// Build the combined matcher for the command-line terms
pub fn build_matcher(args: &SearchArgs) -> Result<Box<dyn Matcher>> {
    let match_type = MatchType::from(args.op);
    let mut matchers: Vec<Box<dyn Matcher>> = Vec::with_capacity(args.terms.len());
    for term in &args.terms {
        let (key, value) = SearchArgs::split_term(term);
        matchers.push(Box::new(KeyValueMatcher::new(
            key.map(str::to_string),
            value,
            !args.no_parents,
            match_type,
        )?));
    }

    Ok(if args.any {
        Box::new(OrMatcher::new(matchers))
    } else {
        Box::new(AndMatcher::new(matchers))
    })
}

/// Run the search command
pub fn run_search(args: &SearchArgs, ctx: &CommandContext) -> Result<String> {
    let matcher = build_matcher(args)?;
    let target = absolute(args.path.as_deref())?;
    let mut cache = open_catalog(&target)?;
    let scope = scope_for(&cache, &target);

    let hits = search_scoped(&mut cache, &scope, matcher.as_ref());

    let results: Vec<serde_json::Value> = hits
        .iter()
        .map(|&handle| {
            let record = cache.get(handle);
            serde_json::json!({
                "path": cache.relative_path(handle).display().to_string(),
                "type": record.record_type,
                "name": record.name,
                "uid": record.uid,
            })
        })
        .collect();

    let json_value = serde_json::json!({
        "_type": "search_results",
        "terms": args.terms,
        "count": results.len(),
        "results": results,
    });
    if let Some(output) = ctx.render_structured(&json_value) {
        return Ok(output);
    }

    let mut output = String::new();
    if hits.is_empty() {
        output.push_str("No matching metadata found.\n");
        return Ok(output);
    }
    for &handle in &hits {
        let record = cache.get(handle);
        let label = if record.name.is_empty() {
            record.record_type.clone()
        } else {
            format!("{} {}", record.record_type, record.name)
        };
        output.push_str(&format!(
            "{}  ({})\n",
            cache.relative_path(handle).display(),
            label
        ));
    }
    Ok(output)
}
