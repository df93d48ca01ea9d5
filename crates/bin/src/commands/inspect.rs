//! Read-only commands: show, list, get, children.

use opttree::store::Value;

use super::{CommandResult, Context};
use crate::{
    cli::{ChildrenArgs, FileArgs, PathArgs},
    output::{OutputFormat, print_table, value_json, value_rows},
};

fn describe(value: Option<&Value>) -> [String; 3] {
    match value {
        Some(value) => [
            value.type_name().to_string(),
            value.rank().to_string(),
            value.shape().to_string(),
        ],
        None => ["-".to_string(), "-".to_string(), "-".to_string()],
    }
}

/// Print the whole tree
pub fn show(ctx: &Context, args: &FileArgs) -> CommandResult {
    let store = ctx.load(&args.file)?;
    match ctx.output {
        OutputFormat::Human => print!("{store}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(store.root())?),
    }
    Ok(())
}

/// List every path with its type, rank and shape
pub fn list(ctx: &Context, args: &FileArgs) -> CommandResult {
    let store = ctx.load(&args.file)?;
    let paths = store.option_paths();

    match ctx.output {
        OutputFormat::Human => {
            let mut rows = Vec::with_capacity(paths.len());
            for path in &paths {
                let [type_name, rank, shape] = describe(store.resolve(path)?.value());
                rows.push(vec![path.clone(), type_name, rank, shape]);
            }
            print_table(&["PATH", "TYPE", "RANK", "SHAPE"], &rows);
        }
        OutputFormat::Json => {
            let mut entries = Vec::with_capacity(paths.len());
            for path in &paths {
                let value = store.resolve(path)?.value();
                entries.push(serde_json::json!({
                    "path": path,
                    "type": value.map(Value::type_name),
                    "rank": value.map(|v| v.rank().code()),
                    "shape": value.map(|v| v.shape().as_array()),
                }));
            }
            println!("{}", serde_json::to_string(&entries)?);
        }
    }
    Ok(())
}

/// Print the value at a path
pub fn get(ctx: &Context, args: &PathArgs) -> CommandResult {
    let store = ctx.load(&args.file)?;
    let value = store.get_value(&args.path)?;

    match ctx.output {
        OutputFormat::Human => {
            for line in value_rows(value) {
                println!("{line}");
            }
        }
        OutputFormat::Json => {
            let entry = serde_json::json!({
                "path": args.path,
                "type": value.type_name(),
                "rank": value.rank().code(),
                "shape": value.shape().as_array(),
                "value": value_json(value),
            });
            println!("{}", serde_json::to_string(&entry)?);
        }
    }
    Ok(())
}

/// List distinct child names with how many nodes share each
pub fn children(ctx: &Context, args: &ChildrenArgs) -> CommandResult {
    let store = ctx.load(&args.file)?;
    let parent = args.path.trim_end_matches('/');

    let mut children = Vec::new();
    for index in 0..store.child_count(&args.path)? {
        let name = store.nth_child_name(&args.path, index)?;
        let count = store.sibling_count(format!("{parent}/{name}"));
        children.push((name, count));
    }

    match ctx.output {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = children
                .into_iter()
                .map(|(name, count)| vec![name, count.to_string()])
                .collect();
            print_table(&["NAME", "COUNT"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<_> = children
                .into_iter()
                .map(|(name, count)| serde_json::json!({ "name": name, "count": count }))
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }
    Ok(())
}
