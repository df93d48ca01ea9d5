//! Attribute command: list, read, set or remove node attributes.

use super::{CommandResult, Context};
use crate::{
    cli::AttrArgs,
    output::{OutputFormat, print_table},
};

/// Run the attr command
pub fn run(ctx: &Context, args: &AttrArgs) -> CommandResult {
    let mut store = ctx.load(&args.file)?;

    match (&args.name, &args.value) {
        (Some(name), _) if args.remove => {
            if store.remove_attribute(&args.path, name)?.is_none() {
                return Err(format!("{} has no attribute '{name}'", args.path).into());
            }
            ctx.save(&store, &args.file)?;
            ctx.report("Removed", &format!("{}@{name}", args.path))
        }
        (Some(name), Some(value)) => {
            store.set_attribute(&args.path, name.as_str(), value.as_str())?;
            ctx.save(&store, &args.file)?;
            ctx.report("Set", &format!("{}@{name}", args.path))
        }
        (Some(name), None) => {
            let value = store
                .attribute(&args.path, name)?
                .ok_or_else(|| format!("{} has no attribute '{name}'", args.path))?;
            match ctx.output {
                OutputFormat::Human => println!("{value}"),
                OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
            }
            Ok(())
        }
        (None, _) => {
            let attributes = store.attributes(&args.path)?;
            match ctx.output {
                OutputFormat::Human => {
                    let rows: Vec<Vec<String>> = attributes
                        .iter()
                        .map(|(k, v)| vec![k.clone(), v.clone()])
                        .collect();
                    print_table(&["NAME", "VALUE"], &rows);
                }
                OutputFormat::Json => println!("{}", serde_json::to_string(attributes)?),
            }
            Ok(())
        }
    }
}
