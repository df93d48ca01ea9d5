//! Convert command - rewrites an options file in another format.

use opttree::persistence::{self, Format};

use super::{CommandResult, Context};
use crate::cli::ConvertArgs;

/// Run the convert command
pub fn run(ctx: &Context, args: &ConvertArgs) -> CommandResult {
    let store = ctx.load(&args.input)?;
    let format = args
        .to
        .map(Format::from)
        .unwrap_or_else(|| Format::from_path(&args.output));
    persistence::store_as(&store, &args.output, format)?;
    ctx.report("Converted", &args.output.display().to_string())
}
