//! Command implementations. Each command loads the file, acts on the tree
//! and, for edits, writes it back in the same format.

use std::path::Path;

use opttree::{
    OptionStore,
    persistence::{self, Format},
};

use crate::{
    cli::{Cli, Commands},
    output::OutputFormat,
};

mod attr;
mod convert;
mod edit;
mod inspect;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Settings shared by every command
pub struct Context {
    pub output: OutputFormat,
    pub file_format: Option<Format>,
}

impl Context {
    pub fn load(&self, path: &Path) -> opttree::Result<OptionStore> {
        match self.file_format {
            Some(format) => persistence::load_as(path, format),
            None => persistence::load(path),
        }
    }

    /// Loads `path`, or starts an empty tree if the file does not exist yet.
    pub fn load_or_new(&self, path: &Path) -> opttree::Result<OptionStore> {
        if path.exists() {
            return self.load(path);
        }
        tracing::info!(path = %path.display(), "Starting a new options file");
        Ok(OptionStore::new())
    }

    pub fn save(&self, store: &OptionStore, path: &Path) -> opttree::Result<()> {
        match self.file_format {
            Some(format) => persistence::store_as(store, path, format),
            None => persistence::store(store, path),
        }
    }

    /// Reports a completed edit.
    pub fn report(&self, action: &str, path: &str) -> CommandResult {
        match self.output {
            OutputFormat::Human => println!("{action} {path}"),
            OutputFormat::Json => {
                let value = serde_json::json!({ "action": action.to_lowercase(), "path": path });
                println!("{}", serde_json::to_string(&value)?);
            }
        }
        Ok(())
    }
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> CommandResult {
    let ctx = Context {
        output: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        file_format: cli.format.map(Format::from),
    };

    match cli.command {
        Commands::Show(args) => inspect::show(&ctx, &args),
        Commands::List(args) => inspect::list(&ctx, &args),
        Commands::Get(args) => inspect::get(&ctx, &args),
        Commands::Children(args) => inspect::children(&ctx, &args),
        Commands::Add(args) => edit::add(&ctx, &args),
        Commands::Set(args) => edit::set(&ctx, &args),
        Commands::Delete(args) => edit::delete(&ctx, &args),
        Commands::Attr(args) => attr::run(&ctx, &args),
        Commands::Convert(args) => convert::run(&ctx, &args),
    }
}
