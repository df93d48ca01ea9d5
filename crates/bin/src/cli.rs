//! CLI argument definitions for the Opttree binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use opttree::persistence::Format;

/// On-disk format of an options file
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FileFormat {
    /// Versioned JSON document
    Json,
    /// XML option file
    Xml,
}

impl From<FileFormat> for Format {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Json => Format::Json,
            FileFormat::Xml => Format::Xml,
        }
    }
}

/// Value type for the set command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ValueType {
    Integer,
    Double,
    String,
}

/// Inspect and edit option files
#[derive(Parser, Debug)]
#[command(name = "opttree")]
#[command(about = "Opttree: inspect and edit typed option trees")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// File format, overriding detection by extension
    #[arg(short, long, global = true, env = "OPTTREE_FORMAT")]
    pub format: Option<FileFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the whole tree
    Show(FileArgs),
    /// List every option path with its type, rank and shape
    List(FileArgs),
    /// Print the value at a path
    Get(PathArgs),
    /// List the distinct child names under a path
    Children(ChildrenArgs),
    /// Create a path as an empty container
    Add(PathArgs),
    /// Set the value at a path, creating it if needed
    Set(SetArgs),
    /// Read, set or remove an attribute
    Attr(AttrArgs),
    /// Delete a path and everything below it
    Delete(PathArgs),
    /// Rewrite an options file in another format
    Convert(ConvertArgs),
}

/// Arguments for commands that read a whole file
#[derive(clap::Args, Debug)]
pub struct FileArgs {
    /// Options file
    pub file: PathBuf,
}

/// Arguments for commands addressing one path
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Options file
    pub file: PathBuf,

    /// Option path, e.g. /simulation/phase[1]/density
    pub path: String,
}

/// Arguments for the children command
#[derive(clap::Args, Debug)]
pub struct ChildrenArgs {
    /// Options file
    pub file: PathBuf,

    /// Parent path (defaults to the root)
    #[arg(default_value = "/")]
    pub path: String,
}

/// Arguments for the set command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Options file
    pub file: PathBuf,

    /// Option path
    pub path: String,

    /// Elements in row-major order
    #[arg(required = true, allow_hyphen_values = true)]
    pub values: Vec<String>,

    /// Element type; inferred from the values when omitted
    #[arg(short = 't', long = "type")]
    pub value_type: Option<ValueType>,

    /// Store a single element as a vector instead of a scalar
    #[arg(long, conflicts_with = "cols")]
    pub vector: bool,

    /// Store the elements as a matrix with this many columns
    #[arg(long)]
    pub cols: Option<usize>,
}

/// Arguments for the attr command
#[derive(clap::Args, Debug)]
pub struct AttrArgs {
    /// Options file
    pub file: PathBuf,

    /// Option path
    pub path: String,

    /// Attribute name; all attributes are listed when omitted
    pub name: Option<String>,

    /// New attribute value
    #[arg(conflicts_with = "remove")]
    pub value: Option<String>,

    /// Remove the attribute
    #[arg(long, requires = "name")]
    pub remove: bool,
}

/// Arguments for the convert command
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Input options file
    pub input: PathBuf,

    /// Output file
    pub output: PathBuf,

    /// Output format, detected from the output extension when omitted
    #[arg(long)]
    pub to: Option<FileFormat>,
}
