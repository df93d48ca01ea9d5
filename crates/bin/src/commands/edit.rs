//! Commands that change the tree structure or values: add, set, delete.

use std::str::FromStr;

use opttree::store::{Rank, Shape, Shaped, Value};

use super::{CommandResult, Context};
use crate::cli::{PathArgs, SetArgs, ValueType};

/// Create a container node. A missing file is created.
pub fn add(ctx: &Context, args: &PathArgs) -> CommandResult {
    let mut store = ctx.load_or_new(&args.file)?;
    store.add_node(&args.path)?;
    ctx.save(&store, &args.file)?;
    ctx.report("Added", &args.path)
}

/// Delete a node and its subtree
pub fn delete(ctx: &Context, args: &PathArgs) -> CommandResult {
    let mut store = ctx.load(&args.file)?;
    let removed = store.delete_node(&args.path)?;
    tracing::debug!(
        path = %args.path,
        nodes = removed.subtree_len(),
        "Deleted subtree"
    );
    ctx.save(&store, &args.file)?;
    ctx.report("Deleted", &args.path)
}

/// Set a value, creating the node (and the file) if needed
pub fn set(ctx: &Context, args: &SetArgs) -> CommandResult {
    let value = build_value(args)?;
    let mut store = ctx.load_or_new(&args.file)?;
    store.set_option(&args.path, value)?;
    ctx.save(&store, &args.file)?;
    ctx.report("Set", &args.path)
}

fn parse_all<T: FromStr>(values: &[String], what: &str) -> Result<Vec<T>, String> {
    values
        .iter()
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| format!("'{v}' is not a valid {what}"))
        })
        .collect()
}

/// Integer if every element parses as one, else double, else string.
fn infer_type(values: &[String]) -> ValueType {
    if values.iter().all(|v| v.parse::<i64>().is_ok()) {
        ValueType::Integer
    } else if values.iter().all(|v| v.parse::<f64>().is_ok()) {
        ValueType::Double
    } else {
        ValueType::String
    }
}

fn build_value(args: &SetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let len = args.values.len();
    let (rank, shape) = match args.cols {
        Some(0) => return Err("--cols must be at least 1".into()),
        Some(cols) => (Rank::Matrix, Shape::new(len / cols, cols)),
        None if args.vector || len != 1 => (Rank::Vector, Shape::new(len, 1)),
        None => (Rank::Scalar, Shape::new(1, 1)),
    };

    let value_type = args.value_type.unwrap_or_else(|| infer_type(&args.values));
    let value = match value_type {
        ValueType::Integer => {
            let data = parse_all::<i64>(&args.values, "integer")?;
            Value::Integer(Shaped::from_elements(rank, shape, data)?)
        }
        ValueType::Double => {
            let data = parse_all::<f64>(&args.values, "double")?;
            Value::Double(Shaped::from_elements(rank, shape, data)?)
        }
        ValueType::String => {
            Value::String(Shaped::from_elements(rank, shape, args.values.clone())?)
        }
    };
    Ok(value)
}
