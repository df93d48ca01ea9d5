//! Typed option values.
//!
//! Every value in an option tree has one element type (integer, double or
//! string) and one rank (scalar, vector or row-major matrix). [`Value`]
//! encodes both as a tagged variant so untyped buffers never reach the tree;
//! conversion from raw codes happens only at the C boundary.
//!
//! ```
//! use opttree::store::{Matrix, OptionType, Rank, Shape, Value};
//!
//! let extents = Value::from(vec![10.0, 20.0, 5.0]);
//! assert_eq!(extents.option_type(), OptionType::Double);
//! assert_eq!(extents.rank(), Rank::Vector);
//! assert_eq!(extents.shape(), Shape::new(3, 1));
//!
//! let grid = Matrix::from_rows(vec![vec![1i64, 2, 3], vec![4, 5, 6]])?;
//! assert_eq!(Value::from(grid).shape(), Shape::new(2, 3));
//! # Ok::<(), opttree::store::OptionError>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::OptionError;

/// Element type of an option value.
///
/// The discriminants are the type codes used at the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum OptionType {
    Integer = 0,
    Double = 1,
    String = 2,
}

impl OptionType {
    /// Integer code of this type.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Parses a type code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(OptionType::Integer),
            1 => Some(OptionType::Double),
            2 => Some(OptionType::String),
            _ => None,
        }
    }

    /// Returns the type name as a string
    pub fn name(self) -> &'static str {
        match self {
            OptionType::Integer => "integer",
            OptionType::Double => "double",
            OptionType::String => "string",
        }
    }
}

impl TryFrom<i32> for OptionType {
    type Error = OptionError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        OptionType::from_code(code).ok_or(OptionError::InvalidType { code })
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rank of an option value: 0 (scalar), 1 (vector) or 2 (matrix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum Rank {
    Scalar = 0,
    Vector = 1,
    Matrix = 2,
}

impl Rank {
    /// Integer code of this rank.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Parses a rank code. Ranks above 2 are not supported.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Rank::Scalar),
            1 => Some(Rank::Vector),
            2 => Some(Rank::Matrix),
            _ => None,
        }
    }
}

impl TryFrom<i32> for Rank {
    type Error = OptionError;

    fn try_from(rank: i32) -> Result<Self, Self::Error> {
        Rank::from_code(rank).ok_or(OptionError::InvalidRank { rank })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Shape of an option value as `[rows, cols]`.
///
/// `rows * cols` is always the element count: scalars are `[1, 1]`,
/// vectors are `[len, 1]`, matrices report their true shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of elements covered by this shape.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_array(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.rows, self.cols)
    }
}

/// A rectangular, row-major two-dimensional array.
///
/// Construction validates that the data is rectangular, so a `Matrix` can
/// never hold ragged rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix<T>")]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

#[derive(Deserialize)]
struct RawMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawMatrix<T>> for Matrix<T> {
    type Error = OptionError;

    fn try_from(raw: RawMatrix<T>) -> Result<Self, Self::Error> {
        Matrix::new(raw.rows, raw.cols, raw.data)
    }
}

impl<T> Matrix<T> {
    /// Creates a matrix from flat row-major data.
    ///
    /// # Errors
    /// Returns [`OptionError::ShapeMismatch`] if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, OptionError> {
        let expected = rows.checked_mul(cols).ok_or_else(|| OptionError::ShapeMismatch {
            reason: format!("shape [{rows}, {cols}] overflows"),
        })?;
        if data.len() != expected {
            return Err(OptionError::ShapeMismatch {
                reason: format!(
                    "shape [{rows}, {cols}] needs {expected} elements, got {}",
                    data.len()
                ),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a matrix from a list of rows.
    ///
    /// # Errors
    /// Returns [`OptionError::ShapeMismatch`] if the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, OptionError> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(OptionError::ShapeMismatch {
                reason: format!(
                    "row {i} has {} elements, expected {cols} (matrix must be rectangular)",
                    row.len()
                ),
            });
        }
        let data = rows.into_iter().flatten().collect();
        Ok(Self {
            rows: row_count,
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    /// Element at `(row, col)`, or `None` outside the shape.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col)
    }

    /// The `i`-th row, or `None` outside the shape.
    pub fn row(&self, i: usize) -> Option<&[T]> {
        if i >= self.rows {
            return None;
        }
        Some(&self.data[i * self.cols..(i + 1) * self.cols])
    }

    /// Iterates over rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        (0..self.rows).map(move |i| &self.data[i * self.cols..(i + 1) * self.cols])
    }

    /// Flat row-major view of the elements.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

impl<T: Clone> Matrix<T> {
    /// Copies the matrix into a list of rows.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.iter_rows().map(<[T]>::to_vec).collect()
    }
}

/// A payload of element type `T` at one of the three supported ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shaped<T> {
    Scalar(T),
    Vector(Vec<T>),
    Matrix(Matrix<T>),
}

impl<T> Shaped<T> {
    pub fn rank(&self) -> Rank {
        match self {
            Shaped::Scalar(_) => Rank::Scalar,
            Shaped::Vector(_) => Rank::Vector,
            Shaped::Matrix(_) => Rank::Matrix,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Shaped::Scalar(_) => Shape::new(1, 1),
            Shaped::Vector(v) => Shape::new(v.len(), 1),
            Shaped::Matrix(m) => m.shape(),
        }
    }

    /// Flat row-major view of the elements, whatever the rank.
    pub fn elements(&self) -> &[T] {
        match self {
            Shaped::Scalar(v) => std::slice::from_ref(v),
            Shaped::Vector(v) => v,
            Shaped::Matrix(m) => m.as_slice(),
        }
    }

    /// Builds a payload of the given rank from flat row-major elements.
    ///
    /// A scalar takes exactly one element; a vector takes `shape.rows`
    /// elements; a matrix takes `shape.rows * shape.cols`.
    pub fn from_elements(rank: Rank, shape: Shape, mut data: Vec<T>) -> Result<Self, OptionError> {
        match rank {
            Rank::Scalar => match (data.pop(), data.is_empty()) {
                (Some(v), true) => Ok(Shaped::Scalar(v)),
                _ => Err(OptionError::ShapeMismatch {
                    reason: "scalar needs exactly one element".to_string(),
                }),
            },
            Rank::Vector => {
                if data.len() != shape.rows {
                    return Err(OptionError::ShapeMismatch {
                        reason: format!(
                            "vector of length {} given {} elements",
                            shape.rows,
                            data.len()
                        ),
                    });
                }
                Ok(Shaped::Vector(data))
            }
            Rank::Matrix => Ok(Shaped::Matrix(Matrix::new(shape.rows, shape.cols, data)?)),
        }
    }
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Integer(Shaped<i64>),
    Double(Shaped<f64>),
    String(Shaped<String>),
}

impl Value {
    pub fn option_type(&self) -> OptionType {
        match self {
            Value::Integer(_) => OptionType::Integer,
            Value::Double(_) => OptionType::Double,
            Value::String(_) => OptionType::String,
        }
    }

    pub fn rank(&self) -> Rank {
        match self {
            Value::Integer(v) => v.rank(),
            Value::Double(v) => v.rank(),
            Value::String(v) => v.rank(),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Integer(v) => v.shape(),
            Value::Double(v) => v.shape(),
            Value::String(v) => v.shape(),
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.option_type().name()
    }

    pub fn as_integer(&self) -> Option<&Shaped<i64>> {
        match self {
            Value::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<&Shaped<f64>> {
        match self {
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&Shaped<String>> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_shaped<T: fmt::Debug>(f: &mut fmt::Formatter<'_>, v: &Shaped<T>) -> fmt::Result {
            match v {
                Shaped::Scalar(x) => write!(f, "{x:?}"),
                Shaped::Vector(xs) => write!(f, "{xs:?}"),
                Shaped::Matrix(m) => {
                    let rows: Vec<&[T]> = m.iter_rows().collect();
                    write!(f, "{rows:?}")
                }
            }
        }

        match self {
            Value::Integer(v) => write_shaped(f, v),
            Value::Double(v) => write_shaped(f, v),
            Value::String(v) => write_shaped(f, v),
        }
    }
}

/// Rust types that can be read out of an option value.
///
/// Each implementor names the element type and rank it expects; the store
/// checks both before calling [`OptionValue::from_value`], so a read never
/// coerces between types or ranks.
pub trait OptionValue: Sized {
    const TYPE: OptionType;
    const RANK: Rank;

    /// Extracts `Self` from a value of matching type and rank.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_option_value {
    ($variant:ident, $elem:ty) => {
        impl OptionValue for $elem {
            const TYPE: OptionType = OptionType::$variant;
            const RANK: Rank = Rank::Scalar;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(Shaped::Scalar(v)) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl OptionValue for Vec<$elem> {
            const TYPE: OptionType = OptionType::$variant;
            const RANK: Rank = Rank::Vector;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(Shaped::Vector(v)) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl OptionValue for Matrix<$elem> {
            const TYPE: OptionType = OptionType::$variant;
            const RANK: Rank = Rank::Matrix;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(Shaped::Matrix(m)) => Some(m.clone()),
                    _ => None,
                }
            }
        }

        impl From<$elem> for Value {
            fn from(v: $elem) -> Self {
                Value::$variant(Shaped::Scalar(v))
            }
        }

        impl From<Vec<$elem>> for Value {
            fn from(v: Vec<$elem>) -> Self {
                Value::$variant(Shaped::Vector(v))
            }
        }

        impl From<Matrix<$elem>> for Value {
            fn from(m: Matrix<$elem>) -> Self {
                Value::$variant(Shaped::Matrix(m))
            }
        }
    };
}

impl_option_value!(Integer, i64);
impl_option_value!(Double, f64);
impl_option_value!(String, String);

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(Shaped::Scalar(i64::from(v)))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Shaped::Scalar(v.to_string()))
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::String(Shaped::Vector(v.into_iter().map(str::to_string).collect()))
    }
}
