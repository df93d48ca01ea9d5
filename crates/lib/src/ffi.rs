//! Flat C surface over the option store.
//!
//! Every call takes an opaque [`OptStore`] handle and a path given as a
//! `(pointer, length)` pair; paths need no NUL terminator. Types and ranks
//! are integer codes (`0` integer, `1` double, `2` string; rank `0..=2`) and
//! most calls return an [`OptStatus`]. Outputs are only valid when the
//! status is [`OptStatus::Ok`] (or [`OptStatus::Truncated`] for text).
//!
//! Integers cross the boundary as `int32_t`. Numeric arrays are flat
//! row-major buffers; a rank-2 shape is `[rows, cols]`. Strings cross as
//! byte buffers without a terminator and only at rank 0.
//!
//! No call writes past a caller-declared capacity: text is cut to fit and
//! reported as `Truncated`, numeric buffers that are too small are left
//! untouched and reported as `ShapeMismatch`. A panic never crosses the
//! boundary; it is reported as `Internal`.
//!
//! ```c
//! OptStore *store = opt_store_new();
//! double dt = 0.01;
//! opt_set_option(store, "/timestep", 9, &dt, 1, 0, NULL);
//! int32_t type;
//! opt_get_option_type(store, "/timestep", 9, &type); /* type == 1 */
//! opt_store_free(store);
//! ```

use std::{
    ffi::{c_char, c_void},
    panic::{AssertUnwindSafe, catch_unwind},
    ptr,
};

use crate::store::{
    OptionError, OptionStore, OptionType, Rank, Shape, Shaped, SharedOptionStore, Value,
};

/// Type code reported for a node that carries no value.
pub const OPT_TYPE_NONE: i32 = 3;

/// Status codes returned by the C surface.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptStatus {
    /// Success
    Ok = 0,
    /// Path does not resolve, or is malformed
    PathNotFound = 1,
    /// Type differs from the stored one, the node has no value, or an
    /// integer does not fit in 32 bits
    TypeError = 2,
    /// Rank differs from the stored one or is unsupported
    RankError = 3,
    /// Payload disagrees with its shape, or an output buffer is too small
    ShapeMismatch = 4,
    /// Positional index exceeds the available count
    IndexOutOfRange = 5,
    /// Node already carries a value
    AlreadyExists = 6,
    /// Reading or writing an options file failed
    FileError = 7,
    /// Text was written but cut to the buffer length
    Truncated = 8,
    /// Null pointer, negative length, or text that is not UTF-8
    InvalidArgument = 9,
    /// Internal error (panic, unexpected state)
    Internal = 10,
}

impl From<OptionError> for OptStatus {
    fn from(err: OptionError) -> Self {
        use crate::store::ErrorKind;
        match err.kind() {
            ErrorKind::PathNotFound => OptStatus::PathNotFound,
            ErrorKind::TypeError => OptStatus::TypeError,
            ErrorKind::RankError => OptStatus::RankError,
            ErrorKind::ShapeMismatch => OptStatus::ShapeMismatch,
            ErrorKind::IndexOutOfRange => OptStatus::IndexOutOfRange,
            ErrorKind::AlreadyExists => OptStatus::AlreadyExists,
        }
    }
}

impl From<crate::Error> for OptStatus {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::Option(option_err) => option_err.into(),
            crate::Error::Persistence(_) => OptStatus::FileError,
        }
    }
}

/// Opaque handle to one option tree.
///
/// Handles may be used from several threads; calls on one handle are
/// serialized by a lock around the whole tree.
pub struct OptStore {
    shared: SharedOptionStore,
}

type CallResult = Result<(), OptStatus>;

/// Runs `f`, turning its outcome into a status and containing any panic.
fn guard(call: &'static str, f: impl FnOnce() -> CallResult) -> OptStatus {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => OptStatus::Ok,
        Ok(Err(status)) => {
            tracing::trace!(call, ?status, "C call failed");
            status
        }
        Err(_) => {
            tracing::warn!(call, "Panic caught at the C boundary");
            OptStatus::Internal
        }
    }
}

unsafe fn handle<'a>(store: *const OptStore) -> Result<&'a OptStore, OptStatus> {
    unsafe { store.as_ref() }.ok_or(OptStatus::InvalidArgument)
}

fn capacity(len: i32) -> Result<usize, OptStatus> {
    usize::try_from(len).map_err(|_| OptStatus::InvalidArgument)
}

unsafe fn bytes<'a>(data: *const c_char, len: i32) -> Result<&'a [u8], OptStatus> {
    let len = capacity(len)?;
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(OptStatus::InvalidArgument);
    }
    Ok(unsafe { std::slice::from_raw_parts(data.cast::<u8>(), len) })
}

unsafe fn text<'a>(data: *const c_char, len: i32) -> Result<&'a str, OptStatus> {
    let raw = unsafe { bytes(data, len) }?;
    std::str::from_utf8(raw).map_err(|_| OptStatus::InvalidArgument)
}

unsafe fn write_i32(out: *mut i32, value: usize) -> CallResult {
    if out.is_null() {
        return Err(OptStatus::InvalidArgument);
    }
    let value = i32::try_from(value).map_err(|_| OptStatus::Internal)?;
    unsafe { out.write(value) };
    Ok(())
}

/// Copies as much of `source` as fits; `Truncated` if it did not all fit.
unsafe fn write_text(source: &str, buf: *mut c_char, buf_len: i32) -> CallResult {
    let cap = capacity(buf_len)?;
    let n = source.len().min(cap);
    if n > 0 {
        if buf.is_null() {
            return Err(OptStatus::InvalidArgument);
        }
        unsafe { ptr::copy_nonoverlapping(source.as_ptr(), buf.cast::<u8>(), n) };
    }
    if n < source.len() {
        Err(OptStatus::Truncated)
    } else {
        Ok(())
    }
}

/// Copies all of `source`, or nothing if the buffer is too small.
unsafe fn write_numbers<T: Copy>(source: &[T], buf: *mut c_void, buf_len: i32) -> CallResult {
    if source.len() > capacity(buf_len)? {
        return Err(OptStatus::ShapeMismatch);
    }
    if source.is_empty() {
        return Ok(());
    }
    if buf.is_null() {
        return Err(OptStatus::InvalidArgument);
    }
    unsafe { ptr::copy_nonoverlapping(source.as_ptr(), buf.cast::<T>(), source.len()) };
    Ok(())
}

unsafe fn read_numbers<T: Copy>(data: *const c_void, len: usize) -> Result<Vec<T>, OptStatus> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if data.is_null() {
        return Err(OptStatus::InvalidArgument);
    }
    Ok(unsafe { std::slice::from_raw_parts(data.cast::<T>(), len) }.to_vec())
}

fn dimension(value: i32) -> Result<usize, OptStatus> {
    usize::try_from(value).map_err(|_| OptStatus::ShapeMismatch)
}

/// Reads the shape a caller declared for a value of rank `rank`.
unsafe fn read_shape(shape: *const i32, rank: Rank) -> Result<Shape, OptStatus> {
    if rank == Rank::Scalar {
        return Ok(Shape::new(1, 1));
    }
    if shape.is_null() {
        return Err(OptStatus::InvalidArgument);
    }
    let dims = unsafe { std::slice::from_raw_parts(shape, rank.code() as usize) };
    let shape = match *dims {
        [rows] => Shape::new(dimension(rows)?, 1),
        [rows, cols] => Shape::new(dimension(rows)?, dimension(cols)?),
        _ => return Err(OptStatus::RankError),
    };
    shape
        .rows
        .checked_mul(shape.cols)
        .ok_or(OptStatus::ShapeMismatch)?;
    Ok(shape)
}

fn narrow(values: &[i64]) -> Result<Vec<i32>, OptStatus> {
    values
        .iter()
        .map(|&v| i32::try_from(v).map_err(|_| OptStatus::TypeError))
        .collect()
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Create an empty option tree whose root is named `options`.
///
/// Returns null only if allocation panicked. Free with [`opt_store_free`].
#[unsafe(no_mangle)]
pub extern "C" fn opt_store_new() -> *mut OptStore {
    let result = catch_unwind(|| {
        Box::into_raw(Box::new(OptStore {
            shared: SharedOptionStore::default(),
        }))
    });

    result.unwrap_or(ptr::null_mut())
}

/// Free a tree created by [`opt_store_new`]. Null is ignored.
///
/// # Safety
/// `store` must be null or a handle from [`opt_store_new`] that has not been
/// freed, and no other thread may be using it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_store_free(store: *mut OptStore) {
    if !store.is_null() {
        drop(unsafe { Box::from_raw(store) });
    }
}

// ============================================================================
// Files
// ============================================================================

/// Replace the tree with the contents of an options file.
///
/// The format follows the extension (`.json` is JSON, anything else XML).
/// On failure the tree is left unchanged.
///
/// # Safety
/// `store` must be a live handle and `path` must point to `path_len`
/// readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_load_options(
    store: *const OptStore,
    path: *const c_char,
    path_len: i32,
) -> OptStatus {
    guard("opt_load_options", || {
        let store = unsafe { handle(store) }?;
        let path = unsafe { text(path, path_len) }?;
        let tree = OptionStore::load_options(path)?;
        store.shared.replace(tree);
        Ok(())
    })
}

/// Write the tree to an options file, choosing the format by extension.
///
/// # Safety
/// `store` must be a live handle and `path` must point to `path_len`
/// readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_write_options(
    store: *const OptStore,
    path: *const c_char,
    path_len: i32,
) -> OptStatus {
    guard("opt_write_options", || {
        let store = unsafe { handle(store) }?;
        let path = unsafe { text(path, path_len) }?;
        store.shared.read(|tree| tree.write_options(path))?;
        Ok(())
    })
}

// ============================================================================
// Structure queries
// ============================================================================

/// Write the name of the `index`-th distinct child of `key` into `name`.
///
/// At most `name_len` bytes are written and no terminator is added.
/// Returns `Truncated` if the name was longer than the buffer.
///
/// # Safety
/// `store` must be a live handle, `key` must point to `key_len` readable
/// bytes and `name` to `name_len` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_get_child_name(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    index: i32,
    name: *mut c_char,
    name_len: i32,
) -> OptStatus {
    guard("opt_get_child_name", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let index = usize::try_from(index).map_err(|_| OptStatus::IndexOutOfRange)?;
        let child = store.shared.read(|tree| tree.nth_child_name(key, index))?;
        unsafe { write_text(&child, name, name_len) }
    })
}

/// Store the number of distinct child names of `key` in `count`.
///
/// # Safety
/// `store` must be a live handle, `key` must point to `key_len` readable
/// bytes and `count` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_number_of_children(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    count: *mut i32,
) -> OptStatus {
    guard("opt_number_of_children", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let n = store.shared.read(|tree| tree.child_count(key))?;
        unsafe { write_i32(count, n) }
    })
}

/// Number of nodes sharing the final name of `key` under its parent.
///
/// Returns 0 if nothing matches or the arguments are invalid.
///
/// # Safety
/// `store` must be a live handle and `key` must point to `key_len` readable
/// bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_option_count(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
) -> i32 {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { handle(store) }.ok()?;
        let key = unsafe { text(key, key_len) }.ok()?;
        let n = store.shared.read(|tree| tree.sibling_count(key));
        i32::try_from(n).ok()
    }));

    result.unwrap_or(None).unwrap_or(0)
}

/// 1 if `key` names an existing node, 0 otherwise.
///
/// # Safety
/// `store` must be a live handle and `key` must point to `key_len` readable
/// bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_have_option(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
) -> i32 {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let store = unsafe { handle(store) }.ok()?;
        let key = unsafe { text(key, key_len) }.ok()?;
        Some(store.shared.read(|tree| tree.have_option(key)))
    }));

    match result {
        Ok(Some(true)) => 1,
        _ => 0,
    }
}

// ============================================================================
// Value metadata
// ============================================================================

/// Store the type code of `key` in `type_code`; [`OPT_TYPE_NONE`] for a
/// node without a value.
///
/// # Safety
/// `store` must be a live handle, `key` must point to `key_len` readable
/// bytes and `type_code` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_get_option_type(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    type_code: *mut i32,
) -> OptStatus {
    guard("opt_get_option_type", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let option_type = store.shared.read(|tree| tree.get_type(key))?;
        if type_code.is_null() {
            return Err(OptStatus::InvalidArgument);
        }
        let code = option_type.map_or(OPT_TYPE_NONE, OptionType::code);
        unsafe { type_code.write(code) };
        Ok(())
    })
}

/// Store the rank of the value at `key` in `rank`.
///
/// # Safety
/// `store` must be a live handle, `key` must point to `key_len` readable
/// bytes and `rank` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_get_option_rank(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    rank: *mut i32,
) -> OptStatus {
    guard("opt_get_option_rank", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let value = store.shared.read(|tree| tree.get_rank(key))?;
        unsafe { write_i32(rank, value.code() as usize) }
    })
}

/// Store the `[rows, cols]` shape of the value at `key` in `shape[0..2]`.
///
/// # Safety
/// `store` must be a live handle, `key` must point to `key_len` readable
/// bytes and `shape` must point to two writable `int32_t`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_get_option_shape(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    shape: *mut i32,
) -> OptStatus {
    guard("opt_get_option_shape", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let value = store.shared.read(|tree| tree.get_shape(key))?;
        if shape.is_null() {
            return Err(OptStatus::InvalidArgument);
        }
        let rows = i32::try_from(value.rows).map_err(|_| OptStatus::Internal)?;
        let cols = i32::try_from(value.cols).map_err(|_| OptStatus::Internal)?;
        unsafe {
            shape.write(rows);
            shape.add(1).write(cols);
        }
        Ok(())
    })
}

// ============================================================================
// Values
// ============================================================================

/// Copy the value at `key` into `val`.
///
/// The caller declares the expected `type_code` and `rank`; a mismatch
/// fails with `TypeError` or `RankError`. `val_len` is the capacity of
/// `val` in elements (`int32_t` or `double`) or, for strings, in bytes.
/// If `full_len` is not null it receives the element or byte count of the
/// stored value, even when the buffer turns out to be too small.
///
/// # Safety
/// `store` must be a live handle, `key` must point to `key_len` readable
/// bytes, `val` must point to `val_len` writable elements of the declared
/// type and `full_len` must be null or writable.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn opt_get_option(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    type_code: i32,
    rank: i32,
    val: *mut c_void,
    val_len: i32,
    full_len: *mut i32,
) -> OptStatus {
    guard("opt_get_option", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let expected_type = OptionType::try_from(type_code)?;
        let expected_rank = Rank::try_from(rank)?;

        store.shared.read(|tree| {
            let value = tree.get_value(key)?;
            if value.option_type() != expected_type {
                return Err(OptStatus::TypeError);
            }
            if value.rank() != expected_rank {
                return Err(OptStatus::RankError);
            }

            let len = match value {
                Value::String(Shaped::Scalar(s)) => s.len(),
                Value::String(_) => return Err(OptStatus::RankError),
                _ => value.shape().len(),
            };
            if !full_len.is_null() {
                unsafe { write_i32(full_len, len) }?;
            }

            match value {
                Value::Integer(shaped) => unsafe {
                    write_numbers(&narrow(shaped.elements())?, val, val_len)
                },
                Value::Double(shaped) => unsafe { write_numbers(shaped.elements(), val, val_len) },
                Value::String(shaped) => {
                    let s = shaped.elements().first().map_or("", String::as_str);
                    unsafe { write_text(s, val.cast::<c_char>(), val_len) }
                }
            }
        })
    })
}

/// Create `key` and any missing parents as empty containers.
///
/// Succeeds if `key` already exists without a value.
///
/// # Safety
/// `store` must be a live handle and `key` must point to `key_len` readable
/// bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_add_option(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
) -> OptStatus {
    guard("opt_add_option", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        store.shared.write(|tree| tree.add_node(key))?;
        Ok(())
    })
}

/// Set the value at `key`, creating the node and its parents if needed.
///
/// `shape` gives `[len]` for rank 1 and `[rows, cols]` for rank 2 and may
/// be null for numeric scalars. Strings are rank 0 only, with `shape[0]`
/// holding the byte length.
///
/// # Safety
/// `store` must be a live handle, `key` must point to `key_len` readable
/// bytes, `shape` must point to as many `int32_t`s as described above, and
/// `val` must point to as many elements as the shape declares.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_set_option(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    val: *const c_void,
    type_code: i32,
    rank: i32,
    shape: *const i32,
) -> OptStatus {
    guard("opt_set_option", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let option_type = OptionType::try_from(type_code)?;
        let rank = Rank::try_from(rank)?;

        let value = match option_type {
            OptionType::Integer => {
                let shape = unsafe { read_shape(shape, rank) }?;
                let data = unsafe { read_numbers::<i32>(val, shape.len()) }?;
                let data = data.into_iter().map(i64::from).collect();
                Value::Integer(Shaped::from_elements(rank, shape, data)?)
            }
            OptionType::Double => {
                let shape = unsafe { read_shape(shape, rank) }?;
                let data = unsafe { read_numbers::<f64>(val, shape.len()) }?;
                Value::Double(Shaped::from_elements(rank, shape, data)?)
            }
            OptionType::String => {
                if rank != Rank::Scalar {
                    return Err(OptStatus::RankError);
                }
                if shape.is_null() {
                    return Err(OptStatus::InvalidArgument);
                }
                let len = unsafe { shape.read() };
                let s = unsafe { text(val.cast::<c_char>(), len) }?;
                Value::from(s)
            }
        };

        store.shared.write(|tree| tree.set_option(key, value))?;
        Ok(())
    })
}

/// Delete `key` and its subtree. Later same-named siblings move down one
/// index.
///
/// # Safety
/// `store` must be a live handle and `key` must point to `key_len` readable
/// bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn opt_delete_option(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
) -> OptStatus {
    guard("opt_delete_option", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        store.shared.write(|tree| tree.delete_node(key))?;
        Ok(())
    })
}

// ============================================================================
// Attributes
// ============================================================================

/// Set attribute `name` of `key` to `val`.
///
/// # Safety
/// `store` must be a live handle and each of `key`, `name` and `val` must
/// point to as many readable bytes as its length argument.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn opt_set_option_attribute(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    name: *const c_char,
    name_len: i32,
    val: *const c_char,
    val_len: i32,
) -> OptStatus {
    guard("opt_set_option_attribute", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let name = unsafe { text(name, name_len) }?;
        let val = unsafe { text(val, val_len) }?;
        if name.is_empty() {
            return Err(OptStatus::InvalidArgument);
        }
        store.shared.write(|tree| tree.set_attribute(key, name, val))?;
        Ok(())
    })
}

/// Copy attribute `name` of `key` into `val`.
///
/// Fails with `PathNotFound` if the node or the attribute is missing and
/// returns `Truncated` if the value was longer than `val_len` bytes.
///
/// # Safety
/// `store` must be a live handle, `key` and `name` must point to as many
/// readable bytes as their lengths, and `val` to `val_len` writable bytes.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn opt_get_option_attribute(
    store: *const OptStore,
    key: *const c_char,
    key_len: i32,
    name: *const c_char,
    name_len: i32,
    val: *mut c_char,
    val_len: i32,
) -> OptStatus {
    guard("opt_get_option_attribute", || {
        let store = unsafe { handle(store) }?;
        let key = unsafe { text(key, key_len) }?;
        let name = unsafe { text(name, name_len) }?;
        store.shared.read(|tree| match tree.attribute(key, name)? {
            Some(value) => unsafe { write_text(value, val, val_len) },
            None => Err(OptStatus::PathNotFound),
        })
    })
}
