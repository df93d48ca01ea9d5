//! Drives the C surface from Rust the way a C or Fortran caller would.

use std::{
    ffi::{c_char, c_void},
    ptr,
};

use tempfile::TempDir;

use opttree::{OptionStore, ffi::*};

/// Owns a store handle for the duration of a test.
struct Handle(*mut OptStore);

impl Handle {
    fn new() -> Self {
        let store = opt_store_new();
        assert!(!store.is_null());
        Handle(store)
    }

    fn ptr(&self) -> *const OptStore {
        self.0
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        unsafe { opt_store_free(self.0) };
    }
}

fn key(path: &str) -> (*const c_char, i32) {
    (path.as_ptr().cast(), path.len() as i32)
}

fn set_double(store: &Handle, path: &str, value: f64) -> OptStatus {
    let (k, k_len) = key(path);
    unsafe {
        opt_set_option(
            store.ptr(),
            k,
            k_len,
            (&value as *const f64).cast(),
            1,
            0,
            ptr::null(),
        )
    }
}

fn set_string(store: &Handle, path: &str, value: &str) -> OptStatus {
    let (k, k_len) = key(path);
    let len = value.len() as i32;
    unsafe {
        opt_set_option(
            store.ptr(),
            k,
            k_len,
            value.as_ptr().cast(),
            2,
            0,
            &len,
        )
    }
}

fn have(store: &Handle, path: &str) -> bool {
    let (k, k_len) = key(path);
    unsafe { opt_have_option(store.ptr(), k, k_len) == 1 }
}

#[test]
fn test_scalar_round_trip() {
    let store = Handle::new();
    assert_eq!(set_double(&store, "/simulation/timestep", 0.01), OptStatus::Ok);

    let (k, k_len) = key("/simulation/timestep");
    let mut type_code = -1;
    let mut rank = -1;
    let mut shape = [0i32; 2];
    unsafe {
        assert_eq!(opt_get_option_type(store.ptr(), k, k_len, &mut type_code), OptStatus::Ok);
        assert_eq!(opt_get_option_rank(store.ptr(), k, k_len, &mut rank), OptStatus::Ok);
        assert_eq!(
            opt_get_option_shape(store.ptr(), k, k_len, shape.as_mut_ptr()),
            OptStatus::Ok
        );
    }
    assert_eq!((type_code, rank, shape), (1, 0, [1, 1]));

    let mut value = 0.0f64;
    let mut full_len = 0;
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            1,
            0,
            (&mut value as *mut f64).cast(),
            1,
            &mut full_len,
        )
    };
    assert_eq!(status, OptStatus::Ok);
    assert_eq!(value, 0.01);
    assert_eq!(full_len, 1);
}

#[test]
fn test_integer_matrix_round_trip() {
    let store = Handle::new();
    let (k, k_len) = key("/mesh/cells");
    let data: [i32; 6] = [1, 2, 3, 4, 5, 6];
    let shape = [2, 3];

    let status = unsafe {
        opt_set_option(
            store.ptr(),
            k,
            k_len,
            data.as_ptr().cast(),
            0,
            2,
            shape.as_ptr(),
        )
    };
    assert_eq!(status, OptStatus::Ok);

    let mut out_shape = [0i32; 2];
    unsafe {
        assert_eq!(
            opt_get_option_shape(store.ptr(), k, k_len, out_shape.as_mut_ptr()),
            OptStatus::Ok
        );
    }
    assert_eq!(out_shape, [2, 3]);

    let mut out = [0i32; 6];
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            0,
            2,
            out.as_mut_ptr().cast(),
            6,
            ptr::null_mut(),
        )
    };
    assert_eq!(status, OptStatus::Ok);
    assert_eq!(out, data);
}

#[test]
fn test_get_with_wrong_type_or_rank() {
    let store = Handle::new();
    set_double(&store, "/dt", 0.5);
    let (k, k_len) = key("/dt");
    let mut out = [0i32; 4];
    let out_ptr: *mut c_void = out.as_mut_ptr().cast();

    unsafe {
        assert_eq!(
            opt_get_option(store.ptr(), k, k_len, 0, 0, out_ptr, 4, ptr::null_mut()),
            OptStatus::TypeError
        );
        assert_eq!(
            opt_get_option(store.ptr(), k, k_len, 1, 1, out_ptr, 4, ptr::null_mut()),
            OptStatus::RankError
        );
        assert_eq!(
            opt_get_option(store.ptr(), k, k_len, 7, 0, out_ptr, 4, ptr::null_mut()),
            OptStatus::TypeError
        );
        assert_eq!(
            opt_get_option(store.ptr(), k, k_len, 1, 3, out_ptr, 4, ptr::null_mut()),
            OptStatus::RankError
        );
    }
    assert_eq!(out, [0; 4]);
}

#[test]
fn test_short_numeric_buffer_is_refused() {
    let store = Handle::new();
    let (k, k_len) = key("/extents");
    let data = [10.0f64, 20.0, 5.0];
    let shape = [3];
    unsafe {
        assert_eq!(
            opt_set_option(store.ptr(), k, k_len, data.as_ptr().cast(), 1, 1, shape.as_ptr()),
            OptStatus::Ok
        );
    }

    let mut out = [0.0f64; 2];
    let mut full_len = 0;
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            1,
            1,
            out.as_mut_ptr().cast(),
            2,
            &mut full_len,
        )
    };
    assert_eq!(status, OptStatus::ShapeMismatch);
    assert_eq!(out, [0.0, 0.0]);
    assert_eq!(full_len, 3);
}

#[test]
fn test_string_values_and_truncation() {
    let store = Handle::new();
    assert_eq!(set_string(&store, "/phase/name", "water"), OptStatus::Ok);
    let (k, k_len) = key("/phase/name");

    let mut buf = [0 as c_char; 16];
    let mut full_len = 0;
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            2,
            0,
            buf.as_mut_ptr().cast(),
            16,
            &mut full_len,
        )
    };
    assert_eq!(status, OptStatus::Ok);
    assert_eq!(full_len, 5);
    assert_eq!(buf[..5].iter().map(|&c| c as u8).collect::<Vec<_>>(), b"water");

    let mut short = [0 as c_char; 3];
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            2,
            0,
            short.as_mut_ptr().cast(),
            3,
            ptr::null_mut(),
        )
    };
    assert_eq!(status, OptStatus::Truncated);
    assert_eq!(short.map(|c| c as u8), *b"wat");
}

#[test]
fn test_children_and_counts() {
    let store = Handle::new();
    for path in ["/phase[0]", "/phase[1]", "/mesh", "/phase[2]"] {
        let (k, k_len) = key(path);
        assert_eq!(unsafe { opt_add_option(store.ptr(), k, k_len) }, OptStatus::Ok);
    }

    let (root, root_len) = key("");
    let mut count = 0;
    assert_eq!(
        unsafe { opt_number_of_children(store.ptr(), root, root_len, &mut count) },
        OptStatus::Ok
    );
    assert_eq!(count, 2);

    let (k, k_len) = key("/phase");
    assert_eq!(unsafe { opt_option_count(store.ptr(), k, k_len) }, 3);
    let (k, k_len) = key("/nothing");
    assert_eq!(unsafe { opt_option_count(store.ptr(), k, k_len) }, 0);

    let mut name = [0 as c_char; 8];
    let status =
        unsafe { opt_get_child_name(store.ptr(), root, root_len, 1, name.as_mut_ptr(), 8) };
    assert_eq!(status, OptStatus::Ok);
    assert_eq!(name[..4].iter().map(|&c| c as u8).collect::<Vec<_>>(), b"mesh");

    let status =
        unsafe { opt_get_child_name(store.ptr(), root, root_len, 0, name.as_mut_ptr(), 2) };
    assert_eq!(status, OptStatus::Truncated);

    let status =
        unsafe { opt_get_child_name(store.ptr(), root, root_len, 2, name.as_mut_ptr(), 8) };
    assert_eq!(status, OptStatus::IndexOutOfRange);
}

#[test]
fn test_add_conflict_and_delete_shift() {
    let store = Handle::new();
    assert_eq!(set_double(&store, "/a[0]", 1.0), OptStatus::Ok);
    assert_eq!(set_double(&store, "/a[1]", 2.0), OptStatus::Ok);

    let (k, k_len) = key("/a[0]");
    assert_eq!(unsafe { opt_add_option(store.ptr(), k, k_len) }, OptStatus::AlreadyExists);
    let (far, far_len) = key("/a[5]");
    assert_eq!(
        unsafe { opt_add_option(store.ptr(), far, far_len) },
        OptStatus::IndexOutOfRange
    );

    assert_eq!(unsafe { opt_delete_option(store.ptr(), k, k_len) }, OptStatus::Ok);
    assert!(!have(&store, "/a[1]"));

    let mut value = 0.0f64;
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            1,
            0,
            (&mut value as *mut f64).cast(),
            1,
            ptr::null_mut(),
        )
    };
    assert_eq!(status, OptStatus::Ok);
    assert_eq!(value, 2.0);

    let (missing, missing_len) = key("/zzz");
    assert_eq!(
        unsafe { opt_delete_option(store.ptr(), missing, missing_len) },
        OptStatus::PathNotFound
    );
}

#[test]
fn test_attributes() {
    let store = Handle::new();
    let (k, k_len) = key("/mesh");
    unsafe { opt_add_option(store.ptr(), k, k_len) };

    let (name, name_len) = key("name");
    let (val, val_len) = key("CoordinateMesh");
    assert_eq!(
        unsafe { opt_set_option_attribute(store.ptr(), k, k_len, name, name_len, val, val_len) },
        OptStatus::Ok
    );

    let mut buf = [0 as c_char; 32];
    let status = unsafe {
        opt_get_option_attribute(store.ptr(), k, k_len, name, name_len, buf.as_mut_ptr(), 32)
    };
    assert_eq!(status, OptStatus::Ok);
    assert_eq!(
        buf[..14].iter().map(|&c| c as u8).collect::<Vec<_>>(),
        b"CoordinateMesh"
    );

    let (other, other_len) = key("units");
    let status = unsafe {
        opt_get_option_attribute(store.ptr(), k, k_len, other, other_len, buf.as_mut_ptr(), 32)
    };
    assert_eq!(status, OptStatus::PathNotFound);

    let (missing, missing_len) = key("/nope");
    assert_eq!(
        unsafe {
            opt_set_option_attribute(
                store.ptr(),
                missing,
                missing_len,
                name,
                name_len,
                val,
                val_len,
            )
        },
        OptStatus::PathNotFound
    );
}

#[test]
fn test_container_type_code() {
    let store = Handle::new();
    let (k, k_len) = key("/geometry");
    unsafe { opt_add_option(store.ptr(), k, k_len) };

    let mut type_code = -1;
    let mut rank = -1;
    unsafe {
        assert_eq!(opt_get_option_type(store.ptr(), k, k_len, &mut type_code), OptStatus::Ok);
        assert_eq!(opt_get_option_rank(store.ptr(), k, k_len, &mut rank), OptStatus::TypeError);
    }
    assert_eq!(type_code, OPT_TYPE_NONE);
    assert_eq!(rank, -1);
}

#[test]
fn test_invalid_arguments() {
    let store = Handle::new();
    let (k, k_len) = key("/x");

    unsafe {
        assert_eq!(opt_add_option(ptr::null(), k, k_len), OptStatus::InvalidArgument);
        assert_eq!(opt_add_option(store.ptr(), ptr::null(), 3), OptStatus::InvalidArgument);
        assert_eq!(opt_add_option(store.ptr(), k, -1), OptStatus::InvalidArgument);
        assert_eq!(
            opt_get_option_type(store.ptr(), k, k_len, ptr::null_mut()),
            OptStatus::PathNotFound
        );
        assert_eq!(opt_have_option(ptr::null(), k, k_len), 0);
        assert_eq!(opt_option_count(ptr::null(), k, k_len), 0);

        // Vector without a shape
        let data = [1.0f64];
        assert_eq!(
            opt_set_option(store.ptr(), k, k_len, data.as_ptr().cast(), 1, 1, ptr::null()),
            OptStatus::InvalidArgument
        );
        // Negative extent
        let shape = [-1];
        assert_eq!(
            opt_set_option(store.ptr(), k, k_len, data.as_ptr().cast(), 1, 1, shape.as_ptr()),
            OptStatus::ShapeMismatch
        );
        // Strings are rank 0 only
        let len = 1;
        assert_eq!(
            opt_set_option(store.ptr(), k, k_len, data.as_ptr().cast(), 2, 1, &len),
            OptStatus::RankError
        );
        assert_eq!(
            opt_set_option(store.ptr(), k, k_len, data.as_ptr().cast(), 9, 0, ptr::null()),
            OptStatus::TypeError
        );
    }
    assert!(!have(&store, "/x"));
}

#[test]
fn test_malformed_path_reports_not_found() {
    let store = Handle::new();
    let (k, k_len) = key("/a[oops]");
    assert_eq!(unsafe { opt_add_option(store.ptr(), k, k_len) }, OptStatus::PathNotFound);
    assert!(!have(&store, "/a[oops]"));
}

#[test]
fn test_write_and_load_files() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("run.xml");
    let file = file.to_str().unwrap();

    let store = Handle::new();
    set_double(&store, "/simulation/timestep", 0.25);
    set_string(&store, "/simulation/name", "lock_exchange");

    let (f, f_len) = key(file);
    assert_eq!(unsafe { opt_write_options(store.ptr(), f, f_len) }, OptStatus::Ok);

    let other = Handle::new();
    assert_eq!(unsafe { opt_load_options(other.ptr(), f, f_len) }, OptStatus::Ok);
    assert!(have(&other, "/simulation/timestep"));
    assert!(have(&other, "/simulation/name"));

    let missing = dir.path().join("missing.xml");
    let (m, m_len) = key(missing.to_str().unwrap());
    assert_eq!(unsafe { opt_load_options(other.ptr(), m, m_len) }, OptStatus::FileError);
    // A failed load keeps the current tree
    assert!(have(&other, "/simulation/timestep"));
}

#[test]
fn test_non_utf8_text_is_invalid() {
    let store = Handle::new();
    let bad: &[u8] = b"/caf\xe9";
    let (bad_ptr, bad_len) = (bad.as_ptr().cast::<c_char>(), bad.len() as i32);

    unsafe {
        assert_eq!(
            opt_add_option(store.ptr(), bad_ptr, bad_len),
            OptStatus::InvalidArgument
        );
        assert_eq!(opt_have_option(store.ptr(), bad_ptr, bad_len), 0);
    }

    let (k, k_len) = key("/mesh");
    unsafe { opt_add_option(store.ptr(), k, k_len) };
    let (val, val_len) = key("x");
    let status = unsafe {
        opt_set_option_attribute(store.ptr(), k, k_len, bad_ptr, bad_len, val, val_len)
    };
    assert_eq!(status, OptStatus::InvalidArgument);
    let status = unsafe {
        opt_set_option_attribute(store.ptr(), k, k_len, val, val_len, bad_ptr, bad_len)
    };
    assert_eq!(status, OptStatus::InvalidArgument);
    assert_eq!(unsafe { opt_option_count(store.ptr(), k, k_len) }, 1);
}

#[test]
fn test_wide_integer_does_not_fit_int32() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("wide.json");

    let mut tree = OptionStore::new();
    tree.set_option("/big", i64::from(i32::MAX) + 1).unwrap();
    tree.set_option("/fits", i64::from(i32::MIN)).unwrap();
    tree.write_options(&file).unwrap();

    let store = Handle::new();
    let (f, f_len) = key(file.to_str().unwrap());
    assert_eq!(unsafe { opt_load_options(store.ptr(), f, f_len) }, OptStatus::Ok);

    let (k, k_len) = key("/big");
    let mut out = [7i32; 1];
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            0,
            0,
            out.as_mut_ptr().cast(),
            1,
            ptr::null_mut(),
        )
    };
    assert_eq!(status, OptStatus::TypeError);
    assert_eq!(out, [7]);

    let (k, k_len) = key("/fits");
    let status = unsafe {
        opt_get_option(
            store.ptr(),
            k,
            k_len,
            0,
            0,
            out.as_mut_ptr().cast(),
            1,
            ptr::null_mut(),
        )
    };
    assert_eq!(status, OptStatus::Ok);
    assert_eq!(out, [i32::MIN]);
}
