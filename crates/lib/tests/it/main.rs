/*! Integration tests for Opttree.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - store: Path resolution, typed access and structural edits on OptionStore
 * - persistence: JSON and XML round trips through files
 * - ffi: The flat C surface driven from Rust
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("opttree=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod ffi;
mod persistence;
mod store;
