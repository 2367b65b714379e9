/*
 * scss-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Runtime abstraction layer for stylesheet loading.
 *
 * This crate provides a trait-based abstraction for the filesystem reads the
 * import resolver performs, plus the boundary to the grass compiler core:
 *
 * - NativeRuntime: reads from the host filesystem
 * - MemoryRuntime: reads from an in-memory virtual filesystem
 * - compile_scss: hands an expanded SCSS buffer to grass
 */

mod memory;
mod native;
mod sass_native;
mod traits;

// Re-export core types (API surface)
pub use traits::{PathKind, RuntimeError, RuntimeResult, SharedRuntime, SystemRuntime};

// Re-export runtime implementations
pub use memory::{MemoryRuntime, VirtualFileSystem};
pub use native::NativeRuntime;

pub use sass_native::{CORE_INPUT_NAME, RuntimeFs, compile_scss};

/// Create a default runtime for the current platform.
pub fn default_runtime() -> NativeRuntime {
    NativeRuntime::new()
}
