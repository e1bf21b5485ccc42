#[cfg(target_os = "macos")]
mod backend;
#[cfg(target_os = "macos")]
mod common;

#[cfg(target_os = "macos")]
pub use crate::macos::backend::MacBackend;
