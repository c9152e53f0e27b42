// src/backends/mod.rs

#[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
pub mod eventfd;

#[cfg(feature = "pipe")]
pub mod pipe;

// Shared trait and the enum dispatcher
pub mod common;
