// Re-export all member crates (see Cargo.toml).
#[cfg(feature = "core")]
pub use smp_core as core;

#[cfg(feature = "crypto")]
pub use smp_crypto as crypto;

#[cfg(feature = "protocol")]
pub use smp_protocol as protocol;

#[cfg(feature = "client")]
pub use smp_client as client;
