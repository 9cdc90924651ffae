//! Video service implementations.

mod azure;

pub use azure::{AzureSoraClient, AzureSoraClientBuilder, SoraModel};
