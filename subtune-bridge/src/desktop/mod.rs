//! Desktop implementations of the bridge traits.

mod filesystem;
mod http;
mod network;
#[cfg(feature = "secure-store")]
mod secure_store;
mod settings;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use network::ProbingNetworkMonitor;
#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
pub use settings::SqliteSettingsStore;
