// Adapters layer: concrete implementations of the domain ports
// (local file storage, HTTP source and persistence client).

pub mod http;
pub mod storage;

pub use http::HttpRiskStore;
pub use storage::LocalStorage;
