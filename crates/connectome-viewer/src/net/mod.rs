pub mod fetch;
pub mod protocol;
pub mod runtime;
pub mod sse;
pub mod telemetry;

pub use fetch::{FetchError, SearchRequest};
pub use protocol::Incoming;
pub use runtime::NetRuntime;
