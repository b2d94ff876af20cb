pub mod error;
pub mod fetch;
pub mod http;
pub mod result;

pub use error::{ErrorPhase, WptError};
pub use fetch::{fetch_and_normalize, fetch_and_normalize_blocking, fetch_and_normalize_with};
pub use http::HttpClient;
pub use result::{normalize, NormalizedResult, Run, RunView, TestResult};
