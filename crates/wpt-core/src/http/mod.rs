pub mod client;

pub use client::{result_endpoint, HttpClient, HttpClientBuilder, RESULT_PATH};
