//! Demo authentication: a single configured credential pair and a cookie
//! flag marking the browser session as signed in.

pub mod domain;
pub mod errors;
pub mod service;

pub use service::DemoAuthService;
