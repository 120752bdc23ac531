//! Unit Tests
//!
//! - `controller_flow`: multi-step wizard flows against a mocked submission sink
//! - `geo_client_tests`: the geography HTTP client against wiremock
//! - `submission_client_tests`: the profile API client against wiremock
//! - `server_routes_tests`: backend routes driven through `tower::ServiceExt`

mod controller_flow;
mod server_routes_tests;
mod submission_client_tests;
