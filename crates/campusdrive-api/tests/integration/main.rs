//! Integration test entry point for the API client
//!
//! Each submodule exercises one slice of the client against a wiremock
//! server.

mod common;
mod test_errors;
mod test_project_endpoints;
mod test_registration;
