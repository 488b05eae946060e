//! Integration tests for the Beacon workspace.

mod helpers;

mod feed_test;
mod push_client_test;
