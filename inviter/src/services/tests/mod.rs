//! Tests for inviter services
//!
//! The VK client runs against a local wiremock server; the ledger store
//! against a temporary directory.
