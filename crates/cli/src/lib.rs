//! Library half of the `linkaudit` binary, shared with its integration tests.

pub mod exit_codes;
pub mod writer;
