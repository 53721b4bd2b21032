//! Library of a small HTTP wrapper around [`pg_dump`][pg_dump].
//!
//! Dumping, restoring, listing, deleting and downloading of database dumps
//! can be triggered by invoking an HTTP endpoint.
//! The endpoints are located in the [`server`] module, the invocations
//! of the PostgreSQL tools in [`postgres`].
//!
//! Every response of an operation starts with a marker line (`SUCCESS`,
//! `ERROR` or `OK`) so calling scripts can easily check the result.
//!
//! [pg_dump]: https://www.postgresql.org/docs/current/app-pgdump.html

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dumps;
pub mod postgres;
pub mod process;
pub mod server;
