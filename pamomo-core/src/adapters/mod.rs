//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for durable key/value storage
//! - In-memory map for throwaway sessions
//! - reqwest HTTP client for the Remote Account Service

pub mod duckdb;
pub mod http;
pub mod memory;

#[cfg(test)]
pub mod mock_server;
