//! Model Context Protocol (MCP) engine
//!
//! Provides JSON-RPC framing, the capability registry, and the protocol
//! dispatcher that every transport adapter feeds into.

pub mod capability;
pub mod rpc;
pub mod server;
