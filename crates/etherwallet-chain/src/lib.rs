//! Chain access for etherwallet.
//!
//! The wallet never talks to a node directly: everything goes through
//! the [`ChainClient`] trait so signing can be exercised against an
//! in-memory mock and the HTTP transport can be swapped out.
//!
//! # Modules
//!
//! - [`client`]: the [`ChainClient`] trait consumed by the wallet
//! - [`jsonrpc`]: [`JsonRpcClient`], an Ethereum JSON-RPC implementation over HTTP

pub mod client;
pub mod jsonrpc;


pub use client::ChainClient;
pub use jsonrpc::JsonRpcClient;
