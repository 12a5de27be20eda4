//! OPC-to-serial bridge library.
//!
//! Exposes every module for integration testing and external
//! inspection; `main.rs` is a thin CLI shell around [`bridge::Bridge`].

#![deny(unused_must_use)]

pub mod acceptor;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod opc;
pub mod pixel;
pub mod router;
pub mod slot;
pub mod stats;
pub mod transport;
pub mod worker;
