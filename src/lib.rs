//! # Splitpool
//!
//! A read/write-splitting connection router for replicated databases.
//!
//! ## Features
//!
//! - **Read/Write Splitting** - Writes and transactions go to the primary, reads to weighted replicas
//! - **Async/Await** - Built on Tokio for high-performance async operations
//! - **Failover** - Unreachable endpoints are quarantined and retried on an alternative
//! - **Lazy Recovery** - Quarantined endpoints are reinstated once they prove healthy again
//! - **Request Scoping** - Per-call-chain primary pinning for transactions and read-after-write
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! splitpool = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use splitpool::{PoolRouter, RouterConfig, Statement, EndpointRef};
//! use std::collections::HashMap;
//!
//! # async fn example(primary: EndpointRef, replicas: Vec<EndpointRef>) -> Result<(), Box<dyn std::error::Error>> {
//! // Build the router over one primary and any number of read replicas
//! let mut weights = HashMap::new();
//! weights.insert(replicas[0].clone(), 2);
//!
//! let router = PoolRouter::new(primary, replicas, weights, RouterConfig::default());
//!
//! // Reads are dispatched to a weighted-random replica
//! let rows = router.dispatch(&Statement::new("select", "SELECT * FROM users")).await?;
//!
//! // Writes always go to the primary
//! router.dispatch(&Statement::new("insert", "INSERT INTO users (name) VALUES ('alice')")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transactions
//!
//! A transaction forces primary selection for its entire extent:
//!
//! ```rust,no_run
//! # use splitpool::{PoolRouter, Statement};
//! # async fn example(router: &PoolRouter) -> splitpool::PoolResult<()> {
//! router.transaction(|| async {
//!     router.dispatch(&Statement::new("update", "UPDATE accounts SET balance = balance - 10")).await?;
//!     router.dispatch(&Statement::new("update", "UPDATE accounts SET balance = balance + 10")).await
//! }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failover
//!
//! A failed read endpoint is quarantined for a configurable backoff window and the
//! operation is retried on an alternative endpoint. Transient connection errors
//! (recognized by message signature) get one reconnect-and-retry on the same
//! endpoint first. Statement errors from the underlying driver are never retried
//! and propagate unchanged.
//!
//! ## Configuration
//!
//! Customize routing behavior with [`RouterConfig`]:
//!
//! ```rust
//! use splitpool::{RouterConfig, SelectionMode};
//! use std::time::Duration;
//!
//! let config = RouterConfig::builder()
//!     .replica_quarantine(Duration::from_secs(60))
//!     .primary_suppression(Duration::from_secs(30))
//!     .read_selection(SelectionMode::Random)
//!     .build();
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`PoolResult`] for consistent error handling:
//!
//! ```rust,no_run
//! # use splitpool::{PoolRouter, PoolError, Statement};
//! # async fn example(router: &PoolRouter) {
//! match router.dispatch(&Statement::new("select", "SELECT 1")).await {
//!     Ok(result) => println!("{:?}", result),
//!     Err(PoolError::AllEndpointsDown) => eprintln!("every endpoint is unreachable"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`router`] - The routing adapter: dispatch, retry, and failover protocol
//! - [`endpoint`] - The endpoint pool abstraction implemented per database driver
//! - [`availability`] - Quarantine stack and primary suppression bookkeeping
//! - [`context`] - Call-chain-scoped selection overrides
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod availability;
pub mod cache;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod observer;
pub mod router;
pub mod selector;
pub mod statement;
pub mod types;

// Re-exports for convenience
pub use cache::QueryCache;
pub use config::{AllDownHook, RouterConfig, RouterConfigBuilder, SelectionMode};
pub use context::SelectionContext;
pub use endpoint::{EndpointPool, EndpointRef};
pub use error::{PoolError, PoolResult, DEFAULT_TRANSIENT_PATTERNS};
pub use observer::{DispatchObserver, DispatchOutcome, TracingObserver};
pub use router::{PoolRouter, RouterMetrics};
pub use selector::WeightedEndpointSet;
pub use statement::{routing_class, RoutingClass, Statement, StatementResult};
pub use types::{Row, Value};
