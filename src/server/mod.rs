//! HTTP Request Layer
//!
//! Client and internode endpoints of a shard node.
//!
//! ## Routing
//! - **Owned keys** are read and written in local storage.
//! - **Foreign keys** are forwarded once to the owning shard and its answer is relayed back.
//! - **`/replicate`** applies writes pushed by other nodes' pullers.
//! - **`/purge`** deletes records left over after the shard list changed.

pub mod handlers;
pub mod node;
pub mod protocol;

pub use node::ShardNode;

use crate::replication::protocol::ENDPOINT_REPLICATE;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use handlers::{handle_get, handle_purge, handle_replicate, handle_set, handle_stats};
use protocol::{ENDPOINT_GET, ENDPOINT_PURGE, ENDPOINT_SET, ENDPOINT_STATS};
use std::sync::Arc;

pub fn router(node: Arc<ShardNode>) -> Router {
    Router::new()
        .route(ENDPOINT_GET, get(handle_get))
        .route(ENDPOINT_SET, get(handle_set).post(handle_set))
        .route(ENDPOINT_REPLICATE, post(handle_replicate))
        .route(ENDPOINT_PURGE, post(handle_purge))
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(node))
}
