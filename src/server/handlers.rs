use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::node::{Forwarded, ShardNode};
use super::protocol::{
    FORWARDED_HEADER, KeyParams, PurgeResponse, SetParams, SetResponse, StatsResponse,
};
use crate::config::Shard;
use crate::replication::protocol::{ReplicateRequest, ReplicateResponse};
use crate::storage::StorageError;

fn storage_status(e: &StorageError) -> StatusCode {
    match e {
        StorageError::ReadOnly => StatusCode::FORBIDDEN,
        StorageError::EmptyKey => StatusCode::BAD_REQUEST,
        StorageError::NotFound => StatusCode::NOT_FOUND,
        StorageError::Conflict => StatusCode::CONFLICT,
        StorageError::Backend(_) | StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn is_forwarded(headers: &HeaderMap) -> bool {
    headers.contains_key(FORWARDED_HEADER)
}

/// Answer for a request that reached a non-owner after already being routed.
/// Happens only when nodes run with different shard lists.
fn misdirected(node: &ShardNode, owner: &Shard) -> Response {
    tracing::warn!(
        "Forwarded request for shard {} reached shard {}",
        owner.index,
        node.shards().self_index()
    );
    (
        StatusCode::MISDIRECTED_REQUEST,
        format!(
            "key belongs to shard {} but shard {} received a forwarded request",
            owner.index,
            node.shards().self_index()
        ),
    )
        .into_response()
}

fn relay(result: anyhow::Result<Forwarded>, owner: &Shard) -> Response {
    match result {
        Ok(forwarded) => {
            let mut response = (forwarded.status, forwarded.body).into_response();
            if let Some(content_type) = forwarded.content_type {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            tracing::error!("Failed to forward to shard {}: {}", owner.index, e);
            (
                StatusCode::BAD_GATEWAY,
                format!("shard {} at {} is unreachable", owner.index, owner.address),
            )
                .into_response()
        }
    }
}

pub async fn handle_get(
    Extension(node): Extension<Arc<ShardNode>>,
    headers: HeaderMap,
    Query(params): Query<KeyParams>,
) -> Response {
    let key = params.key.as_bytes();
    if key.is_empty() {
        return (StatusCode::BAD_REQUEST, "key must not be empty").into_response();
    }

    let owner = node.shards().owner(key);
    if owner.index != node.shards().self_index() {
        if is_forwarded(&headers) {
            return misdirected(&node, owner);
        }
        return relay(node.forward_get(owner, &params.key).await, owner);
    }

    match node.get_local(key) {
        Ok(Some(value)) => (StatusCode::OK, value).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to get {:?}: {}", params.key, e);
            (storage_status(&e), e.to_string()).into_response()
        }
    }
}

pub async fn handle_set(
    Extension(node): Extension<Arc<ShardNode>>,
    headers: HeaderMap,
    Query(params): Query<SetParams>,
) -> Response {
    let key = params.key.as_bytes();
    let owner = node.shards().owner(key);

    if !key.is_empty() && owner.index != node.shards().self_index() {
        if is_forwarded(&headers) {
            return misdirected(&node, owner);
        }
        return relay(
            node.forward_set(owner, &params.key, &params.value).await,
            owner,
        );
    }

    let shard = node.shards().self_index();
    match node.set_local(key, params.value.as_bytes()) {
        Ok(()) => (
            StatusCode::OK,
            Json(SetResponse {
                success: true,
                shard,
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to set {:?}: {}", params.key, e);
            (
                storage_status(&e),
                Json(SetResponse {
                    success: false,
                    shard,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Apply endpoint for writes pushed by another node's puller.
pub async fn handle_replicate(
    Extension(node): Extension<Arc<ShardNode>>,
    Json(req): Json<ReplicateRequest>,
) -> (StatusCode, Json<ReplicateResponse>) {
    match node.apply_replicated(&req.key, &req.value) {
        Ok(()) => {
            tracing::debug!(
                "Applied replicated write for {:?}",
                String::from_utf8_lossy(&req.key)
            );
            (StatusCode::OK, Json(ReplicateResponse { success: true }))
        }
        Err(e) => {
            tracing::error!("Failed to apply replicated write: {}", e);
            (
                storage_status(&e),
                Json(ReplicateResponse { success: false }),
            )
        }
    }
}

pub async fn handle_purge(
    Extension(node): Extension<Arc<ShardNode>>,
) -> (StatusCode, Json<PurgeResponse>) {
    match node.purge() {
        Ok(deleted) => (StatusCode::OK, Json(PurgeResponse { deleted })),
        Err(e) => {
            tracing::error!("Failed to purge foreign keys: {}", e);
            (storage_status(&e), Json(PurgeResponse { deleted: 0 }))
        }
    }
}

pub async fn handle_stats(
    Extension(node): Extension<Arc<ShardNode>>,
) -> (StatusCode, Json<StatsResponse>) {
    let shards = node.shards();
    let pending_replication = match node.storage().outbox_len() {
        Ok(len) => len,
        Err(e) => {
            tracing::warn!("Failed to count replication entries: {}", e);
            0
        }
    };

    (
        StatusCode::OK,
        Json(StatsResponse {
            shard: shards.self_shard().name.clone(),
            index: shards.self_index(),
            shard_count: shards.count(),
            read_only: node.storage().is_read_only(),
            pending_replication,
        }),
    )
}
