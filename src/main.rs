use anyhow::Context;
use clap::Parser;
use shardkv::config::{NodeConfig, ReplicationSettings, load_shards};
use shardkv::replication::{HttpReplicaClient, ReplicationPuller};
use shardkv::server::{ShardNode, router};
use shardkv::sharding::ShardTable;
use shardkv::storage::{FjallStore, StorageEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shardkv")]
#[command(about = "Sharded key-value store node", long_about = None)]
struct Args {
    /// Directory of the on-disk store
    #[arg(long)]
    db_location: PathBuf,

    /// HTTP listen address, e.g. 127.0.0.1:8080
    #[arg(long)]
    http_addr: String,

    /// Name of the shard this node serves
    #[arg(long)]
    shard: String,

    /// Shard list in TOML
    #[arg(long, default_value = "sharding.toml")]
    config_file: PathBuf,

    /// Reject client writes; replicated writes are still applied
    #[arg(long)]
    read_only: bool,

    /// Outbox poll interval when idle
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,

    /// Back-off after a failed replication push
    #[arg(long, default_value_t = 1000)]
    retry_interval_ms: u64,

    /// Timeout of a single replication push or forwarded request
    #[arg(long, default_value_t = 500)]
    push_timeout_ms: u64,

    /// Periodic journal fsync; disabled when unset
    #[arg(long)]
    fsync_ms: Option<u16>,
}

impl Args {
    fn into_node_config(self) -> NodeConfig {
        NodeConfig {
            db_location: self.db_location,
            http_addr: self.http_addr,
            shard_name: self.shard,
            config_file: self.config_file,
            read_only: self.read_only,
            fsync_ms: self.fsync_ms,
            replication: ReplicationSettings {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                retry_interval: Duration::from_millis(self.retry_interval_ms),
                push_timeout: Duration::from_millis(self.push_timeout_ms),
                ..ReplicationSettings::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_node_config();

    // 1. Shard table:
    let shards_file = load_shards(&config.config_file)
        .with_context(|| format!("loading {}", config.config_file.display()))?;
    let shards = Arc::new(ShardTable::build(shards_file.shards, &config.shard_name)?);
    tracing::info!(
        "Shard count = {}, current shard: {} ({})",
        shards.count(),
        shards.self_index(),
        shards.self_shard().name
    );

    // 2. Storage:
    let storage: Arc<dyn StorageEngine> = Arc::new(
        FjallStore::open_with_fsync(&config.db_location, config.read_only, config.fsync_ms)
            .with_context(|| format!("opening store at {}", config.db_location.display()))?,
    );

    // 3. Replication puller:
    let client = Arc::new(HttpReplicaClient::new(&config.replication));
    let puller = ReplicationPuller::new(
        storage.clone(),
        shards.clone(),
        client,
        config.replication,
    )
    .start();

    // 4. HTTP router:
    let node = Arc::new(ShardNode::new(
        storage.clone(),
        shards.clone(),
        puller.waker(),
        config.replication.push_timeout,
    ));
    let app = router(node);

    // 5. Serve until a shutdown signal arrives:
    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("binding {}", config.http_addr))?;
    tracing::info!("HTTP server listening on {}", config.http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // 6. Stop replication before the store is released:
    puller.shutdown().await;
    drop(storage);
    tracing::info!("Node stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
