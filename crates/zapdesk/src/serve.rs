// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapdesk serve` command implementation.
//!
//! Opens the database, makes sure every configured channel has a backing
//! table, and runs the gateway until SIGINT/SIGTERM. The database is
//! checkpointed and closed on the way out.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use zapdesk_config::ZapdeskConfig;
use zapdesk_core::ZapdeskError;
use zapdesk_gateway::{
    start_server, AuthConfig, ChannelRoute, GatewayState, MediaFetcher, ServerConfig,
};
use zapdesk_pipeline::{ChannelRules, ContactResolver};
use zapdesk_storage::queries::channel_rows;
use zapdesk_storage::Database;

/// Build the gateway channel registry from configuration, preserving
/// configuration order.
fn channel_routes(config: &ZapdeskConfig) -> Vec<ChannelRoute> {
    config
        .channels
        .iter()
        .map(|c| ChannelRoute {
            id: c.id.clone(),
            label: c.label.clone().unwrap_or_else(|| c.id.clone()),
            table: c.table_name().to_string(),
            rules: ChannelRules {
                agent_hints: c.agent_hints.clone(),
                agent_label: c.agent_label.clone(),
            },
        })
        .collect()
}

/// Runs the `zapdesk serve` command.
///
/// Serves until a shutdown signal arrives; in-flight requests drain
/// before the database is closed.
pub async fn run_serve(config: ZapdeskConfig) -> Result<(), ZapdeskError> {
    init_tracing(&config.service.log_level);

    info!("starting zapdesk serve");

    if config.channels.is_empty() {
        warn!("no channels configured -- the API will serve an empty channel list");
    }
    if config.server.bearer_token.is_none() {
        warn!("no bearer token configured -- webhook and API requests will be rejected");
    }

    let db = Database::open_with_wal(&config.storage.database_path, config.storage.wal_mode)
        .await?;

    for channel in &config.channels {
        channel_rows::ensure_channel_table(&db, channel.table_name()).await?;
    }
    info!(count = config.channels.len(), "channel tables ready");

    let media = MediaFetcher::new(
        Duration::from_secs(config.media.download_timeout_secs),
        config.media.max_bytes,
    )?;

    let state = GatewayState {
        db: db.clone(),
        resolver: Arc::new(ContactResolver::new()),
        channels: Arc::new(channel_routes(&config)),
        media,
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
        start_time: std::time::Instant::now(),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let shutdown = install_signal_handler();
    start_server(&server_config, state, shutdown).await?;

    info!("gateway stopped, closing database");
    db.close().await?;
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initialize the tracing subscriber for the serve command.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zapdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use zapdesk_config::ChannelConfig;

    #[test]
    fn channel_routes_fall_back_to_id() {
        let mut config = ZapdeskConfig::default();
        config.channels = vec![
            ChannelConfig {
                id: "loja-centro".into(),
                ..ChannelConfig::default()
            },
            ChannelConfig {
                id: "loja-sul".into(),
                table: "mensagens_sul".into(),
                label: Some("Loja Sul".into()),
                ..ChannelConfig::default()
            },
        ];

        let routes = channel_routes(&config);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].id, "loja-centro");
        assert_eq!(routes[0].label, "loja-centro");
        assert_eq!(routes[0].table, "loja-centro");
        assert_eq!(routes[1].label, "Loja Sul");
        assert_eq!(routes[1].table, "mensagens_sul");
    }

    #[test]
    fn channel_routes_carry_the_agent_vocabulary() {
        let mut config = ZapdeskConfig::default();
        config.channels = vec![ChannelConfig {
            id: "main".into(),
            agent_hints: vec!["bot".into()],
            agent_label: "suporte".into(),
            ..ChannelConfig::default()
        }];

        let routes = channel_routes(&config);
        assert_eq!(routes[0].rules.agent_hints, vec!["bot".to_string()]);
        assert_eq!(routes[0].rules.agent_label, "suporte");
    }
}
