// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intervox status` command implementation.
//!
//! Queries the gateway's pool summary and prints it. Falls back gracefully
//! when the orchestrator is not running.

use std::io::IsTerminal;
use std::time::Duration;

use intervox_config::model::IntervoxConfig;
use intervox_core::IntervoxError;
use serde::{Deserialize, Serialize};

/// Pool summary as served by `GET /v1/accounts/summary`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummaryReply {
    pub total: usize,
    pub active: usize,
    pub with_tokens: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub failed: usize,
    pub is_healthy: bool,
    pub recommendation: String,
    pub message: String,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub gateway_host: String,
    pub gateway_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<SummaryReply>,
}

/// Fetches the pool summary. `Ok(None)` when the gateway is unreachable.
pub async fn fetch_summary(
    config: &IntervoxConfig,
) -> Result<Option<SummaryReply>, IntervoxError> {
    let host = &config.gateway.host;
    let port = config.gateway.port;
    let url = format!("http://{host}:{port}/v1/accounts/summary");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| IntervoxError::Internal(format!("failed to create HTTP client: {e}")))?;

    let mut request = client.get(&url);
    if let Some(token) = &config.gateway.bearer_token {
        request = request.bearer_auth(token);
    }

    match request.send().await {
        Ok(resp) if resp.status().is_success() => {
            let summary = resp.json().await.map_err(|e| {
                IntervoxError::Internal(format!("failed to parse summary response: {e}"))
            })?;
            Ok(Some(summary))
        }
        Ok(resp) => Err(IntervoxError::Internal(format!(
            "gateway answered {} for {url}",
            resp.status()
        ))),
        Err(_) => Ok(None),
    }
}

/// Run the `intervox status` command.
pub async fn run_status(
    config: &IntervoxConfig,
    json: bool,
    plain: bool,
) -> Result<(), IntervoxError> {
    let pool = fetch_summary(config).await?;

    if json {
        let response = StatusResponse {
            running: pool.is_some(),
            gateway_host: config.gateway.host.clone(),
            gateway_port: config.gateway.port,
            pool,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    match pool {
        Some(summary) => print_summary(&summary, use_color),
        None => print_offline(&config.gateway.host, config.gateway.port, use_color),
    }
    Ok(())
}

fn print_summary(summary: &SummaryReply, use_color: bool) {
    println!();
    println!("  intervox status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        let state = if summary.is_healthy {
            summary.recommendation.green()
        } else {
            summary.recommendation.red()
        };
        println!("    Pool:     {state}");
    } else {
        let mark = if summary.is_healthy { "[OK]" } else { "[!!]" };
        println!("    Pool:     {mark} {}", summary.recommendation);
    }
    println!(
        "    Accounts: {} total, {} active, {} with tokens",
        summary.total, summary.active, summary.with_tokens
    );
    println!(
        "    Health:   {} healthy, {} degraded, {} failed",
        summary.healthy, summary.degraded, summary.failed
    );
    println!("    {}", summary.message);
    println!();
}

fn print_offline(host: &str, port: u16, use_color: bool) {
    println!();
    println!("  intervox status");
    println!("  {}", "-".repeat(35));
    if use_color {
        use colored::Colorize;
        println!("    State:    {} {}", "✗".red(), "not running".red());
    } else {
        println!("    State:    [--] not running");
    }
    println!("    Gateway:  http://{host}:{port}");
    println!();
}
