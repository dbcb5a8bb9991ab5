//! Battle Rewards MCP Server
//!
//! A Model Context Protocol server (rmcp) that lets a game host drive the
//! rewards engine: it pushes lifecycle notifications and registers online
//! players, and gets back the host actions each resolution produced.

use std::path::PathBuf;
use std::sync::Arc;

use battle_rewards::{
    describe_rewards, spawn_sweeper, BlockPos, HostAction, LifecycleEvent, PlayerInfo,
    RecordingHost, ResolutionReport, RewardEngine, DEFAULT_SWEEP_PERIOD,
};
use clap::Parser;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ErrorData as McpError, *},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use tokio::io::{stdin, stdout};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Battle Rewards MCP server
#[derive(Parser, Debug)]
#[command(name = "battle-rewards-mcp")]
struct Args {
    /// Reward configuration (RON). Created with defaults if missing.
    #[arg(long, default_value = "config/battle_rewards.ron")]
    config: PathBuf,
}

#[derive(Clone)]
pub struct BattleRewardsService {
    tool_router: ToolRouter<BattleRewardsService>,
    engine: Arc<RewardEngine>,
    host: Arc<RecordingHost>,
    config_path: PathBuf,
}

// Tool request structures
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NotifyRequest {
    #[schemars(
        description = "Lifecycle event as JSON, e.g. {\"BattleFled\":{\"battle_id\":\"...\",\"player_id\":\"...\"}}"
    )]
    pub event: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RegisterPlayerRequest {
    #[schemars(description = "Player UUID")]
    pub player_id: String,
    #[schemars(description = "Display name used in messages and commands")]
    pub name: String,
    #[schemars(description = "Dimension id the player is currently in")]
    pub dimension: String,
    #[schemars(description = "Block coordinates as [x, y, z]")]
    pub position: Option<[i32; 3]>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UnregisterPlayerRequest {
    #[schemars(description = "Player UUID")]
    pub player_id: String,
}

#[derive(Serialize)]
struct NotifyResponse {
    reports: Vec<ResolutionReport>,
    actions: Vec<HostAction>,
}

fn text(body: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(body.into())]))
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

#[tool_router]
impl BattleRewardsService {
    pub fn new(engine: Arc<RewardEngine>, host: Arc<RecordingHost>, config_path: PathBuf) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
            host,
            config_path,
        }
    }

    #[tool(description = "Deliver a battle lifecycle event and return the rewards it resolved plus the host actions to perform")]
    async fn notify(
        &self,
        Parameters(request): Parameters<NotifyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let event: LifecycleEvent = match serde_json::from_str(&request.event) {
            Ok(event) => event,
            Err(e) => return text(format!("Error: invalid lifecycle event: {}", e)),
        };
        let reports = self.engine.handle(event);
        let response = NotifyResponse {
            reports,
            actions: self.host.take_actions(),
        };
        text(to_json(&response))
    }

    #[tool(description = "Mark a player as online so rewards can be granted to them")]
    async fn register_player(
        &self,
        Parameters(request): Parameters<RegisterPlayerRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = match Uuid::parse_str(&request.player_id) {
            Ok(id) => id,
            Err(e) => return text(format!("Error: invalid player id: {}", e)),
        };
        let mut player = PlayerInfo::new(id, &request.name, &request.dimension);
        if let Some([x, y, z]) = request.position {
            player.position = BlockPos { x, y, z };
        }
        self.host.add_player(player);
        text(format!("Registered {} ({})", request.name, id))
    }

    #[tool(description = "Mark a player as offline; their rewards are skipped until registered again")]
    async fn unregister_player(
        &self,
        Parameters(request): Parameters<UnregisterPlayerRequest>,
    ) -> Result<CallToolResult, McpError> {
        match Uuid::parse_str(&request.player_id) {
            Ok(id) => {
                self.host.remove_player(id);
                text(format!("Unregistered {}", id))
            }
            Err(e) => text(format!("Error: invalid player id: {}", e)),
        }
    }

    #[tool(description = "Reload the reward configuration from disk")]
    async fn reload_rewards(&self) -> Result<CallToolResult, McpError> {
        match self.engine.reload(&self.config_path) {
            Ok(rules) => text(format!(
                "Reloaded {} rewards from {}",
                rules.total_rewards(),
                self.config_path.display()
            )),
            Err(e) => text(format!("Error: reload failed, previous rewards kept: {}", e)),
        }
    }

    #[tool(description = "List the configured rewards grouped by trigger")]
    async fn list_rewards(&self) -> Result<CallToolResult, McpError> {
        text(describe_rewards(&self.engine.rules()))
    }

    #[tool(description = "Show engine status: active battles, configured rewards, players on cooldown")]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        text(to_json(&self.engine.status()))
    }
}

#[tool_handler]
impl ServerHandler for BattleRewardsService {}

fn init_logging(debug_enabled: bool) {
    let default_directive = if debug_enabled {
        "battle_rewards=debug"
    } else {
        "battle_rewards=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let rules = battle_rewards::load_or_create(&args.config)?;
    init_logging(rules.debug_enabled);

    let host = Arc::new(RecordingHost::new());
    let engine = Arc::new(
        RewardEngine::builder()
            .host(host.clone())
            .rules(rules)
            .config_path(args.config.clone())
            .build()?,
    );
    let sweeper = spawn_sweeper(engine.tracker().clone(), DEFAULT_SWEEP_PERIOD);

    info!("Battle Rewards MCP server starting on stdio");
    let service = BattleRewardsService::new(engine, host, args.config);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    sweeper.abort();
    info!("Battle Rewards MCP server exiting: {:?}", quit_reason);
    Ok(())
}
