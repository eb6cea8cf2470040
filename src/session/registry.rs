//! Process-wide directory of live sessions and the operations exposed on
//! top of it.

use crate::agent::{agent_catalog, AgentCatalogEntry};
use crate::config::{GameConfig, RegistryConfig};
use crate::engine::PlayerAction;
use crate::error::{CoreError, CoreResult};
use crate::llm::LlmGateway;
use crate::session::events::EventStream;
use crate::session::orchestrator::Session;
use crate::session::state::{ActionResult, FinalRanking, GameState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    gateway: Option<Arc<dyn LlmGateway>>,
    limits: RegistryConfig,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(limits: RegistryConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            gateway: None,
            limits,
        }
    }

    /// Attach the shared LLM gateway used by every LLM seat.
    pub fn with_gateway(mut self, gateway: Arc<dyn LlmGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn get(&self, game_id: Uuid) -> CoreResult<Session> {
        self.sessions
            .read()
            .await
            .get(&game_id)
            .cloned()
            .ok_or(CoreError::GameNotFound)
    }

    // --- operations -------------------------------------------------------

    pub async fn create_game(&self, config: GameConfig) -> CoreResult<(Uuid, GameState)> {
        {
            let sessions = self.sessions.read().await;
            if sessions.len() >= self.limits.max_concurrent_games {
                return Err(CoreError::Overloaded);
            }
        }

        let session = Session::create(config, self.gateway.clone())?;
        let game_id = session.game_id();
        let initial = session.snapshot().await;
        self.sessions.write().await.insert(game_id, session);
        tracing::info!(%game_id, "game registered");
        Ok((game_id, initial))
    }

    pub async fn get_state(&self, game_id: Uuid) -> CoreResult<GameState> {
        Ok(self.get(game_id).await?.snapshot().await)
    }

    pub async fn propose_action(
        &self,
        game_id: Uuid,
        player_id: usize,
        action: PlayerAction,
    ) -> CoreResult<ActionResult> {
        self.get(game_id).await?.propose_action(player_id, action).await
    }

    pub async fn advance_hand(&self, game_id: Uuid) -> CoreResult<GameState> {
        self.get(game_id).await?.advance().await
    }

    /// End a game and schedule its removal after a grace period long enough
    /// for final snapshot reads.
    pub async fn end_game(&self, game_id: Uuid) -> CoreResult<Vec<FinalRanking>> {
        let session = self.get(game_id).await?;
        let rankings = session.end().await?;

        let sessions = self.sessions.clone();
        let grace = self.limits.end_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if sessions.write().await.remove(&game_id).is_some() {
                tracing::info!(%game_id, "ended game removed from registry");
            }
        });

        Ok(rankings)
    }

    pub async fn subscribe(&self, game_id: Uuid) -> CoreResult<EventStream> {
        Ok(self.get(game_id).await?.subscribe().await)
    }

    pub fn list_agents(&self) -> Vec<AgentCatalogEntry> {
        agent_catalog(self.gateway.is_some())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
