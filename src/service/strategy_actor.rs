use crate::db::EvalStorage;
use crate::error::GateError;
use crate::strategy::SelectionStrategy;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use tracing::{info, warn};

/// Public messages handled by the strategy actor.
#[derive(Debug)]
pub enum StrategyActorMessage {
    /// Current active strategy, if any has been published.
    GetStrategy(RpcReplyPort<Option<Arc<SelectionStrategy>>>),
    /// Persist a new strategy document and make it active.
    Publish(SelectionStrategy, RpcReplyPort<Result<i64, GateError>>),
    /// Re-read the newest stored strategy and make it active.
    Reload(RpcReplyPort<Option<Arc<SelectionStrategy>>>),
}

/// Handle for interacting with the strategy actor.
#[derive(Clone)]
pub struct StrategyHandle {
    actor: ActorRef<StrategyActorMessage>,
}

impl StrategyHandle {
    /// Active strategy, or None before the first publish.
    pub async fn get(&self) -> Result<Option<Arc<SelectionStrategy>>, GateError> {
        ractor::call!(self.actor, StrategyActorMessage::GetStrategy)
            .map_err(|e| GateError::RactorError(format!("GetStrategy RPC failed: {e}")))
    }

    /// Persist and activate a strategy. Returns the stored row id.
    pub async fn publish(&self, strategy: SelectionStrategy) -> Result<i64, GateError> {
        ractor::call!(self.actor, StrategyActorMessage::Publish, strategy)
            .map_err(|e| GateError::RactorError(format!("Publish RPC failed: {e}")))?
    }

    /// Reload the active strategy from storage.
    pub async fn reload(&self) -> Result<Option<Arc<SelectionStrategy>>, GateError> {
        ractor::call!(self.actor, StrategyActorMessage::Reload)
            .map_err(|e| GateError::RactorError(format!("Reload RPC failed: {e}")))
    }
}

/// Internal state held by the ractor-driven strategy actor.
struct StrategyActorState {
    storage: EvalStorage,
    active: Option<Arc<SelectionStrategy>>,
}

struct StrategyActor;

#[ractor::async_trait]
impl Actor for StrategyActor {
    type Msg = StrategyActorMessage;
    type State = StrategyActorState;
    type Arguments = EvalStorage;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        storage: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let active = match storage.latest_strategy().await {
            Ok(Some(row)) => match row.parse() {
                Ok(strategy) => {
                    info!(
                        id = row.id,
                        primary = %strategy.primary_model,
                        "StrategyActor started with stored strategy"
                    );
                    Some(Arc::new(strategy))
                }
                Err(e) => {
                    warn!(id = row.id, error = %e, "stored strategy is unreadable; starting empty");
                    None
                }
            },
            Ok(None) => {
                info!("StrategyActor started with no published strategy");
                None
            }
            Err(e) => {
                return Err(ActorProcessingErr::from(format!(
                    "strategy load failed: {e}"
                )));
            }
        };

        Ok(StrategyActorState { storage, active })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            StrategyActorMessage::GetStrategy(rp) => {
                let _ = rp.send(state.active.clone());
            }
            StrategyActorMessage::Publish(strategy, rp) => {
                match state.storage.insert_strategy(&strategy).await {
                    Ok(id) => {
                        info!(id, primary = %strategy.primary_model, "strategy published");
                        state.active = Some(Arc::new(strategy));
                        let _ = rp.send(Ok(id));
                    }
                    Err(e) => {
                        warn!(error = %e, "strategy publish failed");
                        let _ = rp.send(Err(e));
                    }
                }
            }
            StrategyActorMessage::Reload(rp) => {
                match state.storage.latest_strategy().await {
                    Ok(Some(row)) => match row.parse() {
                        Ok(strategy) => {
                            info!(id = row.id, primary = %strategy.primary_model, "strategy reloaded");
                            state.active = Some(Arc::new(strategy));
                        }
                        Err(e) => {
                            warn!(id = row.id, error = %e, "reload found unreadable strategy; keeping active");
                        }
                    },
                    Ok(None) => {
                        info!("reload found no stored strategy");
                    }
                    Err(e) => {
                        warn!(error = %e, "reload failed; keeping active strategy");
                    }
                }
                let _ = rp.send(state.active.clone());
            }
        }
        Ok(())
    }
}

/// Async spawn of the strategy actor and return a handle.
pub async fn spawn(storage: EvalStorage) -> StrategyHandle {
    let (actor, _jh) = Actor::spawn(None, StrategyActor, storage)
        .await
        .expect("failed to spawn StrategyActor");
    StrategyHandle { actor }
}
