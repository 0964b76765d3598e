pub mod strategy_actor;

pub use strategy_actor::{StrategyHandle, spawn};
