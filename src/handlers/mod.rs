pub mod invoke;
pub mod strategy;
