//! Scheduled night automation: gather room, AC and weather data, ask a
//! [`DecisionStrategy`] what to do, carry it out and record it.

pub mod decision;
pub mod history;
pub mod openrouter;
pub mod runner;
pub mod schedule;
pub mod weather;

pub use decision::{Decision, DecisionContext, DecisionStrategy, parse_decision};
pub use history::{DecisionLog, DecisionRecord};
pub use openrouter::OpenRouterStrategy;
pub use runner::{Automation, RunOptions, RunOutcome, RunReport};
pub use schedule::Window;
pub use weather::{Weather, WeatherClient};
