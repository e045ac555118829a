//! Twin Simulation Engine: turns an `Ontology` + sampled data into a
//! `DigitalTwin` (`TwinBuilder`), profiles/infers schema over raw rows
//! (`SchemaInference`, `Profiler`), authors starter scenarios
//! (`ScenarioAuthor`), replays them deterministically (`Simulator`), and
//! summarizes a completed run (`ImpactAnalyzer`).

pub mod impact_analyzer;
pub mod profiler;
pub mod schema_inference;
pub mod scenario_author;
pub mod simulator;
pub mod twin_builder;

pub use impact_analyzer::{analyze_impact, ImpactLevel, ImpactReport};
pub use profiler::profile_dataset;
pub use schema_inference::{infer_schema, KnownKey, SchemaInferenceConfig};
pub use scenario_author::author_scenarios;
pub use simulator::{Simulator, SimulatorConfig};
pub use twin_builder::build_twin;
