//! End-to-end walkthrough of the knowledge-core and twin-simulation
//! subsystems: load an ontology, build a twin, author and run a scenario,
//! then summarize the run's impact. Mirrors the `mimir-cli` demo as an
//! assertable integration test.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mimir_core::CancellationToken;
use mimir_domain::ontology::OntologyFormat;
use mimir_domain::simulation::RunStatus;
use mimir_graph::backend::InMemoryGraphBackend;
use mimir_graph::GraphMediator;
use mimir_simulation::{analyze_impact, author_scenarios, build_twin, Simulator, SimulatorConfig};
use uuid::Uuid;

const ONTOLOGY: &str = r#"
    @prefix ex: <http://mimir.example/plant#> .
    ex:Plant a owl:Class ;
        rdfs:label "Plant" .
    ex:Line a owl:Class ;
        rdfs:label "Line" .
    ex:hasLine a owl:ObjectProperty ;
        rdfs:domain ex:Plant ;
        rdfs:range ex:Line ;
        rdfs:label "hasLine" .
"#;

#[test]
fn ontology_to_impact_report_round_trip() {
    let ontology_id = Uuid::new_v4();
    let graph_uri = mimir_domain::ontology::Ontology::graph_uri_for(ontology_id);
    let graph = GraphMediator::new(Arc::new(InMemoryGraphBackend::new()));

    let parsed = graph.load_ontology(&graph_uri, ONTOLOGY, OntologyFormat::Turtle).expect("ontology should parse");
    assert_eq!(parsed.classes.len(), 2);
    assert_eq!(parsed.properties.len(), 1);

    let stats = graph.stats().expect("stats should be readable after loading");
    assert!(stats.total_triples > 0);

    let now = Utc::now();
    let twin = build_twin(ontology_id, "plant-twin", "discrete-event", &parsed, &HashMap::new(), now);
    assert!(!twin.entities.is_empty());
    assert!(!twin.relationships.is_empty());

    let scenarios = author_scenarios(&twin, now);
    assert_eq!(scenarios.len(), 3);
    let capacity = scenarios.iter().find(|s| s.scenario_type == "capacity").expect("capacity scenario is always authored");

    let simulator = Simulator::new(SimulatorConfig::default());
    let run = simulator.run(Uuid::new_v4(), &twin, capacity, now, &CancellationToken::new());
    assert_eq!(run.status, RunStatus::Completed);
    assert!(!run.snapshots.is_empty());
    assert_eq!(run.snapshots.first().unwrap().step, 0);

    let report = analyze_impact(&run, &twin, SimulatorConfig::default().propagation_max_depth);
    assert!(report.risk_score >= 0.0 && report.risk_score <= 1.0);
}

#[test]
fn cancelling_before_the_first_step_yields_a_cancelled_run() {
    let ontology_id = Uuid::new_v4();
    let graph = GraphMediator::new(Arc::new(InMemoryGraphBackend::new()));
    let graph_uri = mimir_domain::ontology::Ontology::graph_uri_for(ontology_id);
    let parsed = graph.load_ontology(&graph_uri, ONTOLOGY, OntologyFormat::Turtle).unwrap();

    let now = Utc::now();
    let twin = build_twin(ontology_id, "plant-twin", "discrete-event", &parsed, &HashMap::new(), now);
    let scenarios = author_scenarios(&twin, now);
    let baseline = &scenarios[0];

    let cancel = CancellationToken::new();
    cancel.cancel();

    let simulator = Simulator::new(SimulatorConfig::default());
    let run = simulator.run(Uuid::new_v4(), &twin, baseline, now, &cancel);
    assert_eq!(run.status, RunStatus::Cancelled);
}
