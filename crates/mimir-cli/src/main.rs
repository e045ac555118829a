//! mimir-cli: a self-contained walkthrough of the knowledge-core and
//! twin-simulation subsystems against an in-memory graph, with no
//! Postgres connection required. For the persistence-backed composition
//! root (scheduler, execution monitor, process-wide singletons) see the
//! `mimir` binary at the workspace root.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mimir_core::CancellationToken;
use mimir_domain::ontology::OntologyFormat;
use mimir_graph::backend::InMemoryGraphBackend;
use mimir_graph::GraphMediator;
use mimir_nlq::{NLQueryMediator, StaticAdapter};
use mimir_simulation::{analyze_impact, author_scenarios, build_twin, Simulator, SimulatorConfig};
use uuid::Uuid;

const SAMPLE_ONTOLOGY: &str = r#"
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

fn main() {
    env_logger::init();
    println!("Mimir walkthrough");
    println!("=================");

    let ontology_id = Uuid::new_v4();
    let graph_uri = mimir_domain::ontology::Ontology::graph_uri_for(ontology_id);
    let graph = Arc::new(GraphMediator::new(Arc::new(InMemoryGraphBackend::new())));

    let parsed = match graph.load_ontology(&graph_uri, SAMPLE_ONTOLOGY, OntologyFormat::Turtle) {
        Ok(parsed) => {
            println!("loaded ontology: {} classes, {} properties", parsed.classes.len(), parsed.properties.len());
            parsed
        }
        Err(e) => {
            eprintln!("failed to load ontology: {e}");
            std::process::exit(1);
        }
    };

    let now = Utc::now();
    let twin = build_twin(ontology_id, "plant-twin", "discrete-event", &parsed, &HashMap::new(), now);
    println!("built twin '{}': {} entities, {} relationships", twin.name, twin.entities.len(), twin.relationships.len());

    let scenarios = author_scenarios(&twin, now);
    let scenario = scenarios
        .iter()
        .find(|s| s.scenario_type == "capacity")
        .unwrap_or(&scenarios[0]);
    println!("running scenario '{}' ({} events, duration {})", scenario.name, scenario.events.len(), scenario.duration);

    let simulator = Simulator::new(SimulatorConfig::default());
    let run = simulator.run(Uuid::new_v4(), &twin, scenario, now, &CancellationToken::new());
    println!(
        "run finished with status {:?}: {} events applied, {} snapshots, {} propagations dropped",
        run.status,
        run.metrics.events_processed,
        run.snapshots.len(),
        run.metrics.propagations_dropped
    );

    let report = analyze_impact(&run, &twin, SimulatorConfig::default().propagation_max_depth);
    println!(
        "impact: {:?} overall, risk score {:.2}, {} entities affected",
        report.overall_impact,
        report.risk_score,
        report.affected_entities.len()
    );
    for question in &report.suggested_questions {
        println!("  suggested question: {question}");
    }

    let adapter = StaticAdapter::new("```sparql\nSELECT * WHERE { GRAPH <g> { ?s ?p ?o } }\n```");
    let mediator = NLQueryMediator::new(Arc::new(adapter), graph, 64, Duration::from_secs(300));
    match mediator.ask(ontology_id, &parsed, "how many lines does the plant have?") {
        Ok(result) => println!("nlq answer: {} bindings in {}ms", result.bindings.len(), result.duration_ms),
        Err(e) => eprintln!("nlq query failed: {e}"),
    }
}
