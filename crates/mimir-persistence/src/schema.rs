//! Diesel schema for the eleven tables of §6. Hand-written rather than
//! `diesel print-schema` output, same as the table this crate was grounded
//! on; replace with generated output once a real database is wired in.

diesel::table! {
    ontologies (id) {
        id -> Uuid,
        name -> Text,
        version -> Text,
        format -> Text,
        base_uri -> Text,
        source_text -> Text,
        graph_uri -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    digital_twins (id) {
        id -> Uuid,
        ontology_id -> Uuid,
        name -> Text,
        model_type -> Text,
        base_state -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    twin_entities (id) {
        id -> Uuid,
        twin_id -> Uuid,
        uri -> Text,
        type_uri -> Text,
        label -> Text,
        properties -> Jsonb,
        state -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    twin_relationships (id) {
        id -> Uuid,
        twin_id -> Uuid,
        source_uri -> Text,
        target_uri -> Text,
        type_uri -> Text,
        strength -> Double,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    simulation_scenarios (id) {
        id -> Uuid,
        twin_id -> Uuid,
        name -> Text,
        scenario_type -> Text,
        events -> Jsonb,
        duration -> Integer,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    simulation_runs (id) {
        id -> Uuid,
        twin_id -> Uuid,
        scenario_id -> Uuid,
        status -> Text,
        start_time -> Timestamptz,
        end_time -> Nullable<Timestamptz>,
        metrics -> Jsonb,
        events_log -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    simulation_snapshots (id) {
        id -> Uuid,
        run_id -> Uuid,
        step -> Integer,
        snapshot_time -> Timestamptz,
        state -> Jsonb,
        global_metrics -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    scheduled_jobs (id) {
        id -> Uuid,
        name -> Text,
        pipeline_id -> Text,
        cron_expr -> Text,
        enabled -> Bool,
        next_run -> Nullable<Timestamptz>,
        last_run -> Nullable<Timestamptz>,
        last_result -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    execution_logs (id) {
        id -> Uuid,
        job_id -> Nullable<Uuid>,
        pipeline_id -> Text,
        run_fingerprint -> Nullable<Text>,
        status -> Text,
        message -> Nullable<Text>,
        started_at -> Timestamptz,
        finished_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    pipelines (id) {
        id -> Text,
        name -> Text,
        schedule -> Nullable<Text>,
        config -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    plugin_config (id) {
        id -> Uuid,
        plugin_type -> Text,
        plugin_name -> Text,
        config -> Jsonb,
        enabled -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    ontologies,
    digital_twins,
    twin_entities,
    twin_relationships,
    simulation_scenarios,
    simulation_runs,
    simulation_snapshots,
    scheduled_jobs,
    execution_logs,
    pipelines,
    plugin_config,
);

diesel::joinable!(digital_twins -> ontologies (ontology_id));
diesel::joinable!(twin_entities -> digital_twins (twin_id));
diesel::joinable!(twin_relationships -> digital_twins (twin_id));
diesel::joinable!(simulation_scenarios -> digital_twins (twin_id));
diesel::joinable!(simulation_snapshots -> simulation_runs (run_id));
