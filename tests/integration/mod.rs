//! Integration tests for the coaudit annotation engine

mod test_utils;

mod cli_run;
mod orchestrator_flow;
mod persistence_roundtrip;
mod reconcile;
mod region_merge;
mod workspace_audit;
