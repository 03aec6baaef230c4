//! Scenario-based tests for bizops

mod critical_failure;
mod fault_isolation;
mod persistence;
mod request_resolution;
