pub mod aggregator;
pub mod base;
// statistic structures
pub mod stat;
// state machine and registry of circuits
pub mod circuitbreaker;
pub mod command;
pub mod config;
pub mod harness;
pub mod isolation;
