// Test modules for testgen-llm crate
//
// Each source module has a corresponding test file that focuses on business
// logic verification.

// Shared fixtures: sample tickets, scripted generators, fast retry policies
pub mod helpers;

pub mod client;
pub mod core_types;
pub mod fallback;
pub mod parsers;
pub mod rate_limit;
pub mod response_parser;
