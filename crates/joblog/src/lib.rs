// Module structure for the job log engine.

// Rendering
pub mod parser;
pub mod logs;

// Live job logs
pub mod client;
pub mod job;
pub mod state;

// Process
pub mod cli;
pub mod conf;
pub mod runtime;
