pub mod engine;
pub mod frame;
pub mod handoff;
pub mod pipeline;
pub mod placeholder;
