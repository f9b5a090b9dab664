pub mod gateway;
pub mod interpreter;
pub mod prompts;
pub mod turns;
