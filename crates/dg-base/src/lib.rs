pub mod code_block;
pub mod config;
pub mod markdown;
pub mod pointer;
pub mod prompts;
pub mod search;
pub mod timer;
pub mod typing;
