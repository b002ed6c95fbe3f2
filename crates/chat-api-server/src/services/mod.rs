pub mod llm_service;
pub mod memory;
pub mod providers;

pub use llm_service::LlmService;
pub use memory::SessionMemory;
