pub mod settings;

pub use settings::{
    GroqConfig, LlmConfig, MemoryConfig, OllamaConfig, SecurityConfig, ServerConfig, Settings,
};
