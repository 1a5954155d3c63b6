// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{default_config_path, load_config, load_config_with_env};
pub use settings::{
    Config, GrmConfig, ModelConfig, SchemeSearchConfig, ServerConfig, SpeechConfig, VoiceSettings,
};
