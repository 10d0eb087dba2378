pub mod audio_models;
pub mod config;
pub mod error;
pub mod hw_params;
pub mod recording_result;
pub mod sample_format;
pub mod state;
