pub mod dsp_stage;
pub mod pcm_backend;
pub mod period_handler;
