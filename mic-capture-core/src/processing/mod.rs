pub mod frame_accumulator;
pub mod samples;
pub mod wav_format;
