pub mod dsp_feeder;
pub mod peak_meter;
pub mod wav_recorder;
