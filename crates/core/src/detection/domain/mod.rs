pub mod analysis_fault;
pub mod emotion_classifier;
pub mod facial_feature_detector;
pub mod frame_analyzer;
