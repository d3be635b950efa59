pub mod emotion_tally;
pub mod frame_analysis_worker;
pub mod global_result;
pub mod partitioner;
pub mod result_aggregator;
