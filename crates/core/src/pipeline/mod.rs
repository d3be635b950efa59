pub mod analysis_request;
pub mod analyze_video_use_case;
pub mod infrastructure;
pub mod pipeline_error;
pub mod pipeline_logger;
pub mod realtime_session;
pub mod worker_pool;
