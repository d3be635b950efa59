use crate::shared::model_resolver::ModelSpec;

pub const FACE_MODEL: ModelSpec = ModelSpec {
    name: "yolo11n-pose_widerface.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx",
};

pub const EMOTION_MODEL: ModelSpec = ModelSpec {
    name: "emotion-ferplus-8.onnx",
    url: "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx",
};

/// Worker count for batch analysis when none is given.
pub const DEFAULT_BATCH_WORKERS: usize = 4;

/// Workers log their progress every this many frames.
pub const PROGRESS_INTERVAL_FRAMES: usize = 100;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];
