mod execution_provider;
mod math;
pub mod onnx_emotion_classifier;
pub mod onnx_yolo_feature_detector;
