/// FER+ emotion classifier using ONNX Runtime via `ort`.
///
/// The model takes a `[1, 1, 64, 64]` grayscale tensor (raw 0–255 values)
/// and returns eight logits in FER+ order. Scores are softmaxed, mapped onto
/// the seven domain emotions (contempt is dropped) and expressed as
/// percentages.
use std::path::Path;

use crate::detection::domain::analysis_fault::AnalysisFault;
use crate::detection::domain::emotion_classifier::{ClassifierPayload, EmotionClassifier};
use crate::shared::emotion::Emotion;
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;

const INPUT_SIZE: u32 = 64;

/// Crops smaller than this on either side are rejected as invalid regions.
pub const MIN_REGION_SIDE: u32 = 16;

/// FER+ output order mapped onto domain emotions; `None` marks contempt.
const FERPLUS_LABELS: [Option<Emotion>; 8] = [
    Some(Emotion::Neutral),
    Some(Emotion::Happy),
    Some(Emotion::Surprise),
    Some(Emotion::Sad),
    Some(Emotion::Angry),
    Some(Emotion::Disgust),
    Some(Emotion::Fear),
    None,
];

pub struct OnnxEmotionClassifier {
    session: ort::session::Session,
}

impl OnnxEmotionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .with_intra_threads(1)?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }

    fn infer(&mut self, image: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
        let tensor = preprocess(image);
        let input_value = ort::value::Tensor::from_array(tensor).map_err(AnalysisFault::backend)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(AnalysisFault::backend)?;
        if outputs.len() == 0 {
            return Err(AnalysisFault::backend("emotion model produced no outputs"));
        }
        let logits = outputs[0]
            .try_extract_array::<f32>()
            .map_err(AnalysisFault::backend)?;
        let logits: Vec<f32> = logits.iter().copied().collect();
        Ok(to_payload(&logits))
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify_region(&mut self, crop: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
        if crop.width() < MIN_REGION_SIDE || crop.height() < MIN_REGION_SIDE {
            return Err(AnalysisFault::InvalidRegion(format!(
                "{}x{} below {MIN_REGION_SIDE}px",
                crop.width(),
                crop.height()
            )));
        }
        self.infer(crop)
    }

    fn classify_frame(&mut self, frame: &Frame) -> Result<ClassifierPayload, AnalysisFault> {
        self.infer(frame)
    }
}

/// Grayscale + bilinear resize to the model input, NCHW float32.
fn preprocess(image: &Frame) -> ndarray::Array4<f32> {
    let gray = to_luma(image);
    let resized = image::imageops::resize(
        &gray,
        INPUT_SIZE,
        INPUT_SIZE,
        image::imageops::FilterType::Triangle,
    );
    let side = INPUT_SIZE as usize;
    ndarray::Array4::from_shape_fn((1, 1, side, side), |(_, _, y, x)| {
        resized.get_pixel(x as u32, y as u32).0[0] as f32
    })
}

fn to_luma(image: &Frame) -> image::GrayImage {
    let src = image.as_ndarray();
    let channels = image.channels() as usize;
    image::GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let (row, col) = (y as usize, x as usize);
        let value = if channels >= 3 {
            let r = src[[row, col, 0]] as f32;
            let g = src[[row, col, 1]] as f32;
            let b = src[[row, col, 2]] as f32;
            0.299 * r + 0.587 * g + 0.114 * b
        } else {
            src[[row, col, 0]] as f32
        };
        image::Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Softmax over the FER+ logits, remapped to [`Emotion::ALL`] order as
/// percentages. A logit vector of the wrong length yields a payload without
/// scores, which normalization rejects.
fn to_payload(logits: &[f32]) -> ClassifierPayload {
    if logits.len() != FERPLUS_LABELS.len() {
        return ClassifierPayload::default();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f32 = exp.iter().sum();

    let mut scores = vec![0.0f32; Emotion::COUNT];
    for (label, e) in FERPLUS_LABELS.iter().zip(&exp) {
        if let Some(emotion) = label {
            let slot = Emotion::ALL
                .iter()
                .position(|candidate| candidate == emotion)
                .unwrap_or_default();
            scores[slot] = e / total * 100.0;
        }
    }
    ClassifierPayload::from_scores(scores)
}
