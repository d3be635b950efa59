/// Brow/eye locator built on a YOLO face-pose model via `ort`.
///
/// The model reports face boxes with five landmarks (left eye, right eye,
/// nose, mouth corners). Each visible eye landmark becomes an eye box sized
/// relative to the face width, and a brow box is placed directly above it.
/// Eyes whose landmark confidence is too low are not reported, so a face
/// turned away yields no eye regions.
use std::path::Path;

use crate::detection::domain::analysis_fault::AnalysisFault;
use crate::detection::domain::facial_feature_detector::{FacialFeatureDetector, FacialFeatures};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::execution_provider::preferred_execution_providers;
use super::math::nms;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.4;

const NMS_IOU_THRESH: f64 = 0.45;

/// 5 landmarks × (x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Eye box side as a fraction of face width.
const EYE_BOX_RATIO: f64 = 0.24;

/// Brow box height as a fraction of face width.
const BROW_HEIGHT_RATIO: f64 = 0.12;

pub struct OnnxYoloFeatureDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloFeatureDetector {
    /// Loads the model. The input resolution is read from the model's NCHW
    /// input shape, falling back to 640 when it is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .with_intra_threads(1)?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>, AnalysisFault> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value =
            ort::value::Tensor::from_array(input_tensor).map_err(AnalysisFault::backend)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(AnalysisFault::backend)?;
        if outputs.len() == 0 {
            return Err(AnalysisFault::backend("face model produced no outputs"));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(AnalysisFault::backend)?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(AnalysisFault::Backend(format!(
                "unexpected face model output shape: {shape:?}"
            )));
        }

        // [1, features, detections] (transposed) or [1, detections, features]
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let data: Vec<f32> = tensor.iter().copied().collect();

        let mut candidates = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(c) = parse_row(&row, self.confidence, scale, pad_x, pad_y) {
                candidates.push(c);
            }
        }

        Ok(nms(
            &mut candidates,
            |c| c.bbox,
            |c| c.confidence,
            NMS_IOU_THRESH,
        ))
    }
}

impl FacialFeatureDetector for OnnxYoloFeatureDetector {
    fn detect(&mut self, frame: &Frame) -> Result<FacialFeatures, AnalysisFault> {
        let faces = self.infer(frame)?;
        let mut features = FacialFeatures::default();
        for face in &faces {
            let face_w = face.bbox[2] - face.bbox[0];
            for eye in face.eyes.iter().flatten() {
                let (eye_box, brow_box) = eye_and_brow(*eye, face_w);
                features.eyes.push(eye_box);
                features.brows.push(brow_box);
            }
        }
        Ok(features)
    }
}

#[derive(Clone, Debug)]
struct FaceCandidate {
    bbox: [f64; 4],
    confidence: f64,
    /// Left and right eye centers in frame coordinates, when visible.
    eyes: [Option<(f64, f64)>; 2],
}

/// Parses one detection row `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`
/// from letterbox space into frame coordinates.
fn parse_row(
    row: &[f32],
    min_confidence: f64,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
) -> Option<FaceCandidate> {
    if row.len() < 5 {
        return None;
    }
    let confidence = row[4] as f64;
    if confidence < min_confidence {
        return None;
    }

    let unletterbox = |x: f64, y: f64| ((x - pad_x as f64) / scale, (y - pad_y as f64) / scale);
    let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
    let (x1, y1) = unletterbox(cx - w / 2.0, cy - h / 2.0);
    let (x2, y2) = unletterbox(cx + w / 2.0, cy + h / 2.0);

    let mut eyes = [None, None];
    if row.len() >= 5 + NUM_KEYPOINT_VALUES {
        for (k, eye) in eyes.iter_mut().enumerate() {
            let base = 5 + k * 3;
            if row[base + 2] as f64 >= KEYPOINT_CONF_THRESH {
                *eye = Some(unletterbox(row[base] as f64, row[base + 1] as f64));
            }
        }
    }

    Some(FaceCandidate {
        bbox: [x1, y1, x2, y2],
        confidence,
        eyes,
    })
}

/// Eye box centered on the landmark, brow box stacked directly above it.
fn eye_and_brow(eye: (f64, f64), face_w: f64) -> (Region, Region) {
    let half = face_w * EYE_BOX_RATIO / 2.0;
    let (ex, ey) = eye;
    let eye_box = Region::from_corners(ex - half, ey - half, ex + half, ey + half);
    let brow_top = ey - half - face_w * BROW_HEIGHT_RATIO;
    let brow_box = Region::from_corners(ex - half, brow_top, ex + half, ey - half);
    (eye_box, brow_box)
}

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padded with 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row_with_eyes(left_conf: f32, right_conf: f32) -> Vec<f32> {
        let mut row = vec![320.0, 320.0, 200.0, 200.0, 0.9];
        row.extend_from_slice(&[280.0, 300.0, left_conf]);
        row.extend_from_slice(&[360.0, 300.0, right_conf]);
        row.extend_from_slice(&[320.0, 340.0, 0.9]);
        row.extend_from_slice(&[290.0, 380.0, 0.9]);
        row.extend_from_slice(&[350.0, 380.0, 0.9]);
        row
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, scale, pad_x, pad_y) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(scale, 3.2, epsilon = 0.01);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 160);
    }

    #[test]
    fn test_letterbox_pads_with_gray() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, _, _, pad_y) = letterbox(&frame, 640);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, pad_y as usize + 1, 1]], 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_parse_row_rejects_low_confidence() {
        let mut row = row_with_eyes(0.9, 0.9);
        row[4] = 0.1;
        assert!(parse_row(&row, 0.4, 1.0, 0, 0).is_none());
    }

    #[test]
    fn test_parse_row_maps_out_of_letterbox() {
        let row = row_with_eyes(0.9, 0.9);
        let face = parse_row(&row, 0.4, 2.0, 0, 100).unwrap();
        assert_relative_eq!(face.bbox[0], 110.0);
        assert_relative_eq!(face.bbox[1], 60.0);
        let (lx, ly) = face.eyes[0].unwrap();
        assert_relative_eq!(lx, 140.0);
        assert_relative_eq!(ly, 100.0);
    }

    #[test]
    fn test_parse_row_hides_low_confidence_eyes() {
        let face = parse_row(&row_with_eyes(0.2, 0.9), 0.4, 1.0, 0, 0).unwrap();
        assert!(face.eyes[0].is_none());
        assert!(face.eyes[1].is_some());
    }

    #[test]
    fn test_parse_row_without_keypoints_has_no_eyes() {
        let face = parse_row(&[320.0, 320.0, 100.0, 100.0, 0.9], 0.4, 1.0, 0, 0).unwrap();
        assert!(face.eyes.iter().all(Option::is_none));
    }

    #[test]
    fn test_brow_sits_directly_above_eye() {
        let (eye, brow) = eye_and_brow((100.0, 100.0), 100.0);
        assert_eq!(eye.y, 88);
        assert_eq!(brow.bottom(), eye.y);
        assert!(brow.height > 0);
        assert_eq!(brow.x, eye.x);
    }
}
