//! Box geometry shared by the ONNX detection backends.

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy non-maximum suppression.
///
/// Sorts `items` by descending score and keeps an item only if its IoU with
/// every kept item is at or below `iou_thresh`.
pub fn nms<T: Clone>(
    items: &mut [T],
    bbox: impl Fn(&T) -> [f64; 4],
    score: impl Fn(&T) -> f64,
    iou_thresh: f64,
) -> Vec<T> {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<T> = Vec::new();
    for item in items.iter() {
        let b = bbox(item);
        if keep.iter().all(|k| bbox_iou(&bbox(k), &b) <= iou_thresh) {
            keep.push(item.clone());
        }
    }
    keep
}
