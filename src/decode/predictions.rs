//! `getStopPredictions` documents: one stop and its upcoming `<pre>` arrivals.

use tracing::debug;

use super::{as_text, child_text, element_children, fold_children, parse_document};
use crate::error::DecodeError;
use crate::model::StopPrediction;

const PREDICTION: &str = "pre";

/// Decodes the arrival predictions for one stop.
///
/// Each record is stamped with the stop's `id` and `nm`, and its `pt` is cut down to
/// the leading token (`"5 MIN"` becomes `"5"`).
pub fn decode_stop_predictions(xml: &[u8]) -> Result<Vec<StopPrediction>, DecodeError> {
    let doc = parse_document(as_text(xml)?)?;
    let root = doc.root_element();

    let stop_id = child_text(root, "id");
    let stop_name = child_text(root, "nm");

    let predictions: Vec<StopPrediction> = element_children(root)
        .filter(|n| n.has_tag_name(PREDICTION))
        .map(|n| {
            let mut prediction = StopPrediction::from_fields(fold_children(n));
            prediction.stop_id = stop_id.clone();
            prediction.stop_name = stop_name.clone();
            prediction.pt = leading_token(&prediction.pt).to_string();
            prediction
        })
        .collect();

    debug!(%stop_id, predictions = predictions.len(), "Decoded stop predictions");
    Ok(predictions)
}

fn leading_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or_default()
}
