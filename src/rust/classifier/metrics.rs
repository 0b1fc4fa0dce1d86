use std::fmt;

use crate::corpus::Label;

/// Held-out quality of a trained model, with label 1 as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Evaluation {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
}

impl Evaluation {
    /// Scores `predicted` against `actual`. Both slices must have equal length.
    ///
    /// Precision and recall are 0 when their denominators are 0, and F1 is 0
    /// when precision + recall is 0, so every value stays within `[0, 1]`.
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Self {
        debug_assert_eq!(actual.len(), predicted.len());

        let mut eval = Evaluation::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (Label::Positive, Label::Positive) => eval.true_positives += 1,
                (Label::Negative, Label::Positive) => eval.false_positives += 1,
                (Label::Negative, Label::Negative) => eval.true_negatives += 1,
                (Label::Positive, Label::Negative) => eval.false_negatives += 1,
            }
        }

        eval.precision = ratio(eval.true_positives, eval.true_positives + eval.false_positives);
        eval.recall = ratio(eval.true_positives, eval.true_positives + eval.false_negatives);
        eval.f1 = if eval.precision + eval.recall > 0.0 {
            2.0 * eval.precision * eval.recall / (eval.precision + eval.recall)
        } else {
            0.0
        };
        eval.accuracy = ratio(eval.true_positives + eval.true_negatives, eval.support());
        eval
    }

    /// Number of scored examples
    pub fn support(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "f1={:.4} precision={:.4} recall={:.4} accuracy={:.4} (tp={} fp={} tn={} fn={})",
            self.f1,
            self.precision,
            self.recall,
            self.accuracy,
            self.true_positives,
            self.false_positives,
            self.true_negatives,
            self.false_negatives
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// F1 score of `predicted` against `actual`
pub fn f1_score(actual: &[Label], predicted: &[Label]) -> f64 {
    Evaluation::from_predictions(actual, predicted).f1
}
