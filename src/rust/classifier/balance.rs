use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::ClassifierError;
use crate::corpus::{Corpus, Label, LabeledExample};

/// Equalizes class counts by resampling the minority class with replacement.
///
/// Returns majority ∪ minority ∪ `|majority| - |minority|` extra minority examples
/// drawn uniformly at random from an RNG seeded with `seed`. Both classes end up
/// at `|majority|` examples. On a tie label 0 is treated as the majority and
/// nothing is drawn.
///
/// # Errors
/// - `DataShapeError` if either class is empty
///
/// # Example
/// ```
/// use hs_classifier::{balance, Corpus, Label, LabeledExample};
///
/// let corpus = Corpus::new(vec![
///     LabeledExample::new("a", Label::Negative),
///     LabeledExample::new("b", Label::Negative),
///     LabeledExample::new("c", Label::Negative),
///     LabeledExample::new("d", Label::Positive),
/// ]);
/// let balanced = balance(&corpus, 101).unwrap();
/// assert_eq!(balanced.count(Label::Negative), 3);
/// assert_eq!(balanced.count(Label::Positive), 3);
/// ```
pub fn balance(corpus: &Corpus, seed: u64) -> Result<Corpus, ClassifierError> {
    let (negatives, positives): (Vec<&LabeledExample>, Vec<&LabeledExample>) =
        corpus.iter().partition(|e| e.label == Label::Negative);

    if negatives.is_empty() || positives.is_empty() {
        return Err(ClassifierError::data_shape(format!(
            "Balancing needs both labels, found {} negative and {} positive examples",
            negatives.len(),
            positives.len()
        )));
    }

    let (majority, minority) = if negatives.len() >= positives.len() {
        (negatives, positives)
    } else {
        (positives, negatives)
    };

    let draws = majority.len() - minority.len();
    let mut rng = StdRng::seed_from_u64(seed);
    let resampled: Vec<LabeledExample> = (0..draws)
        .map(|_| minority[rng.random_range(0..minority.len())].clone())
        .collect();

    info!(
        "Balanced corpus: majority {} ({}), minority {} + {} resampled",
        majority.len(),
        majority[0].label,
        minority.len(),
        draws
    );

    let mut examples = Vec::with_capacity(majority.len() * 2);
    examples.extend(majority.into_iter().cloned());
    examples.extend(minority.into_iter().cloned());
    examples.extend(resampled);
    Ok(Corpus::new(examples))
}
