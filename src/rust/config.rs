use crate::classifier::DEFAULT_SEED;
use crate::corpus::CorpusSchema;

/// Explicit configuration of a training pipeline run.
///
/// Nothing here is read from the environment; the CLI fills it from flags.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Column names of the training table
    pub schema: CorpusSchema,
    /// Whether to equalize class counts before training
    pub balance: bool,
    pub balance_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: CorpusSchema::default(),
            balance: true,
            balance_seed: DEFAULT_SEED,
        }
    }
}

impl PipelineConfig {
    pub fn with_schema(mut self, schema: CorpusSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_balance(mut self, balance: bool) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_balance_seed(mut self, seed: u64) -> Self {
        self.balance_seed = seed;
        self
    }
}
