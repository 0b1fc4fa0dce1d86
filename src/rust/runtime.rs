use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::classifier::ClassifierError;

/// Threading configuration for batch inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Worker threads for inference; 0 lets rayon decide
    pub inference_threads: usize,
}

impl RuntimeConfig {
    pub fn with_threads(inference_threads: usize) -> Self {
        Self { inference_threads }
    }
}

pub fn create_thread_pool(config: &RuntimeConfig) -> Result<ThreadPool, ClassifierError> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("hs-infer-{}", i));

    // Configure threading
    if config.inference_threads > 0 {
        builder = builder.num_threads(config.inference_threads);
    }

    builder
        .build()
        .map_err(|e| ClassifierError::configuration(format!("Failed to build inference pool: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config() {
        let pool = create_thread_pool(&RuntimeConfig::with_threads(2)).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert!(create_thread_pool(&RuntimeConfig::default()).is_ok());
    }
}
