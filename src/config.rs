//! Configuration structures for the models
//!
//! Each model has its own hyperparameter struct whose `Default` is the
//! reference setting. `load_config` reads all of them from one JSON file in
//! which every section, and every field inside a section, is optional.
//!
//! # Example
//!
//! ```json
//! {
//!   "regression": { "hidden_size": 64, "learning_rate": 0.02 },
//!   "language_id": { "max_epochs": 10 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{NnError, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PerceptronConfig {
    /// Upper bound on passes over the data when no mistake-free pass happens.
    pub max_passes: usize,
}

impl Default for PerceptronConfig {
    fn default() -> Self {
        Self { max_passes: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    pub hidden_size: usize,
    pub learning_rate: f32,
    pub batch_size: usize,
    /// Training stops once the loss over the whole dataset is below this.
    pub loss_threshold: f32,
    pub max_epochs: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            hidden_size: 512,
            learning_rate: 0.05,
            batch_size: 200,
            loss_threshold: 0.02,
            max_epochs: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DigitClassificationConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_classes: usize,
    pub learning_rate: f32,
    pub batch_size: usize,
    /// Validation accuracy at which training stops.
    pub target_accuracy: f32,
    pub max_epochs: usize,
}

impl Default for DigitClassificationConfig {
    fn default() -> Self {
        Self {
            input_size: 784,
            hidden_size: 256,
            num_classes: 10,
            learning_rate: 0.5,
            batch_size: 100,
            target_accuracy: 0.97,
            max_epochs: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LanguageIdConfig {
    pub num_chars: usize,
    pub hidden_size: usize,
    /// Class names, in output column order.
    pub languages: Vec<String>,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub target_accuracy: f32,
    /// Checked before the accuracy target.
    pub max_epochs: usize,
}

impl Default for LanguageIdConfig {
    fn default() -> Self {
        Self {
            num_chars: 47,
            hidden_size: 256,
            languages: ["English", "Spanish", "Finnish", "Dutch", "Polish"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            learning_rate: 0.1,
            batch_size: 100,
            target_accuracy: 0.86,
            max_epochs: 30,
        }
    }
}

/// All model configurations, as read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub perceptron: PerceptronConfig,
    pub regression: RegressionConfig,
    pub digit_classification: DigitClassificationConfig,
    pub language_id: LanguageIdConfig,
}

/// Loads and validates a configuration file.
///
/// # Examples
///
/// ```no_run
/// use rust_neural_models::config::load_config;
///
/// let cfg = load_config("config/models.json").unwrap();
/// assert_eq!(cfg.regression.batch_size, 200);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ModelsConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ModelsConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks every section of `config`.
pub fn validate_config(config: &ModelsConfig) -> Result<()> {
    config.perceptron.validate()?;
    config.regression.validate()?;
    config.digit_classification.validate()?;
    config.language_id.validate()
}

fn invalid(message: impl Into<String>) -> NnError {
    NnError::Config(message.into())
}

fn check_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(invalid(format!("{name} must be positive")));
    }
    Ok(())
}

fn check_learning_rate(name: &str, value: f32) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(format!("{name}.learning_rate must be positive")));
    }
    Ok(())
}

fn check_accuracy(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{name}.target_accuracy must be in [0, 1]")));
    }
    Ok(())
}

impl PerceptronConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("perceptron.max_passes", self.max_passes)
    }
}

impl RegressionConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("regression.hidden_size", self.hidden_size)?;
        check_positive("regression.batch_size", self.batch_size)?;
        check_positive("regression.max_epochs", self.max_epochs)?;
        check_learning_rate("regression", self.learning_rate)?;
        if !(self.loss_threshold.is_finite() && self.loss_threshold > 0.0) {
            return Err(invalid("regression.loss_threshold must be positive"));
        }
        Ok(())
    }
}

impl DigitClassificationConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("digit_classification.input_size", self.input_size)?;
        check_positive("digit_classification.hidden_size", self.hidden_size)?;
        check_positive("digit_classification.num_classes", self.num_classes)?;
        check_positive("digit_classification.batch_size", self.batch_size)?;
        check_positive("digit_classification.max_epochs", self.max_epochs)?;
        check_learning_rate("digit_classification", self.learning_rate)?;
        check_accuracy("digit_classification", self.target_accuracy)
    }
}

impl LanguageIdConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("language_id.num_chars", self.num_chars)?;
        check_positive("language_id.hidden_size", self.hidden_size)?;
        check_positive("language_id.batch_size", self.batch_size)?;
        check_positive("language_id.max_epochs", self.max_epochs)?;
        check_learning_rate("language_id", self.learning_rate)?;
        check_accuracy("language_id", self.target_accuracy)?;
        if self.languages.is_empty() {
            return Err(invalid("language_id.languages must not be empty"));
        }
        Ok(())
    }
}
