//! Model inference for status predictions

use std::path::Path;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::FeatureMatrix;
use crate::model::{ClassifierConfig, StatusClassifier};
use crate::{RedlistError, Result, StatusPrediction};

/// Predictor for classifying feature batches
///
/// Holds a loaded model for repeated use. For the one-shot load-and-predict
/// path see [`predict`].
pub struct Predictor<B: Backend> {
    model: StatusClassifier<B>,
    config: ClassifierConfig,
    device: B::Device,
}

impl<B: Backend> Predictor<B>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Create a predictor from an already-built model
    pub fn new(model: StatusClassifier<B>, config: ClassifierConfig, device: B::Device) -> Self {
        Predictor {
            model,
            config,
            device,
        }
    }

    /// Load a predictor from a model artifact directory
    pub fn load(model_dir: impl AsRef<Path>, device: B::Device) -> Result<Self> {
        let dir = model_dir.as_ref();
        log::info!("Loading model from {}", dir.display());

        if !dir.is_dir() {
            return Err(RedlistError::ModelLoad {
                path: dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let config = ClassifierConfig::load(dir)?;
        let model = StatusClassifier::load(&device, dir, &config)?;
        Ok(Self::new(model, config, device))
    }

    /// Number of input features the model expects
    pub fn input_dim(&self) -> usize {
        self.config.input_dim
    }

    /// Number of output classes
    pub fn n_classes(&self) -> usize {
        self.config.n_classes
    }

    /// Human-readable class names, if the artifact carries them
    pub fn class_names(&self) -> Option<&[String]> {
        self.config.class_names.as_deref()
    }

    /// Predict the most likely class for each sample
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>> {
        let probabilities = self.predict_probabilities(features)?;
        Ok(probabilities.iter().map(|row| argmax(row)).collect())
    }

    /// Predict labels together with the full per-class distributions
    pub fn predict_with_probabilities(
        &self,
        features: &FeatureMatrix,
    ) -> Result<(Vec<usize>, Vec<Vec<f32>>)> {
        let probabilities = self.predict_probabilities(features)?;
        let labels = probabilities.iter().map(|row| argmax(row)).collect();
        Ok((labels, probabilities))
    }

    /// Run the forward pass and return one probability row per sample
    pub fn predict_probabilities(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f32>>> {
        if features.n_features() != self.config.input_dim {
            return Err(RedlistError::ShapeMismatch {
                expected: self.config.input_dim,
                got: features.n_features(),
            });
        }

        log::debug!(
            "Running inference over {} samples x {} features",
            features.n_samples(),
            features.n_features()
        );

        let input = self.features_to_tensor(features);
        let probs = self.model.forward_probabilities(input);

        let data = probs.into_data();
        let values: &[f32] = data.as_slice().unwrap();
        Ok(values
            .chunks(self.config.n_classes)
            .map(|row| row.to_vec())
            .collect())
    }

    /// Convert a feature matrix to a batch tensor
    fn features_to_tensor(&self, features: &FeatureMatrix) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(features.as_slice(), &self.device)
            .reshape([features.n_samples(), features.n_features()])
    }
}

/// Load a model artifact and classify a feature matrix in one call
///
/// The model is loaded fresh and released when the call returns; nothing is
/// cached. `verbose` raises per-stage diagnostics to info level, without any
/// effect on the result. When `return_probabilities` is set the returned
/// prediction also carries the raw probability matrix.
pub fn predict<B: Backend>(
    features: &FeatureMatrix,
    model_dir: impl AsRef<Path>,
    verbose: bool,
    return_probabilities: bool,
) -> Result<StatusPrediction>
where
    B::Device: Default,
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    let device = B::Device::default();
    let predictor = Predictor::<B>::load(model_dir, device)?;

    if verbose {
        log::info!(
            "Classifying {} samples into {} classes",
            features.n_samples(),
            predictor.n_classes()
        );
    }

    let (labels, probabilities) = predictor.predict_with_probabilities(features)?;

    Ok(StatusPrediction {
        labels,
        probabilities: return_probabilities.then_some(probabilities),
    })
}

/// Index of the largest value in a probability row
///
/// Ties resolve to the earliest index.
fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &value) in row.iter().enumerate() {
        if value > row[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use std::path::PathBuf;

    type TestBackend = NdArray<f32>;

    /// Write a freshly initialized artifact and return its directory
    fn save_artifact(config: &ClassifierConfig) -> (tempfile::TempDir, PathBuf) {
        let device = Default::default();
        let model = StatusClassifier::<TestBackend>::new(&device, config);
        let dir = tempfile::tempdir().unwrap();
        config.save(dir.path()).unwrap();
        model.save(dir.path()).unwrap();
        let path = dir.path().to_path_buf();
        (dir, path)
    }

    fn three_class_config() -> ClassifierConfig {
        ClassifierConfig {
            input_dim: 4,
            hidden_dims: vec![8],
            n_classes: 3,
            dropout: 0.0,
            class_names: None,
        }
    }

    fn two_samples() -> FeatureMatrix {
        FeatureMatrix::from_rows(&[vec![0.1, 0.2, 0.3, 0.4], vec![0.9, 0.8, 0.7, 0.6]]).unwrap()
    }

    #[test]
    fn test_labels_without_probabilities() {
        let (_dir, path) = save_artifact(&three_class_config());
        let features = two_samples();

        let result = predict::<TestBackend>(&features, &path, false, false).unwrap();

        assert_eq!(result.labels.len(), 2);
        assert!(result.probabilities.is_none());
        for label in &result.labels {
            assert!(*label < 3);
        }
    }

    #[test]
    fn test_labels_with_probabilities() {
        let (_dir, path) = save_artifact(&three_class_config());
        let features = two_samples();

        let result = predict::<TestBackend>(&features, &path, false, true).unwrap();

        assert_eq!(result.labels.len(), 2);
        let probs = result.probabilities.unwrap();
        assert_eq!(probs.len(), 2);
        for (row, label) in probs.iter().zip(result.labels.iter()) {
            assert_eq!(row.len(), 3);
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "row sums to {}", sum);
            assert_eq!(argmax(row), *label);
        }
    }

    #[test]
    fn test_invalid_model_path() {
        let features = two_samples();
        let result = predict::<TestBackend>(&features, "no/such/model", false, false);
        assert!(matches!(result, Err(RedlistError::ModelLoad { .. })));
    }

    #[test]
    fn test_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        three_class_config().save(dir.path()).unwrap();

        let features = two_samples();
        let result = predict::<TestBackend>(&features, dir.path(), false, false);
        assert!(matches!(result, Err(RedlistError::ModelLoad { .. })));
    }

    #[test]
    fn test_shape_mismatch() {
        let (_dir, path) = save_artifact(&three_class_config());
        let narrow = FeatureMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();

        let result = predict::<TestBackend>(&narrow, &path, false, false);
        assert!(matches!(
            result,
            Err(RedlistError::ShapeMismatch {
                expected: 4,
                got: 2
            })
        ));
    }

    #[test]
    fn test_predictor_reuse() {
        let (_dir, path) = save_artifact(&three_class_config());
        let predictor = Predictor::<TestBackend>::load(&path, Default::default()).unwrap();

        assert_eq!(predictor.input_dim(), 4);
        assert_eq!(predictor.n_classes(), 3);

        let features = two_samples();
        let first = predictor.predict(&features).unwrap();
        let second = predictor.predict(&features).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_label_count_matches_rows() {
        let (_dir, path) = save_artifact(&ClassifierConfig::default());
        let rows: Vec<Vec<f32>> = (0..7)
            .map(|i| (0..6).map(|j| (i * 6 + j) as f32 / 42.0).collect())
            .collect();
        let features = FeatureMatrix::from_rows(&rows).unwrap();

        let result = predict::<TestBackend>(&features, &path, true, false).unwrap();
        assert_eq!(result.len(), 7);
    }

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.2, 0.5, 0.3]), 1);
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[1.0]), 0);
    }
}
