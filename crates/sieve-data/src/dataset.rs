// Sample: a feature/target record, the item type of the built-in transforms

/// A single sample: a pair of (input features, label/target).
///
/// Both are stored as `Vec<f64>` with their associated shapes so they can be
/// batched into tensors later.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Input feature vector (flattened).
    pub features: Vec<f64>,
    /// Shape of the feature tensor (e.g. `[784]` for MNIST, `[3,32,32]` for CIFAR).
    pub feature_shape: Vec<usize>,
    /// Target / label value(s) (flattened).  For classification this is typically
    /// a single-element vec holding the class label as `f64`.
    pub target: Vec<f64>,
    /// Shape of the target tensor (e.g. `[1]` for a class index, `[10]` for one-hot).
    pub target_shape: Vec<usize>,
}

impl Sample {
    /// A sample with flat feature and target shapes.
    pub fn new(features: Vec<f64>, target: Vec<f64>) -> Self {
        let feature_shape = vec![features.len()];
        let target_shape = vec![target.len()];
        Self {
            features,
            feature_shape,
            target,
            target_shape,
        }
    }

    /// A sample whose target is a single label.
    pub fn labeled(features: Vec<f64>, label: f64) -> Self {
        Self::new(features, vec![label])
    }

    /// The first target value, which holds the label for classification data.
    pub fn label(&self) -> Option<f64> {
        self.target.first().copied()
    }
}
