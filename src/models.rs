use crate::{error::ModelError, sparse::SparseVector};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// On-disk form of a trained linear classifier, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact<L> {
    MultinomialNb {
        classes: Vec<L>,
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
    },
    LogisticRegression {
        classes: Vec<L>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRule {
    MultinomialNb,
    LogisticRegression,
}

impl DecisionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionRule::MultinomialNb => "multinomial_nb",
            DecisionRule::LogisticRegression => "logistic_regression",
        }
    }
}

/// A trained linear model over sparse count features.
///
/// Both supported rules score each class as `bias[c] + weights[c] · x`; Naive
/// Bayes uses log priors and log feature probabilities as bias and weights.
/// Binary logistic regression stores a single row whose sign picks between
/// the two classes.
#[derive(Debug, Clone)]
pub struct Classifier<L> {
    rule: DecisionRule,
    classes: Vec<L>,
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

impl<L: Clone> Classifier<L> {
    pub fn from_artifact(artifact: ClassifierArtifact<L>) -> Result<Self, ModelError> {
        let (rule, classes, rows, bias) = match artifact {
            ClassifierArtifact::MultinomialNb {
                classes,
                class_log_prior,
                feature_log_prob,
            } => (DecisionRule::MultinomialNb, classes, feature_log_prob, class_log_prior),
            ClassifierArtifact::LogisticRegression {
                classes,
                coef,
                intercept,
            } => (DecisionRule::LogisticRegression, classes, coef, intercept),
        };

        if classes.is_empty() {
            return Err(ModelError::Invalid("classifier has no classes".to_string()));
        }

        let binary = rule == DecisionRule::LogisticRegression && rows.len() == 1 && classes.len() == 2;
        if rows.len() != classes.len() && !binary {
            return Err(ModelError::Invalid(format!(
                "{} has {} weight rows for {} classes",
                rule.as_str(),
                rows.len(),
                classes.len()
            )));
        }
        if bias.len() != rows.len() {
            return Err(ModelError::Invalid(format!(
                "{} has {} bias terms for {} weight rows",
                rule.as_str(),
                bias.len(),
                rows.len()
            )));
        }

        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != n_features) {
            return Err(ModelError::Invalid(format!(
                "weight row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                n_features
            )));
        }

        let weights = DMatrix::from_fn(rows.len(), n_features, |r, c| rows[r][c]);
        let bias = DVector::from_vec(bias);

        Ok(Self {
            rule,
            classes,
            weights,
            bias,
        })
    }

    pub fn to_artifact(&self) -> ClassifierArtifact<L> {
        let rows: Vec<Vec<f64>> = self
            .weights
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        let bias = self.bias.iter().copied().collect();
        let classes = self.classes.clone();

        match self.rule {
            DecisionRule::MultinomialNb => ClassifierArtifact::MultinomialNb {
                classes,
                class_log_prior: bias,
                feature_log_prob: rows,
            },
            DecisionRule::LogisticRegression => ClassifierArtifact::LogisticRegression {
                classes,
                coef: rows,
                intercept: bias,
            },
        }
    }
}

impl<L> Classifier<L> {
    pub fn rule(&self) -> DecisionRule {
        self.rule
    }

    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    /// Raw decision scores, one per weight row.
    pub fn decision_scores(&self, x: &SparseVector) -> Result<Vec<f64>, ModelError> {
        if x.width() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.width(),
            });
        }

        let scores = (0..self.weights.nrows())
            .map(|r| {
                x.iter()
                    .fold(self.bias[r], |acc, (j, v)| acc + self.weights[(r, j)] * v)
            })
            .collect();
        Ok(scores)
    }

    pub fn predict(&self, x: &SparseVector) -> Result<&L, ModelError> {
        let scores = self.decision_scores(x)?;

        let index = if scores.len() == 1 && self.classes.len() == 2 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores)
        };

        Ok(&self.classes[index])
    }
}

// first maximum wins
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate().skip(1) {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}
