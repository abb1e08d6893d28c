use crate::error::ReconError;
use crate::model::{BehaviorClass, FeatureVector};
use crate::schema::Schema;

/// A fitted binary classifier over a fixed schema.
pub trait Classifier: Send + Sync {
    /// Feature names the classifier was fit on, in training order.
    fn schema(&self) -> &Schema;

    /// Short model family name (e.g. `random_forest`).
    fn kind(&self) -> &'static str;

    /// `[p(non_target), p(target)]` for one row.
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ReconError>;

    /// Arg-max of [`Classifier::predict_proba`]; ties resolve to class 0.
    fn predict(&self, features: &FeatureVector) -> Result<BehaviorClass, ReconError> {
        let proba = self.predict_proba(features)?;
        Ok(if proba[1] > proba[0] { BehaviorClass::Target } else { BehaviorClass::NonTarget })
    }
}

/// Reject a vector built against another schema.
pub fn check_schema(expected: &Schema, features: &FeatureVector) -> Result<(), ReconError> {
    if features.schema() == expected {
        return Ok(());
    }
    let (missing, extra) = expected.diff(features.schema());
    Err(ReconError::SchemaMismatch {
        expected: expected.len(),
        found: features.len(),
        missing,
        extra,
    })
}

/// Probabilities must be finite, non-negative, and sum to one.
pub fn check_probabilities(proba: [f64; 2]) -> Result<[f64; 2], ReconError> {
    let sum = proba[0] + proba[1];
    if proba.iter().any(|p| !p.is_finite() || *p < 0.0) || (sum - 1.0).abs() > 1e-6 {
        return Err(ReconError::Prediction(format!(
            "invalid class probabilities [{}, {}]",
            proba[0], proba[1]
        )));
    }
    Ok(proba)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        schema: Schema,
        proba: [f64; 2],
    }

    impl Classifier for Fixed {
        fn schema(&self) -> &Schema {
            &self.schema
        }
        fn kind(&self) -> &'static str {
            "fixed"
        }
        fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ReconError> {
            check_schema(&self.schema, features)?;
            Ok(self.proba)
        }
    }

    #[test]
    fn predict_is_argmax_with_ties_to_non_target() {
        let schema = Schema::new(["a"]).unwrap();
        let v = FeatureVector::new(schema.clone(), vec![0.0]).unwrap();

        let c = Fixed { schema: schema.clone(), proba: [0.3, 0.7] };
        assert_eq!(c.predict(&v).unwrap(), BehaviorClass::Target);
        let c = Fixed { schema, proba: [0.5, 0.5] };
        assert_eq!(c.predict(&v).unwrap(), BehaviorClass::NonTarget);
    }

    #[test]
    fn foreign_schema_is_rejected() {
        let c = Fixed { schema: Schema::new(["a", "b"]).unwrap(), proba: [1.0, 0.0] };
        let v = FeatureVector::new(Schema::new(["b", "c"]).unwrap(), vec![0.0, 0.0]).unwrap();
        match c.predict(&v).unwrap_err() {
            ReconError::SchemaMismatch { missing, extra, .. } => {
                assert_eq!(missing, vec!["a".to_string()]);
                assert_eq!(extra, vec!["c".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn probabilities_are_validated() {
        assert!(check_probabilities([0.25, 0.75]).is_ok());
        assert!(check_probabilities([0.5, 0.6]).is_err());
        assert!(check_probabilities([f64::NAN, 1.0]).is_err());
    }
}
