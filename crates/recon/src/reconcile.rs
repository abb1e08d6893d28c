use crate::encoding::{is_categorical, CategoricalEncoding};
use crate::error::ReconError;
use crate::filler::FillPolicy;
use crate::model::{FeatureVector, FieldValue, InputRecord};
use crate::schema::Schema;

/// Slot value before categorical encoding.
enum Slot<'a> {
    Supplied(&'a FieldValue),
    Filled(f64),
}

/// Map a raw record onto the exact ordered feature vector `schema` describes.
///
/// Supplied schema columns are taken from the record, missing ones come from
/// `filler`, and the categorical columns (sex, handedness, adult_child) are
/// turned into their numeric codes. Encoders for any other column are unused.
/// Keys outside the schema are ignored. Either the full vector is returned or
/// nothing is.
pub fn reconcile(
    record: &InputRecord,
    schema: &Schema,
    encodings: &CategoricalEncoding,
    filler: &mut dyn FillPolicy,
) -> Result<FeatureVector, ReconError> {
    // Slots in schema order: supplied values, else fabricated
    let mut filled = 0usize;
    let slots: Vec<Slot<'_>> = schema
        .names()
        .iter()
        .map(|name| match record.get(name) {
            Some(v) => Slot::Supplied(v),
            None => {
                filled += 1;
                Slot::Filled(filler.fill(name))
            }
        })
        .collect();
    if filled > 0 {
        log::debug!(
            "filled {filled} of {} columns with the {} policy",
            schema.len(),
            filler.name()
        );
    }

    // Encode and coerce to numbers
    let mut columns = Vec::with_capacity(schema.len());
    for (slot, name) in slots.into_iter().zip(schema.names()) {
        let encoded = is_categorical(name) && encodings.contains(name);
        let value = match slot {
            Slot::Supplied(v) if encoded => encodings.encode(name, v)?,
            Slot::Supplied(v) => numeric(name, v)?,
            // a fabricated number is never a label the encoder was fit on
            Slot::Filled(_) if encoded => {
                return Err(ReconError::Encoding { column: name.clone(), value: String::new() });
            }
            Slot::Filled(v) => v,
        };
        columns.push((name.clone(), value));
    }

    let values = schema.align(columns)?;
    FeatureVector::new(schema.clone(), values)
}

fn numeric(column: &str, value: &FieldValue) -> Result<f64, ReconError> {
    value.as_number().ok_or_else(|| ReconError::NonNumeric {
        column: column.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::LabelEncoder;
    use crate::filler::{ConstantFill, FamilyRanges, SeededRangeFill};

    fn schema() -> Schema {
        Schema::new(["acc_x", "acc_y", "acc_z", "sex"]).unwrap()
    }

    fn encodings() -> CategoricalEncoding {
        CategoricalEncoding::new().with("sex", LabelEncoder::new(["Male", "Female"]).unwrap())
    }

    fn complete() -> InputRecord {
        InputRecord::new()
            .with("acc_x", 0.8)
            .with("acc_y", -0.2)
            .with("acc_z", 9.1)
            .with("sex", "Female")
    }

    #[test]
    fn complete_record_keeps_values_in_schema_order() {
        let v = reconcile(&complete(), &schema(), &encodings(), &mut ConstantFill(0.0)).unwrap();
        assert_eq!(v.values(), &[0.8, -0.2, 9.1, 1.0]);
        assert_eq!(v.schema(), &schema());
    }

    #[test]
    fn missing_column_is_filled_from_its_range() {
        let record = InputRecord::new().with("acc_x", 0.8).with("acc_y", -0.2).with("sex", "Female");
        let mut filler = SeededRangeFill::new(FamilyRanges::default(), 3);
        let v = reconcile(&record, &schema(), &encodings(), &mut filler).unwrap();

        assert_eq!(v.len(), 4);
        assert_eq!(v.get("acc_x"), Some(0.8));
        assert_eq!(v.get("acc_y"), Some(-0.2));
        assert_eq!(v.get("sex"), Some(1.0));
        let acc_z = v.get("acc_z").unwrap();
        assert!(FamilyRanges::default().default.contains(acc_z), "acc_z = {acc_z}");
    }

    #[test]
    fn unseen_label_fails_with_column_and_value() {
        let record = complete().with("sex", "Unknown");
        let err = reconcile(&record, &schema(), &encodings(), &mut ConstantFill(0.0)).unwrap_err();
        assert_eq!(err, ReconError::Encoding { column: "sex".into(), value: "Unknown".into() });
        assert_eq!(err.to_string(), "error encoding 'sex': unseen label 'Unknown'");
    }

    #[test]
    fn missing_categorical_is_an_encoding_error() {
        let record = InputRecord::new().with("acc_x", 0.8).with("acc_y", -0.2).with("acc_z", 9.1);
        let err = reconcile(&record, &schema(), &encodings(), &mut ConstantFill(0.0)).unwrap_err();
        assert!(matches!(err, ReconError::Encoding { ref column, ref value } if column == "sex" && value.is_empty()));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let record = complete().with("gyro_x", 4.0).with("subject", "SUBJ_001");
        let v = reconcile(&record, &schema(), &encodings(), &mut ConstantFill(0.0)).unwrap();
        assert_eq!(v.values(), &[0.8, -0.2, 9.1, 1.0]);
    }

    #[test]
    fn text_in_numeric_column_is_rejected_unless_it_parses() {
        let record = complete().with("acc_x", " 0.25 ");
        let v = reconcile(&record, &schema(), &encodings(), &mut ConstantFill(0.0)).unwrap();
        assert_eq!(v.get("acc_x"), Some(0.25));

        let record = complete().with("acc_x", "fast");
        let err = reconcile(&record, &schema(), &encodings(), &mut ConstantFill(0.0)).unwrap_err();
        assert_eq!(err, ReconError::NonNumeric { column: "acc_x".into(), value: "fast".into() });
    }

    #[test]
    fn column_without_encoder_passes_numbers_through() {
        let schema = Schema::new(["handedness", "age"]).unwrap();
        let record = InputRecord::new().with("handedness", 1.0).with("age", 28.0);
        let v = reconcile(&record, &schema, &CategoricalEncoding::new(), &mut ConstantFill(0.0)).unwrap();
        assert_eq!(v.values(), &[1.0, 28.0]);
    }

    #[test]
    fn only_categorical_columns_are_encoded() {
        let schema = Schema::new(["age", "sex"]).unwrap();
        let encodings = encodings().with("age", LabelEncoder::new(["28", "30"]).unwrap());
        let record = InputRecord::new().with("age", 30.0).with("sex", "Male");
        let v = reconcile(&record, &schema, &encodings, &mut ConstantFill(0.0)).unwrap();
        assert_eq!(v.values(), &[30.0, 0.0]);
    }

    #[test]
    fn numeric_looking_labels_match_their_class_text() {
        let schema = Schema::new(["acc_z", "handedness"]).unwrap();
        let encodings = CategoricalEncoding::new()
            .with("handedness", LabelEncoder::new(["01", "1.0"]).unwrap());
        for (raw, code) in [("01", 0.0), ("1.0", 1.0)] {
            let record: InputRecord = [("acc_z", "9.5"), ("handedness", raw)]
                .into_iter()
                .filter_map(|(c, cell)| FieldValue::parse_cell(c, cell).map(|v| (c.to_string(), v)))
                .collect();
            let v = reconcile(&record, &schema, &encodings, &mut ConstantFill(0.0)).unwrap();
            assert_eq!(v.values(), &[9.5, code], "{raw}");
        }
    }

    #[test]
    fn reconciling_twice_is_bit_identical() {
        let record = complete();
        let a = reconcile(&record, &schema(), &encodings(), &mut SeededRangeFill::new(FamilyRanges::default(), 9)).unwrap();
        let b = reconcile(&record, &schema(), &encodings(), &mut SeededRangeFill::new(FamilyRanges::default(), 9)).unwrap();
        let bits = |v: &FeatureVector| v.values().iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }
}
