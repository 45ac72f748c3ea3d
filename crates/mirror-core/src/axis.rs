//! Coordinate-axis remapping between the producer's and the consumer's
//! 3D conventions.
//!
//! An [`AxisSpec`] is parsed from a compact string such as `"xyz"` or
//! `"x-zy"`. Each of the three output components names the input component it
//! is read from; a `-` prefix or an uppercase letter flips its sign, so
//! `"x-zy"` and `"xZy"` describe the same mapping:
//!
//! ```text
//! "x-zy":  [1, 2, 3]  →  [1, -3, 2]
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::errors::AxisSpecError;

/// Record fields holding positional triples in data collections.
pub const DATA_VECTOR_FIELDS: [&str; 2] = ["location", "scale"];

/// Record fields holding positional triples in scenes.
pub const SCENE_VECTOR_FIELDS: [&str; 1] = ["gravity"];

/// One of the three input components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    /// First component.
    X,
    /// Second component.
    Y,
    /// Third component.
    Z,
}

impl Component {
    /// Index of this component in an input vector.
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            _ => None,
        }
    }
}

/// Sign applied to a remapped component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Keep the value.
    #[default]
    Positive,
    /// Negate the value.
    Negative,
}

impl Sign {
    /// The opposite sign.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

/// How one output component is built from the input vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Axis {
    /// Input component to read.
    pub source: Component,
    /// Sign applied to the value read.
    pub sign: Sign,
}

/// Mapping for all three output components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AxisSpec {
    axes: [Axis; 3],
}

impl AxisSpec {
    /// `output[i] = input[i]`.
    pub const IDENTITY: Self = Self {
        axes: [
            Axis {
                source: Component::X,
                sign: Sign::Positive,
            },
            Axis {
                source: Component::Y,
                sign: Sign::Positive,
            },
            Axis {
                source: Component::Z,
                sign: Sign::Positive,
            },
        ],
    };

    /// Whether this spec leaves every vector unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Remap a numeric vector.
    ///
    /// Components before `offset` are copied through; component `i` at or
    /// after `offset` becomes `vector[axis[i - offset].source] * sign`.
    /// Components past the third axis, or whose source lies outside the
    /// vector, are copied through. The input is not modified.
    pub fn transform(&self, vector: &[f64], offset: usize) -> Vec<f64> {
        self.remap(vector, offset, |value| -value)
    }

    /// Remap a JSON array of numbers.
    ///
    /// Returns `None` when `value` is not an array made only of numbers.
    /// Integer components stay integers.
    pub fn transform_value(&self, value: &Value) -> Option<Value> {
        let items = value.as_array()?;
        if !items.iter().all(Value::is_number) {
            return None;
        }
        Some(Value::Array(self.remap(items, 0, negate_value)))
    }

    /// Remap the named vector fields of a record in place.
    ///
    /// Missing fields stay missing; fields that are not numeric arrays are
    /// left untouched.
    pub fn transform_fields(&self, record: &mut Map<String, Value>, fields: &[&str]) {
        for field in fields {
            let Some(current) = record.get(*field) else {
                continue;
            };
            match self.transform_value(current) {
                Some(remapped) => {
                    let _ = record.insert((*field).to_owned(), remapped);
                }
                None => {
                    tracing::debug!(field, "vector field is not a numeric array, left as is");
                }
            }
        }
    }

    fn remap<T: Clone>(&self, input: &[T], offset: usize, negate: impl Fn(&T) -> T) -> Vec<T> {
        input
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let Some(axis) = i.checked_sub(offset).and_then(|slot| self.axes.get(slot)) else {
                    return value.clone();
                };
                match input.get(axis.source.index()) {
                    Some(source) if axis.sign == Sign::Negative => negate(source),
                    Some(source) => source.clone(),
                    None => value.clone(),
                }
            })
            .collect()
    }
}

impl Default for AxisSpec {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FromStr for AxisSpec {
    type Err = AxisSpecError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut axes = Self::IDENTITY.axes;
        let mut slot = 0;
        let mut pending_sign: Option<usize> = None;

        for (position, ch) in spec.chars().enumerate() {
            if slot == axes.len() {
                break;
            }
            if ch == '-' {
                pending_sign = match pending_sign {
                    Some(_) => None,
                    None => Some(position),
                };
                continue;
            }
            let source = Component::from_letter(ch)
                .ok_or(AxisSpecError::UnknownAxis { position, found: ch })?;
            let mut sign = Sign::Positive;
            if ch.is_ascii_uppercase() {
                sign = sign.flip();
            }
            if pending_sign.take().is_some() {
                sign = sign.flip();
            }
            axes[slot] = Axis { source, sign };
            slot += 1;
        }

        if let Some(position) = pending_sign {
            return Err(AxisSpecError::DanglingSign { position });
        }
        Ok(Self { axes })
    }
}

impl fmt::Display for AxisSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in &self.axes {
            if axis.sign == Sign::Negative {
                f.write_str("-")?;
            }
            write!(f, "{}", axis.source.letter())?;
        }
        Ok(())
    }
}

fn negate_value(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(negate_number(n)),
        other => other.clone(),
    }
}

fn negate_number(n: &Number) -> Number {
    if let Some(neg) = n.as_i64().and_then(i64::checked_neg) {
        return Number::from(neg);
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .unwrap_or_else(|| n.clone())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn spec(s: &str) -> AxisSpec {
        s.parse().unwrap()
    }

    #[test]
    fn identity_spec_parses_to_identity() {
        assert!(spec("xyz").is_identity());
        assert_eq!(AxisSpec::default(), AxisSpec::IDENTITY);
    }

    #[test]
    fn minus_prefix_flips_and_permutes() {
        assert_eq!(spec("x-zy").transform(&[1.0, 2.0, 3.0], 0), vec![1.0, -3.0, 2.0]);
    }

    #[test]
    fn each_position_checked_independently() {
        assert_eq!(spec("-xyz").transform(&[1.0, 2.0, 3.0], 0), vec![-1.0, 2.0, 3.0]);
        assert_eq!(spec("x-yz").transform(&[1.0, 2.0, 3.0], 0), vec![1.0, -2.0, 3.0]);
        assert_eq!(spec("xy-z").transform(&[1.0, 2.0, 3.0], 0), vec![1.0, 2.0, -3.0]);
        assert_eq!(spec("zxy").transform(&[1.0, 2.0, 3.0], 0), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn uppercase_letter_flips_sign() {
        assert_eq!(spec("xZy"), spec("x-zy"));
        assert_eq!(spec("XYZ").transform(&[1.0, 2.0, 3.0], 0), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn minus_and_uppercase_cancel() {
        assert_eq!(spec("x-Zy"), spec("xzy"));
    }

    #[test]
    fn missing_trailing_axes_default_to_identity() {
        assert_eq!(spec("y"), spec("yyz"));
        assert!(spec("").is_identity());
    }

    #[test]
    fn characters_past_third_axis_are_ignored() {
        assert_eq!(spec("zyxw-"), spec("zyx"));
    }

    #[test]
    fn unknown_letter_is_rejected() {
        assert_eq!(
            "xwz".parse::<AxisSpec>(),
            Err(AxisSpecError::UnknownAxis {
                position: 1,
                found: 'w'
            })
        );
    }

    #[test]
    fn trailing_sign_is_rejected() {
        assert_eq!(
            "xy-".parse::<AxisSpec>(),
            Err(AxisSpecError::DanglingSign { position: 2 })
        );
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(spec("xZy").to_string(), "x-zy");
        assert_eq!(AxisSpec::IDENTITY.to_string(), "xyz");
    }

    #[test]
    fn offset_copies_leading_components() {
        let out = spec("-xyz").transform(&[9.0, 1.0, 2.0, 3.0], 1);
        assert_eq!(out[0], 9.0);
        assert_eq!(out.len(), 4);
        // component 1 reads input[0] per the axis source index
        assert_eq!(out[1], -9.0);
    }

    #[test]
    fn components_past_third_axis_pass_through() {
        let out = spec("zyx").transform(&[1.0, 2.0, 3.0, 4.0], 0);
        assert_eq!(out, vec![3.0, 2.0, 1.0, 4.0]);
    }

    #[test]
    fn short_vector_keeps_unreachable_components() {
        let out = spec("zxy").transform(&[1.0, 2.0], 0);
        assert_eq!(out, vec![1.0, 1.0]);
    }

    #[test]
    fn input_is_not_mutated() {
        let input = vec![1.0, 2.0, 3.0];
        let _ = spec("ZYX").transform(&input, 0);
        assert_eq!(input, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn transform_value_keeps_integers() {
        let out = spec("x-zy").transform_value(&json!([1, 2, 3])).unwrap();
        assert_eq!(out, json!([1, -3, 2]));
    }

    #[test]
    fn transform_value_handles_floats() {
        let out = spec("x-zy").transform_value(&json!([0.0, -9.8, 0.5])).unwrap();
        assert_eq!(out, json!([0.0, -0.5, -9.8]));
    }

    #[test]
    fn transform_value_rejects_non_numeric() {
        assert!(AxisSpec::IDENTITY.transform_value(&json!("abc")).is_none());
        assert!(AxisSpec::IDENTITY.transform_value(&json!([1, "2", 3])).is_none());
    }

    #[test]
    fn transform_fields_touches_only_present_fields() {
        let mut record = json!({"location": [1, 2, 3], "rotation": [1, 2, 3]})
            .as_object()
            .cloned()
            .unwrap();
        spec("x-zy").transform_fields(&mut record, &DATA_VECTOR_FIELDS);
        assert_eq!(record["location"], json!([1, -3, 2]));
        assert_eq!(record["rotation"], json!([1, 2, 3]));
        assert!(!record.contains_key("scale"));
    }

    #[test]
    fn transform_fields_leaves_malformed_field() {
        let mut record = json!({"gravity": "down"}).as_object().cloned().unwrap();
        spec("zyx").transform_fields(&mut record, &SCENE_VECTOR_FIELDS);
        assert_eq!(record["gravity"], json!("down"));
    }

    proptest! {
        #[test]
        fn identity_preserves_any_triple(a in -1e6f64..1e6, b in -1e6f64..1e6, c in -1e6f64..1e6) {
            let out = AxisSpec::IDENTITY.transform(&[a, b, c], 0);
            prop_assert_eq!(out, vec![a, b, c]);
        }

        #[test]
        fn full_flip_twice_is_identity(a in -1e6f64..1e6, b in -1e6f64..1e6, c in -1e6f64..1e6) {
            let flip = spec("XYZ");
            let out = flip.transform(&flip.transform(&[a, b, c], 0), 0);
            prop_assert_eq!(out, vec![a, b, c]);
        }
    }
}
