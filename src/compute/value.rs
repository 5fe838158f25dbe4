//! Runtime values: scalars, element-wise series and tuples, with
//! scalar/series broadcasting.

use super::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Series(Vec<f64>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Series(v) => v.len(),
            Value::Tuple(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Broadcasting accessor: scalars repeat, series clamp to their last
    /// element when indexed past the end.
    #[inline(always)]
    pub fn get_at(&self, i: usize) -> f64 {
        match self {
            Value::Scalar(s) => *s,
            Value::Series(v) => *v.get(i).unwrap_or_else(|| v.last().unwrap_or(&0.0)),
            Value::Tuple(_) => f64::NAN,
        }
    }

    pub fn as_scalar(&self) -> Result<f64, EvalError> {
        match self {
            Value::Scalar(s) => Ok(*s),
            Value::Series(v) if v.len() == 1 => Ok(v[0]),
            other => Err(EvalError::Shape(format!(
                "expected a scalar, got a value of length {}",
                other.len()
            ))),
        }
    }

    fn is_tuple(&self) -> bool {
        matches!(self, Value::Tuple(_))
    }

    /// Broadcast length of an element-wise operation over `values`.
    fn broadcast_len(values: &[&Value]) -> Result<usize, EvalError> {
        if let Some(t) = values.iter().find(|v| v.is_tuple()) {
            return Err(EvalError::Shape(format!(
                "tuple of {} value(s) used as a numeric operand",
                t.len()
            )));
        }
        if values.iter().any(|v| v.is_empty()) {
            return Err(EvalError::Shape(
                "empty series used as a numeric operand".to_string(),
            ));
        }
        Ok(values.iter().map(|v| v.len()).max().unwrap_or(1))
    }

    /// Element-wise combination of two values. The result is a scalar only
    /// when both inputs are scalars.
    pub fn zip_with(
        &self,
        other: &Value,
        f: impl Fn(f64, f64) -> Result<f64, EvalError>,
    ) -> Result<Value, EvalError> {
        let len = Self::broadcast_len(&[self, other])?;
        if let (Value::Scalar(a), Value::Scalar(b)) = (self, other) {
            return Ok(Value::Scalar(f(*a, *b)?));
        }
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(f(self.get_at(i), other.get_at(i))?);
        }
        Ok(Value::Series(out))
    }

    /// Element-wise map over a single value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Result<Value, EvalError> {
        match self {
            Value::Scalar(s) => Ok(Value::Scalar(f(*s))),
            Value::Series(v) => Ok(Value::Series(v.iter().map(|&x| f(x)).collect())),
            Value::Tuple(_) => Err(EvalError::Shape(
                "tuple used as a numeric operand".to_string(),
            )),
        }
    }

    /// Element-wise three-way select: where `mask` is non-zero pick from
    /// `a`, otherwise from `b`.
    pub fn select(mask: &Value, a: &Value, b: &Value) -> Result<Value, EvalError> {
        let len = Self::broadcast_len(&[mask, a, b])?;
        if len == 1 && matches!(mask, Value::Scalar(_)) {
            let picked = if mask.get_at(0) != 0.0 { a } else { b };
            return Ok(Value::Scalar(picked.get_at(0)));
        }
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(if mask.get_at(i) != 0.0 {
                a.get_at(i)
            } else {
                b.get_at(i)
            });
        }
        Ok(Value::Series(out))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Series(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_series_broadcast() {
        let s = Value::Scalar(2.0);
        let v = Value::Series(vec![1.0, 2.0, 3.0]);
        let out = v.zip_with(&s, |a, b| Ok(a * b)).unwrap();
        assert_eq!(out, Value::Series(vec![2.0, 4.0, 6.0]));
    }

    #[test]
    fn scalars_stay_scalar() {
        let out = Value::Scalar(3.0)
            .zip_with(&Value::Scalar(4.0), |a, b| Ok(a + b))
            .unwrap();
        assert_eq!(out, Value::Scalar(7.0));
    }

    #[test]
    fn select_broadcasts_the_mask() {
        let mask = Value::Series(vec![1.0, 0.0, 1.0]);
        let out = Value::select(&mask, &Value::Scalar(10.0), &Value::Scalar(20.0)).unwrap();
        assert_eq!(out, Value::Series(vec![10.0, 20.0, 10.0]));
    }

    #[test]
    fn empty_series_operand_is_a_shape_error() {
        let empty = Value::Series(Vec::new());
        assert!(matches!(
            empty.zip_with(&Value::Scalar(1.0), |a, b| Ok(a + b)),
            Err(EvalError::Shape(_))
        ));
        assert!(matches!(
            Value::select(&empty, &Value::Scalar(1.0), &Value::Scalar(2.0)),
            Err(EvalError::Shape(_))
        ));
    }

    #[test]
    fn tuple_operand_is_a_shape_error() {
        let t = Value::Tuple(vec![Value::Scalar(1.0)]);
        assert!(t.map(|x| x).is_err());
        assert!(t.zip_with(&Value::Scalar(1.0), |a, b| Ok(a + b)).is_err());
    }
}
