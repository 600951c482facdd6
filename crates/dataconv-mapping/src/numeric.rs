use dataconv_record::Value;

/// Read a scalar as a number, accepting numeric strings
#[allow(clippy::cast_precision_loss)]
pub(crate) fn value_to_f64(value: &Value, label: &str) -> crate::Result<f64> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Decimal(d) => Ok(*d),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            crate::Error::Transform(format!("Cannot parse {label} value '{s}' as number"))
        }),
        other => Err(crate::Error::Transform(format!(
            "Expected a number for {label}, found {}",
            other.kind()
        ))),
    }
}

/// Narrow a whole float back to an integer so `2 * 3` stays `6`
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::Integer(number as i64)
    } else {
        Value::Decimal(number)
    }
}
