use crate::error::Result;
use crate::model::AssetRecord;

/// Pretty-printed JSON array of records, 1:1 with the input.
pub fn write_json(records: &[AssetRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_empty_input_is_an_empty_array() {
        let bytes = write_json(&[]).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, Value::Array(vec![]));
    }
}
