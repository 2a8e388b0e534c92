use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{BufReader, Write};

use crate::error::CacheError;

/// Serialize a value with bincode and gzip the result.
pub fn pack<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CacheError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());

    serialize_into(&mut encoder, value).map_err(|e| CacheError::Encode(e.to_string()))?;
    encoder.flush().map_err(|e| CacheError::Encode(e.to_string()))?;

    encoder.finish().map_err(|e| CacheError::Encode(e.to_string()))
}

/// Inverse of [`pack`].
pub fn unpack<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CacheError> {
    let decoder = GzDecoder::new(bytes);
    let mut reader = BufReader::new(decoder);

    deserialize_from(&mut reader).map_err(|e| CacheError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[test]
    fn packed_rows_come_back_intact() {
        let rows = vec![
            vec![CellValue::Text("Ariadne".into()), CellValue::Number(12.0)],
            vec![CellValue::Empty, CellValue::Bool(true)],
        ];
        let bytes = pack(&rows).unwrap();
        let back: Vec<Vec<CellValue>> = unpack(&bytes).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result: Result<Vec<String>, _> = unpack(b"not gzip at all");
        assert!(matches!(result, Err(CacheError::Decode(_))));
    }
}
