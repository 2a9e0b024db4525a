/// Little-endian IEEE-754 f32 encoding used for the `vector` BLOB column.
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decodes a `vector` BLOB column, validating its length against the
/// project's declared dimensionality.
pub fn bytes_to_vector(bytes: &[u8], expected_dimensions: usize) -> Result<Vec<f32>, (usize, usize)> {
    if bytes.len() != expected_dimensions * 4 {
        return Err((expected_dimensions, bytes.len() / 4));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().expect("chunks_exact(4) guarantees 4 bytes")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_a_vector() {
        let v = vec![0.5_f32, -1.25, 3.0];
        let bytes = vector_to_bytes(&v);
        let decoded = bytes_to_vector(&bytes, 3).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn rejects_mismatched_length() {
        let bytes = vector_to_bytes(&[1.0, 2.0]);
        let err = bytes_to_vector(&bytes, 5).unwrap_err();
        assert_eq!(err, (5, 2));
    }
}
