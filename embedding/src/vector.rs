use std::fmt::Write;

/// Compute the cosine similarity between two equal-length vectors.
/// Returns 0.0 when either vector has zero norm or the dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())) as f32
}

/// Render a vector as the bracketed literal pgvector parses from text,
/// e.g. `[0.25,-1,3.5]`. Each component uses the shortest representation
/// that round-trips back to the same `f32`.
pub fn encode_vector_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 12 + 2);
    out.push('[');
    for (i, x) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{x}");
    }
    out.push(']');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cosine_orders_similarities() {
        let q = vec![1.0, 0.0, 0.0];
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.5, 0.5, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        let s_a = cosine_similarity(&q, &a);
        let s_b = cosine_similarity(&q, &b);
        let s_c = cosine_similarity(&q, &c);
        assert!(s_a > s_b && s_b > s_c);
    }

    #[test]
    fn cosine_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn literal_is_bracketed_and_comma_separated() {
        assert_eq!(encode_vector_literal(&[0.25, -1.0, 3.5]), "[0.25,-1,3.5]");
        assert_eq!(encode_vector_literal(&[]), "[]");
    }

    #[test]
    fn literal_components_parse_back_exactly() {
        let v = [0.1_f32, -0.033_333_335, 1e-7, 123_456.79];
        let literal = encode_vector_literal(&v);
        let parsed: Vec<f32> = literal
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(parsed, v.to_vec());
    }
}
