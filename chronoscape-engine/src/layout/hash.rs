use constants::layout::JITTER_BUCKETS;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a over UTF-16 code units, folded into `[0, 1)`.
///
/// The seed is mixed into the offset basis so one hash string yields
/// independent values per axis.
pub fn hash_to_unit(value: &str, seed: u32) -> f32 {
    let hash = value
        .encode_utf16()
        .fold(FNV_OFFSET_BASIS ^ seed, |hash, unit| {
            (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
        });
    (hash % JITTER_BUCKETS) as f32 / JITTER_BUCKETS as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fnv1a(value: &str, seed: u32) -> u32 {
        let mut hash = FNV_OFFSET_BASIS ^ seed;
        for unit in value.encode_utf16() {
            hash ^= u32::from(unit);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    #[test]
    fn test_empty_string_is_offset_basis() {
        // 2166136261 % 10000 = 6261
        assert_eq!(hash_to_unit("", 0), 0.6261);
    }

    #[test]
    fn test_known_fnv_vector() {
        // Reference FNV-1a 32-bit value for "a".
        assert_eq!(fnv1a("a", 0), 0xe40c_292c);
        assert_eq!(hash_to_unit("a", 0), (0xe40c_292c_u32 % 10_000) as f32 / 10_000.0);
    }

    #[test]
    fn test_seed_changes_output() {
        let values: Vec<f32> = [11, 23, 37].iter().map(|seed| hash_to_unit("a1b2c3", *seed)).collect();
        assert_ne!(values[0], values[1]);
        assert_ne!(values[1], values[2]);
    }

    #[test]
    fn test_range() {
        for value in ["", "x", "deadbeef", "ünïcødé", "🚀"] {
            let unit = hash_to_unit(value, 23);
            assert!((0.0..1.0).contains(&unit));
        }
    }
}
