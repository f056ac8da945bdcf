//! String hashing used to route keys to buckets.

/// Deterministic `str -> u64` mapping. Maps reduce it modulo their capacity.
pub trait KeyHasher {
    fn hash(&self, key: &str) -> u64;
}

/// "lose lose": the wrapping sum of the key's bytes.
///
/// Fast and unseeded, with poor distribution: any two anagrams collide.
/// Not suitable for adversarial input.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LoseLose;

impl KeyHasher for LoseLose {
    #[inline]
    fn hash(&self, key: &str) -> u64 {
        lose_lose(key.as_bytes())
    }
}

#[inline]
pub fn lose_lose(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_add(u64::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_bytes() {
        assert_eq!(LoseLose.hash(""), 0);
        assert_eq!(LoseLose.hash("a"), 97);
        assert_eq!(LoseLose.hash("ab"), 97 + 98);
    }

    #[test]
    fn anagrams_collide() {
        assert_eq!(LoseLose.hash("ab"), LoseLose.hash("ba"));
        assert_ne!(LoseLose.hash("ab"), LoseLose.hash("ac"));
    }

    #[test]
    fn deterministic_across_instances() {
        let a = LoseLose;
        let b = LoseLose::default();
        for k in ["", "x", "hello", "a longer key with spaces"] {
            assert_eq!(a.hash(k), b.hash(k));
        }
    }
}
