//! Deterministic planet names and cosmetic seeds derived from planet ids.

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

const PREFIXES: [&str; 16] = [
    "Ar", "Bel", "Cor", "Dra", "Eri", "Fal", "Gor", "Hel", "Ix", "Jun", "Kep", "Lyr", "Mar", "Nov",
    "Or", "Pyx",
];

const SUFFIXES: [&str; 16] = [
    "ax", "bos", "cyon", "dor", "eon", "ia", "is", "on", "ora", "os", "ra", "thos", "un", "us",
    "via", "yx",
];

/// Name for a planet id. Same id, same name, on every platform and version.
pub fn planet_name(planet_id: &str) -> String {
    let h = fnv1a64(planet_id.as_bytes());
    let prefix = PREFIXES[(h & 0x0F) as usize];
    let suffix = SUFFIXES[((h >> 4) & 0x0F) as usize];
    let number = (h >> 8) % 90 + 10;
    format!("{prefix}{suffix}-{number}")
}

/// Seed for the planet's procedural art.
pub fn visual_seed(planet_id: &str) -> u64 {
    fnv1a64(planet_id.as_bytes()).rotate_left(17)
}

/// Id of the planet at `index` in the player's list.
pub fn planet_id(index: usize) -> String {
    format!("planet-{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable_and_distinct() {
        assert_eq!(planet_name("planet-0"), planet_name("planet-0"));
        let names: std::collections::BTreeSet<String> =
            (0..8).map(|i| planet_name(&planet_id(i))).collect();
        assert!(names.len() > 1);
        assert!(!planet_name("planet-0").contains("undefined"));
        assert!(planet_name("planet-0").contains('-'));
    }
}
