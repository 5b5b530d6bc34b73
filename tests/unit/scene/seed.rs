use super::*;
use sha2::Digest as _;

#[test]
fn derive_is_stable_and_bounded() {
    let a = JobSeed::derive(3, 0, 1);
    let b = JobSeed::derive(3, 0, 1);
    assert_eq!(a, b);
    assert!(a.value() < SEED_MODULUS);
}

#[test]
fn every_identity_component_changes_the_seed() {
    let base = JobSeed::derive(3, 0, 1).value();
    assert_ne!(base, JobSeed::derive(4, 0, 1).value());
    assert_ne!(base, JobSeed::derive(3, 1, 1).value());
    assert_ne!(base, JobSeed::derive(3, 0, 2).value());
}

#[test]
fn reduction_matches_big_endian_digest() {
    let digest = sha2::Sha256::digest(b"synth_data:0:0:0");
    let mut expect = 0u128;
    for &b in digest.iter() {
        expect = (expect * 256 + u128::from(b)) % u128::from(SEED_MODULUS);
    }
    assert_eq!(JobSeed::derive(0, 0, 0).value(), expect as u64);
}

#[test]
fn same_seed_gives_identical_draws() {
    let draw = |seed: JobSeed| {
        let mut rng = seed.into_rng();
        let u = rng.uniform();
        let n = rng.normal(0.5, 0.5).unwrap();
        let i = rng.index(17).unwrap();
        (u.to_bits(), n.to_bits(), i)
    };
    assert_eq!(draw(JobSeed::derive(9, 2, 5)), draw(JobSeed::derive(9, 2, 5)));
    assert_ne!(draw(JobSeed::derive(9, 2, 5)), draw(JobSeed::derive(9, 2, 6)));
}

#[test]
fn index_rejects_empty_and_stays_in_range() {
    let mut rng = JobSeed::from_value(1).into_rng();
    assert!(rng.index(0).is_err());
    for _ in 0..200 {
        assert!(rng.index(3).unwrap() < 3);
        let u = rng.uniform();
        assert!((0.0..1.0).contains(&u));
    }
}
