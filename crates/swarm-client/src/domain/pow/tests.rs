use super::*;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn destination() -> String {
    format!("05{}", "aa".repeat(32))
}

// =========================================================================
// TEST GROUP 1: Target derivation
// =========================================================================

#[test]
fn test_target_matches_hand_computed_value() {
    // size = 108, ttl_secs = 86400, inner = 86400 * 108 / 65535 = 142
    // denominator = 1 * (108 + 142) = 250
    let target = target_threshold(100, 86_400_000, 1).unwrap();
    assert_eq!(target, u64::MAX / 250);
}

#[test]
fn test_target_scales_inversely_with_difficulty() {
    let easy = target_threshold(100, 86_400_000, 1).unwrap();
    let hard = target_threshold(100, 86_400_000, 10).unwrap();
    assert_eq!(hard, u64::MAX / 2500);
    assert!(hard < easy);
}

#[test]
fn test_short_ttl_drops_inner_term() {
    // ttl below one second contributes nothing
    let target = target_threshold(0, 999, 1).unwrap();
    assert_eq!(target, u64::MAX / 8);
}

#[test]
fn test_zero_difficulty_fails() {
    let err = target_threshold(100, 86_400_000, 0).unwrap_err();
    assert!(matches!(err, SwarmError::ComputationFailed(_)));
}

#[test]
fn test_huge_difficulty_does_not_overflow() {
    let target = target_threshold(100, u64::MAX, u64::MAX).unwrap();
    assert_eq!(target, 0);
}

// =========================================================================
// TEST GROUP 2: Nonce search
// =========================================================================

#[test]
fn test_compute_returns_eight_byte_nonce() {
    let destination = destination();
    let nonce = compute_nonce("hello", &destination, 1_600_000_000_000, 86_400_000, 1).unwrap();
    let encoded = BASE64.encode(nonce);
    assert_eq!(BASE64.decode(encoded).unwrap().len(), 8);
}

#[test]
fn test_nonce_satisfies_target_and_is_first_hit() {
    let destination = destination();
    let pow = ProofOfWork {
        data: "aGVsbG8gd29ybGQ=",
        destination: &destination,
        timestamp_ms: 1_600_000_000_000,
        ttl_ms: 86_400_000,
        difficulty: 10,
    };
    let nonce = pow.compute().unwrap();
    assert!(pow.verify(nonce));

    let winning = u64::from_be_bytes(nonce);
    assert!(winning >= 1);
    for smaller in 1..winning {
        assert!(!pow.verify(smaller.to_be_bytes()), "nonce {smaller} also satisfies");
    }
}

#[test]
fn test_compute_is_deterministic() {
    let destination = destination();
    let a = compute_nonce("data", &destination, 42, 60_000, 5).unwrap();
    let b = compute_nonce("data", &destination, 42, 60_000, 5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_payload_concatenation() {
    let pow = ProofOfWork {
        data: "xyz",
        destination: "05ab",
        timestamp_ms: 12,
        ttl_ms: 34,
        difficulty: 1,
    };
    assert_eq!(pow.payload(), b"123405abxyz".to_vec());
}

#[test]
fn test_verify_rejects_with_zero_difficulty() {
    let pow = ProofOfWork {
        data: "xyz",
        destination: "05ab",
        timestamp_ms: 12,
        ttl_ms: 34,
        difficulty: 0,
    };
    assert!(!pow.verify(1u64.to_be_bytes()));
}
