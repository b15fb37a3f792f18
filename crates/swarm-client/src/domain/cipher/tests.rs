use super::*;

#[test]
fn test_both_sides_agree_on_key() {
    let alice = EphemeralKeyPair::generate();
    let bob = EphemeralKeyPair::generate();

    let alice_key = alice.shared_key(&bob.public_key_hex()).unwrap();
    let bob_key = bob.shared_key(&alice.public_key_hex()).unwrap();

    let sealed = alice_key.encrypt(b"{\"method\":\"POST\"}");
    assert_eq!(bob_key.decrypt(&sealed).unwrap(), b"{\"method\":\"POST\"}");
}

#[test]
fn test_prefixed_key_is_accepted() {
    let alice = EphemeralKeyPair::generate();
    let bob = EphemeralKeyPair::generate();

    let prefixed = format!("05{}", bob.public_key_hex());
    let from_prefixed = alice.shared_key(&prefixed).unwrap();
    let from_bare = alice.shared_key(&bob.public_key_hex()).unwrap();

    let sealed = from_prefixed.encrypt(b"payload");
    assert_eq!(from_bare.decrypt(&sealed).unwrap(), b"payload");
}

#[test]
fn test_iv_is_fresh_per_encryption() {
    let key = SharedKey::from_bytes([7u8; KEY_SIZE]);
    let a = key.encrypt(b"same plaintext");
    let b = key.encrypt(b"same plaintext");
    assert_ne!(a[..IV_SIZE], b[..IV_SIZE]);
    assert_eq!(a.len(), IV_SIZE + 16);
}

#[test]
fn test_invalid_public_key_rejected() {
    let pair = EphemeralKeyPair::generate();
    assert!(matches!(
        pair.shared_key("not hex"),
        Err(CryptoError::InvalidPublicKey(_))
    ));
    assert!(matches!(
        pair.shared_key("abcd"),
        Err(CryptoError::InvalidPublicKey(_))
    ));
}

#[test]
fn test_short_ciphertext_rejected() {
    let key = SharedKey::from_bytes([1u8; KEY_SIZE]);
    assert_eq!(
        key.decrypt(&[0u8; 4]),
        Err(CryptoError::CiphertextTooShort { len: 4 })
    );
}

#[test]
fn test_wrong_key_fails_or_garbles() {
    let sealed = SharedKey::from_bytes([1u8; KEY_SIZE]).encrypt(b"secret message");
    let result = SharedKey::from_bytes([2u8; KEY_SIZE]).decrypt(&sealed);
    // Padding check catches almost every wrong key; a lucky pad still garbles.
    assert!(result.map(|pt| pt != b"secret message").unwrap_or(true));
}
