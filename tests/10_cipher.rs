use base64::{engine::general_purpose::STANDARD, Engine as _};
use proptest::prelude::*;

use dataport_api::cipher::{CipherError, CredentialBundle, CredentialCipher, Envelope};

fn cipher() -> CredentialCipher {
    CredentialCipher::new([3u8; 32])
}

fn bundle() -> CredentialBundle {
    CredentialBundle::new()
        .with("accessToken", "sl.example-token")
        .with("note", "ünïcødé ✓")
}

/// Flips one bit of the decoded base64 value chosen by `pick`
fn flip(envelope: &Envelope, pick: fn(&mut Envelope) -> &mut String, index: usize) -> Envelope {
    let mut tampered = envelope.clone();
    let field = pick(&mut tampered);
    let mut bytes = STANDARD.decode(field.as_bytes()).unwrap();
    let i = index % bytes.len();
    bytes[i] ^= 0x01;
    *field = STANDARD.encode(bytes);
    tampered
}

proptest! {
    #[test]
    fn encrypt_then_decrypt_returns_the_bundle(
        fields in prop::collection::btree_map("[a-zA-Z]{1,16}", ".{0,64}", 0..8)
    ) {
        let bundle = CredentialBundle::from(fields);
        let envelope = cipher().encrypt(&bundle).unwrap();
        prop_assert_eq!(cipher().decrypt(&envelope).unwrap(), bundle);
    }

    #[test]
    fn any_flipped_ciphertext_bit_is_detected(index in 0usize..256) {
        let envelope = cipher().encrypt(&bundle()).unwrap();
        let tampered = flip(&envelope, |e| &mut e.data, index);
        prop_assert!(matches!(cipher().decrypt(&tampered), Err(CipherError::Decryption(_))));
    }
}

#[test]
fn each_encryption_uses_a_fresh_iv() {
    let a = cipher().encrypt(&bundle()).unwrap();
    let b = cipher().encrypt(&bundle()).unwrap();
    assert_ne!(a.iv, b.iv);
    assert_ne!(a.data, b.data);
}

#[test]
fn tampered_iv_or_tag_is_rejected() {
    let envelope = cipher().encrypt(&bundle()).unwrap();

    let bad_iv = flip(&envelope, |e| &mut e.iv, 0);
    assert!(matches!(cipher().decrypt(&bad_iv), Err(CipherError::Decryption(_))));

    let bad_tag = flip(&envelope, |e| &mut e.tag, 5);
    assert!(matches!(cipher().decrypt(&bad_tag), Err(CipherError::Decryption(_))));
}

#[test]
fn stored_text_decrypts_with_the_same_key_only() {
    let stored = cipher().encrypt(&bundle()).unwrap().to_json().unwrap();
    assert_eq!(cipher().decrypt_str(&stored).unwrap(), bundle());

    let other = CredentialCipher::new([4u8; 32]);
    assert!(other.decrypt_str(&stored).is_err());
}

#[test]
fn garbage_is_a_decryption_error() {
    assert!(matches!(cipher().decrypt_str("plain text"), Err(CipherError::Decryption(_))));
    assert!(matches!(
        cipher().decrypt_str(r#"{"iv":"!!","data":"AAAA","tag":"AAAA"}"#),
        Err(CipherError::Decryption(_))
    ));
}
