//! Provider + envelope + document workflows across crates.

use envx_cli::dotenv::Document;
use envx_integration_tests::{password_provider, SAMPLE_ENV};
use envx_secrets::keystore::{KeyProvider, MemoryKeyProvider};
use envx_secrets::{decrypt, encrypt, is_encrypted, SecretError};
use tempfile::TempDir;

fn encrypt_document(doc: &mut Document, key: &[u8]) {
    for entry in doc.entries_mut() {
        let envelope = encrypt(entry.value(), key).unwrap();
        entry.set_value(&envelope);
    }
}

fn decrypt_document(doc: &mut Document, key: &[u8]) -> Result<(), SecretError> {
    for entry in doc.entries_mut() {
        let plaintext = decrypt(entry.value(), key)?;
        entry.set_value(&plaintext);
    }
    Ok(())
}

#[test]
fn test_password_key_survives_restart() {
    let salts = TempDir::new().unwrap();

    let mut doc = Document::parse(SAMPLE_ENV);
    {
        let provider = password_provider(salts.path(), "s3cret");
        let key = provider.load_or_create_key("alice").unwrap();
        encrypt_document(&mut doc, key.as_bytes());
    }
    let stored = doc.render();
    assert!(!stored.contains("hunter2"));
    assert!(stored.starts_with("# service configuration\n"));

    // A new provider instance stands in for a later invocation.
    let provider = password_provider(salts.path(), "s3cret");
    let key = provider.get_key("alice").unwrap();
    let mut reloaded = Document::parse(&stored);
    assert!(reloaded.entries().all(|e| is_encrypted(e.value())));

    decrypt_document(&mut reloaded, key.as_bytes()).unwrap();
    assert_eq!(reloaded.render(), SAMPLE_ENV);
}

#[test]
fn test_wrong_password_cannot_decrypt() {
    let salts = TempDir::new().unwrap();
    let key = password_provider(salts.path(), "right")
        .load_or_create_key("alice")
        .unwrap();
    let envelope = encrypt("value", key.as_bytes()).unwrap();

    let wrong = password_provider(salts.path(), "wrong")
        .get_key("alice")
        .unwrap();
    assert!(matches!(
        decrypt(&envelope, wrong.as_bytes()),
        Err(SecretError::DecryptionFailed(_))
    ));
}

#[test]
fn test_accounts_are_isolated() {
    let provider = MemoryKeyProvider::new();
    let alice = provider.load_or_create_key("alice").unwrap();
    let bob = provider.load_or_create_key("bob").unwrap();

    let envelope = encrypt("for alice", alice.as_bytes()).unwrap();
    assert!(decrypt(&envelope, bob.as_bytes()).is_err());
    assert_eq!(decrypt(&envelope, alice.as_bytes()).unwrap(), "for alice");
}

#[test]
fn test_mixed_document_decrypts_only_envelopes() {
    let provider = MemoryKeyProvider::new();
    let key = provider.load_or_create_key("alice").unwrap();

    let mut doc = Document::parse("PLAIN=visible\nSECRET=hidden\n");
    for entry in doc.entries_mut().filter(|e| e.key() == "SECRET") {
        let envelope = encrypt(entry.value(), key.as_bytes()).unwrap();
        entry.set_value(&envelope);
    }
    assert!(!is_encrypted(doc.get("PLAIN").unwrap()));
    assert!(is_encrypted(doc.get("SECRET").unwrap()));

    decrypt_document(&mut doc, key.as_bytes()).unwrap();
    assert_eq!(doc.render(), "PLAIN=visible\nSECRET=hidden\n");
}

#[test]
fn test_imported_key_round_trip() {
    let provider = MemoryKeyProvider::new();
    let key_bytes = [7u8; 32];
    provider.set_key("ci", &key_bytes).unwrap();

    let envelope = encrypt("token", &key_bytes).unwrap();
    let key = provider.load_or_create_key("ci").unwrap();
    assert_eq!(decrypt(&envelope, key.as_bytes()).unwrap(), "token");
}
