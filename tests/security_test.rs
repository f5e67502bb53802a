use base64::{engine::general_purpose::STANDARD, Engine};
use csp_builder::security::{generate_nonce, nonce_source, validate_nonce};
use csp_builder::{CspError, HashAlgorithm, HashGenerator, NonceGenerator};

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_hash_algorithm_names() {
        assert_eq!(HashAlgorithm::try_from("sha256"), Ok(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::try_from(" SHA384 "), Ok(HashAlgorithm::Sha384));
        assert_eq!(HashAlgorithm::try_from("Sha512"), Ok(HashAlgorithm::Sha512));
        assert_eq!(
            HashAlgorithm::try_from("md5"),
            Err(CspError::BadAlgo("md5".into()))
        );
        assert_eq!(HashAlgorithm::Sha384.to_string(), "sha384");
        assert_eq!(HashAlgorithm::Sha512.prefix(), "'sha512-");
    }

    #[test]
    fn test_hash_generation() {
        let hash = HashGenerator::generate(HashAlgorithm::Sha256, b"alert(1)");
        assert_eq!(hash, "bhHHL3z2vDgxUt0W3dWQOrprscmda2Y5pLsLg4GF+pI=");

        let source = HashGenerator::generate_source(HashAlgorithm::Sha384, b"body{}");
        assert_eq!(
            source.to_string(),
            "'sha384-myyg/hQ74aSgjBBvVME/QXAXEkT4Y9dHbVQ5C0lIyGpldvNLJV2IWc5ElXbqLi06'"
        );
    }

    #[test_case(HashAlgorithm::Sha256, 44 ; "sha256")]
    #[test_case(HashAlgorithm::Sha384, 64 ; "sha384")]
    #[test_case(HashAlgorithm::Sha512, 88 ; "sha512")]
    fn test_hash_lengths(algorithm: HashAlgorithm, encoded: usize) {
        let hash = HashGenerator::generate(algorithm, b"x");
        assert_eq!(hash.len(), encoded);
        assert_eq!(algorithm.encoded_len(), encoded);
        assert_eq!(algorithm.digest_len() * 2, hex::encode(STANDARD.decode(&hash).unwrap()).len());
    }

    #[test]
    fn test_hex_digest_canonicalized() {
        let hex = "9b2ca0fe143be1a4a08c106f54c13f4170171244f863d7476d54390b4948c86a6576f34b255d8859ce449576ea2e2d3a";
        let b64 = "myyg/hQ74aSgjBBvVME/QXAXEkT4Y9dHbVQ5C0lIyGpldvNLJV2IWc5ElXbqLi06";

        assert_eq!(HashAlgorithm::Sha384.canonicalize_digest(hex).unwrap(), b64);
        assert_eq!(
            HashAlgorithm::Sha384.canonicalize_digest(&hex.to_uppercase()).unwrap(),
            b64
        );
        assert_eq!(HashAlgorithm::Sha384.canonicalize_digest(b64).unwrap(), b64);
    }

    #[test]
    fn test_bad_digests() {
        let sha256 = HashGenerator::generate(HashAlgorithm::Sha256, b"x");
        // right encoding, wrong algorithm length
        assert_eq!(
            HashAlgorithm::Sha512.canonicalize_digest(&sha256),
            Err(CspError::BadHash("sha512".into()))
        );
        // unpadded base64 does not round-trip
        assert!(HashAlgorithm::Sha256
            .canonicalize_digest(sha256.trim_end_matches('='))
            .is_err());
        assert!(HashAlgorithm::Sha256.canonicalize_digest("not base64!").is_err());
        assert!(HashAlgorithm::Sha256.canonicalize_digest("").is_err());
    }

    #[test_case("0123456789abcdef0123456789abcdef0123456789ab" ; "base64 length")]
    #[test_case("0123456789abcdef0123456789abcdef0123456789abcdef" ; "sha384 sized hex")]
    #[test_case("0123456789abcdef0123456789abcdef0123456789abcde" ; "odd hex")]
    fn test_wrong_length_hex_digest(digest: &str) {
        assert_eq!(
            HashAlgorithm::Sha256.canonicalize_digest(digest),
            Err(CspError::BadHash("sha256".into()))
        );
        assert!(HashAlgorithm::Sha256.source(digest).is_err());
    }

    #[test]
    fn test_verify_hash() {
        let hash = HashGenerator::generate(HashAlgorithm::Sha256, b"alert(1)");
        assert!(HashGenerator::verify_hash(HashAlgorithm::Sha256, b"alert(1)", &hash));
        assert!(HashGenerator::verify_hash(
            HashAlgorithm::Sha256,
            b"alert(1)",
            "6e11c72f7cf6bc383152dd16ddd5903aba6bb1c99d6b6639a4bb0b838185fa92"
        ));
        assert!(!HashGenerator::verify_hash(HashAlgorithm::Sha256, b"alert(2)", &hash));
    }

    #[test_case(0, 16 ; "zero raised to floor")]
    #[test_case(8, 16 ; "short raised to floor")]
    #[test_case(16, 16 ; "floor")]
    #[test_case(32, 32 ; "long")]
    fn test_generated_nonce_length(requested: usize, bytes: usize) {
        let nonce = generate_nonce(requested).unwrap();
        assert_eq!(STANDARD.decode(&nonce).unwrap().len(), bytes);
        assert!(validate_nonce(&nonce).is_ok());
    }

    #[test]
    fn test_nonce_generator() {
        let generator = NonceGenerator::new(4);
        assert_eq!(generator.length(), 16);
        assert_eq!(NonceGenerator::default().length(), 16);

        let first = generator.generate().unwrap();
        let second = generator.generate().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_validate_nonce() {
        assert!(validate_nonce("AAECAwQFBgcICQoLDA0ODw==").is_ok());
        assert!(validate_nonce("ZGVmZ2hpamtsbW5vcHFyc3R1").is_ok());

        // too short
        assert!(validate_nonce("AAECAwQFBgc=").is_err());
        // all hex digits
        assert!(validate_nonce("0123456789abcdef0123456789abcdef").is_err());
        // missing padding
        assert!(validate_nonce("AAECAwQFBgcICQoLDA0ODw").is_err());
        // url-safe alphabet
        assert!(validate_nonce("-_-_-_-_-_-_-_-_-_-_-_-_").is_err());
        assert!(validate_nonce("").is_err());
    }

    #[test]
    fn test_nonce_source_trims() {
        let source = nonce_source("  AAECAwQFBgcICQoLDA0ODw== ").unwrap();
        assert_eq!(source.nonce(), Some("AAECAwQFBgcICQoLDA0ODw=="));
        assert_eq!(
            nonce_source("short"),
            Err(CspError::BadNonce("short".into()))
        );
    }
}
