use std::sync::OnceLock;

use log::warn;
use rand::rngs::OsRng;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use sha2::{Digest, Sha256};

/// Process-wide secp256k1 context.
fn context() -> &'static Secp256k1<All> {
    static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::new)
}

fn digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Private signing half of a participant. Only the compressed public key
/// ever leaves the wallet.
#[derive(Clone)]
pub struct Wallet {
    secret: SecretKey,
    public: PublicKey,
}

impl Wallet {
    /// Generate a fresh secp256k1 key pair from the OS RNG.
    pub fn generate() -> Self {
        let (secret, public) = context().generate_keypair(&mut OsRng);
        Self { secret, public }
    }

    /// Compressed public key (33 bytes), as stored in the identity registry.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public.serialize().to_vec()
    }

    /// DER-encoded ECDSA signature over SHA-256(`data`).
    ///
    /// A signing failure yields an empty signature, which never verifies.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        match Message::from_digest_slice(&digest(data)) {
            Ok(msg) => context()
                .sign_ecdsa(&msg, &self.secret)
                .serialize_der()
                .to_vec(),
            Err(e) => {
                warn!("signing failed, leaving payload unsigned: {e}");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("public", &hex::encode(self.public.serialize()))
            .finish_non_exhaustive()
    }
}

/// Verify a DER signature over SHA-256(`data`) against a compressed public key.
/// Malformed keys or signatures count as a failed verification.
pub fn verify_signature(public_key: &[u8], signature: &[u8], data: &[u8]) -> bool {
    let Ok(pk) = PublicKey::from_slice(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_der(signature) else {
        return false;
    };
    let Ok(msg) = Message::from_digest_slice(&digest(data)) else {
        return false;
    };
    context().verify_ecdsa(&msg, &sig, &pk).is_ok()
}
