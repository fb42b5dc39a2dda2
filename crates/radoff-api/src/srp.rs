// ── Cognito SRP math ──
//
// The identity provider's USER_SRP_AUTH flow is a challenge/response
// exchange: we send an ephemeral public key `A`, receive `B`, a salt, and
// an opaque secret block, then prove password knowledge by returning an
// HMAC signature over material derived from the shared SRP secret.
//
// Everything here is pure computation over the RFC 3526 3072-bit group;
// the HTTP half of the flow lives in `auth.rs`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use num_bigint::{BigUint, RandBigInt};
use sha2::{Digest, Sha256};

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// The 3072-bit MODP group modulus (RFC 3526 group 15), as used by
/// Cognito's SRP implementation.
const N_HEX: &str = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74\
020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437\
4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05\
98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB\
9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718\
3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D04507A33\
A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7\
ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864\
D87602733EC86A64521F2B18177B200CBBE117577A615D6C770988C0BAD946E2\
08E24FA074E5AB3143DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF";

const G_HEX: &str = "2";
const DERIVED_KEY_INFO: &[u8] = b"Caldera Derived Key";
const DERIVED_KEY_SIZE: usize = 16;

/// Client-side state for one SRP exchange: the ephemeral private key `a`
/// and its public counterpart `A = g^a mod N`.
pub(crate) struct SrpSession {
    pool_name: String,
    small_a: BigUint,
    big_a: BigUint,
}

/// The proof material for a `PASSWORD_VERIFIER` challenge response.
pub(crate) struct PasswordClaim {
    pub timestamp: String,
    /// Base64-encoded HMAC-SHA256 signature.
    pub signature: String,
}

impl SrpSession {
    /// Start an exchange for the given user pool.
    ///
    /// The pool id must be of the form `{region}_{poolName}`; the part
    /// after the underscore seeds the password hash.
    pub(crate) fn new(pool_id: &str) -> Result<Self, Error> {
        let Some((_, pool_name)) = pool_id.split_once('_') else {
            return Err(Error::AuthConfig {
                message: format!("malformed identity pool id: {pool_id:?}"),
            });
        };

        let n = big_n();
        let g = big_g();

        let mut rng = rand::thread_rng();
        let (small_a, big_a) = loop {
            let small_a = rng.gen_biguint_below(&n);
            let big_a = g.modpow(&small_a, &n);
            if big_a.bits() != 0 {
                break (small_a, big_a);
            }
        };

        Ok(Self { pool_name: pool_name.to_owned(), small_a, big_a })
    }

    /// The ephemeral public key `A` as a hex string (the `SRP_A`
    /// authentication parameter).
    pub(crate) fn srp_a_hex(&self) -> String {
        self.big_a.to_str_radix(16)
    }

    /// Answer a `PASSWORD_VERIFIER` challenge.
    ///
    /// Derives the shared secret from the server's `SRP_B`/`SALT`, runs the
    /// HKDF step, and signs `poolName || userId || secretBlock || timestamp`.
    pub(crate) fn password_claim(
        &self,
        user_id_for_srp: &str,
        password: &str,
        srp_b_hex: &str,
        salt_hex: &str,
        secret_block_b64: &str,
        now: DateTime<Utc>,
    ) -> Result<PasswordClaim, Error> {
        let n = big_n();
        let big_b = parse_hex(srp_b_hex, "SRP_B")?;
        if (&big_b % &n).bits() == 0 {
            return Err(Error::Srp { message: "server public key B is zero mod N".into() });
        }

        let hkdf = self.authentication_key(&big_b, user_id_for_srp, password, salt_hex)?;

        let secret_block = base64_decode(secret_block_b64, "SECRET_BLOCK")?;
        let timestamp = cognito_timestamp(now);

        let mut mac = hmac_sha256(&hkdf);
        mac.update(self.pool_name.as_bytes());
        mac.update(user_id_for_srp.as_bytes());
        mac.update(&secret_block);
        mac.update(timestamp.as_bytes());
        let signature = base64_encode(&mac.finalize().into_bytes());

        Ok(PasswordClaim { timestamp, signature })
    }

    /// The 16-byte password authentication key (the HKDF output).
    fn authentication_key(
        &self,
        big_b: &BigUint,
        user_id: &str,
        password: &str,
        salt_hex: &str,
    ) -> Result<Vec<u8>, Error> {
        let n = big_n();
        let g = big_g();
        let k = parse_hex(
            &hex_hash(&format!("00{N_HEX}0{G_HEX}"))?,
            "k",
        )?;

        // Scrambling parameter u = H(A | B); zero would collapse the proof.
        let u_hex = hex_hash(
            &(pad_hex(&self.big_a.to_str_radix(16)) + &pad_hex(&big_b.to_str_radix(16))),
        )?;
        let u = parse_hex(&u_hex, "u")?;
        if u.bits() == 0 {
            return Err(Error::Srp { message: "scrambling parameter u is zero".into() });
        }

        // x = H(salt | H(poolName + userId + ":" + password))
        let username_password = format!("{}{}:{}", self.pool_name, user_id, password);
        let username_password_hash = hex_digest(username_password.as_bytes());
        let x_hex = hex_hash(&(pad_hex(salt_hex) + &username_password_hash))?;
        let x = parse_hex(&x_hex, "x")?;

        // s = (B - k * g^x) ^ (a + u * x) mod N, computed in BigUint by
        // lifting the subtraction into the ring.
        let g_pow_x = g.modpow(&x, &n);
        let subtrahend = (&k * &g_pow_x) % &n;
        let base = ((big_b % &n) + &n - subtrahend) % &n;
        let exponent = &self.small_a + &u * &x;
        let s = base.modpow(&exponent, &n);

        Ok(compute_hkdf(
            &hex_to_bytes(&pad_hex(&s.to_str_radix(16)), "s")?,
            &hex_to_bytes(&pad_hex(&u.to_str_radix(16)), "u")?,
        ))
    }
}

/// The challenge timestamp in Cognito's expected format, e.g.
/// `"Sat Aug 30 14:05:09 UTC 2025"` -- day of month unpadded.
pub(crate) fn cognito_timestamp(now: DateTime<Utc>) -> String {
    now.format("%a %b %-d %H:%M:%S UTC %Y").to_string()
}

// ── Helpers ─────────────────────────────────────────────────────────

fn big_n() -> BigUint {
    BigUint::parse_bytes(N_HEX.as_bytes(), 16).expect("N_HEX is valid hex")
}

fn big_g() -> BigUint {
    BigUint::parse_bytes(G_HEX.as_bytes(), 16).expect("G_HEX is valid hex")
}

fn parse_hex(s: &str, what: &str) -> Result<BigUint, Error> {
    BigUint::parse_bytes(s.trim().as_bytes(), 16)
        .ok_or_else(|| Error::Srp { message: format!("{what} is not valid hex") })
}

/// Pad a hex string for hashing: odd lengths get a leading `0`, and a set
/// top bit gets a leading `00` so the value reads as positive.
fn pad_hex(hex_str: &str) -> String {
    if hex_str.len() % 2 == 1 {
        format!("0{hex_str}")
    } else if hex_str.starts_with(['8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'A', 'B', 'C', 'D', 'E', 'F']) {
        format!("00{hex_str}")
    } else {
        hex_str.to_owned()
    }
}

fn hex_to_bytes(hex_str: &str, what: &str) -> Result<Vec<u8>, Error> {
    hex::decode(hex_str).map_err(|_| Error::Srp { message: format!("{what} is not valid hex") })
}

/// SHA-256 over the bytes a hex string encodes, returned as lowercase hex.
fn hex_hash(hex_str: &str) -> Result<String, Error> {
    Ok(hex_digest(&hex_to_bytes(hex_str, "hash input")?))
}

fn hex_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn hmac_sha256(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC accepts any key length")
}

/// Cognito's HKDF: one extract step, one expand step, 16-byte output.
fn compute_hkdf(ikm: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut extract = hmac_sha256(salt);
    extract.update(ikm);
    let prk = extract.finalize().into_bytes();

    let mut expand = hmac_sha256(&prk);
    expand.update(DERIVED_KEY_INFO);
    expand.update(&[1u8]);
    expand.finalize().into_bytes()[..DERIVED_KEY_SIZE].to_vec()
}

fn base64_decode(s: &str, what: &str) -> Result<Vec<u8>, Error> {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|_| Error::Srp { message: format!("{what} is not valid base64") })
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn pad_hex_rules() {
        assert_eq!(pad_hex("abc"), "0abc");
        assert_eq!(pad_hex("1234"), "1234");
        assert_eq!(pad_hex("ab12"), "00ab12");
        assert_eq!(pad_hex("f"), "0f");
    }

    #[test]
    fn timestamp_format_is_unpadded_day() {
        let t = Utc.with_ymd_and_hms(2024, 6, 3, 9, 5, 7).unwrap();
        assert_eq!(cognito_timestamp(t), "Mon Jun 3 09:05:07 UTC 2024");

        let t = Utc.with_ymd_and_hms(2024, 12, 25, 23, 59, 1).unwrap();
        assert_eq!(cognito_timestamp(t), "Wed Dec 25 23:59:01 UTC 2024");
    }

    #[test]
    fn pool_id_must_carry_region_prefix() {
        assert!(matches!(
            SrpSession::new("nopools"),
            Err(Error::AuthConfig { .. })
        ));
        assert!(SrpSession::new("eu-west-1_AbCdEfGh").is_ok());
    }

    #[test]
    fn srp_a_is_nonzero_hex() {
        let session = SrpSession::new("eu-west-1_TestPool").unwrap();
        let a = session.srp_a_hex();
        assert!(BigUint::parse_bytes(a.as_bytes(), 16).unwrap().bits() > 0);
    }

    #[test]
    fn password_claim_is_deterministic_for_fixed_inputs() {
        let session = SrpSession::new("eu-west-1_TestPool").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();

        let claim_a = session
            .password_claim("user-1", "hunter2", "ab12cd", "beef11", "c2VjcmV0", now)
            .unwrap();
        let claim_b = session
            .password_claim("user-1", "hunter2", "ab12cd", "beef11", "c2VjcmV0", now)
            .unwrap();

        assert_eq!(claim_a.signature, claim_b.signature);
        assert_eq!(claim_a.timestamp, claim_b.timestamp);
    }

    #[test]
    fn password_claim_depends_on_password() {
        let session = SrpSession::new("eu-west-1_TestPool").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();

        let claim_a = session
            .password_claim("user-1", "hunter2", "ab12cd", "beef11", "c2VjcmV0", now)
            .unwrap();
        let claim_b = session
            .password_claim("user-1", "hunter3", "ab12cd", "beef11", "c2VjcmV0", now)
            .unwrap();

        assert_ne!(claim_a.signature, claim_b.signature);
    }

    #[test]
    fn malformed_challenge_material_is_rejected() {
        let session = SrpSession::new("eu-west-1_TestPool").unwrap();
        let now = Utc::now();

        assert!(matches!(
            session.password_claim("u", "p", "not hex!", "beef", "c2VjcmV0", now),
            Err(Error::Srp { .. })
        ));
        assert!(matches!(
            session.password_claim("u", "p", "ab12", "beef", "%%%", now),
            Err(Error::Srp { .. })
        ));
    }
}
