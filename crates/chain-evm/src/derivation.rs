//! BIP32 keys for EVM accounts.
//!
//! Account roots (`m/44'/60'/0'`) are derived from a seed with the `bip32`
//! crate. Everything below the account root is non-hardened and is done here
//! as two explicit pure steps, `/{visibility}/{address}`, so that a watch-only
//! holder of the account `xpub` derives the same addresses as the signer.

use std::fmt;
use std::str::FromStr;

use bip32::{ChildNumber, DerivationPath, ExtendedKey, ExtendedKeyAttrs, Prefix, XPrv, XPub};
use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, NonZeroScalar, ProjectivePoint, PublicKey, Scalar, SecretKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::EvmError;

type HmacSha512 = Hmac<Sha512>;

/// Default account root for EVM chains.
pub const DEFAULT_ACCOUNT_PATH: &str = "m/44'/60'/0'";

/// First hardened child index.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// A chain code and compressed public key, plus the metadata needed to
/// serialize them as an `xpub`.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub chain_code: [u8; 32],
    pub public_key: [u8; 33],
}

/// A chain code and secret scalar. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedSecretKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub chain_code: [u8; 32],
    secret_key: [u8; 32],
}

/// Computes one non-hardened BIP32 public child step.
///
/// Returns the child's `(chain_code, compressed_public_key)`.
pub fn derive_child_public(
    chain_code: &[u8; 32],
    public_key: &[u8; 33],
    index: u32,
) -> Result<([u8; 32], [u8; 33]), EvmError> {
    ensure_normal(index)?;

    let parent = PublicKey::from_sec1_bytes(public_key)
        .map_err(|e| EvmError::InvalidPublicKey(format!("invalid parent key: {e}")))?;

    let (tweak, child_chain_code) = ckd_tweak(chain_code, public_key, index)?;

    let point = ProjectivePoint::GENERATOR * tweak + parent.to_projective();
    let child = PublicKey::from_affine(point.to_affine())
        .map_err(|_| EvmError::Derivation(format!("child {index} is the point at infinity")))?;

    Ok((child_chain_code, compressed(&child)?))
}

/// Computes one non-hardened BIP32 secret child step.
///
/// Returns the child's `(chain_code, secret_key)`.
pub fn derive_child_secret(
    chain_code: &[u8; 32],
    secret_key: &[u8; 32],
    index: u32,
) -> Result<([u8; 32], [u8; 32]), EvmError> {
    ensure_normal(index)?;

    let parent = SecretKey::from_slice(secret_key)
        .map_err(|e| EvmError::InvalidPrivateKey(e.to_string()))?;
    let parent_public = compressed(&parent.public_key())?;

    let (tweak, child_chain_code) = ckd_tweak(chain_code, &parent_public, index)?;

    let sum = tweak + *parent.to_nonzero_scalar();
    let child: Option<NonZeroScalar> = NonZeroScalar::new(sum).into();
    let child =
        child.ok_or_else(|| EvmError::Derivation(format!("child {index} has a zero key")))?;

    let mut child_secret = [0u8; 32];
    child_secret.copy_from_slice(&child.to_repr());
    Ok((child_chain_code, child_secret))
}

fn ensure_normal(index: u32) -> Result<(), EvmError> {
    if index >= HARDENED_OFFSET {
        return Err(EvmError::Derivation(format!(
            "hardened index {index} cannot be derived from a public parent"
        )));
    }
    Ok(())
}

/// `I = HMAC-SHA512(chain_code, serP(parent) || ser32(index))`, split into
/// the scalar tweak `IL` and the child chain code `IR`.
fn ckd_tweak(
    chain_code: &[u8; 32],
    parent_public: &[u8; 33],
    index: u32,
) -> Result<(Scalar, [u8; 32]), EvmError> {
    let mut mac = HmacSha512::new_from_slice(chain_code)
        .map_err(|e| EvmError::Derivation(e.to_string()))?;
    mac.update(parent_public);
    mac.update(&index.to_be_bytes());
    let output = mac.finalize().into_bytes();

    let tweak: Option<Scalar> =
        Scalar::from_repr(FieldBytes::clone_from_slice(&output[..32])).into();
    let tweak = tweak
        .ok_or_else(|| EvmError::Derivation(format!("child {index} tweak exceeds curve order")))?;

    let mut child_chain_code = [0u8; 32];
    child_chain_code.copy_from_slice(&output[32..]);
    Ok((tweak, child_chain_code))
}

fn compressed(key: &PublicKey) -> Result<[u8; 33], EvmError> {
    key.to_encoded_point(true)
        .as_bytes()
        .try_into()
        .map_err(|_| EvmError::InvalidPublicKey("unexpected compressed key length".into()))
}

/// First four bytes of `RIPEMD160(SHA256(compressed_public_key))`.
pub fn fingerprint(public_key: &[u8; 33]) -> [u8; 4] {
    let hash = Ripemd160::digest(Sha256::digest(public_key));
    let mut fp = [0u8; 4];
    fp.copy_from_slice(&hash[..4]);
    fp
}

impl ExtendedPublicKey {
    /// Non-hardened child of this key.
    pub fn derive_child(&self, index: u32) -> Result<Self, EvmError> {
        let (chain_code, public_key) = derive_child_public(&self.chain_code, &self.public_key, index)?;
        Ok(Self {
            depth: self.depth.saturating_add(1),
            parent_fingerprint: fingerprint(&self.public_key),
            child_number: index,
            chain_code,
            public_key,
        })
    }

    /// Plain compressed public key at `/{visibility}/{address}`.
    pub fn derive_plain(&self, visibility_index: u32, address_index: u32) -> Result<[u8; 33], EvmError> {
        Ok(self
            .derive_child(visibility_index)?
            .derive_child(address_index)?
            .public_key)
    }

    pub fn fingerprint(&self) -> [u8; 4] {
        fingerprint(&self.public_key)
    }

    fn attrs(&self) -> ExtendedKeyAttrs {
        ExtendedKeyAttrs {
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: ChildNumber(self.child_number),
            chain_code: self.chain_code,
        }
    }

    /// Base58check `xpub` serialization.
    pub fn to_xpub(&self) -> String {
        ExtendedKey {
            prefix: Prefix::XPUB,
            attrs: self.attrs(),
            key_bytes: self.public_key,
        }
        .to_string()
    }
}

impl From<&XPub> for ExtendedPublicKey {
    fn from(xpub: &XPub) -> Self {
        let attrs = xpub.attrs();
        Self {
            depth: attrs.depth,
            parent_fingerprint: attrs.parent_fingerprint,
            child_number: attrs.child_number.0,
            chain_code: attrs.chain_code,
            public_key: xpub.to_bytes(),
        }
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = EvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = parse_extended(s, Prefix::XPUB)?;
        let xpub = XPub::try_from(key)
            .map_err(|e| EvmError::InvalidPublicKey(format!("xpub key is not on the curve: {e}")))?;
        Ok(Self::from(&xpub))
    }
}

impl fmt::Debug for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xpub())
    }
}

impl ExtendedSecretKey {
    pub fn secret_key(&self) -> &[u8; 32] {
        &self.secret_key
    }

    /// Non-hardened child of this key.
    pub fn derive_child(&self, index: u32) -> Result<Self, EvmError> {
        let (chain_code, secret_key) = derive_child_secret(&self.chain_code, &self.secret_key, index)?;
        Ok(Self {
            depth: self.depth.saturating_add(1),
            parent_fingerprint: self.to_public()?.fingerprint(),
            child_number: index,
            chain_code,
            secret_key,
        })
    }

    /// Plain secret key at `/{visibility}/{address}`.
    pub fn derive_plain(&self, visibility_index: u32, address_index: u32) -> Result<[u8; 32], EvmError> {
        let child = self.derive_child(visibility_index)?.derive_child(address_index)?;
        Ok(child.secret_key)
    }

    /// The matching extended public key.
    pub fn to_public(&self) -> Result<ExtendedPublicKey, EvmError> {
        let secret = SecretKey::from_slice(&self.secret_key)
            .map_err(|e| EvmError::InvalidPrivateKey(e.to_string()))?;
        Ok(ExtendedPublicKey {
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
            chain_code: self.chain_code,
            public_key: compressed(&secret.public_key())?,
        })
    }

    /// Base58check `xprv` serialization.
    pub fn to_xprv(&self) -> String {
        let mut key_bytes = [0u8; 33];
        key_bytes[1..].copy_from_slice(&self.secret_key);
        let key = ExtendedKey {
            prefix: Prefix::XPRV,
            attrs: ExtendedKeyAttrs {
                depth: self.depth,
                parent_fingerprint: self.parent_fingerprint,
                child_number: ChildNumber(self.child_number),
                chain_code: self.chain_code,
            },
            key_bytes,
        };
        key_bytes.zeroize();
        key.to_string()
    }
}

impl From<&XPrv> for ExtendedSecretKey {
    fn from(xprv: &XPrv) -> Self {
        let attrs = xprv.attrs();
        Self {
            depth: attrs.depth,
            parent_fingerprint: attrs.parent_fingerprint,
            child_number: attrs.child_number.0,
            chain_code: attrs.chain_code,
            secret_key: xprv.to_bytes(),
        }
    }
}

impl FromStr for ExtendedSecretKey {
    type Err = EvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = parse_extended(s, Prefix::XPRV)?;
        let xprv =
            XPrv::try_from(key).map_err(|e| EvmError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from(&xprv))
    }
}

impl fmt::Debug for ExtendedSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedSecretKey")
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}

/// Decodes a base58check extended key and checks its version prefix.
fn parse_extended(s: &str, prefix: Prefix) -> Result<ExtendedKey, EvmError> {
    let key: ExtendedKey = s
        .trim()
        .parse()
        .map_err(|e: bip32::Error| EvmError::Derivation(format!("invalid extended key encoding: {e}")))?;
    if key.prefix != prefix {
        return Err(EvmError::Derivation(format!(
            "expected an {prefix} key, got {}",
            key.prefix
        )));
    }
    Ok(key)
}

/// Derives the extended account key for `path` from a BIP39 seed.
pub fn account_key_from_seed(seed: &[u8], path: &str) -> Result<ExtendedSecretKey, EvmError> {
    let path: DerivationPath = path
        .parse()
        .map_err(|e: bip32::Error| EvmError::Derivation(e.to_string()))?;

    let xprv =
        XPrv::derive_from_path(seed, &path).map_err(|e| EvmError::Derivation(e.to_string()))?;

    Ok(ExtendedSecretKey::from(&xprv))
}

/// Fingerprint of the master key of `seed`, as stored alongside typed
/// unsigned transactions.
pub fn master_fingerprint(seed: &[u8]) -> Result<[u8; 4], EvmError> {
    let master = account_key_from_seed(seed, "m")?;
    Ok(master.to_public()?.fingerprint())
}

/// Last two components of a derivation path such as `m/44'/60'/0'/0/3`,
/// read as `(visibility, address)` indices. Hardened components yield `None`.
pub fn path_tail(path: &str) -> Option<(u32, u32)> {
    let mut parts = path.trim().rsplit('/');
    let address = parts.next()?.parse::<u32>().ok()?;
    let visibility = parts.next()?.parse::<u32>().ok()?;
    if visibility >= HARDENED_OFFSET || address >= HARDENED_OFFSET {
        return None;
    }
    Some((visibility, address))
}
