//! # ECDSA Recovery (secp256k1)
//!
//! Recovers the approver address behind a 65-byte signature over a digest.
//! Before recovery the signature must pass: R and S in [1, n-1], R a curve
//! x-coordinate without synthetic structure, S below n/2 (EIP-2).
//! Scalar comparisons use `subtle` and do not exit early.

use super::entities::EcdsaSignature;
use super::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::FromEncodedPoint;
use k256::{AffinePoint, EncodedPoint};
use shared_types::{keccak256, Address, Hash};
use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater, ConstantTimeLess};
use zeroize::Zeroize;

/// secp256k1 curve order n
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2, the EIP-2 upper bound for S (exclusive).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Validate a signature and recover its signer.
pub fn recover_signer(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    let r_ok = is_valid_scalar(&signature.r)
        && is_valid_r_coordinate(&signature.r)
        && !looks_synthetic(&signature.r);
    if !r_ok || !is_valid_scalar(&signature.s) {
        return Err(SignatureError::InvalidFormat);
    }
    if !is_low_s(&signature.s) {
        return Err(SignatureError::MalleableSignature);
    }
    recover_address(message_hash, signature)
}

/// Recover the signer's address without the range and malleability checks.
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// EVM address: last 20 bytes of keccak256 of the uncompressed key sans `0x04`.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Compare two addresses in constant time.
pub fn addresses_equal(a: &Address, b: &Address) -> bool {
    a[..].ct_eq(&b[..]).into()
}

/// `s < n/2`, constant-time.
fn is_low_s(s: &[u8; 32]) -> bool {
    ct_less_than(s, &SECP256K1_HALF_ORDER)
}

/// Scalar in [1, n-1], constant-time.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }
    let below_order = Choice::from(ct_less_than(scalar, &SECP256K1_ORDER) as u8);
    (!is_zero & below_order).into()
}

/// Big-endian `a < b`. The first differing byte decides; every byte is
/// visited.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut lt = Choice::from(0u8);
    let mut gt = Choice::from(0u8);
    for (x, y) in a.iter().zip(b) {
        let open = !(lt | gt);
        lt |= open & x.ct_lt(y);
        gt |= open & x.ct_gt(y);
    }
    lt.into()
}

/// R must decompress to a point on the curve.
fn is_valid_r_coordinate(r: &[u8; 32]) -> bool {
    let mut compressed = [0u8; 33];
    compressed[0] = 0x02;
    compressed[1..].copy_from_slice(r);

    match EncodedPoint::from_bytes(compressed) {
        Ok(encoded) => AffinePoint::from_encoded_point(&encoded).is_some().into(),
        Err(_) => false,
    }
}

/// Structure no nonce-derived R has: few distinct bytes, one byte nearly
/// everywhere, a tiny value, or a repeating two-byte cycle.
fn looks_synthetic(r: &[u8; 32]) -> bool {
    let mut counts = [0u8; 256];
    for &b in r {
        counts[b as usize] += 1;
    }
    let distinct = counts.iter().filter(|&&c| c > 0).count();
    let most_common = counts.iter().copied().max().unwrap_or(0);
    let leading_zeros = r.iter().take_while(|&&b| b == 0).count();
    let two_byte_cycle = r.chunks_exact(2).all(|pair| pair == &r[..2]);

    distinct <= 3 || most_common >= 28 || leading_zeros >= 28 || two_byte_cycle
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// `n - s`, the malleable twin of `s`.
#[cfg(test)]
pub(crate) fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow = 0u16;
    for i in (0..32).rev() {
        let subtrahend = u16::from(s[i]) + borrow;
        let (digit, under) = u16::from(SECP256K1_ORDER[i]).overflowing_sub(subtrahend);
        out[i] = digit as u8;
        borrow = u16::from(under);
    }
    out
}
