use alloy_primitives::U256;
use alloy_rlp::{Decodable, Encodable, Header};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::address::{parse_address, to_checksum, ADDRESS_LEN};
use crate::error::EvmError;
use crate::quantity::{
    decode_hex_data, parse_quantity, parse_u64_quantity, strip_hex_prefix, u256_from_be_slice,
};
use crate::signature::{recover_address, sign_hash, RecoverableSignature};

/// EIP-2718 type byte of EIP-1559 transactions.
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// A transaction waiting for a signature.
///
/// `Raw` carries hex fields and is signed as an EIP-155 legacy transaction.
/// `Typed` carries an already serialized EIP-1559 payload built elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UnsignedTransaction {
    Raw(RawTransaction),
    Typed(TypedTransaction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub nonce: String,
    pub gas_price: String,
    pub gas_limit: String,
    pub to: String,
    pub value: String,
    pub chain_id: u64,
    #[serde(default = "empty_data")]
    pub data: String,
}

fn empty_data() -> String {
    "0x".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedTransaction {
    /// Hex of `0x02 || rlp(unsigned fields)`.
    pub serialized: String,
    pub derivation_path: String,
    pub master_fingerprint: String,
}

/// Final wire bytes, hex encoded without `0x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub serialized: String,
}

impl SignedTransaction {
    /// `0x`-prefixed Keccak-256 of the wire bytes.
    pub fn hash(&self) -> Result<String, EvmError> {
        Ok(hash_bytes(&decode_hex_data(&self.serialized)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Legacy,
    Eip1559,
}

/// Human-readable view of a signed or unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub kind: TxKind,
    /// Recovered sender; `None` for unsigned transactions.
    pub from: Option<String>,
    /// Checksummed recipient; `None` for contract creation.
    pub to: Option<String>,
    pub value: U256,
    /// `gas_limit * gas_price` (legacy) or `gas_limit * max_fee_per_gas`.
    pub fee: U256,
    pub data: Vec<u8>,
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_limit: u64,
    /// `0x`-prefixed transaction hash of signed transactions.
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LegacyTransaction {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Option<[u8; ADDRESS_LEN]>,
    value: U256,
    data: Vec<u8>,
    chain_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Eip1559Transaction {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: U256,
    max_fee_per_gas: U256,
    gas_limit: u64,
    to: Option<[u8; ADDRESS_LEN]>,
    value: U256,
    data: Vec<u8>,
    /// Access list kept as its raw RLP item.
    access_list: Vec<u8>,
}

/// Signs an unsigned transaction with a 32-byte secret key.
///
/// Pure and deterministic: the same input always yields the same bytes.
pub fn sign(unsigned: &UnsignedTransaction, secret_key: &[u8]) -> Result<SignedTransaction, EvmError> {
    let raw = match unsigned {
        UnsignedTransaction::Raw(raw) => {
            let tx = LegacyTransaction::from_raw(raw)?;
            let signature = sign_hash(secret_key, &tx.signing_hash())?;
            tx.encode_signed(&signature)
        }
        UnsignedTransaction::Typed(typed) => {
            let bytes = decode_hex_data(&typed.serialized)?;
            let tx = Eip1559Transaction::decode_unsigned(&bytes)?;
            let signature = sign_hash(secret_key, &tx.signing_hash())?;
            tx.encode_signed(&signature)
        }
    };

    Ok(SignedTransaction {
        serialized: hex::encode(raw),
    })
}

/// Decodes signed wire bytes (`0x` optional) and recovers the sender.
pub fn decode_signed(serialized: &str) -> Result<DecodedTransaction, EvmError> {
    let bytes = decode_hex_data(serialized)?;
    let hash = Some(hash_bytes(&bytes));

    match bytes.first() {
        Some(&b) if b >= 0xc0 => {
            let (tx, signature) = LegacyTransaction::decode_signed(&bytes)?;
            let from = recover_address(&tx.signing_hash(), &signature)?;
            Ok(DecodedTransaction {
                from: Some(to_checksum(&from)),
                hash,
                ..tx.describe()
            })
        }
        Some(&EIP1559_TX_TYPE) => {
            let (tx, signature) = Eip1559Transaction::decode_signed(&bytes)?;
            let from = recover_address(&tx.signing_hash(), &signature)?;
            Ok(DecodedTransaction {
                from: Some(to_checksum(&from)),
                hash,
                ..tx.describe()
            })
        }
        Some(b) => Err(EvmError::Unsupported(format!("transaction type 0x{b:02x}"))),
        None => Err(EvmError::InvalidValue("empty transaction".into())),
    }
}

/// Describes an unsigned transaction without a sender.
pub fn decode_unsigned(unsigned: &UnsignedTransaction) -> Result<DecodedTransaction, EvmError> {
    match unsigned {
        UnsignedTransaction::Raw(raw) => Ok(LegacyTransaction::from_raw(raw)?.describe()),
        UnsignedTransaction::Typed(typed) => {
            let bytes = decode_hex_data(&typed.serialized)?;
            Ok(Eip1559Transaction::decode_unsigned(&bytes)?.describe())
        }
    }
}

/// `0x`-prefixed Keccak-256 of signed wire bytes given as hex.
pub fn transaction_hash(serialized: &str) -> Result<String, EvmError> {
    Ok(hash_bytes(&decode_hex_data(serialized)?))
}

/// Serializes an unsigned EIP-1559 transaction, for callers that build
/// `Typed` payloads themselves.
#[allow(clippy::too_many_arguments)]
pub fn encode_eip1559_unsigned(
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: U256,
    max_fee_per_gas: U256,
    gas_limit: u64,
    to: &str,
    value: U256,
    data: &[u8],
) -> Result<String, EvmError> {
    let tx = Eip1559Transaction {
        chain_id,
        nonce,
        max_priority_fee_per_gas,
        max_fee_per_gas,
        gas_limit,
        to: parse_optional_address(to)?,
        value,
        data: data.to_vec(),
        access_list: vec![alloy_rlp::EMPTY_LIST_CODE],
    };
    Ok(hex::encode(tx.encode_unsigned()))
}

fn hash_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(Keccak256::digest(bytes)))
}

fn keccak(bytes: &[u8]) -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Keccak256::digest(bytes));
    hash
}

fn parse_optional_address(value: &str) -> Result<Option<[u8; ADDRESS_LEN]>, EvmError> {
    if strip_hex_prefix(value.trim()).is_empty() {
        Ok(None)
    } else {
        parse_address(value).map(Some)
    }
}

impl LegacyTransaction {
    fn from_raw(raw: &RawTransaction) -> Result<Self, EvmError> {
        Ok(Self {
            nonce: parse_u64_quantity(&raw.nonce)?,
            gas_price: parse_quantity(&raw.gas_price)?,
            gas_limit: parse_u64_quantity(&raw.gas_limit)?,
            to: parse_optional_address(&raw.to)?,
            value: parse_quantity(&raw.value)?,
            data: decode_hex_data(&raw.data)?,
            chain_id: Some(raw.chain_id),
        })
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        put_u256(out, self.gas_price);
        self.gas_limit.encode(out);
        put_address(out, &self.to);
        put_u256(out, self.value);
        self.data.as_slice().encode(out);
    }

    /// EIP-155 signing payload: the six fields followed by `chainId, 0, 0`.
    fn signing_hash(&self) -> [u8; 32] {
        let mut payload = Vec::new();
        self.encode_fields(&mut payload);
        if let Some(chain_id) = self.chain_id {
            chain_id.encode(&mut payload);
            0u8.encode(&mut payload);
            0u8.encode(&mut payload);
        }
        keccak(&rlp_list(&payload))
    }

    fn encode_signed(&self, signature: &RecoverableSignature) -> Vec<u8> {
        let v = match self.chain_id {
            Some(chain_id) => U256::from(chain_id) * U256::from(2u8)
                + U256::from(35u8 + signature.y_parity),
            None => U256::from(27u8 + signature.y_parity),
        };

        let mut payload = Vec::new();
        self.encode_fields(&mut payload);
        put_u256(&mut payload, v);
        put_word(&mut payload, &signature.r);
        put_word(&mut payload, &signature.s);
        rlp_list(&payload)
    }

    fn decode_signed(bytes: &[u8]) -> Result<(Self, RecoverableSignature), EvmError> {
        let mut buf = bytes;
        let mut fields = take_payload(&mut buf, true)?;
        ensure_consumed(buf)?;

        let nonce = u64::decode(&mut fields)?;
        let gas_price = take_u256(&mut fields)?;
        let gas_limit = u64::decode(&mut fields)?;
        let to = take_address(&mut fields)?;
        let value = take_u256(&mut fields)?;
        let data = take_payload(&mut fields, false)?.to_vec();
        let v = take_u256(&mut fields)?;
        let r = take_word(&mut fields)?;
        let s = take_word(&mut fields)?;
        ensure_consumed(fields)?;

        let v = u64::try_from(v)
            .map_err(|_| EvmError::InvalidValue(format!("signature v {v} is out of range")))?;
        let (chain_id, y_parity) = match v {
            27 | 28 => (None, (v - 27) as u8),
            v if v >= 35 => (Some((v - 35) / 2), ((v - 35) % 2) as u8),
            v => return Err(EvmError::InvalidValue(format!("invalid signature v {v}"))),
        };

        let tx = Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            chain_id,
        };
        Ok((tx, RecoverableSignature { r, s, y_parity }))
    }

    fn describe(&self) -> DecodedTransaction {
        DecodedTransaction {
            kind: TxKind::Legacy,
            from: None,
            to: self.to.as_ref().map(to_checksum),
            value: self.value,
            fee: U256::from(self.gas_limit).saturating_mul(self.gas_price),
            data: self.data.clone(),
            chain_id: self.chain_id,
            nonce: self.nonce,
            gas_limit: self.gas_limit,
            hash: None,
        }
    }
}

impl Eip1559Transaction {
    fn encode_fields(&self, out: &mut Vec<u8>) {
        self.chain_id.encode(out);
        self.nonce.encode(out);
        put_u256(out, self.max_priority_fee_per_gas);
        put_u256(out, self.max_fee_per_gas);
        self.gas_limit.encode(out);
        put_address(out, &self.to);
        put_u256(out, self.value);
        self.data.as_slice().encode(out);
        out.extend_from_slice(&self.access_list);
    }

    fn encode_unsigned(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.encode_fields(&mut payload);
        typed(&rlp_list(&payload))
    }

    fn signing_hash(&self) -> [u8; 32] {
        keccak(&self.encode_unsigned())
    }

    fn encode_signed(&self, signature: &RecoverableSignature) -> Vec<u8> {
        let mut payload = Vec::new();
        self.encode_fields(&mut payload);
        signature.y_parity.encode(&mut payload);
        put_word(&mut payload, &signature.r);
        put_word(&mut payload, &signature.s);
        typed(&rlp_list(&payload))
    }

    fn decode_fields(bytes: &[u8]) -> Result<(Self, &[u8]), EvmError> {
        let body = match bytes.split_first() {
            Some((&EIP1559_TX_TYPE, body)) => body,
            Some((b, _)) => {
                return Err(EvmError::Unsupported(format!("transaction type 0x{b:02x}")))
            }
            None => return Err(EvmError::InvalidValue("empty transaction".into())),
        };

        let mut buf = body;
        let mut fields = take_payload(&mut buf, true)?;
        ensure_consumed(buf)?;

        let tx = Self {
            chain_id: u64::decode(&mut fields)?,
            nonce: u64::decode(&mut fields)?,
            max_priority_fee_per_gas: take_u256(&mut fields)?,
            max_fee_per_gas: take_u256(&mut fields)?,
            gas_limit: u64::decode(&mut fields)?,
            to: take_address(&mut fields)?,
            value: take_u256(&mut fields)?,
            data: take_payload(&mut fields, false)?.to_vec(),
            access_list: take_raw_list(&mut fields)?.to_vec(),
        };
        Ok((tx, fields))
    }

    fn decode_unsigned(bytes: &[u8]) -> Result<Self, EvmError> {
        let (tx, rest) = Self::decode_fields(bytes)?;
        if !rest.is_empty() {
            return Err(EvmError::InvalidValue(
                "typed transaction is already signed".into(),
            ));
        }
        Ok(tx)
    }

    fn decode_signed(bytes: &[u8]) -> Result<(Self, RecoverableSignature), EvmError> {
        let (tx, mut rest) = Self::decode_fields(bytes)?;
        let y_parity = u8::decode(&mut rest)?;
        let r = take_word(&mut rest)?;
        let s = take_word(&mut rest)?;
        ensure_consumed(rest)?;

        if y_parity > 1 {
            return Err(EvmError::InvalidValue(format!("invalid y parity {y_parity}")));
        }
        Ok((tx, RecoverableSignature { r, s, y_parity }))
    }

    fn describe(&self) -> DecodedTransaction {
        DecodedTransaction {
            kind: TxKind::Eip1559,
            from: None,
            to: self.to.as_ref().map(to_checksum),
            value: self.value,
            fee: U256::from(self.gas_limit).saturating_mul(self.max_fee_per_gas),
            data: self.data.clone(),
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_limit: self.gas_limit,
            hash: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RLP helpers
// ---------------------------------------------------------------------------

fn rlp_list(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(payload);
    out
}

fn typed(rlp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + rlp.len());
    out.push(EIP1559_TX_TYPE);
    out.extend_from_slice(rlp);
    out
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Integers are RLP strings of their minimal big-endian bytes.
fn put_u256(out: &mut Vec<u8>, value: U256) {
    trim_leading_zeros(&value.to_be_bytes::<32>()).encode(out);
}

fn put_word(out: &mut Vec<u8>, word: &[u8; 32]) {
    trim_leading_zeros(word).encode(out);
}

fn put_address(out: &mut Vec<u8>, to: &Option<[u8; ADDRESS_LEN]>) {
    match to {
        Some(addr) => addr.as_slice().encode(out),
        None => (&[] as &[u8]).encode(out),
    }
}

/// Splits off the next item and returns its payload.
fn take_payload<'a>(buf: &mut &'a [u8], list: bool) -> Result<&'a [u8], EvmError> {
    let header = Header::decode(buf)?;
    if header.list != list {
        return Err(EvmError::Encoding(format!(
            "expected an RLP {}",
            if list { "list" } else { "string" }
        )));
    }
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort.into());
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(payload)
}

/// Splits off the next list and returns it including its header.
fn take_raw_list<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], EvmError> {
    let start = *buf;
    take_payload(buf, true)?;
    Ok(&start[..start.len() - buf.len()])
}

fn take_u256(buf: &mut &[u8]) -> Result<U256, EvmError> {
    u256_from_be_slice(take_payload(buf, false)?)
}

fn take_word(buf: &mut &[u8]) -> Result<[u8; 32], EvmError> {
    let value = take_u256(buf)?;
    Ok(value.to_be_bytes::<32>())
}

fn take_address(buf: &mut &[u8]) -> Result<Option<[u8; ADDRESS_LEN]>, EvmError> {
    let bytes = take_payload(buf, false)?;
    match bytes.len() {
        0 => Ok(None),
        ADDRESS_LEN => {
            let mut addr = [0u8; ADDRESS_LEN];
            addr.copy_from_slice(bytes);
            Ok(Some(addr))
        }
        len => Err(EvmError::InvalidAddress(format!(
            "recipient must be 20 bytes, got {len}"
        ))),
    }
}

fn ensure_consumed(buf: &[u8]) -> Result<(), EvmError> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(EvmError::Encoding(format!(
            "{} unexpected trailing bytes",
            buf.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x46; 32];
    const KEY_ADDRESS: &str = "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F";

    const BSC_SIGNED: &str = "f86c80843b9aca0082520894abababababababababababababababababababab880de0b6b3a7640000808194a04b01fe4ed900f504704f04932abffc487ca68b80c9cebebe070708c3cd15f972a06184e8519eff3ba06790f6a54e43a5c8f541a189aa491e1fce0cb1be765abe8a";

    const EIP1559_UNSIGNED: &str = "02ef3803843b9aca0085012a05f20082520894abababababababababababababababababababab872386f26fc1000080c0";
    const EIP1559_SIGNED: &str = "02f8723803843b9aca0085012a05f20082520894abababababababababababababababababababab872386f26fc1000080c001a0b25da116fdc1c2c44553a3ea85f98640a118989b8213fdc18f09d2623394b0a2a07d2b370c1adee1cde254d196676f58205d39dfdeebf0f61eacc908e461208733";

    fn bsc_raw() -> RawTransaction {
        RawTransaction {
            nonce: "0x0".into(),
            gas_price: "0x3b9aca00".into(),
            gas_limit: "0x5208".into(),
            to: format!("0x{}", "ab".repeat(20)),
            value: "0xde0b6b3a7640000".into(),
            chain_id: 56,
            data: "0x".into(),
        }
    }

    fn typed(serialized: &str) -> UnsignedTransaction {
        UnsignedTransaction::Typed(TypedTransaction {
            serialized: serialized.into(),
            derivation_path: "m/44'/60'/0'/0/0".into(),
            master_fingerprint: "00000000".into(),
        })
    }

    #[test]
    fn eip155_example_vector() {
        let raw = RawTransaction {
            nonce: "0x9".into(),
            gas_price: "0x4a817c800".into(),
            gas_limit: "0x5208".into(),
            to: format!("0x{}", "35".repeat(20)),
            value: "0xde0b6b3a7640000".into(),
            chain_id: 1,
            data: "0x".into(),
        };
        let signed = sign(&UnsignedTransaction::Raw(raw), &KEY).unwrap();
        assert_eq!(
            signed.serialized,
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn bsc_legacy_vector() {
        let signed = sign(&UnsignedTransaction::Raw(bsc_raw()), &KEY).unwrap();
        assert_eq!(signed.serialized, BSC_SIGNED);
        assert_eq!(
            signed.hash().unwrap(),
            "0x9864cfd60ff270f17b46e6862232a7c8aa0d983a306b5265a8118fec49591ad0"
        );
    }

    #[test]
    fn decimal_fields_sign_the_same() {
        let mut raw = bsc_raw();
        raw.gas_price = "1000000000".into();
        raw.gas_limit = "21000".into();
        raw.value = "1000000000000000000".into();
        let signed = sign(&UnsignedTransaction::Raw(raw), &KEY).unwrap();
        assert_eq!(signed.serialized, BSC_SIGNED);
    }

    #[test]
    fn decode_bsc_legacy_recovers_fields() {
        let decoded = decode_signed(BSC_SIGNED).unwrap();
        assert_eq!(decoded.kind, TxKind::Legacy);
        assert_eq!(decoded.from.as_deref(), Some(KEY_ADDRESS));
        assert_eq!(
            decoded.to.unwrap().to_lowercase(),
            format!("0x{}", "ab".repeat(20))
        );
        assert_eq!(decoded.value, U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(decoded.chain_id, Some(56));
        assert_eq!(decoded.nonce, 0);
        assert_eq!(decoded.fee, U256::from(21_000u64 * 1_000_000_000u64));
        assert!(decoded.data.is_empty());
        assert_eq!(
            decoded.hash.as_deref(),
            Some("0x9864cfd60ff270f17b46e6862232a7c8aa0d983a306b5265a8118fec49591ad0")
        );
    }

    #[test]
    fn decode_accepts_0x_prefix() {
        let decoded = decode_signed(&format!("0x{BSC_SIGNED}")).unwrap();
        assert_eq!(decoded.chain_id, Some(56));
    }

    #[test]
    fn eip1559_unsigned_encoding_matches_vector() {
        let encoded = encode_eip1559_unsigned(
            56,
            3,
            U256::from(1_000_000_000u64),
            U256::from(5_000_000_000u64),
            21_000,
            &format!("0x{}", "ab".repeat(20)),
            U256::from(10_000_000_000_000_000u64),
            &[],
        )
        .unwrap();
        assert_eq!(encoded, EIP1559_UNSIGNED);
    }

    #[test]
    fn eip1559_sign_matches_vector() {
        let signed = sign(&typed(EIP1559_UNSIGNED), &KEY).unwrap();
        assert_eq!(signed.serialized, EIP1559_SIGNED);
    }

    #[test]
    fn decode_eip1559_signed_and_unsigned() {
        let decoded = decode_signed(EIP1559_SIGNED).unwrap();
        assert_eq!(decoded.kind, TxKind::Eip1559);
        assert_eq!(decoded.from.as_deref(), Some(KEY_ADDRESS));
        assert_eq!(decoded.chain_id, Some(56));
        assert_eq!(decoded.nonce, 3);
        assert_eq!(decoded.fee, U256::from(21_000u64 * 5_000_000_000u64));

        let unsigned = decode_unsigned(&typed(EIP1559_UNSIGNED)).unwrap();
        assert_eq!(unsigned.from, None);
        assert_eq!(unsigned.hash, None);
        assert_eq!(unsigned.value, decoded.value);
        assert_eq!(unsigned.to, decoded.to);
    }

    #[test]
    fn signing_an_already_signed_typed_payload_fails() {
        assert!(sign(&typed(EIP1559_SIGNED), &KEY).is_err());
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let eip2930 = format!("01{}", &EIP1559_UNSIGNED[2..]);
        assert!(matches!(sign(&typed(&eip2930), &KEY), Err(EvmError::Unsupported(_))));
        assert!(matches!(decode_signed("01c0"), Err(EvmError::Unsupported(_))));
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        assert!(decode_signed(&BSC_SIGNED[..BSC_SIGNED.len() - 4]).is_err());
        assert!(decode_signed("0x").is_err());
    }

    #[test]
    fn pre_eip155_signature_is_decoded() {
        let tx = LegacyTransaction {
            chain_id: None,
            ..LegacyTransaction::from_raw(&bsc_raw()).unwrap()
        };
        let signature = sign_hash(&KEY, &tx.signing_hash()).unwrap();
        let raw = hex::encode(tx.encode_signed(&signature));

        let decoded = decode_signed(&raw).unwrap();
        assert_eq!(decoded.chain_id, None);
        assert_eq!(decoded.from.as_deref(), Some(KEY_ADDRESS));
    }

    #[test]
    fn decode_unsigned_raw() {
        let decoded = decode_unsigned(&UnsignedTransaction::Raw(bsc_raw())).unwrap();
        assert_eq!(decoded.chain_id, Some(56));
        assert_eq!(decoded.from, None);
        assert_eq!(decoded.fee, U256::from(21_000_000_000_000u64));
    }

    #[test]
    fn contract_creation_has_no_recipient() {
        let mut raw = bsc_raw();
        raw.to = "0x".into();
        let signed = sign(&UnsignedTransaction::Raw(raw), &KEY).unwrap();
        assert_eq!(decode_signed(&signed.serialized).unwrap().to, None);
    }

    #[test]
    fn unsigned_serde_uses_type_tag() {
        let json = serde_json::to_value(UnsignedTransaction::Raw(bsc_raw())).unwrap();
        assert_eq!(json["type"], "raw");
        assert_eq!(json["gasPrice"], "0x3b9aca00");
        assert_eq!(json["chainId"], 56);

        let back: UnsignedTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, UnsignedTransaction::Raw(bsc_raw()));
    }

    #[test]
    fn missing_data_defaults_to_empty() {
        let json = serde_json::json!({
            "type": "raw",
            "nonce": "0x0",
            "gasPrice": "0x1",
            "gasLimit": "0x5208",
            "to": format!("0x{}", "ab".repeat(20)),
            "value": "0x0",
            "chainId": 97
        });
        let tx: UnsignedTransaction = serde_json::from_value(json).unwrap();
        match tx {
            UnsignedTransaction::Raw(raw) => assert_eq!(raw.data, "0x"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
