//! The versioned RSA key container (format v1).
//!
//! ```text
//! type_tag            4 bytes   "RSU1" (public) | "RSR1" (private)
//! total_length        u32 BE    length of the whole container
//! modulus             u32 BE length + m bytes
//! public_exponent     u32 BE length + 1..=4 bytes, minimal encoding
//! -- private containers only --
//! private_exponent    u32 BE length + m bytes
//! prime1              u32 BE length + m/2 bytes
//! prime2              u32 BE length + m/2 bytes
//! exponent1           u32 BE length + m/2 bytes
//! exponent2           u32 BE length + m/2 bytes
//! coefficient         u32 BE length + m/2 bytes
//! ```
//!
//! Private fields are left-padded with zeros to their fixed width, so a
//! container's length depends only on the key size and the exponent length.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::errors::{Error, Result};
use crate::common::utils::{ZeroizingVec, from_base64, to_base64};
use crate::keys::fields::{PrivateKeyFields, RsaKeyFields, strip_leading_zeros};
use crate::keys::policy::ModulusLength;

pub const FORMAT_VERSION: u8 = b'1';
pub const PUBLIC_KEY_TAG: [u8; 4] = [b'R', b'S', b'U', FORMAT_VERSION];
pub const PRIVATE_KEY_TAG: [u8; 4] = [b'R', b'S', b'R', FORMAT_VERSION];

/// Tag plus total length.
pub const HEADER_LEN: usize = 8;
pub const MAX_PUBLIC_EXPONENT_LEN: usize = 4;
const LENGTH_PREFIX: usize = 4;

/// What a container holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    RsaPublic,
    RsaPrivate,
}

impl KeyKind {
    pub fn is_private(self) -> bool {
        matches!(self, KeyKind::RsaPrivate)
    }

    pub fn tag(self) -> [u8; 4] {
        match self {
            KeyKind::RsaPublic => PUBLIC_KEY_TAG,
            KeyKind::RsaPrivate => PRIVATE_KEY_TAG,
        }
    }

    fn from_tag(tag: &[u8]) -> Option<Self> {
        if tag == PUBLIC_KEY_TAG {
            Some(KeyKind::RsaPublic)
        } else if tag == PRIVATE_KEY_TAG {
            Some(KeyKind::RsaPrivate)
        } else {
            None
        }
    }

    pub(crate) fn from_private(private: bool) -> Self {
        if private {
            KeyKind::RsaPrivate
        } else {
            KeyKind::RsaPublic
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::RsaPublic => f.write_str("RSA public key"),
            KeyKind::RsaPrivate => f.write_str("RSA private key"),
        }
    }
}

/// Names a container field in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    Modulus,
    PublicExponent,
    PrivateExponent,
    Prime1,
    Prime2,
    Exponent1,
    Exponent2,
    Coefficient,
}

impl KeyField {
    /// Private fields in container order.
    pub const PRIVATE: [KeyField; 6] = [
        KeyField::PrivateExponent,
        KeyField::Prime1,
        KeyField::Prime2,
        KeyField::Exponent1,
        KeyField::Exponent2,
        KeyField::Coefficient,
    ];

    /// Fixed width of the modulus and the private fields.
    fn width(self, modulus: ModulusLength) -> usize {
        match self {
            KeyField::Modulus | KeyField::PrivateExponent => modulus.bytes(),
            _ => modulus.half_bytes(),
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyField::Modulus => "modulus",
            KeyField::PublicExponent => "public_exponent",
            KeyField::PrivateExponent => "private_exponent",
            KeyField::Prime1 => "prime1",
            KeyField::Prime2 => "prime2",
            KeyField::Exponent1 => "exponent1",
            KeyField::Exponent2 => "exponent2",
            KeyField::Coefficient => "coefficient",
        };
        f.write_str(name)
    }
}

/// Exact container length for a key of the given shape.
pub fn encoded_len(modulus: ModulusLength, exponent_len: usize, kind: KeyKind) -> usize {
    let public = HEADER_LEN + LENGTH_PREFIX + modulus.bytes() + LENGTH_PREFIX + exponent_len;
    if kind.is_private() {
        public + LENGTH_PREFIX + modulus.bytes() + 5 * (LENGTH_PREFIX + modulus.half_bytes())
    } else {
        public
    }
}

/// Reads the header and reports what the container claims to hold.
///
/// Only the tag and the total length are checked.
pub fn detect_key_kind(bytes: &[u8]) -> Result<KeyKind> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::MalformedKeyContainer("container shorter than its header"));
    }
    let kind = KeyKind::from_tag(&bytes[..4])
        .ok_or(Error::MalformedKeyContainer("unknown type tag"))?;
    let total = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if total != bytes.len() {
        return Err(Error::MalformedKeyContainer("declared length does not match container length"));
    }
    Ok(kind)
}

/// Runs every structural and field check an import would, without a backend.
pub fn validate_key_container(bytes: &[u8]) -> Result<KeyKind> {
    let raw = RawContainer::parse(bytes)?;
    raw.validate()?;
    Ok(raw.kind)
}

/// Field slices borrowed from a structurally valid container.
pub(crate) struct RawContainer<'a> {
    pub(crate) kind: KeyKind,
    modulus: &'a [u8],
    public_exponent: &'a [u8],
    private: Option<[&'a [u8]; 6]>,
}

impl<'a> RawContainer<'a> {
    /// Walks the length-prefixed fields. Anything that does not add up to
    /// exactly the declared length is malformed.
    pub(crate) fn parse(bytes: &'a [u8]) -> Result<Self> {
        let kind = detect_key_kind(bytes)?;
        let mut reader = FieldReader::new(&bytes[HEADER_LEN..]);

        let modulus = reader.field()?;
        let public_exponent = reader.field()?;
        let private = if kind.is_private() {
            Some([
                reader.field()?,
                reader.field()?,
                reader.field()?,
                reader.field()?,
                reader.field()?,
                reader.field()?,
            ])
        } else {
            None
        };

        if !reader.is_empty() {
            return Err(Error::MalformedKeyContainer("trailing bytes after last field"));
        }

        Ok(Self {
            kind,
            modulus,
            public_exponent,
            private,
        })
    }

    /// Checks field values against the key size policy and RSA constraints.
    pub(crate) fn validate(&self) -> Result<ModulusLength> {
        let modulus = ModulusLength::from_bytes(self.modulus.len())
            .ok_or(Error::invalid_field(KeyField::Modulus, "unsupported modulus length"))?;
        if self.modulus[0] & 0x80 == 0 {
            return Err(Error::invalid_field(
                KeyField::Modulus,
                "modulus shorter than its declared size",
            ));
        }
        if self.modulus[self.modulus.len() - 1] & 1 == 0 {
            return Err(Error::invalid_field(KeyField::Modulus, "modulus must be odd"));
        }

        validate_public_exponent(self.public_exponent)?;

        if let Some(private) = &self.private {
            for (field, value) in KeyField::PRIVATE.into_iter().zip(private.iter()) {
                if value.len() != field.width(modulus) {
                    return Err(Error::invalid_field(field, "length inconsistent with modulus"));
                }
                if value.iter().all(|b| *b == 0) {
                    return Err(Error::invalid_field(field, "must be non-zero"));
                }
            }
        }

        Ok(modulus)
    }

    /// Copies the fields out into a staging value that wipes itself on drop.
    pub(crate) fn to_fields(&self) -> RsaKeyFields {
        RsaKeyFields {
            modulus: self.modulus.to_vec(),
            public_exponent: self.public_exponent.to_vec(),
            private: self.private.map(|[d, p, q, dp, dq, qinv]| PrivateKeyFields {
                private_exponent: d.to_vec(),
                prime1: p.to_vec(),
                prime2: q.to_vec(),
                exponent1: dp.to_vec(),
                exponent2: dq.to_vec(),
                coefficient: qinv.to_vec(),
            }),
        }
    }
}

fn validate_public_exponent(e: &[u8]) -> Result<()> {
    if e.is_empty() || e.len() > MAX_PUBLIC_EXPONENT_LEN {
        return Err(Error::invalid_field(KeyField::PublicExponent, "length out of range"));
    }
    if e[0] == 0 {
        return Err(Error::invalid_field(KeyField::PublicExponent, "not minimally encoded"));
    }
    if e[e.len() - 1] & 1 == 0 {
        return Err(Error::invalid_field(KeyField::PublicExponent, "must be odd"));
    }
    if e == [1] {
        return Err(Error::invalid_field(KeyField::PublicExponent, "must be at least 3"));
    }
    Ok(())
}

/// Serializes `fields` into `out`, which must be exactly `encoded_len` long.
///
/// The values come from a backend; one that does not fit its fixed width
/// means the backend handed back a key outside the policy.
pub(crate) fn encode_into(
    fields: &RsaKeyFields,
    modulus: ModulusLength,
    kind: KeyKind,
    out: &mut [u8],
) -> Result<usize> {
    let exponent = strip_leading_zeros(&fields.public_exponent);
    validate_public_exponent(exponent)?;
    let total = encoded_len(modulus, exponent.len(), kind);
    debug_assert_eq!(out.len(), total);

    let mut writer = FieldWriter::new(out);
    writer.put(&kind.tag());
    writer.put(&(total as u32).to_be_bytes());
    writer.field(KeyField::Modulus, &fields.modulus, KeyField::Modulus.width(modulus))?;
    writer.field(KeyField::PublicExponent, exponent, exponent.len())?;

    if kind.is_private() {
        let private = fields
            .private
            .as_ref()
            .ok_or(Error::PrivateMaterialUnavailable)?;
        for (field, value) in KeyField::PRIVATE.into_iter().zip(private.as_array()) {
            writer.field(field, value, field.width(modulus))?;
        }
    }

    Ok(writer.finish())
}

struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn field(&mut self) -> Result<&'a [u8]> {
        if self.buf.len() < LENGTH_PREFIX {
            return Err(Error::MalformedKeyContainer("truncated field length"));
        }
        let (prefix, rest) = self.buf.split_at(LENGTH_PREFIX);
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if rest.len() < len {
            return Err(Error::MalformedKeyContainer("field runs past end of container"));
        }
        let (value, rest) = rest.split_at(len);
        self.buf = rest;
        Ok(value)
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

struct FieldWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> FieldWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    /// Writes a length prefix and `value` left-padded to `width`.
    fn field(&mut self, field: KeyField, value: &[u8], width: usize) -> Result<()> {
        let value = strip_leading_zeros(value);
        if value.is_empty() || value.len() > width {
            return Err(Error::invalid_field(field, "value does not fit its field"));
        }
        self.put(&(width as u32).to_be_bytes());
        let pad = width - value.len();
        self.buf[self.pos..self.pos + pad].fill(0);
        self.pos += pad;
        self.put(value);
        Ok(())
    }

    fn finish(self) -> usize {
        self.pos
    }
}

/// An owned, structurally valid key container.
///
/// The bytes are kept in a buffer that is wiped on drop, since private
/// containers carry the whole private key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ZeroizingVec", into = "ZeroizingVec")]
pub struct KeyContainer {
    kind: KeyKind,
    bytes: ZeroizingVec,
}

impl KeyContainer {
    /// Wraps container bytes after checking their structure and fields.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = ZeroizingVec(bytes.into());
        let kind = validate_key_container(&bytes)?;
        Ok(Self { kind, bytes })
    }

    pub(crate) fn from_encoded(kind: KeyKind, bytes: ZeroizingVec) -> Self {
        Self { kind, bytes }
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        to_base64(&self.bytes)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        Self::from_bytes(from_base64(encoded)?)
    }
}

impl AsRef<[u8]> for KeyContainer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<ZeroizingVec> for KeyContainer {
    type Error = Error;

    fn try_from(bytes: ZeroizingVec) -> Result<Self> {
        let kind = validate_key_container(&bytes)?;
        Ok(Self { kind, bytes })
    }
}

impl From<KeyContainer> for ZeroizingVec {
    fn from(container: KeyContainer) -> Self {
        container.bytes
    }
}

impl fmt::Debug for KeyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyContainer")
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}
