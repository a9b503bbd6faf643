//! Identifiers and timestamps shared across the custody engine
use crate::error::PrincipalError;
use crate::utils;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Prefix used for generated wallet ids.
pub const WALLET_HRP: &str = "wallet";

/// Opaque, pre-authenticated identity of an owner, depositor or transfer
/// destination. Always a valid bech32 string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal(String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletId(String);

/// Index of a transaction inside one wallet's log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(pub u64);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl Principal {
    /// A fresh principal derived from a uuid7.
    pub fn generate(prefix: &str) -> Result<Self, PrincipalError> {
        utils::new_uuid_to_bech32(prefix)
            .map(Self)
            .map_err(|e| PrincipalError::Encoding(e.to_string()))
    }

    pub fn from_bytes(prefix: &str, data: &[u8]) -> Result<Self, PrincipalError> {
        utils::encode_bech32(prefix, data)
            .map(Self)
            .map_err(|e| PrincipalError::Encoding(e.to_string()))
    }

    /// The all-zero identity. Never accepted as an owner or destination.
    pub fn zero(prefix: &str) -> Result<Self, PrincipalError> {
        Self::from_bytes(prefix, &[0u8; 16])
    }

    /// Accepts any valid bech32 string and stores its canonical lowercase
    /// bech32m form, so one identity always compares equal to itself.
    pub fn parse(encoded: &str) -> Result<Self, PrincipalError> {
        let (hrp, data) = utils::decode_bech32(encoded)
            .map_err(|e| PrincipalError::Malformed(encoded.to_string(), e.to_string()))?;
        if data.is_empty() {
            return Err(PrincipalError::Malformed(
                encoded.to_string(),
                "empty data part".into(),
            ));
        }
        Self::from_bytes(&hrp, &data)
    }

    pub fn is_zero(&self) -> bool {
        match utils::decode_bech32(&self.0) {
            Ok((_, data)) => data.iter().all(|b| *b == 0),
            Err(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl WalletId {
    pub fn generate() -> Result<Self, PrincipalError> {
        utils::new_uuid_to_bech32(WALLET_HRP)
            .map(Self)
            .map_err(|e| PrincipalError::Encoding(e.to_string()))
    }

    pub fn parse(encoded: &str) -> Result<Self, PrincipalError> {
        let (hrp, data) = utils::decode_bech32(encoded)
            .map_err(|e| PrincipalError::Malformed(encoded.to_string(), e.to_string()))?;
        if hrp != WALLET_HRP {
            return Err(PrincipalError::Malformed(
                encoded.to_string(),
                format!("expected prefix {WALLET_HRP}, got {hrp}"),
            ));
        }
        utils::encode_bech32(&hrp, &data)
            .map(Self)
            .map_err(|e| PrincipalError::Encoding(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TxId {
    /// `None` once the id space is exhausted.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(TxId)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for WalletId {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<C> minicbor::Encode<C> for Principal {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Principal {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let encoded = d.str()?;

        Principal::parse(encoded)
            .map_err(|_| minicbor::decode::Error::message("principal is not valid bech32"))
    }
}

impl<C> minicbor::Encode<C> for TxId {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.u64(self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TxId {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(TxId(d.u64()?))
    }
}

// seconds and sub-second nanos, so every representable instant encodes
impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?
            .i64(self.0.timestamp())?
            .u32(self.0.timestamp_subsec_nanos())?
            .ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        d.array()?;
        let secs = d.i64()?;
        let nsecs = d.u32()?;

        DateTime::from_timestamp(secs, nsecs)
            .map(TimeStamp)
            .ok_or(minicbor::decode::Error::message(
                "failed to convert timestamp to utc",
            ))
    }
}
