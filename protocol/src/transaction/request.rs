//! Shape checks for transfer requests arriving from outside the process.
//!
//! A [`TransferRequest`] carries raw strings exactly as a caller sent them.
//! [`TransferRequest::validate`] rejects anything that could never become a
//! well-formed transaction before any hashing or key material is involved:
//!
//! - addresses must be 40 hex characters
//! - a signature, when present, must be 128 hex characters
//! - the amount must be strictly positive, unless the request is a reward
//!
//! Passing validation says nothing about authorization. A well-shaped
//! request can still carry a forged signature.
//!
//! [`TransferRequest::into_record`] is the exception: a record is about to be
//! verified, so it only checks what verification cannot. An unsigned record
//! with a zero amount must still report the missing signature first, and a
//! truncated signature is a mismatch, not a malformed request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::builder::{Transaction, TransactionBuilder};
use super::record::TransactionRecord;
use super::types::Amount;
use crate::config::SIGNATURE_HEX_LENGTH;
use crate::crypto::{Address, AddressError};

/// Rejections raised by [`TransferRequest::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid {field}: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: AddressError,
    },

    #[error("signature must be 128 hex characters")]
    InvalidSignature,

    #[error("amount must be > 0, got {0}")]
    NonPositiveAmount(Amount),

    #[error("timestamp is required")]
    MissingTimestamp,
}

/// An inbound transfer as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default)]
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: Amount,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub signature: Option<String>,
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, RequestError> {
    Address::parse(value).map_err(|source| RequestError::InvalidAddress { field, source })
}

impl TransferRequest {
    /// `true` when no sender is named.
    pub fn is_reward(&self) -> bool {
        self.from_address.is_none()
    }

    /// Runs every shape check, failing on the first violation.
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(from) = &self.from_address {
            parse_address("fromAddress", from)?;
        }
        parse_address("toAddress", &self.to_address)?;

        if let Some(sig) = &self.signature {
            if sig.len() != SIGNATURE_HEX_LENGTH || !sig.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(RequestError::InvalidSignature);
            }
        }

        if !self.is_reward() && self.amount <= 0 {
            return Err(RequestError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }

    /// Validates and builds an unsigned draft.
    ///
    /// Uses the request's timestamp when given, the current time otherwise.
    /// Any signature in the request is ignored.
    pub fn into_draft(self) -> Result<Transaction, RequestError> {
        self.validate()?;
        let mut builder =
            TransactionBuilder::new(parse_address("toAddress", &self.to_address)?, self.amount);
        if let Some(from) = &self.from_address {
            builder = builder.from_address(parse_address("fromAddress", from)?);
        }
        if let Some(ts) = self.timestamp {
            builder = builder.timestamp(ts);
        }
        Ok(builder.build())
    }

    /// Converts into a wire record, signature included.
    ///
    /// Only the addresses and the timestamp are checked. The amount and the
    /// signature pass through untouched for [`TransactionRecord::is_valid`]
    /// to judge. A record describes an existing transaction, so the
    /// timestamp is mandatory here.
    pub fn into_record(self) -> Result<TransactionRecord, RequestError> {
        let from_address = self
            .from_address
            .as_deref()
            .map(|from| parse_address("fromAddress", from))
            .transpose()?;
        let to_address = parse_address("toAddress", &self.to_address)?;
        let timestamp = self.timestamp.ok_or(RequestError::MissingTimestamp)?;

        Ok(TransactionRecord {
            from_address,
            to_address,
            amount: self.amount,
            timestamp,
            signature: self.signature.map(|s| s.to_ascii_lowercase()),
        })
    }
}
