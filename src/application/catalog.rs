//! Feature catalog: raw input records, ingestion and the builtin banking catalog

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    ensure_unique_ids, DomainError, DomainResult, FeatureOrder, FeatureRecord, OrderEncoding,
};

/// A catalog entry exactly as it arrives from outside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawFeatureRecord {
    pub id: i64,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub feature_order: Option<String>,
}

impl RawFeatureRecord {
    pub fn new(id: i64, feature: &str, feature_order: Option<&str>) -> Self {
        Self {
            id,
            feature: Some(feature.to_string()),
            feature_order: feature_order.map(str::to_string),
        }
    }
}

/// How ingestion treats an undecodable `feature_order`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    /// Reject the catalog on any token that is not a canonical id
    Strict,
    /// Keep every record; an unresolvable parent token attaches the node under the root
    #[default]
    Lenient,
}

impl std::str::FromStr for EncodingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown encoding policy: {other}")),
        }
    }
}

/// Validated, ordered list of feature records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    records: Vec<FeatureRecord>,
}

impl Catalog {
    /// Validate raw records.
    ///
    /// Fails on non-positive ids, missing names and duplicate ids. Bad
    /// `feature_order` strings fail under [`EncodingPolicy::Strict`]; under
    /// [`EncodingPolicy::Lenient`] they are decoded token by token and the
    /// builder decides what the bad tokens affect.
    #[instrument(level = "debug", skip(raw), fields(records = raw.len()))]
    pub fn from_raw(raw: Vec<RawFeatureRecord>, policy: EncodingPolicy) -> DomainResult<Self> {
        let mut records = Vec::with_capacity(raw.len());
        for (index, entry) in raw.into_iter().enumerate() {
            records.push(Self::ingest(index, entry, policy)?);
        }
        ensure_unique_ids(&records)?;
        debug!("catalog ingested: {} records", records.len());
        Ok(Self { records })
    }

    fn ingest(index: usize, entry: RawFeatureRecord, policy: EncodingPolicy) -> DomainResult<FeatureRecord> {
        let id = u32::try_from(entry.id)
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| DomainError::Validation {
                index,
                message: format!("id must be a positive integer, got {}", entry.id),
            })?;

        let name = match entry.feature {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                return Err(DomainError::Validation {
                    index,
                    message: format!("feature {id} has no name"),
                })
            }
        };

        let order = match entry.feature_order {
            None => FeatureOrder::Unordered,
            Some(raw) => match policy {
                EncodingPolicy::Strict => match OrderEncoding::parse(&raw) {
                    Ok(encoding) => FeatureOrder::Chains(encoding),
                    Err(e) => {
                        return Err(DomainError::InvalidEncoding {
                            id,
                            raw,
                            reason: e.reason,
                        })
                    }
                },
                EncodingPolicy::Lenient => {
                    let encoding = OrderEncoding::parse_lenient(&raw);
                    if !encoding.is_well_formed() {
                        debug!(id, raw = %raw, "keeping feature_order with non-integer tokens");
                    }
                    FeatureOrder::Chains(encoding)
                }
            },
        };

        Ok(FeatureRecord::new(id, name, order))
    }

    /// Parse a JSON array of `{id, feature, feature_order}` objects.
    pub fn from_json_str(json: &str, policy: EncodingPolicy) -> ApplicationResult<Self> {
        let raw: Vec<RawFeatureRecord> =
            serde_json::from_str(json).map_err(|e| ApplicationError::Catalog {
                message: format!("parse catalog JSON: {}", e),
            })?;
        Ok(Self::from_raw(raw, policy)?)
    }

    /// The banking feature catalog shipped with the crate.
    pub fn builtin() -> Self {
        let records = BUILTIN_FEATURES
            .iter()
            .map(|&(id, name, order)| {
                let order = match order {
                    None => FeatureOrder::Unordered,
                    Some(raw) => FeatureOrder::Chains(OrderEncoding::parse_lenient(raw)),
                };
                FeatureRecord::new(id, name, order)
            })
            .collect();
        Self { records }
    }

    /// Builtin catalog in its external shape.
    pub fn builtin_raw() -> Vec<RawFeatureRecord> {
        BUILTIN_FEATURES
            .iter()
            .map(|&(id, name, order)| RawFeatureRecord::new(i64::from(id), name, order))
            .collect()
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn get(&self, id: u32) -> Option<&FeatureRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

const BUILTIN_FEATURES: &[(u32, &str, Option<&str>)] = &[
    (1, "Credit Card Application", Some("31-1")),
    (2, "Credit Card Limit Application", Some("31-1-2")),
    (3, "Credit Card Purchase", Some("31-1-2-3")),
    (4, "Credit Card Dept Payment", Some("31-1-2-3-4")),
    (5, "Credit Card Deactivation", Some("31-1-2-5,31-1-2-3-4-5")),
    (6, "Credit Card PIN Creation", Some("31-1-2-6")),
    (7, "Anonymous Debit Card Addition", Some("8")),
    (8, "Personalized Debit Card Application", Some("31-8")),
    (9, "Personalized Debit Card Received", Some("31-8-9")),
    (10, "Virtual Card Generation", Some("10")),
    (11, "Debit Card Purchase", Some("7,8-9,10-11")),
    (12, "ATM Deposit", Some("12")),
    (13, "ATM Withdrawal", Some("12,14,16,17,19-13")),
    (14, "QR Code Deposit", Some("14")),
    (15, "QR Code Withdrawal", Some("12,14,16,17,19-15")),
    (16, "Deposit from Own Account", Some("16")),
    (17, "Incoming Wire Transfer", Some("17")),
    (18, "Outgoing Wire Transfer", Some("12,14,16,17,19-18")),
    (19, "Incoming EFT Transfer", Some("19")),
    (20, "Outgoing EFT Transfer", Some("12,14,16,17,19-20")),
    (21, "Sending Money to Mobile Phone", Some("12,14,16,17,19-21")),
    (22, "Installment Loan Application", Some("31-22")),
    (23, "Installment Loan Limit Application", Some("31-22-23")),
    (24, "Purchasing with Installment Loan", Some("31-22-23-24")),
    (25, "Installment Loan Payment", Some("31-22-23-24-25")),
    (26, "Credit Application for BNPL", Some("31-26")),
    (27, "Credit Limit Application for BNPL", Some("31-26-27")),
    (28, "Purchasing with BNPL", Some("31-26-27-28")),
    (29, "BNPL Payment", Some("31-26-27-28-29")),
    (30, "Login", None),
    (31, "Upgrade Account", Some("31")),
    (32, "Pay with Hadi QR Code", Some("12,14,16,17,19-32")),
    (33, "Closing Hadi Account", Some("33")),
    (34, "Hadi Gold Membership", Some("34")),
    (35, "Hadi Gold Membership Cancellation", Some("34-35")),
    (36, "Hadi Gold A101 Loyalty", Some("34-32-36")),
    (37, "Hadi Gold EVE Loyalty", Some("34-32-37")),
    (38, "Hadi Gold English Home Loyalty", Some("34-32-38")),
    (39, "Create Hadi Together Group", Some("39")),
    (40, "Join Hadi Together Group", Some("40")),
    (41, "Hadi Together Loyalty", Some("39,40-41")),
    (42, "Pay with Hadi A101 QR Code", Some("12,14,16,17,19-42")),
    (43, "Invoice Payment", Some("12,14,16,17,19-43")),
    (44, "Scheduled Invoice Payment", Some("12,14,16,17,19-44")),
    (45, "Open Time Deposit Account", Some("31-45")),
    (46, "Open Demand Deposit Account", Some("31-46")),
    (47, "Close Time Deposit Account", Some("31-45-47")),
    (48, "Close Demand Deposit Account", Some("31-46-48")),
    (49, "Open USD Account", Some("31-49")),
    (50, "Open EURO Account", Some("31-50")),
    (51, "Open Gold Account", Some("31-51")),
    (52, "Close USD Account", Some("31-49-52")),
    (53, "Close EURO Account", Some("31-50-53")),
    (54, "Close Gold Account", Some("31-51-54")),
    (55, "Buy USD", Some("31-49-55")),
    (56, "Buy EURO", Some("31-50-56")),
    (57, "Buy Gold", Some("31-51-57")),
    (58, "Sell USD", Some("31-49-58")),
    (59, "Sell EURO", Some("31-50-59")),
    (60, "Sell Gold", Some("31-51-60")),
];
