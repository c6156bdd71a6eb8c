//! Attestations - signed third-party claims about an identity
//!
//! Attestations arrive from untrusted relays in a loose, relay-shaped form
//! ([`RawAttestation`]). They are resolved exactly once at the boundary into
//! the strict [`Attestation`] record; everything downstream only ever sees
//! well-formed attestations with a non-empty issuer and subject.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Open-vocabulary attestation label
///
/// Labels come from untrusted sources, so this is a normalized string rather
/// than a closed enum. Unknown labels fall back to the default weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestationType(String);

impl AttestationType {
    pub const SERVICE_QUALITY: &'static str = "service-quality";
    pub const GENERAL_TRUST: &'static str = "general-trust";
    pub const UNSPECIFIED: &'static str = "unspecified";

    /// Normalize a label (trimmed, lowercased, empty becomes `unspecified`)
    pub fn new(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            Self::unspecified()
        } else {
            Self(label)
        }
    }

    pub fn service_quality() -> Self {
        Self(Self::SERVICE_QUALITY.to_string())
    }

    pub fn general_trust() -> Self {
        Self(Self::GENERAL_TRUST.to_string())
    }

    pub fn unspecified() -> Self {
        Self(Self::UNSPECIFIED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttestationType {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl fmt::Display for AttestationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A well-formed attestation: `issuer` claims something about `subject`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    /// Opaque unique handle
    pub id: String,

    /// Identity making the claim
    pub issuer: String,

    /// Identity the claim is about
    pub subject: String,

    /// Creation time, unix seconds
    pub created_at: i64,

    /// Claim label
    pub attestation_type: AttestationType,

    /// Free text, never scored
    pub content: String,

    /// Opaque signature, validated upstream
    pub signature: String,
}

impl Attestation {
    /// Create a new attestation builder
    pub fn builder(issuer: &str, subject: &str) -> AttestationBuilder {
        AttestationBuilder::new(issuer, subject)
    }

    /// Age in seconds relative to `now`; future timestamps count as fresh
    pub fn age_secs(&self, now: i64) -> i64 {
        now.saturating_sub(self.created_at).max(0)
    }

    /// Whether the issuer is attesting about itself
    pub fn is_self_attestation(&self) -> bool {
        self.issuer == self.subject
    }

    fn compute_id(
        issuer: &str,
        subject: &str,
        created_at: i64,
        attestation_type: &AttestationType,
        content: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(issuer.as_bytes());
        hasher.update(b"\n");
        hasher.update(subject.as_bytes());
        hasher.update(b"\n");
        hasher.update(created_at.to_be_bytes());
        hasher.update(attestation_type.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Builder for attestations
pub struct AttestationBuilder {
    id: Option<String>,
    issuer: String,
    subject: String,
    created_at: Option<i64>,
    attestation_type: AttestationType,
    content: String,
    signature: String,
}

impl AttestationBuilder {
    pub fn new(issuer: &str, subject: &str) -> Self {
        Self {
            id: None,
            issuer: issuer.trim().to_string(),
            subject: subject.trim().to_string(),
            created_at: None,
            attestation_type: AttestationType::unspecified(),
            content: String::new(),
            signature: String::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn attestation_type(mut self, label: &str) -> Self {
        self.attestation_type = AttestationType::new(label);
        self
    }

    pub fn created_at(mut self, unix_secs: i64) -> Self {
        self.created_at = Some(unix_secs);
        self
    }

    /// Set `created_at` to `age_secs` before `now`
    pub fn aged(mut self, now: i64, age_secs: i64) -> Self {
        self.created_at = Some(now.saturating_sub(age_secs));
        self
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = signature.to_string();
        self
    }

    pub fn build(self) -> Attestation {
        let created_at = self.created_at.unwrap_or_else(|| Utc::now().timestamp());
        let id = self.id.unwrap_or_else(|| {
            Attestation::compute_id(
                &self.issuer,
                &self.subject,
                created_at,
                &self.attestation_type,
                &self.content,
            )
        });

        Attestation {
            id,
            issuer: self.issuer,
            subject: self.subject,
            created_at,
            attestation_type: self.attestation_type,
            content: self.content,
            signature: self.signature,
        }
    }
}

/// Reasons a raw record is refused at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("missing issuer key")]
    MissingIssuer,

    #[error("missing subject relation")]
    MissingSubject,

    #[error("missing created_at")]
    MissingTimestamp,

    #[error("unparsable created_at: {0}")]
    BadTimestamp(String),
}

impl IngestError {
    /// Short stable label for drop tallies
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingIssuer => "missing_issuer",
            Self::MissingSubject => "missing_subject",
            Self::MissingTimestamp => "missing_timestamp",
            Self::BadTimestamp(_) => "bad_timestamp",
        }
    }
}

/// Timestamp as relays actually send it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

impl RawTimestamp {
    /// Resolve to unix seconds
    pub fn resolve(&self) -> Result<i64, IngestError> {
        match self {
            Self::Seconds(secs) => Ok(*secs),
            Self::Fractional(secs) if secs.is_finite() => Ok(secs.floor() as i64),
            Self::Fractional(secs) => Err(IngestError::BadTimestamp(secs.to_string())),
            Self::Text(text) => {
                let text = text.trim();
                if let Ok(secs) = text.parse::<i64>() {
                    return Ok(secs);
                }
                DateTime::parse_from_rfc3339(text)
                    .map(|dt| dt.timestamp())
                    .map_err(|_| IngestError::BadTimestamp(text.to_string()))
            }
        }
    }
}

/// Relay-shaped attestation record, before boundary resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAttestation {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, alias = "issuer")]
    pub pubkey: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub created_at: Option<RawTimestamp>,

    #[serde(default)]
    pub kind: Option<u32>,

    #[serde(default, alias = "type")]
    pub attestation_type: Option<String>,

    #[serde(default)]
    pub tags: Vec<Vec<String>>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub sig: Option<String>,
}

impl RawAttestation {
    /// First value of a tag named `name`, if non-empty
    fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags.iter().find_map(|tag| match tag.as_slice() {
            [key, value, ..] if key == name && !value.trim().is_empty() => Some(value.trim()),
            _ => None,
        })
    }

    fn resolve_issuer(&self) -> Option<String> {
        match self.pubkey.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Some(key.to_string()),
            _ => None,
        }
    }

    fn resolve_subject(&self) -> Option<String> {
        match self.subject.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Some(key.to_string()),
            _ => self.tag_value("p").map(str::to_string),
        }
    }

    fn resolve_type(&self) -> AttestationType {
        match self.attestation_type.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => AttestationType::new(label),
            _ => self
                .tag_value("l")
                .or_else(|| self.tag_value("t"))
                .map(AttestationType::new)
                .unwrap_or_else(AttestationType::unspecified),
        }
    }
}

impl TryFrom<RawAttestation> for Attestation {
    type Error = IngestError;

    fn try_from(raw: RawAttestation) -> Result<Self, Self::Error> {
        let issuer = raw.resolve_issuer().ok_or(IngestError::MissingIssuer)?;
        let subject = raw.resolve_subject().ok_or(IngestError::MissingSubject)?;
        let created_at = raw
            .created_at
            .as_ref()
            .ok_or(IngestError::MissingTimestamp)?
            .resolve()?;
        let attestation_type = raw.resolve_type();

        let mut builder = Attestation::builder(&issuer, &subject)
            .attestation_type(attestation_type.as_str())
            .created_at(created_at)
            .content(&raw.content)
            .signature(raw.sig.as_deref().unwrap_or_default());

        if let Some(id) = raw.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            builder = builder.id(id);
        }

        Ok(builder.build())
    }
}

/// Outcome of ingesting a batch of raw records
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Records that resolved into attestations (duplicates removed)
    pub accepted: Vec<Attestation>,

    /// Drop tally by reason
    pub dropped: BTreeMap<&'static str, usize>,
}

impl IngestReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Resolve a batch of raw records, dropping malformed ones and duplicate ids
pub fn ingest<I>(raws: I) -> IngestReport
where
    I: IntoIterator<Item = RawAttestation>,
{
    let mut report = IngestReport::default();
    let mut seen = HashSet::new();

    for raw in raws {
        match Attestation::try_from(raw) {
            Ok(attestation) => {
                if seen.insert(attestation.id.clone()) {
                    report.accepted.push(attestation);
                } else {
                    *report.dropped.entry("duplicate").or_default() += 1;
                }
            }
            Err(e) => {
                tracing::trace!("Dropping raw attestation: {}", e);
                *report.dropped.entry(e.reason()).or_default() += 1;
            }
        }
    }

    report
}
