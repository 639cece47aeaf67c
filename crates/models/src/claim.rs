use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ModelError;

pub const CONFIRMATION_PREFIX: &str = "CLM-";
/// Uppercase letters and digits without the look-alikes `0`, `1`, `I`, `O`.
pub const CONFIRMATION_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CONFIRMATION_LEN: usize = 8;

pub const DEFAULT_EVIDENCE_LABEL: &str = "EVIDENCE";
pub const DEFAULT_INCIDENT_TYPE: &str = "other";
pub const DEFAULT_DRIVABILITY: &str = "unknown";

pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";
pub const URL_REQUIRED: &str = "url is required";
pub const INVALID_STATUS: &str = "Invalid status";

/// Review state of a claim.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    UnderReview,
    Approved,
    Denied,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 3] = [Self::UnderReview, Self::Approved, Self::Denied];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }

    /// Approved or denied.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::UnderReview)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ModelError::Validation(INVALID_STATUS.into()))
    }
}

/// One proof clip attached to a claim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub url: String,
    pub label: String,
    pub added_at: DateTime<Utc>,
}

/// A submitted vehicle-incident claim and its review state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Claim {
    pub id: Uuid,
    pub confirmation_number: String,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
    pub policyholder_name: String,
    pub policyholder_email: String,
    #[serde(default)]
    pub policyholder_phone: String,
    pub incident_date: String,
    pub vehicle_info: String,
    #[serde(default = "default_incident_type")]
    pub incident_type: String,
    pub damage_description: String,
    #[serde(default)]
    pub vin_visible: bool,
    #[serde(default)]
    pub plate_visible: bool,
    #[serde(default)]
    pub airbag_deployed: bool,
    #[serde(default)]
    pub warning_lights: bool,
    #[serde(default = "default_drivability")]
    pub drivability: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

fn default_incident_type() -> String {
    DEFAULT_INCIDENT_TYPE.to_string()
}

fn default_drivability() -> String {
    DEFAULT_DRIVABILITY.to_string()
}

/// The persisted unit: every claim, in submission order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClaimsDocument {
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl ClaimsDocument {
    pub fn find(&self, id: Uuid) -> Option<&Claim> {
        self.claims.iter().find(|c| c.id == id)
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Claim> {
        self.claims.iter_mut().find(|c| c.id == id)
    }

    pub fn has_confirmation_number(&self, number: &str) -> bool {
        self.claims.iter().any(|c| c.confirmation_number == number)
    }
}

/// Submission payload. Every field may be absent; `validate` decides.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClaimInput {
    #[serde(default)]
    pub policyholder_name: Option<String>,
    #[serde(default)]
    pub policyholder_email: Option<String>,
    #[serde(default)]
    pub policyholder_phone: Option<String>,
    #[serde(default)]
    pub incident_date: Option<String>,
    #[serde(default)]
    pub vehicle_info: Option<String>,
    #[serde(default)]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub damage_description: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub vin_visible: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub plate_visible: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub airbag_deployed: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub warning_lights: bool,
    #[serde(default)]
    pub drivability: Option<String>,
}

/// A submission whose required fields are known to be present.
#[derive(Clone, Debug)]
pub struct NewClaim {
    policyholder_name: String,
    policyholder_email: String,
    policyholder_phone: String,
    incident_date: String,
    vehicle_info: String,
    incident_type: String,
    damage_description: String,
    vin_visible: bool,
    plate_visible: bool,
    airbag_deployed: bool,
    warning_lights: bool,
    drivability: String,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ClaimInput {
    /// Check the required fields and fill defaults for the optional ones.
    /// An empty string counts as missing.
    pub fn validate(self) -> Result<NewClaim, ModelError> {
        let missing = || ModelError::Validation(MISSING_REQUIRED_FIELDS.into());
        let policyholder_name = required(self.policyholder_name).ok_or_else(missing)?;
        let policyholder_email = required(self.policyholder_email).ok_or_else(missing)?;
        let incident_date = required(self.incident_date).ok_or_else(missing)?;
        let vehicle_info = required(self.vehicle_info).ok_or_else(missing)?;
        let damage_description = required(self.damage_description).ok_or_else(missing)?;

        Ok(NewClaim {
            policyholder_name,
            policyholder_email,
            policyholder_phone: self.policyholder_phone.unwrap_or_default(),
            incident_date,
            vehicle_info,
            incident_type: self.incident_type.unwrap_or_else(default_incident_type),
            damage_description,
            vin_visible: self.vin_visible,
            plate_visible: self.plate_visible,
            airbag_deployed: self.airbag_deployed,
            warning_lights: self.warning_lights,
            drivability: self.drivability.unwrap_or_else(default_drivability),
        })
    }
}

impl NewClaim {
    /// Turn the submission into a stored claim: under review, no evidence.
    pub fn into_claim(self, id: Uuid, confirmation_number: String, submitted_at: DateTime<Utc>) -> Claim {
        Claim {
            id,
            confirmation_number,
            status: ClaimStatus::UnderReview,
            submitted_at,
            policyholder_name: self.policyholder_name,
            policyholder_email: self.policyholder_email,
            policyholder_phone: self.policyholder_phone,
            incident_date: self.incident_date,
            vehicle_info: self.vehicle_info,
            incident_type: self.incident_type,
            damage_description: self.damage_description,
            vin_visible: self.vin_visible,
            plate_visible: self.plate_visible,
            airbag_deployed: self.airbag_deployed,
            warning_lights: self.warning_lights,
            drivability: self.drivability,
            evidence: Vec::new(),
        }
    }
}

/// Evidence attach payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvidenceInput {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewEvidence {
    url: String,
    label: String,
}

impl EvidenceInput {
    pub fn validate(self) -> Result<NewEvidence, ModelError> {
        let url = required(self.url).ok_or_else(|| ModelError::Validation(URL_REQUIRED.into()))?;
        let label = self.label.unwrap_or_else(|| DEFAULT_EVIDENCE_LABEL.to_string());
        Ok(NewEvidence { url, label })
    }
}

impl NewEvidence {
    pub fn attach(self, added_at: DateTime<Utc>) -> Evidence {
        Evidence { url: self.url, label: self.label, added_at }
    }
}

/// Draw a `CLM-XXXXXXXX` code. Uniqueness is the caller's concern.
pub fn generate_confirmation_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut out = String::with_capacity(CONFIRMATION_PREFIX.len() + CONFIRMATION_LEN);
    out.push_str(CONFIRMATION_PREFIX);
    for _ in 0..CONFIRMATION_LEN {
        let idx = rng.gen_range(0..CONFIRMATION_ALPHABET.len());
        out.push(CONFIRMATION_ALPHABET[idx] as char);
    }
    out
}

pub fn is_confirmation_number(s: &str) -> bool {
    match s.strip_prefix(CONFIRMATION_PREFIX) {
        Some(rest) => rest.len() == CONFIRMATION_LEN && rest.bytes().all(|b| CONFIRMATION_ALPHABET.contains(&b)),
        None => false,
    }
}

/// Whether a read at `now` should flip the claim to approved.
///
/// Only `under_review` claims qualify, and only once `dwell` has fully
/// elapsed since submission (the boundary itself counts).
pub fn auto_approve_due(
    status: ClaimStatus,
    submitted_at: DateTime<Utc>,
    now: DateTime<Utc>,
    dwell: Duration,
) -> bool {
    if status != ClaimStatus::UnderReview {
        return false;
    }
    match chrono::Duration::from_std(dwell) {
        Ok(dwell) => now.signed_duration_since(submitted_at) >= dwell,
        Err(_) => false,
    }
}

/// Form-style boolean coercion: null, false, 0 and "" are false, anything else true.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    fn full_input() -> ClaimInput {
        serde_json::from_value(json!({
            "policyholder_name": "A",
            "policyholder_email": "a@b.com",
            "incident_date": "2024-01-01",
            "vehicle_info": "Car",
            "damage_description": "dent"
        }))
        .unwrap()
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in ClaimStatus::ALL {
            assert_eq!(status.as_str().parse::<ClaimStatus>().unwrap(), status);
        }
        assert_eq!(
            "closed".parse::<ClaimStatus>(),
            Err(ModelError::Validation(INVALID_STATUS.into()))
        );
        assert!("Approved".parse::<ClaimStatus>().is_err());
        assert_eq!(serde_json::to_value(ClaimStatus::UnderReview).unwrap(), json!("under_review"));
    }

    #[test]
    fn confirmation_number_uses_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = generate_confirmation_number(&mut rng);
            assert!(is_confirmation_number(&n), "bad number {n}");
            assert!(!n[4..].contains(['0', '1', 'I', 'O']));
        }
        assert!(!is_confirmation_number("CLM-ABCDEFG"));
        assert!(!is_confirmation_number("CLM-ABCDEFG0"));
        assert!(!is_confirmation_number("XYZ-ABCDEFGH"));
    }

    #[test]
    fn auto_approve_boundary() {
        let t0 = Utc::now();
        let dwell = Duration::from_secs(30);
        let before = t0 + chrono::Duration::milliseconds(29_999);
        let at = t0 + chrono::Duration::milliseconds(30_000);
        assert!(!auto_approve_due(ClaimStatus::UnderReview, t0, before, dwell));
        assert!(auto_approve_due(ClaimStatus::UnderReview, t0, at, dwell));
        assert!(!auto_approve_due(ClaimStatus::Denied, t0, at, dwell));
        assert!(!auto_approve_due(ClaimStatus::Approved, t0, at, dwell));
    }

    #[test]
    fn validate_fills_defaults() {
        let new = full_input().validate().unwrap();
        let id = Uuid::new_v4();
        let claim = new.into_claim(id, "CLM-ABCDEFGH".into(), Utc::now());
        assert_eq!(claim.id, id);
        assert_eq!(claim.status, ClaimStatus::UnderReview);
        assert_eq!(claim.incident_type, "other");
        assert_eq!(claim.drivability, "unknown");
        assert_eq!(claim.policyholder_phone, "");
        assert!(!claim.vin_visible && !claim.airbag_deployed);
        assert!(claim.evidence.is_empty());
    }

    #[test]
    fn validate_rejects_missing_or_empty_required() {
        let mut input = full_input();
        input.vehicle_info = None;
        assert_eq!(
            input.validate().unwrap_err(),
            ModelError::Validation(MISSING_REQUIRED_FIELDS.into())
        );

        let mut input = full_input();
        input.policyholder_email = Some(String::new());
        assert!(input.validate().is_err());
    }

    #[test]
    fn flags_coerce_like_form_values() {
        let input: ClaimInput = serde_json::from_value(json!({
            "vin_visible": "on",
            "plate_visible": 0,
            "airbag_deployed": 1,
            "warning_lights": null
        }))
        .unwrap();
        assert!(input.vin_visible);
        assert!(!input.plate_visible);
        assert!(input.airbag_deployed);
        assert!(!input.warning_lights);
    }

    #[test]
    fn evidence_label_defaults() {
        let ev = EvidenceInput { url: Some("https://x/clip.mp4".into()), label: None }
            .validate()
            .unwrap()
            .attach(Utc::now());
        assert_eq!(ev.label, DEFAULT_EVIDENCE_LABEL);

        let err = EvidenceInput { url: None, label: Some("FRONT".into()) }.validate().unwrap_err();
        assert_eq!(err, ModelError::Validation(URL_REQUIRED.into()));
    }

    #[test]
    fn stored_claim_without_evidence_key_loads() {
        let doc: ClaimsDocument = serde_json::from_value(json!({
            "claims": [{
                "id": "6f1c2d7e-9a52-4a8e-8d53-0c6a4f3e1b20",
                "confirmation_number": "CLM-ABCDEFGH",
                "status": "denied",
                "submitted_at": "2024-01-01T00:00:00.000Z",
                "policyholder_name": "A",
                "policyholder_email": "a@b.com",
                "incident_date": "2024-01-01",
                "vehicle_info": "Car",
                "damage_description": "dent"
            }]
        }))
        .unwrap();
        let claim = &doc.claims[0];
        assert_eq!(claim.status, ClaimStatus::Denied);
        assert!(claim.evidence.is_empty());
        assert!(doc.has_confirmation_number("CLM-ABCDEFGH"));
        assert!(doc.find(claim.id).is_some());
    }
}
