use std::{sync::Arc, time::Duration};

use models::claim::{
    auto_approve_due, generate_confirmation_number, ClaimInput, EvidenceInput, INVALID_STATUS,
};
use models::{Claim, ClaimStatus, ClaimsDocument, Evidence};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::ServiceError;
use crate::storage::ClaimStore;

pub const DEFAULT_AUTO_APPROVE_AFTER: Duration = Duration::from_secs(30);
const CLAIM_NOT_FOUND: &str = "Claim not found";
const MAX_CONFIRMATION_ATTEMPTS: usize = 16;

/// What a submitter gets back: enough to look the claim up later.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClaimReceipt {
    pub id: Uuid,
    pub confirmation_number: String,
}

/// Claim lifecycle over an injected store and clock.
///
/// Every operation is one load → mutate → save cycle on the whole
/// collection. There is no locking across the cycle; concurrent writers
/// can overwrite each other.
pub struct ClaimService {
    store: Arc<dyn ClaimStore>,
    clock: Arc<dyn Clock>,
    auto_approve_after: Duration,
}

fn claim_not_found() -> ServiceError {
    ServiceError::NotFound(CLAIM_NOT_FOUND.into())
}

/// Draw confirmation numbers until one is not already in the collection.
/// After a bounded number of collisions the last draw is kept anyway.
fn unique_confirmation_number<R: Rng + ?Sized>(doc: &ClaimsDocument, rng: &mut R) -> String {
    let mut number = generate_confirmation_number(rng);
    for _ in 1..MAX_CONFIRMATION_ATTEMPTS {
        if !doc.has_confirmation_number(&number) {
            break;
        }
        number = generate_confirmation_number(rng);
    }
    number
}

impl ClaimService {
    pub fn new(store: Arc<dyn ClaimStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock, auto_approve_after: DEFAULT_AUTO_APPROVE_AFTER }
    }

    pub fn with_auto_approve_after(mut self, dwell: Duration) -> Self {
        self.auto_approve_after = dwell;
        self
    }

    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }

    /// Submit a new claim.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::{claims::ClaimService, clock::SystemClock, storage::MemoryClaimStore};
    /// use models::claim::ClaimInput;
    /// let svc = ClaimService::new(Arc::new(MemoryClaimStore::new()), Arc::new(SystemClock));
    /// let input = ClaimInput {
    ///     policyholder_name: Some("A".into()),
    ///     policyholder_email: Some("a@b.com".into()),
    ///     incident_date: Some("2024-01-01".into()),
    ///     vehicle_info: Some("Car".into()),
    ///     damage_description: Some("dent".into()),
    ///     ..Default::default()
    /// };
    /// let receipt = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert!(receipt.confirmation_number.starts_with("CLM-"));
    /// ```
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ClaimInput) -> Result<ClaimReceipt, ServiceError> {
        let new_claim = input.validate()?;

        let mut doc = self.store.load().await;
        let confirmation_number = {
            let mut rng = rand::thread_rng();
            unique_confirmation_number(&doc, &mut rng)
        };
        let claim = new_claim.into_claim(Uuid::new_v4(), confirmation_number, self.clock.now());
        let receipt = ClaimReceipt { id: claim.id, confirmation_number: claim.confirmation_number.clone() };
        doc.claims.push(claim);
        self.store.save(&doc).await?;

        info!(claim_id = %receipt.id, confirmation_number = %receipt.confirmation_number, "claim_created");
        Ok(receipt)
    }

    /// The whole collection as stored; no auto-approve pass.
    pub async fn list(&self) -> ClaimsDocument {
        self.store.load().await
    }

    /// Read one claim, approving it first if it has waited out the dwell time.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Claim, ServiceError> {
        let mut doc = self.store.load().await;
        let now = self.clock.now();
        let claim = doc.find_mut(id).ok_or_else(claim_not_found)?;

        if !auto_approve_due(claim.status, claim.submitted_at, now, self.auto_approve_after) {
            return Ok(claim.clone());
        }

        claim.status = ClaimStatus::Approved;
        let approved = claim.clone();
        self.store.save(&doc).await?;
        info!(claim_id = %id, "claim_auto_approved");
        Ok(approved)
    }

    /// Overwrite the status. Any of the three statuses is accepted, including
    /// putting a resolved claim back under review.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, requested: &str) -> Result<Claim, ServiceError> {
        let status: ClaimStatus = requested
            .parse()
            .map_err(|_| ServiceError::Validation(INVALID_STATUS.into()))?;

        let mut doc = self.store.load().await;
        let claim = doc.find_mut(id).ok_or_else(claim_not_found)?;
        let previous = claim.status;
        if previous.is_resolved() && status == ClaimStatus::UnderReview {
            warn!(claim_id = %id, %previous, "resolved claim put back under review");
        }
        claim.status = status;
        let updated = claim.clone();
        self.store.save(&doc).await?;

        info!(claim_id = %id, %previous, status = %status, "claim_status_updated");
        Ok(updated)
    }

    pub async fn list_evidence(&self, id: Uuid) -> Result<Vec<Evidence>, ServiceError> {
        let doc = self.store.load().await;
        doc.find(id).map(|c| c.evidence.clone()).ok_or_else(claim_not_found)
    }

    /// Append one evidence item; the label defaults to `EVIDENCE`.
    #[instrument(skip(self, input))]
    pub async fn add_evidence(&self, id: Uuid, input: EvidenceInput) -> Result<Claim, ServiceError> {
        let new_evidence = input.validate()?;

        let mut doc = self.store.load().await;
        let now = self.clock.now();
        let claim = doc.find_mut(id).ok_or_else(claim_not_found)?;
        claim.evidence.push(new_evidence.attach(now));
        let updated = claim.clone();
        self.store.save(&doc).await?;

        info!(claim_id = %id, evidence_count = updated.evidence.len(), "evidence_added");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryClaimStore;
    use chrono::Utc;
    use models::claim::is_confirmation_number;
    use rand::{rngs::StdRng, SeedableRng};

    struct Harness {
        store: Arc<MemoryClaimStore>,
        clock: Arc<FixedClock>,
        svc: ClaimService,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryClaimStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let svc = ClaimService::new(store.clone(), clock.clone());
        Harness { store, clock, svc }
    }

    fn input() -> ClaimInput {
        ClaimInput {
            policyholder_name: Some("A".into()),
            policyholder_email: Some("a@b.com".into()),
            incident_date: Some("2024-01-01".into()),
            vehicle_info: Some("Car".into()),
            damage_description: Some("dent".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_starts_under_review() -> Result<(), anyhow::Error> {
        let h = harness();
        let receipt = h.svc.create(input()).await?;
        assert!(is_confirmation_number(&receipt.confirmation_number));

        let claim = h.svc.get(receipt.id).await?;
        assert_eq!(claim.status, ClaimStatus::UnderReview);
        assert_eq!(claim.confirmation_number, receipt.confirmation_number);
        assert_eq!(claim.submitted_at, h.clock.now());
        assert!(claim.evidence.is_empty());
        assert_eq!(h.store.save_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn create_with_missing_field_persists_nothing() {
        let h = harness();
        for strip in 0..5 {
            let mut bad = input();
            match strip {
                0 => bad.policyholder_name = None,
                1 => bad.policyholder_email = None,
                2 => bad.incident_date = None,
                3 => bad.vehicle_info = Some(String::new()),
                _ => bad.damage_description = None,
            }
            let err = h.svc.create(bad).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(ref m) if m == "Missing required fields"));
        }
        assert_eq!(h.store.save_count(), 0);
        assert!(h.store.snapshot().await.claims.is_empty());
    }

    #[tokio::test]
    async fn read_auto_approves_once_after_dwell() -> Result<(), anyhow::Error> {
        let h = harness();
        let receipt = h.svc.create(input()).await?;

        h.clock.advance(chrono::Duration::milliseconds(29_999));
        assert_eq!(h.svc.get(receipt.id).await?.status, ClaimStatus::UnderReview);
        assert_eq!(h.store.save_count(), 1);

        h.clock.advance(chrono::Duration::milliseconds(1));
        assert_eq!(h.svc.get(receipt.id).await?.status, ClaimStatus::Approved);
        assert_eq!(h.store.save_count(), 2);
        assert_eq!(h.store.snapshot().await.claims[0].status, ClaimStatus::Approved);

        // already approved: no further writes
        h.clock.advance(chrono::Duration::seconds(60));
        assert_eq!(h.svc.get(receipt.id).await?.status, ClaimStatus::Approved);
        assert_eq!(h.store.save_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn stale_stored_claim_is_approved_on_first_read() -> Result<(), anyhow::Error> {
        let now = Utc::now();
        let stale = input()
            .validate()?
            .into_claim(Uuid::new_v4(), "CLM-AAAA2222".into(), now - chrono::Duration::minutes(2));
        let fresh = input()
            .validate()?
            .into_claim(Uuid::new_v4(), "CLM-BBBB3333".into(), now);
        let store = Arc::new(MemoryClaimStore::with_document(ClaimsDocument {
            claims: vec![stale.clone(), fresh.clone()],
        }));
        let svc = ClaimService::new(store.clone(), Arc::new(FixedClock::new(now)));

        // listing never expires anything
        assert_eq!(svc.list().await.claims[0].status, ClaimStatus::UnderReview);
        assert_eq!(store.save_count(), 0);

        assert_eq!(svc.get(stale.id).await?.status, ClaimStatus::Approved);
        assert_eq!(svc.get(fresh.id).await?.status, ClaimStatus::UnderReview);
        assert_eq!(store.save_count(), 1);
        let doc = store.snapshot().await;
        assert_eq!(doc.claims[0].status, ClaimStatus::Approved);
        assert_eq!(doc.claims[1].status, ClaimStatus::UnderReview);
        Ok(())
    }

    #[tokio::test]
    async fn denied_claim_is_not_auto_approved() -> Result<(), anyhow::Error> {
        let h = harness();
        let receipt = h.svc.create(input()).await?;
        h.svc.update_status(receipt.id, "denied").await?;

        h.clock.advance(chrono::Duration::minutes(5));
        assert_eq!(h.svc.get(receipt.id).await?.status, ClaimStatus::Denied);
        Ok(())
    }

    #[tokio::test]
    async fn configurable_dwell() -> Result<(), anyhow::Error> {
        let store = Arc::new(MemoryClaimStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let svc = ClaimService::new(store, clock.clone()).with_auto_approve_after(Duration::from_secs(5));
        let receipt = svc.create(input()).await?;
        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(svc.get(receipt.id).await?.status, ClaimStatus::Approved);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let h = harness();
        let id = Uuid::new_v4();
        assert!(matches!(h.svc.get(id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(h.svc.update_status(id, "approved").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(h.svc.list_evidence(id).await, Err(ServiceError::NotFound(_))));
        let ev = EvidenceInput { url: Some("https://x".into()), label: None };
        assert!(matches!(h.svc.add_evidence(id, ev).await, Err(ServiceError::NotFound(_))));
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn invalid_status_leaves_state_unchanged() -> Result<(), anyhow::Error> {
        let h = harness();
        let receipt = h.svc.create(input()).await?;
        let before = h.store.snapshot().await;

        for bad in ["", "closed", "APPROVED", "pending"] {
            let err = h.svc.update_status(receipt.id, bad).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(ref m) if m == "Invalid status"));
        }
        assert_eq!(h.store.snapshot().await, before);
        assert_eq!(h.store.save_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn status_can_be_set_to_any_valid_value() -> Result<(), anyhow::Error> {
        let h = harness();
        let receipt = h.svc.create(input()).await?;
        assert_eq!(h.svc.update_status(receipt.id, "approved").await?.status, ClaimStatus::Approved);
        assert_eq!(
            h.svc.update_status(receipt.id, "under_review").await?.status,
            ClaimStatus::UnderReview
        );
        Ok(())
    }

    #[tokio::test]
    async fn evidence_appends_in_order() -> Result<(), anyhow::Error> {
        let h = harness();
        let receipt = h.svc.create(input()).await?;

        let err = h
            .svc
            .add_evidence(receipt.id, EvidenceInput { url: None, label: Some("FRONT".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "url is required"));
        assert!(h.svc.list_evidence(receipt.id).await?.is_empty());

        h.svc
            .add_evidence(receipt.id, EvidenceInput { url: Some("https://x/1.mp4".into()), label: None })
            .await?;
        h.clock.advance(chrono::Duration::seconds(1));
        let claim = h
            .svc
            .add_evidence(receipt.id, EvidenceInput { url: Some("https://x/2.mp4".into()), label: Some("REAR".into()) })
            .await?;

        let labels: Vec<_> = claim.evidence.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["EVIDENCE", "REAR"]);
        assert_eq!(claim.evidence[1].added_at, h.clock.now());
        assert_eq!(h.svc.list_evidence(receipt.id).await?, claim.evidence);
        Ok(())
    }

    #[test]
    fn confirmation_numbers_avoid_existing_ones() {
        let mut taken = ClaimsDocument::default();
        let mut probe = StdRng::seed_from_u64(42);
        let first = generate_confirmation_number(&mut probe);
        let template = models::claim::ClaimInput {
            policyholder_name: Some("A".into()),
            policyholder_email: Some("a@b.com".into()),
            incident_date: Some("2024-01-01".into()),
            vehicle_info: Some("Car".into()),
            damage_description: Some("dent".into()),
            ..Default::default()
        };
        taken.claims.push(template.validate().unwrap().into_claim(Uuid::new_v4(), first.clone(), Utc::now()));

        let mut rng = StdRng::seed_from_u64(42);
        let number = unique_confirmation_number(&taken, &mut rng);
        assert_ne!(number, first);
        assert!(is_confirmation_number(&number));
    }
}
