//! End-to-end tests of the pass lifecycle over the in-memory providers.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)]

use gatepass_core::credential::MIN_HASH_COST;
use gatepass_core::retry::RetryPolicy;
use gatepass_core::{
    AdmissionController, CredentialEncoder, CredentialVerifier, DuplicateField, EntryCount,
    PassDelivery, PassDocument, PassError, Purpose, Registrant, RegistrantId, RegistrationRequest,
    Serial, SigningKey,
};
use gatepass_testing::fixtures::{self, services};
use gatepass_testing::{InMemoryRegistrantRepository, ScriptedAssetStore, init_test_tracing};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn stored(repo: &InMemoryRegistrantRepository, roll: &str) -> Registrant {
    repo.get_by_roll(roll).expect("registrant should exist")
}

#[tokio::test]
async fn test_register_then_admit_three_times() {
    init_test_tracing();
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();

    let request = RegistrationRequest {
        name: "A".to_string(),
        roll_number: "R1".to_string(),
        email: "a@bitmesra.ac.in".to_string(),
        purpose: "Participant".to_string(),
    };
    let issued = services.registration.register(&request).await.unwrap();

    // The token carries exactly the secret stored on the record.
    let verifier = CredentialVerifier::new(fixtures::signing_key().unwrap());
    let secret = verifier.verify(&issued.token).unwrap();
    let record = stored(&repo, "R1");
    assert_eq!(record.credential_secret, secret);
    assert_eq!(record.id, issued.registrant_id);
    assert_eq!(record.entry_count, EntryCount::ZERO);
    assert_eq!(record.purpose, Purpose::Participant);

    for expected in 1..=3 {
        let pass = services.admission.verify_entry(&issued.token).await.unwrap();
        assert_eq!(pass.entry_count.get(), expected);
        assert_eq!(pass.name, "A");
        assert_eq!(pass.roll_number, "R1");
        assert_eq!(pass.purpose, Purpose::Participant);
    }

    assert_eq!(
        services.admission.verify_entry(&issued.token).await,
        Err(PassError::LimitReached)
    );
    assert_eq!(stored(&repo, "R1").entry_count, EntryCount::CAP);
}

#[tokio::test]
async fn test_duplicate_email_and_roll_are_rejected() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();

    services
        .registration
        .register(&fixtures::registration("A", "R1"))
        .await
        .unwrap();

    let mut same_email = fixtures::registration("B", "R2");
    same_email.email = "R1@BITMESRA.AC.IN".to_string();
    assert_eq!(
        services.registration.register(&same_email).await.unwrap_err(),
        PassError::DuplicateEntity {
            field: DuplicateField::Email
        }
    );

    let mut same_roll = fixtures::registration("C", "R1");
    same_roll.email = "c@bitmesra.ac.in".to_string();
    assert_eq!(
        services.registration.register(&same_roll).await.unwrap_err(),
        PassError::DuplicateEntity {
            field: DuplicateField::RollNumber
        }
    );

    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn test_non_institution_email_is_rejected() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();

    let mut request = fixtures::registration("A", "R1");
    request.email = "user@gmail.com".to_string();
    let err = services.registration.register(&request).await.unwrap_err();
    match err {
        PassError::Validation(fields) => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].field, "email");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repo.is_empty());

    request.email = "user@bitmesra.ac.in".to_string();
    assert!(services.registration.register(&request).await.is_ok());
}

#[tokio::test]
async fn test_token_signed_by_another_key_touches_nothing() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();

    let issued = services
        .registration
        .register(&fixtures::registration("A", "R1"))
        .await
        .unwrap();
    let secret = CredentialVerifier::new(fixtures::signing_key().unwrap())
        .verify(&issued.token)
        .unwrap();

    // Same secret, signed with a key the server does not hold.
    let foreign_key = Arc::new(SigningKey::from_secret(b"someone-else").unwrap());
    let forged = CredentialEncoder::new(foreign_key, MIN_HASH_COST)
        .unwrap()
        .sign(&secret, chrono::Utc::now())
        .unwrap();

    assert_eq!(
        services.admission.verify_entry(&forged).await,
        Err(PassError::InvalidCredential)
    );
    assert_eq!(stored(&repo, "R1").entry_count, EntryCount::ZERO);
}

#[tokio::test]
async fn test_valid_token_for_unknown_registrant_is_not_found() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();

    let orphan = services
        .encoder
        .encode(&Serial::generate(), chrono::Utc::now())
        .unwrap();

    assert_eq!(
        services.admission.verify_entry(&orphan.token).await,
        Err(PassError::NotFound)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_at_two_admit_exactly_once() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();

    let issued = services
        .registration
        .register(&fixtures::registration("A", "R1"))
        .await
        .unwrap();
    services.admission.verify_entry(&issued.token).await.unwrap();
    services.admission.verify_entry(&issued.token).await.unwrap();

    let scans = (0..8).map(|_| {
        let admission: AdmissionController<_> = services.admission.clone();
        let token = issued.token.clone();
        tokio::spawn(async move { admission.verify_entry(&token).await })
    });
    let outcomes: Vec<_> = futures::future::join_all(scans)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let admitted = outcomes.iter().filter(|o| o.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|o| matches!(o, Err(PassError::LimitReached)))
        .count();

    assert_eq!(admitted, 1);
    assert_eq!(refused, 7);
    assert_eq!(stored(&repo, "R1").entry_count, EntryCount::CAP);
}

fn delivery(
    repo: &Arc<InMemoryRegistrantRepository>,
    store: &Arc<ScriptedAssetStore>,
) -> PassDelivery<InMemoryRegistrantRepository, ScriptedAssetStore> {
    PassDelivery::new(Arc::clone(repo), Arc::clone(store), RetryPolicy::default())
}

fn pass_document(roll: &str) -> PassDocument {
    PassDocument {
        email: format!("{}@bitmesra.ac.in", roll.to_lowercase()),
        roll_number: roll.to_string(),
        pdf: b"%PDF-1.4 pass".to_vec(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_delivery_recovers_within_retry_budget() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();
    services
        .registration
        .register(&fixtures::registration("A", "R1"))
        .await
        .unwrap();

    let store = Arc::new(ScriptedAssetStore::failing(4));
    let start = tokio::time::Instant::now();
    let asset_ref = delivery(&repo, &store).deliver(&pass_document("R1")).await.unwrap();

    assert_eq!(asset_ref, "asset-1");
    assert_eq!(store.attempts(), 5);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
    assert_eq!(stored(&repo, "R1").asset_ref.as_deref(), Some("asset-1"));

    let uploads = store.uploads();
    assert_eq!(uploads[0].1.name, "aurora25-R1-pass.pdf");
    assert_eq!(uploads[0].1.mime_type, "application/pdf");
}

#[tokio::test(start_paused = true)]
async fn test_delivery_exhaustion_keeps_registration() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let services = services(Arc::clone(&repo)).unwrap();
    let issued = services
        .registration
        .register(&fixtures::registration("A", "R1"))
        .await
        .unwrap();

    let store = Arc::new(ScriptedAssetStore::always_failing());
    let err = delivery(&repo, &store)
        .deliver(&pass_document("R1"))
        .await
        .unwrap_err();

    assert!(matches!(err, PassError::UpstreamFailure { attempts: 5, .. }));
    assert_eq!(store.attempts(), 5);

    let record = stored(&repo, "R1");
    assert_eq!(record.asset_ref, None);
    assert_eq!(record.id, issued.registrant_id);
    assert!(services.admission.verify_entry(&issued.token).await.is_ok());
}

#[tokio::test]
async fn test_delivery_rejects_empty_document_and_unknown_email() {
    let repo = Arc::new(InMemoryRegistrantRepository::new());
    let store = Arc::new(ScriptedAssetStore::new());
    let delivery = delivery(&repo, &store);

    let mut empty = pass_document("R1");
    empty.pdf.clear();
    assert!(matches!(
        delivery.deliver(&empty).await,
        Err(PassError::Validation(_))
    ));

    assert_eq!(
        delivery.deliver(&pass_document("R9")).await,
        Err(PassError::NotFound)
    );
    assert_eq!(store.attempts(), 0);
}

fn seeded_registrant(secret: &str) -> Registrant {
    Registrant {
        id: RegistrantId::new(),
        name: "Prop".to_string(),
        roll_number: "P1".to_string(),
        email: "p1@bitmesra.ac.in".to_string(),
        purpose: Purpose::Visitor,
        entry_count: EntryCount::ZERO,
        credential_secret: gatepass_core::CredentialSecret::from_stored(secret.to_string()),
        asset_ref: None,
        created_at: chrono::Utc::now(),
    }
}

proptest! {
    #[test]
    fn prop_entry_count_is_min_of_attempts_and_cap(attempts in 0usize..10) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            use gatepass_core::providers::RegistrantRepository;

            let repo = Arc::new(InMemoryRegistrantRepository::new());
            let registrant = seeded_registrant("prop-secret");
            repo.insert(&registrant).await.unwrap();

            let key = fixtures::signing_key().unwrap();
            let controller = AdmissionController::new(CredentialVerifier::new(key), Arc::clone(&repo));

            let mut successes = 0usize;
            for _ in 0..attempts {
                match controller.admit(&registrant.credential_secret).await {
                    Ok(_) => successes += 1,
                    Err(PassError::LimitReached) => {}
                    Err(other) => panic!("unexpected error {other:?}"),
                }
            }

            let expected = attempts.min(3);
            assert_eq!(successes, expected);
            assert_eq!(
                usize::from(stored(&repo, "P1").entry_count.get()),
                expected
            );
        });
    }
}
