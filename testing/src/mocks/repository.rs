//! In-memory registrant repository.

use gatepass_core::credential::CredentialSecret;
use gatepass_core::providers::RegistrantRepository;
use gatepass_core::{DuplicateField, EntryCount, PassError, Registrant, RegistrantId, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    registrants: HashMap<RegistrantId, Registrant>,
    by_email: HashMap<String, RegistrantId>,
    by_roll: HashMap<String, RegistrantId>,
    by_secret: HashMap<String, RegistrantId>,
}

/// In-memory registrant repository.
///
/// Mirrors the unique constraints of the PostgreSQL schema. Every operation
/// runs under one mutex, so [`RegistrantRepository::admit`] is atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistrantRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRegistrantRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>> {
        tables
            .lock()
            .map_err(|_| PassError::Internal("Mutex lock failed".into()))
    }

    /// Number of stored registrants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.lock().map_or(0, |t| t.registrants.len())
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the registrant with `roll_number`.
    #[must_use]
    pub fn get_by_roll(&self, roll_number: &str) -> Option<Registrant> {
        let tables = self.tables.lock().ok()?;
        let id = tables.by_roll.get(roll_number)?;
        tables.registrants.get(id).cloned()
    }

    /// Snapshot of every stored registrant.
    #[must_use]
    pub fn all(&self) -> Vec<Registrant> {
        self.tables
            .lock()
            .map(|t| t.registrants.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl RegistrantRepository for InMemoryRegistrantRepository {
    fn insert(&self, registrant: &Registrant) -> impl Future<Output = Result<()>> + Send {
        let tables = Arc::clone(&self.tables);
        let registrant = registrant.clone();

        async move {
            let mut tables = Self::lock(&tables)?;

            if tables.by_email.contains_key(&registrant.email) {
                return Err(PassError::DuplicateEntity {
                    field: DuplicateField::Email,
                });
            }
            if tables.by_roll.contains_key(&registrant.roll_number) {
                return Err(PassError::DuplicateEntity {
                    field: DuplicateField::RollNumber,
                });
            }
            if tables
                .by_secret
                .contains_key(registrant.credential_secret.as_str())
            {
                return Err(PassError::Database(
                    "credential secret already exists".into(),
                ));
            }

            let id = registrant.id;
            tables.by_email.insert(registrant.email.clone(), id);
            tables.by_roll.insert(registrant.roll_number.clone(), id);
            tables
                .by_secret
                .insert(registrant.credential_secret.as_str().to_string(), id);
            tables.registrants.insert(id, registrant);

            Ok(())
        }
    }

    fn find_duplicate(
        &self,
        email: &str,
        roll_number: &str,
    ) -> impl Future<Output = Result<Option<DuplicateField>>> + Send {
        let tables = Arc::clone(&self.tables);
        let email = email.to_string();
        let roll_number = roll_number.to_string();

        async move {
            let tables = Self::lock(&tables)?;

            if tables.by_email.contains_key(&email) {
                Ok(Some(DuplicateField::Email))
            } else if tables.by_roll.contains_key(&roll_number) {
                Ok(Some(DuplicateField::RollNumber))
            } else {
                Ok(None)
            }
        }
    }

    fn find_by_email(&self, email: &str) -> impl Future<Output = Result<Option<Registrant>>> + Send {
        let tables = Arc::clone(&self.tables);
        let email = email.to_string();

        async move {
            let tables = Self::lock(&tables)?;

            Ok(tables
                .by_email
                .get(&email)
                .and_then(|id| tables.registrants.get(id))
                .cloned())
        }
    }

    fn admit(
        &self,
        secret: &CredentialSecret,
        cap: EntryCount,
    ) -> impl Future<Output = Result<Registrant>> + Send {
        let tables = Arc::clone(&self.tables);
        let secret = secret.as_str().to_string();

        async move {
            let mut tables = Self::lock(&tables)?;

            let id = *tables.by_secret.get(&secret).ok_or(PassError::NotFound)?;
            let registrant = tables
                .registrants
                .get_mut(&id)
                .ok_or(PassError::NotFound)?;

            if registrant.entry_count >= cap {
                return Err(PassError::LimitReached);
            }
            let next = registrant.entry_count.next().ok_or(PassError::LimitReached)?;
            registrant.entry_count = next;

            Ok(registrant.clone())
        }
    }

    fn attach_asset(&self, email: &str, asset_ref: &str) -> impl Future<Output = Result<()>> + Send {
        let tables = Arc::clone(&self.tables);
        let email = email.to_string();
        let asset_ref = asset_ref.to_string();

        async move {
            let mut tables = Self::lock(&tables)?;

            let id = *tables.by_email.get(&email).ok_or(PassError::NotFound)?;
            let registrant = tables
                .registrants
                .get_mut(&id)
                .ok_or(PassError::NotFound)?;
            registrant.asset_ref = Some(asset_ref);

            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gatepass_core::Purpose;
    use gatepass_core::environment::Clock;

    fn registrant(roll: &str, secret: &str) -> Registrant {
        Registrant {
            id: RegistrantId::new(),
            name: "Test".to_string(),
            roll_number: roll.to_string(),
            email: format!("{}@bitmesra.ac.in", roll.to_lowercase()),
            purpose: Purpose::Visitor,
            entry_count: EntryCount::ZERO,
            credential_secret: CredentialSecret::from_stored(secret.to_string()),
            asset_ref: None,
            created_at: crate::test_clock().now(),
        }
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_email_and_roll() {
        let repo = InMemoryRegistrantRepository::new();
        repo.insert(&registrant("R1", "s1")).await.unwrap();

        let mut same_email = registrant("R2", "s2");
        same_email.email = "r1@bitmesra.ac.in".to_string();
        assert_eq!(
            repo.insert(&same_email).await,
            Err(PassError::DuplicateEntity {
                field: DuplicateField::Email
            })
        );

        let mut same_roll = registrant("R1", "s3");
        same_roll.email = "other@bitmesra.ac.in".to_string();
        assert_eq!(
            repo.insert(&same_roll).await,
            Err(PassError::DuplicateEntity {
                field: DuplicateField::RollNumber
            })
        );

        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_admit_stops_at_cap() {
        let repo = InMemoryRegistrantRepository::new();
        repo.insert(&registrant("R1", "s1")).await.unwrap();
        let secret = CredentialSecret::from_stored("s1".to_string());

        for expected in 1..=3 {
            let admitted = repo.admit(&secret, EntryCount::CAP).await.unwrap();
            assert_eq!(admitted.entry_count.get(), expected);
        }

        assert_eq!(
            repo.admit(&secret, EntryCount::CAP).await,
            Err(PassError::LimitReached)
        );
        assert_eq!(repo.get_by_roll("R1").unwrap().entry_count, EntryCount::CAP);
    }

    #[tokio::test]
    async fn test_admit_unknown_secret() {
        let repo = InMemoryRegistrantRepository::new();
        let secret = CredentialSecret::from_stored("missing".to_string());
        assert_eq!(
            repo.admit(&secret, EntryCount::CAP).await,
            Err(PassError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_attach_asset() {
        let repo = InMemoryRegistrantRepository::new();
        repo.insert(&registrant("R1", "s1")).await.unwrap();

        repo.attach_asset("r1@bitmesra.ac.in", "drive-file-1").await.unwrap();
        assert_eq!(
            repo.get_by_roll("R1").unwrap().asset_ref.as_deref(),
            Some("drive-file-1")
        );
        assert_eq!(
            repo.attach_asset("nobody@bitmesra.ac.in", "x").await,
            Err(PassError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_attach_asset_replaces_earlier_reference() {
        let repo = InMemoryRegistrantRepository::new();
        repo.insert(&registrant("R1", "s1")).await.unwrap();

        repo.attach_asset("r1@bitmesra.ac.in", "drive-file-1").await.unwrap();
        repo.attach_asset("r1@bitmesra.ac.in", "drive-file-2").await.unwrap();

        assert_eq!(
            repo.get_by_roll("R1").unwrap().asset_ref.as_deref(),
            Some("drive-file-2")
        );
    }
}
