//! In-memory implementations of every port, for tests across the workspace.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::artworks::{Artwork, ArtworkFilter, ArtworkPatch, ArtworkStore};
use crate::clock::Clock;
use crate::contact::{ContactMailer, ContactMessage};
use crate::error::{AuthError, ContactError, DataError, UploadError};
use crate::media::{BlobStore, CompletedChunk};
use crate::session::{Identity, IdentityProvider, Session, SessionTokens};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

#[derive(Default)]
pub struct InMemoryArtworkStore {
    records: Mutex<HashMap<String, Artwork>>,
}

#[async_trait]
impl ArtworkStore for InMemoryArtworkStore {
    async fn insert(&self, artwork: &Artwork) -> Result<(), DataError> {
        lock(&self.records).insert(artwork.id.clone(), artwork.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Artwork>, DataError> {
        Ok(lock(&self.records).get(id).cloned())
    }

    async fn list(&self, filter: ArtworkFilter) -> Result<Vec<Artwork>, DataError> {
        Ok(lock(&self.records)
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: &str,
        patch: &ArtworkPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DataError> {
        let mut records = lock(&self.records);
        let artwork = records
            .get_mut(id)
            .ok_or_else(|| DataError::NotFound(id.to_string()))?;
        patch.apply_to(artwork);
        artwork.updated_at = updated_at;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DataError> {
        lock(&self.records)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DataError::NotFound(id.to_string()))
    }
}

#[derive(Default)]
struct BlobState {
    objects: HashMap<String, Vec<u8>>,
    /// upload id -> (path, parts by number)
    uploads: HashMap<String, (String, BTreeMap<i32, Vec<u8>>)>,
    aborted: Vec<String>,
    next_upload: usize,
}

/// Object store with multipart semantics. Objects only appear on `complete`.
pub struct InMemoryBlobStore {
    base_url: String,
    fail_on_part: Option<i32>,
    state: Mutex<BlobState>,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            fail_on_part: None,
            state: Mutex::new(BlobState::default()),
        }
    }

    /// Every upload fails when it reaches this part number.
    pub fn failing_on_part(mut self, part_number: i32) -> Self {
        self.fail_on_part = Some(part_number);
        self
    }

    pub fn insert_object(&self, path: &str, bytes: Vec<u8>) {
        lock(&self.state).objects.insert(path.to_string(), bytes);
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.state).objects.get(path).cloned()
    }

    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = lock(&self.state).objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Paths whose multipart upload was aborted, in order.
    pub fn aborted(&self) -> Vec<String> {
        lock(&self.state).aborted.clone()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn begin(&self, path: &str, _content_type: &str) -> Result<String, UploadError> {
        let mut state = lock(&self.state);
        state.next_upload += 1;
        let upload_id = format!("upload-{}", state.next_upload);
        state
            .uploads
            .insert(upload_id.clone(), (path.to_string(), BTreeMap::new()));
        Ok(upload_id)
    }

    async fn put_part(
        &self,
        path: &str,
        upload_id: &str,
        part_number: i32,
        chunk: Vec<u8>,
    ) -> Result<CompletedChunk, UploadError> {
        if self.fail_on_part == Some(part_number) {
            return Err(UploadError::Interrupted(format!(
                "connection reset on part {}",
                part_number
            )));
        }

        let mut state = lock(&self.state);
        let (upload_path, parts) = state
            .uploads
            .get_mut(upload_id)
            .ok_or_else(|| UploadError::Backend(format!("no such upload: {}", upload_id)))?;
        if upload_path.as_str() != path {
            return Err(UploadError::Backend(format!("upload {} is not for {}", upload_id, path)));
        }
        parts.insert(part_number, chunk);

        Ok(CompletedChunk {
            part_number,
            etag: format!("etag-{}-{}", upload_id, part_number),
        })
    }

    async fn complete(
        &self,
        path: &str,
        upload_id: &str,
        parts: Vec<CompletedChunk>,
    ) -> Result<(), UploadError> {
        let mut state = lock(&self.state);
        let (_, stored) = state
            .uploads
            .remove(upload_id)
            .ok_or_else(|| UploadError::Backend(format!("no such upload: {}", upload_id)))?;

        let mut bytes = Vec::new();
        for part in &parts {
            let chunk = stored.get(&part.part_number).ok_or_else(|| {
                UploadError::Backend(format!("part {} was never uploaded", part.part_number))
            })?;
            bytes.extend_from_slice(chunk);
        }
        state.objects.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn abort(&self, path: &str, upload_id: &str) -> Result<(), UploadError> {
        let mut state = lock(&self.state);
        state.uploads.remove(upload_id);
        state.aborted.push(path.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), UploadError> {
        lock(&self.state).objects.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

struct Account {
    password: String,
    identity: Identity,
}

#[derive(Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    /// access token -> account email
    access: HashMap<String, String>,
    /// refresh token -> account email
    refresh: HashMap<String, String>,
    expired: HashSet<String>,
    offline: bool,
    issued: usize,
}

impl IdentityState {
    fn check_online(&self) -> Result<(), AuthError> {
        if self.offline {
            return Err(AuthError::Backend("identity backend unreachable".to_string()));
        }
        Ok(())
    }

    fn issue_access(&mut self, email: &str) -> String {
        self.issued += 1;
        let token = format!("access-{}", self.issued);
        self.access.insert(token.clone(), email.to_string());
        token
    }
}

/// Identity backend holding accounts and issued tokens in memory.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<IdentityState>,
    identify_calls: AtomicUsize,
}

impl InMemoryIdentityProvider {
    pub fn with_account(self, email: &str, password: &str) -> Self {
        {
            let mut state = lock(&self.state);
            let n = state.accounts.len() + 1;
            state.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    identity: Identity {
                        user_id: format!("user-{}", n),
                        username: format!("user-{}", n),
                        email: Some(email.to_string()),
                    },
                },
            );
        }
        self
    }

    /// The access token now reads as expired.
    pub fn expire(&self, access_token: &str) {
        lock(&self.state).expired.insert(access_token.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        lock(&self.state).offline = offline;
    }

    pub fn identify_calls(&self) -> usize {
        self.identify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut state = lock(&self.state);
        state.check_online()?;

        let identity = match state.accounts.get(email) {
            Some(account) if account.password == password => account.identity.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };

        let access_token = state.issue_access(email);
        let refresh_token = format!("refresh-{}", state.issued);
        state.refresh.insert(refresh_token.clone(), email.to_string());

        Ok(Session {
            tokens: SessionTokens {
                access_token,
                refresh_token: Some(refresh_token),
                username: identity.username.clone(),
                expires_in: Some(3600),
            },
            identity,
        })
    }

    async fn sign_out(&self, tokens: &SessionTokens) -> Result<(), AuthError> {
        let mut state = lock(&self.state);
        state.check_online()?;

        let email = state
            .access
            .get(&tokens.access_token)
            .cloned()
            .ok_or(AuthError::NotAuthenticated)?;
        // Global sign-out: every token of the account goes
        state.access.retain(|_, owner| *owner != email);
        state.refresh.retain(|_, owner| *owner != email);
        Ok(())
    }

    async fn identify(&self, tokens: &SessionTokens) -> Result<Identity, AuthError> {
        self.identify_calls.fetch_add(1, Ordering::SeqCst);
        let state = lock(&self.state);
        state.check_online()?;

        let email = state
            .access
            .get(&tokens.access_token)
            .ok_or(AuthError::NotAuthenticated)?;
        if state.expired.contains(&tokens.access_token) {
            return Err(AuthError::SessionExpired);
        }
        state
            .accounts
            .get(email)
            .map(|account| account.identity.clone())
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn refresh(&self, tokens: &SessionTokens) -> Result<SessionTokens, AuthError> {
        let mut state = lock(&self.state);
        state.check_online()?;

        let email = tokens
            .refresh_token
            .as_ref()
            .and_then(|token| state.refresh.get(token))
            .cloned()
            .ok_or(AuthError::NotAuthenticated)?;
        let access_token = state.issue_access(&email);

        Ok(SessionTokens {
            access_token,
            refresh_token: tokens.refresh_token.clone(),
            username: tokens.username.clone(),
            expires_in: Some(3600),
        })
    }
}

/// Mailer that keeps what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<ContactMessage>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<ContactMessage> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl ContactMailer for RecordingMailer {
    async fn send(&self, message: &ContactMessage) -> Result<(), ContactError> {
        if self.fail {
            return Err(ContactError::Delivery("mail relay rejected the message".to_string()));
        }
        lock(&self.sent).push(message.clone());
        Ok(())
    }
}
