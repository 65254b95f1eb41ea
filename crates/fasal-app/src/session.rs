//! Session store: the single active [`UserProfile`] and the render language.
//!
//! Every mutation takes the same async mutex for its whole read-modify-write
//! cycle against the persisted mirror, so registrations, language commits
//! and logouts never interleave. The render language is a `watch` value
//! written under that lock, which keeps it equal to the profile language at
//! every point a caller can observe through [`SessionStore::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fasal_core::{
    defaults, load_json, save_json, AppEvent, Error, EventBus, Field, FieldErrorKind, FarmerType,
    KeyValueStore, LanguageCode, LanguageSource, RegistrationForm, Result, UserProfile,
    ValidationErrors,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

/// Issue order of a language resolution.
///
/// Tickets are taken when a resolution starts. A commit carrying a ticket
/// older than the last committed one is stale and is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LanguageTicket(u64);

impl LanguageTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Result of a language commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The language changed.
    Applied,
    /// Already the active language; the ticket still counts as committed.
    Unchanged,
    /// A newer resolution committed first; nothing changed.
    Stale,
}

#[derive(Debug, Default)]
struct SessionState {
    profile: Option<UserProfile>,
    last_ticket: u64,
}

/// Owner of the active profile and its persisted mirror.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
    render: watch::Sender<LanguageCode>,
    next_ticket: AtomicU64,
    events: EventBus,
}

impl SessionStore {
    /// A logged-out store rendering in English. Call [`restore`](Self::restore)
    /// to pick up a persisted session.
    pub fn new(store: Arc<dyn KeyValueStore>, events: EventBus) -> Self {
        let (render, _) = watch::channel(LanguageCode::default());
        Self {
            store,
            state: Mutex::new(SessionState::default()),
            render,
            next_ticket: AtomicU64::new(0),
            events,
        }
    }

    /// Load the persisted profile, if any.
    ///
    /// A missing, unreadable or malformed mirror means "no session".
    #[instrument(skip(self), fields(subsystem = "session", op = "restore"))]
    pub async fn restore(&self) -> Option<UserProfile> {
        let mut state = self.state.lock().await;
        let loaded = match load_json::<UserProfile>(self.store.as_ref(), defaults::SESSION_KEY) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Session mirror unreadable, starting logged out");
                None
            }
        };

        state.profile = loaded.clone();
        if let Some(profile) = &loaded {
            self.render.send_replace(profile.language);
            info!(language = %profile.language, "Restored session");
            self.events.emit(AppEvent::LanguageChanged {
                language: profile.language,
                source: LanguageSource::Restore,
            });
        } else {
            debug!("No persisted session");
        }
        loaded
    }

    /// Validate `form`, persist the new profile and make it the active one.
    ///
    /// On failure no session is created and every invalid field is reported.
    #[instrument(skip(self, form), fields(subsystem = "session", op = "register"))]
    pub async fn register(&self, form: RegistrationForm) -> Result<UserProfile> {
        validate_registration(&form)?;

        let mut state = self.state.lock().await;
        let years_farming = match form.farmer_type {
            Some(FarmerType::Existing) => Some(years_from_digits(&form.years_farming)),
            _ => None,
        };
        let app_purpose = match form.farmer_type {
            Some(FarmerType::New) => form.app_purpose,
            _ => None,
        };
        let farmer_type = form
            .farmer_type
            .ok_or_else(|| Error::Internal("farmer type missing after validation".to_string()))?;

        let profile = UserProfile {
            name: form.name.trim().to_string(),
            farmer_type,
            years_farming,
            app_purpose,
            language: form.language.unwrap_or_else(|| *self.render.borrow()),
        };

        save_json(self.store.as_ref(), defaults::SESSION_KEY, &profile)?;
        state.profile = Some(profile.clone());
        self.render.send_replace(profile.language);

        info!(language = %profile.language, "Registered session");
        self.events.emit(AppEvent::SessionStarted {
            name: profile.name.clone(),
        });
        Ok(profile)
    }

    /// Set the active profile's language and re-persist it.
    ///
    /// No-op when logged out.
    pub async fn update_language(&self, language: LanguageCode) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.profile.is_none() {
            debug!(%language, "No active session, ignoring language update");
            return Ok(());
        }
        let ticket = self.issue_ticket();
        self.commit_locked(&mut state, language, ticket, LanguageSource::Manual)?;
        Ok(())
    }

    /// Clear the active profile and remove its persisted mirror. Idempotent.
    #[instrument(skip(self), fields(subsystem = "session", op = "logout"))]
    pub async fn logout(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let was_active = state.profile.take().is_some();
        self.store.remove(defaults::SESSION_KEY)?;
        if was_active {
            info!("Logged out");
            self.events.emit(AppEvent::SessionEnded);
        }
        Ok(())
    }

    /// Take the next language ticket. Call this when a resolution starts.
    pub fn issue_ticket(&self) -> LanguageTicket {
        LanguageTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Commit `language` to the profile (if any) and the render language as
    /// one step, unless a resolution issued later has already committed.
    pub async fn commit_language(
        &self,
        language: LanguageCode,
        ticket: LanguageTicket,
        source: LanguageSource,
    ) -> Result<CommitOutcome> {
        let mut state = self.state.lock().await;
        self.commit_locked(&mut state, language, ticket, source)
    }

    fn commit_locked(
        &self,
        state: &mut SessionState,
        language: LanguageCode,
        ticket: LanguageTicket,
        source: LanguageSource,
    ) -> Result<CommitOutcome> {
        if ticket.0 <= state.last_ticket {
            debug!(
                ticket = ticket.0,
                last_ticket = state.last_ticket,
                %language,
                ?source,
                "Dropping stale language commit"
            );
            return Ok(CommitOutcome::Stale);
        }

        let profile_matches = state
            .profile
            .as_ref()
            .map_or(true, |p| p.language == language);
        if profile_matches && *self.render.borrow() == language {
            state.last_ticket = ticket.0;
            return Ok(CommitOutcome::Unchanged);
        }

        // Persist first so a failed write leaves memory and disk in agreement.
        if let Some(profile) = &state.profile {
            let updated = UserProfile {
                language,
                ..profile.clone()
            };
            save_json(self.store.as_ref(), defaults::SESSION_KEY, &updated)?;
            state.profile = Some(updated);
        }
        state.last_ticket = ticket.0;
        self.render.send_replace(language);

        info!(%language, ?source, ticket = ticket.0, "Language committed");
        self.events
            .emit(AppEvent::LanguageChanged { language, source });
        Ok(CommitOutcome::Applied)
    }

    /// The active profile, if any.
    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.lock().await.profile.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.profile.is_some()
    }

    /// Profile and render language read under the store lock.
    pub async fn snapshot(&self) -> (Option<UserProfile>, LanguageCode) {
        let state = self.state.lock().await;
        (state.profile.clone(), *self.render.borrow())
    }

    /// The language the UI should render in right now.
    pub fn render_language(&self) -> LanguageCode {
        *self.render.borrow()
    }

    /// Watch the render language.
    pub fn subscribe_language(&self) -> watch::Receiver<LanguageCode> {
        self.render.subscribe()
    }
}

/// Check a registration form, collecting one error per invalid field.
pub fn validate_registration(form: &RegistrationForm) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if form.name.trim().is_empty() {
        errors.push(Field::Name, FieldErrorKind::Required);
    }

    match form.farmer_type {
        None => errors.push(Field::FarmerType, FieldErrorKind::Required),
        Some(FarmerType::Existing) => {
            if form.years_farming.trim().is_empty() {
                errors.push(Field::YearsFarming, FieldErrorKind::Required);
            } else if !is_positive_integer(&form.years_farming) {
                errors.push(Field::YearsFarming, FieldErrorKind::PositiveNumber);
            }
        }
        Some(FarmerType::New) => {
            if form.app_purpose.is_none() {
                errors.push(Field::AppPurpose, FieldErrorKind::Required);
            }
        }
    }

    errors.into_result()
}

/// Any run of ASCII digits that is not all zeros. Length is unbounded.
fn is_positive_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && s.bytes().any(|b| b != b'0')
}

/// Parse a validated digit string, saturating values beyond `u32`.
fn years_from_digits(s: &str) -> u32 {
    s.parse().unwrap_or(u32::MAX)
}
