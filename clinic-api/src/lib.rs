//! Typed REST client for the practice backend and the session controller
//! that drives the OTP-gated booking and management flows.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use clinic_core::{
    categorize_appointments, Appointment, AppointmentStatus, AppointmentTabs, AuthSession,
    BookingForm, ClinicConfig, Doctor, FormError, Patient, PatientDetails, Questionnaire,
    SessionPhase, StoredSession,
};

/// Failures surfaced by the transport layer. Network trouble and backend
/// rejection are distinct variants so callers can word their messaging.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("backend rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("authentication required")]
    Unauthorized,
    #[error("this phone number is not registered")]
    PhoneNotRegistered,
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

/// Failures surfaced by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no OTP challenge is in progress")]
    NoChallenge,
    #[error("not authenticated")]
    NotAuthenticated,
}

/// Durable session storage, injected into the client rather than read
/// from ambient globals. `clear` is the explicit teardown used on logout
/// and on any 401.
pub trait SessionStore {
    fn load(&self) -> Option<StoredSession>;
    fn save(&self, session: &StoredSession);
    fn clear(&self);
}

/// In-memory store for tests and short-lived tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Option<StoredSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Some(session))),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Option<StoredSession> {
        self.inner.borrow().clone()
    }

    fn save(&self, session: &StoredSession) {
        *self.inner.borrow_mut() = Some(session.clone());
    }

    fn clear(&self) {
        *self.inner.borrow_mut() = None;
    }
}

/// Appointment request assembled from a validated booking form. This is
/// the "staged action" replayed after a successful OTP challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub patient: PatientDetails,
    pub questionnaire: Option<Questionnaire>,
}

impl NewAppointment {
    /// Validate the form and build the request from it.
    pub fn from_form(form: &BookingForm) -> Result<Self, FormError> {
        form.validate()?;
        Ok(Self {
            doctor_id: form.doctor_id.ok_or(FormError::MissingDoctor)?,
            date: form
                .date
                .ok_or(FormError::MissingField("appointment date"))?,
            time: form.time.clone(),
            patient: form.patient_details(),
            questionnaire: form.questionnaire.clone(),
        })
    }
}

/// Backend surface needed by the flows. `RestClient` is the production
/// implementation; tests drive the controller against a scripted fake.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, ApiError>;
    async fn available_times(
        &self,
        doctor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<String>>, ApiError>;
    async fn create_patient(&self, contact_number: &str) -> Result<Patient, ApiError>;
    async fn generate_otp(&self, contact_number: &str) -> Result<(), ApiError>;
    async fn verify_otp(&self, contact_number: &str, code: &str) -> Result<AuthSession, ApiError>;
    async fn authenticate_token(&self, token: &str) -> Result<AuthSession, ApiError>;
    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, ApiError>;
    async fn patient_appointments(&self, patient_id: i64) -> Result<Vec<Appointment>, ApiError>;
    async fn cancelled_appointments(&self, patient_id: i64) -> Result<Vec<Appointment>, ApiError>;
    async fn change_status(
        &self,
        appointment_id: i64,
        status: &AppointmentStatus,
    ) -> Result<(), ApiError>;
    async fn questionnaire(&self, id: i64) -> Result<Questionnaire, ApiError>;
}

#[derive(Serialize)]
struct ContactNumberBody<'a> {
    contact_number: &'a str,
}

#[derive(Serialize)]
struct AuthenticateTokenBody<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct ChangeStatusBody<'a> {
    appointment_id: i64,
    appointment_status: &'a str,
}

#[derive(Serialize)]
struct CreateAppointmentBody<'a> {
    date: NaiveDate,
    time: &'a str,
    doctor_id: i64,
    patient: &'a PatientDetails,
    booked_by_patient: u8,
    questionnaire_data: Option<&'a Questionnaire>,
}

/// `{token?, patient}` as returned by login and token re-validation.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    patient: Patient,
}

/// The doctor list arrives either bare or wrapped in a result page.
/// Anything else is a decode error rather than a shape to guess at.
#[derive(Deserialize)]
#[serde(untagged)]
enum DoctorListResponse {
    Paged { results: Vec<Doctor> },
    Bare(Vec<Doctor>),
}

#[derive(Deserialize)]
struct AvailabilityEnvelope {
    #[serde(default)]
    available_appointments: BTreeMap<NaiveDate, Vec<String>>,
}

/// Decode the active-doctor listing.
pub fn decode_doctor_list(body: &str) -> Result<Vec<Doctor>, ApiError> {
    let response: DoctorListResponse =
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))?;
    Ok(match response {
        DoctorListResponse::Paged { results } => results,
        DoctorListResponse::Bare(doctors) => doctors,
    })
}

/// Decode the availability mapping for one doctor. The response is keyed
/// by doctor id; a missing key means no open slots in the range.
pub fn decode_availability(
    body: &str,
    doctor_id: i64,
) -> Result<BTreeMap<NaiveDate, Vec<String>>, ApiError> {
    let mut by_doctor: HashMap<String, AvailabilityEnvelope> =
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))?;
    Ok(by_doctor
        .remove(&doctor_id.to_string())
        .map(|envelope| envelope.available_appointments)
        .unwrap_or_default())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))
}

/// REST client for the backend surface. One instance serves both the
/// unauthenticated and the bearer-authenticated call paths; the session
/// store decides whether a token rides along.
#[derive(Clone)]
pub struct RestClient<S: SessionStore + Clone> {
    base_url: String,
    http: reqwest::Client,
    store: S,
}

impl<S: SessionStore + Clone> RestClient<S> {
    pub fn new(base_url: &str, store: S) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            store,
        }
    }

    pub fn from_config(config: &ClinicConfig, store: S) -> Self {
        Self::new(&config.api_base_url, store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the stored bearer token, when present. A protected request
    /// without a token still goes out and lets the backend answer 401.
    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.store.load() {
            Some(stored) => request.bearer_auth(stored.token),
            None => request,
        }
    }

    /// Send a request and pull the body. On a protected call, 401 erases
    /// the stored session before surfacing `Unauthorized` — every later
    /// protected call fails the same way until re-authentication.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        authenticated: bool,
    ) -> Result<String, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        if authenticated && status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!("401 on a protected call, clearing stored session");
            self.store.clear();
            return Err(ApiError::Unauthorized);
        }
        if authenticated && status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        response
            .text()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))
    }
}

impl<S: SessionStore + Clone> Backend for RestClient<S> {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, ApiError> {
        tracing::debug!("fetching active doctors");
        let request = self.http.get(self.url("/doctors/?filter_by_active=1"));
        let body = self.send(request, false).await?;
        decode_doctor_list(&body)
    }

    async fn available_times(
        &self,
        doctor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<String>>, ApiError> {
        tracing::debug!(doctor_id, %start, %end, "fetching available slots");
        let request = self
            .http
            .get(self.url(&format!("/doctors/{doctor_id}/available_appointments/")))
            .query(&[
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ]);
        let body = self.send(request, false).await?;
        decode_availability(&body, doctor_id)
    }

    async fn create_patient(&self, contact_number: &str) -> Result<Patient, ApiError> {
        let request = self
            .http
            .post(self.url("/patients/"))
            .json(&ContactNumberBody { contact_number });
        let body = self.send(request, false).await?;
        decode(&body)
    }

    async fn generate_otp(&self, contact_number: &str) -> Result<(), ApiError> {
        tracing::debug!("requesting OTP issuance");
        let request = self
            .http
            .post(self.url("/patients/generate_otp/"))
            .json(&ContactNumberBody { contact_number });
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::PhoneNotRegistered);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn verify_otp(&self, contact_number: &str, code: &str) -> Result<AuthSession, ApiError> {
        let form = reqwest::multipart::Form::new()
            .text("contact_number", contact_number.to_string())
            .text("otp", code.to_string());
        let request = self.http.post(self.url("/login/patient/")).multipart(form);
        let body = self.send(request, false).await?;
        let response: TokenResponse = decode(&body)?;
        let token = response
            .token
            .ok_or_else(|| ApiError::Decode("login response carried no token".to_string()))?;
        Ok(AuthSession {
            token,
            patient: response.patient,
        })
    }

    async fn authenticate_token(&self, token: &str) -> Result<AuthSession, ApiError> {
        let request = self
            .http
            .post(self.url("/authenticate_token/"))
            .json(&AuthenticateTokenBody { token });
        let body = self.send(request, false).await?;
        let response: TokenResponse = decode(&body)?;
        // The backend may rotate the token; otherwise the submitted one
        // stays valid.
        Ok(AuthSession {
            token: response.token.unwrap_or_else(|| token.to_string()),
            patient: response.patient,
        })
    }

    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, ApiError> {
        tracing::debug!(doctor_id = request.doctor_id, %request.date, "creating appointment");
        let body = CreateAppointmentBody {
            date: request.date,
            time: &request.time,
            doctor_id: request.doctor_id,
            patient: &request.patient,
            booked_by_patient: 1,
            questionnaire_data: request.questionnaire.as_ref(),
        };
        let http_request = self
            .with_auth(self.http.post(self.url("/appointments/")))
            .json(&body);
        let body = self.send(http_request, true).await?;
        decode(&body)
    }

    async fn patient_appointments(&self, patient_id: i64) -> Result<Vec<Appointment>, ApiError> {
        let request = self
            .with_auth(self.http.get(self.url(&format!("/patients/{patient_id}/appointments/"))));
        let body = self.send(request, true).await?;
        decode(&body)
    }

    async fn cancelled_appointments(&self, patient_id: i64) -> Result<Vec<Appointment>, ApiError> {
        let request = self.with_auth(
            self.http
                .get(self.url(&format!("/patients/{patient_id}/cancelled_appointments/"))),
        );
        let body = self.send(request, true).await?;
        decode(&body)
    }

    async fn change_status(
        &self,
        appointment_id: i64,
        status: &AppointmentStatus,
    ) -> Result<(), ApiError> {
        let body = ChangeStatusBody {
            appointment_id,
            appointment_status: status.as_code(),
        };
        let request = self
            .with_auth(self.http.post(self.url("/appointments/change-status/")))
            .json(&body);
        self.send(request, true).await?;
        Ok(())
    }

    async fn questionnaire(&self, id: i64) -> Result<Questionnaire, ApiError> {
        let request = self.http.get(self.url(&format!("/questionnaires/{id}/")));
        let body = self.send(request, false).await?;
        decode(&body)
    }
}

/// Observable result of a controller step.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// Appointment created; terminal success for the booking flow.
    Created(Appointment),
    /// An OTP was issued; the flow waits on the 6-digit code.
    OtpChallenge,
    /// The submitted code was rejected; the challenge stays open and the
    /// entered code should be cleared.
    OtpRejected,
    /// Authentication succeeded with nothing staged to replay.
    Authenticated,
}

/// Orchestrates "prove a patient identity, then run the protected
/// action". Every backend call is awaited before the next starts; no
/// call is retried or cancelled once issued.
pub struct SessionController<B: Backend, S: SessionStore> {
    backend: B,
    store: S,
    phase: SessionPhase,
    staged: Option<NewAppointment>,
}

impl<B: Backend, S: SessionStore> SessionController<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store,
            phase: SessionPhase::Anonymous,
            staged: None,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Silent re-authentication from a stored token on page load. A
    /// rejected or unreachable token is erased and the flow stays
    /// anonymous; nothing is surfaced to the user.
    pub async fn restore(&mut self) -> bool {
        let Some(stored) = self.store.load() else {
            return false;
        };
        match self.backend.authenticate_token(&stored.token).await {
            Ok(session) => {
                self.store.save(&session.to_stored());
                self.phase = SessionPhase::Authenticated { session };
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored token rejected during restore");
                self.store.clear();
                self.phase = SessionPhase::Anonymous;
                false
            }
        }
    }

    /// Submit the booking form. The appointment request is staged first;
    /// with a credential that still validates it is created immediately,
    /// otherwise the flow ensures the patient record exists, requests an
    /// OTP and waits on the code.
    pub async fn submit_booking(&mut self, form: &BookingForm) -> Result<FlowEvent, FlowError> {
        let request = NewAppointment::from_form(form)?;
        let phone = request.patient.contact_number.clone();
        self.staged = Some(request.clone());

        let token = match &self.phase {
            SessionPhase::Authenticated { session } => Some(session.token.clone()),
            _ => self.store.load().map(|stored| stored.token),
        };

        if let Some(token) = token {
            match self.backend.authenticate_token(&token).await {
                Ok(session) => {
                    self.store.save(&session.to_stored());
                    self.phase = SessionPhase::Authenticated { session };
                    return self.attempt_create(request, &phone).await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "token validation failed, challenging via OTP");
                    self.store.clear();
                    self.phase = SessionPhase::Anonymous;
                }
            }
        }

        self.challenge(&phone).await?;
        Ok(FlowEvent::OtpChallenge)
    }

    /// Submit the 6-digit code for the open challenge. Success stores
    /// the session and immediately replays the staged appointment when
    /// one exists. A failed verification keeps the challenge open;
    /// retries are unlimited on this side.
    pub async fn submit_otp(&mut self, code: &str) -> Result<FlowEvent, FlowError> {
        let SessionPhase::PendingOtp { phone } = &self.phase else {
            return Err(FlowError::NoChallenge);
        };
        let phone = phone.clone();
        match self.backend.verify_otp(&phone, code).await {
            Ok(session) => {
                self.store.save(&session.to_stored());
                self.phase = SessionPhase::Authenticated { session };
                match self.staged.clone() {
                    Some(request) => self.attempt_create(request, &phone).await,
                    None => Ok(FlowEvent::Authenticated),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "OTP verification failed");
                Ok(FlowEvent::OtpRejected)
            }
        }
    }

    /// Management-flow login: issue an OTP without creating a patient
    /// record first. An unregistered phone surfaces as
    /// `PhoneNotRegistered`.
    pub async fn begin_login(&mut self, phone: &str) -> Result<FlowEvent, FlowError> {
        self.backend.generate_otp(phone).await?;
        self.phase = SessionPhase::PendingOtp {
            phone: phone.to_string(),
        };
        Ok(FlowEvent::OtpChallenge)
    }

    /// Fetch the two backend lists for the authenticated patient. The
    /// cancelled list comes back tagged; partitioning the active list
    /// against "now" belongs at the render site.
    pub async fn fetch_appointments(
        &mut self,
    ) -> Result<(Vec<Appointment>, Vec<Appointment>), FlowError> {
        let Some(session) = self.phase.session().cloned() else {
            return Err(FlowError::NotAuthenticated);
        };
        let fetched = self.backend.patient_appointments(session.patient.id).await;
        let active = self.guard_auth(fetched)?;
        let fetched = self.backend.cancelled_appointments(session.patient.id).await;
        let cancelled = self.guard_auth(fetched)?;
        Ok((active, clinic_core::tag_cancelled(cancelled)))
    }

    /// Fetch both appointment lists and categorize them against `now`.
    pub async fn load_appointments(
        &mut self,
        now: NaiveDateTime,
    ) -> Result<AppointmentTabs, FlowError> {
        let (active, cancelled) = self.fetch_appointments().await?;
        Ok(categorize_appointments(&active, cancelled, now))
    }

    /// Commit a confirmed cancellation. Callers move the row between
    /// their local lists only when this returns Ok; on failure both
    /// lists stay as they were.
    pub async fn cancel_appointment(&mut self, appointment_id: i64) -> Result<(), FlowError> {
        if !self.phase.is_authenticated() {
            return Err(FlowError::NotAuthenticated);
        }
        let changed = self
            .backend
            .change_status(appointment_id, &AppointmentStatus::Cancelled)
            .await;
        self.guard_auth(changed)?;
        Ok(())
    }

    /// Explicit logout: erase the stored credential and reset the flow.
    pub fn logout(&mut self) {
        self.store.clear();
        self.staged = None;
        self.phase = SessionPhase::Anonymous;
    }

    /// Ensure-patient-then-OTP sequence of the booking flow. The patient
    /// upsert is idempotent on the backend side.
    async fn challenge(&mut self, phone: &str) -> Result<(), ApiError> {
        self.backend.create_patient(phone).await?;
        self.backend.generate_otp(phone).await?;
        self.phase = SessionPhase::PendingOtp {
            phone: phone.to_string(),
        };
        Ok(())
    }

    /// Create under the current credential. An auth rejection does not
    /// end the booking: the token is erased and the flow re-enters the
    /// OTP challenge with the staged appointment intact.
    async fn attempt_create(
        &mut self,
        request: NewAppointment,
        phone: &str,
    ) -> Result<FlowEvent, FlowError> {
        self.phase = SessionPhase::ActionInFlight;
        match self.backend.create_appointment(&request).await {
            Ok(appointment) => {
                self.staged = None;
                self.phase = SessionPhase::Succeeded {
                    appointment: appointment.clone(),
                };
                Ok(FlowEvent::Created(appointment))
            }
            Err(ApiError::Unauthorized) => {
                tracing::warn!("appointment creation rejected as unauthorized, re-challenging");
                self.store.clear();
                self.phase = SessionPhase::Anonymous;
                self.challenge(phone).await?;
                Ok(FlowEvent::OtpChallenge)
            }
            Err(err) => {
                self.phase = SessionPhase::Failed {
                    message: err.to_string(),
                };
                Err(err.into())
            }
        }
    }

    /// Demote the flow when a protected call comes back unauthorized.
    fn guard_auth<T>(&mut self, result: Result<T, ApiError>) -> Result<T, FlowError> {
        match result {
            Err(ApiError::Unauthorized) => {
                self.store.clear();
                self.phase = SessionPhase::Anonymous;
                Err(ApiError::Unauthorized.into())
            }
            other => other.map_err(FlowError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn form() -> BookingForm {
        BookingForm {
            doctor_id: Some(5),
            first_name: "Thandi".to_string(),
            last_name: "Nkosi".to_string(),
            contact_number: "0821234567".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 1),
            time: "09:00".to_string(),
            terms_accepted: true,
            questionnaire: None,
        }
    }

    #[test]
    fn new_appointment_requires_a_valid_form() {
        let request = NewAppointment::from_form(&form()).unwrap();
        assert_eq!(request.doctor_id, 5);
        assert_eq!(request.patient.contact_number, "0821234567");

        let mut bad = form();
        bad.terms_accepted = false;
        assert_eq!(
            NewAppointment::from_form(&bad),
            Err(FormError::TermsNotAccepted)
        );
    }

    #[test]
    fn create_body_matches_the_wire_contract() {
        let request = NewAppointment::from_form(&form()).unwrap();
        let body = CreateAppointmentBody {
            date: request.date,
            time: &request.time,
            doctor_id: request.doctor_id,
            patient: &request.patient,
            booked_by_patient: 1,
            questionnaire_data: request.questionnaire.as_ref(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["date"], "2025-04-01");
        assert_eq!(value["time"], "09:00");
        assert_eq!(value["doctor_id"], 5);
        assert_eq!(value["booked_by_patient"], 1);
        assert_eq!(value["patient"]["first_name"], "Thandi");
        // The key is always present, null when no questionnaire rode along.
        assert!(value["questionnaire_data"].is_null());
    }

    #[test]
    fn memory_store_round_trips_and_clears() {
        let store = MemoryStore::new();
        assert!(store.load().is_none());

        let session = StoredSession {
            token: "tok".to_string(),
            patient_id: 12,
        };
        store.save(&session);
        assert_eq!(store.load(), Some(session));

        store.clear();
        assert!(store.load().is_none());
    }
}
