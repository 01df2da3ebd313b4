use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use chrono::{NaiveDate, NaiveDateTime};
use clinic_api::{
    ApiError, Backend, FlowError, FlowEvent, MemoryStore, NewAppointment, SessionController,
    SessionStore,
};
use clinic_core::{
    Appointment, AppointmentStatus, AuthSession, BookingForm, Doctor, DoctorRef, Patient,
    Questionnaire, SessionPhase, StoredSession,
};

/// Backend fake with scripted per-call results and a call journal.
#[derive(Default)]
struct ScriptedBackend {
    calls: RefCell<Vec<&'static str>>,
    doctors: RefCell<Vec<Doctor>>,
    authenticate_results: RefCell<VecDeque<Result<AuthSession, ApiError>>>,
    verify_results: RefCell<VecDeque<Result<AuthSession, ApiError>>>,
    create_results: RefCell<VecDeque<Result<Appointment, ApiError>>>,
    generate_otp_results: RefCell<VecDeque<Result<(), ApiError>>>,
    change_status_results: RefCell<VecDeque<Result<(), ApiError>>>,
    appointments: RefCell<Vec<Appointment>>,
    cancelled: RefCell<Vec<Appointment>>,
}

impl ScriptedBackend {
    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl Backend for ScriptedBackend {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, ApiError> {
        self.record("list_doctors");
        Ok(self.doctors.borrow().clone())
    }

    async fn available_times(
        &self,
        _doctor_id: i64,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<String>>, ApiError> {
        self.record("available_times");
        Ok(BTreeMap::new())
    }

    async fn create_patient(&self, contact_number: &str) -> Result<Patient, ApiError> {
        self.record("create_patient");
        Ok(Patient {
            id: 12,
            first_name: String::new(),
            last_name: String::new(),
            contact_number: contact_number.to_string(),
        })
    }

    async fn generate_otp(&self, _contact_number: &str) -> Result<(), ApiError> {
        self.record("generate_otp");
        self.generate_otp_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn verify_otp(&self, _contact_number: &str, _code: &str) -> Result<AuthSession, ApiError> {
        self.record("verify_otp");
        self.verify_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted verify_otp call")
    }

    async fn authenticate_token(&self, _token: &str) -> Result<AuthSession, ApiError> {
        self.record("authenticate_token");
        self.authenticate_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted authenticate_token call")
    }

    async fn create_appointment(&self, _request: &NewAppointment) -> Result<Appointment, ApiError> {
        self.record("create_appointment");
        self.create_results
            .borrow_mut()
            .pop_front()
            .expect("unscripted create_appointment call")
    }

    async fn patient_appointments(&self, _patient_id: i64) -> Result<Vec<Appointment>, ApiError> {
        self.record("patient_appointments");
        Ok(self.appointments.borrow().clone())
    }

    async fn cancelled_appointments(&self, _patient_id: i64) -> Result<Vec<Appointment>, ApiError> {
        self.record("cancelled_appointments");
        Ok(self.cancelled.borrow().clone())
    }

    async fn change_status(
        &self,
        _appointment_id: i64,
        _status: &AppointmentStatus,
    ) -> Result<(), ApiError> {
        self.record("change_status");
        self.change_status_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn questionnaire(&self, _id: i64) -> Result<Questionnaire, ApiError> {
        self.record("questionnaire");
        Ok(Questionnaire {
            id: Some(1),
            name: "Intake".to_string(),
            questions: Vec::new(),
        })
    }
}

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

fn session() -> AuthSession {
    AuthSession {
        token: "fresh-token".to_string(),
        patient: Patient {
            id: 12,
            first_name: "Thandi".to_string(),
            last_name: "Nkosi".to_string(),
            contact_number: "0821234567".to_string(),
        },
    }
}

fn stored() -> StoredSession {
    StoredSession {
        token: "stored-token".to_string(),
        patient_id: 12,
    }
}

fn appointment(id: i64, date: &str, time: &str) -> Appointment {
    Appointment {
        id,
        doctor: DoctorRef::Name("Dr A Moyo".to_string()),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        time: time.to_string(),
        patient: None,
        status: AppointmentStatus::Unconfirmed,
        questionnaire_data: None,
    }
}

fn at(date: &str, time: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_time(clinic_core::parse_slot_time(time).unwrap())
}

#[tokio::test]
async fn booking_without_token_challenges_before_any_create() {
    let mut controller = SessionController::new(ScriptedBackend::default(), MemoryStore::new());

    let event = controller.submit_booking(&form()).await.unwrap();

    assert_eq!(event, FlowEvent::OtpChallenge);
    assert_eq!(
        controller.phase(),
        &SessionPhase::PendingOtp {
            phone: "0821234567".to_string()
        }
    );
    // Patient upsert, then OTP issuance. Never an immediate create.
    assert_eq!(
        controller.backend().calls(),
        vec!["create_patient", "generate_otp"]
    );
}

#[tokio::test]
async fn booking_with_accepted_token_creates_exactly_once() {
    let backend = ScriptedBackend::default();
    backend
        .authenticate_results
        .borrow_mut()
        .push_back(Ok(session()));
    backend
        .create_results
        .borrow_mut()
        .push_back(Ok(appointment(31, "2025-04-01", "09:00")));
    let store = MemoryStore::with_session(stored());
    let mut controller = SessionController::new(backend, store);

    let event = controller.submit_booking(&form()).await.unwrap();

    assert_eq!(event, FlowEvent::Created(appointment(31, "2025-04-01", "09:00")));
    assert_eq!(
        controller.backend().calls(),
        vec!["authenticate_token", "create_appointment"]
    );
    assert!(matches!(
        controller.phase(),
        SessionPhase::Succeeded { .. }
    ));
}

#[tokio::test]
async fn rejected_token_erases_credential_and_challenges_instead_of_erroring() {
    let backend = ScriptedBackend::default();
    backend
        .authenticate_results
        .borrow_mut()
        .push_back(Err(ApiError::Unauthorized));
    let store = MemoryStore::with_session(stored());
    let mut controller = SessionController::new(backend, store.clone());

    let event = controller.submit_booking(&form()).await.unwrap();

    assert_eq!(event, FlowEvent::OtpChallenge);
    assert!(store.load().is_none());
    assert_eq!(
        controller.backend().calls(),
        vec!["authenticate_token", "create_patient", "generate_otp"]
    );
}

#[tokio::test]
async fn unauthorized_create_rechallenges_and_replays_after_otp() {
    let backend = ScriptedBackend::default();
    backend
        .authenticate_results
        .borrow_mut()
        .push_back(Ok(session()));
    backend
        .create_results
        .borrow_mut()
        .push_back(Err(ApiError::Unauthorized));
    backend
        .verify_results
        .borrow_mut()
        .push_back(Ok(session()));
    backend
        .create_results
        .borrow_mut()
        .push_back(Ok(appointment(31, "2025-04-01", "09:00")));
    let store = MemoryStore::with_session(stored());
    let mut controller = SessionController::new(backend, store);

    let event = controller.submit_booking(&form()).await.unwrap();
    assert_eq!(event, FlowEvent::OtpChallenge);

    let event = controller.submit_otp("123456").await.unwrap();
    assert_eq!(event, FlowEvent::Created(appointment(31, "2025-04-01", "09:00")));
    assert_eq!(
        controller.backend().calls(),
        vec![
            "authenticate_token",
            "create_appointment",
            "create_patient",
            "generate_otp",
            "verify_otp",
            "create_appointment",
        ]
    );
}

#[tokio::test]
async fn wrong_code_keeps_the_challenge_open_for_retry() {
    let backend = ScriptedBackend::default();
    backend.verify_results.borrow_mut().push_back(Err(
        ApiError::Rejected {
            status: 400,
            body: "invalid otp".to_string(),
        },
    ));
    backend
        .verify_results
        .borrow_mut()
        .push_back(Ok(session()));
    backend
        .create_results
        .borrow_mut()
        .push_back(Ok(appointment(31, "2025-04-01", "09:00")));
    let mut controller = SessionController::new(backend, MemoryStore::new());

    controller.submit_booking(&form()).await.unwrap();

    let event = controller.submit_otp("000000").await.unwrap();
    assert_eq!(event, FlowEvent::OtpRejected);
    assert!(matches!(
        controller.phase(),
        SessionPhase::PendingOtp { .. }
    ));

    let event = controller.submit_otp("123456").await.unwrap();
    assert!(matches!(event, FlowEvent::Created(_)));
}

#[tokio::test]
async fn otp_submission_without_a_challenge_is_refused() {
    let mut controller = SessionController::new(ScriptedBackend::default(), MemoryStore::new());

    let result = controller.submit_otp("123456").await;

    assert!(matches!(result, Err(FlowError::NoChallenge)));
}

#[tokio::test]
async fn invalid_form_makes_no_backend_call() {
    let mut controller = SessionController::new(ScriptedBackend::default(), MemoryStore::new());
    let mut bad = form();
    bad.terms_accepted = false;

    let result = controller.submit_booking(&bad).await;

    assert!(matches!(result, Err(FlowError::Form(_))));
    assert!(controller.backend().calls().is_empty());
}

#[tokio::test]
async fn management_login_surfaces_unregistered_phone() {
    let backend = ScriptedBackend::default();
    backend
        .generate_otp_results
        .borrow_mut()
        .push_back(Err(ApiError::PhoneNotRegistered));
    let mut controller = SessionController::new(backend, MemoryStore::new());

    let result = controller.begin_login("0829999999").await;

    assert!(matches!(
        result,
        Err(FlowError::Api(ApiError::PhoneNotRegistered))
    ));
    assert_eq!(controller.phase(), &SessionPhase::Anonymous);
}

#[tokio::test]
async fn management_login_authenticates_without_replaying_anything() {
    let backend = ScriptedBackend::default();
    backend
        .verify_results
        .borrow_mut()
        .push_back(Ok(session()));
    let mut controller = SessionController::new(backend, MemoryStore::new());

    controller.begin_login("0821234567").await.unwrap();
    let event = controller.submit_otp("123456").await.unwrap();

    assert_eq!(event, FlowEvent::Authenticated);
    assert!(controller.phase().is_authenticated());
    // No patient upsert and nothing staged to create.
    assert_eq!(
        controller.backend().calls(),
        vec!["generate_otp", "verify_otp"]
    );
}

#[tokio::test]
async fn restore_promotes_a_stored_token_silently() {
    let backend = ScriptedBackend::default();
    backend
        .authenticate_results
        .borrow_mut()
        .push_back(Ok(session()));
    let store = MemoryStore::with_session(stored());
    let mut controller = SessionController::new(backend, store.clone());

    assert!(controller.restore().await);
    assert!(controller.phase().is_authenticated());
    // The refreshed token replaces the stored one.
    assert_eq!(store.load().unwrap().token, "fresh-token");
}

#[tokio::test]
async fn restore_erases_a_rejected_token() {
    let backend = ScriptedBackend::default();
    backend
        .authenticate_results
        .borrow_mut()
        .push_back(Err(ApiError::Unauthorized));
    let store = MemoryStore::with_session(stored());
    let mut controller = SessionController::new(backend, store.clone());

    assert!(!controller.restore().await);
    assert_eq!(controller.phase(), &SessionPhase::Anonymous);
    assert!(store.load().is_none());
}

#[tokio::test]
async fn loaded_appointments_are_partitioned_and_tagged() {
    let backend = ScriptedBackend::default();
    backend
        .verify_results
        .borrow_mut()
        .push_back(Ok(session()));
    *backend.appointments.borrow_mut() = vec![
        appointment(1, "2025-01-10", "09:00"),
        appointment(2, "2025-01-05", "14:00"),
        appointment(3, "2025-01-20", "08:00"),
    ];
    let mut listed = appointment(4, "2025-01-02", "10:00");
    listed.status = AppointmentStatus::Confirmed;
    *backend.cancelled.borrow_mut() = vec![listed];
    let mut controller = SessionController::new(backend, MemoryStore::new());

    controller.begin_login("0821234567").await.unwrap();
    controller.submit_otp("123456").await.unwrap();
    let tabs = controller
        .load_appointments(at("2025-01-12", "00:00"))
        .await
        .unwrap();

    let upcoming: Vec<i64> = tabs.upcoming.iter().map(|a| a.id).collect();
    let previous: Vec<i64> = tabs.previous.iter().map(|a| a.id).collect();
    assert_eq!(upcoming, vec![3]);
    assert_eq!(previous, vec![1, 2]);
    assert_eq!(tabs.cancelled[0].status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn cancel_requires_authentication_and_propagates_failure() {
    let mut controller = SessionController::new(ScriptedBackend::default(), MemoryStore::new());
    assert!(matches!(
        controller.cancel_appointment(1).await,
        Err(FlowError::NotAuthenticated)
    ));

    let backend = ScriptedBackend::default();
    backend
        .verify_results
        .borrow_mut()
        .push_back(Ok(session()));
    backend.change_status_results.borrow_mut().push_back(Err(
        ApiError::Rejected {
            status: 500,
            body: String::new(),
        },
    ));
    let mut controller = SessionController::new(backend, MemoryStore::new());
    controller.begin_login("0821234567").await.unwrap();
    controller.submit_otp("123456").await.unwrap();

    let result = controller.cancel_appointment(1).await;

    assert!(matches!(result, Err(FlowError::Api(_))));
    // The caller only moves lists on Ok, so a failure leaves them alone.
}

#[tokio::test]
async fn doctor_list_is_stable_across_repeated_fetches() {
    let backend = ScriptedBackend::default();
    *backend.doctors.borrow_mut() = vec![Doctor {
        id: 5,
        first_name: "Ayesha".to_string(),
        last_name: "Patel".to_string(),
        about: None,
        qualifications: None,
        pricing: None,
        medical_aid: Vec::new(),
        image: None,
    }];

    let first = backend.list_doctors().await.unwrap();
    let second = backend.list_doctors().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn logout_clears_store_and_staged_state() {
    let backend = ScriptedBackend::default();
    backend
        .authenticate_results
        .borrow_mut()
        .push_back(Ok(session()));
    let store = MemoryStore::with_session(stored());
    let mut controller = SessionController::new(backend, store.clone());
    controller.restore().await;

    controller.logout();

    assert!(store.load().is_none());
    assert_eq!(controller.phase(), &SessionPhase::Anonymous);
}
