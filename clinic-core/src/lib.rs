//! Core domain logic for the patient booking client.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Client configuration shared by every surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicConfig {
    /// Base URL of the practice backend.
    pub api_base_url: String,
    /// Whether the medical questionnaire step is offered during booking.
    pub questionnaire_enabled: bool,
    /// Identifier of the questionnaire to fetch when enabled.
    pub questionnaire_id: i64,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            questionnaire_enabled: false,
            questionnaire_id: 1,
        }
    }
}

/// A bookable practitioner, as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub qualifications: Option<String>,
    #[serde(default)]
    pub pricing: Option<String>,
    #[serde(default, rename = "medicalAid")]
    pub medical_aid: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Doctor {
    /// Display name used in selectors and appointment rows.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A registered patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub contact_number: String,
}

/// Name and contact snapshot embedded in an appointment at booking time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
}

/// Appointment status codes owned by the backend. Unknown codes are
/// carried through verbatim rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Unconfirmed,
    Confirmed,
    Cancelled,
    Other(String),
}

impl AppointmentStatus {
    /// The wire code for this status.
    pub fn as_code(&self) -> &str {
        match self {
            AppointmentStatus::Unconfirmed => "UNC",
            AppointmentStatus::Confirmed => "CNF",
            AppointmentStatus::Cancelled => "CNC",
            AppointmentStatus::Other(code) => code,
        }
    }
}

impl From<String> for AppointmentStatus {
    fn from(code: String) -> Self {
        match code.as_str() {
            "UNC" => AppointmentStatus::Unconfirmed,
            "CNF" => AppointmentStatus::Confirmed,
            "CNC" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(code),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        status.as_code().to_string()
    }
}

/// Doctor field on an appointment: the backend embeds either a profile
/// object or a pre-rendered display string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DoctorRef {
    Profile {
        #[serde(default)]
        id: Option<i64>,
        first_name: String,
        last_name: String,
    },
    Name(String),
}

impl DoctorRef {
    pub fn display_name(&self) -> String {
        match self {
            DoctorRef::Profile {
                first_name,
                last_name,
                ..
            } => format!("{first_name} {last_name}"),
            DoctorRef::Name(name) => name.clone(),
        }
    }
}

/// A booked appointment as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub doctor: DoctorRef,
    pub date: NaiveDate,
    /// Slot string, `HH:MM` or `HH:MM:SS`.
    pub time: String,
    #[serde(default)]
    pub patient: Option<PatientDetails>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub questionnaire_data: Option<Questionnaire>,
}

impl Appointment {
    /// Combined start timestamp. `None` when the slot string does not
    /// parse; such appointments belong to neither partition.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        parse_slot_time(&self.time).map(|time| self.date.and_time(time))
    }
}

/// Parse a slot string as sent by the availability endpoint.
pub fn parse_slot_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// An ordered medical questionnaire, optionally attached to a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Questionnaire {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Questionnaire {
    /// Fold an edited answer back into the position-keyed question list.
    /// An empty answer clears the stored one.
    pub fn set_answer(&mut self, index: usize, answer: &str) {
        if let Some(question) = self.questions.get_mut(index) {
            question.answer = if answer.is_empty() {
                None
            } else {
                Some(answer.to_string())
            };
        }
    }
}

/// One questionnaire entry: free text unless declared multiple-choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub question_text: String,
    #[serde(default)]
    pub question_type: String,
    /// Comma-separated choices when multiple-choice.
    #[serde(default)]
    pub choices: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    FreeText,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        if self.question_type == "multiple_choice" && self.choices.is_some() {
            QuestionKind::MultipleChoice
        } else {
            QuestionKind::FreeText
        }
    }

    /// The declared choices, trimmed, empty entries dropped.
    pub fn choice_list(&self) -> Vec<String> {
        self.choices
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|choice| !choice.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Live credential issued after OTP verification or token re-validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub patient: Patient,
}

impl AuthSession {
    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            token: self.token.clone(),
            patient_id: self.patient.id,
        }
    }
}

/// Durable subset of a session, persisted under the fixed storage keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub patient_id: i64,
}

/// Storage keys kept compatible with the previous generation of the
/// client, so an existing login survives the swap.
pub const TOKEN_STORAGE_KEY: &str = "authToken";
pub const PATIENT_ID_STORAGE_KEY: &str = "patientId";

/// A contact number is exactly ten ASCII digits.
pub fn is_valid_phone_number(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Booking form as filled in by the visitor, before any backend call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingForm {
    pub doctor_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub terms_accepted: bool,
    pub questionnaire: Option<Questionnaire>,
}

/// Validation failures that block submission outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Please select a doctor.")]
    MissingDoctor,
    #[error("Please fill in all required fields.")]
    MissingField(&'static str),
    #[error("Please enter a valid 10-digit cellphone number.")]
    InvalidPhone,
    #[error("Please accept the terms and conditions.")]
    TermsNotAccepted,
}

impl BookingForm {
    /// Check the form in submission order: doctor, required fields,
    /// phone format, terms. The first failure wins and no backend call
    /// may be made while any remains.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.doctor_id.is_none() {
            return Err(FormError::MissingDoctor);
        }
        if self.first_name.trim().is_empty() {
            return Err(FormError::MissingField("first name"));
        }
        if self.last_name.trim().is_empty() {
            return Err(FormError::MissingField("last name"));
        }
        if self.contact_number.trim().is_empty() {
            return Err(FormError::MissingField("cellphone number"));
        }
        if self.date.is_none() {
            return Err(FormError::MissingField("appointment date"));
        }
        if self.time.is_empty() {
            return Err(FormError::MissingField("appointment time"));
        }
        if !is_valid_phone_number(self.contact_number.trim()) {
            return Err(FormError::InvalidPhone);
        }
        if !self.terms_accepted {
            return Err(FormError::TermsNotAccepted);
        }
        Ok(())
    }

    /// Patient snapshot carried on the appointment payload.
    pub fn patient_details(&self) -> PatientDetails {
        PatientDetails {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            contact_number: self.contact_number.trim().to_string(),
        }
    }
}

/// Upcoming / previous partition of a patient's active appointments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentBuckets {
    pub upcoming: Vec<Appointment>,
    pub previous: Vec<Appointment>,
}

/// Split appointments around `now`, evaluated at render time.
///
/// An appointment starting exactly at `now` counts as upcoming. Upcoming
/// sorts soonest first, previous most recent first.
pub fn partition_appointments(
    appointments: &[Appointment],
    now: NaiveDateTime,
) -> AppointmentBuckets {
    let mut buckets = AppointmentBuckets::default();
    for appointment in appointments {
        let Some(starts_at) = appointment.starts_at() else {
            continue;
        };
        if starts_at >= now {
            buckets.upcoming.push(appointment.clone());
        } else {
            buckets.previous.push(appointment.clone());
        }
    }
    buckets.upcoming.sort_by_key(Appointment::starts_at);
    buckets
        .previous
        .sort_by_key(|appointment| std::cmp::Reverse(appointment.starts_at()));
    buckets
}

/// The three management views in display order. Cancelled rows keep
/// their fetch order; no ordering is contractual there.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentTabs {
    pub upcoming: Vec<Appointment>,
    pub previous: Vec<Appointment>,
    pub cancelled: Vec<Appointment>,
}

/// Build the management tabs from the two backend lists.
pub fn categorize_appointments(
    active: &[Appointment],
    cancelled: Vec<Appointment>,
    now: NaiveDateTime,
) -> AppointmentTabs {
    let buckets = partition_appointments(active, now);
    AppointmentTabs {
        upcoming: buckets.upcoming,
        previous: buckets.previous,
        cancelled: tag_cancelled(cancelled),
    }
}

/// Force the cancelled status on a fetched cancelled list, whatever the
/// backend reported per row.
pub fn tag_cancelled(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    for appointment in &mut appointments {
        appointment.status = AppointmentStatus::Cancelled;
    }
    appointments
}

/// Local list move after a confirmed cancellation: the appointment leaves
/// the active list and joins the cancelled one with its status forced.
/// Must only run once the backend status change has succeeded; a failed
/// change leaves both lists untouched.
pub fn apply_cancellation(
    active: &mut Vec<Appointment>,
    cancelled: &mut Vec<Appointment>,
    appointment_id: i64,
) {
    if let Some(index) = active
        .iter()
        .position(|appointment| appointment.id == appointment_id)
    {
        let mut appointment = active.remove(index);
        appointment.status = AppointmentStatus::Cancelled;
        cancelled.push(appointment);
    }
}

/// Expected length of a verification code.
pub const OTP_LENGTH: usize = 6;

/// Digit-per-box model behind the OTP input widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    digits: Vec<Option<char>>,
    focus: usize,
}

impl Default for OtpEntry {
    fn default() -> Self {
        Self::new(OTP_LENGTH)
    }
}

impl OtpEntry {
    pub fn new(len: usize) -> Self {
        Self {
            digits: vec![None; len],
            focus: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.iter().all(Option::is_none)
    }

    /// Position that should currently hold keyboard focus.
    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn digit(&self, index: usize) -> Option<char> {
        self.digits.get(index).copied().flatten()
    }

    /// Apply raw input at `index`. Anything containing a non-digit is
    /// ignored; when several digits arrive at once (paste) the last one
    /// wins. A digit in any position but the last advances focus.
    pub fn enter(&mut self, index: usize, input: &str) -> bool {
        if index >= self.digits.len() {
            return false;
        }
        if input.is_empty() {
            self.digits[index] = None;
            return true;
        }
        if !input.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        self.digits[index] = input.chars().last();
        if index < self.digits.len() - 1 {
            self.focus = index + 1;
        }
        true
    }

    /// Backspace at `index`: clears the digit in place; when the position
    /// was already empty and there is a previous one, focus moves back.
    pub fn backspace(&mut self, index: usize) {
        if index >= self.digits.len() {
            return;
        }
        if self.digits[index].is_none() {
            if index > 0 {
                self.focus = index - 1;
            }
        } else {
            self.digits[index] = None;
        }
    }

    /// The code as typed so far, skipping empty positions.
    pub fn code(&self) -> String {
        self.digits.iter().filter_map(|digit| *digit).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    /// Reset after a failed verification: digits cleared, focus on the
    /// first box.
    pub fn clear(&mut self) {
        for digit in &mut self.digits {
            *digit = None;
        }
        self.focus = 0;
    }
}

/// Auth + booking flow phase. Tagged variants keep illegal combinations
/// (an OTP challenge on top of a live session, success without a created
/// appointment) unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// No credential; silent re-auth may still promote on load.
    Anonymous,
    /// OTP issued for this phone; waiting on the 6-digit code.
    PendingOtp { phone: String },
    /// Verified session; protected calls attach the bearer token.
    Authenticated { session: AuthSession },
    /// Protected action submitted, response pending.
    ActionInFlight,
    /// Terminal: the staged action completed.
    Succeeded { appointment: Appointment },
    /// Terminal: user-visible failure; retry only by re-invocation.
    Failed { message: String },
}

impl SessionPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated { .. })
    }

    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            SessionPhase::Authenticated { session } => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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

    #[test]
    fn phone_numbers_require_exactly_ten_digits() {
        assert!(is_valid_phone_number("0821234567"));
        assert!(!is_valid_phone_number("082123456"));
        assert!(!is_valid_phone_number("08212345678"));
        assert!(!is_valid_phone_number("08212345ab"));
        assert!(!is_valid_phone_number(""));
    }

    #[test]
    fn status_codes_map_both_ways() {
        assert_eq!(AppointmentStatus::from("UNC".to_string()).as_code(), "UNC");
        assert_eq!(
            AppointmentStatus::from("CNC".to_string()),
            AppointmentStatus::Cancelled
        );
        assert_eq!(
            AppointmentStatus::from("XYZ".to_string()),
            AppointmentStatus::Other("XYZ".to_string())
        );
        assert_eq!(String::from(AppointmentStatus::Confirmed), "CNF");
    }

    #[test]
    fn partition_orders_upcoming_ascending_and_previous_descending() {
        let appointments = vec![
            appointment(1, "2025-01-10", "09:00"),
            appointment(2, "2025-01-05", "14:00"),
            appointment(3, "2025-01-20", "08:00"),
        ];
        let now = NaiveDate::from_ymd_opt(2025, 1, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let buckets = partition_appointments(&appointments, now);

        let upcoming: Vec<i64> = buckets.upcoming.iter().map(|a| a.id).collect();
        let previous: Vec<i64> = buckets.previous.iter().map(|a| a.id).collect();
        assert_eq!(upcoming, vec![3]);
        assert_eq!(previous, vec![1, 2]);
    }

    #[test]
    fn appointment_exactly_at_now_counts_as_upcoming() {
        let appointments = vec![appointment(7, "2025-03-01", "10:30")];
        let now = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        let buckets = partition_appointments(&appointments, now);

        assert_eq!(buckets.upcoming.len(), 1);
        assert!(buckets.previous.is_empty());
    }

    #[test]
    fn unparseable_slot_time_lands_in_neither_bucket() {
        let appointments = vec![appointment(9, "2025-03-01", "morning")];
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let buckets = partition_appointments(&appointments, now);

        assert!(buckets.upcoming.is_empty());
        assert!(buckets.previous.is_empty());
    }

    #[test]
    fn slot_times_parse_with_and_without_seconds() {
        assert!(parse_slot_time("09:00").is_some());
        assert!(parse_slot_time("09:00:00").is_some());
        assert!(parse_slot_time("9am").is_none());
    }

    #[test]
    fn tag_cancelled_overrides_backend_status() {
        let mut listed = appointment(4, "2025-02-01", "11:00");
        listed.status = AppointmentStatus::Confirmed;

        let tagged = tag_cancelled(vec![listed]);

        assert_eq!(tagged[0].status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn apply_cancellation_moves_between_lists() {
        let mut active = vec![
            appointment(1, "2025-02-01", "09:00"),
            appointment(2, "2025-02-02", "09:00"),
        ];
        let mut cancelled = Vec::new();

        apply_cancellation(&mut active, &mut cancelled, 1);

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 2);
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, 1);
        assert_eq!(cancelled[0].status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn apply_cancellation_with_unknown_id_is_a_no_op() {
        let mut active = vec![appointment(1, "2025-02-01", "09:00")];
        let mut cancelled = Vec::new();

        apply_cancellation(&mut active, &mut cancelled, 99);

        assert_eq!(active.len(), 1);
        assert!(cancelled.is_empty());
    }

    #[test]
    fn otp_entry_ignores_non_digit_input() {
        let mut entry = OtpEntry::default();
        assert!(!entry.enter(0, "a"));
        assert_eq!(entry.code(), "");
        assert_eq!(entry.focus(), 0);
    }

    #[test]
    fn otp_entry_advances_focus_on_digit() {
        let mut entry = OtpEntry::default();
        assert!(entry.enter(0, "4"));
        assert_eq!(entry.focus(), 1);
        assert_eq!(entry.digit(0), Some('4'));
    }

    #[test]
    fn otp_entry_keeps_focus_on_last_position() {
        let mut entry = OtpEntry::default();
        assert!(entry.enter(5, "9"));
        assert_eq!(entry.focus(), 5);
    }

    #[test]
    fn otp_entry_paste_takes_last_digit() {
        let mut entry = OtpEntry::default();
        assert!(entry.enter(2, "78"));
        assert_eq!(entry.digit(2), Some('8'));
    }

    #[test]
    fn otp_backspace_on_empty_moves_focus_back() {
        let mut entry = OtpEntry::default();
        entry.enter(0, "1");
        entry.backspace(1);
        assert_eq!(entry.focus(), 0);
        assert_eq!(entry.digit(0), Some('1'));
    }

    #[test]
    fn otp_backspace_on_filled_clears_in_place() {
        let mut entry = OtpEntry::default();
        entry.enter(0, "1");
        entry.backspace(0);
        assert_eq!(entry.digit(0), None);
        assert_eq!(entry.focus(), 1);
    }

    #[test]
    fn otp_completes_after_six_digits() {
        let mut entry = OtpEntry::default();
        for (i, d) in "123456".chars().enumerate() {
            entry.enter(i, &d.to_string());
        }
        assert!(entry.is_complete());
        assert_eq!(entry.code(), "123456");

        entry.clear();
        assert!(entry.is_empty());
        assert_eq!(entry.focus(), 0);
    }

    fn valid_form() -> BookingForm {
        BookingForm {
            doctor_id: Some(3),
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
    fn valid_form_passes_validation() {
        assert_eq!(valid_form().validate(), Ok(()));
    }

    #[test]
    fn form_checks_doctor_before_anything_else() {
        let mut form = valid_form();
        form.doctor_id = None;
        form.first_name.clear();
        assert_eq!(form.validate(), Err(FormError::MissingDoctor));
    }

    #[test]
    fn form_rejects_missing_fields_then_phone_then_terms() {
        let mut form = valid_form();
        form.time.clear();
        assert_eq!(
            form.validate(),
            Err(FormError::MissingField("appointment time"))
        );

        let mut form = valid_form();
        form.contact_number = "12345".to_string();
        assert_eq!(form.validate(), Err(FormError::InvalidPhone));

        let mut form = valid_form();
        form.terms_accepted = false;
        assert_eq!(form.validate(), Err(FormError::TermsNotAccepted));
    }

    #[test]
    fn questionnaire_answers_fold_back_by_position() {
        let mut questionnaire = Questionnaire {
            id: Some(1),
            name: "Intake".to_string(),
            questions: vec![
                Question {
                    question_text: "Any allergies?".to_string(),
                    question_type: "text".to_string(),
                    choices: None,
                    answer: None,
                },
                Question {
                    question_text: "Smoker?".to_string(),
                    question_type: "multiple_choice".to_string(),
                    choices: Some("Yes, No , Occasionally,".to_string()),
                    answer: None,
                },
            ],
        };

        questionnaire.set_answer(0, "Penicillin");
        questionnaire.set_answer(1, "No");
        questionnaire.set_answer(9, "out of range is ignored");

        assert_eq!(
            questionnaire.questions[0].answer.as_deref(),
            Some("Penicillin")
        );
        assert_eq!(questionnaire.questions[1].answer.as_deref(), Some("No"));

        questionnaire.set_answer(0, "");
        assert_eq!(questionnaire.questions[0].answer, None);
    }

    #[test]
    fn choice_list_trims_and_drops_empties() {
        let question = Question {
            question_text: "Smoker?".to_string(),
            question_type: "multiple_choice".to_string(),
            choices: Some("Yes, No , Occasionally,".to_string()),
            answer: None,
        };
        assert_eq!(question.kind(), QuestionKind::MultipleChoice);
        assert_eq!(question.choice_list(), vec!["Yes", "No", "Occasionally"]);
    }

    #[test]
    fn question_without_choices_is_free_text() {
        let question = Question {
            question_text: "Any allergies?".to_string(),
            question_type: "multiple_choice".to_string(),
            choices: None,
            answer: None,
        };
        assert_eq!(question.kind(), QuestionKind::FreeText);
    }

    #[test]
    fn doctor_ref_renders_both_shapes() {
        let embedded = DoctorRef::Profile {
            id: Some(2),
            first_name: "Ayesha".to_string(),
            last_name: "Patel".to_string(),
        };
        assert_eq!(embedded.display_name(), "Ayesha Patel");
        assert_eq!(
            DoctorRef::Name("Dr A Moyo".to_string()).display_name(),
            "Dr A Moyo"
        );
    }
}
