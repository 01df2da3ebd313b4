//! Yew front-end for the booking and management flows (wasm32 only).

#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::{Local, NaiveDate};
    use serde::Deserialize;
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{
        console, Document, Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
        Window,
    };
    use yew::events::{InputEvent, KeyboardEvent};
    use yew::platform::spawn_local;
    use yew::prelude::*;
    use yew::TargetCast;

    use clinic_api::{
        ApiError, Backend, FlowError, FlowEvent, RestClient, SessionController, SessionStore,
    };
    use clinic_core::{
        apply_cancellation, partition_appointments, Appointment, BookingForm, ClinicConfig,
        Doctor, OtpEntry, Question, QuestionKind, Questionnaire, StoredSession,
        PATIENT_ID_STORAGE_KEY, TOKEN_STORAGE_KEY,
    };

    use crate::styles;

    /// Session persistence over `window.localStorage`, under the same
    /// keys the previous client generation used.
    #[derive(Clone, Copy, Default)]
    pub struct LocalStore;

    impl LocalStore {
        fn storage() -> Option<web_sys::Storage> {
            web_sys::window().and_then(|window| window.local_storage().ok().flatten())
        }
    }

    impl SessionStore for LocalStore {
        fn load(&self) -> Option<StoredSession> {
            let storage = Self::storage()?;
            let token = storage.get_item(TOKEN_STORAGE_KEY).ok().flatten()?;
            let patient_id = storage
                .get_item(PATIENT_ID_STORAGE_KEY)
                .ok()
                .flatten()?
                .parse()
                .ok()?;
            Some(StoredSession { token, patient_id })
        }

        fn save(&self, session: &StoredSession) {
            if let Some(storage) = Self::storage() {
                let _ = storage.set_item(TOKEN_STORAGE_KEY, &session.token);
                let _ = storage.set_item(PATIENT_ID_STORAGE_KEY, &session.patient_id.to_string());
            }
        }

        fn clear(&self) {
            if let Some(storage) = Self::storage() {
                let _ = storage.remove_item(TOKEN_STORAGE_KEY);
                let _ = storage.remove_item(PATIENT_ID_STORAGE_KEY);
            }
        }
    }

    type Controller = SessionController<RestClient<LocalStore>, LocalStore>;

    /// The controller is taken out for the duration of one awaited flow
    /// step. A second event while a step is in flight finds `None` and
    /// is dropped: one user flow at a time.
    type SharedController = Rc<RefCell<Option<Controller>>>;

    fn log_error(context: &str, err: &dyn std::fmt::Display) {
        console::error_1(&JsValue::from_str(&format!("{context}: {err}")));
    }

    #[derive(Properties, PartialEq)]
    pub struct OtpInputProps {
        pub entry: OtpEntry,
        pub on_change: Callback<OtpEntry>,
    }

    /// One input box per digit; keyboard focus follows the entry model.
    #[function_component(OtpInput)]
    pub fn otp_input(props: &OtpInputProps) -> Html {
        {
            let focus = props.entry.focus();
            use_effect_with(focus, |focus| {
                if let Some(document) = web_sys::window().and_then(|window| window.document()) {
                    if let Some(element) = document.get_element_by_id(&format!("otp-{focus}")) {
                        if let Ok(input) = element.dyn_into::<HtmlInputElement>() {
                            let _ = input.focus();
                        }
                    }
                }
                || ()
            });
        }

        html! {
            <div class="otp-row">
                {
                    for (0..props.entry.len()).map(|index| {
                        let value = props
                            .entry
                            .digit(index)
                            .map(String::from)
                            .unwrap_or_default();

                        let oninput = {
                            let entry = props.entry.clone();
                            let on_change = props.on_change.clone();
                            Callback::from(move |event: InputEvent| {
                                let input: HtmlInputElement = event.target_unchecked_into();
                                let mut next = entry.clone();
                                if next.enter(index, &input.value()) {
                                    on_change.emit(next);
                                } else {
                                    // Non-digit input: restore the digit on show.
                                    input.set_value(
                                        &entry.digit(index).map(String::from).unwrap_or_default(),
                                    );
                                }
                            })
                        };

                        let onkeydown = {
                            let entry = props.entry.clone();
                            let on_change = props.on_change.clone();
                            Callback::from(move |event: KeyboardEvent| {
                                // A filled box is cleared by the browser and lands
                                // in oninput; an empty one steps focus back here.
                                if event.key() == "Backspace" && entry.digit(index).is_none() {
                                    event.prevent_default();
                                    let mut next = entry.clone();
                                    next.backspace(index);
                                    on_change.emit(next);
                                }
                            })
                        };

                        html! {
                            <input
                                id={format!("otp-{index}")}
                                class="otp-digit"
                                type="text"
                                inputmode="numeric"
                                maxlength="1"
                                value={value}
                                {oninput}
                                {onkeydown}
                            />
                        }
                    })
                }
            </div>
        }
    }

    #[derive(Properties, PartialEq)]
    pub struct QuestionnaireFormProps {
        pub questionnaire: Questionnaire,
        pub on_change: Callback<Questionnaire>,
    }

    /// One control per question: a select for multiple-choice, free text
    /// otherwise. Edits fold back into the question list by position.
    #[function_component(QuestionnaireForm)]
    pub fn questionnaire_form(props: &QuestionnaireFormProps) -> Html {
        let render_question = |(index, question): (usize, &Question)| {
            let answer = question.answer.clone().unwrap_or_default();
            let control = match question.kind() {
                QuestionKind::MultipleChoice => {
                    let onchange = {
                        let questionnaire = props.questionnaire.clone();
                        let on_change = props.on_change.clone();
                        Callback::from(move |event: Event| {
                            let select: HtmlSelectElement = event.target_unchecked_into();
                            let mut next = questionnaire.clone();
                            next.set_answer(index, &select.value());
                            on_change.emit(next);
                        })
                    };
                    html! {
                        <select {onchange}>
                            <option value="" selected={answer.is_empty()}>
                                {"Please select an option"}
                            </option>
                            {
                                for question.choice_list().into_iter().map(|choice| {
                                    let selected = answer == choice;
                                    html! {
                                        <option value={choice.clone()} {selected}>
                                            { choice.clone() }
                                        </option>
                                    }
                                })
                            }
                        </select>
                    }
                }
                QuestionKind::FreeText => {
                    let oninput = {
                        let questionnaire = props.questionnaire.clone();
                        let on_change = props.on_change.clone();
                        Callback::from(move |event: InputEvent| {
                            let area: HtmlTextAreaElement = event.target_unchecked_into();
                            let mut next = questionnaire.clone();
                            next.set_answer(index, &area.value());
                            on_change.emit(next);
                        })
                    };
                    html! {
                        <textarea
                            placeholder="Please provide your answer"
                            value={answer.clone()}
                            {oninput}
                        />
                    }
                }
            };

            html! {
                <div class="clinic-field">
                    <label>{ question.question_text.clone() }</label>
                    { control }
                </div>
            }
        };

        html! {
            <section class="clinic-card">
                <h3>{ props.questionnaire.name.clone() }</h3>
                <p class="questionnaire-intro">
                    {"Please complete this brief medical questionnaire to help us better prepare \
                      for your appointment."}
                </p>
                { for props.questionnaire.questions.iter().enumerate().map(render_question) }
            </section>
        }
    }

    fn notice_banner(notice: &Option<String>) -> Html {
        match notice {
            Some(text) => html! { <div class="clinic-notice">{ text.clone() }</div> },
            None => Html::default(),
        }
    }

    fn ensure_page_styles() {
        if let Some(window) = web_sys::window() {
            if let Some(document) = window.document() {
                if let Err(err) = styles::ensure_styles(&document) {
                    console::error_1(&err);
                }
            }
        }
    }

    fn render_doctor_profile(doctor: &Doctor) -> Html {
        let initials: String = doctor
            .first_name
            .chars()
            .take(1)
            .chain(doctor.last_name.chars().take(1))
            .collect();

        html! {
            <section class="clinic-card">
                <h2>{"Doctor Profile"}</h2>
                <div class="doctor-profile">
                    {
                        match &doctor.image {
                            Some(image) => html! {
                                <img class="doctor-avatar" src={image.clone()} alt={doctor.full_name()} />
                            },
                            None => html! { <div class="doctor-avatar">{ initials }</div> },
                        }
                    }
                    <div>
                        <h3>{ doctor.full_name() }</h3>
                        {
                            doctor.about.as_ref().map(|about| html! {
                                <p class="doctor-about">{ about.clone() }</p>
                            }).unwrap_or_default()
                        }
                        {
                            doctor.qualifications.as_ref().map(|qualifications| html! {
                                <p>{ format!("Qualifications: {qualifications}") }</p>
                            }).unwrap_or_default()
                        }
                        {
                            if doctor.medical_aid.is_empty() {
                                Html::default()
                            } else {
                                html! {
                                    <div>
                                        <p>{"Accepted Medical Aid:"}</p>
                                        <ul class="doctor-aid-list">
                                            {
                                                for doctor.medical_aid.iter().map(|aid| html! {
                                                    <li>{ aid.clone() }</li>
                                                })
                                            }
                                        </ul>
                                    </div>
                                }
                            }
                        }
                        {
                            doctor.pricing.as_ref().map(|pricing| html! {
                                <p class="doctor-pricing">{ pricing.clone() }</p>
                            }).unwrap_or_default()
                        }
                    </div>
                </div>
            </section>
        }
    }

    fn appointment_table(
        appointments: &[Appointment],
        on_cancel: Option<Callback<Appointment>>,
    ) -> Html {
        if appointments.is_empty() {
            return html! { <p class="clinic-empty">{"No appointments found."}</p> };
        }

        html! {
            <table class="clinic-table">
                <thead>
                    <tr>
                        <th>{"ID"}</th>
                        <th>{"Date"}</th>
                        <th>{"Time"}</th>
                        <th>{"Name"}</th>
                        <th>{"Number"}</th>
                        <th>{"Doctor"}</th>
                        <th>{"Status"}</th>
                        {
                            if on_cancel.is_some() {
                                html! { <th>{"Cancel"}</th> }
                            } else {
                                Html::default()
                            }
                        }
                    </tr>
                </thead>
                <tbody>
                    {
                        for appointments.iter().map(|appointment| {
                            let patient_name = appointment
                                .patient
                                .as_ref()
                                .map(|patient| {
                                    format!("{} {}", patient.first_name, patient.last_name)
                                })
                                .unwrap_or_default();
                            let patient_number = appointment
                                .patient
                                .as_ref()
                                .map(|patient| patient.contact_number.clone())
                                .unwrap_or_default();
                            let cancel_cell = on_cancel
                                .as_ref()
                                .map(|on_cancel| {
                                    let on_cancel = on_cancel.clone();
                                    let appointment = appointment.clone();
                                    let onclick =
                                        Callback::from(move |_| on_cancel.emit(appointment.clone()));
                                    html! {
                                        <td>
                                            <button
                                                class="clinic-button danger"
                                                aria-label="Cancel Appointment"
                                                {onclick}
                                            >
                                                {"✕"}
                                            </button>
                                        </td>
                                    }
                                })
                                .unwrap_or_default();

                            html! {
                                <tr key={appointment.id.to_string()}>
                                    <td>{ appointment.id }</td>
                                    <td>{ appointment.date.to_string() }</td>
                                    <td>{ appointment.time.clone() }</td>
                                    <td>{ patient_name }</td>
                                    <td>{ patient_number }</td>
                                    <td>{ appointment.doctor.display_name() }</td>
                                    <td>
                                        <span
                                            class="status-pill"
                                            data-status={appointment.status.as_code().to_string()}
                                        >
                                            { appointment.status.as_code().to_string() }
                                        </span>
                                    </td>
                                    { cancel_cell }
                                </tr>
                            }
                        })
                    }
                </tbody>
            </table>
        }
    }

    #[derive(Properties, PartialEq)]
    pub struct PageProps {
        #[prop_or_default]
        pub config: ClinicConfig,
    }

    #[function_component(BookingPage)]
    pub fn booking_page(props: &PageProps) -> Html {
        let client = (*use_memo(props.config.clone(), |config| {
            RestClient::from_config(config, LocalStore)
        }))
        .clone();
        let controller: SharedController = {
            let client = client.clone();
            use_mut_ref(move || Some(SessionController::new(client, LocalStore)))
        };

        let doctors = use_state(Vec::<Doctor>::new);
        let selected_doctor = use_state(|| Option::<Doctor>::None);
        let first_name = use_state(String::new);
        let last_name = use_state(String::new);
        let phone = use_state(String::new);
        let date = use_state(|| Option::<NaiveDate>::None);
        let time = use_state(String::new);
        let terms_accepted = use_state(|| false);
        let available_times = use_state(Vec::<String>::new);
        let questionnaire = use_state(|| Option::<Questionnaire>::None);
        let entry = use_state(OtpEntry::default);
        let auth_open = use_state(|| false);
        let success_open = use_state(|| false);
        let notice = use_state(|| Option::<String>::None);

        use_effect_with((), |_| {
            ensure_page_styles();
            || ()
        });

        // Doctors and the silent token restore, once per page load.
        {
            let doctors = doctors.clone();
            let notice = notice.clone();
            let client = client.clone();
            use_effect_with((), move |_| {
                spawn_local(async move {
                    match client.list_doctors().await {
                        Ok(list) => doctors.set(list),
                        Err(err) => {
                            log_error("doctor fetch failed", &err);
                            notice.set(Some(
                                "Failed to fetch doctors. Please try again.".to_string(),
                            ));
                        }
                    }
                });
                || ()
            });
        }
        {
            let controller = controller.clone();
            use_effect_with((), move |_| {
                if let Some(mut ctrl) = controller.borrow_mut().take() {
                    let controller = controller.clone();
                    spawn_local(async move {
                        ctrl.restore().await;
                        *controller.borrow_mut() = Some(ctrl);
                    });
                }
                || ()
            });
        }
        {
            let questionnaire = questionnaire.clone();
            let notice = notice.clone();
            let client = client.clone();
            let enabled = props.config.questionnaire_enabled;
            let questionnaire_id = props.config.questionnaire_id;
            use_effect_with((), move |_| {
                if enabled {
                    spawn_local(async move {
                        match client.questionnaire(questionnaire_id).await {
                            Ok(fetched) => questionnaire.set(Some(fetched)),
                            Err(err) => {
                                log_error("questionnaire fetch failed", &err);
                                notice.set(Some("Failed to load questionnaire.".to_string()));
                            }
                        }
                    });
                }
                || ()
            });
        }

        // Slots follow the (doctor, date) selection; start and end of the
        // requested range are the same day.
        {
            let available_times = available_times.clone();
            let notice = notice.clone();
            let client = client.clone();
            let deps = (selected_doctor.as_ref().map(|doctor| doctor.id), *date);
            use_effect_with(deps, move |deps: &(Option<i64>, Option<NaiveDate>)| {
                let (doctor_id, date) = *deps;
                if let (Some(doctor_id), Some(date)) = (doctor_id, date) {
                    spawn_local(async move {
                        match client.available_times(doctor_id, date, date).await {
                            Ok(mut slots) => {
                                available_times.set(slots.remove(&date).unwrap_or_default());
                            }
                            Err(err) => {
                                log_error("slot fetch failed", &err);
                                notice.set(Some("Failed to load available times.".to_string()));
                                available_times.set(Vec::new());
                            }
                        }
                    });
                } else {
                    available_times.set(Vec::new());
                }
                || ()
            });
        }

        let on_doctor_change = {
            let doctors = doctors.clone();
            let selected_doctor = selected_doctor.clone();
            let time = time.clone();
            Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                let picked = select
                    .value()
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| doctors.iter().find(|doctor| doctor.id == id).cloned());
                selected_doctor.set(picked);
                time.set(String::new());
            })
        };

        let bind_text = |state: UseStateHandle<String>| {
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                state.set(input.value());
            })
        };
        let on_first_name = bind_text(first_name.clone());
        let on_last_name = bind_text(last_name.clone());
        let on_phone = bind_text(phone.clone());

        let on_date_input = {
            let date = date.clone();
            let time = time.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                date.set(NaiveDate::parse_from_str(&input.value(), "%Y-%m-%d").ok());
                time.set(String::new());
            })
        };

        let on_time_change = {
            let time = time.clone();
            Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                time.set(select.value());
            })
        };

        let on_terms_change = {
            let terms_accepted = terms_accepted.clone();
            Callback::from(move |event: Event| {
                let input: HtmlInputElement = event.target_unchecked_into();
                terms_accepted.set(input.checked());
            })
        };

        let on_questionnaire_change = {
            let questionnaire = questionnaire.clone();
            Callback::from(move |next: Questionnaire| questionnaire.set(Some(next)))
        };

        let on_entry_change = {
            let entry = entry.clone();
            Callback::from(move |next: OtpEntry| entry.set(next))
        };

        let on_submit = {
            let controller = controller.clone();
            let selected_doctor = selected_doctor.clone();
            let first_name = first_name.clone();
            let last_name = last_name.clone();
            let phone = phone.clone();
            let date = date.clone();
            let time = time.clone();
            let terms_accepted = terms_accepted.clone();
            let questionnaire = questionnaire.clone();
            let questionnaire_enabled = props.config.questionnaire_enabled;
            let auth_open = auth_open.clone();
            let success_open = success_open.clone();
            let notice = notice.clone();
            Callback::from(move |_| {
                let Some(mut ctrl) = controller.borrow_mut().take() else {
                    return;
                };
                let form = BookingForm {
                    doctor_id: selected_doctor.as_ref().map(|doctor| doctor.id),
                    first_name: (*first_name).clone(),
                    last_name: (*last_name).clone(),
                    contact_number: (*phone).clone(),
                    date: *date,
                    time: (*time).clone(),
                    terms_accepted: *terms_accepted,
                    questionnaire: if questionnaire_enabled {
                        (*questionnaire).clone()
                    } else {
                        None
                    },
                };
                let controller = controller.clone();
                let auth_open = auth_open.clone();
                let success_open = success_open.clone();
                let notice = notice.clone();
                spawn_local(async move {
                    match ctrl.submit_booking(&form).await {
                        Ok(FlowEvent::Created(_)) => {
                            auth_open.set(false);
                            success_open.set(true);
                            notice.set(Some("Appointment created successfully!".to_string()));
                        }
                        Ok(FlowEvent::OtpChallenge) => {
                            auth_open.set(true);
                            notice.set(Some(format!(
                                "An OTP has been sent to {}.",
                                form.contact_number
                            )));
                        }
                        Ok(_) => {}
                        Err(FlowError::Form(err)) => notice.set(Some(err.to_string())),
                        Err(err) => {
                            log_error("booking failed", &err);
                            notice.set(Some(
                                "Failed to create appointment. Please try again.".to_string(),
                            ));
                        }
                    }
                    *controller.borrow_mut() = Some(ctrl);
                });
            })
        };

        let on_verify = {
            let controller = controller.clone();
            let entry = entry.clone();
            let auth_open = auth_open.clone();
            let success_open = success_open.clone();
            let notice = notice.clone();
            Callback::from(move |_| {
                let Some(mut ctrl) = controller.borrow_mut().take() else {
                    return;
                };
                let code = entry.code();
                let controller = controller.clone();
                let entry = entry.clone();
                let auth_open = auth_open.clone();
                let success_open = success_open.clone();
                let notice = notice.clone();
                spawn_local(async move {
                    match ctrl.submit_otp(&code).await {
                        Ok(FlowEvent::Created(_)) => {
                            entry.set(OtpEntry::default());
                            auth_open.set(false);
                            success_open.set(true);
                            notice.set(Some("OTP verified successfully!".to_string()));
                        }
                        Ok(FlowEvent::OtpRejected) => {
                            entry.set(OtpEntry::default());
                            notice.set(Some(
                                "OTP verification failed. Please try again.".to_string(),
                            ));
                        }
                        Ok(FlowEvent::OtpChallenge) => {
                            entry.set(OtpEntry::default());
                            notice.set(Some(
                                "Your session expired; a new OTP has been sent.".to_string(),
                            ));
                        }
                        Ok(FlowEvent::Authenticated) => auth_open.set(false),
                        Err(err) => {
                            log_error("verification failed", &err);
                            entry.set(OtpEntry::default());
                            notice.set(Some(
                                "OTP verification failed. Please try again.".to_string(),
                            ));
                        }
                    }
                    *controller.borrow_mut() = Some(ctrl);
                });
            })
        };

        let on_auth_close = {
            let auth_open = auth_open.clone();
            let entry = entry.clone();
            Callback::from(move |_| {
                auth_open.set(false);
                entry.set(OtpEntry::default());
            })
        };

        let on_success_close = {
            let success_open = success_open.clone();
            Callback::from(move |_| success_open.set(false))
        };

        let booking_form = match selected_doctor.as_ref() {
            Some(doctor) => html! {
                <>
                    { render_doctor_profile(doctor) }
                    <div class="clinic-field-row">
                        <div class="clinic-field">
                            <label for="first-name">{"First Name"}</label>
                            <input
                                id="first-name"
                                placeholder="Enter your first name"
                                value={(*first_name).clone()}
                                oninput={on_first_name.clone()}
                            />
                        </div>
                        <div class="clinic-field">
                            <label for="last-name">{"Last Name"}</label>
                            <input
                                id="last-name"
                                placeholder="Enter your last name"
                                value={(*last_name).clone()}
                                oninput={on_last_name.clone()}
                            />
                        </div>
                    </div>
                    <div class="clinic-field">
                        <label for="phone">{"Cellphone Number"}</label>
                        <input
                            id="phone"
                            type="tel"
                            placeholder="Enter your cellphone number"
                            value={(*phone).clone()}
                            oninput={on_phone.clone()}
                        />
                    </div>
                    <div class="clinic-field-row">
                        <div class="clinic-field">
                            <label for="appointment-date">{"Appointment Date"}</label>
                            <input id="appointment-date" type="date" oninput={on_date_input.clone()} />
                        </div>
                        <div class="clinic-field">
                            <label for="appointment-time">{"Appointment Time"}</label>
                            <select id="appointment-time" onchange={on_time_change.clone()}>
                                {
                                    if available_times.is_empty() {
                                        html! {
                                            <option value="" disabled=true selected=true>
                                                {"No available times"}
                                            </option>
                                        }
                                    } else {
                                        html! {
                                            <>
                                                <option value="" selected={time.is_empty()}>
                                                    {"Select time"}
                                                </option>
                                                {
                                                    for available_times.iter().map(|slot| {
                                                        let selected = *slot == *time;
                                                        html! {
                                                            <option value={slot.clone()} {selected}>
                                                                { slot.clone() }
                                                            </option>
                                                        }
                                                    })
                                                }
                                            </>
                                        }
                                    }
                                }
                            </select>
                        </div>
                    </div>
                    {
                        match (props.config.questionnaire_enabled, (*questionnaire).clone()) {
                            (true, Some(fetched)) if !fetched.questions.is_empty() => html! {
                                <QuestionnaireForm
                                    questionnaire={fetched}
                                    on_change={on_questionnaire_change.clone()}
                                />
                            },
                            _ => Html::default(),
                        }
                    }
                    <div class="clinic-terms">
                        <input
                            id="terms"
                            type="checkbox"
                            checked={*terms_accepted}
                            onchange={on_terms_change.clone()}
                        />
                        <label for="terms">
                            {"I agree to the terms and conditions and consent to the processing \
                              of my personal information"}
                        </label>
                    </div>
                    <button
                        class="clinic-button block"
                        disabled={!*terms_accepted}
                        onclick={on_submit.clone()}
                    >
                        {"Book Appointment"}
                    </button>
                </>
            },
            None => Html::default(),
        };

        let auth_modal = if *auth_open {
            html! {
                <div class="clinic-modal-backdrop">
                    <div class="clinic-modal">
                        <h2>{"Enter OTP"}</h2>
                        <p class="questionnaire-intro">
                            { format!(
                                "An OTP has been sent to {}. Please enter the 6-digit code below.",
                                *phone
                            ) }
                        </p>
                        <OtpInput entry={(*entry).clone()} on_change={on_entry_change.clone()} />
                        <div class="clinic-modal-actions">
                            <button class="clinic-button secondary" onclick={on_auth_close.clone()}>
                                {"Cancel"}
                            </button>
                            <button
                                class="clinic-button"
                                disabled={!entry.is_complete()}
                                onclick={on_verify.clone()}
                            >
                                {"Verify OTP"}
                            </button>
                        </div>
                    </div>
                </div>
            }
        } else {
            Html::default()
        };

        let success_modal = if *success_open {
            html! {
                <div class="clinic-modal-backdrop">
                    <div class="clinic-modal">
                        <h2>{"Appointment Created"}</h2>
                        <p>
                            {"Your provisional appointment has been created. The doctor will \
                              review and confirm your appointment shortly, please await \
                              confirmation BEFORE attending. You can track the status in the \
                              Manage Appointment section."}
                        </p>
                        <div class="clinic-modal-actions">
                            <button class="clinic-button secondary" onclick={on_success_close.clone()}>
                                {"Close"}
                            </button>
                            <a class="clinic-button" href="/manage-appointment">
                                {"View Appointments"}
                            </a>
                        </div>
                    </div>
                </div>
            }
        } else {
            Html::default()
        };

        html! {
            <div class="clinic-root">
                <h1>{"Book an Appointment"}</h1>
                { notice_banner(&notice) }
                <div class="clinic-field">
                    <label for="doctor">{"Select a Doctor"}</label>
                    <select id="doctor" onchange={on_doctor_change}>
                        <option value="" selected={selected_doctor.is_none()}>
                            {"Choose your doctor"}
                        </option>
                        {
                            for doctors.iter().map(|doctor| {
                                let selected =
                                    selected_doctor.as_ref().map(|d| d.id) == Some(doctor.id);
                                html! {
                                    <option value={doctor.id.to_string()} {selected}>
                                        { doctor.full_name() }
                                    </option>
                                }
                            })
                        }
                    </select>
                </div>
                { booking_form }
                { auth_modal }
                { success_modal }
            </div>
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum ManageStage {
        Checking,
        Login,
        Otp,
        Authenticated,
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum ManageTab {
        Upcoming,
        Previous,
        Cancelled,
    }

    #[function_component(ManagePage)]
    pub fn manage_page(props: &PageProps) -> Html {
        let client = (*use_memo(props.config.clone(), |config| {
            RestClient::from_config(config, LocalStore)
        }))
        .clone();
        let controller: SharedController = {
            let client = client.clone();
            use_mut_ref(move || Some(SessionController::new(client, LocalStore)))
        };

        let stage = use_state(|| ManageStage::Checking);
        let tab = use_state(|| ManageTab::Upcoming);
        let active = use_state(Vec::<Appointment>::new);
        let cancelled = use_state(Vec::<Appointment>::new);
        let phone = use_state(String::new);
        let entry = use_state(OtpEntry::default);
        let cancel_target = use_state(|| Option::<Appointment>::None);
        let notice = use_state(|| Option::<String>::None);

        use_effect_with((), |_| {
            ensure_page_styles();
            || ()
        });

        // Token restore and the initial list fetch. A read failure keeps
        // the page usable with empty lists; only an auth rejection sends
        // the visitor back to login.
        {
            let controller = controller.clone();
            let active = active.clone();
            let cancelled = cancelled.clone();
            let stage = stage.clone();
            let notice = notice.clone();
            use_effect_with((), move |_| {
                if let Some(mut ctrl) = controller.borrow_mut().take() {
                    let controller = controller.clone();
                    spawn_local(async move {
                        if ctrl.restore().await {
                            match ctrl.fetch_appointments().await {
                                Ok((fetched_active, fetched_cancelled)) => {
                                    active.set(fetched_active);
                                    cancelled.set(fetched_cancelled);
                                    stage.set(ManageStage::Authenticated);
                                }
                                Err(FlowError::Api(ApiError::Unauthorized)) => {
                                    stage.set(ManageStage::Login);
                                }
                                Err(err) => {
                                    log_error("appointment fetch failed", &err);
                                    notice.set(Some("Failed to fetch appointments.".to_string()));
                                    active.set(Vec::new());
                                    cancelled.set(Vec::new());
                                    stage.set(ManageStage::Authenticated);
                                }
                            }
                        } else {
                            stage.set(ManageStage::Login);
                        }
                        *controller.borrow_mut() = Some(ctrl);
                    });
                }
                || ()
            });
        }

        let on_phone_input = {
            let phone = phone.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                phone.set(input.value());
            })
        };

        let on_entry_change = {
            let entry = entry.clone();
            Callback::from(move |next: OtpEntry| entry.set(next))
        };

        let on_send_otp = {
            let controller = controller.clone();
            let phone = phone.clone();
            let stage = stage.clone();
            let notice = notice.clone();
            Callback::from(move |_| {
                let Some(mut ctrl) = controller.borrow_mut().take() else {
                    return;
                };
                let phone_value = (*phone).clone();
                let controller = controller.clone();
                let stage = stage.clone();
                let notice = notice.clone();
                spawn_local(async move {
                    match ctrl.begin_login(&phone_value).await {
                        Ok(_) => {
                            stage.set(ManageStage::Otp);
                            notice.set(Some("OTP sent successfully.".to_string()));
                        }
                        Err(FlowError::Api(ApiError::PhoneNotRegistered)) => {
                            notice.set(Some(
                                "This phone number is not registered in our system.".to_string(),
                            ));
                        }
                        Err(err) => {
                            log_error("OTP request failed", &err);
                            notice.set(Some("Failed to send OTP. Please try again.".to_string()));
                        }
                    }
                    *controller.borrow_mut() = Some(ctrl);
                });
            })
        };

        let on_verify = {
            let controller = controller.clone();
            let entry = entry.clone();
            let active = active.clone();
            let cancelled = cancelled.clone();
            let stage = stage.clone();
            let notice = notice.clone();
            Callback::from(move |_| {
                let Some(mut ctrl) = controller.borrow_mut().take() else {
                    return;
                };
                let code = entry.code();
                let controller = controller.clone();
                let entry = entry.clone();
                let active = active.clone();
                let cancelled = cancelled.clone();
                let stage = stage.clone();
                let notice = notice.clone();
                spawn_local(async move {
                    match ctrl.submit_otp(&code).await {
                        Ok(FlowEvent::Authenticated) => {
                            entry.set(OtpEntry::default());
                            notice.set(Some(
                                "OTP verified and authenticated successfully.".to_string(),
                            ));
                            match ctrl.fetch_appointments().await {
                                Ok((fetched_active, fetched_cancelled)) => {
                                    active.set(fetched_active);
                                    cancelled.set(fetched_cancelled);
                                }
                                Err(err) => {
                                    log_error("appointment fetch failed", &err);
                                    notice.set(Some("Failed to fetch appointments.".to_string()));
                                    active.set(Vec::new());
                                    cancelled.set(Vec::new());
                                }
                            }
                            stage.set(ManageStage::Authenticated);
                        }
                        Ok(FlowEvent::OtpRejected) => {
                            entry.set(OtpEntry::default());
                            notice.set(Some(
                                "OTP verification failed. Please try again.".to_string(),
                            ));
                        }
                        Ok(_) => {}
                        Err(err) => {
                            log_error("verification failed", &err);
                            entry.set(OtpEntry::default());
                            notice.set(Some(
                                "OTP verification failed. Please try again.".to_string(),
                            ));
                        }
                    }
                    *controller.borrow_mut() = Some(ctrl);
                });
            })
        };

        let on_logout = {
            let controller = controller.clone();
            let active = active.clone();
            let cancelled = cancelled.clone();
            let stage = stage.clone();
            let notice = notice.clone();
            Callback::from(move |_| {
                if let Some(ctrl) = controller.borrow_mut().as_mut() {
                    ctrl.logout();
                } else {
                    LocalStore.clear();
                }
                active.set(Vec::new());
                cancelled.set(Vec::new());
                stage.set(ManageStage::Login);
                notice.set(Some("Logged out successfully.".to_string()));
            })
        };

        let on_cancel_request = {
            let cancel_target = cancel_target.clone();
            Callback::from(move |appointment: Appointment| cancel_target.set(Some(appointment)))
        };

        let on_cancel_dismiss = {
            let cancel_target = cancel_target.clone();
            Callback::from(move |_| cancel_target.set(None))
        };

        let on_cancel_confirm = {
            let controller = controller.clone();
            let cancel_target = cancel_target.clone();
            let active = active.clone();
            let cancelled = cancelled.clone();
            let stage = stage.clone();
            let notice = notice.clone();
            Callback::from(move |_| {
                let Some(appointment) = (*cancel_target).clone() else {
                    return;
                };
                let Some(mut ctrl) = controller.borrow_mut().take() else {
                    return;
                };
                let controller = controller.clone();
                let cancel_target = cancel_target.clone();
                let active = active.clone();
                let cancelled = cancelled.clone();
                let stage = stage.clone();
                let notice = notice.clone();
                spawn_local(async move {
                    match ctrl.cancel_appointment(appointment.id).await {
                        Ok(()) => {
                            // Move the row locally; no re-fetch.
                            let mut next_active = (*active).clone();
                            let mut next_cancelled = (*cancelled).clone();
                            apply_cancellation(&mut next_active, &mut next_cancelled, appointment.id);
                            active.set(next_active);
                            cancelled.set(next_cancelled);
                            notice.set(Some("Appointment cancelled successfully.".to_string()));
                        }
                        Err(FlowError::Api(ApiError::Unauthorized)) => {
                            stage.set(ManageStage::Login);
                            notice.set(Some(
                                "Authentication failed. Please log in again.".to_string(),
                            ));
                        }
                        Err(err) => {
                            log_error("cancellation failed", &err);
                            notice.set(Some(
                                "Failed to cancel appointment. Please try again.".to_string(),
                            ));
                        }
                    }
                    cancel_target.set(None);
                    *controller.borrow_mut() = Some(ctrl);
                });
            })
        };

        let tab_button = |value: ManageTab, label: &str| {
            let is_active = *tab == value;
            let onclick = {
                let tab = tab.clone();
                Callback::from(move |_| tab.set(value))
            };
            html! {
                <button
                    class={classes!("clinic-tab", is_active.then_some("is-active"))}
                    {onclick}
                >
                    { label.to_string() }
                </button>
            }
        };

        // Partitioned at render time so the boundary between upcoming and
        // previous tracks the wall clock, not the fetch instant.
        let buckets = partition_appointments(&active, Local::now().naive_local());

        let body = match *stage {
            ManageStage::Checking => html! { <p class="clinic-empty">{"Loading..."}</p> },
            ManageStage::Login => html! {
                <section class="clinic-card">
                    <h2>{"Login"}</h2>
                    <div class="clinic-field">
                        <label for="manage-phone">{"Phone Number"}</label>
                        <input
                            id="manage-phone"
                            type="tel"
                            placeholder="Enter phone number"
                            value={(*phone).clone()}
                            oninput={on_phone_input.clone()}
                        />
                    </div>
                    <button
                        class="clinic-button"
                        disabled={phone.len() < 10}
                        onclick={on_send_otp.clone()}
                    >
                        {"Send OTP"}
                    </button>
                </section>
            },
            ManageStage::Otp => html! {
                <section class="clinic-card">
                    <h2>{"Enter OTP"}</h2>
                    <p class="questionnaire-intro">
                        { format!(
                            "An OTP has been sent to {}. Please enter the 6-digit OTP below.",
                            *phone
                        ) }
                    </p>
                    <OtpInput entry={(*entry).clone()} on_change={on_entry_change.clone()} />
                    <div class="clinic-modal-actions">
                        <button class="clinic-button secondary" onclick={on_send_otp.clone()}>
                            {"Resend OTP"}
                        </button>
                        <button
                            class="clinic-button"
                            disabled={!entry.is_complete()}
                            onclick={on_verify.clone()}
                        >
                            {"Verify OTP"}
                        </button>
                    </div>
                </section>
            },
            ManageStage::Authenticated => html! {
                <>
                    <button class="clinic-button secondary" onclick={on_logout.clone()}>
                        {"Logout"}
                    </button>
                    <div class="clinic-tabs">
                        { tab_button(ManageTab::Upcoming, "Upcoming") }
                        { tab_button(ManageTab::Previous, "Previous") }
                        { tab_button(ManageTab::Cancelled, "Cancelled") }
                    </div>
                    {
                        match *tab {
                            ManageTab::Upcoming => html! {
                                <section class="clinic-card">
                                    <h2>{"Upcoming Appointments"}</h2>
                                    { appointment_table(&buckets.upcoming, Some(on_cancel_request.clone())) }
                                </section>
                            },
                            ManageTab::Previous => html! {
                                <section class="clinic-card">
                                    <h2>{"Previous Appointments"}</h2>
                                    { appointment_table(&buckets.previous, None) }
                                </section>
                            },
                            ManageTab::Cancelled => html! {
                                <section class="clinic-card">
                                    <h2>{"Cancelled Appointments"}</h2>
                                    { appointment_table(&cancelled, None) }
                                </section>
                            },
                        }
                    }
                </>
            },
        };

        let cancel_modal = match cancel_target.as_ref() {
            Some(appointment) => html! {
                <div class="clinic-modal-backdrop">
                    <div class="clinic-modal">
                        <p>
                            { format!(
                                "Are you sure you want to cancel appointment #{}?",
                                appointment.id
                            ) }
                        </p>
                        <div class="clinic-modal-actions">
                            <button class="clinic-button secondary" onclick={on_cancel_dismiss.clone()}>
                                {"No"}
                            </button>
                            <button class="clinic-button danger" onclick={on_cancel_confirm.clone()}>
                                {"Yes, Cancel"}
                            </button>
                        </div>
                    </div>
                </div>
            },
            None => Html::default(),
        };

        html! {
            <div class="clinic-root">
                <h1>{"Manage Appointments"}</h1>
                { notice_banner(&notice) }
                { body }
                { cancel_modal }
            </div>
        }
    }

    /// Partial config override handed in from JavaScript; absent fields
    /// keep their defaults.
    #[derive(Deserialize)]
    struct JsClinicConfig {
        #[serde(default)]
        api_base_url: Option<String>,
        #[serde(default)]
        questionnaire_enabled: Option<bool>,
        #[serde(default)]
        questionnaire_id: Option<i64>,
    }

    impl From<JsClinicConfig> for ClinicConfig {
        fn from(cfg: JsClinicConfig) -> Self {
            let mut base = ClinicConfig::default();
            if let Some(api_base_url) = cfg.api_base_url {
                base.api_base_url = api_base_url;
            }
            if let Some(enabled) = cfg.questionnaire_enabled {
                base.questionnaire_enabled = enabled;
            }
            if let Some(id) = cfg.questionnaire_id {
                base.questionnaire_id = id;
            }
            base
        }
    }

    fn resolve_config(config: Option<JsValue>) -> Result<ClinicConfig, JsValue> {
        match config {
            Some(js_cfg) => {
                let cfg: JsClinicConfig = from_value(js_cfg)
                    .map_err(|err| JsValue::from_str(&format!("Unreadable config: {err}")))?;
                Ok(ClinicConfig::from(cfg))
            }
            None => Ok(ClinicConfig::default()),
        }
    }

    fn mount_target(selector: &str) -> Result<Element, JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("bad selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("no element matches the selector"))
    }

    #[wasm_bindgen]
    pub fn mount_booking_page(selector: &str, config: Option<JsValue>) -> Result<(), JsValue> {
        let target = mount_target(selector)?;
        let config = resolve_config(config)?;
        yew::Renderer::<BookingPage>::with_root_and_props(target, PageProps { config }).render();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn mount_manage_page(selector: &str, config: Option<JsValue>) -> Result<(), JsValue> {
        let target = mount_target(selector)?;
        let config = resolve_config(config)?;
        yew::Renderer::<ManagePage>::with_root_and_props(target, PageProps { config }).render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::{mount_booking_page, mount_manage_page};

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_booking_page(
    _: &str,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "clinic-ui only supports the wasm32 target",
    ))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_manage_page(
    _: &str,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "clinic-ui only supports the wasm32 target",
    ))
}
