use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use clinic_api::{
    ApiError, Backend, FlowError, FlowEvent, RestClient, SessionController, SessionStore,
};
use clinic_core::{Appointment, AppointmentTabs, BookingForm, StoredSession};

#[derive(Parser, Debug)]
#[command(
    name = "clinic-cli",
    about = "Terminal client for the practice booking backend."
)]
struct Args {
    /// Backend base URL.
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,
    /// Where the session token is kept between runs.
    #[arg(long, default_value = ".clinic-session.json")]
    session: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the practice's active doctors.
    Doctors,
    /// Show open slots for a doctor on a date.
    Slots {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Book an appointment, proving identity by OTP when needed.
    Book {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        phone: String,
        /// Accept the practice terms and conditions.
        #[arg(long)]
        accept_terms: bool,
    },
    /// Log in with a registered phone number.
    Login {
        #[arg(long)]
        phone: String,
    },
    /// List upcoming, previous and cancelled appointments.
    List,
    /// Cancel an appointment after explicit confirmation.
    Cancel {
        #[arg(long)]
        id: i64,
        /// Skip the interactive confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Drop the stored session.
    Logout,
}

/// Session persisted as a small JSON file next to the invocation.
#[derive(Clone)]
struct FileStore {
    path: PathBuf,
}

impl SessionStore for FileStore {
    fn load(&self) -> Option<StoredSession> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn save(&self, session: &StoredSession) {
        if let Ok(data) = serde_json::to_string_pretty(session) {
            if let Err(err) = std::fs::write(&self.path, data) {
                tracing::warn!(error = %err, "could not persist session");
            }
        }
    }

    fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush().context("could not flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("could not read from stdin")?;
    Ok(line)
}

fn print_rows(appointments: &[Appointment]) {
    if appointments.is_empty() {
        println!("  (none)");
        return;
    }
    for appointment in appointments {
        println!(
            "  #{:<5} {} {}  {:<24} {}",
            appointment.id,
            appointment.date,
            appointment.time,
            appointment.doctor.display_name(),
            appointment.status.as_code()
        );
    }
}

fn print_tabs(tabs: &AppointmentTabs) {
    println!("Upcoming:");
    print_rows(&tabs.upcoming);
    println!("Previous:");
    print_rows(&tabs.previous);
    println!("Cancelled:");
    print_rows(&tabs.cancelled);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = FileStore {
        path: args.session.clone(),
    };
    let client = RestClient::new(&args.base_url, store.clone());
    let mut controller = SessionController::new(client.clone(), store);

    match args.command {
        Command::Doctors => {
            let doctors = client
                .list_doctors()
                .await
                .context("could not fetch the doctor list")?;
            if doctors.is_empty() {
                println!("No active doctors.");
            }
            for doctor in doctors {
                println!(
                    "#{:<4} {:<28} {}",
                    doctor.id,
                    doctor.full_name(),
                    doctor.pricing.unwrap_or_default()
                );
            }
        }
        Command::Slots { doctor, date } => {
            let slots = client
                .available_times(doctor, date, date)
                .await
                .context("could not fetch available slots")?;
            let times = slots.get(&date).cloned().unwrap_or_default();
            if times.is_empty() {
                println!("No available times on {date}.");
            } else {
                println!("{date}: {}", times.join(", "));
            }
        }
        Command::Book {
            doctor,
            date,
            time,
            first_name,
            last_name,
            phone,
            accept_terms,
        } => {
            let form = BookingForm {
                doctor_id: Some(doctor),
                first_name,
                last_name,
                contact_number: phone,
                date: Some(date),
                time,
                terms_accepted: accept_terms,
                questionnaire: None,
            };
            let mut event = controller.submit_booking(&form).await?;
            loop {
                match event {
                    FlowEvent::Created(appointment) => {
                        println!(
                            "Appointment #{} created for {} {} ({}).",
                            appointment.id,
                            appointment.date,
                            appointment.time,
                            appointment.status.as_code()
                        );
                        println!(
                            "The doctor will review and confirm it; please await confirmation \
                             before attending."
                        );
                        break;
                    }
                    FlowEvent::OtpChallenge => {
                        let code = prompt("Enter the 6-digit OTP sent to your phone: ")?;
                        event = controller.submit_otp(code.trim()).await?;
                    }
                    FlowEvent::OtpRejected => {
                        println!("That code was not accepted, try again.");
                        let code = prompt("Enter the 6-digit OTP sent to your phone: ")?;
                        event = controller.submit_otp(code.trim()).await?;
                    }
                    FlowEvent::Authenticated => break,
                }
            }
        }
        Command::Login { phone } => {
            match controller.begin_login(&phone).await {
                Err(FlowError::Api(ApiError::PhoneNotRegistered)) => {
                    anyhow::bail!("this phone number is not registered with the practice");
                }
                other => {
                    other?;
                }
            }
            loop {
                let code = prompt("Enter the 6-digit OTP sent to your phone: ")?;
                match controller.submit_otp(code.trim()).await? {
                    FlowEvent::Authenticated => {
                        println!("Logged in.");
                        break;
                    }
                    FlowEvent::OtpRejected => {
                        println!("That code was not accepted, try again.");
                    }
                    _ => break,
                }
            }
        }
        Command::List => {
            if !controller.restore().await {
                anyhow::bail!("no valid session; run `clinic-cli login` first");
            }
            let tabs = controller
                .load_appointments(Local::now().naive_local())
                .await
                .context("could not fetch appointments")?;
            print_tabs(&tabs);
        }
        Command::Cancel { id, yes } => {
            if !controller.restore().await {
                anyhow::bail!("no valid session; run `clinic-cli login` first");
            }
            if !yes {
                let answer = prompt(&format!("Cancel appointment #{id}? [y/N] "))?;
                if !matches!(answer.trim(), "y" | "Y" | "yes") {
                    println!("Left unchanged.");
                    return Ok(());
                }
            }
            controller
                .cancel_appointment(id)
                .await
                .context("cancellation failed")?;
            println!("Appointment #{id} cancelled.");
        }
        Command::Logout => {
            controller.logout();
            println!("Session cleared.");
        }
    }

    Ok(())
}
