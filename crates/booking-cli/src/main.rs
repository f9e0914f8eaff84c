//! `slotbook` CLI — generate slots, check bookability, and talk to the
//! bookings API from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Business-day slots (offline)
//! slotbook slots --date 2026-03-16 --start 09:00 --end 12:00
//!
//! # Would 10:00-10:15 be bookable against these atomic slots? (offline)
//! slotbook check --start 10:00 --end 10:15 --slots "10:00-10:15,10:15-10:30"
//!
//! # Reconcile a counsellor's day against the API
//! slotbook --base-url http://localhost:3000/api availability --user u-1 --date 2026-03-16
//!
//! # Book and cancel
//! slotbook book --user u-1 --date 2026-03-16 --start 10:00 --end 10:15 \
//!     --tenant t-1 --lead l-9 --created-by agent-7 --note "prefers evenings"
//! slotbook cancel --id bk-123 --lead l-9 --date 2026-03-16
//! ```
//!
//! Configuration comes from `--config` (TOML), then `SLOTBOOK_*` environment
//! variables, then `--base-url`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use booking_engine::{
    BookingContext, BookingEngine, BookingError, EngineConfig, HttpBackend, NoteOutcome, Severity,
};
use clap::{ArgAction, Parser, Subcommand};
use slot_engine::{
    generate_slots, is_bookable, parse_date, parse_time_of_day, Interval, DEFAULT_GRANULARITY,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slotbook",
    version,
    about = "Appointment slot generation, availability lookup and booking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root URL of the bookings API (overrides config and environment)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fixed-granularity slots for a business day
    Slots {
        /// Day, as YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "09:00")]
        start: String,
        #[arg(long, default_value = "18:00")]
        end: String,
        /// Slot length in minutes
        #[arg(long, default_value_t = DEFAULT_GRANULARITY)]
        granularity: u16,
        /// Print slots as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether an interval fits inside one of the given atomic slots
    Check {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Comma-separated HH:MM-HH:MM intervals
        #[arg(long)]
        slots: String,
    },
    /// Fetch and reconcile a user's availability for a day
    Availability {
        #[arg(long)]
        user: String,
        #[arg(long)]
        date: String,
        /// Lead whose bookings to overlay
        #[arg(long)]
        lead: Option<String>,
        /// IANA timezone (defaults to the configured one)
        #[arg(long)]
        timezone: Option<String>,
        /// Print the reconciled state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Book an interval
    Book {
        /// Counsellor whose calendar is booked
        #[arg(long)]
        user: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        lead: Option<String>,
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        created_by: Option<String>,
        #[arg(long)]
        assigned_user: Option<String>,
        #[arg(long)]
        user_name: Option<String>,
        #[arg(long)]
        user_email: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
        /// Note to attach to the lead after booking
        #[arg(long)]
        note: Option<String>,
    },
    /// Cancel a booking by id
    Cancel {
        #[arg(long)]
        id: String,
        /// Day of the booking
        #[arg(long)]
        date: String,
        #[arg(long)]
        lead: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Slots {
            date,
            start,
            end,
            granularity,
            json,
        } => {
            if granularity == 0 {
                bail!("Granularity must be a positive number of minutes");
            }
            let date = parse_date(&date)?;
            let start = parse_time_of_day(&start).context("Invalid --start")?;
            let end = parse_time_of_day(&end).context("Invalid --end")?;
            let slots = generate_slots(date, start, end, granularity);
            if json {
                println!("{}", serde_json::to_string_pretty(&slots)?);
            } else {
                for slot in &slots {
                    println!("{}  {}", slot.id, slot.interval);
                }
            }
        }
        Commands::Check { start, end, slots } => {
            let candidate = Interval::from_wall_clock(&start, &end)
                .context("Invalid candidate interval")?;
            let atomic = parse_interval_list(&slots)?;
            if is_bookable(&candidate, &atomic) {
                println!("bookable");
            } else {
                println!("not bookable");
            }
        }
        Commands::Availability {
            user,
            date,
            lead,
            timezone,
            json,
        } => {
            let engine = connect(cli.config.as_ref(), cli.base_url)?;
            let mut context = BookingContext::for_user(
                user,
                parse_date(&date)?,
                timezone.unwrap_or_else(|| engine.config().timezone.clone()),
            );
            context.lead_id = lead.unwrap_or_default();

            if let Err(err) = engine.load(&context).await {
                // Bookings may fail on their own; availability is what matters here.
                if engine.state().window.is_none() {
                    return Err(explain(err));
                }
                eprintln!("warning: {err}");
            }
            let state = engine.state();
            if json {
                let summary = serde_json::json!({
                    "atomicSlots": state.atomic_slots.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "bookedIntervals": state.booked_intervals.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "bookings": state.bookings,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Available ({}):", state.atomic_slots.len());
                for interval in &state.atomic_slots {
                    println!("  {interval}");
                }
                println!("Booked ({}):", state.booked_intervals.len());
                for interval in &state.booked_intervals {
                    println!("  {interval}");
                }
            }
        }
        Commands::Book {
            user,
            date,
            start,
            end,
            tenant,
            lead,
            student,
            created_by,
            assigned_user,
            user_name,
            user_email,
            timezone,
            note,
        } => {
            let engine = connect(cli.config.as_ref(), cli.base_url)?;
            let context = BookingContext {
                tenant_id: tenant,
                created_by: created_by.unwrap_or_default(),
                assigned_user_id: assigned_user.unwrap_or_default(),
                lead_id: lead.unwrap_or_default(),
                student_id: student.unwrap_or_default(),
                user_id: user,
                user_name,
                user_email,
                date: parse_date(&date)?,
                timezone: timezone.unwrap_or_else(|| engine.config().timezone.clone()),
            };
            let candidate =
                Interval::from_wall_clock(&start, &end).context("Invalid booking interval")?;

            if let Err(err) = engine.load(&context).await {
                debug!(error = %err, "initial load incomplete");
            }
            let receipt = engine
                .book(&context, candidate, note.as_deref())
                .await
                .map_err(explain)?;

            println!(
                "Booked {} on {} (id: {}, scheduledAt: {})",
                receipt.interval,
                context.date,
                receipt.booking_id.as_deref().unwrap_or("unknown"),
                receipt.scheduled_at
            );
            if let NoteOutcome::Failed(reason) = receipt.note {
                eprintln!("warning: booking saved but the note was not: {reason}");
            }
        }
        Commands::Cancel {
            id,
            date,
            lead,
            user,
        } => {
            let engine = connect(cli.config.as_ref(), cli.base_url)?;
            let mut context = BookingContext::for_user(
                user.unwrap_or_default(),
                parse_date(&date)?,
                engine.config().timezone.clone(),
            );
            context.lead_id = lead.unwrap_or_default();
            engine.cancel(&id, &context).await.map_err(explain)?;
            println!("Cancelled {id}");
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the engine from `--config`, the environment, then `--base-url`.
fn connect(
    config_path: Option<&PathBuf>,
    base_url: Option<String>,
) -> Result<BookingEngine<HttpBackend>> {
    let mut config = match config_path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .apply_env();
    if let Some(url) = base_url {
        config.base_url = url;
    }
    let backend = HttpBackend::new(&config).context("Failed to build HTTP client")?;
    BookingEngine::new(backend, config).context("Invalid configuration")
}

/// Parse `"09:00-09:15,09:15-09:30"`.
fn parse_interval_list(raw: &str) -> Result<Vec<Interval>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let Some((start, end)) = part.split_once('-') else {
                bail!("Expected HH:MM-HH:MM, got '{part}'");
            };
            Interval::from_wall_clock(start.trim(), end.trim())
                .with_context(|| format!("Invalid slot '{part}'"))
        })
        .collect()
}

/// Attach a hint for recoverable failures.
fn explain(err: BookingError) -> anyhow::Error {
    match err.severity() {
        Severity::Warning if err.is_conflict() => {
            anyhow::Error::new(err).context("That time is no longer available; pick another slot")
        }
        Severity::Warning => anyhow::Error::new(err).context("Booking not submitted"),
        Severity::Error => anyhow::Error::new(err),
    }
}
