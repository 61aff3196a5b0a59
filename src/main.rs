//! partyfinder command line entry point.
//!
//! Loads configuration, restores the saved session, and runs one
//! subcommand against the backend.

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use partyfinder::app_state::AppState;
use partyfinder::config::{ClientConfig, LogFormat};
use partyfinder::domain::{
    CheckInOutcome, Coordinates, DecoratedEvent, EventDraft, EventId, HostType, LoginCredentials,
    MediaId, MediaUpload, RegisterCredentials, SessionEvent, Visibility,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PARTYFINDER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PARTYFINDER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Forget the saved session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List live events visible to you.
    Events {
        #[command(flatten)]
        at: Position,
        #[arg(long)]
        json: bool,
    },
    /// List ended events you hosted or attended.
    Archived {
        #[arg(long)]
        json: bool,
    },
    /// Create an event.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// RFC 3339 start time, e.g. 2026-03-01T21:00:00Z.
        #[arg(long)]
        start: DateTime<Utc>,
        #[command(flatten)]
        fields: DraftFields,
    },
    /// Edit an event you host.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[command(flatten)]
        fields: DraftFields,
    },
    /// End an event you host.
    End { id: String },
    /// Delete an event you host.
    Delete { id: String },
    /// Check in to a live event.
    CheckIn {
        id: String,
        #[command(flatten)]
        at: Position,
    },
    /// List events you checked in to.
    CheckIns,
    /// Browse or manage an ended event's gallery.
    Media {
        #[command(subcommand)]
        cmd: MediaCmd,
    },
    /// List your friends.
    Friends,
    /// Show or change preferences.
    Settings {
        #[command(subcommand)]
        cmd: SettingsCmd,
    },
    /// Keep the live list refreshed until Ctrl-C.
    Watch {
        #[command(flatten)]
        at: Position,
    },
}

#[derive(Subcommand)]
enum MediaCmd {
    /// List media and your permissions.
    List { event_id: String },
    /// Upload a photo or video.
    Upload { event_id: String, path: PathBuf },
    /// Delete a media item (host only).
    Delete { event_id: String, media_id: String },
}

#[derive(Subcommand)]
enum SettingsCmd {
    /// Print current settings.
    Show,
    /// Change one setting, e.g. `distance-unit km`.
    Set { key: String, value: String },
}

#[derive(clap::Args)]
struct Position {
    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lng: Option<f64>,
}

impl Position {
    fn coords(&self) -> anyhow::Result<Option<Coordinates>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(Some(Coordinates::new(lat, lng)?)),
            _ => Ok(None),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum HostArg {
    Fraternity,
    House,
    Club,
}

impl From<HostArg> for HostType {
    fn from(h: HostArg) -> Self {
        match h {
            HostArg::Fraternity => Self::Fraternity,
            HostArg::House => Self::House,
            HostArg::Club => Self::Club,
        }
    }
}

#[derive(clap::Args)]
struct DraftFields {
    #[arg(long)]
    end: Option<DateTime<Utc>>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_enum)]
    host_type: Option<HostArg>,
    #[arg(long)]
    theme: Option<String>,
    #[arg(long)]
    music: Option<String>,
    #[arg(long)]
    cover: Option<String>,
    #[arg(long)]
    byob: Option<bool>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    friends_only: Option<bool>,
}

impl DraftFields {
    fn apply(self, draft: &mut EventDraft) {
        if let Some(end) = self.end {
            draft.end_time = Some(end);
        }
        if let Some(description) = self.description {
            draft.description = Some(description);
        }
        if let Some(host) = self.host_type {
            draft.host_type = host.into();
        }
        if let Some(theme) = self.theme {
            draft.theme = Some(theme);
        }
        if let Some(music) = self.music {
            draft.music_type = Some(music);
        }
        if let Some(cover) = self.cover {
            draft.cover_charge = Some(cover);
        }
        if let Some(byob) = self.byob {
            draft.is_byob = byob;
        }
        if !self.tags.is_empty() {
            draft.tags = self.tags;
        }
        if let Some(friends_only) = self.friends_only {
            draft.visibility = if friends_only {
                Visibility::Friends
            } else {
                Visibility::Everyone
            };
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    init_tracing(config.log_format);

    let state = AppState::build(config)
        .await
        .context("failed to open local store")?;
    if let Some(user) = state.restore().await? {
        tracing::debug!(user_id = %user.user_id, "using saved session");
    }

    run(&state, cli.cmd).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(state: &AppState, cmd: Cmd) -> anyhow::Result<()> {
    match cmd {
        Cmd::Login { email, password } => {
            let user = state
                .session
                .login(&LoginCredentials { email, password })
                .await?;
            println!("signed in as {}", user.display_name.unwrap_or(user.email));
        }
        Cmd::Register {
            email,
            password,
            display_name,
        } => {
            let user = state
                .session
                .register(&RegisterCredentials {
                    email,
                    password,
                    display_name,
                })
                .await?;
            println!("welcome, {}", user.display_name.unwrap_or(user.email));
        }
        Cmd::Logout => {
            state.logout().await?;
            println!("signed out");
        }
        Cmd::Whoami => match state.session.current_user().await {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("not signed in"),
        },
        Cmd::Events { at, json } => {
            if state.session.token().await.is_some()
                && let Err(err) = state.friends.refresh().await
            {
                tracing::warn!(error = %err, "friends unavailable, friends-only events hidden");
            }
            state.events.refresh().await?;
            let viewer = state.events.viewer(at.coords()?).await;
            let live = state.events.live(&viewer).await;
            print_events(state, &live, json).await?;
        }
        Cmd::Archived { json } => {
            let set = state.events.refresh_archived().await?;
            print_events(state, &set.events, json).await?;
        }
        Cmd::Create {
            title,
            lat,
            lng,
            start,
            fields,
        } => {
            let mut draft = EventDraft::new(title, Coordinates::new(lat, lng)?, start);
            fields.apply(&mut draft);
            let event = state.events.create(draft).await?;
            println!("created {} ({})", event.title, event.id);
        }
        Cmd::Update {
            id,
            title,
            lat,
            lng,
            start,
            fields,
        } => {
            let id = EventId::new(id);
            let existing = state.events.resolve(&id).await?;
            let mut draft = EventDraft::from_event(&existing);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(lat) = lat {
                draft.location_lat = lat;
            }
            if let Some(lng) = lng {
                draft.location_lng = lng;
            }
            if let Some(start) = start {
                draft.start_time = start;
            }
            fields.apply(&mut draft);
            let event = state.events.update(&id, draft).await?;
            println!("updated {} ({})", event.title, event.id);
        }
        Cmd::End { id } => {
            state.events.end(&EventId::new(id)).await?;
            println!("event ended; it now appears under archived");
        }
        Cmd::Delete { id } => {
            state.events.delete(&EventId::new(id)).await?;
            println!("event deleted");
        }
        Cmd::CheckIn { id, at } => {
            if state.session.token().await.is_some()
                && let Err(err) = state.check_ins.load_check_ins().await
            {
                tracing::warn!(error = %err, "could not load existing check-ins");
            }
            let outcome = state
                .check_ins
                .check_in_by_id(&EventId::new(id), at.coords()?)
                .await?;
            match outcome {
                CheckInOutcome::CheckedIn => println!("checked in"),
                CheckInOutcome::AlreadyCheckedIn => println!("already checked in"),
                CheckInOutcome::InFlight => println!("check-in already in progress"),
            }
        }
        Cmd::CheckIns => {
            let mut ids: Vec<EventId> = state.check_ins.load_check_ins().await?.into_iter().collect();
            ids.sort();
            for id in ids {
                println!("{id}");
            }
        }
        Cmd::Media { cmd } => run_media(state, cmd).await?,
        Cmd::Friends => {
            for friend in state.friends.refresh().await? {
                println!(
                    "{}\t{}",
                    friend.user_id,
                    friend.display_name.unwrap_or(friend.email)
                );
            }
        }
        Cmd::Settings { cmd } => {
            let settings = match cmd {
                SettingsCmd::Show => state.settings.get().await,
                SettingsCmd::Set { key, value } => state.settings.set(&key, &value).await?,
            };
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Cmd::Watch { at } => watch_events(state, at.coords()?).await?,
    }
    Ok(())
}

async fn run_media(state: &AppState, cmd: MediaCmd) -> anyhow::Result<()> {
    if state.session.token().await.is_some()
        && let Err(err) = state.events.refresh_archived().await
    {
        tracing::warn!(error = %err, "archived list unavailable");
    }
    match cmd {
        MediaCmd::List { event_id } => {
            let event = state.events.resolve(&EventId::new(event_id)).await?;
            let gallery = state.media.open_gallery(&event).await?;
            println!(
                "attendance: {:?}  view: {}  contribute: {}  delete: {}",
                gallery.attendance,
                gallery.permissions.can_view,
                gallery.permissions.can_contribute,
                gallery.permissions.can_delete
            );
            for item in gallery.media {
                println!("{}\t{:?}\t{}", item.media_id, item.media_type, item.media_url);
            }
        }
        MediaCmd::Upload { event_id, path } => {
            let event = state.events.resolve(&EventId::new(event_id)).await?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("cannot read {}", path.display()))?;
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                bail!("invalid file name: {}", path.display());
            };
            state
                .media
                .upload(&event, MediaUpload::new(file_name, bytes))
                .await?;
            println!("media uploaded");
        }
        MediaCmd::Delete { event_id, media_id } => {
            let event = state.events.resolve(&EventId::new(event_id)).await?;
            state.media.delete(&event, &MediaId::new(media_id)).await?;
            println!("media deleted");
        }
    }
    Ok(())
}

async fn print_events(
    state: &AppState,
    events: &[DecoratedEvent],
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let list: Vec<_> = events.iter().map(|d| &d.event).collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }
    let settings = state.settings.get().await;
    let checked_in = state.check_ins.checked_in_ids().await;
    for decorated in events {
        let event = &decorated.event;
        let distance = decorated
            .distance_label(settings.distance_unit)
            .filter(|_| settings.show_distance_labels)
            .map(|d| format!("  {d}"))
            .unwrap_or_default();
        let mark = if checked_in.contains(&event.id) { "  ✓" } else { "" };
        println!(
            "{}\t{}\t{}{distance}{mark}",
            event.id,
            event.start_time.format("%Y-%m-%d %H:%M"),
            event.title
        );
    }
    Ok(())
}

async fn watch_events(state: &AppState, coords: Option<Coordinates>) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut bus_rx = state.event_bus.subscribe();
    let task = state.start_auto_refresh(shutdown_rx);

    let _ = state.event_bus.publish(SessionEvent::EventsInvalidated {
        timestamp: Utc::now(),
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = bus_rx.recv() => {
                match event {
                    Ok(SessionEvent::EventsRefreshed { .. }) => {
                        let viewer = state.events.viewer(coords).await;
                        let live = state.events.live(&viewer).await;
                        println!("--- {} live events ---", live.len());
                        print_events(state, &live, false).await?;
                    }
                    Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    task.await?;
    Ok(())
}
