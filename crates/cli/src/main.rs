//! kaboom command line front end.
//!
//! Spawns a backend process, speaks to it over its stdio and runs one
//! command against the open project.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use kaboom_bridge::{Cache, Invoker, ProcessTransport};
use kaboom_client::settings::{self, format_duration};
use kaboom_client::{
	Backend, EditorKind, LanguageEditor, NotificationCenter, ProjectController, Settings, Severity, data, keys,
};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "kaboom")]
#[command(about = "Conlang workbench client")]
struct Cli {
	/// Backend program to spawn
	#[arg(long, value_name = "PROGRAM")]
	backend: PathBuf,

	/// Argument passed to the backend program; repeatable
	#[arg(long = "backend-arg", value_name = "ARG", allow_hyphen_values = true)]
	backend_args: Vec<String>,

	/// Settings file [default: <config dir>/kaboom/settings.toml]
	#[arg(long, value_name = "PATH")]
	settings: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show the open project's name, or rename it
	Name { new_name: Option<String> },
	/// Show the family id of the open project
	Family,
	/// List saved projects
	Groups,
	/// Save the open project under its name
	Save,
	/// Open a saved project
	Load { name: String },
	/// Merge a saved project into the open one
	Merge { name: String },
	/// Delete a saved project
	Delete { name: String },
	/// Start a new, unnamed project
	New,
	/// Freeze the open project as an epoch
	Epoch,
	/// Export the open project
	Export,
	/// Print the open project as JSON
	Dump,
	/// Work with languages or protolanguages
	#[command(subcommand)]
	Lang(LangCommand),
	/// Convert notation to IPA
	Ipa {
		#[arg(value_enum)]
		from: Notation,
		input: String,
	},
	/// Show the autosave interval, or change it (in half-minutes)
	Autosave { half_minutes: Option<u32> },
	/// Print backend events as they arrive
	Watch {
		#[arg(value_enum, default_value = "autosaved")]
		stream: Stream,
	},
}

#[derive(Args, Debug, Clone)]
struct Target {
	/// Operate on protolanguages instead of languages
	#[arg(long)]
	proto: bool,
}

#[derive(Subcommand, Debug)]
enum LangCommand {
	/// List names
	List(Target),
	/// Print one record as JSON
	Show {
		#[command(flatten)]
		target: Target,
		name: String,
	},
	/// Create an empty record
	Create {
		#[command(flatten)]
		target: Target,
		name: String,
	},
	/// Delete a record
	Delete {
		#[command(flatten)]
		target: Target,
		name: String,
	},
	/// List phonemes as `id<TAB>json`
	Phonemes {
		#[command(flatten)]
		target: Target,
		name: String,
	},
}

impl LangCommand {
	fn target(&self) -> &Target {
		match self {
			Self::List(target)
			| Self::Show { target, .. }
			| Self::Create { target, .. }
			| Self::Delete { target, .. }
			| Self::Phonemes { target, .. } => target,
		}
	}
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum Notation {
	Branner,
	Sil,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum Stream {
	Autosaved,
	Languages,
	Protolanguages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_max_level(if cli.verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::INFO
		})
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let transport = ProcessTransport::spawn(&cli.backend, &cli.backend_args)
		.with_context(|| format!("cannot start backend {}", cli.backend.display()))?;
	info!(backend = %cli.backend.display(), "kaboom.backend_started");

	let cache = Cache::new(Invoker::new(transport));
	let notifications = NotificationCenter::new();
	let settings_path = match cli.settings {
		Some(path) => path,
		None => settings::default_path()?,
	};

	let outcome = run(cli.command, &cache, &notifications, settings_path).await;
	// Failures reach the user through the returned error.
	if let Some(note) = notifications.current().filter(|note| note.severity != Severity::Error) {
		match note.action {
			Some(action) => println!("{} [{}]", note.message, action.label()),
			None => println!("{}", note.message),
		}
	}
	outcome
}

async fn run(
	command: Command,
	cache: &Cache,
	notifications: &NotificationCenter,
	settings_path: PathBuf,
) -> anyhow::Result<()> {
	let backend = Backend::new(cache.invoker().clone());
	match command {
		Command::Name { new_name } => {
			let controller = project(cache, notifications)?;
			match new_name {
				Some(name) => controller.set_project_name(&name).await?,
				None => println!("{}", settled(controller.name().settled().await)?),
			}
		}
		Command::Family => println!("{}", backend.get_family_id().await?),
		Command::Groups => {
			for name in backend.get_language_groups().await? {
				println!("{name}");
			}
		}
		Command::Save => project(cache, notifications)?.save().await?,
		Command::Load { name } => project(cache, notifications)?.load(&name).await?,
		Command::Merge { name } => project(cache, notifications)?.merge(&name).await?,
		Command::Delete { name } => project(cache, notifications)?.delete(&name).await?,
		Command::New => project(cache, notifications)?.new_project().await?,
		Command::Epoch => project(cache, notifications)?.epoch().await?,
		Command::Export => project(cache, notifications)?.export().await?,
		Command::Dump => println!("{}", backend.dump_language_group().await?),
		Command::Lang(command) => {
			if command.target().proto {
				let editor = LanguageEditor::new(EditorKind::protolanguage(), cache.clone(), notifications.clone());
				run_lang(command, &editor).await?;
			} else {
				let editor = LanguageEditor::new(EditorKind::language(), cache.clone(), notifications.clone());
				run_lang(command, &editor).await?;
			}
		}
		Command::Ipa { from, input } => {
			let ipa = match from {
				Notation::Branner => backend.from_branner(&input).await?,
				Notation::Sil => backend.from_sil(&input).await?,
			};
			println!("{ipa}");
		}
		Command::Autosave { half_minutes } => {
			let mut settings = Settings::load(&settings_path)?;
			if let Some(half_minutes) = half_minutes {
				settings::apply_autosave(&backend, &mut settings, &settings_path, half_minutes).await?;
			}
			println!("autosave every {}", format_duration(settings.autosave_interval()));
		}
		Command::Watch { stream } => watch(stream, cache, notifications).await?,
	}
	Ok(())
}

fn project(cache: &Cache, notifications: &NotificationCenter) -> anyhow::Result<ProjectController> {
	Ok(ProjectController::new(cache.clone(), notifications.clone())?)
}

/// Unwraps a settled entry, turning an entry error into a command failure.
fn settled<T>(state: kaboom_bridge::EntryState<T>) -> anyhow::Result<T> {
	if let Some(err) = state.error {
		anyhow::bail!("{err}");
	}
	state.data.context("backend returned no value")
}

async fn run_lang<T>(command: LangCommand, editor: &LanguageEditor<T>) -> anyhow::Result<()>
where
	T: Serialize + Clone + Send + Sync + 'static,
{
	let noun = editor.kind().name_type.noun();
	match command {
		LangCommand::List(_) => {
			let mut names = editor.names()?;
			// The listener may register after the first emit; the backend
			// re-emits the list every 500ms, so a later payload still arrives.
			editor.start_name_server().await?;
			for name in settled(names.changed().await)? {
				println!("{name}");
			}
		}
		LangCommand::Show { name, .. } => {
			let record = editor.subscribe(&name)?;
			match settled(record.settled().await)? {
				Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
				None => anyhow::bail!("no {noun} named {name}"),
			}
		}
		LangCommand::Create { name, .. } => {
			editor.create(&name).await?;
		}
		LangCommand::Delete { name, .. } => editor.delete(&name).await?,
		LangCommand::Phonemes { name, .. } => {
			let phonemes = editor.phonemes(&name)?;
			for (id, phoneme) in settled(phonemes.settled().await)? {
				println!("{id}\t{}", serde_json::to_string(&phoneme)?);
			}
		}
	}
	Ok(())
}

async fn watch(stream: Stream, cache: &Cache, notifications: &NotificationCenter) -> anyhow::Result<()> {
	match stream {
		Stream::Autosaved => {
			let mut autosaves = cache.subscribe_event(keys::AUTOSAVED, data::autosave_record())?;
			loop {
				let state = autosaves.changed().await;
				match (state.data, state.error) {
					(_, Some(err)) => anyhow::bail!("{err}"),
					(Some(record), None) => println!("{}\t{}", record.timestamp, record.name),
					(None, None) => debug!("kaboom.watch.empty"),
				}
			}
		}
		Stream::Languages => {
			watch_names(LanguageEditor::new(EditorKind::language(), cache.clone(), notifications.clone())).await
		}
		Stream::Protolanguages => {
			watch_names(LanguageEditor::new(EditorKind::protolanguage(), cache.clone(), notifications.clone())).await
		}
	}
}

async fn watch_names<T>(editor: LanguageEditor<T>) -> anyhow::Result<()>
where
	T: Clone + Send + Sync + 'static,
{
	let mut names = editor.names()?;
	// Payloads emitted before the listener registers are lost; the next
	// periodic re-emit covers them.
	editor.start_name_server().await?;
	loop {
		let state = names.changed().await;
		if let Some(err) = state.error {
			anyhow::bail!("{err}");
		}
		if let Some(names) = state.data {
			println!("{}", names.join(", "));
		}
	}
}
