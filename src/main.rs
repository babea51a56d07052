use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

use tubeshelf::catalog::{load_catalog, Catalog, StaticCatalog};
use tubeshelf::collections::{Committed, PostDraft, VideoRef, Visibility};
use tubeshelf::config::{AppConfig, CliConfig, FileConfig};
use tubeshelf::library::{open_storage, Library, WatchOutcome};
use tubeshelf::session::Guarded;
use tubeshelf::settings::PrivacySetting;
use tubeshelf::storage::KeyValueStorage;

mod cli_style;
use cli_style::{
    get_prompt, get_styles, print_empty_list, print_error, print_goodbye, print_info,
    print_key_value, print_key_value_highlight, print_list_item, print_section_footer,
    print_section_header, print_success, print_warning, print_welcome, TableBuilder,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    /// SQLite file holding the collections. Without it nothing survives a
    /// restart.
    #[clap(long, value_parser = parse_path)]
    pub storage: Option<PathBuf>,

    /// Byte quota of the in-memory storage.
    #[clap(long)]
    pub storage_quota: Option<usize>,

    /// Catalog JSON file, the bundled demo catalog if omitted.
    #[clap(long, value_parser = parse_path)]
    pub catalog: Option<PathBuf>,

    /// Keep at most this many history entries.
    #[clap(long)]
    pub max_history_entries: Option<usize>,

    /// Keep at most this many authored posts.
    #[clap(long)]
    pub max_posts: Option<usize>,

    /// TOML configuration file, its values override the arguments above.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
#[command(styles = get_styles(), name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Logs in with the given username, no password needed.
    Login {
        #[arg(required = true, num_args = 1..)]
        username: Vec<String>,
    },

    /// Logs out, the collections stay stored under the handle.
    Logout,

    /// Shows who is logged in.
    Whoami,

    /// Lists the catalog videos, optionally filtered by title.
    Videos { query: Option<String> },

    /// Lists the catalog channels.
    Channels,

    /// Watches a video, recording it in the history.
    Watch { video_id: String },

    /// Shows the watch history, newest first.
    History {
        /// Group the entries by day.
        #[arg(long)]
        grouped: bool,
    },

    /// Removes a video from the history.
    Forget { video_id: String },

    /// Removes every video from the history.
    ClearHistory,

    /// Likes a video, or unlikes it if it was liked.
    Like { video_id: String },

    /// Shows the liked videos.
    Liked,

    /// Adds a video to watch later, or removes it if it was there.
    Later { video_id: String },

    /// Shows the watch later queue.
    WatchLater,

    /// Subscribes to a channel, or unsubscribes if subscribed.
    Subscribe { channel_id: String },

    /// Shows the subscribed channels.
    Subscriptions,

    /// Publishes a post.
    Post {
        #[arg(num_args = 0..)]
        message: Vec<String>,

        /// Image file to attach.
        #[arg(long, value_parser = parse_path)]
        image: Option<PathBuf>,

        /// Only visible to the author.
        #[arg(long)]
        private: bool,
    },

    /// Shows the authored posts.
    Posts {
        /// Only the posts visible to others.
        #[arg(long)]
        public: bool,
    },

    /// Deletes an authored post.
    DeletePost { post_id: String },

    /// Changes a privacy setting, e.g. `set history_paused true`.
    Set { key: String, value: String },

    /// Shows the privacy settings.
    Settings,

    /// Shows what is stored and how much space it takes.
    Storage,

    /// Shows where the collections are stored.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

struct Shell {
    library: Library,
    catalog: StaticCatalog,
    storage_description: String,
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut excerpt: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    excerpt.push('…');
    excerpt
}

fn warn_if_not_saved<T>(committed: &Committed<T>) {
    if let Some(err) = committed.save_error() {
        print_warning(&format!(
            "Kept in memory only, this change will not survive a restart: {}",
            err
        ));
    }
}

fn redirect_to_login() {
    print_warning("You need to log in first: login <username>");
}

fn print_videos(title: &str, videos: &[VideoRef], empty_message: &str) {
    print_section_header(title);
    if videos.is_empty() {
        print_empty_list(empty_message);
    }
    for video in videos {
        print_list_item(
            &format!("{}  {} ({})", video.id, video.title, video.channel_name),
            1,
        );
    }
    print_section_footer();
}

impl Shell {
    fn video_ref(&self, video_id: &str) -> Result<VideoRef, String> {
        self.catalog
            .video_ref(video_id)
            .ok_or_else(|| format!("No video with id '{}'", video_id))
    }

    fn execute_command(&self, line: &str) -> CommandExecutionResult {
        if line.trim().is_empty() {
            return CommandExecutionResult::Ok;
        }

        let args = shlex::split(line)
            .unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

        let cli =
            InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

        match cli {
            Ok(cli) => match self.run(cli.command) {
                Ok(result) => result,
                Err(message) => CommandExecutionResult::Error(message),
            },
            Err(e) => {
                if e.print().is_err() {
                    println!("{}", e);
                }
                CommandExecutionResult::Ok
            }
        }
    }

    fn run(&self, command: InnerCommand) -> Result<CommandExecutionResult, String> {
        let collections = self.library.collections();
        match command {
            InnerCommand::Login { username } => {
                let committed = self
                    .library
                    .login(&username.join(" "))
                    .map_err(|err| err.to_string())?;
                warn_if_not_saved(&committed);
                let identity = committed.value();
                print_success(&format!(
                    "Logged in as {} (@{})",
                    identity.username, identity.handle
                ));
            }
            InnerCommand::Logout => {
                let committed = self.library.logout().map_err(|err| err.to_string())?;
                warn_if_not_saved(&committed);
                print_success(&format!("Logged out @{}", committed.value().handle));
            }
            InnerCommand::Whoami => match self.library.session().current() {
                Some(identity) => {
                    print_key_value_highlight("Handle", &identity.handle);
                    print_key_value("Username", &identity.username);
                    print_key_value("Avatar", &identity.avatar);
                }
                None => print_info("Browsing anonymously"),
            },
            InnerCommand::Videos { query } => {
                let videos = self.catalog.search(query.as_deref().unwrap_or_default());
                if videos.is_empty() {
                    print_empty_list("No videos found");
                    return Ok(CommandExecutionResult::Ok);
                }
                let mut table = TableBuilder::new(vec!["Id", "Title", "Channel", "Length", "Liked"]);
                for video in videos {
                    let channel = self
                        .catalog
                        .channel(&video.channel_id)
                        .map(|c| c.name)
                        .unwrap_or_default();
                    let liked = if collections.liked.is_liked(&video.id) {
                        "yes"
                    } else {
                        ""
                    };
                    table.add_row(vec![
                        video.id.clone(),
                        excerpt(&video.title, 40),
                        channel,
                        video.duration_label(),
                        liked.to_string(),
                    ]);
                }
                table.print();
            }
            InnerCommand::Channels => {
                let mut table = TableBuilder::new(vec!["Id", "Name", "Videos", "Subscribed"]);
                for channel in self.catalog.channels() {
                    let videos = self.catalog.videos_by_channel(&channel.id).len();
                    let subscribed = if collections.subscriptions.is_subscribed(&channel.id) {
                        "yes"
                    } else {
                        ""
                    };
                    table.add_row(vec![
                        channel.id.clone(),
                        channel.name,
                        videos.to_string(),
                        subscribed.to_string(),
                    ]);
                }
                table.print();
            }
            InnerCommand::Watch { video_id } => {
                let video = self.video_ref(&video_id)?;
                let title = video.title.clone();
                match self
                    .library
                    .watch(video, Utc::now())
                    .map_err(|err| err.to_string())?
                {
                    WatchOutcome::Recorded(committed) => {
                        warn_if_not_saved(&committed);
                        print_success(&format!("Now watching: {}", title));
                    }
                    WatchOutcome::Paused => {
                        print_success(&format!("Now watching: {}", title));
                        print_info("History is paused, this watch was not recorded");
                    }
                }
            }
            InnerCommand::History { grouped } => {
                let history = &collections.history;
                if !grouped {
                    let videos: Vec<VideoRef> =
                        history.get_all().into_iter().map(|entry| entry.video).collect();
                    print_videos("History", &videos, "Nothing watched yet");
                    return Ok(CommandExecutionResult::Ok);
                }
                print_section_header("History");
                let groups = history.grouped_by_day(&Local::now());
                if groups.is_empty() {
                    print_empty_list("Nothing watched yet");
                }
                for group in groups {
                    print_key_value_highlight(
                        &group.label.to_string(),
                        &group.entries.len().to_string(),
                    );
                    for entry in group.entries {
                        print_list_item(
                            &format!(
                                "{}  {}  {}",
                                entry.watched_at.with_timezone(&Local).format("%H:%M"),
                                entry.video.id,
                                entry.video.title
                            ),
                            2,
                        );
                    }
                }
                print_section_footer();
            }
            InnerCommand::Forget { video_id } => {
                let committed = collections.history.remove(&video_id);
                warn_if_not_saved(&committed);
                if *committed.value() == 0 {
                    print_info(&format!("{} is not in the history", video_id));
                } else {
                    print_success(&format!("Removed {} from the history", video_id));
                }
            }
            InnerCommand::ClearHistory => {
                let committed = collections.history.clear();
                warn_if_not_saved(&committed);
                print_success("History cleared");
            }
            InnerCommand::Like { video_id } => {
                let video = self.video_ref(&video_id)?;
                let committed = collections
                    .liked
                    .toggle(video)
                    .map_err(|err| err.to_string())?;
                warn_if_not_saved(&committed);
                if *committed.value() {
                    print_success(&format!("Liked {}", video_id));
                } else {
                    print_success(&format!("Unliked {}", video_id));
                }
            }
            InnerCommand::Liked => {
                print_videos("Liked videos", &collections.liked.get_all(), "No liked videos");
            }
            InnerCommand::Later { video_id } => {
                let video = self.video_ref(&video_id)?;
                let committed = collections
                    .watch_later
                    .toggle(video)
                    .map_err(|err| err.to_string())?;
                warn_if_not_saved(&committed);
                if *committed.value() {
                    print_success(&format!("Saved {} for later", video_id));
                } else {
                    print_success(&format!("Removed {} from watch later", video_id));
                }
            }
            InnerCommand::WatchLater => {
                print_videos(
                    "Watch later",
                    &collections.watch_later.get_all(),
                    "Nothing saved for later",
                );
            }
            InnerCommand::Subscribe { channel_id } => {
                let channel = self
                    .catalog
                    .channel(&channel_id)
                    .ok_or_else(|| format!("No channel with id '{}'", channel_id))?;
                let committed = collections
                    .subscriptions
                    .toggle(&channel.id)
                    .map_err(|err| err.to_string())?;
                warn_if_not_saved(&committed);
                if *committed.value() {
                    print_success(&format!("Subscribed to {}", channel.name));
                } else {
                    print_success(&format!("Unsubscribed from {}", channel.name));
                }
            }
            InnerCommand::Subscriptions => {
                print_section_header("Subscriptions");
                let subscriptions = collections.subscriptions.get_all();
                if subscriptions.is_empty() {
                    print_empty_list("No subscriptions");
                }
                for channel_id in subscriptions {
                    let name = self
                        .catalog
                        .channel(channel_id.as_str())
                        .map(|c| c.name)
                        .unwrap_or_else(|| "(no longer in the catalog)".to_string());
                    print_list_item(&format!("{}  {}", channel_id, name), 1);
                }
                print_section_footer();
            }
            InnerCommand::Post {
                message,
                image,
                private,
            } => {
                let image = match image {
                    Some(path) => {
                        let bytes = std::fs::read(&path)
                            .map_err(|err| format!("Could not read {:?}: {}", path, err))?;
                        Some(
                            self.library
                                .attach_image(&bytes)
                                .map_err(|err| err.to_string())?,
                        )
                    }
                    None => None,
                };
                let draft = PostDraft {
                    message: message.join(" "),
                    image,
                    visibility: if private {
                        Visibility::Private
                    } else {
                        Visibility::Public
                    },
                };
                match self.library.publish_post(draft, Utc::now()) {
                    Guarded::RedirectToLogin => redirect_to_login(),
                    Guarded::Proceed(result) => {
                        let committed = result.map_err(|err| err.to_string())?;
                        warn_if_not_saved(&committed);
                        print_success(&format!("Published post {}", committed.value().id));
                    }
                }
            }
            InnerCommand::Posts { public } => {
                let posts = if public {
                    collections.posts.public_posts()
                } else {
                    collections.posts.get_all()
                };
                if posts.is_empty() {
                    print_empty_list("No posts");
                    return Ok(CommandExecutionResult::Ok);
                }
                let mut table =
                    TableBuilder::new(vec!["Id", "Published", "Visibility", "Message", "Image"]);
                for post in posts {
                    let visibility = match post.visibility {
                        Visibility::Public => "public",
                        Visibility::Private => "private",
                    };
                    let image = post
                        .image
                        .as_ref()
                        .and_then(|image| image.mime_type())
                        .unwrap_or_default()
                        .to_string();
                    table.add_row(vec![
                        post.id.clone(),
                        local_time(&post.created_at),
                        visibility.to_string(),
                        excerpt(&post.message, 40),
                        image,
                    ]);
                }
                table.print();
            }
            InnerCommand::DeletePost { post_id } => match self.library.delete_post(&post_id) {
                Guarded::RedirectToLogin => redirect_to_login(),
                Guarded::Proceed(committed) => {
                    warn_if_not_saved(&committed);
                    if *committed.value() == 0 {
                        return Err(format!("No post with id '{}'", post_id));
                    }
                    print_success(&format!("Deleted post {}", post_id));
                }
            },
            InnerCommand::Set { key, value } => {
                let setting = PrivacySetting::from_key_value(&key, &value)?;
                match self.library.set_setting(setting) {
                    Guarded::RedirectToLogin => redirect_to_login(),
                    Guarded::Proceed(committed) => {
                        warn_if_not_saved(&committed);
                        print_success(&format!("{} is now {}", key, value));
                    }
                }
            }
            InnerCommand::Settings => {
                print_section_header("Privacy settings");
                for setting in collections.settings.all() {
                    print_key_value(setting.key(), &setting.value_to_string());
                }
                print_section_footer();
            }
            InnerCommand::Storage => {
                let storage = self.library.storage();
                let keys = storage.keys().map_err(|err| err.to_string())?;
                let used = storage.used_bytes().map_err(|err| err.to_string())?;
                let mut table = TableBuilder::new(vec!["Key", "Size"]);
                for key in keys {
                    let size = storage
                        .get(&key)
                        .map_err(|err| err.to_string())?
                        .map(|value| key.len() + value.len())
                        .unwrap_or_default();
                    table.add_row(vec![
                        key,
                        format!("{:#}", byte_unit::Byte::from(size as u64)),
                    ]);
                }
                table.print();
                print_key_value_highlight(
                    "Total",
                    &format!("{:#}", byte_unit::Byte::from(used as u64)),
                );
            }
            InnerCommand::Where => {
                println!("{}", self.storage_description);
            }
            InnerCommand::Exit => return Ok(CommandExecutionResult::Exit),
        }
        Ok(CommandExecutionResult::Ok)
    }
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        storage_path: cli_args.storage,
        storage_quota_bytes: cli_args.storage_quota,
        catalog_path: cli_args.catalog,
        max_history_entries: cli_args.max_history_entries,
        max_posts: cli_args.max_posts,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let storage = open_storage(&config)?;
    let catalog = load_catalog(config.catalog_path.as_deref())?;
    let library = Library::open(storage, &config);
    let _events = library.subscribe(|event| debug!("Event: {:?}", event));

    let storage_description = match &config.storage_path {
        Some(path) => path.display().to_string(),
        None => "in memory, lost on exit".to_string(),
    };
    let catalog_description = match &config.catalog_path {
        Some(path) => path.display().to_string(),
        None => "bundled demo".to_string(),
    };
    let shell = Shell {
        library,
        catalog,
        storage_description,
    };

    print_welcome(&shell.storage_description, &catalog_description);

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(MyHelper::new()));

    loop {
        let prompt = get_prompt(shell.library.session().handle().as_deref());
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match shell.execute_command(&line) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        print_error(&err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                print_error(&format!("{:?}", e));
                break;
            }
        }
    }

    print_goodbye();
    Ok(())
}
