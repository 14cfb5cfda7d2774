// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxistatic::{
    config::SiteConfig,
    document::{Document, Format, Status},
    metadata::{CustomField, FieldType},
    path::{default_config_path, default_session_path},
    query::{LocalContent, Query, SortOrder},
    remote::{CommitOutcome, GitHubRemote, LocalRemote, Remote},
    session::{
        authorization_code, AccessTokenSource, GitHubOAuth, Session, SessionError, SessionFile,
        SessionManager, StaticToken,
    },
    ContentStore, SchemaOwner,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;
use inquire::Text;
use std::{fs, path::PathBuf, process::exit, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "oxistatic [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Site configuration file to use instead of the default.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let config = load_config(self.config)?;
        match self.command {
            Command::Login => run_login(&config).await,
            Command::Logout => run_logout(&config),
            Command::Query(opts) => run_query(&config, opts),
            Command::Collection(command) => {
                run_store(&config, StoreCommand::Collection(command)).await
            }
            Command::Document(command) => {
                run_store(&config, StoreCommand::Document(command)).await
            }
            Command::Singleton(command) => {
                run_store(&config, StoreCommand::Singleton(command)).await
            }
            Command::Field(command) => run_store(&config, StoreCommand::Field(command)).await,
            Command::Metadata(command) => {
                run_store(&config, StoreCommand::Metadata(command)).await
            }
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Log in to GitHub through OAuth.
    Login,

    /// Forget stored session.
    Logout,

    /// Manage collections.
    #[command(subcommand)]
    Collection(CollectionCommand),

    /// Manage documents of a collection.
    #[command(subcommand)]
    Document(DocumentCommand),

    /// Manage singletons.
    #[command(subcommand)]
    Singleton(SingletonCommand),

    /// Manage custom fields of a collection or singleton.
    #[command(subcommand)]
    Field(FieldCommand),

    /// Maintain metadata index.
    #[command(subcommand)]
    Metadata(MetadataCommand),

    /// Query content of a local checkout.
    #[command(override_usage = "oxistatic query [options] <root>")]
    Query(QueryOptions),
}

#[derive(Debug, Clone)]
enum StoreCommand {
    Collection(CollectionCommand),
    Document(DocumentCommand),
    Singleton(SingletonCommand),
    Field(FieldCommand),
    Metadata(MetadataCommand),
}

#[derive(Debug, Clone, Subcommand)]
enum CollectionCommand {
    /// Create new collection.
    Create {
        /// Title of collection.
        #[arg(value_name = "title")]
        title: String,

        /// Directory to store documents in.
        #[arg(short, long, value_name = "path")]
        path: Option<String>,
    },

    /// Delete collection.
    Delete {
        #[arg(value_name = "slug")]
        slug: String,

        /// Remove document files along with collection.
        #[arg(short, long)]
        remove_documents: bool,
    },

    /// List collections.
    List,
}

#[derive(Debug, Clone, Subcommand)]
enum DocumentCommand {
    /// Create or update document from markdown file.
    Save {
        #[arg(value_name = "collection")]
        collection: String,

        /// Markdown or MDX file with front matter.
        #[arg(value_name = "file")]
        file: PathBuf,

        /// Slug document was stored under before, when updating or renaming.
        #[arg(short, long, value_name = "slug")]
        previous_slug: Option<String>,
    },

    /// Delete document.
    Delete {
        #[arg(value_name = "collection")]
        collection: String,

        #[arg(value_name = "slug")]
        slug: String,
    },

    /// Print document.
    Show {
        #[arg(value_name = "collection")]
        collection: String,

        #[arg(value_name = "slug")]
        slug: String,
    },

    /// List documents of collection.
    List {
        #[arg(value_name = "collection")]
        collection: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum SingletonCommand {
    /// Create or update singleton from markdown file.
    Save {
        #[arg(value_name = "file")]
        file: PathBuf,

        /// Slug singleton was stored under before, when updating or renaming.
        #[arg(short, long, value_name = "slug")]
        previous_slug: Option<String>,
    },

    /// Delete singleton.
    Delete {
        #[arg(value_name = "slug")]
        slug: String,
    },

    /// List singletons.
    List,
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
struct OwnerOptions {
    /// Collection owning schema.
    #[arg(long, value_name = "slug")]
    collection: Option<String>,

    /// Singleton owning schema.
    #[arg(long, value_name = "slug")]
    singleton: Option<String>,
}

impl OwnerOptions {
    fn owner(self) -> Result<SchemaOwner> {
        match (self.collection, self.singleton) {
            (Some(slug), _) => Ok(SchemaOwner::Collection(slug)),
            (None, Some(slug)) => Ok(SchemaOwner::Singleton(slug)),
            (None, None) => anyhow::bail!("either --collection or --singleton is required"),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum FieldCommand {
    /// Add custom field.
    Add {
        #[command(flatten)]
        owner: OwnerOptions,

        /// Front matter name of field.
        #[arg(value_name = "name")]
        name: String,

        /// Field type: string, text, number, boolean, date, image, or tags.
        #[arg(short = 't', long = "type", value_name = "type")]
        field_type: FieldType,

        /// Human readable title. Defaults to field name.
        #[arg(long, value_name = "title")]
        title: Option<String>,

        #[arg(short, long, value_name = "text")]
        description: Option<String>,

        /// Reject documents without this field.
        #[arg(short, long)]
        required: bool,
    },

    /// Remove custom field.
    Remove {
        #[command(flatten)]
        owner: OwnerOptions,

        #[arg(value_name = "name")]
        name: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum MetadataCommand {
    /// Regenerate metadata index from every document.
    Rebuild,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct QueryOptions {
    /// Root of local repository checkout.
    #[arg(value_name = "root")]
    pub root: PathBuf,

    #[arg(long, value_name = "slug")]
    pub collection: Option<String>,

    #[arg(long, value_name = "status")]
    pub status: Option<Status>,

    #[arg(long, value_name = "slug")]
    pub slug: Option<String>,

    /// Field equality filter, e.g., `rating=5`.
    #[arg(short, long = "where", value_name = "field=value")]
    pub filters: Vec<String>,

    /// Field to sort by.
    #[arg(long, value_name = "field")]
    pub sort: Option<String>,

    /// Sort descending instead of ascending.
    #[arg(long, requires = "sort")]
    pub desc: bool,

    #[arg(long, value_name = "count", default_value_t = 0)]
    pub skip: usize,

    #[arg(long, value_name = "count")]
    pub limit: Option<usize>,

    /// Comma separated fields to print.
    #[arg(long, value_name = "fields", value_delimiter = ',')]
    pub select: Vec<String>,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

fn load_config(path: Option<PathBuf>) -> Result<SiteConfig> {
    let path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };
    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    Ok(data.parse()?)
}

fn session_file(config: &SiteConfig) -> Result<SessionFile> {
    let path = match &config.session.path {
        Some(path) => path.clone(),
        None => default_session_path()?,
    };

    Ok(SessionFile::new(path))
}

fn oauth_client(config: &SiteConfig) -> Option<GitHubOAuth> {
    let client_id = config.github.client_id.as_ref()?;
    let client_secret = std::env::var(&config.github.client_secret_env).ok()?;

    Some(GitHubOAuth::new(
        reqwest::Client::new(),
        &config.github.oauth_url,
        &config.github.api_url,
        client_id,
        client_secret,
    ))
}

async fn run_login(config: &SiteConfig) -> Result<()> {
    let oauth = oauth_client(config).with_context(|| {
        format!(
            "login needs github.client_id in configuration and ${} in environment",
            config.github.client_secret_env
        )
    })?;

    let state = format!("{:x}", Utc::now().timestamp_micros());
    let url = oauth.authorize_url(&state)?;
    println!("open the following URL and authorize access:\n\n  {url}\n");
    let redirect = Text::new("URL you were redirected to").prompt()?;
    let code = authorization_code(&redirect, &state)?;

    let session = oauth.login(&code, &config.repository_ref()).await?;
    let file = session_file(config)?;
    file.save(&session)?;
    info!("session stored at {}", file.path().display());

    Ok(())
}

fn run_logout(config: &SiteConfig) -> Result<()> {
    session_file(config)?.clear()?;
    info!("logged out");

    Ok(())
}

fn run_query(config: &SiteConfig, opts: QueryOptions) -> Result<()> {
    let content = LocalContent::open(&opts.root, &config.layout())?;

    let mut query = Query::new().skip(opts.skip);
    if let Some(collection) = opts.collection {
        query = query.collection(collection);
    }
    if let Some(status) = opts.status {
        query = query.status(status);
    }
    if let Some(slug) = opts.slug {
        query = query.slug(slug);
    }
    for filter in opts.filters {
        let (name, value) = filter
            .split_once('=')
            .with_context(|| format!("filter {filter:?} is not of the form field=value"))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::from(value));
        query = query.field_eq(name, value);
    }
    if let Some(sort) = opts.sort {
        let order = if opts.desc { SortOrder::Descending } else { SortOrder::Ascending };
        query = query.sort(sort, order);
    }
    if let Some(limit) = opts.limit {
        query = query.limit(limit);
    }
    if !opts.select.is_empty() {
        query = query.select(opts.select);
    }

    for entry in content.query(&query) {
        println!("{}", query.project(entry));
    }

    Ok(())
}

async fn run_store(config: &SiteConfig, command: StoreCommand) -> Result<()> {
    let layout = config.layout();
    let repository = config.repository_ref();

    if let Some(path) = &config.repository.local_path {
        let remote = LocalRemote::open(path, &repository.branch)?;
        return run_store_command(ContentStore::new(remote, layout), command).await;
    }

    let tokens = token_source(config)?;
    let remote = GitHubRemote::new(
        reqwest::Client::new(),
        &config.github.graphql_url,
        repository,
        tokens,
    );
    run_store_command(ContentStore::new(remote, layout), command).await
}

fn token_source(config: &SiteConfig) -> Result<Arc<dyn AccessTokenSource>> {
    if let Ok(token) = std::env::var(&config.github.token_env) {
        info!("use access token from ${}", config.github.token_env);
        return Ok(Arc::new(StaticToken::new(token)));
    }

    let file = session_file(config)?;
    let Session { user, tokens } = file.load()?.ok_or(SessionError::NotLoggedIn)?;
    info!("use session of {}", user.login);

    let Some(oauth) = oauth_client(config) else {
        warn!("no OAuth client configured; access token will not be refreshed");
        return Ok(Arc::new(StaticToken::new(tokens.access_token)));
    };

    let manager =
        SessionManager::new(oauth, tokens, config.refresh_margin()).on_refresh(move |tokens| {
            let session = Session {
                user: user.clone(),
                tokens: tokens.clone(),
            };
            if let Err(error) = file.save(&session) {
                warn!("failed to persist refreshed session: {error}");
            }
        });

    Ok(Arc::new(manager))
}

async fn run_store_command<R>(store: ContentStore<R>, command: StoreCommand) -> Result<()>
where
    R: Remote,
{
    match command {
        StoreCommand::Collection(CollectionCommand::Create { title, path }) => {
            report(store.create_collection(&title, path.as_deref()).await?);
        }
        StoreCommand::Collection(CollectionCommand::Delete { slug, remove_documents }) => {
            report(store.delete_collection(&slug, remove_documents).await?);
        }
        StoreCommand::Collection(CollectionCommand::List) => {
            for collection in store.list_collections().await? {
                println!("{}\t{}\t{}", collection.slug, collection.title, collection.path);
            }
        }
        StoreCommand::Document(DocumentCommand::Save { collection, file, previous_slug }) => {
            let document = read_document(&file)?;
            report(store.save_document(&collection, document, previous_slug.as_deref()).await?);
        }
        StoreCommand::Document(DocumentCommand::Delete { collection, slug }) => {
            report(store.delete_document(&collection, &slug).await?);
        }
        StoreCommand::Document(DocumentCommand::Show { collection, slug }) => {
            print!("{}", store.get_document(&collection, &slug).await?);
        }
        StoreCommand::Document(DocumentCommand::List { collection }) => {
            for entry in store.list_documents(&collection).await? {
                println!("{}\t{}\t{}", entry.slug, status_label(entry.status), entry.title);
            }
        }
        StoreCommand::Singleton(SingletonCommand::Save { file, previous_slug }) => {
            let document = read_document(&file)?;
            report(store.save_singleton(document, previous_slug.as_deref()).await?);
        }
        StoreCommand::Singleton(SingletonCommand::Delete { slug }) => {
            report(store.delete_singleton(&slug).await?);
        }
        StoreCommand::Singleton(SingletonCommand::List) => {
            for singleton in store.list_singletons().await? {
                println!("{}\t{}\t{}", singleton.slug, singleton.title, singleton.path);
            }
        }
        StoreCommand::Field(FieldCommand::Add {
            owner,
            name,
            field_type,
            title,
            description,
            required,
        }) => {
            let mut field = CustomField::new(title.unwrap_or_else(|| name.clone()), field_type)
                .required(required);
            if let Some(description) = description {
                field = field.description(description);
            }
            report(store.add_field(&owner.owner()?, &name, field).await?);
        }
        StoreCommand::Field(FieldCommand::Remove { owner, name }) => {
            report(store.remove_field(&owner.owner()?, &name).await?);
        }
        StoreCommand::Metadata(MetadataCommand::Rebuild) => {
            match store.rebuild_metadata(ProgressBar::new(0)).await? {
                Some(outcome) => report(outcome),
                None => info!("nothing to commit"),
            }
        }
    }

    Ok(())
}

fn read_document(path: &std::path::Path) -> Result<Document> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let format = Format::from_path(&path.to_string_lossy()).unwrap_or_default();

    Ok(Document::parse(&data, format)?)
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Draft => "draft",
        Status::Published => "published",
    }
}

fn report(outcome: CommitOutcome) {
    match outcome.url {
        Some(url) => info!("committed {} ({url})", outcome.oid.short()),
        None => info!("committed {}", outcome.oid.short()),
    }
}
