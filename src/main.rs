//! social-rbac command line
//!
//! Seeds and administers the rule table and evaluates single decisions.

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use social_rbac::{
    access_control::{
        AccessEvaluator, Action, ObjectType, Role, RoleRule, RuleKey, RuleUpdate, Target,
    },
    config::{AppConfig, LogFormat, StoreBackend, load_config},
    domain::{Actor, HasOwner, UserId},
    error::AccessError,
    store::{
        RuleRepository, RuleStore, SharedRuleStore, default_rules, load_seed_file, open_store,
        seed_store,
    },
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Role-based access control for the social network backend
#[derive(Parser, Debug)]
#[command(name = "social-rbac")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SOCIAL_RBAC_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides logging.level
    #[arg(long, env = "SOCIAL_RBAC_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the rule table and seed it
    Init,

    /// Inspect or change rules
    #[command(subcommand)]
    Rules(RulesCommand),

    /// Evaluate one access decision
    Check(CheckArgs),
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Print rules as JSON lines
    List {
        #[arg(long)]
        role: Option<Role>,

        #[arg(long)]
        object_type: Option<ObjectType>,
    },

    /// Change the flags of an existing rule
    Update {
        role: Role,
        object_type: ObjectType,
        action: Action,

        /// Which ownership row to change
        #[arg(long, action = clap::ArgAction::Set)]
        owned: bool,

        #[arg(long)]
        allowed: Option<bool>,

        #[arg(long)]
        full_access: Option<bool>,
    },
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Acting user; omit to evaluate as an anonymous caller
    #[arg(long)]
    actor_id: Option<UserId>,

    /// Role of the acting user
    #[arg(long, default_value = "user")]
    role: Role,

    object_type: ObjectType,

    action: Action,

    /// Owner of the target object
    #[arg(long, conflicts_with_all = ["own", "others"])]
    owner_id: Option<UserId>,

    /// Act on the actor's own record without a concrete object
    #[arg(long, conflicts_with = "others")]
    own: bool,

    /// Act on others' records without a concrete object (default)
    #[arg(long)]
    others: bool,

    /// Demand full access (e.g. hard delete)
    #[arg(long)]
    require_full_access: bool,
}

/// Target object known only by its type and owner
struct OwnedObject {
    object_type: ObjectType,
    owner_id: Option<UserId>,
}

impl HasOwner for OwnedObject {
    fn owner_id(&self) -> Option<UserId> {
        self.owner_id
    }

    fn object_type(&self) -> ObjectType {
        self.object_type
    }
}

const EXIT_DENIED: u8 = 2;
const EXIT_RULE_NOT_FOUND: u8 = 3;
const EXIT_UNAUTHENTICATED: u8 = 4;

fn init_logging(config: &AppConfig, level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(config.logging.level.as_str())));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn seed_rules(config: &AppConfig) -> anyhow::Result<Vec<RoleRule>> {
    match &config.seed.rules_file {
        Some(path) => {
            let expanded = shellexpand::tilde(path).into_owned();
            Ok(tokio::task::spawn_blocking(move || load_seed_file(expanded)).await??)
        }
        None => Ok(default_rules()),
    }
}

async fn run_init(config: &AppConfig, store: &SharedRuleStore) -> anyhow::Result<ExitCode> {
    let rules = seed_rules(config).await?;
    let inserted = seed_store(store.as_ref(), &rules).await?;
    println!("{}", json!({ "inserted": inserted, "total": rules.len() }));
    Ok(ExitCode::SUCCESS)
}

async fn run_rules(command: RulesCommand, store: &SharedRuleStore) -> anyhow::Result<ExitCode> {
    match command {
        RulesCommand::List { role, object_type } => {
            for rule in store.list().await? {
                if role.is_some_and(|r| r != rule.role())
                    || object_type.is_some_and(|t| t != rule.object_type())
                {
                    continue;
                }
                println!("{}", serde_json::to_string(&rule)?);
            }
        }
        RulesCommand::Update {
            role,
            object_type,
            action,
            owned,
            allowed,
            full_access,
        } => {
            let update = RuleUpdate {
                allowed,
                full_access,
            };
            if update.is_empty() {
                anyhow::bail!("nothing to update: pass --allowed and/or --full-access");
            }

            let key = RuleKey::new(role, object_type, action, owned);
            let rule = store.update(key, update).await?;
            info!(%key, allowed = rule.allowed, full_access = rule.full_access, "Updated rule");
            println!("{}", serde_json::to_string(&rule)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_check(
    args: CheckArgs,
    config: &AppConfig,
    store: SharedRuleStore,
) -> anyhow::Result<ExitCode> {
    let repository = RuleRepository::new(store).with_timeout(config.store.fetch_timeout());
    let evaluator = AccessEvaluator::new(repository);

    let actor = args.actor_id.map(|id| Actor::new(id, args.role));
    let object = args.owner_id.map(|owner_id| OwnedObject {
        object_type: args.object_type,
        owner_id: Some(owner_id),
    });
    let target = match &object {
        Some(object) => Target::Object(object),
        None if args.own => Target::Own,
        None => Target::Others,
    };

    let result = evaluator
        .evaluate(
            args.object_type,
            args.action,
            actor.as_ref(),
            target,
            args.require_full_access,
        )
        .await;

    let (body, code) = match result {
        Ok(decision) => (
            json!({
                "granted": true,
                "visibility": decision.visibility(),
                "rule": decision.rule,
            }),
            ExitCode::SUCCESS,
        ),
        Err(AccessError::Unavailable(source)) => {
            error!(error = %source, "Rule store unavailable");
            return Err(AccessError::Unavailable(source).into());
        }
        Err(err) => {
            let (kind, code) = match &err {
                AccessError::Unauthenticated => ("unauthenticated", EXIT_UNAUTHENTICATED),
                AccessError::RuleNotFound { .. } => ("rule_not_found", EXIT_RULE_NOT_FOUND),
                _ => ("access_denied", EXIT_DENIED),
            };
            (
                json!({ "granted": false, "error": kind, "message": err.to_string() }),
                ExitCode::from(code),
            )
        }
    };

    println!("{}", body);
    Ok(code)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Pick up a local .env before reading SOCIAL_RBAC__* variables
    dotenvy::dotenv().ok();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.log_level.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.store.backend,
        "Starting social-rbac"
    );

    let store = open_store(&config.store)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to open rule store"))?;

    // A memory store starts empty on every run
    if config.store.backend == StoreBackend::Memory && !matches!(cli.command, Command::Init) {
        let rules = seed_rules(&config).await?;
        seed_store(store.as_ref(), &rules).await?;
    }

    match cli.command {
        Command::Init => run_init(&config, &store).await,
        Command::Rules(command) => run_rules(command, &store).await,
        Command::Check(args) => run_check(args, &config, store).await,
    }
}
