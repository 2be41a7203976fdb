mod cli;

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use masthead::activity::ActivityLog;
use masthead::config::{self, Config};
use masthead::nav::NavbarState;
use masthead::site::Site;
use masthead::store::{MemoryBackend, Storage};
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "masthead", about = "Shell for the magazine site: accounts, articles, newsletter")]
pub struct Args {
    #[arg(short, long, help = "Run a single command and exit")]
    pub command: Option<String>,

    #[arg(long, env = "MASTHEAD_STORE", help = "Store file path")]
    pub store: Option<PathBuf>,

    #[arg(long, help = "Use a throwaway in-memory store")]
    pub memory: bool,

    #[arg(long, requires = "memory", help = "Byte quota for the in-memory store")]
    pub memory_quota: Option<usize>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Activity log directory")]
    pub activity_dir: Option<PathBuf>,

    #[arg(long, help = "Do not write an activity log")]
    pub no_activity: bool,

    #[arg(long, help = "Debug output (print effective settings)")]
    pub debug: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let cfg = if let Some(config_path) = &args.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config, using defaults: {}", e);
            Config::default()
        })
    };

    if let Err(errors) = cfg.validate() {
        for err in &errors {
            eprintln!("Config error {}", err);
        }
        return Err(anyhow!("Invalid configuration ({} errors)", errors.len()));
    }

    let root = std::env::current_dir()?;
    let store_path = args
        .store
        .clone()
        .unwrap_or_else(|| cfg.store_path(&root));

    let storage = if let Some(bytes) = args.memory_quota {
        Storage::new(Box::new(MemoryBackend::with_quota(bytes)))
    } else if args.memory {
        Storage::memory()
    } else {
        Storage::open_file(&store_path)
            .with_context(|| format!("opening store {}", store_path.display()))?
    };

    if args.debug {
        if args.memory {
            eprintln!("[DEBUG] Store: <memory> quota={:?}", args.memory_quota);
        } else {
            eprintln!("[DEBUG] Store: {}", store_path.display());
        }
        eprintln!("[DEBUG] Write retries: {}", cfg.write_retries());
        eprintln!("[DEBUG] Session TTL: {:?}", cfg.auth.session_ttl_hours);
        eprintln!("[DEBUG] Bootstrap admin: {}", cfg.admin().email);
        eprintln!("[DEBUG] Toast duration: {}ms", cfg.toast_duration_ms());
        eprintln!("[DEBUG] Recent limit: {}", cfg.recent_limit());
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let mut site = Site::new(&cfg, storage)?;

    let mut activity_path = None;
    if !args.no_activity {
        let dir = args
            .activity_dir
            .clone()
            .unwrap_or_else(|| root.join(config::STATE_DIR).join("activity"));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.jsonl", session_id));
        site = site.with_activity(ActivityLog::new(&path, &session_id)?);
        activity_path = Some(path);
    }

    let ctx = cli::Context {
        args,
        root,
        session_id,
        activity_path,
        site: RefCell::new(site),
        navbar: RefCell::new(NavbarState::new()),
    };

    if let Some(command) = ctx.args.command.clone() {
        cli::run_once(&ctx, &command)
    } else {
        cli::run_repl(ctx)
    }
}
