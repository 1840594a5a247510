//! Engex CLI - Main entry point

use clap::{Parser, Subcommand};
use engex_core::{Credits, EngagementId, EngagementKind, PostId, UserId};
use engex_engagement::{EngagementConfig, EngagementOutcome, EngagementStatus};
use engex_rpc::{commands, AppContext};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "engex")]
#[command(about = "Engex - Credit ledger and engagement lifecycle engine", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Optional JSON config file; missing fields fall back to defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant promotional credits to a user
    Grant {
        /// User ID
        user: String,
        /// Credits to grant
        amount: i64,
        /// Reason recorded on the transaction
        #[arg(long, default_value = "promotional grant")]
        description: String,
    },

    /// Operator balance correction (may push a balance negative)
    Adjust {
        /// User ID
        user: String,
        /// Signed credit amount
        amount: i64,
        /// Reason recorded on the transaction
        #[arg(long)]
        description: String,
    },

    /// Refund credits for a post that could not be served
    Refund {
        /// User ID
        user: String,
        /// Credits to refund
        amount: i64,
        /// Post the refund relates to
        #[arg(long)]
        post: Option<PostId>,
        /// Reason recorded on the transaction
        #[arg(long, default_value = "post refund")]
        description: String,
    },

    /// Publish a post requesting engagements
    Post {
        /// Owner user ID
        owner: String,
        /// Engagement kind (like, follow, comment, share, subscribe)
        kind: EngagementKind,
        /// Number of engagements requested
        max: u32,
    },

    /// List active posts
    Posts {
        #[arg(long, default_value = "0")]
        offset: usize,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Pause an active post
    Pause {
        post: PostId,
    },

    /// Resume a paused post
    Resume {
        post: PostId,
    },

    /// Claim an engagement slot on a post
    Claim {
        /// Post to engage with
        post: PostId,
        /// Performer user ID
        performer: String,
        /// Engagement kind; must match the post
        kind: EngagementKind,
    },

    /// Mark a pending engagement as picked up
    Start {
        engagement: EngagementId,
    },

    /// Settle an engagement with the actor's reported outcome
    Settle {
        engagement: EngagementId,
        /// success or failure
        outcome: EngagementOutcome,
        /// Error message for failed outcomes
        #[arg(long)]
        error: Option<String>,
    },

    /// Check balance for a user
    Balance {
        user: String,
    },

    /// Show a user's transaction history
    History {
        user: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List a user's engagements
    Engagements {
        user: String,
        /// Filter by status (pending, in_progress, completed, failed, expired)
        #[arg(long)]
        status: Option<EngagementStatus>,
    },

    /// Reconcile cached balances against recomputed ones
    Reconcile {
        /// Restrict to one user
        #[arg(long)]
        user: Option<String>,
    },

    /// Audit the ledger (verify hash chains)
    Audit,

    /// Run one expiry sweep
    Sweep,

    /// Run the expiry reaper until interrupted
    Serve {
        /// Seconds between sweeps
        #[arg(long, default_value = "60")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngagementConfig::from_file(path)?,
        None => EngagementConfig::default(),
    };

    let mut ctx = AppContext::new(&cli.data, config)?;

    match cli.command {
        Commands::Grant {
            user,
            amount,
            description,
        } => {
            commands::grant(&mut ctx, &UserId::new(user)?, Credits::new(amount), &description)?;
        }

        Commands::Adjust {
            user,
            amount,
            description,
        } => {
            commands::adjust(&mut ctx, &UserId::new(user)?, Credits::new(amount), &description)?;
        }

        Commands::Refund {
            user,
            amount,
            post,
            description,
        } => {
            commands::refund(
                &mut ctx,
                &UserId::new(user)?,
                Credits::new(amount),
                post,
                &description,
            )?;
        }

        Commands::Post { owner, kind, max } => {
            commands::post(&mut ctx, &UserId::new(owner)?, kind, max)?;
        }

        Commands::Posts { offset, limit } => {
            commands::posts(&ctx, offset, limit)?;
        }

        Commands::Pause { post } => {
            ctx.pause_post(&post)?;
            println!("✅ Post {} paused", post);
        }

        Commands::Resume { post } => {
            ctx.resume_post(&post)?;
            println!("✅ Post {} resumed", post);
        }

        Commands::Claim {
            post,
            performer,
            kind,
        } => {
            commands::claim(&ctx, post, &UserId::new(performer)?, kind)?;
        }

        Commands::Start { engagement } => {
            commands::start(&ctx, &engagement)?;
        }

        Commands::Settle {
            engagement,
            outcome,
            error,
        } => {
            commands::settle(&mut ctx, &engagement, outcome, error)?;
        }

        Commands::Balance { user } => {
            commands::balance(&ctx, &UserId::new(user)?)?;
        }

        Commands::History { user, limit } => {
            commands::history(&ctx, &UserId::new(user)?, limit)?;
        }

        Commands::Engagements { user, status } => {
            commands::engagements(&ctx, &UserId::new(user)?, status)?;
        }

        Commands::Reconcile { user } => {
            let user = user.map(|u| UserId::new(u)).transpose()?;
            commands::reconcile(&ctx, user.as_ref())?;
        }

        Commands::Audit => {
            commands::audit(&ctx)?;
        }

        Commands::Sweep => {
            commands::sweep(&ctx)?;
        }

        Commands::Serve { interval } => {
            println!("Reaper running every {}s (ctrl-c to stop)", interval);
            tokio::select! {
                _ = ctx.run_reaper(std::time::Duration::from_secs(interval)) => {}
                _ = tokio::signal::ctrl_c() => {
                    println!("Shutting down");
                }
            }
        }
    }

    ctx.close()?;
    Ok(())
}
