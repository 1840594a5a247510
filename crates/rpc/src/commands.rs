//! CLI commands

use engex_core::{Credits, EngagementId, EngagementKind, PostId, UserId};
use engex_engagement::{EngagementOutcome, EngagementStatus, SettlementOutcome};

use crate::context::AppContext;

/// Grant promotional credits to a user
pub fn grant(
    ctx: &mut AppContext,
    user_id: &UserId,
    amount: Credits,
    description: &str,
) -> Result<(), anyhow::Error> {
    let tx = ctx.grant(user_id, amount, description)?;
    println!(
        "✅ Granted {} credits to {} (balance: {}, seq: {})",
        amount, user_id, tx.resulting_balance, tx.sequence
    );
    Ok(())
}

/// Operator balance correction
pub fn adjust(
    ctx: &mut AppContext,
    user_id: &UserId,
    amount: Credits,
    description: &str,
) -> Result<(), anyhow::Error> {
    let tx = ctx.adjust(user_id, amount, description)?;
    println!(
        "✅ Adjusted {} by {} (balance: {}, seq: {})",
        user_id, amount, tx.resulting_balance, tx.sequence
    );
    Ok(())
}

/// Refund credits for a post that could not be served
pub fn refund(
    ctx: &mut AppContext,
    user_id: &UserId,
    amount: Credits,
    post_id: Option<PostId>,
    description: &str,
) -> Result<(), anyhow::Error> {
    let tx = ctx.refund(user_id, amount, post_id, description)?;
    println!(
        "✅ Refunded {} credits to {} (balance: {})",
        amount, user_id, tx.resulting_balance
    );
    Ok(())
}

/// Publish a post requesting engagements
pub fn post(
    ctx: &mut AppContext,
    owner_id: &UserId,
    kind: EngagementKind,
    max_engagements: u32,
) -> Result<(), anyhow::Error> {
    let post = ctx.create_post(owner_id, kind, max_engagements)?;
    println!(
        "✅ Post {} created: {} x{} for {} credits (expires {})",
        post.id, post.kind, post.max_engagements, post.cost, post.expires_at
    );
    Ok(())
}

/// List active posts, newest first
pub fn posts(ctx: &AppContext, offset: usize, limit: usize) -> Result<(), anyhow::Error> {
    let posts = ctx.active_posts(offset, limit);
    if posts.is_empty() {
        println!("No active posts");
        return Ok(());
    }

    println!("Active posts ({}):", posts.len());
    println!("{:-<100}", "");
    for post in &posts {
        println!(
            "{} | {:>9} | {:>2}/{:<2} slots | owner {} | expires {}",
            post.id,
            post.kind.to_string(),
            post.current_engagements,
            post.max_engagements,
            post.owner_id,
            post.expires_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

/// Claim an engagement slot on a post
pub fn claim(
    ctx: &AppContext,
    post_id: PostId,
    performer_id: &UserId,
    kind: EngagementKind,
) -> Result<(), anyhow::Error> {
    let engagement = ctx.claim(post_id, performer_id, kind)?;
    println!(
        "✅ Engagement {} claimed on post {} (worth {} credits)",
        engagement.id, post_id, engagement.credits_earned
    );
    Ok(())
}

/// Mark a pending engagement as picked up
pub fn start(ctx: &AppContext, engagement_id: &EngagementId) -> Result<(), anyhow::Error> {
    ctx.start(engagement_id)?;
    println!("✅ Engagement {} in progress", engagement_id);
    Ok(())
}

/// Settle an engagement with the actor's reported outcome
pub fn settle(
    ctx: &mut AppContext,
    engagement_id: &EngagementId,
    outcome: EngagementOutcome,
    error_message: Option<String>,
) -> Result<(), anyhow::Error> {
    match ctx.settle(engagement_id, outcome, error_message)? {
        SettlementOutcome::Completed { transaction } => {
            println!(
                "✅ Engagement {} completed: {} credits to {} (balance: {})",
                engagement_id,
                transaction.amount,
                transaction.user_id,
                transaction.resulting_balance
            );
        }
        SettlementOutcome::Failed { retry_count } => {
            println!(
                "⚠️  Engagement {} failed (attempt {})",
                engagement_id, retry_count
            );
        }
        SettlementOutcome::AlreadySettled => {
            println!("Engagement {} was already settled; nothing done", engagement_id);
        }
    }
    Ok(())
}

/// Show a user's balance and lifetime totals
pub fn balance(ctx: &AppContext, user_id: &UserId) -> Result<(), anyhow::Error> {
    match ctx.history(user_id).last() {
        Some(_) => {
            let report = ctx.reconcile(user_id);
            println!("Balance for {}: {} credits", user_id, report.cached);
        }
        None => println!("Balance for {}: 0 credits (no activity)", user_id),
    }
    Ok(())
}

/// Show a user's transaction history
pub fn history(ctx: &AppContext, user_id: &UserId, limit: usize) -> Result<(), anyhow::Error> {
    let records = ctx.history(user_id);
    if records.is_empty() {
        println!("No transactions for {}", user_id);
        return Ok(());
    }

    println!("History for {} ({} records):", user_id, records.len());
    println!("{:-<90}", "");
    for tx in records.iter().rev().take(limit) {
        println!(
            "{:>4} | {:>16} | {:>8} | balance {:>8} | {}",
            tx.sequence,
            tx.kind.to_string(),
            tx.amount,
            tx.resulting_balance,
            tx.description,
        );
    }
    Ok(())
}

/// List a user's engagements, optionally filtered by status
pub fn engagements(
    ctx: &AppContext,
    user_id: &UserId,
    status: Option<EngagementStatus>,
) -> Result<(), anyhow::Error> {
    let engagements = ctx.engagements_for(user_id, status);
    if engagements.is_empty() {
        println!("No engagements for {}", user_id);
        return Ok(());
    }

    println!("Engagements for {} ({}):", user_id, engagements.len());
    println!("{:-<100}", "");
    for e in &engagements {
        println!(
            "{} | {:>9} | {:>11} | post {} | retries {}",
            e.id,
            e.kind.to_string(),
            e.status.to_string(),
            e.post_id,
            e.retry_count,
        );
    }
    Ok(())
}

/// Reconcile cached balances against recomputed ones
pub fn reconcile(ctx: &AppContext, user: Option<&UserId>) -> Result<(), anyhow::Error> {
    let reports = match user {
        Some(user_id) => vec![ctx.reconcile(user_id)],
        None => ctx.reconcile_all(),
    };

    let mut drifted = 0;
    for report in &reports {
        if !report.is_consistent() {
            drifted += 1;
            println!(
                "❌ {} drifted: cached {} vs computed {} (drift {})",
                report.user_id,
                report.cached,
                report.computed,
                report.drift()
            );
        }
    }

    if drifted == 0 {
        println!("✅ All balances consistent ({} accounts)", reports.len());
    } else {
        anyhow::bail!("{} of {} accounts drifted", drifted, reports.len());
    }
    Ok(())
}

/// Verify every user's hash chain
pub fn audit(ctx: &AppContext) -> Result<(), anyhow::Error> {
    match ctx.audit() {
        Ok(verified) => {
            println!("✅ Hash chains verified ({} accounts)", verified);
            Ok(())
        }
        Err((user_id, e)) => {
            println!("❌ Hash chain broken for {}: {}", user_id, e);
            anyhow::bail!("audit failed");
        }
    }
}

/// Run one expiry sweep
pub fn sweep(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let report = ctx.sweep();
    println!(
        "✅ Sweep done: {} posts expired, {} engagements expired",
        report.posts_expired, report.engagements_expired
    );
    Ok(())
}
