// server/src/cli/handlers.rs

// Command handlers for the claimdesk CLI. Each handler runs one command
// against the configured store and prints the result as text or JSON.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::Serialize;

use claims_lib::orchestrator::ClaimEditor;
use claims_lib::{
    compute_stats, ClaimEditOrchestrator, ClaimOverview, ClaimQuery, ClaimReviewService, ClaimStorageEngine,
    ClaimsConfig, ClaimsError, MirrorFileAdapter, Paginator, SyncOutcome,
};
use models::{Claim, ClaimEditForm, MergeMode, Table};

use crate::cli::commands::{EditArgs, FlagAction, ListArgs};

pub struct CliContext {
    pub storage: Arc<dyn ClaimStorageEngine>,
    pub config: ClaimsConfig,
    pub json: bool,
}

impl CliContext {
    fn review(&self) -> ClaimReviewService {
        ClaimReviewService::new(self.storage.clone())
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

pub async fn handle_load(ctx: &CliContext, file: &Path) -> Result<()> {
    let report = claims_lib::load_claims(ctx.storage.as_ref(), file)
        .await
        .with_context(|| format!("Failed to load claims from {}", file.display()))?;
    ctx.emit(&report, || format!("Loaded {}: {} created, {} updated", file.display(), report.created, report.updated))
}

pub async fn handle_clear(ctx: &CliContext, table: &str) -> Result<()> {
    let table = Table::from_str(table)
        .map_err(|e| anyhow!("{}. Use a table name such as `notes`, or app_label.ModelName", e))?;
    let removed = claims_lib::clear_table(ctx.storage.as_ref(), table).await?;
    ctx.emit(&serde_json::json!({ "table": table, "removed": removed }), || {
        format!("Table {} cleared ({} rows) and id sequence reset.", table, removed)
    })
}

pub async fn handle_list(ctx: &CliContext, args: ListArgs) -> Result<()> {
    let query = ClaimQuery {
        status: args.status,
        insurer: args.insurer,
        search: args.search,
        flagged_only: args.flagged,
    };
    let paginator = Paginator::new(args.per_page.unwrap_or(ctx.config.pagination.per_page));
    let page = ctx.review().list(&query, args.page.as_deref(), &paginator).await?;
    ctx.emit(&page, || {
        let mut out = format!(
            "{:>5}  {:>10}  {:<24} {:>12} {:>12}  {:<14} {:<20} {}\n",
            "ID", "CLAIM", "PATIENT", "BILLED", "PAID", "STATUS", "INSURER", "FLAG"
        );
        for listing in &page.items {
            let c = &listing.claim;
            out.push_str(&format!(
                "{:>5}  {:>10}  {:<24} {:>12} {:>12}  {:<14} {:<20} {}\n",
                c.id,
                c.claim_id,
                c.patient_name,
                c.billed_amount,
                c.paid_amount,
                c.status,
                c.insurer_name,
                if listing.flagged { "*" } else { "" }
            ));
        }
        out.push_str(&format!("Page {} of {} ({} claims)", page.number, page.num_pages, page.total));
        out
    })
}

pub async fn handle_show(ctx: &CliContext, id: u64) -> Result<()> {
    let overview = ctx.review().overview(id).await?;
    ctx.emit(&overview, || render_overview(&overview))
}

fn render_overview(overview: &ClaimOverview) -> String {
    let c = &overview.claim;
    let mut out = format!(
        "{}\n  Billed:      {}\n  Paid:        {}\n  Outstanding: {}\n  Status:      {}\n  Insurer:     {}\n  Discharged:  {}\n",
        c,
        c.billed_amount,
        c.paid_amount,
        c.outstanding(),
        c.status,
        c.insurer_name,
        c.discharge_date
    );
    match &overview.detail {
        Some(detail) => out.push_str(&format!(
            "  CPT codes:   {}\n  Denial:      {}\n",
            detail.cpt_codes,
            detail.denial_reason.as_deref().unwrap_or("-")
        )),
        None => out.push_str("  No claim detail on file\n"),
    }
    for flag in &overview.flags {
        out.push_str(&format!("  FLAG: {} ({})\n", flag.message, flag.created_at.format("%Y-%m-%d %H:%M")));
    }
    out.push_str(&format!("Notes ({}):", overview.notes.len()));
    for note in &overview.notes {
        out.push_str(&format!(
            "\n  [{}] {}: {}",
            note.created_at.format("%Y-%m-%d %H:%M"),
            note.created_by.as_deref().unwrap_or("anonymous"),
            note.text
        ));
    }
    out
}

/// Starts from the stored claim so unset options keep their current values.
pub fn build_edit_form(claim: &Claim, args: EditArgs) -> ClaimEditForm {
    let base = ClaimEditForm::from_claim(claim);
    ClaimEditForm {
        claim_id: args.claim_id.unwrap_or(base.claim_id),
        patient_name: args.patient_name.unwrap_or(base.patient_name),
        billed_amount: args.billed_amount.unwrap_or(base.billed_amount),
        paid_amount: args.paid_amount.unwrap_or(base.paid_amount),
        status: args.status.unwrap_or(base.status),
        insurer_name: args.insurer_name.unwrap_or(base.insurer_name),
        discharge_date: args.discharge_date.unwrap_or(base.discharge_date),
        cpt_codes: args.cpt_codes,
        denial_reason: args.denial_reason,
        cpt_mode: args.cpt_mode.as_deref().map(MergeMode::parse_lenient).unwrap_or_default(),
        denial_mode: args.denial_mode.as_deref().map(MergeMode::parse_lenient).unwrap_or_default(),
    }
}

pub async fn handle_edit(ctx: &CliContext, args: EditArgs) -> Result<()> {
    let id = args.id;
    let claim = ctx
        .storage
        .get_claim(id)
        .await?
        .ok_or_else(|| ClaimsError::claim_not_found(id))?;
    let form = build_edit_form(&claim, args);
    debug!("Submitting edit form for claim {}: {:?}", id, form);

    let orchestrator = ClaimEditOrchestrator::new(ctx.storage.clone(), MirrorFileAdapter::with_logging(ctx.config.mirror.clone()));
    let outcome = match orchestrator.edit_claim(id, &form).await {
        Ok(outcome) => outcome,
        Err(ClaimsError::Validation(errors)) => {
            for error in errors.iter() {
                eprintln!("  {}: {}", error.field, error.error);
            }
            return Err(anyhow!("Claim {} was not updated: {} invalid field(s)", claim.claim_id, errors.len()));
        }
        Err(e) => return Err(e.into()),
    };
    ctx.storage.flush().await?;

    ctx.emit(&outcome, || {
        let mut out = format!("Claim updated successfully: {}", outcome.claim);
        if let Some(detail) = &outcome.detail {
            out.push_str(&format!(
                "\n  CPT codes: {}\n  Denial:    {}",
                detail.cpt_codes,
                detail.denial_reason.as_deref().unwrap_or("-")
            ));
        }
        for report in &outcome.mirrors.reports {
            for file in &report.files {
                let state = match file.outcome {
                    SyncOutcome::Synced => "synced",
                    SyncOutcome::FileAbsent => "file absent",
                    SyncOutcome::RowNotFound => "row not found",
                };
                out.push_str(&format!("\n  mirror {} {}: {}", report.entity, file.path.display(), state));
            }
        }
        for error in &outcome.mirrors.errors {
            out.push_str(&format!("\n  mirror error: {}", error));
        }
        out
    })
}

pub async fn handle_note(ctx: &CliContext, id: u64, text: &str, author: Option<&str>) -> Result<()> {
    let note = ctx.review().add_note(id, text, author).await?;
    ctx.storage.flush().await?;
    ctx.emit(&note, || format!("Note {} added to claim {}: {}", note.id, id, note.preview()))
}

pub async fn handle_flag(ctx: &CliContext, action: FlagAction) -> Result<()> {
    let review = ctx.review();
    match action {
        FlagAction::Raise { id, message } => {
            let (flag, created) = review.raise_flag(id, message.as_deref()).await?;
            ctx.storage.flush().await?;
            ctx.emit(&serde_json::json!({ "flag": flag, "created": created }), || {
                if created {
                    format!("Claim {} flagged: {}", id, flag.message)
                } else {
                    format!("Claim {} is already flagged: {}", id, flag.message)
                }
            })
        }
        FlagAction::Clear { id } => {
            let removed = review.clear_flags(id).await?;
            ctx.storage.flush().await?;
            ctx.emit(&serde_json::json!({ "claim": id, "removed": removed }), || {
                format!("Cleared {} flag(s) from claim {}", removed, id)
            })
        }
    }
}

pub async fn handle_stats(ctx: &CliContext) -> Result<()> {
    let claims = ctx.storage.list_claims().await?;
    let flagged = ctx.storage.flagged_claim_ids().await?;
    let stats = compute_stats(&claims, &flagged);
    ctx.emit(&stats, || {
        let mut out = format!(
            "Claims:          {}\nFlagged:         {}\nTotal billed:    {}\nTotal paid:      {}\nOutstanding:     {}\nCollection rate: {}%\n",
            stats.total_claims, stats.flagged_claims, stats.total_billed, stats.total_paid, stats.outstanding, stats.collection_rate
        );
        out.push_str("By status:");
        for (status, bucket) in &stats.by_status {
            out.push_str(&format!("\n  {:<16} {:>5} {:>14} {:>14}", status, bucket.count, bucket.billed, bucket.paid));
        }
        out.push_str("\nBy insurer:");
        for (insurer, bucket) in &stats.by_insurer {
            out.push_str(&format!("\n  {:<24} {:>5} {:>14} {:>14}", insurer, bucket.count, bucket.billed, bucket.paid));
        }
        out
    })
}
