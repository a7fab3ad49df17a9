//! # Dispute Subcommands
//!
//! One subcommand per lifecycle operation plus read-side reports. Every
//! command runs against a [`Session`]: a [`DisputeManager`] over a
//! [`FileStore`] and the acting user.
//!
//! Mutations take the dispute id as a positional argument and accept
//! `--expect-version` to refuse the change if someone else has written
//! since the caller last looked.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use dispute_core::{Actor, Amount, ConsultantId, DisputeId};
use dispute_lifecycle::{
    CommissionDispute, DisputeCommand, DisputeManager, DisputeStats, DisputeStatus, NewDispute,
    NewEvidence, Resolution,
};
use dispute_store::FileStore;

use crate::config::CliConfig;

/// An open ledger and the user acting on it.
#[derive(Debug)]
pub struct Session {
    manager: DisputeManager<FileStore>,
    user: Option<Actor>,
}

impl Session {
    /// Open the store named by `config`, creating its directory if needed.
    pub fn open(config: &CliConfig, user: Option<Actor>) -> Result<Self> {
        let store = FileStore::open(&config.store_dir).with_context(|| {
            format!("failed to open dispute store at {}", config.store_dir.display())
        })?;
        let manager = DisputeManager::new(store)
            .with_config(config.ledger())
            .with_policy(config.sla);
        Ok(Self { manager, user })
    }

    /// The underlying manager.
    pub fn manager(&self) -> &DisputeManager<FileStore> {
        &self.manager
    }

    fn actor(&self) -> Result<&Actor> {
        match &self.user {
            Some(actor) => Ok(actor),
            None => bail!("this command records an actor; pass --user <id>"),
        }
    }
}

/// The dispute a mutation targets.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Dispute identifier (bare UUID or `dispute:<uuid>`).
    pub id: String,
    /// Fail unless the stored dispute is at this version.
    #[arg(long)]
    pub expect_version: Option<u64>,
}

/// Output switch shared by the read commands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct Output {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Dispute subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// File a new dispute.
    File {
        /// Consultant whose commission is disputed.
        #[arg(long)]
        consultant: String,
        /// Why the commission is disputed.
        #[arg(long)]
        reason: String,
        /// Disputed amount in minor currency units.
        #[arg(long)]
        disputed: i64,
        /// Expected amount in minor currency units.
        #[arg(long)]
        expected: i64,
    },

    /// Assign a reviewer (open/escalated → under-review, or reassign).
    Assign {
        #[command(flatten)]
        target: Target,
        /// Reviewer user id.
        #[arg(long)]
        to: String,
        /// Reviewer display name. Defaults to the id.
        #[arg(long)]
        to_name: Option<String>,
    },

    /// Move through a transition that needs no extra data.
    Status {
        #[command(flatten)]
        target: Target,
        /// Target status.
        status: DisputeStatus,
        /// Note recorded on the audit entry.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Attach an evidence file.
    Evidence {
        #[command(flatten)]
        target: Target,
        /// File name.
        #[arg(long)]
        file: String,
        /// What the file shows.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Post a comment.
    Comment {
        #[command(flatten)]
        target: Target,
        /// Comment text.
        text: String,
        /// Hide the comment from the filer.
        #[arg(long)]
        internal: bool,
    },

    /// Close a dispute with an outcome.
    Resolve {
        #[command(flatten)]
        target: Target,
        /// approved-full, approved-partial, or rejected.
        #[arg(long)]
        outcome: Resolution,
        /// Resolution notes.
        #[arg(long)]
        notes: String,
        /// Approved amount in minor units. Required for approvals.
        #[arg(long)]
        amount: Option<i64>,
    },

    /// Reject a dispute.
    Reject {
        #[command(flatten)]
        target: Target,
        /// Why it was rejected.
        #[arg(long)]
        notes: String,
    },

    /// Escalate an under-review dispute.
    Escalate {
        #[command(flatten)]
        target: Target,
        /// User id to escalate to.
        #[arg(long)]
        to: String,
        /// Display name of who it goes to. Defaults to the id.
        #[arg(long)]
        to_name: Option<String>,
        /// Why it is escalated.
        #[arg(long)]
        reason: String,
    },

    /// Show one dispute with its audit trail.
    Show {
        /// Dispute identifier.
        id: String,
        #[command(flatten)]
        output: Output,
    },

    /// List disputes.
    List {
        /// Only this consultant's disputes.
        #[arg(long)]
        consultant: Option<String>,
        /// Only disputes in this status.
        #[arg(long)]
        status: Option<DisputeStatus>,
        #[command(flatten)]
        output: Output,
    },

    /// Dashboard statistics.
    Stats {
        /// Only this consultant's disputes.
        #[arg(long)]
        consultant: Option<String>,
        #[command(flatten)]
        output: Output,
    },

    /// Open disputes that are breached or eligible for escalation.
    Sla {
        #[command(flatten)]
        output: Output,
    },

    /// Verify audit chains. Exits 1 if any chain is broken.
    Verify {
        /// Check one dispute instead of all.
        id: Option<String>,
    },
}

/// Execute a subcommand. Returns the process exit code.
pub fn run(command: &Command, session: &Session) -> Result<u8> {
    let manager = session.manager();
    match command {
        Command::File {
            consultant,
            reason,
            disputed,
            expected,
        } => {
            let filing = NewDispute::complete(
                ConsultantId::new(consultant.as_str())?,
                reason.as_str(),
                Amount::new(*disputed).context("invalid --disputed")?,
                Amount::new(*expected).context("invalid --expected")?,
            );
            let d = manager
                .file_dispute(filing, session.actor()?)
                .context("failed to file dispute")?;
            println!("OK: filed {} for consultant {}", d.id, d.consultant_id);
            Ok(0)
        }

        Command::Assign { target, to, to_name } => {
            let assignee = named_actor(to, to_name.as_deref())?;
            let d = mutate(session, target, DisputeCommand::Assign { assignee })?;
            println!(
                "OK: {} assigned to {} ({})",
                d.id,
                d.assigned_to_name.as_deref().unwrap_or_default(),
                d.status
            );
            Ok(0)
        }

        Command::Status {
            target,
            status,
            notes,
        } => {
            let d = mutate(
                session,
                target,
                DisputeCommand::ChangeStatus {
                    status: *status,
                    notes: notes.clone(),
                },
            )?;
            println!("OK: {} is now {}", d.id, d.status);
            Ok(0)
        }

        Command::Evidence {
            target,
            file,
            description,
        } => {
            let d = mutate(
                session,
                target,
                DisputeCommand::AddEvidence(NewEvidence::new(file.as_str(), description.as_str())),
            )?;
            println!("OK: {} now has {} evidence file(s)", d.id, d.evidence.len());
            Ok(0)
        }

        Command::Comment {
            target,
            text,
            internal,
        } => {
            let d = mutate(
                session,
                target,
                DisputeCommand::AddComment {
                    comment: text.clone(),
                    is_internal: *internal,
                },
            )?;
            println!("OK: {} now has {} comment(s)", d.id, d.comments.len());
            Ok(0)
        }

        Command::Resolve {
            target,
            outcome,
            notes,
            amount,
        } => {
            let approved_amount = amount
                .map(Amount::new)
                .transpose()
                .context("invalid --amount")?;
            let d = mutate(
                session,
                target,
                DisputeCommand::Resolve {
                    resolution: *outcome,
                    notes: notes.clone(),
                    approved_amount,
                },
            )?;
            match d.approved_amount {
                Some(a) => println!("OK: {} {} with {a} approved", d.id, d.status),
                None => println!("OK: {} {}", d.id, d.status),
            }
            Ok(0)
        }

        Command::Reject { target, notes } => {
            let d = mutate(
                session,
                target,
                DisputeCommand::Resolve {
                    resolution: Resolution::Rejected,
                    notes: notes.clone(),
                    approved_amount: None,
                },
            )?;
            println!("OK: {} {}", d.id, d.status);
            Ok(0)
        }

        Command::Escalate {
            target,
            to,
            to_name,
            reason,
        } => {
            let escalated_to = named_actor(to, to_name.as_deref())?;
            let d = mutate(
                session,
                target,
                DisputeCommand::Escalate {
                    escalated_to,
                    reason: reason.clone(),
                },
            )?;
            println!(
                "OK: {} escalated to {}",
                d.id,
                d.escalated_to_name.as_deref().unwrap_or_default()
            );
            Ok(0)
        }

        Command::Show { id, output } => {
            let d = manager.get(&parse_id(id)?)?;
            if output.json {
                println!("{}", serde_json::to_string_pretty(&d)?);
            } else {
                print_dispute(&d);
            }
            Ok(0)
        }

        Command::List {
            consultant,
            status,
            output,
        } => {
            let mut disputes = match consultant {
                Some(c) => manager.list_for_consultant(&ConsultantId::new(c.as_str())?)?,
                None => manager.list()?,
            };
            if let Some(status) = status {
                disputes.retain(|d| d.status == *status);
            }
            if output.json {
                println!("{}", serde_json::to_string_pretty(&disputes)?);
            } else if disputes.is_empty() {
                println!("No disputes.");
            } else {
                for d in &disputes {
                    println!("{}", list_row(d));
                }
            }
            Ok(0)
        }

        Command::Stats { consultant, output } => {
            let consultant = consultant
                .as_deref()
                .map(ConsultantId::new)
                .transpose()?;
            let stats = manager.stats(consultant.as_ref())?;
            if output.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
            Ok(0)
        }

        Command::Sla { output } => {
            let alerts = manager.sla_alerts()?;
            if output.json {
                println!("{}", serde_json::to_string_pretty(&alerts)?);
            } else if alerts.is_empty() {
                println!("OK: no SLA alerts");
            } else {
                for alert in &alerts {
                    let reasons: Vec<&str> = alert.reasons.iter().map(|r| r.as_str()).collect();
                    println!(
                        "{}  {:<12}  {:>3}d  {}",
                        alert.dispute_id,
                        alert.status,
                        alert.age_days,
                        reasons.join(", ")
                    );
                }
            }
            Ok(0)
        }

        Command::Verify { id: Some(id) } => {
            let id = parse_id(id)?;
            manager.verify(&id)?;
            println!("OK: audit chain of {id} verified");
            Ok(0)
        }

        Command::Verify { id: None } => {
            let failures = manager.verify_all()?;
            if failures.is_empty() {
                println!("OK: all audit chains verified");
                return Ok(0);
            }
            for (id, error) in &failures {
                println!("FAIL: {id}: {error}");
            }
            Ok(1)
        }
    }
}

fn mutate(session: &Session, target: &Target, command: DisputeCommand) -> Result<CommissionDispute> {
    let id = parse_id(&target.id)?;
    let name = command.name();
    let actor = session.actor()?;
    session
        .manager()
        .execute(&id, command, actor, target.expect_version)
        .with_context(|| format!("{name} failed for {id}"))
}

fn parse_id(raw: &str) -> Result<DisputeId> {
    DisputeId::parse(raw).with_context(|| format!("invalid dispute id \"{raw}\""))
}

/// An actor from a user id and optional display name.
pub fn named_actor(id: &str, name: Option<&str>) -> Result<Actor> {
    Ok(Actor::new(id, name.unwrap_or(id))?)
}

fn list_row(d: &CommissionDispute) -> String {
    format!(
        "{}  {:<12}  {:<16}  disputed {:>10}  v{}{}",
        d.id,
        d.status,
        d.consultant_id,
        d.disputed_amount,
        d.version,
        if d.sla_breached { "  SLA BREACHED" } else { "" }
    )
}

fn print_dispute(d: &CommissionDispute) {
    println!("Dispute: {}", d.id);
    println!("  Consultant: {}", d.consultant_id);
    println!("  Status: {}", d.status);
    println!("  Version: {}", d.version);
    println!("  Filed: {} by {}", d.filed_date, d.filed_by_name);
    println!("  Reason: {}", d.reason);
    println!(
        "  Disputed: {}  Expected: {}",
        d.disputed_amount, d.expected_amount
    );
    if let (Some(name), Some(at)) = (&d.assigned_to_name, d.assigned_date) {
        println!("  Assigned: {name} since {at}");
    }
    if let (Some(name), Some(at)) = (&d.escalated_to_name, d.escalated_date) {
        println!(
            "  Escalated: {name} on {at} ({})",
            d.escalation_reason.as_deref().unwrap_or_default()
        );
    }
    if let (Some(resolution), Some(at)) = (d.resolution, d.resolved_date) {
        println!("  Resolution: {resolution} on {at}");
        if let Some(amount) = d.approved_amount {
            println!("  Approved: {amount}");
        }
    }
    println!("  SLA breached: {}", d.sla_breached);
    println!("  Evidence: {}", d.evidence.len());
    println!("  Comments: {}", d.comments.len());
    println!("  Audit trail: {}", d.audit_trail.len());
    for (i, entry) in d.audit_trail.iter().enumerate() {
        let change = match (&entry.record.previous_value, &entry.record.new_value) {
            (Some(from), Some(to)) => format!(" ({from} → {to})"),
            _ => String::new(),
        };
        println!(
            "    [{i}] {} by {} at {}{change}",
            entry.action(),
            entry.record.user_name,
            entry.timestamp()
        );
    }
}

fn print_stats(stats: &DisputeStats) {
    println!("Disputes: {}", stats.total);
    for status in DisputeStatus::all() {
        println!("  {:<12} {}", status.as_str(), stats.by_status.get(*status));
    }
    println!("Total disputed: {}", stats.total_disputed);
    println!("Total approved: {}", stats.total_approved);
    println!("SLA breached: {}", stats.sla_breached);
    println!("Average resolution: {} day(s)", stats.average_resolution_days);
}
