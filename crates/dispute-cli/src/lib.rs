//! # dispute-cli: Commission Dispute Ledger CLI
//!
//! Provides the `disputes` command-line interface over a local
//! [`FileStore`](dispute_store::FileStore).
//!
//! ## Subcommands
//!
//! - `disputes file`: File a new dispute.
//! - `disputes assign | status | evidence | comment`: Work a dispute.
//! - `disputes resolve | reject | escalate`: Close or hand off a dispute.
//! - `disputes show | list | stats | sla`: Read-side reports.
//! - `disputes verify`: Check audit hash chains.
//!
//! ```bash
//! disputes --user hr-1 file --consultant c-12 --reason "Fee not credited" \
//!     --disputed 5000 --expected 6000
//! disputes --user agent-7 assign dispute:<uuid> --to agent-7
//! disputes stats --json
//! ```
//!
//! ## Exit Codes
//!
//! `0` on success, `1` when the ledger refuses the request (unknown id,
//! invalid input, illegal transition, stale version, broken audit chain),
//! `2` for operational failures such as I/O or configuration errors.

pub mod commands;
pub mod config;

use dispute_core::ValidationError;
use dispute_lifecycle::DisputeError;

/// Exit code for a request the ledger refused.
pub const EXIT_REJECTED: u8 = 1;

/// Exit code for an operational failure.
pub const EXIT_FAILURE: u8 = 2;

/// Map an error to the process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    let rejected = err.chain().any(|cause| {
        cause
            .downcast_ref::<DisputeError>()
            .is_some_and(DisputeError::is_rejection)
            || cause.downcast_ref::<ValidationError>().is_some()
    });
    if rejected {
        EXIT_REJECTED
    } else {
        EXIT_FAILURE
    }
}
