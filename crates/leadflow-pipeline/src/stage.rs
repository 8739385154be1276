// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Legal stage transitions.
//!
//! ```text
//! DM -> Verifier -> LQ -> MANAGER -> DONE
//!                                 \-> REJECTED
//! ```

use chrono::{DateTime, Utc};

use leadflow_core::{Lead, LeadflowError, Stage};

pub fn is_legal(from: Stage, to: Stage) -> bool {
    matches!(
        (from, to),
        (Stage::Dm, Stage::Verifier)
            | (Stage::Verifier, Stage::Lq)
            | (Stage::Lq, Stage::Manager)
            | (Stage::Manager, Stage::Done)
            | (Stage::Manager, Stage::Rejected)
    )
}

/// Moves `lead` to `to`, refusing anything off the forward path.
pub fn advance(lead: &mut Lead, to: Stage, at: DateTime<Utc>) -> Result<(), LeadflowError> {
    if !is_legal(lead.stage, to) {
        return Err(LeadflowError::PreconditionFailed(format!(
            "cannot move lead from {} to {}",
            lead.stage, to
        )));
    }
    lead.stage = to;
    lead.updated_at = at;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Stage; 6] = [
        Stage::Dm,
        Stage::Verifier,
        Stage::Lq,
        Stage::Manager,
        Stage::Rejected,
        Stage::Done,
    ];

    #[test]
    fn forward_path_only() {
        let legal: Vec<(Stage, Stage)> = ALL
            .iter()
            .flat_map(|&from| ALL.iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| is_legal(from, to))
            .collect();
        assert_eq!(legal.len(), 5);
        assert!(is_legal(Stage::Manager, Stage::Rejected));
        assert!(!is_legal(Stage::Dm, Stage::Lq));
        assert!(!is_legal(Stage::Lq, Stage::Verifier));
    }

    #[test]
    fn terminal_stages_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            assert!(ALL.iter().all(|&to| !is_legal(*from, to)));
        }
    }
}
