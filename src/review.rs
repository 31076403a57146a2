use crate::game::{RoundRecord, Verification};
use crate::store::{ResultRecord, ResultsGateway, StoreError};
use itertools::Itertools;
use log::{info, warn};
use std::collections::HashSet;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("unknown result id {0}")]
    UnknownResult(i64),
    #[error("result {id} has no round {round}")]
    UnknownRound { id: i64, round: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An explicit reviewer decision. Unlike the initial classifier seeding this
/// can also reject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected,
}

impl From<Decision> for Verification {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Accepted => Verification::Accepted,
            Decision::Rejected => Verification::Rejected,
        }
    }
}

/// Sum of points over the accepted rounds only. Rejected and pending rounds
/// never contribute.
pub fn verified_score(rounds: &[RoundRecord]) -> f64 {
    rounds
        .iter()
        .filter(|r| r.verification == Verification::Accepted)
        .map(|r| r.points)
        .sum()
}

fn normalize_term(term: &str) -> String {
    term.trim().to_uppercase()
}

/// Splits a free-form approved-term list on newlines and commas, trims and
/// uppercases each entry. Internal whitespace stays significant, so
/// multi-word terms only match verbatim.
pub fn parse_approved_terms(raw: &str) -> HashSet<String> {
    raw.split(['\n', ','])
        .map(normalize_term)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Unique normalized terms of all not-yet-accepted rounds, sorted. This is
/// the feed for an external approval pass whose output comes back through
/// [`Reviewer::batch_verify`].
pub fn export_unverified(records: &[ResultRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.rounds.iter())
        .filter(|r| r.verification != Verification::Accepted)
        .map(|r| normalize_term(&r.term))
        .filter(|t| !t.is_empty())
        .unique()
        .sorted()
        .collect()
}

/// Dumps the results table for spreadsheet use. `verified_score` is empty
/// for never-reviewed records.
pub fn write_results_csv<W: io::Write>(
    records: &[ResultRecord],
    out: W,
) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record([
        "name",
        "student_id",
        "auto_score",
        "verified_score",
        "rounds_completed",
        "created_at",
    ])?;
    for r in records {
        w.write_record([
            r.name.clone(),
            r.student_id.clone(),
            format!("{:.1}", r.auto_score),
            r.verified_score
                .map(|s| format!("{s:.1}"))
                .unwrap_or_default(),
            r.rounds_completed.to_string(),
            r.created_at.to_rfc3339(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Records whose rounds changed and were written back.
    pub updated: usize,
    /// Records that changed but failed to persist, reported individually;
    /// one failure never rolls back or blocks the others.
    pub failures: Vec<(i64, String)>,
}

/// The review workflow over a results gateway: per-round accept/reject and
/// bulk acceptance against an approved-term list.
///
/// Mutations are applied to the latest persisted copy of a record, not the
/// cached listing, so two reviewers editing different rounds of the same
/// record serialize instead of losing updates. The cached listing is updated
/// optimistically; a failed write surfaces the error but does not revert it.
pub struct Reviewer<G: ResultsGateway> {
    gateway: G,
    results: Vec<ResultRecord>,
}

impl<G: ResultsGateway> Reviewer<G> {
    pub fn new(gateway: G) -> Result<Self, ReviewError> {
        let results = gateway.list_all()?;
        Ok(Self { gateway, results })
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    pub fn refresh(&mut self) -> Result<(), ReviewError> {
        self.results = self.gateway.list_all()?;
        Ok(())
    }

    /// Applies one reviewer decision to round `round` (1-based) of result
    /// `id` and recomputes the record's verified score over all of its
    /// rounds. Idempotent. A bad id or round index mutates nothing.
    pub fn set_verification(
        &mut self,
        id: i64,
        round: u32,
        decision: Decision,
    ) -> Result<(), ReviewError> {
        let latest = self.gateway.list_all()?;
        let mut record = latest
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(ReviewError::UnknownResult(id))?;
        let slot = record
            .rounds
            .iter_mut()
            .find(|r| r.round == round)
            .ok_or(ReviewError::UnknownRound { id, round })?;
        slot.verification = decision.into();

        let score = verified_score(&record.rounds);
        record.verified_score = Some(score);
        if let Some(cached) = self.results.iter_mut().find(|r| r.id == id) {
            *cached = record.clone();
        }

        self.gateway
            .update_verification(id, &record.rounds, score)
            .map_err(|e| {
                warn!("verification write for result {id} failed: {e}");
                e
            })?;
        Ok(())
    }

    /// Accepts every not-yet-accepted round whose normalized term is in the
    /// approved list, recomputing verified scores per changed record.
    /// Previously rejected rounds are eligible: a later approval list can
    /// retroactively flip them. Untouched records are not written.
    pub fn batch_verify(&mut self, raw: &str) -> Result<BatchReport, ReviewError> {
        let approved = parse_approved_terms(raw);
        let mut report = BatchReport::default();
        if approved.is_empty() {
            return Ok(report);
        }

        for mut record in self.gateway.list_all()? {
            let mut changed = false;
            for r in record.rounds.iter_mut() {
                if r.verification != Verification::Accepted
                    && approved.contains(&normalize_term(&r.term))
                {
                    r.verification = Verification::Accepted;
                    changed = true;
                }
            }
            if !changed {
                continue;
            }

            let score = verified_score(&record.rounds);
            record.verified_score = Some(score);
            match self.gateway.update_verification(record.id, &record.rounds, score) {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!("batch: result {} failed to persist: {e}", record.id);
                    report.failures.push((record.id, e.to_string()));
                }
            }
            if let Some(cached) = self.results.iter_mut().find(|c| c.id == record.id) {
                *cached = record;
            }
        }

        info!(
            "batch verification updated {} records ({} terms approved)",
            report.updated,
            approved.len()
        );
        Ok(report)
    }
}
