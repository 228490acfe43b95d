//! Team formation engine
//!
//! A formation pass orders a snapshot, then repeatedly extracts the
//! lowest-scoring `team_size` combination from what remains until fewer than
//! `team_size` participants are left. Each extraction scores at most
//! `max_candidates_per_team` combinations, so the work per team is bounded by
//! the budget rather than by the pool size.

use crate::clock::Clock;
use crate::config::formation::{DuplicatePolicy, FormationConfig};
use crate::error::{MatchmakingError, Result};
use crate::formation::combinations::{combination_count, Combinations};
use crate::formation::ordering::order_for_formation;
use crate::formation::scoring::{TeamScorer, WeightedTeamScorer};
use crate::types::{FormationOutcome, Participant, Team};
use crate::utils::generate_pass_id;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of selecting a single team from the remaining participants
#[derive(Debug, Clone, PartialEq)]
struct Selection {
    /// Ascending indices into the remaining participants
    indices: Vec<usize>,
    score: Option<f64>,
    candidates_evaluated: usize,
}

/// Engine that runs formation passes over pool snapshots
///
/// The engine owns no participant state; every pass works on the snapshot it
/// is given and returns its decisions for the caller to apply.
pub struct TeamFormationEngine {
    config: FormationConfig,
    clock: Arc<dyn Clock>,
    scorer: Arc<dyn TeamScorer>,
}

impl TeamFormationEngine {
    /// Create an engine using the weighted scorer from `config.scoring`
    pub fn new(config: FormationConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let scorer = Arc::new(WeightedTeamScorer::new(config.scoring));
        Self::with_scorer(config, clock, scorer)
    }

    /// Create an engine with a custom scorer
    pub fn with_scorer(
        config: FormationConfig,
        clock: Arc<dyn Clock>,
        scorer: Arc<dyn TeamScorer>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            clock,
            scorer,
        })
    }

    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Run one formation pass over `snapshot`
    pub fn form_teams(&self, snapshot: Vec<Participant>) -> Result<FormationOutcome> {
        run_pass(snapshot, &self.config, &*self.clock, &*self.scorer)
    }
}

/// Run one formation pass with the default weighted scorer
///
/// Fails with `MatchmakingError::InvalidConfiguration` before doing any work
/// when `config` is invalid.
pub fn form_teams(
    participants: Vec<Participant>,
    config: &FormationConfig,
    clock: &dyn Clock,
) -> Result<FormationOutcome> {
    config.validate()?;
    let scorer = WeightedTeamScorer::new(config.scoring);
    run_pass(participants, config, clock, &scorer)
}

fn run_pass(
    snapshot: Vec<Participant>,
    config: &FormationConfig,
    clock: &dyn Clock,
    scorer: &dyn TeamScorer,
) -> Result<FormationOutcome> {
    let pass_id = generate_pass_id();
    let snapshot_size = snapshot.len();
    let (mut remaining, duplicates_dropped) = deduplicate(snapshot, config.duplicate_policy)?;

    // One instant for the whole pass keeps ordering and scoring consistent
    let now = clock.now();
    order_for_formation(&mut remaining, now);

    let team_size = config.team_size;
    let budget = config.max_candidates_per_team;
    let mut teams = Vec::with_capacity(remaining.len() / team_size);

    while remaining.len() >= team_size {
        debug!(
            "Pass {} selecting team {} from {} participants ({} combinations, budget {})",
            pass_id,
            teams.len() + 1,
            remaining.len(),
            combination_count(remaining.len(), team_size),
            budget
        );

        let selection = select_team(&remaining, team_size, budget, scorer, now);
        let (members, rest) = split_selected(remaining, &selection.indices);
        remaining = rest;

        let team = Team {
            members,
            score: selection.score,
            candidates_evaluated: selection.candidates_evaluated,
        };
        debug!(
            "Pass {} formed team {:?} - score: {:?}, skill spread: {}, latency spread: {}ms",
            pass_id,
            team.member_ids(),
            team.score,
            team.skill_spread(),
            team.latency_spread()
        );
        teams.push(team);
    }

    info!(
        "Formation pass {} complete - snapshot: {}, teams: {}, residual: {}, duplicates dropped: {}",
        pass_id,
        snapshot_size,
        teams.len(),
        remaining.len(),
        duplicates_dropped
    );

    Ok(FormationOutcome {
        pass_id,
        teams,
        residual: remaining,
        duplicates_dropped,
    })
}

/// Apply the duplicate-identity policy to a snapshot
fn deduplicate(
    snapshot: Vec<Participant>,
    policy: DuplicatePolicy,
) -> Result<(Vec<Participant>, usize)> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    let mut unique = Vec::with_capacity(snapshot.len());
    let mut dropped = 0;

    for participant in snapshot {
        if seen.contains(&participant.id) {
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(MatchmakingError::DuplicateIdentity {
                        participant_id: participant.id,
                    }
                    .into());
                }
                DuplicatePolicy::Deduplicate => {
                    warn!(
                        "Dropping duplicate snapshot entry for participant '{}'",
                        participant.id
                    );
                    dropped += 1;
                    continue;
                }
            }
        }
        seen.insert(participant.id.clone());
        unique.push(participant);
    }

    Ok((unique, dropped))
}

/// Pick the lowest-scoring combination among the first `budget` candidates
///
/// Ties keep the earliest candidate in enumeration order. If nothing could be
/// scored the first `team_size` participants are taken as-is.
fn select_team(
    remaining: &[Participant],
    team_size: usize,
    budget: usize,
    scorer: &dyn TeamScorer,
    now: DateTime<Utc>,
) -> Selection {
    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut candidates_evaluated = 0;

    for candidate in Combinations::new(remaining.len(), team_size).take(budget) {
        let members: Vec<&Participant> = candidate.iter().map(|&i| &remaining[i]).collect();
        let score = scorer.score(&members, now);
        candidates_evaluated += 1;

        let improves = match &best {
            Some((_, best_score)) => score < *best_score,
            None => !score.is_nan(),
        };
        if improves {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((indices, score)) => Selection {
            indices,
            score: Some(score),
            candidates_evaluated,
        },
        None => {
            warn!(
                "No candidate scored after {} evaluations, falling back to the first {} participants",
                candidates_evaluated, team_size
            );
            Selection {
                indices: (0..team_size.min(remaining.len())).collect(),
                score: None,
                candidates_evaluated,
            }
        }
    }
}

/// Split `participants` into the selected members and the rest, both in original order
fn split_selected(
    participants: Vec<Participant>,
    indices: &[usize],
) -> (Vec<Participant>, Vec<Participant>) {
    let mut selected = Vec::with_capacity(indices.len());
    let mut rest = Vec::with_capacity(participants.len().saturating_sub(indices.len()));
    let mut chosen = indices.iter().copied().peekable();

    for (index, participant) in participants.into_iter().enumerate() {
        if chosen.peek() == Some(&index) {
            chosen.next();
            selected.push(participant);
        } else {
            rest.push(participant);
        }
    }

    (selected, rest)
}
