use crate::data::{
    Batch, BatchId, Classroom, ClassroomId, ConstraintClass, Faculty, FacultyId, PairKey,
    ScheduleError, ScheduleResult, SchedulingInput, Session, SolveOutcome, SolveReport,
    SolveStats, Subject, TimeSlot, Timetable, UnmetPair,
};
use crate::validate;
use itertools::iproduct;
use log::{debug, info, trace};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Knobs for one generation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveOptions {
    /// Keep going past an uncoverable pair instead of stopping at it.
    pub best_effort: bool,
    /// External cutoff. A run that overshoots it reports `Aborted`, which
    /// is not an infeasibility proof.
    pub deadline: Option<Instant>,
}

/// One admissible (faculty, classroom, slot) triple for a pair.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    slot: TimeSlot,
    faculty_id: FacultyId,
    classroom_id: ClassroomId,
}

/// The structurally pruned candidate variables shared by every subject of
/// one batch, in tie-break order: ascending slot, faculty id, classroom id.
struct PairCandidates {
    cands: Vec<Candidate>,
    distinct_slots: usize,
    grid_slots: usize,
    room_count: usize,
    rooms_fit: usize,
    pruned_availability: usize,
}

impl PairCandidates {
    /// Why this pair can never reach `required` sessions, when that is
    /// already decidable before search.
    fn structural_block(&self, required: usize) -> Option<ConstraintClass> {
        if self.cands.is_empty() {
            Some(if self.room_count > 0 && self.rooms_fit == 0 {
                ConstraintClass::Capacity
            } else if self.pruned_availability > 0 {
                ConstraintClass::Availability
            } else {
                ConstraintClass::Coverage
            })
        } else if self.distinct_slots < required {
            Some(
                if self.distinct_slots < self.grid_slots && self.pruned_availability > 0 {
                    ConstraintClass::Availability
                } else {
                    ConstraintClass::Coverage
                },
            )
        } else {
            None
        }
    }
}

/// In-progress assignment: occupancy indexes plus the sessions placed so
/// far. Owned by a single run; never shared.
struct SearchState {
    batch_busy: HashSet<(BatchId, TimeSlot)>,
    faculty_busy: HashSet<(FacultyId, TimeSlot)>,
    room_busy: HashSet<(ClassroomId, TimeSlot)>,
    faculty_load: HashMap<FacultyId, u32>,
    sessions: Vec<Session>,
}

impl SearchState {
    fn new() -> Self {
        Self {
            batch_busy: HashSet::new(),
            faculty_busy: HashSet::new(),
            room_busy: HashSet::new(),
            faculty_load: HashMap::new(),
            sessions: Vec::new(),
        }
    }

    /// First constraint the candidate would violate, if any. The check
    /// order fixes which class gets reported when several overlap at once.
    fn blocking_class(
        &self,
        batch_id: BatchId,
        cand: &Candidate,
        max_load: u32,
    ) -> Option<ConstraintClass> {
        if self.batch_busy.contains(&(batch_id, cand.slot)) {
            return Some(ConstraintClass::BatchExclusivity);
        }
        if self.room_busy.contains(&(cand.classroom_id, cand.slot)) {
            return Some(ConstraintClass::ClassroomExclusivity);
        }
        if self.faculty_busy.contains(&(cand.faculty_id, cand.slot)) {
            return Some(ConstraintClass::FacultyExclusivity);
        }
        if self.faculty_load.get(&cand.faculty_id).copied().unwrap_or(0) >= max_load {
            return Some(ConstraintClass::LoadCap);
        }
        None
    }

    fn place(&mut self, pair: PairKey, cand: &Candidate) {
        self.batch_busy.insert((pair.batch_id, cand.slot));
        self.faculty_busy.insert((cand.faculty_id, cand.slot));
        self.room_busy.insert((cand.classroom_id, cand.slot));
        *self.faculty_load.entry(cand.faculty_id).or_insert(0) += 1;
        self.sessions.push(Session {
            batch_id: pair.batch_id,
            subject_id: pair.subject_id,
            faculty_id: cand.faculty_id,
            classroom_id: cand.classroom_id,
            slot: cand.slot,
        });
    }

    fn unplace(&mut self, pair: PairKey, cand: &Candidate) {
        self.sessions.pop();
        self.batch_busy.remove(&(pair.batch_id, cand.slot));
        self.faculty_busy.remove(&(cand.faculty_id, cand.slot));
        self.room_busy.remove(&(cand.classroom_id, cand.slot));
        if let Some(load) = self.faculty_load.get_mut(&cand.faculty_id) {
            *load -= 1;
        }
    }
}

/// Signal that the external deadline passed mid-search.
struct SearchAborted;

/// Generates a timetable for the snapshot, or a structured failure report.
///
/// Runs referential validation first, then deterministic chronological
/// backtracking over (batch, subject) pairs in ascending id order. Given
/// identical snapshots the output is byte-identical across runs.
pub fn generate(input: &SchedulingInput, options: &SolveOptions) -> ScheduleResult<SolveReport> {
    let start_time = Instant::now();

    validate::validate_input(input).map_err(ScheduleError::InvalidReferences)?;

    let slots = input.canonical_slots();
    let mut faculties: Vec<&Faculty> = input.faculties.iter().collect();
    faculties.sort_by_key(|f| f.id);
    let mut classrooms: Vec<&Classroom> = input.classrooms.iter().collect();
    classrooms.sort_by_key(|c| c.id);
    let mut subjects: Vec<&Subject> = input.subjects.iter().collect();
    subjects.sort_by_key(|s| s.id);
    let mut batches: Vec<&Batch> = input.batches.iter().collect();
    batches.sort_by_key(|b| b.id);

    let faculty_max: HashMap<FacultyId, u32> =
        faculties.iter().map(|f| (f.id, f.max_load)).collect();

    info!(
        "Setting up search space with {} batches, {} subjects, {} faculties, {} classrooms, and {} timeslots...",
        batches.len(),
        subjects.len(),
        faculties.len(),
        classrooms.len(),
        slots.len()
    );

    // Pair work list in ascending (batch id, subject id) order. A subject
    // with no weekly demand needs no variables.
    let pairs: Vec<(PairKey, u32)> = batches
        .iter()
        .flat_map(|batch| {
            subjects
                .iter()
                .filter(|subject| subject.weekly_classes > 0)
                .map(|subject| {
                    (
                        PairKey {
                            batch_id: batch.id,
                            subject_id: subject.id,
                        },
                        subject.weekly_classes,
                    )
                })
        })
        .collect();

    // Candidate variables with capacity and availability pruned out
    // structurally; every subject of a batch shares the same space.
    let candidates_by_batch: HashMap<BatchId, PairCandidates> = batches
        .iter()
        .map(|batch| {
            (
                batch.id,
                build_candidates(batch, &slots, &faculties, &classrooms),
            )
        })
        .collect();

    let mut stats = SolveStats {
        pairs: pairs.len(),
        ..Default::default()
    };
    stats.variables = pairs
        .iter()
        .map(|(pair, _)| candidates_by_batch[&pair.batch_id].cands.len())
        .sum();
    trace!(
        "Generated {} candidate variables out of a theoretical maximum of {}.",
        stats.variables,
        pairs.len() * slots.len() * faculties.len() * classrooms.len()
    );

    info!("Starting backtracking search over {} pairs...", pairs.len());
    let mut state = SearchState::new();
    let mut unmet: Vec<UnmetPair> = Vec::new();

    for (index, (pair, required)) in pairs.iter().enumerate() {
        if past_deadline(options.deadline) {
            return Ok(aborted_report(&pairs[index..], stats, start_time));
        }

        let candidates = &candidates_by_batch[&pair.batch_id];
        let blocked = match candidates.structural_block(*required as usize) {
            Some(class) => Some(class),
            None => {
                match place_pair(
                    &mut state,
                    *pair,
                    *required as usize,
                    &candidates.cands,
                    &faculty_max,
                    options.deadline,
                    &mut stats,
                ) {
                    Ok(blocked) => blocked,
                    Err(SearchAborted) => {
                        return Ok(aborted_report(&pairs[index..], stats, start_time));
                    }
                }
            }
        };

        match blocked {
            None => {
                debug!(
                    "Pair batch={} subject={} covered with {} session(s)",
                    pair.batch_id, pair.subject_id, required
                );
            }
            Some(reason) => {
                debug!(
                    "Pair batch={} subject={} blocked by {}",
                    pair.batch_id, pair.subject_id, reason
                );
                unmet.push(UnmetPair {
                    batch_id: pair.batch_id,
                    subject_id: pair.subject_id,
                    required: *required,
                    reason,
                });
                if !options.best_effort {
                    let duration = start_time.elapsed();
                    info!("No feasible timetable found after {:.2?}", duration);
                    stats.elapsed_ms = duration.as_millis() as u64;
                    return Ok(SolveReport {
                        outcome: SolveOutcome::Infeasible { unmet },
                        stats,
                    });
                }
            }
        }
    }

    let timetable = materialize(state.sessions)?;
    let duration = start_time.elapsed();
    info!(
        "Solution found in {:.2?}: {} sessions, {} unmet pair(s)",
        duration,
        timetable.sessions.len(),
        unmet.len()
    );
    stats.elapsed_ms = duration.as_millis() as u64;

    let outcome = if unmet.is_empty() {
        SolveOutcome::Feasible { timetable }
    } else {
        SolveOutcome::PartiallyFeasible { timetable, unmet }
    };
    Ok(SolveReport { outcome, stats })
}

/// Places all required sessions of one pair, backtracking within the pair.
///
/// Combinations are enumerated by strictly increasing candidate index: a
/// candidate rejected at a shallower depth can never become admissible
/// deeper in the same pair (placements only add occupancy), so rescanning
/// below the previous index is pointless. The accepted solution set is the
/// same as with a full rescan, in the same tie-break order.
///
/// Returns `Ok(None)` when the pair is fully covered, `Ok(Some(class))`
/// with the class that blocked the last examined candidate when the whole
/// candidate space is exhausted.
fn place_pair(
    state: &mut SearchState,
    pair: PairKey,
    required: usize,
    cands: &[Candidate],
    faculty_max: &HashMap<FacultyId, u32>,
    deadline: Option<Instant>,
    stats: &mut SolveStats,
) -> Result<Option<ConstraintClass>, SearchAborted> {
    let mut chosen: Vec<usize> = Vec::with_capacity(required);
    let mut cursor = 0usize;
    let mut last_block = None;

    loop {
        if chosen.len() == required {
            return Ok(None);
        }
        if past_deadline(deadline) {
            return Err(SearchAborted);
        }

        let mut placed_at = None;
        while cursor < cands.len() {
            match state.blocking_class(pair.batch_id, &cands[cursor], faculty_max[&cands[cursor].faculty_id]) {
                None => {
                    placed_at = Some(cursor);
                    break;
                }
                Some(class) => {
                    last_block = Some(class);
                    cursor += 1;
                }
            }
        }

        match placed_at {
            Some(index) => {
                state.place(pair, &cands[index]);
                stats.placements += 1;
                chosen.push(index);
                cursor = index + 1;
            }
            None => match chosen.pop() {
                Some(index) => {
                    state.unplace(pair, &cands[index]);
                    stats.backtracks += 1;
                    trace!(
                        "Pair batch={} subject={}: backtracking past candidate {}",
                        pair.batch_id, pair.subject_id, index
                    );
                    cursor = index + 1;
                }
                None => {
                    return Ok(Some(last_block.unwrap_or(ConstraintClass::Coverage)));
                }
            },
        }
    }
}

/// Builds the pruned candidate space for one batch. `iproduct!` iterates
/// slots outermost and classrooms innermost, which yields the tie-break
/// order directly from the sorted inputs.
fn build_candidates(
    batch: &Batch,
    slots: &[TimeSlot],
    faculties: &[&Faculty],
    classrooms: &[&Classroom],
) -> PairCandidates {
    let rooms_fit = classrooms
        .iter()
        .filter(|room| room.capacity >= batch.students)
        .count();
    let mut pruned_availability = 0usize;
    let mut cands = Vec::new();

    for (slot, faculty, room) in iproduct!(slots.iter(), faculties.iter(), classrooms.iter()) {
        if room.capacity < batch.students {
            continue;
        }
        if !faculty.is_available(*slot) {
            pruned_availability += 1;
            continue;
        }
        cands.push(Candidate {
            slot: *slot,
            faculty_id: faculty.id,
            classroom_id: room.id,
        });
    }

    let distinct_slots = cands.iter().map(|c| c.slot).collect::<HashSet<_>>().len();

    PairCandidates {
        cands,
        distinct_slots,
        grid_slots: slots.len(),
        room_count: classrooms.len(),
        rooms_fit,
        pruned_availability,
    }
}

/// Converts the accepted placements into the output timetable and
/// re-checks the exclusivity invariants. A failure here is an engine bug.
fn materialize(sessions: Vec<Session>) -> ScheduleResult<Timetable> {
    let timetable = Timetable::from_sessions(sessions);
    timetable.verify()?;
    Ok(timetable)
}

fn past_deadline(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn aborted_report(
    pending_pairs: &[(PairKey, u32)],
    mut stats: SolveStats,
    start_time: Instant,
) -> SolveReport {
    let duration = start_time.elapsed();
    info!(
        "Search aborted by deadline after {:.2?} with {} pair(s) pending",
        duration,
        pending_pairs.len()
    );
    stats.elapsed_ms = duration.as_millis() as u64;
    SolveReport {
        outcome: SolveOutcome::Aborted {
            pending: pending_pairs.iter().map(|(pair, _)| *pair).collect(),
        },
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u8, period: u8) -> TimeSlot {
        TimeSlot { day, period }
    }

    fn grid(days: u8, periods: u8) -> Vec<TimeSlot> {
        let mut slots = Vec::new();
        for day in 0..days {
            for period in 0..periods {
                slots.push(ts(day, period));
            }
        }
        slots
    }

    fn faculty(id: u32, max_load: u32) -> Faculty {
        Faculty {
            id,
            name: format!("F{id}"),
            department: "CS".into(),
            availability: Vec::new(),
            max_load,
        }
    }

    fn classroom(id: u32, capacity: u32) -> Classroom {
        Classroom {
            id,
            name: format!("R{id}"),
            capacity,
            kind: "lecture".into(),
        }
    }

    fn subject(id: u32, weekly_classes: u32) -> Subject {
        Subject {
            id,
            name: format!("S{id}"),
            department: "CS".into(),
            credits: 3,
            weekly_classes,
        }
    }

    fn batch(id: u32, students: u32) -> Batch {
        Batch {
            id,
            program: format!("B{id}"),
            semester: 1,
            students,
        }
    }

    fn snapshot(
        faculties: Vec<Faculty>,
        classrooms: Vec<Classroom>,
        subjects: Vec<Subject>,
        batches: Vec<Batch>,
        slots: Vec<TimeSlot>,
    ) -> SchedulingInput {
        SchedulingInput {
            faculties,
            classrooms,
            subjects,
            batches,
            slots,
        }
    }

    fn solve(input: &SchedulingInput) -> SolveReport {
        generate(input, &SolveOptions::default()).unwrap()
    }

    fn feasible_timetable(report: SolveReport) -> Timetable {
        match report.outcome {
            SolveOutcome::Feasible { timetable } => timetable,
            other => panic!("expected feasible outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_single_pair_fills_first_free_slots() {
        let input = snapshot(
            vec![faculty(1, 5)],
            vec![classroom(1, 60)],
            vec![subject(1, 3)],
            vec![batch(1, 40)],
            grid(5, 5),
        );

        let timetable = feasible_timetable(solve(&input));
        assert_eq!(timetable.sessions.len(), 3);
        assert!(timetable
            .sessions
            .iter()
            .all(|s| s.batch_id == 1 && s.subject_id == 1 && s.faculty_id == 1));

        // Tie-break order: earliest slots first.
        let slots: Vec<TimeSlot> = timetable.sessions.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![ts(0, 0), ts(0, 1), ts(0, 2)]);
    }

    #[test]
    fn test_demand_beyond_grid_is_coverage_infeasible() {
        let input = snapshot(
            vec![faculty(1, 40)],
            vec![classroom(1, 60)],
            vec![subject(1, 30)],
            vec![batch(1, 40)],
            grid(5, 5),
        );

        match solve(&input).outcome {
            SolveOutcome::Infeasible { unmet } => {
                assert_eq!(unmet.len(), 1);
                assert_eq!((unmet[0].batch_id, unmet[0].subject_id), (1, 1));
                assert_eq!(unmet[0].required, 30);
                assert_eq!(unmet[0].reason, ConstraintClass::Coverage);
            }
            other => panic!("expected infeasible outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_room_single_slot_is_classroom_infeasible() {
        let input = snapshot(
            vec![faculty(1, 5), faculty(2, 5)],
            vec![classroom(1, 100)],
            vec![subject(1, 1)],
            vec![batch(1, 30), batch(2, 30)],
            grid(1, 1),
        );

        match solve(&input).outcome {
            SolveOutcome::Infeasible { unmet } => {
                assert_eq!(unmet.len(), 1);
                assert_eq!((unmet[0].batch_id, unmet[0].subject_id), (2, 1));
                assert_eq!(unmet[0].reason, ConstraintClass::ClassroomExclusivity);
            }
            other => panic!("expected infeasible outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_overloaded_faculty_is_load_cap_infeasible() {
        let input = snapshot(
            vec![faculty(1, 1)],
            vec![classroom(1, 100)],
            vec![subject(1, 1), subject(2, 1)],
            vec![batch(1, 30)],
            grid(1, 2),
        );

        match solve(&input).outcome {
            SolveOutcome::Infeasible { unmet } => {
                assert_eq!(unmet.len(), 1);
                assert_eq!((unmet[0].batch_id, unmet[0].subject_id), (1, 2));
                assert_eq!(unmet[0].reason, ConstraintClass::LoadCap);
            }
            other => panic!("expected infeasible outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_best_effort_keeps_covered_pairs() {
        let input = snapshot(
            vec![faculty(1, 1)],
            vec![classroom(1, 100)],
            vec![subject(1, 1), subject(2, 1)],
            vec![batch(1, 30)],
            grid(1, 2),
        );
        let options = SolveOptions {
            best_effort: true,
            deadline: None,
        };

        match generate(&input, &options).unwrap().outcome {
            SolveOutcome::PartiallyFeasible { timetable, unmet } => {
                assert_eq!(timetable.sessions.len(), 1);
                assert_eq!(timetable.sessions[0].subject_id, 1);
                assert_eq!(unmet.len(), 1);
                assert_eq!((unmet[0].batch_id, unmet[0].subject_id), (1, 2));
                assert_eq!(unmet[0].reason, ConstraintClass::LoadCap);
            }
            other => panic!("expected partially feasible outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_availability_restricts_placements() {
        let mut restricted = faculty(1, 5);
        restricted.availability = vec![ts(0, 0), ts(1, 0)];
        let input = snapshot(
            vec![restricted],
            vec![classroom(1, 60)],
            vec![subject(1, 2)],
            vec![batch(1, 40)],
            grid(5, 5),
        );

        let timetable = feasible_timetable(solve(&input));
        let slots: Vec<TimeSlot> = timetable.sessions.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![ts(0, 0), ts(1, 0)]);
    }

    #[test]
    fn test_availability_shortfall_reported_as_availability() {
        let mut restricted = faculty(1, 5);
        restricted.availability = vec![ts(0, 0), ts(1, 0)];
        let input = snapshot(
            vec![restricted],
            vec![classroom(1, 60)],
            vec![subject(1, 3)],
            vec![batch(1, 40)],
            grid(5, 5),
        );

        match solve(&input).outcome {
            SolveOutcome::Infeasible { unmet } => {
                assert_eq!(unmet[0].reason, ConstraintClass::Availability);
            }
            other => panic!("expected infeasible outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_small_rooms_are_pruned() {
        let input = snapshot(
            vec![faculty(1, 5)],
            vec![classroom(1, 10), classroom(2, 100)],
            vec![subject(1, 2)],
            vec![batch(1, 50)],
            grid(5, 5),
        );

        let timetable = feasible_timetable(solve(&input));
        assert!(timetable.sessions.iter().all(|s| s.classroom_id == 2));
    }

    #[test]
    fn test_no_room_fits_is_capacity_infeasible() {
        let input = snapshot(
            vec![faculty(1, 5)],
            vec![classroom(1, 10), classroom(2, 100)],
            vec![subject(1, 1)],
            vec![batch(1, 500)],
            grid(5, 5),
        );

        match solve(&input).outcome {
            SolveOutcome::Infeasible { unmet } => {
                assert_eq!(unmet[0].reason, ConstraintClass::Capacity);
            }
            other => panic!("expected infeasible outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_backtracking_recovers_from_greedy_dead_end() {
        // Greedy would give slot (0,0) to faculty 1, leaving its load cap
        // spent and faculty 2 (only available at (0,0)) unusable for the
        // second session. Backtracking must swap the first placement.
        let mut pinned = faculty(2, 5);
        pinned.availability = vec![ts(0, 0)];
        let input = snapshot(
            vec![faculty(1, 1), pinned],
            vec![classroom(1, 100)],
            vec![subject(1, 2)],
            vec![batch(1, 30)],
            grid(1, 2),
        );

        let report = solve(&input);
        assert!(report.stats.backtracks >= 1);
        let timetable = feasible_timetable(report);
        assert_eq!(
            timetable.sessions,
            vec![
                Session {
                    batch_id: 1,
                    subject_id: 1,
                    faculty_id: 1,
                    classroom_id: 1,
                    slot: ts(0, 1),
                },
                Session {
                    batch_id: 1,
                    subject_id: 1,
                    faculty_id: 2,
                    classroom_id: 1,
                    slot: ts(0, 0),
                },
            ]
        );
    }

    #[test]
    fn test_exclusivity_and_load_respected_across_batches() {
        let input = snapshot(
            vec![faculty(1, 10), faculty(2, 10)],
            vec![classroom(1, 50), classroom(2, 100)],
            vec![subject(1, 2), subject(2, 3)],
            vec![batch(1, 40), batch(2, 80)],
            grid(5, 5),
        );

        let timetable = feasible_timetable(solve(&input));
        assert_eq!(timetable.sessions.len(), 10);

        // Coverage completeness per pair.
        for (batch_id, subject_id, required) in
            [(1, 1, 2), (1, 2, 3), (2, 1, 2), (2, 2, 3)]
        {
            let count = timetable
                .sessions
                .iter()
                .filter(|s| s.batch_id == batch_id && s.subject_id == subject_id)
                .count();
            assert_eq!(count, required, "pair ({batch_id}, {subject_id})");
        }

        // No double-booking in any slot.
        for (i, a) in timetable.sessions.iter().enumerate() {
            for b in &timetable.sessions[i + 1..] {
                if a.slot == b.slot {
                    assert_ne!(a.batch_id, b.batch_id);
                    assert_ne!(a.faculty_id, b.faculty_id);
                    assert_ne!(a.classroom_id, b.classroom_id);
                }
            }
        }

        // Capacity respected: the large batch never lands in the small room.
        assert!(timetable
            .sessions
            .iter()
            .filter(|s| s.batch_id == 2)
            .all(|s| s.classroom_id == 2));

        // Load caps respected.
        for faculty_id in [1, 2] {
            let load = timetable
                .sessions
                .iter()
                .filter(|s| s.faculty_id == faculty_id)
                .count();
            assert!(load <= 10);
        }
    }

    #[test]
    fn test_identical_snapshots_yield_identical_output() {
        let input = snapshot(
            vec![faculty(1, 10), faculty(2, 10)],
            vec![classroom(1, 50), classroom(2, 100)],
            vec![subject(1, 2), subject(2, 3)],
            vec![batch(1, 40), batch(2, 80)],
            grid(5, 5),
        );

        let first = solve(&input);
        let second = solve(&input);
        assert_eq!(first.outcome, second.outcome);
        assert_eq!(
            serde_json::to_string(&first.outcome).unwrap(),
            serde_json::to_string(&second.outcome).unwrap()
        );
    }

    #[test]
    fn test_entity_order_does_not_change_output() {
        let input = snapshot(
            vec![faculty(1, 10), faculty(2, 10)],
            vec![classroom(1, 50), classroom(2, 100)],
            vec![subject(1, 2), subject(2, 3)],
            vec![batch(1, 40), batch(2, 80)],
            grid(5, 5),
        );
        let mut shuffled = input.clone();
        shuffled.faculties.reverse();
        shuffled.classrooms.reverse();
        shuffled.subjects.reverse();
        shuffled.batches.reverse();
        shuffled.slots.reverse();

        assert_eq!(solve(&input).outcome, solve(&shuffled).outcome);
    }

    #[test]
    fn test_zero_weekly_classes_needs_no_sessions() {
        let input = snapshot(
            vec![faculty(1, 5)],
            vec![classroom(1, 60)],
            vec![subject(1, 0)],
            vec![batch(1, 40)],
            grid(5, 5),
        );

        let report = solve(&input);
        assert_eq!(report.stats.pairs, 0);
        let timetable = feasible_timetable(report);
        assert!(timetable.sessions.is_empty());
    }

    #[test]
    fn test_expired_deadline_aborts_without_infeasibility_claim() {
        let input = snapshot(
            vec![faculty(1, 5)],
            vec![classroom(1, 60)],
            vec![subject(1, 3)],
            vec![batch(1, 40)],
            grid(5, 5),
        );
        let options = SolveOptions {
            best_effort: false,
            deadline: Some(Instant::now()),
        };

        match generate(&input, &options).unwrap().outcome {
            SolveOutcome::Aborted { pending } => {
                assert_eq!(pending.len(), 1);
                assert_eq!((pending[0].batch_id, pending[0].subject_id), (1, 1));
            }
            other => panic!("expected aborted outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_fail_before_search() {
        let input = snapshot(
            vec![faculty(1, 5)],
            vec![classroom(1, 60)],
            vec![subject(1, 1)],
            vec![batch(1, 40), batch(1, 50)],
            grid(5, 5),
        );

        let err = generate(&input, &SolveOptions::default()).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidReferences(_)));
    }
}
