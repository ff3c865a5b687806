//! Location-level planning: a fleet of owned resources behind one lock, and
//! the three-step scheduling decision (commit at the requested start, report
//! the earliest in-window start, or search beyond the window).

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::combinations::all_valid_combinations;
use crate::error::{Result, ScheduleError};
use crate::finder::{SearchDirection, StartSearch};
use crate::interval::TimeInterval;
use crate::possibilities::build_possibilities;
use crate::ranking::find_earliest_slot;
use crate::resource::{BookingRecord, Resource, ResourceInfo, ResourceSpec};
use crate::run::{Run, RunId};

/// Wire encoding of "committed at the requested start".
pub const SCHEDULED_FOR_START: i64 = 0;

/// Validated construction parameters for [`Location`].
#[derive(Debug)]
pub struct LocationSpec {
    pub id: i64,
    pub name: String,
    pub location_offset: i64,
    pub resources: Vec<Resource>,
}

/// A scheduling request: the window, the work item, and enumeration caps.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub window: TimeInterval,
    pub run: Run,
    /// Caps the combination enumerator when `all_possibilities` is set;
    /// `0` means unlimited.
    pub possibilities_up_to: usize,
    /// Expand each slot into every satisfying bundle instead of only the
    /// cheapest one (affects [`Location::scheduling_options`]).
    pub all_possibilities: bool,
}

impl ScheduleRequest {
    pub fn new(window: TimeInterval, run: Run) -> Self {
        Self {
            window,
            run,
            possibilities_up_to: 0,
            all_possibilities: false,
        }
    }
}

/// Outcome of a scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedStart {
    /// Committed at the requested start; calendars were written.
    Committed,
    /// Feasible no earlier than this instant (task frame); nothing booked.
    At(i64),
    /// No feasible bundle within or beyond the window.
    Infeasible,
}

/// Response of [`Location::can_schedule`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleDecision {
    pub start: PlannedStart,
    /// Sum of per-resource run costs for the selected bundle; `0` when
    /// infeasible.
    pub cost: f32,
}

impl ScheduleDecision {
    pub fn was_scheduled(&self) -> bool {
        matches!(self.start, PlannedStart::Committed)
    }

    /// Integer encoding for wire and persisted forms:
    /// [`SCHEDULED_FOR_START`] when committed, the feasible instant when
    /// reported, the window end when infeasible.
    pub fn when_can_start(&self, window_end: i64) -> i64 {
        match self.start {
            PlannedStart::Committed => SCHEDULED_FOR_START,
            PlannedStart::At(instant) => instant,
            PlannedStart::Infeasible => window_end,
        }
    }
}

/// Raw possibilities map plus the request metadata it was built from, for
/// diagnostics and callers scoring bundles on their own objective.
#[derive(Debug, Clone)]
pub struct Possibilities {
    /// Candidate start slot (shifted frame) to the cheapest satisfying
    /// bundle for that slot.
    pub slots: BTreeMap<TimeInterval, Vec<ResourceInfo>>,
    pub resource_types_needed: Vec<u8>,
    pub needed_per_type: BTreeMap<u8, u16>,
    pub shifted_window: TimeInterval,
}

/// One feasible way to run the work item: a start, a bundle, a price.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingOption {
    /// Start instant in the task frame.
    pub when_can_start: i64,
    pub resources: Vec<ResourceInfo>,
    pub cost: f32,
}

/// Persisted form of a location: its offset and its resources' calendars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub id: i64,
    pub name: String,
    pub location_offset: i64,
    pub resources: Vec<ResourceState>,
}

/// Persisted form of one fleet member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub info: ResourceInfo,
    pub calendar: Vec<BookingRecord>,
}

/// Request context shared by the planning entry points: which fleet members
/// are candidates per needed type, the quantities, and the shifted window.
struct PlanContext {
    candidates: BTreeMap<u8, Vec<usize>>,
    needed_per_type: BTreeMap<u8, u16>,
    types_needed: Vec<u8>,
    offset_difference: i64,
    shifted_window: TimeInterval,
}

impl PlanContext {
    fn total_needed(&self) -> usize {
        self.needed_per_type
            .values()
            .map(|&quantity| quantity as usize)
            .sum()
    }
}

/// A fleet of resources at one site, sharing a wall-clock offset.
///
/// The location owns its resources outright; every calendar mutation and
/// every query-pick-commit sequence happens under one internal mutex, so
/// concurrent planners targeting the same location serialize.
#[derive(Debug)]
pub struct Location {
    id: i64,
    name: String,
    location_offset: i64,
    fleet: Mutex<Vec<Resource>>,
}

impl Location {
    pub fn new(spec: LocationSpec) -> Result<Self> {
        if spec.name.is_empty() {
            return Err(ScheduleError::validation("name", "must not be empty"));
        }

        if spec.id == 0 {
            return Err(ScheduleError::validation("location id", "must not be zero"));
        }

        if spec.resources.is_empty() {
            return Err(ScheduleError::validation(
                "resources",
                "a location needs at least one resource",
            ));
        }

        let mut seen = std::collections::BTreeSet::new();
        for resource in &spec.resources {
            if !seen.insert(resource.id()) {
                return Err(ScheduleError::validation(
                    "resources",
                    format!("duplicate resource id {}", resource.id()),
                ));
            }
        }

        Ok(Self {
            id: spec.id,
            name: spec.name,
            location_offset: spec.location_offset,
            fleet: Mutex::new(spec.resources),
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location_offset(&self) -> i64 {
        self.location_offset
    }

    fn lock_fleet(&self) -> MutexGuard<'_, Vec<Resource>> {
        self.fleet.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer "when can this run start, with which resources, at what
    /// cost?" and commit the booking when the answer is the requested
    /// start.
    ///
    /// The whole query-pick-commit sequence runs under the location lock.
    /// "No plan" is not an error: the decision comes back
    /// [`PlannedStart::Infeasible`] with cost `0`.
    pub fn can_schedule(&self, request: &ScheduleRequest) -> Result<ScheduleDecision> {
        let mut fleet = self.lock_fleet();
        let context = self.plan_context(&fleet, request)?;

        let possibilities = build_possibilities(
            &fleet,
            &context.candidates,
            &context.needed_per_type,
            &context.shifted_window,
            request.run.estimated_duration,
        );

        if let Some((earliest, selection)) = find_earliest_slot(
            &fleet,
            &possibilities,
            context.total_needed(),
            context.offset_difference,
        ) {
            let cost = self.bundle_cost(&fleet, &selection, &request.run)?;

            if earliest == request.window.time_start {
                self.commit(&mut fleet, &selection, earliest, &context, &request.run)?;

                debug!(
                    location = self.id,
                    run = request.run.id,
                    cost,
                    "committed at requested start"
                );

                return Ok(ScheduleDecision {
                    start: PlannedStart::Committed,
                    cost,
                });
            }

            debug!(
                location = self.id,
                run = request.run.id,
                earliest,
                cost,
                "feasible later within window"
            );

            return Ok(ScheduleDecision {
                start: PlannedStart::At(earliest),
                cost,
            });
        }

        trace!(
            location = self.id,
            run = request.run.id,
            "no in-window slot, searching beyond the window"
        );

        self.fallback(&mut fleet, &context, request)
    }

    /// Raw possibilities for diagnostics. Takes the lock only to clone a
    /// consistent snapshot of the fleet, then computes unlocked.
    pub fn possibilities(&self, request: &ScheduleRequest) -> Result<Possibilities> {
        let snapshot = self.lock_fleet().clone();
        let context = self.plan_context(&snapshot, request)?;

        let possibilities = build_possibilities(
            &snapshot,
            &context.candidates,
            &context.needed_per_type,
            &context.shifted_window,
            request.run.estimated_duration,
        );

        let slots = possibilities
            .into_iter()
            .map(|(slot, bundle)| {
                let infos = bundle
                    .cheapest
                    .iter()
                    .map(|&index| snapshot[index].info().clone())
                    .collect();

                (slot, infos)
            })
            .collect();

        Ok(Possibilities {
            slots,
            resource_types_needed: context.types_needed,
            needed_per_type: context.needed_per_type,
            shifted_window: context.shifted_window,
        })
    }

    /// Every feasible slot, priced, sorted by start ascending. With
    /// `all_possibilities` each slot expands into every satisfying bundle
    /// (capped by `possibilities_up_to`); otherwise only the cheapest
    /// bundle per slot is returned. Read-only: computes on a snapshot.
    pub fn scheduling_options(&self, request: &ScheduleRequest) -> Result<Vec<SchedulingOption>> {
        let snapshot = self.lock_fleet().clone();
        let context = self.plan_context(&snapshot, request)?;

        let possibilities = build_possibilities(
            &snapshot,
            &context.candidates,
            &context.needed_per_type,
            &context.shifted_window,
            request.run.estimated_duration,
        );

        let mut options = Vec::new();

        for (slot, bundle) in &possibilities {
            let when_can_start = slot.time_start - context.offset_difference;

            if request.all_possibilities {
                for combination in all_valid_combinations(
                    &snapshot,
                    &bundle.by_type,
                    &context.needed_per_type,
                    request.possibilities_up_to,
                ) {
                    let indices: Vec<usize> =
                        combination.values().flatten().copied().collect();

                    options.push(self.option_from_indices(
                        &snapshot,
                        &indices,
                        when_can_start,
                        &request.run,
                    )?);
                }
            } else {
                options.push(self.option_from_indices(
                    &snapshot,
                    &bundle.cheapest,
                    when_can_start,
                    &request.run,
                )?);
            }
        }

        options.sort_by_key(|option| option.when_can_start);

        Ok(options)
    }

    /// Book internally-generated maintenance (non-billable) on one fleet
    /// member. This is the only writer of maintenance bookings.
    pub fn add_maintenance(&self, resource_id: i64, interval: TimeInterval) -> Result<()> {
        if interval.time_start >= interval.time_end {
            return Err(ScheduleError::validation(
                "interval",
                "time start must precede time end",
            ));
        }

        let mut fleet = self.lock_fleet();

        let resource = fleet
            .iter_mut()
            .find(|resource| resource.id() == resource_id)
            .ok_or(ScheduleError::ResourceNotFound(resource_id))?;

        resource.insert_booking(interval, RunId::Maintenance)
    }

    /// Remove a committed run from every fleet member carrying it,
    /// returning how many calendars changed. A committed run goes back to
    /// unseen; scheduling it again is then possible.
    pub fn remove_run(&self, run_id: RunId) -> Result<usize> {
        let mut fleet = self.lock_fleet();
        let mut removed = 0;

        for resource in fleet.iter_mut() {
            match resource.remove_run(run_id) {
                Ok(()) => removed += 1,
                Err(ScheduleError::RunNotFound(_)) => {}
                Err(other) => return Err(other),
            }
        }

        if removed == 0 {
            return Err(ScheduleError::RunNotFound(run_id.encode()));
        }

        Ok(removed)
    }

    /// Durable form: the location offset plus every resource's calendar.
    pub fn snapshot(&self) -> LocationSnapshot {
        let fleet = self.lock_fleet();

        LocationSnapshot {
            id: self.id,
            name: self.name.clone(),
            location_offset: self.location_offset,
            resources: fleet
                .iter()
                .map(|resource| ResourceState {
                    info: resource.info().clone(),
                    calendar: resource.snapshot(),
                })
                .collect(),
        }
    }

    /// Rebuild a location from its persisted form.
    pub fn restore(snapshot: LocationSnapshot) -> Result<Self> {
        let resources = snapshot
            .resources
            .into_iter()
            .map(|state| {
                let spec = ResourceSpec {
                    id: state.info.id,
                    name: state.info.name,
                    resource_type: state.info.resource_type,
                    served_quantity: state.info.served_quantity,
                    cost_per_load_unit: state.info.cost_per_load_unit,
                };

                Resource::restore(spec, &state.calendar)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(LocationSpec {
            id: snapshot.id,
            name: snapshot.name,
            location_offset: snapshot.location_offset,
            resources,
        })
    }

    fn plan_context(&self, fleet: &[Resource], request: &ScheduleRequest) -> Result<PlanContext> {
        validate_request(request)?;

        let types_needed = request.run.needed_resource_types();
        let needed_per_type = request.run.needed_per_type();

        // Resources that cannot price the run's load unit cannot serve it
        // and are not candidates.
        let mut candidates: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
        for (index, resource) in fleet.iter().enumerate() {
            if types_needed.contains(&resource.resource_type())
                && resource
                    .info()
                    .cost_per_load_unit
                    .contains_key(&request.run.load_unit)
            {
                candidates
                    .entry(resource.resource_type())
                    .or_default()
                    .push(index);
            }
        }

        let offset_difference = request.window.seconds_offset - self.location_offset;

        let shifted_window = TimeInterval::new(
            request.window.time_start + offset_difference,
            request.window.time_end + offset_difference,
            offset_difference,
        );

        Ok(PlanContext {
            candidates,
            needed_per_type,
            types_needed,
            offset_difference,
            shifted_window,
        })
    }

    fn bundle_cost(&self, fleet: &[Resource], selection: &[usize], run: &Run) -> Result<f32> {
        let mut total = 0.0;

        for &index in selection {
            total += fleet[index].run_cost(run)?;
        }

        Ok(total)
    }

    /// Write the booking to every selected resource, all or nothing.
    fn commit(
        &self,
        fleet: &mut [Resource],
        selection: &[usize],
        start: i64,
        context: &PlanContext,
        run: &Run,
    ) -> Result<()> {
        let interval = TimeInterval::new(
            start + context.offset_difference,
            start + run.estimated_duration + context.offset_difference,
            self.location_offset,
        );
        let run_id = RunId::work(run.id)?;

        let mut written: Vec<usize> = Vec::with_capacity(selection.len());

        for &index in selection {
            if let Err(error) = fleet[index].insert_booking(interval, run_id) {
                for &undo in &written {
                    let _ = fleet[undo].remove_run(run_id);
                }

                return Err(error);
            }

            written.push(index);
        }

        Ok(())
    }

    /// No in-window slot fits: find, per candidate resource, the earliest
    /// start up to one duration past the window end; walk those instants
    /// ascending and take the first at which every type's quantity is met
    /// by the resources available by then.
    fn fallback(
        &self,
        fleet: &mut [Resource],
        context: &PlanContext,
        request: &ScheduleRequest,
    ) -> Result<ScheduleDecision> {
        let duration = request.run.estimated_duration;

        let mut earliest_by_resource: BTreeMap<usize, i64> = BTreeMap::new();
        let mut cost_by_resource: BTreeMap<usize, f32> = BTreeMap::new();

        for indices in context.candidates.values() {
            for &index in indices {
                let found = fleet[index].find_available_time(&StartSearch {
                    time_start: request.window.time_start,
                    max_start: request.window.time_end + duration,
                    duration,
                    task_offset: request.window.seconds_offset,
                    location_offset: self.location_offset,
                    direction: SearchDirection::Earliest,
                });

                if let Some(when) = found {
                    earliest_by_resource.insert(index, when);
                    cost_by_resource.insert(index, fleet[index].run_cost(&request.run)?);
                }
            }
        }

        for (&resource_type, &needed) in &context.needed_per_type {
            let responding = context
                .candidates
                .get(&resource_type)
                .map(|indices| {
                    indices
                        .iter()
                        .filter(|index| earliest_by_resource.contains_key(*index))
                        .count()
                })
                .unwrap_or_default();

            if responding < needed as usize {
                debug!(
                    location = self.id,
                    run = request.run.id,
                    resource_type,
                    "not enough resources of a needed type, no plan"
                );

                return Ok(ScheduleDecision {
                    start: PlannedStart::Infeasible,
                    cost: 0.0,
                });
            }
        }

        let mut start_times: Vec<i64> = earliest_by_resource.values().copied().collect();
        start_times.sort_unstable();
        start_times.dedup();

        for &start_time in &start_times {
            if start_time > request.window.time_end {
                break;
            }

            // Everything available by this instant, grouped by type.
            let mut available: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
            for (&index, &when) in &earliest_by_resource {
                if when <= start_time {
                    available
                        .entry(fleet[index].resource_type())
                        .or_default()
                        .push(index);
                }
            }

            let enough = context.needed_per_type.iter().all(|(resource_type, &needed)| {
                available
                    .get(resource_type)
                    .map(Vec::len)
                    .unwrap_or_default()
                    >= needed as usize
            });

            if !enough {
                continue;
            }

            let selection =
                cheapest_combination(fleet, &available, &context.needed_per_type, &cost_by_resource);

            let cost: f32 = selection
                .iter()
                .map(|index| cost_by_resource[index])
                .sum();

            if start_time == request.window.time_start {
                self.commit(fleet, &selection, start_time, context, &request.run)?;

                debug!(
                    location = self.id,
                    run = request.run.id,
                    cost,
                    "fallback committed at requested start"
                );

                return Ok(ScheduleDecision {
                    start: PlannedStart::Committed,
                    cost,
                });
            }

            debug!(
                location = self.id,
                run = request.run.id,
                start_time,
                cost,
                "fallback found a later start"
            );

            return Ok(ScheduleDecision {
                start: PlannedStart::At(start_time),
                cost,
            });
        }

        debug!(location = self.id, run = request.run.id, "no feasible plan");

        Ok(ScheduleDecision {
            start: PlannedStart::Infeasible,
            cost: 0.0,
        })
    }

    fn option_from_indices(
        &self,
        fleet: &[Resource],
        indices: &[usize],
        when_can_start: i64,
        run: &Run,
    ) -> Result<SchedulingOption> {
        let cost = self.bundle_cost(fleet, indices, run)?;

        Ok(SchedulingOption {
            when_can_start,
            resources: indices
                .iter()
                .map(|&index| fleet[index].info().clone())
                .collect(),
            cost,
        })
    }
}

fn validate_request(request: &ScheduleRequest) -> Result<()> {
    if request.window.time_start >= request.window.time_end {
        return Err(ScheduleError::validation(
            "window",
            "time start must precede time end",
        ));
    }

    if request.run.estimated_duration <= 0 {
        return Err(ScheduleError::validation(
            "estimated duration",
            "must be positive",
        ));
    }

    if request.window.duration() < request.run.estimated_duration {
        return Err(ScheduleError::validation(
            "window",
            "shorter than the run's estimated duration",
        ));
    }

    if request.run.id <= 0 {
        return Err(ScheduleError::validation("run id", "must be positive"));
    }

    if request.run.dependencies.is_empty() {
        return Err(ScheduleError::validation(
            "dependencies",
            "a run needs at least one resource requirement",
        ));
    }

    Ok(())
}

/// Per type: sort the available resources by their cached run cost and take
/// the needed quantity of cheapest ones. Capacity counts as 1 per resource.
fn cheapest_combination(
    fleet: &[Resource],
    available: &BTreeMap<u8, Vec<usize>>,
    needed_per_type: &BTreeMap<u8, u16>,
    cost_by_resource: &BTreeMap<usize, f32>,
) -> Vec<usize> {
    let mut selection = Vec::new();

    for (resource_type, &needed) in needed_per_type {
        let mut indices = available.get(resource_type).cloned().unwrap_or_default();

        indices.sort_by(|&a, &b| {
            cost_by_resource[&a]
                .partial_cmp(&cost_by_resource[&b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| fleet[a].id().cmp(&fleet[b].id()))
        });

        selection.extend(indices.into_iter().take(needed as usize));
    }

    selection
}
