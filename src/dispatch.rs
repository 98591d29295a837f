use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::JoinHandle;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compare::{compare, CompareAxes, CompareResult};
use crate::error::{CalcError, CalcResult, ErrorInfo};
use crate::model::{CalcOpts, Monster, Player};
use crate::outcome::AttackCalc;
use crate::stats::{loadout_stats, LoadoutStats};
use crate::ttk::{time_to_kill, TtkConfig, TtkDist};

/// The defending side of a request: a catalog monster, or another player
/// (PvP and reverse computations) bridged through [`Player::to_monster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opponent {
    Monster(Monster),
    Player(Player),
}

impl Opponent {
    fn as_target(&self) -> Monster {
        match self {
            Self::Monster(m) => m.clone(),
            Self::Player(p) => p.to_monster(),
        }
    }

    fn is_player(&self) -> bool {
        matches!(self, Self::Player(_))
    }
}

/// Self-contained input for basic, reverse and TTK computations. Requests
/// carry everything needed to run standalone, so they are independently
/// retriable and never depend on engine-side state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicPayload {
    pub loadouts: Vec<Player>,
    pub opponent: Opponent,
    #[serde(default)]
    pub opts: CalcOpts,
    #[serde(default)]
    pub ttk: TtkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparePayload {
    pub loadouts: Vec<Player>,
    pub opponent: Opponent,
    #[serde(default)]
    pub opts: CalcOpts,
    #[serde(default)]
    pub ttk: TtkConfig,
    pub axes: CompareAxes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalcRequest {
    ComputeBasic(BasicPayload),
    ComputeReverse(BasicPayload),
    ComputeTtk(BasicPayload),
    ComputeTtkParallel(BasicPayload),
    Compare(ComparePayload),
}

impl CalcRequest {
    fn kind(&self) -> &'static str {
        match self {
            Self::ComputeBasic(_) => "basic",
            Self::ComputeReverse(_) => "reverse",
            Self::ComputeTtk(_) => "ttk",
            Self::ComputeTtkParallel(_) => "ttk-parallel",
            Self::Compare(_) => "compare",
        }
    }
}

/// Per-loadout time-to-kill bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtkResult {
    pub name: String,
    pub dist: TtkDist,
}

/// Result payload; per-loadout failures are reported inline without
/// aborting their siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalcResponse {
    Basic(Vec<Result<LoadoutStats, ErrorInfo>>),
    Ttk(Vec<Result<TtkResult, ErrorInfo>>),
    Compare(CompareResult),
}

/// Fast structural validation, before any computation starts.
pub fn validate(request: &CalcRequest) -> CalcResult<()> {
    let (loadouts, opponent) = match request {
        CalcRequest::ComputeBasic(p)
        | CalcRequest::ComputeTtk(p)
        | CalcRequest::ComputeTtkParallel(p) => (&p.loadouts, &p.opponent),
        CalcRequest::ComputeReverse(p) => {
            if !p.opponent.is_player() {
                return Err(CalcError::InvalidRequest(
                    "reverse computation requires a player opponent".into(),
                ));
            }
            (&p.loadouts, &p.opponent)
        }
        CalcRequest::Compare(p) => (&p.loadouts, &p.opponent),
    };
    if loadouts.is_empty() {
        return Err(CalcError::InvalidRequest("no loadouts supplied".into()));
    }
    if let Opponent::Monster(m) = opponent {
        if m.skills.hp == 0 && m.inputs.current_hp.is_none() {
            return Err(CalcError::InvalidRequest(format!(
                "target {} has no hitpoints",
                m.name
            )));
        }
    }
    Ok(())
}

/// Opponents that are really players skip monster auto-scaling, exactly as
/// the PvP path always has.
fn effective_opts(opts: CalcOpts, opponent: &Opponent) -> CalcOpts {
    CalcOpts {
        disable_monster_scaling: opts.disable_monster_scaling || opponent.is_player(),
        ..opts
    }
}

fn guarded<T>(index: usize, op: impl FnOnce() -> CalcResult<T>) -> Result<T, ErrorInfo> {
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            let mut info = ErrorInfo::from(err);
            info.loadout_index.get_or_insert(index);
            Err(info)
        }
        Err(_) => Err(ErrorInfo::from(CalcError::ComputationFailed {
            loadout_index: index,
            message: "computation panicked".into(),
        })),
    }
}

fn ttk_for_loadout(
    attacker: &Player,
    target: &Monster,
    opts: CalcOpts,
    config: &TtkConfig,
) -> CalcResult<TtkResult> {
    let calc = AttackCalc::new(attacker, target, opts)?;
    let outcome = calc.build()?;
    Ok(TtkResult {
        name: attacker.name.clone(),
        dist: time_to_kill(
            &outcome.dist,
            calc.attack_speed(),
            target.starting_hp(),
            config,
        ),
    })
}

/// Runs one request to completion, synchronously. Pure: the response is a
/// function of the request alone. This is what the background worker calls.
pub fn execute(request: &CalcRequest) -> Result<CalcResponse, ErrorInfo> {
    validate(request).map_err(ErrorInfo::from)?;
    debug!(kind = request.kind(), "executing calc request");

    let response = match request {
        CalcRequest::ComputeBasic(p) => {
            let target = p.opponent.as_target();
            let opts = effective_opts(p.opts, &p.opponent);
            CalcResponse::Basic(
                p.loadouts
                    .iter()
                    .enumerate()
                    .map(|(i, attacker)| guarded(i, || loadout_stats(attacker, &target, opts)))
                    .collect(),
            )
        }
        CalcRequest::ComputeReverse(p) => {
            // Validated: the opponent is a player. Swap sides per loadout.
            let Opponent::Player(attacker) = &p.opponent else {
                unreachable!()
            };
            let opts = CalcOpts {
                disable_monster_scaling: true,
                ..p.opts
            };
            CalcResponse::Basic(
                p.loadouts
                    .iter()
                    .enumerate()
                    .map(|(i, defender)| {
                        guarded(i, || loadout_stats(attacker, &defender.to_monster(), opts))
                    })
                    .collect(),
            )
        }
        CalcRequest::ComputeTtk(p) => {
            let target = p.opponent.as_target();
            let opts = effective_opts(p.opts, &p.opponent);
            CalcResponse::Ttk(
                p.loadouts
                    .iter()
                    .enumerate()
                    .map(|(i, attacker)| {
                        guarded(i, || ttk_for_loadout(attacker, &target, opts, &p.ttk))
                    })
                    .collect(),
            )
        }
        CalcRequest::ComputeTtkParallel(p) => {
            let target = p.opponent.as_target();
            let opts = effective_opts(p.opts, &p.opponent);
            CalcResponse::Ttk(
                p.loadouts
                    .par_iter()
                    .enumerate()
                    .map(|(i, attacker)| {
                        guarded(i, || ttk_for_loadout(attacker, &target, opts, &p.ttk))
                    })
                    .collect(),
            )
        }
        CalcRequest::Compare(p) => {
            let target = p.opponent.as_target();
            let opts = effective_opts(p.opts, &p.opponent);
            CalcResponse::Compare(
                compare(&p.loadouts, &target, opts, p.axes, &p.ttk).map_err(ErrorInfo::from)?,
            )
        }
    };
    Ok(response)
}

/// Lifecycle of one logical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    AwaitingResult,
    Ready,
}

pub type Slot = u32;

#[derive(Debug)]
struct Submission {
    slot: Slot,
    generation: u64,
    request: CalcRequest,
}

#[derive(Debug)]
struct Delivery {
    slot: Slot,
    generation: u64,
    result: Result<CalcResponse, ErrorInfo>,
}

#[derive(Debug, Default)]
struct SlotEntry {
    issued: u64,
    state: SlotState,
    result: Option<Result<CalcResponse, ErrorInfo>>,
}

impl Default for SlotState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Background computation hand-off: self-contained requests in, tagged
/// responses out over channels, with at-most-one accepted result per
/// logical slot.
///
/// Each submission bumps the slot's generation counter; deliveries carrying
/// a stale generation are discarded on arrival, so a slow computation can
/// never overwrite the result of a later, faster recompute. Cancellation is
/// cooperative: a superseded request still runs to completion, only its
/// result is dropped.
#[derive(Debug)]
pub struct Dispatcher {
    tx: Option<mpsc::Sender<Submission>>,
    rx: mpsc::Receiver<Delivery>,
    slots: HashMap<Slot, SlotEntry>,
    handle: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, work_rx) = mpsc::channel::<Submission>();
        let (result_tx, rx) = mpsc::channel::<Delivery>();
        let handle = std::thread::spawn(move || {
            while let Ok(submission) = work_rx.recv() {
                let result = execute(&submission.request);
                // Receiver gone means the dispatcher is shutting down.
                if result_tx
                    .send(Delivery {
                        slot: submission.slot,
                        generation: submission.generation,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });
        Self {
            tx: Some(tx),
            rx,
            slots: HashMap::new(),
            handle: Some(handle),
        }
    }

    /// Queues a request for the slot and returns the generation it was
    /// tagged with. Any in-flight older generation for the slot will be
    /// discarded on arrival.
    pub fn submit(&mut self, slot: Slot, request: CalcRequest) -> u64 {
        let entry = self.slots.entry(slot).or_default();
        entry.issued += 1;
        entry.state = SlotState::AwaitingResult;
        let generation = entry.issued;
        debug!(slot, generation, kind = request.kind(), "submitting");
        if let Some(tx) = &self.tx {
            // Worker gone: the slot stays AwaitingResult forever; callers
            // observe it via `state`.
            let _ = tx.send(Submission {
                slot,
                generation,
                request,
            });
        }
        generation
    }

    pub fn state(&self, slot: Slot) -> SlotState {
        self.slots.get(&slot).map_or(SlotState::Idle, |e| e.state)
    }

    /// Latest accepted result for the slot, if any.
    pub fn result(&self, slot: Slot) -> Option<&Result<CalcResponse, ErrorInfo>> {
        self.slots.get(&slot).and_then(|e| e.result.as_ref())
    }

    /// Drains arrived deliveries without blocking; returns the slots whose
    /// accepted result changed.
    pub fn pump(&mut self) -> Vec<Slot> {
        let mut ready = Vec::new();
        while let Ok(delivery) = self.rx.try_recv() {
            let slot = delivery.slot;
            if self.accept(delivery) && !ready.contains(&slot) {
                ready.push(slot);
            }
        }
        ready
    }

    /// Blocks until the slot's newest generation has been delivered and
    /// accepted. Intended for tests and batch callers.
    pub fn wait(&mut self, slot: Slot) -> Option<&Result<CalcResponse, ErrorInfo>> {
        while self.state(slot) == SlotState::AwaitingResult {
            match self.rx.recv() {
                Ok(delivery) => {
                    self.accept(delivery);
                }
                Err(_) => break,
            }
        }
        self.result(slot)
    }

    /// Applies generation-ordered last-writer-wins; stale deliveries are
    /// dropped. Returns whether the delivery was accepted.
    fn accept(&mut self, delivery: Delivery) -> bool {
        let entry = self.slots.entry(delivery.slot).or_default();
        if delivery.generation < entry.issued {
            warn!(
                slot = delivery.slot,
                generation = delivery.generation,
                issued = entry.issued,
                "discarding stale delivery"
            );
            return false;
        }
        entry.result = Some(delivery.result);
        entry.state = SlotState::Ready;
        true
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Close the work channel so the worker loop exits, then join.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CombatStyle, DamageKind, Skills, Stance, Weapon};

    fn player(name: &str) -> Player {
        Player::builder()
            .name(name)
            .skills(Skills {
                atk: 80,
                str: 85,
                def: 75,
                ranged: 70,
                magic: 70,
                hp: 99,
            })
            .offensive(crate::model::Offensive {
                slash: 70,
                str: 75,
                ..Default::default()
            })
            .style(CombatStyle {
                kind: DamageKind::Slash,
                stance: Stance::Aggressive,
            })
            .weapon(Weapon::builder().name("sword").speed_ticks(4).build())
            .build()
    }

    fn monster() -> Monster {
        Monster::builder()
            .name("dummy")
            .skills(Skills {
                def: 80,
                hp: 60,
                ..Default::default()
            })
            .build()
    }

    fn basic_payload() -> BasicPayload {
        BasicPayload {
            loadouts: vec![player("a"), player("b")],
            opponent: Opponent::Monster(monster()),
            opts: CalcOpts::default(),
            ttk: TtkConfig::default(),
        }
    }

    #[test]
    fn requests_compare_by_value() {
        assert_eq!(basic_payload(), basic_payload());
        assert_eq!(basic_payload().opts, CalcOpts::default());
        assert_eq!(basic_payload().ttk, TtkConfig::default());
        assert_ne!(
            CalcRequest::ComputeBasic(basic_payload()),
            CalcRequest::ComputeTtk(basic_payload())
        );
    }

    #[test]
    fn empty_loadouts_rejected_before_compute() {
        let request = CalcRequest::ComputeBasic(BasicPayload {
            loadouts: vec![],
            ..basic_payload()
        });
        assert!(matches!(
            validate(&request),
            Err(CalcError::InvalidRequest(_))
        ));
    }

    #[test]
    fn reverse_requires_player_opponent() {
        let request = CalcRequest::ComputeReverse(basic_payload());
        assert!(validate(&request).is_err());

        let request = CalcRequest::ComputeReverse(BasicPayload {
            opponent: Opponent::Player(player("defender")),
            ..basic_payload()
        });
        assert!(validate(&request).is_ok());
    }

    #[test]
    fn basic_executes_per_loadout() {
        let response = execute(&CalcRequest::ComputeBasic(basic_payload())).unwrap();
        let CalcResponse::Basic(loadouts) = response else {
            panic!("wrong payload shape")
        };
        assert_eq!(loadouts.len(), 2);
        assert!(loadouts.iter().all(Result::is_ok));
    }

    #[test]
    fn partial_failure_keeps_siblings() {
        let mut broken = player("broken");
        broken.style.kind = DamageKind::Magic; // no spell bound
        let request = CalcRequest::ComputeBasic(BasicPayload {
            loadouts: vec![player("ok"), broken],
            ..basic_payload()
        });
        let CalcResponse::Basic(loadouts) = execute(&request).unwrap() else {
            panic!("wrong payload shape")
        };
        assert!(loadouts[0].is_ok());
        let err = loadouts[1].as_ref().unwrap_err();
        assert_eq!(err.loadout_index, Some(1));
    }

    #[test]
    fn parallel_ttk_matches_sequential() {
        let sequential = execute(&CalcRequest::ComputeTtk(basic_payload())).unwrap();
        let parallel = execute(&CalcRequest::ComputeTtkParallel(basic_payload())).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn dispatcher_roundtrip() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.state(0), SlotState::Idle);
        dispatcher.submit(0, CalcRequest::ComputeBasic(basic_payload()));
        assert_eq!(dispatcher.state(0), SlotState::AwaitingResult);
        let result = dispatcher.wait(0).unwrap();
        assert!(result.is_ok());
        assert_eq!(dispatcher.state(0), SlotState::Ready);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut dispatcher = Dispatcher::new();
        // Two rapid submissions to the same slot: only the second
        // generation may be accepted.
        let g1 = dispatcher.submit(7, CalcRequest::ComputeTtk(basic_payload()));
        let g2 = dispatcher.submit(7, CalcRequest::ComputeBasic(basic_payload()));
        assert!(g2 > g1);
        dispatcher.wait(7);
        let accepted = dispatcher.result(7).unwrap().as_ref().unwrap();
        assert!(matches!(accepted, CalcResponse::Basic(_)));
    }
}
