pub use crate::compare::{compare, CompareAxes, CompareResult, XAxis, YAxis};
pub use crate::dispatch::{
    execute, validate, BasicPayload, CalcRequest, CalcResponse, ComparePayload, Dispatcher,
    Opponent, SlotState, TtkResult,
};
pub use crate::model::{
    AttributeModifier, Boosts, CalcOpts, CombatStyle, DamageKind, Defensive, Mode, Monster,
    MonsterDefensive, MonsterInputs, Offensive, OverheadPrayer, Player, Prayer, Skills,
    SpecialAttack, Stance, TargetAttribute, Weapon,
};
pub use crate::ttk::{time_to_kill, TtkConfig, TtkDist};
pub use crate::{
    loadout_stats, AttackCalc, AttackOutcome, CalcError, CalcResult, Damage, ErrorInfo, HitDist,
    LoadoutStats, RollPair, SECONDS_PER_TICK,
};
