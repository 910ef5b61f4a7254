//! Battle simulator: lifecycle state machine and fixed-step loop
//!
//! Each `advance`: roster sync -> clock -> escalation -> ticks -> time limit
//! Each tick: cooldowns -> actions (home roster, then away) -> victory check

use tracing::{debug, info, warn};

use crate::battle::collaborators::{RewardLedger, SkillSystem, SynergySystem};
use crate::battle::escalation::Escalation;
use crate::battle::events::{BattleEvent, BattleEventLog, BattleEventType};
use crate::battle::movement::chase_step;
use crate::battle::resolution::{attack_cooldown, compute_damage};
use crate::battle::result::{BattleOutcome, BattleResult, BattleStats, EndReason, Reward};
use crate::battle::setup::BattleSetup;
use crate::battle::state::BattleState;
use crate::battle::targeting::find_nearest_target;
use crate::board::{BoardEvent, GridBoard, Position, Team};
use crate::core::config::BattleConfig;
use crate::core::error::{ActionError, ConfigError, PlacementError, StartError};
use crate::core::types::{Seconds, Tick, UnitId};
use crate::events::{EventBus, SubscriptionId};
use crate::unit::{CombatUnit, SharedUnit, StatKind};

/// Runs one battle at a time on the board it owns
pub struct BattleSimulator {
    config: BattleConfig,
    board: GridBoard,
    state: BattleState,
    setup: Option<BattleSetup>,

    // Rosters, in board placement order
    home: Vec<CombatUnit>,
    away: Vec<CombatUnit>,

    // Time
    elapsed: Seconds,
    accumulator: Seconds,
    tick: Tick,
    escalation: Escalation,

    // Tracking
    stats: BattleStats,
    /// Away units this battle's setup put on the board
    setup_enemies: Vec<UnitId>,
    last_result: Option<BattleResult>,

    // Collaborators
    ledger: Option<Box<dyn RewardLedger>>,
    skills: Option<Box<dyn SkillSystem>>,
    synergies: Option<Box<dyn SynergySystem>>,

    // Notifications
    listeners: EventBus<BattleEvent>,
    log: BattleEventLog,
}

/// Slack, as a fraction of one step, for float drift in tick end times
const TICK_TIME_EPSILON: Seconds = 1e-6;

impl BattleSimulator {
    pub fn new(config: BattleConfig) -> Result<Self, ConfigError> {
        let board = GridBoard::new(&config);
        Self::with_board(config, board)
    }

    /// Fails when the config would stall the loop, e.g. a zero `fixed_step`
    pub fn with_board(config: BattleConfig, board: GridBoard) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            board,
            state: BattleState::Idle,
            setup: None,
            home: Vec::new(),
            away: Vec::new(),
            elapsed: 0.0,
            accumulator: 0.0,
            tick: 0,
            escalation: Escalation::disabled(),
            stats: BattleStats::default(),
            setup_enemies: Vec::new(),
            last_result: None,
            ledger: None,
            skills: None,
            synergies: None,
            listeners: EventBus::new(),
            log: BattleEventLog::new(),
        })
    }

    // ===== COLLABORATORS =====

    pub fn set_reward_ledger<L: RewardLedger + 'static>(&mut self, ledger: L) {
        self.ledger = Some(Box::new(ledger));
    }

    pub fn set_skill_system<S: SkillSystem + 'static>(&mut self, skills: S) {
        self.skills = Some(Box::new(skills));
    }

    pub fn set_synergy_system<S: SynergySystem + 'static>(&mut self, synergies: S) {
        self.synergies = Some(Box::new(synergies));
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&BattleEvent) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn board(&self) -> &GridBoard {
        &self.board
    }

    /// Direct board access; changes reach the rosters on the next call
    pub fn board_mut(&mut self) -> &mut GridBoard {
        &mut self.board
    }

    pub fn home_roster(&self) -> &[CombatUnit] {
        &self.home
    }

    pub fn away_roster(&self) -> &[CombatUnit] {
        &self.away
    }

    pub fn combat_unit(&self, id: UnitId) -> Option<&CombatUnit> {
        self.home.iter().chain(self.away.iter()).find(|u| u.id() == id)
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn tick_count(&self) -> Tick {
        self.tick
    }

    pub fn escalation_level(&self) -> u32 {
        self.escalation.level()
    }

    pub fn active_setup(&self) -> Option<&BattleSetup> {
        self.setup.as_ref()
    }

    pub fn last_result(&self) -> Option<&BattleResult> {
        self.last_result.as_ref()
    }

    /// Events fired since the last call that returned or drained them
    pub fn drain_events(&mut self) -> BattleEventLog {
        std::mem::take(&mut self.log)
    }

    // ===== BOARD REQUESTS =====

    /// Place a unit and bring the rosters up to date immediately
    pub fn place_unit(
        &mut self,
        unit: SharedUnit,
        position: Position,
        team: Team,
    ) -> Result<(), PlacementError> {
        let result = self.board.place(unit, position, team);
        self.sync_roster();
        result
    }

    pub fn move_unit(&mut self, unit: UnitId, to: Position) -> Result<(), PlacementError> {
        let result = self.board.move_unit(unit, to);
        self.sync_roster();
        result
    }

    pub fn remove_unit(&mut self, unit: UnitId) -> Result<Position, PlacementError> {
        let result = self.board.remove(unit);
        self.sync_roster();
        result
    }

    // ===== LIFECYCLE =====

    /// Deploy the setup's enemies and start the battle
    ///
    /// Individual enemy placements may fail and are skipped. The start
    /// fails as a whole when either team ends up with nobody on the board,
    /// in which case this attempt's placements are rolled back.
    pub fn start_battle(&mut self, setup: impl Into<Option<BattleSetup>>) -> Result<(), StartError> {
        let Some(setup) = setup.into() else {
            warn!("start_battle called without a setup");
            return Err(StartError::MissingSetup);
        };

        if self.state != BattleState::Idle {
            warn!(state = ?self.state, "start_battle refused: battle already active");
            return Err(StartError::AlreadyActive(self.state));
        }

        if let Err(err) = setup.validate() {
            warn!(battle = %setup.name, "invalid battle setup: {}", err);
            return Err(err.into());
        }

        self.sync_roster();
        self.tick = 0;
        self.transition(BattleState::Preparing);

        let mut placed = Vec::new();
        for (index, (unit, position)) in setup.deployments().enumerate() {
            let Ok(id) = unit.try_borrow().map(|u| u.id()) else {
                warn!(index, "skipping enemy: unit is borrowed elsewhere");
                continue;
            };
            let already_on_board = self.board.contains(id);
            match self.board.place(unit.clone(), position, Team::Away) {
                Ok(()) => {
                    if !already_on_board {
                        placed.push(id);
                    }
                }
                Err(err) => warn!(index, unit = %id, "skipping enemy at {}: {}", position, err),
            }
        }

        let home_count = self.board.team_size(Team::Home);
        let away_count = self.board.team_size(Team::Away);
        if home_count == 0 || away_count == 0 {
            for id in placed {
                let _ = self.board.remove(id);
            }
            self.board.take_journal();
            warn!(
                battle = %setup.name,
                home = home_count,
                away = away_count,
                "battle start failed: not enough combatants"
            );
            self.transition(BattleState::Idle);
            return Err(StartError::NoCombatants {
                home: home_count,
                away: away_count,
            });
        }

        self.home = self.build_roster(Team::Home);
        self.away = self.build_roster(Team::Away);
        self.board.take_journal();
        self.notify_synergies();

        self.elapsed = 0.0;
        self.accumulator = 0.0;
        self.escalation = Escalation::new(setup.escalation);
        self.stats = BattleStats::default();
        self.setup_enemies = placed;

        info!(
            battle = %setup.name,
            home = self.home.len(),
            away = self.away.len(),
            "battle started"
        );
        self.setup = Some(setup);
        self.transition(BattleState::InProgress);
        Ok(())
    }

    /// Feed wall-clock time into the battle
    ///
    /// Runs as many fixed-step ticks as the accumulated time allows and
    /// returns every event fired during this call.
    pub fn advance(&mut self, delta_time: Seconds) -> BattleEventLog {
        if self.state != BattleState::InProgress {
            return self.drain_events();
        }

        let dt = if delta_time.is_finite() && delta_time > 0.0 {
            delta_time
        } else {
            if delta_time != 0.0 {
                warn!(delta_time, "ignoring invalid delta time");
            }
            0.0
        };

        self.sync_roster();

        let limit = self.setup.as_ref().map_or(Seconds::INFINITY, |s| s.time_limit);
        self.elapsed += dt;
        if let Some(level) = self.escalation.update(self.elapsed.min(limit)) {
            info!(level, elapsed = self.elapsed, "damage escalation raised");
            self.emit(
                BattleEventType::EscalationRaised { level },
                format!("Escalation level {}", level),
            );
        }

        let step = self.config.fixed_step;
        self.accumulator += dt;
        while self.accumulator >= step && self.state == BattleState::InProgress {
            // No tick may end past the time limit
            let tick_end = (self.tick + 1) as Seconds * step;
            if tick_end > limit + step * TICK_TIME_EPSILON {
                break;
            }
            self.run_tick();
            self.accumulator -= step;
        }

        if self.state == BattleState::InProgress && self.elapsed >= limit {
            info!(elapsed = self.elapsed, limit, "time limit reached");
            self.elapsed = limit;
            self.finalize(BattleOutcome::Draw, EndReason::TimeLimit);
        }

        self.drain_events()
    }

    /// End the running battle with a given outcome
    pub fn end_battle(&mut self, outcome: BattleOutcome) -> Option<BattleResult> {
        if self.state != BattleState::InProgress {
            return None;
        }
        self.finalize(outcome, EndReason::Decided)
    }

    /// Stop whatever is running: Draw, no reward
    ///
    /// Does nothing, and fires nothing, when already idle.
    pub fn force_end_battle(&mut self) -> Option<BattleResult> {
        match self.state {
            BattleState::Idle | BattleState::Preparing | BattleState::Ending => None,
            BattleState::InProgress => {
                info!("battle force-ended");
                self.finalize(BattleOutcome::Draw, EndReason::Forced)
            }
        }
    }

    // ===== TICK =====

    fn run_tick(&mut self) {
        self.tick += 1;
        self.stats.ticks = self.tick;
        let step = self.config.fixed_step;

        for unit in self.home.iter_mut().chain(self.away.iter_mut()) {
            unit.tick_attack_cooldown(step);
            if let Some(skills) = self.skills.as_mut() {
                skills.update_cooldowns(unit, step);
            }
        }

        for team in [Team::Home, Team::Away] {
            for index in 0..self.roster(team).len() {
                if let Err(err) = self.act(team, index) {
                    warn!(tick = self.tick, ?team, index, "unit action failed: {}", err);
                }
            }
        }

        if let Some(outcome) = self.check_victory() {
            self.finalize(outcome, EndReason::Decided);
        }
    }

    /// Target, then attack or chase
    fn act(&mut self, team: Team, index: usize) -> Result<(), ActionError> {
        let (actor_id, actor_pos, ready, range) = {
            let actor = &self.roster(team)[index];
            if !actor.is_alive() {
                return Ok(());
            }
            (
                actor.id(),
                actor.position,
                actor.can_attack(),
                actor.stat(StatKind::AttackRange)?,
            )
        };

        let opponents = self.roster(team.opponent());
        let Some((target_index, distance)) = find_nearest_target(actor_pos, opponents) else {
            return Ok(());
        };
        let target_pos = opponents[target_index].position;

        if distance as f32 <= range {
            if ready {
                self.resolve_attack(team, index, target_index)?;
            }
            return Ok(());
        }

        let Some(next) = chase_step(&self.board, actor_pos, target_pos) else {
            return Ok(());
        };
        self.board.step_unit(actor_id, next)?;
        self.roster_mut(team)[index].position = next;
        self.emit(
            BattleEventType::UnitMoved {
                unit: actor_id,
                from: actor_pos,
                to: next,
            },
            format!("{} moved {} -> {}", actor_id, actor_pos, next),
        );
        Ok(())
    }

    fn resolve_attack(
        &mut self,
        team: Team,
        index: usize,
        target_index: usize,
    ) -> Result<(), ActionError> {
        let multiplier = self.escalation.multiplier();
        let min_speed = self.config.min_attack_speed;

        let attacker = &self.roster(team)[index];
        let target = &self.roster(team.opponent())[target_index];
        let (attacker_id, target_id) = (attacker.id(), target.id());

        let attack = attacker.stat(StatKind::Attack)?;
        let speed = attacker.stat(StatKind::AttackSpeed)?;
        let defense = target.stat(StatKind::Defense)?;

        let amount = compute_damage(attack, defense, multiplier);
        let applied = target.write()?.take_damage(amount);
        let defeated = !target.is_alive();

        self.roster_mut(team)[index].attack_cooldown = attack_cooldown(speed, min_speed);

        match team {
            Team::Home => self.stats.damage_dealt += applied as i64,
            Team::Away => self.stats.damage_taken += applied as i64,
        }
        debug!(tick = self.tick, attacker = %attacker_id, target = %target_id, applied, "attack");
        self.emit(
            BattleEventType::UnitTookDamage {
                attacker: attacker_id,
                target: target_id,
                amount: applied,
            },
            format!("{} hit {} for {}", attacker_id, target_id, applied),
        );

        if defeated {
            match team {
                Team::Home => self.stats.enemies_defeated += 1,
                Team::Away => self.stats.allies_lost += 1,
            }
            self.emit(
                BattleEventType::UnitDefeated { unit: target_id },
                format!("{} was defeated", target_id),
            );
        }
        Ok(())
    }

    fn check_victory(&self) -> Option<BattleOutcome> {
        let home_alive = self.home.iter().any(|u| u.is_alive());
        let away_alive = self.away.iter().any(|u| u.is_alive());
        match (home_alive, away_alive) {
            (false, false) => Some(BattleOutcome::Draw),
            (true, false) => Some(BattleOutcome::Victory),
            (false, true) => Some(BattleOutcome::Defeat),
            (true, true) => None,
        }
    }

    // ===== FINALIZE =====

    fn finalize(&mut self, outcome: BattleOutcome, reason: EndReason) -> Option<BattleResult> {
        self.transition(BattleState::Ending);

        let forced = reason == EndReason::Forced;
        let reward = match (&self.setup, forced) {
            (Some(setup), false) => {
                Reward::for_outcome(outcome, &self.config.rewards, &setup.rewards)
            }
            _ => Reward::ZERO,
        };
        let battle_name = self
            .setup
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();

        self.distribute_experience(reward.experience);

        if reward.gold > 0 {
            if let Some(ledger) = self.ledger.as_mut() {
                ledger.add_currency(reward.gold, &format!("battle:{}", battle_name));
            }
        }

        let result = BattleResult {
            battle_name,
            outcome,
            end_reason: reason,
            duration: self.elapsed,
            was_force_ended: forced,
            reward,
            stats: self.stats,
        };
        info!(
            battle = %result.battle_name,
            outcome = ?result.outcome,
            reason = ?result.end_reason,
            duration = result.duration,
            gold = result.reward.gold,
            experience = result.reward.experience,
            "battle ended"
        );
        self.emit(
            BattleEventType::BattleEnded {
                result: result.clone(),
            },
            format!("Battle ended: {:?}", outcome),
        );

        self.home.clear();
        self.away.clear();
        self.setup = None;
        self.accumulator = 0.0;

        let enemies = std::mem::take(&mut self.setup_enemies);
        if self.config.clear_enemies_on_finalize {
            for id in enemies {
                let _ = self.board.remove(id);
            }
        }
        self.board.take_journal();
        self.notify_synergies();

        self.last_result = Some(result.clone());
        self.transition(BattleState::Idle);
        Some(result)
    }

    /// Even split among living home units; the remainder is dropped
    fn distribute_experience(&self, total: u32) {
        let survivors: Vec<&CombatUnit> = self.home.iter().filter(|u| u.is_alive()).collect();
        if total == 0 || survivors.is_empty() {
            return;
        }

        let share = total / survivors.len() as u32;
        if share == 0 {
            return;
        }
        for unit in survivors {
            match unit.write() {
                Ok(mut persistent) => persistent.add_experience(share),
                Err(err) => warn!(unit = %unit.id(), "experience not awarded: {}", err),
            }
        }
    }

    // ===== ROSTERS =====

    fn roster(&self, team: Team) -> &[CombatUnit] {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    fn roster_mut(&mut self, team: Team) -> &mut Vec<CombatUnit> {
        match team {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        }
    }

    fn build_roster(&self, team: Team) -> Vec<CombatUnit> {
        self.board
            .units_of(team)
            .iter()
            .filter_map(|id| self.combat_unit_from_board(*id))
            .collect()
    }

    fn combat_unit_from_board(&self, id: UnitId) -> Option<CombatUnit> {
        let handle = self.board.unit_handle(id)?;
        let position = self.board.position_of(id)?;
        let team = self.board.team_of(id)?;
        Some(CombatUnit::new(id, handle, team, position))
    }

    /// Apply board changes made since the last call to the rosters
    fn sync_roster(&mut self) {
        let journal = self.board.take_journal();
        if journal.is_empty() {
            return;
        }

        if self.state == BattleState::InProgress {
            for event in &journal {
                match *event {
                    BoardEvent::UnitPlaced { unit, team, .. } => {
                        if self.combat_unit(unit).is_none() {
                            if let Some(combatant) = self.combat_unit_from_board(unit) {
                                debug!(unit = %unit, ?team, "unit joined the battle");
                                self.roster_mut(team).push(combatant);
                            }
                        }
                    }
                    BoardEvent::UnitRemoved { unit, team, .. } => {
                        debug!(unit = %unit, ?team, "unit left the battle");
                        self.roster_mut(team).retain(|u| u.id() != unit);
                    }
                    BoardEvent::UnitMoved { unit, to, .. } => {
                        if let Some(combatant) = self
                            .home
                            .iter_mut()
                            .chain(self.away.iter_mut())
                            .find(|u| u.id() == unit)
                        {
                            combatant.position = to;
                        }
                    }
                    BoardEvent::BoardChanged => {}
                }
            }
        }

        self.notify_synergies();
    }

    fn notify_synergies(&mut self) {
        if let Some(synergies) = self.synergies.as_mut() {
            synergies.recalculate(&self.board);
        }
    }

    // ===== NOTIFICATIONS =====

    fn transition(&mut self, next: BattleState) {
        let from = self.state;
        if !from.can_transition_to(next) {
            warn!(?from, ?next, "unexpected battle state transition");
        }
        self.state = next;
        self.emit(
            BattleEventType::StateChanged { from, to: next },
            format!("{:?} -> {:?}", from, next),
        );
    }

    fn emit(&mut self, event_type: BattleEventType, description: String) {
        self.log.push(event_type, description, self.tick);
        if let Some(event) = self.log.events.last() {
            self.listeners.publish(event);
        }
    }
}

impl std::fmt::Debug for BattleSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleSimulator")
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("tick", &self.tick)
            .field("escalation_level", &self.escalation.level())
            .field("home", &self.home.len())
            .field("away", &self.away.len())
            .field("board", &self.board)
            .finish()
    }
}
