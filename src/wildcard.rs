use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{PlayerSummary, Position, SquadData, SquadDataPlayer, WildcardTeam};

/// 100.0m in tenths.
pub const DEFAULT_BUDGET: u32 = 1000;
pub const MAX_PER_CLUB: usize = 3;
pub const BENCH_SIZE: usize = 4;
pub const SQUAD_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    #[serde(rename = "3-4-3")]
    F343,
    #[serde(rename = "3-5-2")]
    F352,
    #[serde(rename = "4-3-3")]
    F433,
    #[serde(rename = "4-4-2")]
    F442,
    #[serde(rename = "4-5-1")]
    F451,
    #[serde(rename = "5-2-3")]
    F523,
    #[serde(rename = "5-3-2")]
    F532,
    #[serde(rename = "5-4-1")]
    F541,
}

impl Default for Formation {
    fn default() -> Self {
        Formation::F442
    }
}

impl Formation {
    pub const ALL: [Formation; 8] = [
        Formation::F343,
        Formation::F352,
        Formation::F433,
        Formation::F442,
        Formation::F451,
        Formation::F523,
        Formation::F532,
        Formation::F541,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Formation::F343 => "3-4-3",
            Formation::F352 => "3-5-2",
            Formation::F433 => "4-3-3",
            Formation::F442 => "4-4-2",
            Formation::F451 => "4-5-1",
            Formation::F523 => "5-2-3",
            Formation::F532 => "5-3-2",
            Formation::F541 => "5-4-1",
        }
    }

    /// (defenders, midfielders, forwards); always sums to 10.
    pub fn counts(self) -> (usize, usize, usize) {
        match self {
            Formation::F343 => (3, 4, 3),
            Formation::F352 => (3, 5, 2),
            Formation::F433 => (4, 3, 3),
            Formation::F442 => (4, 4, 2),
            Formation::F451 => (4, 5, 1),
            Formation::F523 => (5, 2, 3),
            Formation::F532 => (5, 3, 2),
            Formation::F541 => (5, 4, 1),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn from_counts(def: usize, mid: usize, fwd: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.counts() == (def, mid, fwd))
    }

    pub fn capacity(self, position: Position) -> usize {
        let (def, mid, fwd) = self.counts();
        match position {
            Position::Goalkeeper => 1,
            Position::Defender => def,
            Position::Midfielder => mid,
            Position::Forward => fwd,
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardPlayer {
    pub id: u32,
    pub web_name: String,
    pub team: String,
    #[serde(default)]
    pub team_id: Option<u32>,
    pub position: Position,
    pub now_cost: u32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub form: Option<f32>,
}

impl WildcardPlayer {
    /// None when the row has no known position or club.
    pub fn from_summary(player: &PlayerSummary) -> Option<Self> {
        let position = player.position()?;
        let team = player.team.clone().filter(|t| !t.trim().is_empty())?;
        Some(Self {
            id: player.id,
            web_name: player.display_name().to_string(),
            team,
            team_id: player.team_id,
            position,
            now_cost: player.now_cost,
            total_points: player.total_points,
            form: player.form,
        })
    }

    fn from_squad_data(player: &SquadDataPlayer) -> Option<Self> {
        let position = Position::from_code(player.element_type)?;
        Some(Self {
            id: player.id,
            web_name: player.web_name.clone(),
            team: player.team.clone().unwrap_or_default(),
            team_id: player.team_id,
            position,
            now_cost: player.now_cost,
            total_points: 0,
            form: None,
        })
    }

    fn to_squad_data(&self) -> SquadDataPlayer {
        SquadDataPlayer {
            id: self.id,
            web_name: self.web_name.clone(),
            team: Some(self.team.clone()),
            team_id: self.team_id,
            element_type: self.position.code(),
            now_cost: self.now_cost,
        }
    }

    fn same_club(&self, other: &WildcardPlayer) -> bool {
        match (self.team_id, other.team_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.team.eq_ignore_ascii_case(&other.team),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Starting(Position),
    Bench,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SquadError {
    AlreadySelected { name: String },
    PositionMismatch { slot: Position, player: Position },
    ClubLimit { club: String },
    InsufficientBudget { cost: u32, remaining: i64 },
    LineFull { slot: Slot },
    NotInSquad(u32),
    NotStarter(u32),
    NotOnBench(u32),
    InvalidSubstitution { reason: String },
    IncompleteSquad { count: usize },
    OverBudget { remaining: i64 },
}

impl fmt::Display for SquadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquadError::AlreadySelected { name } => write!(f, "{name} is already in your squad"),
            SquadError::PositionMismatch { slot, player } => write!(
                f,
                "Cannot place a {} in a {} slot",
                player.short(),
                slot.short()
            ),
            SquadError::ClubLimit { club } => {
                write!(f, "You already have {MAX_PER_CLUB} players from {club}")
            }
            SquadError::InsufficientBudget { cost, remaining } => write!(
                f,
                "Not enough budget: player costs {} but only {} remains",
                format_cost(*cost as i64),
                format_cost(*remaining)
            ),
            SquadError::LineFull { slot } => match slot {
                Slot::Starting(pos) => write!(f, "No free {} starting slot", pos.short()),
                Slot::Bench => write!(f, "Bench is full"),
            },
            SquadError::NotInSquad(id) => write!(f, "Player {id} is not in the squad"),
            SquadError::NotStarter(id) => write!(f, "Player {id} is not in the starting XI"),
            SquadError::NotOnBench(id) => write!(f, "Player {id} is not on the bench"),
            SquadError::InvalidSubstitution { reason } => write!(f, "Invalid substitution: {reason}"),
            SquadError::IncompleteSquad { count } => write!(
                f,
                "Squad must have exactly {SQUAD_SIZE} players (currently {count})"
            ),
            SquadError::OverBudget { remaining } => write!(
                f,
                "Squad is over budget by {}",
                format_cost(remaining.saturating_neg())
            ),
        }
    }
}

impl std::error::Error for SquadError {}

/// Formats tenths as `12.5m`.
pub fn format_cost(tenths: i64) -> String {
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    format!("{sign}{}.{}m", abs / 10, abs % 10)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SquadAction {
    SelectFormation(Formation),
    AddPlayer {
        slot: Position,
        player: WildcardPlayer,
        bench: bool,
    },
    RemovePlayer(u32),
    Substitute {
        bench_id: u32,
        starter_id: u32,
    },
    SetCaptain(u32),
    SetViceCaptain(u32),
    Clear,
}

/// The wildcard draft: four starting lines sized by the formation plus a bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardSquad {
    formation: Formation,
    budget: u32,
    goalkeepers: Vec<WildcardPlayer>,
    defenders: Vec<WildcardPlayer>,
    midfielders: Vec<WildcardPlayer>,
    forwards: Vec<WildcardPlayer>,
    bench: Vec<WildcardPlayer>,
    captain: Option<u32>,
    vice_captain: Option<u32>,
}

impl Default for WildcardSquad {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}

impl WildcardSquad {
    pub fn new(budget: u32) -> Self {
        Self {
            formation: Formation::default(),
            budget,
            goalkeepers: Vec::with_capacity(1),
            defenders: Vec::with_capacity(5),
            midfielders: Vec::with_capacity(5),
            forwards: Vec::with_capacity(3),
            bench: Vec::with_capacity(BENCH_SIZE),
            captain: None,
            vice_captain: None,
        }
    }

    pub fn apply(&mut self, action: SquadAction) -> Result<(), SquadError> {
        match action {
            SquadAction::SelectFormation(formation) => {
                self.select_formation(formation);
                Ok(())
            }
            SquadAction::AddPlayer {
                slot,
                player,
                bench,
            } => self.add_player(slot, player, bench),
            SquadAction::RemovePlayer(id) => {
                self.remove_player(id);
                Ok(())
            }
            SquadAction::Substitute {
                bench_id,
                starter_id,
            } => self.substitute(bench_id, starter_id),
            SquadAction::SetCaptain(id) => self.set_captain(id),
            SquadAction::SetViceCaptain(id) => self.set_vice_captain(id),
            SquadAction::Clear => {
                self.clear();
                Ok(())
            }
        }
    }

    pub fn formation(&self) -> Formation {
        self.formation
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Replaces the budget carried by a restored draft.
    pub fn set_budget(&mut self, budget: u32) {
        self.budget = budget;
    }

    pub fn captain(&self) -> Option<u32> {
        self.captain
    }

    pub fn vice_captain(&self) -> Option<u32> {
        self.vice_captain
    }

    pub fn line(&self, position: Position) -> &[WildcardPlayer] {
        match position {
            Position::Goalkeeper => &self.goalkeepers,
            Position::Defender => &self.defenders,
            Position::Midfielder => &self.midfielders,
            Position::Forward => &self.forwards,
        }
    }

    fn line_mut(&mut self, position: Position) -> &mut Vec<WildcardPlayer> {
        match position {
            Position::Goalkeeper => &mut self.goalkeepers,
            Position::Defender => &mut self.defenders,
            Position::Midfielder => &mut self.midfielders,
            Position::Forward => &mut self.forwards,
        }
    }

    pub fn bench(&self) -> &[WildcardPlayer] {
        &self.bench
    }

    pub fn starters(&self) -> impl Iterator<Item = &WildcardPlayer> {
        self.goalkeepers
            .iter()
            .chain(self.defenders.iter())
            .chain(self.midfielders.iter())
            .chain(self.forwards.iter())
    }

    /// Starters in line order, then the bench.
    pub fn players(&self) -> impl Iterator<Item = &WildcardPlayer> {
        self.starters().chain(self.bench.iter())
    }

    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.players().any(|p| p.id == id)
    }

    pub fn find(&self, id: u32) -> Option<(Slot, &WildcardPlayer)> {
        for position in Position::ALL {
            if let Some(player) = self.line(position).iter().find(|p| p.id == id) {
                return Some((Slot::Starting(position), player));
            }
        }
        self.bench
            .iter()
            .find(|p| p.id == id)
            .map(|p| (Slot::Bench, p))
    }

    pub fn total_cost(&self) -> u32 {
        self.players().map(|p| p.now_cost).sum()
    }

    pub fn remaining_budget(&self) -> i64 {
        self.budget as i64 - self.total_cost() as i64
    }

    pub fn club_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for player in self.players() {
            *counts.entry(player.team.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_complete(&self) -> bool {
        self.player_count() == SQUAD_SIZE
    }

    /// Excess starters move from the end of each line to the bench; nobody is dropped.
    pub fn select_formation(&mut self, formation: Formation) {
        let mut moved = Vec::new();
        for position in Position::ALL {
            let cap = formation.capacity(position);
            let line = self.line_mut(position);
            if line.len() > cap {
                moved.extend(line.split_off(cap));
            }
        }
        for player in &moved {
            self.clear_armband(player.id);
        }
        self.bench.extend(moved);
        self.formation = formation;
    }

    pub fn add_player(
        &mut self,
        slot: Position,
        player: WildcardPlayer,
        bench: bool,
    ) -> Result<(), SquadError> {
        if self.contains(player.id) {
            return Err(SquadError::AlreadySelected {
                name: player.web_name,
            });
        }
        if player.position != slot {
            return Err(SquadError::PositionMismatch {
                slot,
                player: player.position,
            });
        }
        let club_count = self.players().filter(|p| p.same_club(&player)).count();
        if club_count >= MAX_PER_CLUB {
            return Err(SquadError::ClubLimit { club: player.team });
        }
        let remaining = self.remaining_budget();
        if remaining < player.now_cost as i64 {
            return Err(SquadError::InsufficientBudget {
                cost: player.now_cost,
                remaining,
            });
        }

        let formation = self.formation;
        let (list, cap, target) = if bench {
            (&mut self.bench, BENCH_SIZE, Slot::Bench)
        } else {
            (
                self.line_mut(slot),
                formation.capacity(slot),
                Slot::Starting(slot),
            )
        };
        if list.len() >= cap {
            return Err(SquadError::LineFull { slot: target });
        }
        list.push(player);
        Ok(())
    }

    /// Idempotent: an absent id is a no-op.
    pub fn remove_player(&mut self, id: u32) {
        self.goalkeepers.retain(|p| p.id != id);
        self.defenders.retain(|p| p.id != id);
        self.midfielders.retain(|p| p.id != id);
        self.forwards.retain(|p| p.id != id);
        self.bench.retain(|p| p.id != id);
        self.clear_armband(id);
    }

    pub fn substitute(&mut self, bench_id: u32, starter_id: u32) -> Result<(), SquadError> {
        let bench_idx = self
            .bench
            .iter()
            .position(|p| p.id == bench_id)
            .ok_or(SquadError::NotOnBench(bench_id))?;
        let Some((Slot::Starting(out_pos), _)) = self.find(starter_id) else {
            return Err(SquadError::NotStarter(starter_id));
        };
        let in_pos = self.bench[bench_idx].position;

        if in_pos == out_pos {
            let line_idx = self
                .line(out_pos)
                .iter()
                .position(|p| p.id == starter_id)
                .ok_or(SquadError::NotStarter(starter_id))?;
            let incoming = self.bench[bench_idx].clone();
            let outgoing = std::mem::replace(&mut self.line_mut(out_pos)[line_idx], incoming);
            self.bench[bench_idx] = outgoing;
            self.clear_armband(starter_id);
            return Ok(());
        }

        if in_pos == Position::Goalkeeper || out_pos == Position::Goalkeeper {
            return Err(SquadError::InvalidSubstitution {
                reason: "goalkeepers can only swap with goalkeepers".to_string(),
            });
        }

        let mut counts = [
            self.defenders.len(),
            self.midfielders.len(),
            self.forwards.len(),
        ];
        counts[outfield_index(out_pos)] -= 1;
        counts[outfield_index(in_pos)] += 1;
        let (def, mid, fwd) = self.formation.counts();
        let fits_current = counts[0] <= def && counts[1] <= mid && counts[2] <= fwd;
        let formation = if fits_current {
            self.formation
        } else {
            Formation::from_counts(counts[0], counts[1], counts[2]).ok_or_else(|| {
                SquadError::InvalidSubstitution {
                    reason: format!(
                        "{}-{}-{} is not a valid formation",
                        counts[0], counts[1], counts[2]
                    ),
                }
            })?
        };

        let line = self.line_mut(out_pos);
        let Some(line_idx) = line.iter().position(|p| p.id == starter_id) else {
            return Err(SquadError::NotStarter(starter_id));
        };
        let starter = line.remove(line_idx);
        let incoming = std::mem::replace(&mut self.bench[bench_idx], starter);
        self.line_mut(in_pos).push(incoming);
        self.formation = formation;
        self.clear_armband(starter_id);
        Ok(())
    }

    pub fn set_captain(&mut self, id: u32) -> Result<(), SquadError> {
        self.ensure_starter(id)?;
        if self.vice_captain == Some(id) {
            self.vice_captain = self.captain;
        }
        self.captain = Some(id);
        Ok(())
    }

    pub fn set_vice_captain(&mut self, id: u32) -> Result<(), SquadError> {
        self.ensure_starter(id)?;
        if self.captain == Some(id) {
            self.captain = self.vice_captain;
        }
        self.vice_captain = Some(id);
        Ok(())
    }

    /// Empties every slot; formation and budget are kept.
    pub fn clear(&mut self) {
        self.goalkeepers.clear();
        self.defenders.clear();
        self.midfielders.clear();
        self.forwards.clear();
        self.bench.clear();
        self.captain = None;
        self.vice_captain = None;
    }

    pub fn validate_for_save(&self) -> Result<(), SquadError> {
        let count = self.player_count();
        if count != SQUAD_SIZE {
            return Err(SquadError::IncompleteSquad { count });
        }
        let remaining = self.remaining_budget();
        if remaining < 0 {
            return Err(SquadError::OverBudget { remaining });
        }
        Ok(())
    }

    pub fn to_squad_data(&self) -> SquadData {
        SquadData {
            players: self.players().map(WildcardPlayer::to_squad_data).collect(),
            formation: Some(self.formation.name().to_string()),
            captain: self.captain,
            vice_captain: self.vice_captain,
        }
    }

    /// Rebuilds a squad from a shared snapshot. Each position fills its starting
    /// line up to the formation's cap in payload order; everything else goes to
    /// the bench, even past its usual size.
    pub fn from_shared(team: &WildcardTeam, budget: u32) -> Self {
        let data = &team.squad_data;
        let formation = data
            .formation
            .as_deref()
            .and_then(Formation::from_name)
            .unwrap_or_default();
        let mut squad = Self::new(budget);
        squad.formation = formation;

        let mut buckets: BTreeMap<Position, Vec<(usize, WildcardPlayer)>> = BTreeMap::new();
        for (idx, raw) in data.players.iter().enumerate() {
            match WildcardPlayer::from_squad_data(raw) {
                Some(player) if !buckets.values().flatten().any(|(_, p)| p.id == player.id) => {
                    buckets.entry(player.position).or_default().push((idx, player));
                }
                Some(_) => log::debug!("shared squad repeats player {}", raw.id),
                None => log::warn!(
                    "shared squad player {} has unknown position {}",
                    raw.id,
                    raw.element_type
                ),
            }
        }

        let mut remainder = Vec::new();
        for (position, mut players) in buckets {
            let cap = formation.capacity(position);
            if players.len() > cap {
                remainder.extend(players.split_off(cap));
            }
            *squad.line_mut(position) = players.into_iter().map(|(_, p)| p).collect();
        }
        remainder.sort_by_key(|(idx, _)| *idx);
        squad.bench = remainder.into_iter().map(|(_, p)| p).collect();

        let captain = data
            .captain
            .filter(|id| squad.starters().any(|p| p.id == *id));
        let vice_captain = data
            .vice_captain
            .filter(|id| squad.starters().any(|p| p.id == *id) && Some(*id) != captain);
        squad.captain = captain;
        squad.vice_captain = vice_captain;
        squad
    }

    fn ensure_starter(&self, id: u32) -> Result<(), SquadError> {
        match self.find(id) {
            Some((Slot::Starting(_), _)) => Ok(()),
            Some((Slot::Bench, _)) => Err(SquadError::NotStarter(id)),
            None => Err(SquadError::NotInSquad(id)),
        }
    }

    fn clear_armband(&mut self, id: u32) {
        if self.captain == Some(id) {
            self.captain = None;
        }
        if self.vice_captain == Some(id) {
            self.vice_captain = None;
        }
    }
}

fn outfield_index(position: Position) -> usize {
    match position {
        Position::Defender => 0,
        Position::Midfielder => 1,
        _ => 2,
    }
}
