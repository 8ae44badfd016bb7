use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Bootstrap, EntryPicks, Position};
use crate::wildcard::{MAX_PER_CLUB, format_cost};

pub const HIT_COST: i32 = 4;
pub const FREE_TRANSFERS_PER_WEEK: usize = 1;
pub const DEFAULT_HORIZON: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerPlayer {
    pub id: u32,
    pub web_name: String,
    pub team: String,
    pub position: Position,
    pub now_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub out: PlannerPlayer,
    pub player_in: PlannerPlayer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    NoBaseSquad,
    OutOfRange { gameweek: u32 },
    NotInSquad { name: String },
    AlreadyInSquad { name: String },
    PositionMismatch { out: Position, player_in: Position },
    ClubLimit { club: String },
    InsufficientFunds { needed: i64, bank: i64 },
    NoSuchTransfer { gameweek: u32, index: usize },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::NoBaseSquad => write!(f, "Load a manager squad first"),
            PlanError::OutOfRange { gameweek } => {
                write!(f, "GW{gameweek} is outside the planning horizon")
            }
            PlanError::NotInSquad { name } => write!(f, "{name} is not in the squad that week"),
            PlanError::AlreadyInSquad { name } => write!(f, "{name} is already in the squad"),
            PlanError::PositionMismatch { out, player_in } => write!(
                f,
                "Cannot replace a {} with a {}",
                out.short(),
                player_in.short()
            ),
            PlanError::ClubLimit { club } => {
                write!(f, "Transfer would put more than {MAX_PER_CLUB} {club} players in the squad")
            }
            PlanError::InsufficientFunds { needed, bank } => write!(
                f,
                "Transfer needs {} but the bank holds {}",
                format_cost(*needed),
                format_cost(*bank)
            ),
            PlanError::NoSuchTransfer { gameweek, index } => {
                write!(f, "No transfer #{} planned for GW{gameweek}", index + 1)
            }
        }
    }
}

impl std::error::Error for PlanError {}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanAction {
    Add {
        gameweek: u32,
        out_id: u32,
        player_in: PlannerPlayer,
    },
    Remove {
        gameweek: u32,
        index: usize,
    },
    ClearWeek(u32),
    SetHorizon(u32),
}

/// Per-gameweek transfers applied in order on top of a base squad snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub manager_id: u32,
    pub start_gameweek: u32,
    pub horizon: u32,
    /// Tenths.
    pub bank: i64,
    pub base: Vec<PlannerPlayer>,
    pub weeks: BTreeMap<u32, Vec<Transfer>>,
}

impl TransferPlan {
    pub fn new(manager_id: u32, start_gameweek: u32, bank: i64, base: Vec<PlannerPlayer>) -> Self {
        Self {
            manager_id,
            start_gameweek: start_gameweek.max(1),
            horizon: DEFAULT_HORIZON,
            bank,
            base,
            weeks: BTreeMap::new(),
        }
    }

    /// Builds the base squad from a picks snapshot resolved against bootstrap data.
    /// Picks whose element is unknown are skipped.
    pub fn from_picks(
        manager_id: u32,
        start_gameweek: u32,
        picks: &EntryPicks,
        bootstrap: &Bootstrap,
    ) -> Self {
        let mut sorted = picks.picks.clone();
        sorted.sort_by_key(|p| p.position);
        let base = sorted
            .iter()
            .filter_map(|pick| {
                let element = bootstrap.element(pick.element)?;
                let position = Position::from_code(element.element_type)?;
                Some(PlannerPlayer {
                    id: element.id,
                    web_name: element.web_name.clone(),
                    team: bootstrap
                        .team_short(element.team)
                        .unwrap_or("???")
                        .to_string(),
                    position,
                    now_cost: element.now_cost,
                })
            })
            .collect();
        Self::new(manager_id, start_gameweek, picks.entry_history.bank, base)
    }

    /// Keeps the planned weeks of `previous` on top of a refreshed base,
    /// dropping transfers the new base no longer supports.
    pub fn rebase(mut self, previous: &TransferPlan) -> (Self, usize) {
        if previous.manager_id != self.manager_id || previous.start_gameweek != self.start_gameweek
        {
            return (self, 0);
        }
        self.horizon = previous.horizon;
        self.weeks = previous.weeks.clone();
        let pruned = self.revalidate();
        (self, pruned)
    }

    pub fn last_gameweek(&self) -> u32 {
        self.start_gameweek + self.horizon.max(1) - 1
    }

    pub fn apply(&mut self, action: PlanAction) -> Result<usize, PlanError> {
        match action {
            PlanAction::Add {
                gameweek,
                out_id,
                player_in,
            } => self.add_transfer(gameweek, out_id, player_in),
            PlanAction::Remove { gameweek, index } => self.remove_transfer(gameweek, index),
            PlanAction::ClearWeek(gameweek) => {
                self.weeks.remove(&gameweek);
                Ok(self.revalidate())
            }
            PlanAction::SetHorizon(horizon) => {
                self.horizon = horizon.clamp(1, 10);
                let last = self.last_gameweek();
                let before = self.transfer_count();
                self.weeks.retain(|gw, _| *gw <= last);
                Ok(before - self.transfer_count())
            }
        }
    }

    /// Squad after every transfer up to and including `gameweek`.
    pub fn squad_for_week(&self, gameweek: u32) -> Vec<PlannerPlayer> {
        let mut squad = self.base.clone();
        for transfer in self
            .weeks
            .range(..=gameweek)
            .flat_map(|(_, transfers)| transfers.iter())
        {
            apply_transfer(&mut squad, transfer);
        }
        squad
    }

    pub fn bank_after(&self, gameweek: u32) -> i64 {
        self.bank
            + self
                .weeks
                .range(..=gameweek)
                .flat_map(|(_, transfers)| transfers.iter())
                .map(|t| t.out.now_cost as i64 - t.player_in.now_cost as i64)
                .sum::<i64>()
    }

    pub fn transfers(&self, gameweek: u32) -> &[Transfer] {
        self.weeks
            .get(&gameweek)
            .map(|t| t.as_slice())
            .unwrap_or(&[])
    }

    pub fn transfer_count(&self) -> usize {
        self.weeks.values().map(|t| t.len()).sum()
    }

    pub fn hit_cost(&self, gameweek: u32) -> i32 {
        let extra = self
            .transfers(gameweek)
            .len()
            .saturating_sub(FREE_TRANSFERS_PER_WEEK);
        extra as i32 * HIT_COST
    }

    pub fn total_hits(&self) -> i32 {
        self.weeks.keys().map(|gw| self.hit_cost(*gw)).sum()
    }

    /// Returns how many later transfers were pruned because they stopped being valid.
    pub fn add_transfer(
        &mut self,
        gameweek: u32,
        out_id: u32,
        player_in: PlannerPlayer,
    ) -> Result<usize, PlanError> {
        if self.base.is_empty() {
            return Err(PlanError::NoBaseSquad);
        }
        if gameweek < self.start_gameweek || gameweek > self.last_gameweek() {
            return Err(PlanError::OutOfRange { gameweek });
        }
        let squad = self.squad_for_week(gameweek);
        let bank = self.bank_after(gameweek);
        let out = squad
            .iter()
            .find(|p| p.id == out_id)
            .cloned()
            .ok_or_else(|| PlanError::NotInSquad {
                name: format!("Player {out_id}"),
            })?;
        let transfer = Transfer { out, player_in };
        check_transfer(&squad, bank, &transfer)?;

        self.weeks.entry(gameweek).or_default().push(transfer);
        Ok(self.revalidate())
    }

    pub fn remove_transfer(&mut self, gameweek: u32, index: usize) -> Result<usize, PlanError> {
        let Some(transfers) = self.weeks.get_mut(&gameweek) else {
            return Err(PlanError::NoSuchTransfer { gameweek, index });
        };
        if index >= transfers.len() {
            return Err(PlanError::NoSuchTransfer { gameweek, index });
        }
        transfers.remove(index);
        if transfers.is_empty() {
            self.weeks.remove(&gameweek);
        }
        Ok(self.revalidate())
    }

    /// Replays every week in order and drops transfers that no longer hold.
    pub fn revalidate(&mut self) -> usize {
        let mut squad = self.base.clone();
        let mut bank = self.bank;
        let mut pruned = 0;
        for transfers in self.weeks.values_mut() {
            transfers.retain(|transfer| match check_transfer(&squad, bank, transfer) {
                Ok(()) => {
                    bank += transfer.out.now_cost as i64 - transfer.player_in.now_cost as i64;
                    apply_transfer(&mut squad, transfer);
                    true
                }
                Err(err) => {
                    log::info!("dropping planned transfer: {err}");
                    pruned += 1;
                    false
                }
            });
        }
        self.weeks.retain(|_, transfers| !transfers.is_empty());
        pruned
    }
}

fn check_transfer(squad: &[PlannerPlayer], bank: i64, transfer: &Transfer) -> Result<(), PlanError> {
    let out = &transfer.out;
    let player_in = &transfer.player_in;
    if !squad.iter().any(|p| p.id == out.id) {
        return Err(PlanError::NotInSquad {
            name: out.web_name.clone(),
        });
    }
    if squad.iter().any(|p| p.id == player_in.id) {
        return Err(PlanError::AlreadyInSquad {
            name: player_in.web_name.clone(),
        });
    }
    if out.position != player_in.position {
        return Err(PlanError::PositionMismatch {
            out: out.position,
            player_in: player_in.position,
        });
    }
    let club_count = squad
        .iter()
        .filter(|p| p.id != out.id && p.team == player_in.team)
        .count();
    if club_count >= MAX_PER_CLUB {
        return Err(PlanError::ClubLimit {
            club: player_in.team.clone(),
        });
    }
    let needed = player_in.now_cost as i64 - out.now_cost as i64;
    if needed > bank {
        return Err(PlanError::InsufficientFunds { needed, bank });
    }
    Ok(())
}

fn apply_transfer(squad: &mut [PlannerPlayer], transfer: &Transfer) {
    if let Some(slot) = squad.iter_mut().find(|p| p.id == transfer.out.id) {
        *slot = transfer.player_in.clone();
    }
}
