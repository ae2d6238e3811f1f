//! Marble token inventories.
//!
//! Each player has an active inventory they pick shots from and a queue of
//! tokens collected during the current turn. Queued tokens only become
//! selectable at the turn boundary.

use serde::{Deserialize, Serialize};

use crate::marble::MarbleType;
use crate::player::Player;

/// Bounded, ordered list of marble tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    tokens: Vec<MarbleType>,
    capacity: usize,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            tokens: Vec::new(),
            capacity,
        }
    }

    pub fn with_tokens(tokens: impl IntoIterator<Item = MarbleType>, capacity: usize) -> Self {
        let mut inventory = Self::new(capacity);
        for token in tokens {
            inventory.append(token);
        }
        inventory
    }

    pub fn get(&self, index: usize) -> Option<MarbleType> {
        self.tokens.get(index).copied()
    }

    pub fn remove_at(&mut self, index: usize) -> Option<MarbleType> {
        (index < self.tokens.len()).then(|| self.tokens.remove(index))
    }

    /// Adds a token at the end, then evicts overflow. Returns the evicted tokens.
    pub fn append(&mut self, token: MarbleType) -> Vec<MarbleType> {
        self.tokens.push(token);
        self.evict_overflow()
    }

    /// Drops tokens until the inventory fits its capacity.
    ///
    /// Basic marbles go first, oldest first, then any non-shooter marble, and
    /// a shooter only when nothing else is left.
    pub fn evict_overflow(&mut self) -> Vec<MarbleType> {
        let mut evicted = Vec::new();
        while self.tokens.len() > self.capacity {
            let index = self
                .tokens
                .iter()
                .position(|t| *t == MarbleType::Basic)
                .or_else(|| self.tokens.iter().position(|t| t.shooter_owner().is_none()))
                .unwrap_or(0);
            evicted.push(self.tokens.remove(index));
        }
        debug_assert!(self.tokens.len() <= self.capacity);
        evicted
    }

    pub fn contains(&self, token: MarbleType) -> bool {
        self.tokens.contains(&token)
    }

    pub fn tokens(&self) -> &[MarbleType] {
        &self.tokens
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A player's active inventory plus the tokens waiting for the next turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInventory {
    pub player: Player,
    pub active: Inventory,
    pub queue: Vec<MarbleType>,
}

impl PlayerInventory {
    pub fn new(player: Player, capacity: usize) -> Self {
        Self {
            player,
            active: Inventory::new(capacity),
            queue: Vec::new(),
        }
    }

    pub fn shooter(&self) -> MarbleType {
        MarbleType::Shooter(self.player)
    }

    pub fn enqueue(&mut self, token: MarbleType) {
        self.queue.push(token);
    }

    /// Moves queued tokens into the active inventory.
    ///
    /// The player's shooter is queued first unless it is already in the
    /// inventory or queue, or `shooter_on_table` says it is still in play.
    pub fn dequeue(&mut self, shooter_on_table: bool) -> Vec<MarbleType> {
        let shooter = self.shooter();
        if !shooter_on_table && !self.active.contains(shooter) && !self.queue.contains(&shooter) {
            self.queue.push(shooter);
        }
        let mut evicted = Vec::new();
        for token in std::mem::take(&mut self.queue) {
            evicted.extend(self.active.append(token));
        }
        evicted
    }

    /// Nothing left to shoot, now or next turn.
    pub fn is_exhausted(&self) -> bool {
        self.active.is_empty() && self.queue.is_empty()
    }

    pub fn owns_token(&self, token: MarbleType) -> bool {
        self.active.contains(token) || self.queue.contains(&token)
    }
}
