//! # Chain Resolver
//!
//! A search returns every card ever published for an identity, unordered.
//! Resolution links each card to its in-batch predecessor and marks every
//! predecessor outdated, leaving only chain heads as current.
//!
//! Links are indices into the batch, recomputed on every resolution and
//! never stored on the cards themselves. One pass builds the id index, one
//! pass links: O(n).
//!
//! Edge cases:
//! - A predecessor outside the batch leaves the card a head.
//! - Two cards superseding the same card (a fork) are both heads.
//! - A card naming itself as predecessor is not linked and stays a head.
//! - Repeated ids keep the first occurrence; later copies are dropped.

use std::collections::HashMap;

use cardkit_core::CardId;

use crate::model::Card;

/// One resolved search batch.
#[derive(Debug, Clone)]
pub struct ResolvedBatch {
    cards: Vec<Card>,
    previous: Vec<Option<usize>>,
    outdated: Vec<bool>,
}

/// Resolves supersession chains within a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainResolver;

impl ChainResolver {
    pub fn resolve(cards: Vec<Card>) -> ResolvedBatch {
        let mut index: HashMap<CardId, usize> = HashMap::with_capacity(cards.len());
        let mut unique = Vec::with_capacity(cards.len());
        for card in cards {
            if index.contains_key(card.id()) {
                tracing::debug!(card_id = %card.id(), "dropping duplicate card in batch");
                continue;
            }
            index.insert(card.id().clone(), unique.len());
            unique.push(card);
        }

        let mut previous = vec![None; unique.len()];
        let mut outdated = vec![false; unique.len()];
        for (i, card) in unique.iter().enumerate() {
            let Some(prev_id) = card.previous_card_id() else {
                continue;
            };
            match index.get(prev_id) {
                Some(&j) if j != i => {
                    previous[i] = Some(j);
                    outdated[j] = true;
                }
                Some(_) => {
                    tracing::debug!(card_id = %card.id(), "card names itself as predecessor");
                }
                None => {}
            }
        }

        ResolvedBatch {
            cards: unique,
            previous,
            outdated,
        }
    }
}

impl ResolvedBatch {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All cards in the batch, in input order with duplicates removed.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn index_of(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id() == id)
    }

    /// The in-batch card that card `i` supersedes.
    pub fn previous_card(&self, i: usize) -> Option<&Card> {
        self.previous
            .get(i)
            .copied()
            .flatten()
            .map(|j| &self.cards[j])
    }

    /// True iff some other card in the batch supersedes card `i`.
    pub fn is_outdated(&self, i: usize) -> bool {
        self.outdated.get(i).copied().unwrap_or(false)
    }

    /// Cards no other card in the batch supersedes, in input order.
    pub fn heads(&self) -> Vec<&Card> {
        self.cards
            .iter()
            .zip(&self.outdated)
            .filter(|(_, outdated)| !**outdated)
            .map(|(card, _)| card)
            .collect()
    }

    pub fn into_heads(self) -> Vec<Card> {
        self.cards
            .into_iter()
            .zip(self.outdated)
            .filter(|(_, outdated)| !outdated)
            .map(|(card, _)| card)
            .collect()
    }
}
