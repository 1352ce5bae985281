//! The interactive assembly session.
//!
//! Lifecycle: `Initializing → Active → Finalized` (or `Cancelled` /
//! `TimedOut`, terminal with no serial produced). Initialization runs a
//! preliminary scan that hides slots with no candidate parts and
//! auto-selects slots with exactly one. While active, the session holds
//! per-slot selections and answers slot-status queries; `finalize` emits
//! the component string in the family's fixed order and encodes it.
//!
//! Changing one slot never re-validates other already-stored selections;
//! legality is recomputed per status query and at validation time.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::{debug, info};

use gearforge_codec::{build_component_string, CodecClient, CodecTransport, FamilyFormat};
use gearforge_core::{BalanceRecord, Part, PartCatalog, TagAggregate};
use gearforge_rules::{slot_status, GlobalTagRule, PartStatus, SlotRules};

use crate::error::SessionError;

const DEFAULT_LEVEL: u32 = 50;
const MAX_LEVEL: u32 = 50;

/// Lifecycle state. Terminal states permit no further mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Finalized,
    Cancelled,
    TimedOut,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self != SessionState::Active
    }
}

/// One user's in-progress item build.
///
/// A session owns its selection map outright; the caller serializes
/// interactions per session.
#[derive(Debug)]
pub struct AssemblySession {
    balance: BalanceRecord,
    rules: SlotRules,
    global_rules: Vec<GlobalTagRule>,
    format: FamilyFormat,
    active_slots: Vec<String>,
    selections: HashMap<String, Vec<Part>>,
    cursor: usize,
    level: u32,
    state: SessionState,
}

impl AssemblySession {
    /// Starts an interactive session: runs the preliminary scan, hides
    /// structurally-empty slots, and auto-selects single-candidate slots.
    pub async fn initialize(
        balance: BalanceRecord,
        catalog: &dyn PartCatalog,
    ) -> Result<Self, SessionError> {
        Self::build(balance, catalog, true).await
    }

    /// Builds a trial session for validating an existing item: same scan,
    /// but nothing is auto-selected.
    pub async fn trial(
        balance: BalanceRecord,
        catalog: &dyn PartCatalog,
    ) -> Result<Self, SessionError> {
        Self::build(balance, catalog, false).await
    }

    async fn build(
        balance: BalanceRecord,
        catalog: &dyn PartCatalog,
        auto_select: bool,
    ) -> Result<Self, SessionError> {
        let rules = SlotRules::from_json(&balance.slot_rules);
        let global_rules = GlobalTagRule::load_all(&balance.tag_rules);
        let format = FamilyFormat::generic(balance.slot_order.clone());

        let census = catalog
            .slot_census(&balance.item_type, &balance.parent_type)
            .await?;
        let mut session = AssemblySession {
            active_slots: Vec::new(),
            selections: balance
                .slot_order
                .iter()
                .map(|s| (s.clone(), Vec::new()))
                .collect(),
            cursor: 0,
            level: DEFAULT_LEVEL,
            state: SessionState::Active,
            balance,
            rules,
            global_rules,
            format,
        };

        let mut buildable = HashSet::new();
        let mut single_candidate = Vec::new();
        for row in &census {
            // Struct-keyed slots draw from the parent type, others from the
            // item type; counts under the wrong source do not count.
            if row.inv_type == session.target_inv(&row.slot) && row.count > 0 {
                buildable.insert(row.slot.clone());
                if row.count == 1 {
                    single_candidate.push(row.slot.clone());
                }
            }
        }
        session.active_slots = session
            .balance
            .slot_order
            .iter()
            .filter(|s| buildable.contains(*s))
            .cloned()
            .collect();
        if session.active_slots.is_empty() {
            return Err(SessionError::NoBuildableSlots(
                session.balance.entry_key.clone(),
            ));
        }

        if auto_select {
            for slot in single_candidate {
                if !session.active_slots.contains(&slot) {
                    continue;
                }
                let parts = catalog
                    .candidate_parts(&slot, &[session.target_inv(&slot)])
                    .await?;
                if let Some(part) = parts.into_iter().next() {
                    debug!(slot = %slot, part = %part.name, "auto-selected sole candidate");
                    session.selections.insert(slot, vec![part]);
                }
            }
        }

        info!(
            balance = %session.balance.entry_key,
            slots = session.active_slots.len(),
            "assembly session initialized"
        );
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn balance(&self) -> &BalanceRecord {
        &self.balance
    }

    /// Slots shown in the interactive flow, in serialization order.
    pub fn active_slots(&self) -> &[String] {
        &self.active_slots
    }

    /// The slot the interactive cursor points at.
    pub fn current_slot(&self) -> Option<&str> {
        self.active_slots.get(self.cursor).map(String::as_str)
    }

    /// Currently selected parts for a slot.
    pub fn selections(&self, slot: &str) -> &[Part] {
        self.selections.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Aggregate tags: base tags plus every selected part's contribution,
    /// duplicates intact.
    pub fn current_tags(&self) -> TagAggregate {
        let mut tags = self.balance.base_tags.clone();
        for slot in &self.balance.slot_order {
            if let Some(parts) = self.selections.get(slot) {
                for part in parts {
                    tags.extend(part.add_tags.iter().cloned());
                }
            }
        }
        TagAggregate::from_list(tags)
    }

    /// The inventory type a slot's parts must come from.
    pub fn target_inv(&self, slot: &str) -> &str {
        if self.format.struct_key(slot).is_some() {
            &self.balance.parent_type
        } else {
            &self.balance.item_type
        }
    }

    /// The full option list for a slot under the current tag state.
    pub async fn slot_status(
        &self,
        slot: &str,
        catalog: &dyn PartCatalog,
    ) -> Result<Vec<PartStatus>, SessionError> {
        if !self.selections.contains_key(slot) {
            return Err(SessionError::UnknownSlot(slot.to_string()));
        }
        let target = self.target_inv(slot);
        let mut candidates = catalog.candidate_parts(slot, &[target]).await?;
        if target == self.balance.parent_type {
            // Parent-type stats come from a different id space; showing them
            // would attach the wrong row's numbers.
            for part in &mut candidates {
                part.stats = None;
            }
        }
        let selected_ids: HashSet<u32> = self
            .selections(slot)
            .iter()
            .map(|p| p.serial_index)
            .collect();
        Ok(slot_status(
            candidates,
            &self.rules.get(slot),
            &self.current_tags(),
            &selected_ids,
            &self.global_rules,
        ))
    }

    /// Replaces a slot's selection list with the parts for `ids`.
    ///
    /// The whole list is replaced, not appended. Offering more ids than the
    /// slot's `max` is rejected loudly.
    pub async fn select_parts(
        &mut self,
        slot: &str,
        ids: &[u32],
        catalog: &dyn PartCatalog,
    ) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::Closed);
        }
        if !self.selections.contains_key(slot) {
            return Err(SessionError::UnknownSlot(slot.to_string()));
        }
        let rule = self.rules.get(slot);
        if ids.len() > rule.max as usize {
            return Err(SessionError::TooManySelections {
                slot: slot.to_string(),
                given: ids.len(),
                max: rule.max,
            });
        }
        if ids.is_empty() {
            self.selections.insert(slot.to_string(), Vec::new());
            return Ok(());
        }
        let candidates = catalog
            .candidate_parts(slot, &[self.target_inv(slot)])
            .await?;
        let mut resolved = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match candidates.iter().find(|p| p.serial_index == *id) {
                Some(part) => resolved.push(part.clone()),
                None => missing.push(*id),
            }
        }
        if !missing.is_empty() {
            return Err(SessionError::UnknownPartIds {
                slot: slot.to_string(),
                ids: missing,
            });
        }
        debug!(slot = %slot, count = resolved.len(), "slot selection replaced");
        self.selections.insert(slot.to_string(), resolved);
        Ok(())
    }

    /// Moves the cursor forward to the next slot offering a genuine choice
    /// (two or more currently-valid options), skipping forced or exhausted
    /// slots. Never alters selections. Returns the slot landed on.
    pub async fn advance_to_next_meaningful_slot(
        &mut self,
        catalog: &dyn PartCatalog,
    ) -> Result<Option<String>, SessionError> {
        let slots = self.active_slots.clone();
        for (idx, slot) in slots.iter().enumerate().skip(self.cursor + 1) {
            let statuses = self.slot_status(slot, catalog).await?;
            let valid = statuses.iter().filter(|s| s.is_valid()).count();
            if valid >= 2 {
                self.cursor = idx;
                return Ok(Some(slot.clone()));
            }
            debug!(slot = %slot, valid, "skipping forced slot");
        }
        self.cursor = slots.len();
        Ok(None)
    }

    /// UI placeholder string for a slot, e.g. `Select barrel to add [1-2]`.
    pub fn slot_placeholder(&self, slot: &str) -> String {
        let rule = self.rules.get(slot);
        format!("Select {slot} to add [{}-{}]", rule.min, rule.max)
    }

    /// Sets the item level, clamped to the valid range.
    pub fn set_level(&mut self, level: u32) {
        self.level = level.clamp(1, MAX_LEVEL);
    }

    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = SessionState::Cancelled;
        }
    }

    pub fn time_out(&mut self) {
        if !self.state.is_terminal() {
            self.state = SessionState::TimedOut;
        }
    }

    /// Admits an externally resolved part into its slot's selection list.
    /// Used by the validation pipeline when rebuilding a decoded item.
    /// Returns false when the balance declares no such slot.
    pub fn admit_part(&mut self, part: Part) -> bool {
        match self.selections.get_mut(&part.slot) {
            Some(list) => {
                list.push(part);
                true
            }
            None => false,
        }
    }

    pub(crate) fn rules(&self) -> &SlotRules {
        &self.rules
    }

    pub(crate) fn global_rules(&self) -> &[GlobalTagRule] {
        &self.global_rules
    }

    /// Renders the component string for the current selections, in family
    /// slot order, with a fresh random nonce in the skin field.
    fn component_string(&self) -> String {
        let mut tokens = Vec::new();
        if let Some(base) = self.balance.base_part {
            tokens.push(format!("{{{base}}}"));
        }
        for slot in &self.format.slot_order {
            let ids: Vec<u32> = self
                .selections(slot)
                .iter()
                .map(|p| p.serial_index)
                .filter(|id| *id != 0)
                .collect();
            tokens.extend(self.format.render_slot_tokens(slot, &ids));
        }
        let nonce = rand::rng().random_range(1..=9999);
        let skin = format!(" 2, {nonce}");
        build_component_string(
            &self.format,
            &self.balance.classification_id,
            self.level,
            &skin,
            &tokens,
            "",
        )
    }

    /// Assembles the final component string and encodes it into a serial.
    ///
    /// Codec failures propagate verbatim and leave the session active; a
    /// successful encode transitions to `Finalized` and freezes the session.
    pub async fn finalize<T: CodecTransport>(
        &mut self,
        codec: &CodecClient<T>,
    ) -> Result<String, SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::Closed);
        }
        let component = self.component_string();
        debug!(component = %component, "finalizing assembly session");
        let serial = codec.encode(&component).await?;
        self.state = SessionState::Finalized;
        info!(balance = %self.balance.entry_key, "assembly session finalized");
        Ok(serial)
    }
}
