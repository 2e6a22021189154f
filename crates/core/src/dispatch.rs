use crate::{
    clamp_consumables, copy_chain, merge_state, Aggregate, BoardFlags, CopyKind, Edition,
    EffectContext, EffectEntity, EffectResult, EntityContainer, EventPayload, RngState, StateBag,
    Trigger,
};

pub const FOIL_CHIPS: i64 = 50;
pub const HOLOGRAPHIC_MULT: f64 = 10.0;
pub const POLYCHROME_MULT_MUL: f64 = 1.5;

/// The flat score term an edition contributes on the scoring pass.
/// Negative has no score term; it pays out as container capacity.
fn edition_result(edition: Option<Edition>) -> Option<EffectResult> {
    match edition {
        Some(Edition::Foil) => Some(EffectResult::chips(FOIL_CHIPS)),
        Some(Edition::Holographic) => Some(EffectResult::mult(HOLOGRAPHIC_MULT)),
        Some(Edition::Polychrome) => Some(EffectResult::mul_mult(POLYCHROME_MULT_MUL)),
        Some(Edition::Negative) | None => None,
    }
}

#[derive(Debug, Default)]
struct CommitQueue {
    state_updates: Vec<(usize, StateBag)>,
    removals: Vec<usize>,
}

/// Walks the container once per fired trigger, invoking capabilities and
/// copy re-invocations in strict left-to-right order and accumulating
/// their results. Owns the rng, so a preview cannot move the committed
/// stream.
#[derive(Debug)]
pub struct Dispatcher {
    rng: RngState,
}

impl Dispatcher {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RngState::from_seed(seed),
        }
    }

    pub fn from_rng(rng: RngState) -> Self {
        Self { rng }
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Commit dispatch: state updates and destroy flags queued during
    /// the pass apply to the container once the pass is over.
    pub fn dispatch(
        &mut self,
        trigger: Trigger,
        container: &mut EntityContainer,
        payload: &EventPayload<'_>,
    ) -> Aggregate {
        let free_slots = container.free_slots();
        let (aggregate, queue) = Self::run_pass(
            &mut self.rng,
            trigger,
            container.entities(),
            payload,
            free_slots,
            false,
        );

        for (index, update) in &queue.state_updates {
            if let Some(entity) = container.get_mut(*index) {
                entity.state = merge_state(&entity.state, update);
            }
        }

        let mut removals = queue.removals;
        removals.sort_unstable();
        removals.dedup();
        for index in removals.iter().rev() {
            container.remove(*index);
        }

        aggregate
    }

    /// Preview dispatch: the container stays untouched (enforced by the
    /// shared borrow), probability entities are skipped wholesale, and
    /// capabilities only ever see a throwaway rng clone.
    pub fn preview(
        &mut self,
        trigger: Trigger,
        container: &EntityContainer,
        payload: &EventPayload<'_>,
    ) -> Aggregate {
        let mut scratch = self.rng.clone();
        let free_slots = container.free_slots();
        let (aggregate, _) = Self::run_pass(
            &mut scratch,
            trigger,
            container.entities(),
            payload,
            free_slots,
            true,
        );
        aggregate
    }

    fn run_pass(
        rng: &mut RngState,
        trigger: Trigger,
        entities: &[EffectEntity],
        payload: &EventPayload<'_>,
        container_free_slots: usize,
        preview: bool,
    ) -> (Aggregate, CommitQueue) {
        let mut aggregate = Aggregate::default();
        let mut queue = CommitQueue::default();
        let flags = BoardFlags::scan(entities);
        let mut consumable_budget = payload.consumable_free_slots;

        // Editions score exactly once per resolution, ahead of every
        // capability, on the scoring-phase pass.
        if trigger == Trigger::OnHandPlayed {
            for entity in entities {
                if let Some(result) = edition_result(entity.edition) {
                    aggregate.merge(&entity.name, &result);
                }
            }
        }

        for (index, entity) in entities.iter().enumerate() {
            if queue.removals.contains(&index) {
                continue;
            }
            let ctx = EffectContext {
                payload,
                position: index,
                entities,
                state: &entity.state,
                flags,
                container_free_slots,
            };

            // Own capability first; the copy step below observes its
            // queued effects.
            if let Some(capability) = entity.capabilities.get(trigger) {
                if !(preview && entity.probability) {
                    let mut result = capability(&ctx, rng);
                    consumable_budget = clamp_consumables(&mut result, consumable_budget);
                    aggregate.merge(&entity.name, &result);
                    if !preview {
                        Self::queue_commit(rng, index, &result, entities, &mut queue);
                    }
                }
            }

            let Some(kind) = CopyKind::of(entity) else {
                continue;
            };
            let order: Vec<usize> = (0..entities.len())
                .filter(|candidate| !queue.removals.contains(candidate))
                .collect();
            let Some(chain) = copy_chain(kind, index, &order, entities) else {
                continue;
            };
            let Some((source_index, hops)) = chain.split_last() else {
                continue;
            };
            let Some(source) = entities.get(*source_index) else {
                continue;
            };
            let Some(capability) = source.capabilities.get(trigger) else {
                continue;
            };
            if preview && (entity.probability || source.probability) {
                continue;
            }
            // The source acts from the copy's vantage point: same
            // context, same position, the copy's own state.
            let mut result = capability(&ctx, rng);
            consumable_budget = clamp_consumables(&mut result, consumable_budget);
            wrap_copy_message(entity, hops, source, entities, &mut result);
            aggregate.merge(&entity.name, &result);
            if !preview {
                // State lands on the acting copy, never the source.
                Self::queue_commit(rng, index, &result, entities, &mut queue);
            }
        }

        (aggregate, queue)
    }

    fn queue_commit(
        rng: &mut RngState,
        acting: usize,
        result: &EffectResult,
        entities: &[EffectEntity],
        queue: &mut CommitQueue,
    ) {
        if let Some(update) = &result.state_update {
            queue.state_updates.push((acting, update.clone()));
        }
        if result.flags.destroy_right {
            let order: Vec<usize> = (0..entities.len())
                .filter(|candidate| !queue.removals.contains(candidate))
                .collect();
            if let Some(pos) = order.iter().position(|&idx| idx == acting) {
                if let Some(target) = order.get(pos + 1).copied() {
                    queue.removals.push(target);
                }
            }
        }
        if result.flags.destroy_random_other {
            let candidates: Vec<usize> = (0..entities.len())
                .filter(|candidate| !queue.removals.contains(candidate) && *candidate != acting)
                .collect();
            if let Some(pick) = rng.pick_index(candidates.len()) {
                queue.removals.push(candidates[pick]);
            }
        }
        if result.flags.destroy_self {
            queue.removals.push(acting);
        }
    }
}

fn wrap_copy_message(
    acting: &EffectEntity,
    hops: &[usize],
    source: &EffectEntity,
    entities: &[EffectEntity],
    result: &mut EffectResult,
) {
    let Some(mut message) = result.message.take() else {
        return;
    };
    let mut wrappers: Vec<&EffectEntity> = vec![acting];
    wrappers.extend(hops.iter().filter_map(|idx| entities.get(*idx)));
    // Innermost hop names the source directly; each outer hop names the
    // copy it went through.
    let mut named = source;
    for wrapper in wrappers.iter().rev() {
        message = format!("{} copies [{}]: {}", wrapper.name, named.name, message);
        named = wrapper;
    }
    result.message = Some(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandKind, LEFT_COPY_ID, RIGHT_COPY_ID};
    use std::sync::Arc;

    fn right_copy() -> EffectEntity {
        EffectEntity::new(RIGHT_COPY_ID, "Blueprint", Trigger::OnHandPlayed)
    }

    fn left_copy() -> EffectEntity {
        EffectEntity::new(LEFT_COPY_ID, "Brainstorm", Trigger::OnHandPlayed)
    }

    fn mult_on_played(id: &str, value: f64) -> EffectEntity {
        EffectEntity::new(id, id, Trigger::OnHandPlayed).with_capability(
            Trigger::OnHandPlayed,
            Arc::new(move |_, _| {
                EffectResult::mult(value).with_message(&format!("+{} Mult", value))
            }),
        )
    }

    fn mult_on_play(id: &str, value: f64) -> EffectEntity {
        EffectEntity::new(id, id, Trigger::OnPlay).with_capability(
            Trigger::OnPlay,
            Arc::new(move |_, _| {
                EffectResult::mult(value).with_message(&format!("+{} Mult", value))
            }),
        )
    }

    fn container_of(entities: Vec<EffectEntity>) -> EntityContainer {
        let mut container = EntityContainer::new(entities.len().max(5));
        for entity in entities {
            container.add(entity).expect("capacity");
        }
        container
    }

    #[test]
    fn copy_doubles_the_source_with_nested_log() {
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![mult_on_played("a", 8.0), left_copy()]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let aggregate = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        assert_eq!(aggregate.mult, 16.0);
        assert_eq!(aggregate.log.len(), 2);
        assert_eq!(aggregate.log[0].entity, "a");
        assert_eq!(aggregate.log[1].entity, "Brainstorm");
        assert_eq!(
            aggregate.log[1].message.as_deref(),
            Some("Brainstorm copies [a]: +8 Mult")
        );
    }

    #[test]
    fn chain_through_a_copy_nests_twice() {
        let mut dispatcher = Dispatcher::new(1);
        let mut container =
            container_of(vec![right_copy(), mult_on_play("b", 15.0), left_copy()]);
        let payload = EventPayload::played(HandKind::HighCard, &[]);

        let aggregate = dispatcher.dispatch(Trigger::OnPlay, &mut container, &payload);
        assert_eq!(aggregate.mult, 45.0);
        assert_eq!(aggregate.log.len(), 3);
        assert_eq!(
            aggregate.log[0].message.as_deref(),
            Some("Blueprint copies [b]: +15 Mult")
        );
        assert_eq!(aggregate.log[1].entity, "b");
        assert_eq!(
            aggregate.log[2].message.as_deref(),
            Some("Brainstorm copies [Blueprint]: Blueprint copies [b]: +15 Mult")
        );
    }

    #[test]
    fn mixed_four_entity_chain_fans_out_three_times() {
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![
            right_copy(),
            mult_on_played("x", 4.0),
            left_copy(),
            right_copy(),
        ]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let aggregate = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        // Leading right-copy, x itself, and the left-copy chained through
        // the right-copy; the trailing right-copy has no right neighbor.
        assert_eq!(aggregate.mult, 12.0);
        assert_eq!(aggregate.log.len(), 3);
    }

    #[test]
    fn adjacent_right_copies_contribute_nothing() {
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![right_copy(), right_copy()]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let aggregate = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        assert_eq!(aggregate, Aggregate::default());
    }

    #[test]
    fn copy_state_update_lands_on_the_copy() {
        let scaler = EffectEntity::new("tally", "Tally", Trigger::OnHandPlayed).with_capability(
            Trigger::OnHandPlayed,
            Arc::new(|ctx, _| {
                let seen = ctx.state_value("seen") + 1.0;
                let mut update = StateBag::new();
                update.insert("seen".to_string(), seen);
                EffectResult::mult(seen).with_state_update(update)
            }),
        );
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![scaler, left_copy()]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let first = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        // Both read their own bag: the source saw 0, the copy saw 0.
        assert_eq!(first.mult, 2.0);
        assert_eq!(container.get(0).map(|e| e.state_value("seen")), Some(1.0));
        assert_eq!(container.get(1).map(|e| e.state_value("seen")), Some(1.0));

        let second = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        assert_eq!(second.mult, 4.0);
    }

    #[test]
    fn preview_leaves_state_and_stream_alone() {
        let coin = EffectEntity::new("coin", "Coin", Trigger::OnHandPlayed)
            .probabilistic()
            .with_capability(
                Trigger::OnHandPlayed,
                Arc::new(|_, rng| {
                    if rng.chance(0.5) {
                        EffectResult::money(5).with_message("heads")
                    } else {
                        EffectResult::default()
                    }
                }),
            );
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let mut previewing = Dispatcher::new(9);
        let mut direct = Dispatcher::new(9);
        let mut container_a = container_of(vec![mult_on_played("a", 8.0), coin.clone()]);
        let mut container_b = container_a.clone();

        let p1 = previewing.preview(Trigger::OnHandPlayed, &container_a, &payload);
        let p2 = previewing.preview(Trigger::OnHandPlayed, &container_a, &payload);
        assert_eq!(p1, p2);
        // The probability entity never shows up in a preview.
        assert_eq!(p1.money, 0);
        assert_eq!(p1.log.len(), 1);
        assert_eq!(container_a.get(0).map(|e| e.state.len()), Some(0));

        let committed = previewing.dispatch(Trigger::OnHandPlayed, &mut container_a, &payload);
        let reference = direct.dispatch(Trigger::OnHandPlayed, &mut container_b, &payload);
        assert_eq!(committed, reference);
    }

    #[test]
    fn preview_is_stable_even_when_a_body_draws() {
        let leak = EffectEntity::new("leak", "Leak", Trigger::OnHandPlayed).with_capability(
            Trigger::OnHandPlayed,
            Arc::new(|_, rng| EffectResult::chips((rng.next_u64() % 10) as i64 + 1)),
        );
        let mut dispatcher = Dispatcher::new(4);
        let container = container_of(vec![leak]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let p1 = dispatcher.preview(Trigger::OnHandPlayed, &container, &payload);
        let p2 = dispatcher.preview(Trigger::OnHandPlayed, &container, &payload);
        assert_eq!(p1, p2);
    }

    #[test]
    fn destroy_flags_flush_after_the_pass() {
        let bomber = EffectEntity::new("bomber", "Bomber", Trigger::OnHandPlayed)
            .with_capability(
                Trigger::OnHandPlayed,
                Arc::new(|_, _| {
                    let mut result = EffectResult::mult(2.0);
                    result.flags.destroy_right = true;
                    result
                }),
            );
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![bomber, mult_on_played("victim", 9.0)]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let aggregate = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        // The victim was queued before its visit, so it never acted.
        assert_eq!(aggregate.mult, 2.0);
        assert_eq!(container.len(), 1);
        assert_eq!(container.get(0).map(|e| e.identity.as_str()), Some("bomber"));
    }

    #[test]
    fn destroy_self_removes_after_acting() {
        let fader = EffectEntity::new("fader", "Fader", Trigger::OnHandPlayed).with_capability(
            Trigger::OnHandPlayed,
            Arc::new(|_, _| {
                let mut result = EffectResult::mult(6.0);
                result.flags.destroy_self = true;
                result
            }),
        );
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![fader, mult_on_played("after", 1.0)]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let aggregate = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        assert_eq!(aggregate.mult, 7.0);
        assert_eq!(container.len(), 1);
        assert_eq!(container.get(0).map(|e| e.identity.as_str()), Some("after"));
    }

    #[test]
    fn destroy_random_excludes_the_requester() {
        let wild = EffectEntity::new("wild", "Wild", Trigger::OnHandPlayed).with_capability(
            Trigger::OnHandPlayed,
            Arc::new(|_, _| {
                let mut result = EffectResult::default();
                result.flags.destroy_random_other = true;
                result
            }),
        );
        for seed in 0..16 {
            let mut dispatcher = Dispatcher::new(seed);
            let mut container = container_of(vec![
                wild.clone(),
                mult_on_played("b", 1.0),
                mult_on_played("c", 1.0),
            ]);
            let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);
            dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
            assert_eq!(container.len(), 2);
            assert_eq!(container.get(0).map(|e| e.identity.as_str()), Some("wild"));
        }
    }

    #[test]
    fn editions_fold_only_on_the_scoring_pass() {
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![
            mult_on_played("a", 4.0).with_edition(Edition::Foil),
            EffectEntity::new("h", "Holo", Trigger::OnPlay).with_edition(Edition::Holographic),
            EffectEntity::new("p", "Poly", Trigger::OnPlay).with_edition(Edition::Polychrome),
        ]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let scored = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        assert_eq!(scored.chips, 50);
        assert_eq!(scored.mult, 14.0);
        assert_eq!(scored.mul_mult, 1.5);
        // Edition entries precede every capability entry.
        assert_eq!(scored.log[0].chips, 50);

        let played = dispatcher.dispatch(Trigger::OnPlay, &mut container, &EventPayload::played(HandKind::Pair, &[]));
        assert_eq!(played, Aggregate::default());
    }

    #[test]
    fn consumable_budget_threads_across_entities() {
        let granter = |id: &str, tarots: u8| {
            let id = id.to_string();
            let mut entity = EffectEntity::new(&id, &id, Trigger::OnBlindSelect);
            entity.capabilities.set(
                Trigger::OnBlindSelect,
                Arc::new(move |_, _| {
                    let mut result = EffectResult::default().with_message("card");
                    result.grants.tarots = tarots;
                    result
                }),
            );
            entity
        };
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![granter("g1", 2), granter("g2", 2)]);
        let payload = EventPayload::ambient().with_consumable_slots(3);

        let aggregate = dispatcher.dispatch(Trigger::OnBlindSelect, &mut container, &payload);
        assert_eq!(aggregate.grants.tarots, 3);
        assert_eq!(aggregate.log.len(), 2);
    }

    #[test]
    fn flags_rescan_every_pass() {
        let watcher = EffectEntity::new("watch", "Watch", Trigger::OnHandPlayed).with_capability(
            Trigger::OnHandPlayed,
            Arc::new(|ctx, _| {
                if ctx.flags.two_suit_colors {
                    EffectResult::mult(5.0)
                } else {
                    EffectResult::default()
                }
            }),
        );
        let smeared = EffectEntity::new(
            crate::TWO_COLORS_ID,
            "Smeared Joker",
            Trigger::OnHandPlayed,
        );
        let mut dispatcher = Dispatcher::new(1);
        let mut container = container_of(vec![watcher, smeared]);
        let payload = EventPayload::hand_played(HandKind::Pair, &[], &[], &[]);

        let with_flag = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        assert_eq!(with_flag.mult, 5.0);

        container.remove(1);
        let without = dispatcher.dispatch(Trigger::OnHandPlayed, &mut container, &payload);
        assert_eq!(without.mult, 0.0);
    }
}
