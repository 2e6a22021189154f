use crate::EffectResult;

fn take(count: u8, remaining: &mut usize) -> u8 {
    let granted = (count as usize).min(*remaining);
    *remaining -= granted;
    granted as u8
}

/// Caps a result's consumable generation to the slots still free,
/// consuming the budget in a fixed category order: tarots, planets,
/// spectrals. Runs per entity, right after its capability returns, so
/// later entities in the same pass compete for what is left. When a
/// request clamps to nothing at all, the message goes with it. Returns
/// the remaining budget.
pub fn clamp_consumables(result: &mut EffectResult, free_slots: usize) -> usize {
    if result.grants.consumable_total() == 0 {
        return free_slots;
    }
    let mut remaining = free_slots;
    result.grants.tarots = take(result.grants.tarots, &mut remaining);
    result.grants.planets = take(result.grants.planets, &mut remaining);
    result.grants.spectrals = take(result.grants.spectrals, &mut remaining);
    if result.grants.consumable_total() == 0 {
        result.message = None;
    }
    remaining
}
