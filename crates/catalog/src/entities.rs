use crate::registry::BindingParams;
use anyhow::bail;
use motley_core::{Capability, EffectFlags, EffectResult, StateBag};
use std::sync::Arc;

/// Builds the capability body for a registry binding. `none` is the
/// binding of copy kinds and board-flag passives, whose behavior lives
/// in the engine rather than in a capability.
pub(crate) fn bind(binding: &str, params: &BindingParams) -> anyhow::Result<Option<Capability>> {
    let capability = match binding {
        "none" => return Ok(None),
        "static" => static_binding(params)?,
        "hand_kind" => hand_kind(params)?,
        "card_suit" => card_suit(params)?,
        "face_card" => face_card(params)?,
        "card_rank" => card_rank(params)?,
        "entity_count" => entity_count(params),
        "discards_left_chips" => discards_left_chips(params),
        "low_money_grant" => low_money_grant(params)?,
        "scaling" => scaling(params)?,
        "countdown_chips" => countdown_chips(params),
        "fragile" => fragile(params)?,
        "random_mult" => random_mult(params)?,
        other => bail!("unknown binding `{other}`"),
    };
    Ok(Some(capability))
}

fn parse_flags(names: &[String]) -> anyhow::Result<EffectFlags> {
    let mut flags = EffectFlags::default();
    for name in names {
        match name.as_str() {
            "free_reroll" => flags.free_reroll = true,
            "reset_discards" => flags.reset_discards = true,
            "retrigger_held" => flags.retrigger_held = true,
            "retrigger_scored_twice" => flags.retrigger_scored_twice = true,
            "destroy_self" => flags.destroy_self = true,
            "destroy_right" => flags.destroy_right = true,
            "destroy_random_other" => flags.destroy_random_other = true,
            "all_cards_score" => flags.all_cards_score = true,
            other => bail!("unknown flag `{other}`"),
        }
    }
    Ok(flags)
}

fn template(params: &BindingParams) -> anyhow::Result<EffectResult> {
    let mut result = EffectResult {
        chips: params.chips,
        mult: params.mult,
        mul_mult: params.mul_mult,
        money: params.money,
        ..EffectResult::default()
    };
    result.grants.tarots = params.tarots;
    result.grants.planets = params.planets;
    result.grants.spectrals = params.spectrals;
    result.grants.hands = params.hands;
    result.grants.discards = params.discards;
    result.grants.hand_size = params.hand_size;
    result.grants.sell_value = params.sell_value;
    result.flags = parse_flags(&params.flags)?;
    result.message = params.message.clone();
    Ok(result)
}

/// The same fixed result on every firing of the bound trigger.
fn static_binding(params: &BindingParams) -> anyhow::Result<Capability> {
    let result = template(params)?;
    Ok(Arc::new(move |_, _| result.clone()))
}

/// Fixed result, gated on the played hand's classification.
fn hand_kind(params: &BindingParams) -> anyhow::Result<Capability> {
    let Some(kind) = params.hand else {
        bail!("hand_kind binding needs a `hand` param");
    };
    let result = template(params)?;
    Ok(Arc::new(move |ctx, _| {
        if ctx.hand_kind() == Some(kind) {
            result.clone()
        } else {
            EffectResult::default()
        }
    }))
}

/// Fixed result per card of the wanted suit; wild cards count as every
/// suit.
fn card_suit(params: &BindingParams) -> anyhow::Result<Capability> {
    let Some(suit) = params.suit else {
        bail!("card_suit binding needs a `suit` param");
    };
    let result = template(params)?;
    Ok(Arc::new(move |ctx, _| {
        let Some(card) = ctx.payload.card else {
            return EffectResult::default();
        };
        if card.is_wild() || card.suit == suit {
            result.clone()
        } else {
            EffectResult::default()
        }
    }))
}

/// Fixed result per face card, honoring the all-faces board flag. A
/// `chance` param gates the payout on a uniform roll.
fn face_card(params: &BindingParams) -> anyhow::Result<Capability> {
    let result = template(params)?;
    let chance = params.chance;
    Ok(Arc::new(move |ctx, rng| {
        let Some(card) = ctx.payload.card else {
            return EffectResult::default();
        };
        if !ctx.flags.counts_as_face(&card) {
            return EffectResult::default();
        }
        if chance > 0.0 && !rng.chance(chance) {
            return EffectResult::default();
        }
        result.clone()
    }))
}

/// Fixed result per card of the wanted rank.
fn card_rank(params: &BindingParams) -> anyhow::Result<Capability> {
    let Some(rank) = params.rank else {
        bail!("card_rank binding needs a `rank` param");
    };
    let result = template(params)?;
    Ok(Arc::new(move |ctx, _| {
        let Some(card) = ctx.payload.card else {
            return EffectResult::default();
        };
        if card.rank == rank {
            result.clone()
        } else {
            EffectResult::default()
        }
    }))
}

/// Mult proportional to how many entities the container holds, the
/// acting one included.
fn entity_count(params: &BindingParams) -> Capability {
    let unit = params.unit;
    Arc::new(move |ctx, _| {
        let value = unit * ctx.entity_count() as f64;
        if value == 0.0 {
            return EffectResult::default();
        }
        EffectResult::mult(value).with_message(&format!("+{} Mult", value))
    })
}

/// Chips proportional to the discards still available this round.
fn discards_left_chips(params: &BindingParams) -> Capability {
    let per_discard = params.chips;
    Arc::new(move |ctx, _| {
        let value = per_discard * ctx.payload.discards_left as i64;
        if value == 0 {
            return EffectResult::default();
        }
        EffectResult::chips(value).with_message(&format!("+{} Chips", value))
    })
}

/// Grants consumables while the money snapshot sits at or below the
/// threshold.
fn low_money_grant(params: &BindingParams) -> anyhow::Result<Capability> {
    let threshold = params.threshold;
    let result = template(params)?;
    Ok(Arc::new(move |ctx, _| {
        if ctx.payload.money <= threshold {
            result.clone()
        } else {
            EffectResult::default()
        }
    }))
}

/// Accrues `step` into the entity's state on every firing and pays out
/// the accrued total through the chosen field. Flags from the params
/// ride along on each firing.
fn scaling(params: &BindingParams) -> anyhow::Result<Capability> {
    let field = params.field.clone();
    if !matches!(field.as_str(), "chips" | "mult" | "mul_mult") {
        bail!("scaling binding cannot target field `{field}`");
    }
    let step = params.step;
    let unit = params.unit;
    let flags = parse_flags(&params.flags)?;
    let message = params.message.clone();
    Ok(Arc::new(move |ctx, _| {
        let accrued = ctx.state_value("accrued") + step;
        let mut result = match field.as_str() {
            "chips" => EffectResult::chips((unit * accrued) as i64),
            "mult" => EffectResult::mult(unit * accrued),
            _ => EffectResult::mul_mult(1.0 + unit * accrued),
        };
        result.flags = flags;
        result.message = message.clone();
        let mut update = StateBag::new();
        update.insert("accrued".to_string(), accrued);
        result.with_state_update(update)
    }))
}

/// Pays the chips remaining on its counter, melts by `step` per firing,
/// and destroys itself once the counter runs out.
fn countdown_chips(params: &BindingParams) -> Capability {
    let start = params.start;
    let step = params.step;
    let message = params.message.clone();
    Arc::new(move |ctx, _| {
        let remaining = if ctx.state.contains_key("remaining") {
            ctx.state_value("remaining")
        } else {
            start
        };
        let mut result = EffectResult::chips(remaining.max(0.0) as i64);
        let next = remaining - step;
        if next <= 0.0 {
            result.flags.destroy_self = true;
            result.message = message.clone();
        }
        let mut update = StateBag::new();
        update.insert("remaining".to_string(), next);
        result.with_state_update(update)
    })
}

/// Fixed payout with a per-firing chance of destroying itself.
fn fragile(params: &BindingParams) -> anyhow::Result<Capability> {
    let payout = template(params)?;
    let chance = params.chance;
    Ok(Arc::new(move |_, rng| {
        let mut result = payout.clone();
        if rng.chance(chance) {
            result.flags.destroy_self = true;
            result.message = Some("Extinct!".to_string());
        }
        result
    }))
}

/// Uniform mult in `[0, max)`, drawn fresh per firing.
fn random_mult(params: &BindingParams) -> anyhow::Result<Capability> {
    if params.max <= 0 {
        bail!("random_mult binding needs a positive `max` param");
    }
    let max = params.max as u64;
    Ok(Arc::new(move |_, rng| {
        let roll = (rng.next_u64() % max) as f64;
        EffectResult::mult(roll).with_message(&format!("+{} Mult", roll))
    }))
}
