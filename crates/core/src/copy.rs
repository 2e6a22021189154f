use crate::EffectEntity;

/// Hop budget for copy-of-copy chains.
pub const MAX_COPY_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyKind {
    /// Blueprint: clones the entity immediately to its right.
    Right,
    /// Brainstorm: clones the leftmost entity.
    Left,
}

impl CopyKind {
    pub fn of(entity: &EffectEntity) -> Option<CopyKind> {
        if entity.is_right_copy() {
            Some(CopyKind::Right)
        } else if entity.is_left_copy() {
            Some(CopyKind::Left)
        } else {
            None
        }
    }
}

/// Positional lookup only, no compatibility checks. `order` holds the
/// live entity indices for this pass, ascending; entities queued for
/// destruction earlier in the pass are already filtered out of it.
fn positional_target(kind: CopyKind, current: usize, order: &[usize]) -> Option<usize> {
    match kind {
        CopyKind::Right => {
            let pos = order.iter().position(|&idx| idx == current)?;
            order.get(pos + 1).copied()
        }
        CopyKind::Left => {
            if order.len() < 2 {
                return None;
            }
            let first = order.first().copied()?;
            if first == current {
                return None;
            }
            Some(first)
        }
    }
}

/// One-hop resolution: positional lookup, then the compatibility rules
/// in order. Same-kind targets are rejected, cross-kind copy targets are
/// accepted outright (that is what makes multi-hop chains work), and
/// everything else passes through the general eligibility check.
pub fn resolve_copy_target(
    kind: CopyKind,
    current: usize,
    order: &[usize],
    entities: &[EffectEntity],
) -> Option<usize> {
    let target = positional_target(kind, current, order)?;
    let candidate = entities.get(target)?;
    match kind {
        CopyKind::Right if candidate.is_right_copy() => return None,
        CopyKind::Left if candidate.is_left_copy() => return None,
        _ => {}
    }
    if candidate.is_copy_kind() {
        return Some(target);
    }
    if !candidate.copy_eligible() {
        return None;
    }
    Some(target)
}

/// Follows copy-kind targets hop by hop until landing on a non-copy
/// entity. Each hop re-resolves from the hopped-to position with that
/// entity's own kind. Bounded by `MAX_COPY_DEPTH` and a visited stack,
/// so mutual-reference layouts resolve to nothing instead of looping.
/// Returns the hop sequence, intermediate copies included, ending at the
/// effective source.
pub fn copy_chain(
    kind: CopyKind,
    current: usize,
    order: &[usize],
    entities: &[EffectEntity],
) -> Option<Vec<usize>> {
    let mut visited = vec![current];
    let mut chain = Vec::new();
    let mut kind = kind;
    let mut position = current;
    for _ in 0..MAX_COPY_DEPTH {
        let target = resolve_copy_target(kind, position, order, entities)?;
        if visited.contains(&target) {
            return None;
        }
        let candidate = entities.get(target)?;
        chain.push(target);
        match CopyKind::of(candidate) {
            None => return Some(chain),
            Some(next_kind) => {
                visited.push(target);
                kind = next_kind;
                position = target;
            }
        }
    }
    None
}

/// The non-copy entity a copy at `current` ultimately clones, if any.
pub fn effective_copy_source(
    kind: CopyKind,
    current: usize,
    order: &[usize],
    entities: &[EffectEntity],
) -> Option<usize> {
    copy_chain(kind, current, order, entities).and_then(|chain| chain.last().copied())
}
