//! Applicability and specificity ranking of constructor and method signatures.

use std::cmp::Ordering;

use tracing::debug;

use super::{MethodSignature, Signature, TypeHandle};
use crate::context::ResolverContext;
use crate::property::PropertyRef;

/// Anything with an ordered parameter list that can be ranked.
pub(crate) trait Parameterized {
    fn params(&self, owner: &TypeHandle) -> Vec<TypeHandle>;
}

impl Parameterized for Signature {
    fn params(&self, owner: &TypeHandle) -> Vec<TypeHandle> {
        Signature::params(self, owner)
    }
}

impl Parameterized for MethodSignature {
    fn params(&self, owner: &TypeHandle) -> Vec<TypeHandle> {
        MethodSignature::params(self, owner)
    }
}

/// Arity matches and every argument is resolvable as its positional parameter.
pub(crate) fn is_applicable(params: &[TypeHandle], args: &[PropertyRef], cx: &ResolverContext<'_>) -> bool {
    params.len() == args.len()
        && params
            .iter()
            .zip(args)
            .all(|(param, arg)| arg.is_resolvable_as(cx, param))
}

/// Orders two parameter lists, `Less` meaning `a` is more specific.
///
/// Fewer parameters come first. At equal arity each position votes: equal
/// types abstain, the narrower of two related types wins, and `string` loses
/// to any unrelated type. `a` is more specific only when no position prefers
/// `b`; split votes are a tie.
pub(crate) fn compare_specificity(a: &[TypeHandle], b: &[TypeHandle]) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        other => return other,
    }
    let (mut a_wins, mut b_wins) = (0usize, 0usize);
    for (x, y) in a.iter().zip(b) {
        match compare_param(x, y) {
            Ordering::Less => a_wins += 1,
            Ordering::Greater => b_wins += 1,
            Ordering::Equal => {}
        }
    }
    match (a_wins, b_wins) {
        (0, 0) => Ordering::Equal,
        (_, 0) => Ordering::Less,
        (0, _) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn compare_param(x: &TypeHandle, y: &TypeHandle) -> Ordering {
    if x == y {
        Ordering::Equal
    } else if x.is_assignable_to(y) {
        Ordering::Less
    } else if y.is_assignable_to(x) {
        Ordering::Greater
    } else if x.is_string() {
        Ordering::Greater
    } else if y.is_string() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Picks the most specific applicable candidate declared by `owner`.
///
/// A candidate qualifies when no other applicable candidate is strictly more
/// specific. Several qualifying candidates are a genuine ambiguity; the one
/// registered first wins.
pub(crate) fn select_most_specific<'c, C: Parameterized>(
    candidates: impl IntoIterator<Item = &'c C>,
    owner: &TypeHandle,
    args: &[PropertyRef],
    cx: &ResolverContext<'_>,
) -> Option<&'c C> {
    let applicable: Vec<(&C, Vec<TypeHandle>)> = candidates
        .into_iter()
        .map(|c| (c, c.params(owner)))
        .filter(|(_, params)| is_applicable(params, args, cx))
        .collect();
    let minimal: Vec<&C> = applicable
        .iter()
        .filter(|(_, params)| {
            !applicable
                .iter()
                .any(|(_, other)| compare_specificity(other, params) == Ordering::Less)
        })
        .map(|(c, _)| *c)
        .collect();
    if minimal.len() > 1 {
        debug!(
            owner = %owner,
            candidates = minimal.len(),
            arguments = args.len(),
            "ambiguous signatures, using the first registered"
        );
    }
    minimal.first().copied().or_else(|| applicable.first().map(|(c, _)| *c))
}
