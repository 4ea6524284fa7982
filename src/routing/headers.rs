//! Response headers attached to proxy actions.
//!
//! Custom header rules are scoped by optional space and role. For each
//! distinct key the most specific applicable rule wins:
//!
//! | Asset      | Rank (high to low)                                            |
//! |------------|---------------------------------------------------------------|
//! | restricted | space+role, role only, space only, neither                    |
//! | open       | space only, neither (role-scoped rules never apply)           |
//!
//! A role of `""` counts as no role. Equal ranks keep the first rule in
//! configured order.

use crate::asset::{CustomHeaderRule, OrchestrationAsset};

use super::outcome::ProxyAction;

pub const CACHE_CONTROL: &str = "cache-control";

/// `Cache-Control` for image server responses of restricted assets.
pub const PRIVATE_CACHE_CONTROL: &str = "private, max-age=600";

/// `Cache-Control` for image server responses of public assets.
pub const PUBLIC_CACHE_CONTROL: &str = "public, s-maxage=2419200, max-age=2419200, stale-if-error=86400";

/// Specificity of a rule for an asset, or `None` if it does not apply.
fn rank(rule: &CustomHeaderRule, asset: &OrchestrationAsset) -> Option<u8> {
    let space_matches = match rule.space {
        Some(space) if space == asset.asset_id.space => true,
        Some(_) => return None,
        None => false,
    };

    if !rule.has_role() {
        return Some(if space_matches { 2 } else { 1 });
    }

    if !asset.is_restricted() {
        return None;
    }
    let role_matches = rule
        .role
        .as_deref()
        .is_some_and(|role| asset.roles.iter().any(|r| r == role));
    if !role_matches {
        return None;
    }
    Some(if space_matches { 4 } else { 3 })
}

/// Pick the winning rule for every header key, in first-seen key order.
pub fn merge_custom_headers<'a>(
    rules: &'a [CustomHeaderRule],
    asset: &OrchestrationAsset,
) -> Vec<&'a CustomHeaderRule> {
    let mut winners: Vec<(u8, &CustomHeaderRule)> = Vec::new();

    for rule in rules {
        let Some(rank) = rank(rule, asset) else {
            continue;
        };
        match winners
            .iter_mut()
            .find(|(_, w)| w.key.eq_ignore_ascii_case(&rule.key))
        {
            Some(slot) if rank > slot.0 => *slot = (rank, rule),
            Some(_) => {}
            None => winners.push((rank, rule)),
        }
    }

    winners.into_iter().map(|(_, rule)| rule).collect()
}

/// Set default and custom headers on a proxy action.
///
/// Custom headers are applied last and replace defaults with the same key.
pub fn apply_headers(action: &mut ProxyAction, rules: &[CustomHeaderRule], asset: &OrchestrationAsset) {
    if action.destination.is_image_server() {
        let cache_control = if action.requires_auth {
            PRIVATE_CACHE_CONTROL
        } else {
            PUBLIC_CACHE_CONTROL
        };
        action.set_header(CACHE_CONTROL, cache_control);
    }

    for rule in merge_custom_headers(rules, asset) {
        action.set_header(&rule.key, rule.value.clone());
    }
}
