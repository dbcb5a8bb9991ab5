use crate::rewards::properties::PropertySnapshot;
use schema::ConditionExpr;
use tracing::debug;

/// Evaluate a single condition expression against a creature snapshot.
///
/// `key:value` and `key=value` test whether the named property contains
/// `value`, ignoring case. Anything else, including a `key:value` whose key
/// is not a property, is a raw species tag compared for equality.
pub fn matches(expression: &str, snapshot: &PropertySnapshot) -> bool {
    if let Some(index) = expression.find([':', '=']) {
        let key = expression[..index].trim().to_lowercase();
        let value = expression[index + 1..].trim();

        if let Some(actual) = snapshot.get(&key) {
            let result = actual.to_lowercase().contains(&value.to_lowercase());
            debug!(
                "  Condition '{}': '{}' contains '{}'? {}",
                expression, actual, value, result
            );
            return result;
        }
        debug!(
            "  Condition '{}': '{}' is not a known property, treating as raw tag",
            expression, key
        );
    }

    species_tag_matches(expression, snapshot)
}

fn species_tag_matches(tag: &str, snapshot: &PropertySnapshot) -> bool {
    match snapshot.get("species") {
        Some(species) => {
            let result = species.to_lowercase() == tag.to_lowercase();
            debug!("  Raw tag '{}' == species '{}'? {}", tag, species, result);
            result
        }
        None => {
            debug!("  Raw tag '{}': no species in snapshot", tag);
            false
        }
    }
}

/// Evaluate a reward's condition list: OR across entries, AND inside a group.
/// An empty list always matches. `blacklist` inverts the outcome.
pub fn conditions_match(
    conditions: &[ConditionExpr],
    blacklist: bool,
    snapshot: &PropertySnapshot,
) -> bool {
    if conditions.is_empty() {
        return true;
    }

    let any_match = conditions.iter().any(|condition| match condition {
        ConditionExpr::Single(expression) => matches(expression, snapshot),
        ConditionExpr::AllOf(group) => group.iter().all(|expression| matches(expression, snapshot)),
    });

    if blacklist {
        !any_match
    } else {
        any_match
    }
}
