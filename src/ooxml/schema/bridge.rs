//! Constraint Bridge: particle normalizations applied when converting a
//! freshly-parsed particle tree into its runtime form (ECMA-376 §4.5).
//!
//! These run bottom-up, once, at load time, so the Schema Validator always
//! walks an already-normalized tree.

use crate::ooxml::schema::particle::{Occurs, Particle};

/// Apply sequence/choice/all/group normalization recursively.
pub fn normalize(particle: Particle) -> Particle {
    match particle {
        Particle::Sequence { children, occurs } => normalize_sequence(normalize_children(children), occurs),
        Particle::Choice { children, occurs } => normalize_choice(normalize_children(children), occurs),
        Particle::All { children, occurs } => normalize_all(normalize_children(children), occurs),
        Particle::Group { name, particle, occurs } => normalize_group(name, *particle, occurs),
        other @ (Particle::Element { .. } | Particle::Any { .. }) => other,
    }
}

fn normalize_children(children: Vec<Particle>) -> Vec<Particle> {
    children.into_iter().map(normalize).collect()
}

fn is_default_occurs(occurs: Occurs) -> bool {
    occurs.min_occurs == 1 && occurs.max_occurs == Some(1)
}

fn contains_required(particle: &Particle) -> bool {
    match particle {
        Particle::Element { occurs, .. } | Particle::Any { occurs, .. } => occurs.min_occurs > 0,
        Particle::Sequence { children, occurs } | Particle::All { children, occurs } => {
            occurs.min_occurs > 0 && children.iter().any(contains_required)
        },
        Particle::Choice { occurs, .. } => occurs.min_occurs > 0,
        Particle::Group { particle, occurs, .. } => occurs.min_occurs > 0 && contains_required(particle),
    }
}

/// Sequence flattening: collapse a single-child sequence at default
/// occurrence to that child; inline a nested sequence with `max=1` unless
/// it's optional and guards a required sub-particle, propagating `min=0`
/// onto the inlined children when the parent sequence was optional.
fn normalize_sequence(children: Vec<Particle>, occurs: Occurs) -> Particle {
    if children.len() == 1 && is_default_occurs(occurs) {
        return children.into_iter().next().unwrap();
    }

    let mut flattened = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Particle::Sequence {
                children: inner_children,
                occurs: inner_occurs,
            } if inner_occurs.max_occurs == Some(1)
                && !(inner_occurs.is_optional() && inner_children.iter().any(contains_required)) =>
            {
                if inner_occurs.is_optional() {
                    flattened.extend(inner_children.into_iter().map(|c| force_optional(c)));
                } else {
                    flattened.extend(inner_children);
                }
            },
            other => flattened.push(other),
        }
    }

    Particle::Sequence {
        children: flattened,
        occurs,
    }
}

fn force_optional(particle: Particle) -> Particle {
    match particle {
        Particle::Element { namespace, local_name, occurs } => Particle::Element {
            namespace,
            local_name,
            occurs: Occurs::new(0, occurs.max_occurs),
        },
        Particle::Sequence { children, occurs } => Particle::Sequence {
            children,
            occurs: Occurs::new(0, occurs.max_occurs),
        },
        Particle::Choice { children, occurs } => Particle::Choice {
            children,
            occurs: Occurs::new(0, occurs.max_occurs),
        },
        Particle::All { children, occurs } => Particle::All {
            children,
            occurs: Occurs::new(0, occurs.max_occurs),
        },
        Particle::Group { name, particle, occurs } => Particle::Group {
            name,
            particle,
            occurs: Occurs::new(0, occurs.max_occurs),
        },
        Particle::Any { namespace_constraint, occurs } => Particle::Any {
            namespace_constraint,
            occurs: Occurs::new(0, occurs.max_occurs),
        },
    }
}

/// Choice flattening: inline nested choices with `min=max=1`; collapse a
/// singleton choice to its lone branch.
fn normalize_choice(children: Vec<Particle>, occurs: Occurs) -> Particle {
    if children.len() == 1 {
        return children.into_iter().next().unwrap();
    }

    let mut flattened = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Particle::Choice {
                children: inner_children,
                occurs: inner_occurs,
            } if inner_occurs.min_occurs == 1 && inner_occurs.max_occurs == Some(1) => {
                flattened.extend(inner_children);
            },
            other => flattened.push(other),
        }
    }

    Particle::Choice {
        children: flattened,
        occurs,
    }
}

/// All/Group: collapse a singleton `All` to its lone child.
fn normalize_all(children: Vec<Particle>, occurs: Occurs) -> Particle {
    if children.len() == 1 {
        return children.into_iter().next().unwrap();
    }
    Particle::All { children, occurs }
}

/// Group expansion: apply the group's occurrence to its sole child when
/// exactly one exists, else wrap the expansion as a sequence.
fn normalize_group(name: String, particle: Particle, occurs: Occurs) -> Particle {
    let _ = &name; // retained for diagnostics/debugging only
    match normalize(particle) {
        Particle::Sequence { children, .. } if children.len() == 1 => {
            apply_occurs(children.into_iter().next().unwrap(), occurs)
        },
        Particle::Sequence { children, .. } => Particle::Sequence { children, occurs },
        single => apply_occurs(single, occurs),
    }
}

fn apply_occurs(particle: Particle, occurs: Occurs) -> Particle {
    match particle {
        Particle::Element { namespace, local_name, .. } => Particle::Element { namespace, local_name, occurs },
        Particle::Sequence { children, .. } => Particle::Sequence { children, occurs },
        Particle::Choice { children, .. } => Particle::Choice { children, occurs },
        Particle::All { children, .. } => Particle::All { children, occurs },
        Particle::Group { name, particle, .. } => Particle::Group { name, particle, occurs },
        Particle::Any { namespace_constraint, .. } => Particle::Any { namespace_constraint, occurs },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(local_name: &str, occurs: Occurs) -> Particle {
        Particle::Element {
            namespace: "urn:t".to_string(),
            local_name: local_name.to_string(),
            occurs,
        }
    }

    #[test]
    fn single_child_sequence_at_default_occurs_collapses() {
        let seq = Particle::Sequence {
            children: vec![el("a", Occurs::ONE)],
            occurs: Occurs::ONE,
        };
        let normalized = normalize(seq);
        assert!(matches!(normalized, Particle::Element { .. }));
    }

    #[test]
    fn singleton_choice_collapses_to_its_branch() {
        let choice = Particle::Choice {
            children: vec![el("a", Occurs::ONE)],
            occurs: Occurs::ONE,
        };
        assert!(matches!(normalize(choice), Particle::Element { .. }));
    }

    #[test]
    fn nested_mandatory_sequence_inlines_into_parent() {
        let inner = Particle::Sequence {
            children: vec![el("a", Occurs::ONE), el("b", Occurs::ONE)],
            occurs: Occurs::ONE,
        };
        let outer = Particle::Sequence {
            children: vec![inner, el("c", Occurs::ONE)],
            occurs: Occurs::ONE,
        };
        match normalize(outer) {
            Particle::Sequence { children, .. } => assert_eq!(children.len(), 3),
            _ => panic!("expected sequence"),
        }
    }
}
