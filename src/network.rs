// XBRL 2.1 network resolution: prohibition and overriding

use crate::dom::FragmentKey;
use crate::name::EName;
use crate::relation::{Endpoint, Relationship};
use crate::{Error, Result};
use compact_str::CompactString;
use std::collections::{HashMap, HashSet};

/// A base set: the unit within which prohibition and overriding operate.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BaseSetKey {
    pub elr: CompactString,
    pub arcrole: CompactString,
    pub arc_name: EName,
    pub link_name: EName,
}

impl BaseSetKey {
    pub fn of(relationship: &Relationship) -> Self {
        Self {
            elr: relationship.arc.elr.clone(),
            arcrole: relationship.arc.arcrole.clone(),
            arc_name: relationship.arc.arc_name.clone(),
            link_name: relationship.arc.link_name.clone(),
        }
    }
}

/// Endpoint identity for arc equivalence: concepts by expanded name,
/// resources and fragments by fragment key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum EndpointKey {
    Name(EName),
    Key(FragmentKey),
}

fn endpoint_key(endpoint: &Endpoint) -> EndpointKey {
    match endpoint.concept() {
        Some(ename) => EndpointKey::Name(ename.clone()),
        None => EndpointKey::Key(endpoint.key().clone()),
    }
}

/// Computes, per base set, the relationships removed by prohibition and
/// overriding.
pub trait NetworkFactory {
    /// Indices into `relationships` that do not survive network
    /// resolution: overridden arcs, prohibited arcs, and the equivalence
    /// classes they prohibit.
    fn compute_removed(&self, relationships: &[Relationship]) -> Result<HashSet<usize>>;
}

/// The XBRL 2.1 rules: relationships are equivalent within a base set when
/// they share endpoints and non-exempt attributes; the highest `priority`
/// wins; `use="prohibited"` at the winning priority removes the class.
#[derive(Default)]
pub struct XbrlNetworkFactory;

impl XbrlNetworkFactory {
    pub fn new() -> Self {
        Self
    }
}

impl NetworkFactory for XbrlNetworkFactory {
    fn compute_removed(&self, relationships: &[Relationship]) -> Result<HashSet<usize>> {
        type ClassKey = (
            BaseSetKey,
            EndpointKey,
            EndpointKey,
            Vec<(EName, CompactString)>,
        );
        let mut classes: HashMap<ClassKey, Vec<usize>> = HashMap::new();

        for (index, relationship) in relationships.iter().enumerate() {
            if !relationship.arc.order.is_finite() {
                return Err(Error::NetworkComputation {
                    msg: format!(
                        "non-finite order on arc in {}; equivalence is ill-defined",
                        relationship.doc_uri()
                    ),
                });
            }
            let key = (
                BaseSetKey::of(relationship),
                endpoint_key(&relationship.source),
                endpoint_key(&relationship.target),
                relationship.arc.nonexempt_attrs.clone(),
            );
            classes.entry(key).or_default().push(index);
        }

        let mut removed = HashSet::new();
        for indices in classes.values() {
            let winning_priority = indices
                .iter()
                .map(|&i| relationships[i].arc.priority)
                .max()
                .unwrap_or(0);
            let prohibited_wins = indices.iter().any(|&i| {
                relationships[i].arc.priority == winning_priority
                    && relationships[i].arc.prohibited
            });
            for &index in indices {
                let arc = &relationships[index].arc;
                if prohibited_wins || arc.priority < winning_priority || arc.prohibited {
                    removed.insert(index);
                }
            }
        }
        Ok(removed)
    }
}
