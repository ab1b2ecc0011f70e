//! Name Reconciler: clusters raw name variants into canonical teachers.
//!
//! Algorithm:
//! 1. Normalize every raw name (`normalize::normalize_name`) and group exact matches.
//! 2. Visit groups from most to least formal (more tokens, then longer).
//!    A group joins an existing cluster only when it is compatible with every
//!    member (`normalize::is_compatible`, either direction), no conflicting
//!    name fits that cluster too, and exactly one cluster qualifies.
//!    Anything else → it starts its own cluster.
//! 3. Pick the most formal observed spelling as the canonical name; a target
//!    spelling wins only when it outranks every observed one.
//! 4. With a target list, keep only clusters that contain a target name and
//!    at least one mention; targets left without evidence are reported.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::errors::AwardsError;
use crate::models::{CanonicalTeacher, RawMention};

pub mod aliases;
pub mod normalize;
pub mod prompts;

use normalize::{display_name, is_compatible, normalize_name};

/// Output of a reconciliation pass. `teachers` iterates in lexicographic
/// canonical-name order, which fixes the generation and file order.
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub teachers: BTreeMap<String, CanonicalTeacher>,
    /// Target names (as given) that matched no cluster with evidence.
    pub unmatched: Vec<String>,
}

impl Reconciliation {
    pub fn unmatched_error(&self) -> Option<AwardsError> {
        if self.unmatched.is_empty() {
            None
        } else {
            Some(AwardsError::UnmatchedTeacher {
                names: self.unmatched.clone(),
            })
        }
    }
}

#[derive(Debug, Default)]
struct NameGroup {
    /// Spellings seen in mentions.
    raw_names: BTreeSet<String>,
    /// Spellings only given on the target list.
    target_names: BTreeSet<String>,
    mentions: Vec<usize>,
}

#[derive(Debug)]
struct Cluster {
    keys: Vec<String>,
}

/// Reconciles all mentions, optionally restricted to `targets`.
pub fn reconcile(mentions: Vec<RawMention>, targets: Option<&[String]>) -> Reconciliation {
    let mut groups: BTreeMap<String, NameGroup> = BTreeMap::new();

    for (idx, mention) in mentions.iter().enumerate() {
        let group = groups.entry(normalize_name(&mention.raw_name)).or_default();
        group.raw_names.insert(display_name(&mention.raw_name));
        group.mentions.push(idx);
    }

    // Target names take part in clustering so "Ada Lovelace" on the command
    // line picks up survey rows that only say "Lovelace".
    for target in targets.unwrap_or_default() {
        groups
            .entry(normalize_name(target))
            .or_default()
            .target_names
            .insert(display_name(target));
    }

    let clusters = cluster_keys(groups.keys());

    let mut key_to_cluster: BTreeMap<&str, usize> = BTreeMap::new();
    for (cluster_idx, cluster) in clusters.iter().enumerate() {
        for key in &cluster.keys {
            key_to_cluster.insert(key.as_str(), cluster_idx);
        }
    }

    let retained: BTreeSet<usize>;
    let mut unmatched = Vec::new();

    match targets {
        Some(targets) => {
            let mut keep = BTreeSet::new();
            for target in targets {
                let key = normalize_name(target);
                let has_evidence = key_to_cluster.get(key.as_str()).is_some_and(|&c| {
                    clusters[c]
                        .keys
                        .iter()
                        .any(|k| !groups[k].mentions.is_empty())
                });
                if has_evidence {
                    keep.insert(key_to_cluster[key.as_str()]);
                } else if !unmatched.contains(target) {
                    warn!("No survey comments or email opinions matched '{target}'");
                    unmatched.push(target.clone());
                }
            }
            retained = keep;
        }
        None => retained = (0..clusters.len()).collect(),
    }

    let mut slots: Vec<Option<RawMention>> = mentions.into_iter().map(Some).collect();
    let mut teachers = BTreeMap::new();

    for cluster_idx in retained {
        let cluster = &clusters[cluster_idx];

        let observed: BTreeSet<String> = cluster
            .keys
            .iter()
            .flat_map(|k| groups[k].raw_names.iter().cloned())
            .collect();
        let targeted: BTreeSet<String> = cluster
            .keys
            .iter()
            .flat_map(|k| groups[k].target_names.iter().cloned())
            .collect();

        let mut indices: Vec<usize> = cluster
            .keys
            .iter()
            .flat_map(|k| groups[k].mentions.iter().copied())
            .collect();
        indices.sort_unstable();

        let canonical_name = most_formal(&observed, &targeted);
        let aliases = observed
            .into_iter()
            .chain(targeted)
            .filter(|n| *n != canonical_name)
            .collect();
        let teacher_mentions = indices.into_iter().filter_map(|i| slots[i].take()).collect();

        teachers.insert(
            canonical_name.clone(),
            CanonicalTeacher {
                canonical_name,
                aliases,
                mentions: teacher_mentions,
            },
        );
    }

    Reconciliation {
        teachers,
        unmatched,
    }
}

fn formality(key: &str) -> (usize, usize) {
    (key.split_whitespace().count(), key.chars().count())
}

/// Either name can be a less formal spelling of the other.
fn related(a: &str, b: &str) -> bool {
    is_compatible(a, b) || is_compatible(b, a)
}

/// Assigns every normalized key to exactly one cluster.
fn cluster_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<Cluster> {
    let mut ordered: Vec<&String> = keys.collect();
    // Most formal first; ties broken by key for a stable result.
    ordered.sort_by(|a, b| formality(b).cmp(&formality(a)).then_with(|| a.cmp(b)));

    let mut clusters: Vec<Cluster> = Vec::new();

    for key in &ordered {
        let fits = |cluster: &Cluster, name: &str| {
            cluster.keys.iter().all(|member| related(name, member))
        };
        // "a b lovelace" fits both "ada lovelace" and "alan lovelace"; neither may claim it.
        let contested = |cluster: &Cluster| {
            ordered.iter().any(|other| {
                other != key && !related(key, other) && fits(cluster, other.as_str())
            })
        };

        let candidates: Vec<usize> = clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| fits(*c, key.as_str()) && !contested(*c))
            .map(|(i, _)| i)
            .collect();

        match candidates.as_slice() {
            [only] => clusters[*only].keys.push(key.to_string()),
            [] => clusters.push(Cluster {
                keys: vec![key.to_string()],
            }),
            several => {
                debug!(
                    "'{key}' fits {} clusters; keeping it separate",
                    several.len()
                );
                clusters.push(Cluster {
                    keys: vec![key.to_string()],
                });
            }
        }
    }

    clusters
}

/// Most tokens after normalization, then natural order over "Surname, Given",
/// then the longest spelling (titles count). At equal rank a spelling seen in
/// the sources beats a target-only one; then alphabetical.
fn most_formal(observed: &BTreeSet<String>, targeted: &BTreeSet<String>) -> String {
    let rank = |name: &str| {
        (
            normalize_name(name).split_whitespace().count(),
            !name.contains(','),
            name.chars().count(),
        )
    };
    observed
        .iter()
        .map(|name| (name, true))
        .chain(
            targeted
                .iter()
                .filter(|name| !observed.contains(*name))
                .map(|name| (name, false)),
        )
        .max_by(|(a, a_seen), (b, b_seen)| {
            rank(a.as_str())
                .cmp(&rank(b.as_str()))
                .then(a_seen.cmp(b_seen))
                .then_with(|| b.cmp(a))
        })
        .map(|(name, _)| name.clone())
        .unwrap_or_default()
}

/// Distinct display names seen in `mentions` plus `targets`, sorted.
pub fn known_names(mentions: &[RawMention], targets: Option<&[String]>) -> Vec<String> {
    let names: BTreeSet<String> = mentions
        .iter()
        .map(|m| display_name(&m.raw_name))
        .chain(targets.unwrap_or_default().iter().map(|t| display_name(t)))
        .filter(|n| !n.is_empty())
        .collect();
    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey(name: &str, text: &str) -> RawMention {
        RawMention::survey(name, text, format!("survey.xlsx#{name}"))
    }

    fn email(name: &str, text: &str) -> RawMention {
        RawMention::email(name, text, format!("mail.eml#{name}"))
    }

    #[test]
    fn test_identical_normalized_names_share_a_cluster() {
        let result = reconcile(
            vec![
                survey("Dr. Ada Lovelace", "Clear lectures"),
                survey("ada lovelace", "Patient in office hours"),
            ],
            None,
        );

        assert_eq!(result.teachers.len(), 1);
        let teacher = &result.teachers["Dr. Ada Lovelace"];
        assert_eq!(teacher.mentions.len(), 2);
        assert!(teacher.aliases.contains("ada lovelace"));
    }

    #[test]
    fn test_surname_merges_into_full_name() {
        let result = reconcile(
            vec![
                survey("Lovelace", "Great"),
                email("Dr. Ada Lovelace", "A true asset."),
                survey("A. Lovelace", "Helpful"),
            ],
            None,
        );

        assert_eq!(result.teachers.len(), 1);
        let teacher = &result.teachers["Dr. Ada Lovelace"];
        assert_eq!(teacher.mentions.len(), 3);
        assert_eq!(
            teacher.aliases.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["A. Lovelace", "Lovelace"]
        );
    }

    #[test]
    fn test_unrelated_names_stay_apart() {
        let result = reconcile(
            vec![
                survey("Ada Lovelace", "a"),
                survey("Charles Babbage", "b"),
                survey("Grace Hopper", "c"),
            ],
            None,
        );
        assert_eq!(result.teachers.len(), 3);
    }

    #[test]
    fn test_ambiguous_surname_is_not_merged() {
        let result = reconcile(
            vec![
                survey("Ada Lovelace", "a"),
                survey("Byron Lovelace", "b"),
                survey("Lovelace", "c"),
            ],
            None,
        );

        assert_eq!(result.teachers.len(), 3);
        assert_eq!(result.teachers["Lovelace"].mentions.len(), 1);
        assert_eq!(result.teachers["Ada Lovelace"].mentions.len(), 1);
    }

    #[test]
    fn test_initials_shared_by_two_given_names_are_not_merged() {
        let result = reconcile(
            vec![
                survey("A. B. Lovelace", "a"),
                survey("Ada Lovelace", "b"),
                survey("Alan Lovelace", "c"),
            ],
            None,
        );

        assert_eq!(result.teachers.len(), 3);
        for teacher in result.teachers.values() {
            assert_eq!(teacher.mentions.len(), 1);
            assert!(teacher.aliases.is_empty());
        }
    }

    #[test]
    fn test_conflicting_members_keep_a_name_out() {
        let result = reconcile(
            vec![
                survey("Alan Lovelace", "a"),
                survey("Ada Lovelace", "b"),
                survey("A. Lovelace", "c"),
            ],
            None,
        );

        assert_eq!(result.teachers.len(), 3);
        assert_eq!(result.teachers["A. Lovelace"].mentions.len(), 1);
    }

    #[test]
    fn test_every_mention_lands_in_exactly_one_cluster() {
        let mentions = vec![
            survey("Lovelace", "1"),
            survey("Ada Lovelace", "2"),
            survey("Byron Lovelace", "3"),
            survey("Charles Babbage", "4"),
            email("C. Babbage", "5"),
            survey("Babbage, Charles", "6"),
        ];
        let total = mentions.len();
        let result = reconcile(mentions, None);

        let mut seen: Vec<String> = result
            .teachers
            .values()
            .flat_map(|t| t.mentions.iter().map(|m| m.text.clone()))
            .collect();
        seen.sort();
        assert_eq!(seen.len(), total);
        seen.dedup();
        assert_eq!(seen.len(), total);
        assert_eq!(result.teachers["Charles Babbage"].mentions.len(), 3);
    }

    #[test]
    fn test_output_is_sorted_by_canonical_name() {
        let result = reconcile(
            vec![
                survey("Grace Hopper", "c"),
                survey("Ada Lovelace", "a"),
                survey("Charles Babbage", "b"),
            ],
            None,
        );
        let names: Vec<_> = result.teachers.keys().cloned().collect();
        assert_eq!(names, vec!["Ada Lovelace", "Charles Babbage", "Grace Hopper"]);
    }

    #[test]
    fn test_input_order_does_not_change_clusters() {
        let forward = vec![
            survey("Lovelace", "1"),
            survey("Dr. Ada Lovelace", "2"),
            survey("Charles Babbage", "3"),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let a = reconcile(forward, None);
        let b = reconcile(backward, None);
        assert_eq!(
            a.teachers.keys().collect::<Vec<_>>(),
            b.teachers.keys().collect::<Vec<_>>()
        );
        assert_eq!(
            a.teachers["Dr. Ada Lovelace"].aliases,
            b.teachers["Dr. Ada Lovelace"].aliases
        );
    }

    #[test]
    fn test_mentions_keep_input_order() {
        let result = reconcile(
            vec![
                survey("Ada Lovelace", "first"),
                survey("Charles Babbage", "other"),
                email("Lovelace", "second"),
                survey("ada lovelace", "third"),
            ],
            None,
        );
        let texts: Vec<_> = result.teachers["Ada Lovelace"]
            .mentions
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_targets_filter_clusters() {
        let targets = vec!["ada lovelace".to_string()];
        let result = reconcile(
            vec![
                survey("Dr. Ada Lovelace", "a"),
                survey("Charles Babbage", "b"),
            ],
            Some(&targets),
        );

        assert!(result.unmatched.is_empty());
        assert_eq!(
            result.teachers.keys().collect::<Vec<_>>(),
            vec!["Dr. Ada Lovelace"]
        );
    }

    #[test]
    fn test_target_picks_up_surname_only_mentions() {
        let targets = vec!["Ada Lovelace".to_string()];
        let result = reconcile(vec![survey("Lovelace", "Great teacher")], Some(&targets));

        assert!(result.unmatched.is_empty());
        let teacher = &result.teachers["Ada Lovelace"];
        assert_eq!(teacher.mentions.len(), 1);
        assert!(teacher.aliases.contains("Lovelace"));
    }

    #[test]
    fn test_observed_spelling_beats_target_spelling() {
        let targets = vec!["ADA LOVELACE".to_string()];
        let result = reconcile(vec![survey("Ada Lovelace", "Great")], Some(&targets));

        let teacher = &result.teachers["Ada Lovelace"];
        assert_eq!(teacher.canonical_name, "Ada Lovelace");
        assert!(teacher.aliases.contains("ADA LOVELACE"));
    }

    #[test]
    fn test_more_formal_target_spelling_still_wins() {
        let targets = vec!["Dr. Ada Lovelace".to_string()];
        let result = reconcile(vec![survey("Ada Lovelace", "Great")], Some(&targets));

        assert_eq!(
            result.teachers.keys().collect::<Vec<_>>(),
            vec!["Dr. Ada Lovelace"]
        );
    }

    #[test]
    fn test_target_without_evidence_is_unmatched() {
        let targets = vec!["Dr. Ada Lovelace".to_string()];
        let result = reconcile(vec![survey("Charles Babbage", "b")], Some(&targets));

        assert!(result.teachers.is_empty());
        assert_eq!(result.unmatched, vec!["Dr. Ada Lovelace"]);
        match result.unmatched_error() {
            Some(AwardsError::UnmatchedTeacher { names }) => {
                assert_eq!(names, vec!["Dr. Ada Lovelace"])
            }
            other => panic!("expected UnmatchedTeacher, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_targets_reported_once() {
        let targets = vec!["Grace Hopper".to_string(), "Grace Hopper".to_string()];
        let result = reconcile(Vec::new(), Some(&targets));
        assert_eq!(result.unmatched, vec!["Grace Hopper"]);
    }

    #[test]
    fn test_known_names_are_distinct_and_sorted() {
        let targets = vec!["Grace  Hopper".to_string()];
        let names = known_names(
            &[survey("Ada Lovelace", "a"), survey(" Ada Lovelace ", "b")],
            Some(&targets),
        );
        assert_eq!(names, vec!["Ada Lovelace", "Grace Hopper"]);
    }
}
