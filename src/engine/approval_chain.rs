//! Approval chains are stored as unordered rows linked by predecessor ids.
//! This module rebuilds the order and decides what an approver's action
//! does to the chain.

use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use crate::model::leave_request::RequestStatus;
use crate::model::request_approver::{ApproverStatus, RequestApprover};

#[derive(Debug, Clone)]
pub struct SortedChain<'a> {
    pub approvers: Vec<&'a RequestApprover>,
    /// Some input rows could not be placed: no head, a cycle, a broken
    /// link or more than one head.
    pub was_truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproverField {
    Name,
    Email,
}

impl ApproverField {
    fn value<'a>(&self, approver: &'a RequestApprover) -> Option<&'a str> {
        match self {
            ApproverField::Name => approver.approver_name.as_deref(),
            ApproverField::Email => approver.approver_email.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Decline,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("member {0} is not the current approver")]
    NotCurrentApprover(u64),
    #[error("approver {0} appears more than once")]
    DuplicateApprover(u64),
}

/// Status changes produced by one approver decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    /// `(request_approver.id, new status)`
    pub approver_updates: Vec<(u64, ApproverStatus)>,
    pub request_status: Option<RequestStatus>,
}

/// Orders `nodes` from the first approver to the last.
///
/// The head is the first node without a predecessor. The walk then keeps
/// taking the first node whose predecessor is the tail's member id and stops
/// as soon as that node was already taken.
pub fn sort_approvers(nodes: &[RequestApprover]) -> SortedChain<'_> {
    let mut order: Vec<usize> = Vec::with_capacity(nodes.len());

    if let Some(head) = nodes
        .iter()
        .position(|n| n.predecessor_request_member_approver_id.is_none())
    {
        order.push(head);
        while let Some(&tail) = order.last() {
            let tail_member = nodes[tail].approver_member_id;
            let Some(next) = nodes
                .iter()
                .position(|n| n.predecessor_request_member_approver_id == Some(tail_member))
            else {
                break;
            };
            if order.contains(&next) {
                break;
            }
            order.push(next);
        }
    }

    let was_truncated = order.len() < nodes.len();
    if was_truncated {
        warn!(
            request_id = nodes.first().map(|n| n.request_id),
            kept = order.len(),
            total = nodes.len(),
            "Approval chain is malformed, returning partial chain"
        );
    }

    SortedChain {
        approvers: order.into_iter().map(|i| &nodes[i]).collect(),
        was_truncated,
    }
}

/// Value of `field` for the approver at 1-based `index`.
///
/// Falls back to the nearest earlier approver with a non-empty value, so
/// `{{approverName[3]}}` on a two-step chain yields the second approver.
/// An index of `0` is treated as `1`.
pub fn approver_value(nodes: &[RequestApprover], index: usize, field: ApproverField) -> String {
    let chain = sort_approvers(nodes);
    let Some(last) = chain.approvers.len().checked_sub(1) else {
        return String::new();
    };
    let position = index.saturating_sub(1).min(last);

    chain.approvers[..=position]
        .iter()
        .rev()
        .find_map(|a| field.value(a).filter(|v| !v.is_empty()))
        .map(str::to_owned)
        .unwrap_or_default()
}

/// The approver whose decision is awaited, if any.
///
/// A decline anywhere before the first pending node closes the chain.
pub fn current_approver<'a>(chain: &SortedChain<'a>) -> Option<&'a RequestApprover> {
    for approver in &chain.approvers {
        match approver.status {
            ApproverStatus::Pending => return Some(*approver),
            ApproverStatus::Declined | ApproverStatus::DeclinedByAnotherManager => return None,
            _ => {}
        }
    }
    None
}

/// Applies `decision` by `member_id` to the chain.
pub fn apply_decision(
    chain: &SortedChain<'_>,
    member_id: u64,
    decision: Decision,
) -> Result<DecisionOutcome, ChainError> {
    let current = current_approver(chain)
        .filter(|a| a.approver_member_id == member_id)
        .ok_or(ChainError::NotCurrentApprover(member_id))?;

    let outcome = match decision {
        Decision::Approve => {
            let is_last = chain
                .approvers
                .iter()
                .skip_while(|a| a.id != current.id)
                .skip(1)
                .all(|a| a.status != ApproverStatus::Pending);
            DecisionOutcome {
                approver_updates: vec![(current.id, ApproverStatus::Approved)],
                request_status: is_last.then_some(RequestStatus::Approved),
            }
        }
        Decision::Decline => {
            let mut updates = vec![(current.id, ApproverStatus::Declined)];
            updates.extend(
                chain
                    .approvers
                    .iter()
                    .filter(|a| a.id != current.id && a.status == ApproverStatus::Pending)
                    .map(|a| (a.id, ApproverStatus::DeclinedByAnotherManager)),
            );
            DecisionOutcome {
                approver_updates: updates,
                request_status: Some(RequestStatus::Declined),
            }
        }
    };
    Ok(outcome)
}

/// Predecessor links for a chain written in the given order.
pub fn link_approvers(member_ids: &[u64]) -> Result<Vec<(u64, Option<u64>)>, ChainError> {
    let mut seen = HashSet::with_capacity(member_ids.len());
    let mut links = Vec::with_capacity(member_ids.len());
    let mut predecessor = None;
    for &member_id in member_ids {
        if !seen.insert(member_id) {
            return Err(ChainError::DuplicateApprover(member_id));
        }
        links.push((member_id, predecessor));
        predecessor = Some(member_id);
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, member: u64, predecessor: Option<u64>) -> RequestApprover {
        RequestApprover {
            id,
            request_id: 1,
            approver_member_id: member,
            predecessor_request_member_approver_id: predecessor,
            status: ApproverStatus::Pending,
            status_changed_date: None,
            reason: None,
            approver_name: Some(format!("Approver {member}")),
            approver_email: Some(format!("approver{member}@example.com")),
        }
    }

    fn named(id: u64, member: u64, predecessor: Option<u64>, name: &str) -> RequestApprover {
        RequestApprover {
            approver_name: Some(name.to_string()),
            ..node(id, member, predecessor)
        }
    }

    fn members(chain: &SortedChain<'_>) -> Vec<u64> {
        chain.approvers.iter().map(|a| a.approver_member_id).collect()
    }

    #[test]
    fn shuffled_chain_comes_back_in_link_order() {
        let nodes = vec![
            node(3, 30, Some(20)),
            node(1, 10, None),
            node(4, 40, Some(30)),
            node(2, 20, Some(10)),
        ];
        let chain = sort_approvers(&nodes);
        assert_eq!(members(&chain), vec![10, 20, 30, 40]);
        assert!(!chain.was_truncated);
    }

    #[test]
    fn empty_input_is_an_empty_untruncated_chain() {
        let chain = sort_approvers(&[]);
        assert!(chain.approvers.is_empty());
        assert!(!chain.was_truncated);
    }

    #[test]
    fn missing_head_yields_empty_chain() {
        let nodes = vec![node(1, 10, Some(20)), node(2, 20, Some(10))];
        let chain = sort_approvers(&nodes);
        assert!(chain.approvers.is_empty());
        assert!(chain.was_truncated);
    }

    #[test]
    fn cycle_back_into_the_chain_terminates() {
        // 10 -> 20 -> 30, and 30's member reappears as the predecessor of 20.
        let nodes = vec![
            node(1, 10, None),
            node(2, 20, Some(10)),
            node(3, 30, Some(20)),
            node(4, 20, Some(30)),
        ];
        let chain = sort_approvers(&nodes);
        assert_eq!(members(&chain), vec![10, 20, 30, 20]);
        assert!(!chain.was_truncated);

        let looping = vec![node(1, 10, None), node(2, 20, Some(10)), node(3, 10, Some(20))];
        let chain = sort_approvers(&looping);
        assert_eq!(members(&chain), vec![10, 20, 10]);
    }

    #[test]
    fn detached_cycle_is_dropped_and_flagged() {
        let nodes = vec![node(1, 10, None), node(2, 20, Some(30)), node(3, 30, Some(20))];
        let chain = sort_approvers(&nodes);
        assert_eq!(members(&chain), vec![10]);
        assert!(chain.was_truncated);
    }

    #[test]
    fn second_head_is_dropped_and_flagged() {
        let nodes = vec![node(1, 10, None), node(2, 20, None), node(3, 30, Some(10))];
        let chain = sort_approvers(&nodes);
        assert_eq!(members(&chain), vec![10, 30]);
        assert!(chain.was_truncated);
    }

    #[test]
    fn shared_predecessor_keeps_the_first_branch() {
        let nodes = vec![node(1, 10, None), node(2, 20, Some(10)), node(3, 30, Some(10))];
        let chain = sort_approvers(&nodes);
        assert_eq!(members(&chain), vec![10, 20]);
        assert!(chain.was_truncated);
    }

    #[test]
    fn approver_value_falls_back_to_last_available() {
        let nodes = vec![named(1, 10, None, "A"), named(2, 20, Some(10), "B")];
        assert_eq!(approver_value(&nodes, 5, ApproverField::Name), "B");
        assert_eq!(approver_value(&nodes, 1, ApproverField::Name), "A");
        assert_eq!(approver_value(&nodes, 2, ApproverField::Email), "approver20@example.com");
    }

    #[test]
    fn approver_value_on_empty_chain_is_empty() {
        assert_eq!(approver_value(&[], 0, ApproverField::Name), "");
    }

    #[test]
    fn approver_value_skips_blank_entries_backwards() {
        let nodes = vec![
            named(1, 10, None, "A"),
            named(2, 20, Some(10), ""),
            RequestApprover { approver_name: None, ..node(3, 30, Some(20)) },
        ];
        assert_eq!(approver_value(&nodes, 3, ApproverField::Name), "A");
        assert_eq!(approver_value(&nodes, 0, ApproverField::Name), "A");
    }

    #[test]
    fn only_the_current_approver_may_decide() {
        let nodes = vec![node(1, 10, None), node(2, 20, Some(10))];
        let chain = sort_approvers(&nodes);
        assert_eq!(current_approver(&chain).map(|a| a.approver_member_id), Some(10));
        assert_eq!(
            apply_decision(&chain, 20, Decision::Approve),
            Err(ChainError::NotCurrentApprover(20))
        );
    }

    #[test]
    fn approving_advances_and_last_approval_approves_request() {
        let mut nodes = vec![node(1, 10, None), node(2, 20, Some(10))];
        let chain = sort_approvers(&nodes);
        let first = apply_decision(&chain, 10, Decision::Approve).unwrap();
        assert_eq!(first.approver_updates, vec![(1, ApproverStatus::Approved)]);
        assert_eq!(first.request_status, None);

        nodes[0].status = ApproverStatus::Approved;
        let chain = sort_approvers(&nodes);
        assert_eq!(current_approver(&chain).map(|a| a.id), Some(2));
        let last = apply_decision(&chain, 20, Decision::Approve).unwrap();
        assert_eq!(last.request_status, Some(RequestStatus::Approved));
    }

    #[test]
    fn declining_closes_the_rest_of_the_chain() {
        let nodes = vec![node(1, 10, None), node(2, 20, Some(10)), node(3, 30, Some(20))];
        let chain = sort_approvers(&nodes);
        let outcome = apply_decision(&chain, 10, Decision::Decline).unwrap();
        assert_eq!(
            outcome.approver_updates,
            vec![
                (1, ApproverStatus::Declined),
                (2, ApproverStatus::DeclinedByAnotherManager),
                (3, ApproverStatus::DeclinedByAnotherManager),
            ]
        );
        assert_eq!(outcome.request_status, Some(RequestStatus::Declined));
    }

    #[test]
    fn links_follow_list_order_and_reject_duplicates() {
        assert_eq!(
            link_approvers(&[10, 20, 30]).unwrap(),
            vec![(10, None), (20, Some(10)), (30, Some(20))]
        );
        assert_eq!(link_approvers(&[10, 20, 10]), Err(ChainError::DuplicateApprover(10)));
    }
}
