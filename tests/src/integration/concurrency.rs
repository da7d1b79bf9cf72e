//! Racing approvals, rejections and sweeps on shared workflows.

#[cfg(test)]
mod tests {
    use super::super::harness::Harness;
    use crate::fixtures::{transfer, transfer_rule, Approver, MINUTE_MS, T0};
    use qg_03_workflow_manager::{WorkflowError, WorkflowManagerApi, WorkflowState, WorkflowStatus};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_racing_approvals_cross_quorum_exactly_once() {
        let h = Harness::on_chain(1);
        let approvers: Vec<Approver> = (0..6).map(|_| Approver::random()).collect();
        let refs: Vec<&Approver> = approvers.iter().collect();
        h.gate.add_rule(transfer_rule("r", 0, 3, &refs)).unwrap();

        for _ in 0..10 {
            let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();
            let signed: Vec<_> = approvers
                .iter()
                .map(|a| {
                    let message = h
                        .gate
                        .workflows()
                        .approval_message(wf.id, &a.address, T0)
                        .unwrap();
                    (a.address, a.sign(&message, T0))
                })
                .collect();

            let barrier = Barrier::new(signed.len());
            let results: Vec<Result<WorkflowState, WorkflowError>> = thread::scope(|s| {
                let handles: Vec<_> = signed
                    .into_iter()
                    .map(|(address, signature)| {
                        let (h, barrier) = (&h, &barrier);
                        s.spawn(move || {
                            barrier.wait();
                            h.gate
                                .workflows()
                                .submit_approval(wf.id, address, signature, None)
                        })
                    })
                    .collect();
                handles.into_iter().map(|t| t.join().unwrap()).collect()
            });

            let accepted: Vec<&WorkflowState> =
                results.iter().filter_map(|r| r.as_ref().ok()).collect();
            assert_eq!(accepted.len(), 3);
            assert_eq!(
                accepted
                    .iter()
                    .filter(|w| w.status == WorkflowStatus::Approved)
                    .count(),
                1
            );

            let state = h.gate.workflows().get_workflow(wf.id).unwrap();
            assert_eq!(state.status, WorkflowStatus::Approved);
            assert_eq!(state.approvals.len(), 3);
            assert_eq!(state.matched_rules[0].remaining_approvals, 0);
        }
    }

    #[test]
    fn test_rejection_racing_approvals_stays_consistent() {
        let h = Harness::on_chain(1);
        let (a, b, c) = (Approver::random(), Approver::random(), Approver::random());
        h.gate.add_rule(transfer_rule("r", 0, 2, &[&a, &b, &c])).unwrap();

        for _ in 0..10 {
            let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();
            let sign = |who: &Approver| {
                let message = h
                    .gate
                    .workflows()
                    .approval_message(wf.id, &who.address, T0)
                    .unwrap();
                who.sign(&message, T0)
            };
            let (sig_a, sig_b) = (sign(&a), sign(&b));
            let barrier = Barrier::new(3);

            thread::scope(|s| {
                s.spawn(|| {
                    barrier.wait();
                    let _ = h.gate.workflows().submit_approval(wf.id, a.address, sig_a, None);
                });
                s.spawn(|| {
                    barrier.wait();
                    let _ = h.gate.workflows().submit_approval(wf.id, b.address, sig_b, None);
                });
                s.spawn(|| {
                    barrier.wait();
                    let _ = h.gate.workflows().reject_workflow(wf.id, c.address, None);
                });
            });

            let state = h.gate.workflows().get_workflow(wf.id).unwrap();
            match state.status {
                WorkflowStatus::Approved => {
                    assert_eq!(state.approvals.len(), 2);
                    assert!(!state.metadata.contains_key("rejected_by"));
                }
                WorkflowStatus::Rejected => {
                    assert!(state.approvals.len() < 2);
                    assert!(state.metadata.contains_key("rejected_by"));
                }
                other => panic!("unexpected status {other}"),
            }
        }
    }

    #[test]
    fn test_sweep_racing_approvals_across_expiry() {
        let h = Harness::on_chain(1);
        let a = Approver::random();
        h.gate.add_rule(transfer_rule("r", 0, 1, &[&a])).unwrap();

        let ids: Vec<_> = (0..50)
            .map(|_| h.gate.workflows().create_workflow(transfer(1, 10)).unwrap().id)
            .collect();
        let expires_at = T0 + 60 * MINUTE_MS;
        h.clock.set(expires_at);
        assert_eq!(h.gate.workflows().cleanup_expired_workflows().expired, 0);

        let results: Vec<_> = thread::scope(|s| {
            let approvals = s.spawn(|| {
                ids.iter()
                    .map(|id| (*id, h.approve(*id, &a)))
                    .collect::<Vec<_>>()
            });
            s.spawn(|| {
                for round in 0..50 {
                    if round == 25 {
                        h.clock.set(expires_at + 1);
                    }
                    h.gate.workflows().cleanup_expired_workflows();
                }
            });
            approvals.join().unwrap()
        });
        h.gate.workflows().cleanup_expired_workflows();

        for (id, result) in results {
            let state = h.gate.workflows().get_workflow(id).unwrap();
            match result {
                Ok(_) => {
                    assert_eq!(state.status, WorkflowStatus::Approved);
                    assert_eq!(state.approvals.len(), 1);
                }
                Err(err) => {
                    assert!(matches!(
                        err,
                        WorkflowError::Expired(_)
                            | WorkflowError::InvalidState {
                                status: WorkflowStatus::Expired,
                                ..
                            }
                    ));
                    assert_eq!(state.status, WorkflowStatus::Expired);
                    assert!(state.approvals.is_empty());
                }
            }
        }

        let stats = h.gate.workflows().stats();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.approved + stats.expired, 50);
    }
}
