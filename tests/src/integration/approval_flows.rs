//! Direct approvals end to end: quorum, replay, freshness, expiry and
//! rejection.

#[cfg(test)]
mod tests {
    use super::super::harness::Harness;
    use crate::fixtures::{transfer, transfer_rule, Approver, MINUTE_MS, T0};
    use qg_03_workflow_manager::{WorkflowError, WorkflowManagerApi, WorkflowStatus};
    use shared_types::{ApprovalConfig, ApprovalConfigBuilder, TimeSource};
    use std::time::Duration;

    #[test]
    fn test_two_of_three_scenario() {
        let h = Harness::on_chain(1);
        let (a, b, c) = (Approver::random(), Approver::random(), Approver::random());
        h.gate
            .add_rule(transfer_rule("treasury", 1_000, 2, &[&a, &b, &c]))
            .unwrap();

        let wf = h.gate.workflows().create_workflow(transfer(1, 5_000)).unwrap();
        assert_eq!(wf.status, WorkflowStatus::Pending);
        assert_eq!(wf.matched_rules[0].remaining_approvals, 2);

        let after_b = h.approve(wf.id, &b).unwrap();
        assert_eq!(after_b.status, WorkflowStatus::Pending);
        assert_eq!(after_b.matched_rules[0].remaining_approvals, 1);

        let after_a = h.approve(wf.id, &a).unwrap();
        assert_eq!(after_a.status, WorkflowStatus::Approved);

        let err = h.approve(wf.id, &c).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidState {
                id: wf.id,
                status: WorkflowStatus::Approved
            }
        );
    }

    #[test]
    fn test_quorum_independent_of_order() {
        let approvers: Vec<Approver> = (0..4).map(|_| Approver::random()).collect();
        let refs: Vec<&Approver> = approvers.iter().collect();

        for order in [[0, 1, 2], [2, 1, 0], [3, 0, 2]] {
            let h = Harness::on_chain(1);
            h.gate.add_rule(transfer_rule("r", 0, 3, &refs)).unwrap();
            let wf = h.gate.workflows().create_workflow(transfer(1, 1)).unwrap();

            for (n, &who) in order.iter().enumerate() {
                let state = h.approve(wf.id, &approvers[who]).unwrap();
                let expected = if n == 2 {
                    WorkflowStatus::Approved
                } else {
                    WorkflowStatus::Pending
                };
                assert_eq!(state.status, expected);
            }
        }
    }

    #[test]
    fn test_duplicate_never_double_counts() {
        let h = Harness::on_chain(1);
        let (a, b) = (Approver::random(), Approver::random());
        h.gate.add_rule(transfer_rule("r", 0, 2, &[&a, &b])).unwrap();
        let wf = h.gate.workflows().create_workflow(transfer(1, 1)).unwrap();

        h.approve(wf.id, &a).unwrap();
        h.clock.advance(1_000);
        let err = h.approve(wf.id, &a).unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateApproval { .. }));

        let state = h.gate.workflows().get_workflow(wf.id).unwrap();
        assert_eq!(state.matched_rules[0].remaining_approvals, 1);
        assert_eq!(state.status, WorkflowStatus::Pending);
    }

    #[test]
    fn test_signature_from_other_key_is_opaque_failure() {
        let h = Harness::on_chain(1);
        let (a, mallory) = (Approver::random(), Approver::random());
        h.gate.add_rule(transfer_rule("r", 0, 1, &[&a])).unwrap();
        let wf = h.gate.workflows().create_workflow(transfer(1, 1)).unwrap();

        let message = h.gate.workflows().approval_message(wf.id, &a.address, T0).unwrap();
        let forged = mallory.sign(&message, T0);
        let err = h
            .gate
            .workflows()
            .submit_approval(wf.id, a.address, forged, None)
            .unwrap_err();
        assert_eq!(err, WorkflowError::InvalidSignature);
        assert_eq!(err.to_string(), "Signature verification failed");
        assert!(h.gate.workflows().get_workflow(wf.id).unwrap().approvals.is_empty());
    }

    #[test]
    fn test_signature_cannot_be_replayed_on_another_workflow() {
        let h = Harness::on_chain(1);
        let a = Approver::random();
        h.gate.add_rule(transfer_rule("r", 0, 1, &[&a])).unwrap();
        let first = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();
        let second = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();

        let message = h
            .gate
            .workflows()
            .approval_message(first.id, &a.address, T0)
            .unwrap();
        let signature = a.sign(&message, T0);

        let err = h
            .gate
            .workflows()
            .submit_approval(second.id, a.address, signature.clone(), None)
            .unwrap_err();
        assert_eq!(err, WorkflowError::InvalidSignature);

        let ok = h
            .gate
            .workflows()
            .submit_approval(first.id, a.address, signature, None)
            .unwrap();
        assert_eq!(ok.status, WorkflowStatus::Approved);
    }

    #[test]
    fn test_signed_at_is_bound_into_message() {
        let h = Harness::on_chain(1);
        let a = Approver::random();
        h.gate.add_rule(transfer_rule("r", 0, 1, &[&a])).unwrap();
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();

        let message = h.gate.workflows().approval_message(wf.id, &a.address, T0).unwrap();
        let mut signature = a.sign(&message, T0);
        signature.timestamp = T0 + 1;
        let err = h
            .gate
            .workflows()
            .submit_approval(wf.id, a.address, signature, None)
            .unwrap_err();
        assert_eq!(err, WorkflowError::InvalidSignature);
    }

    #[test]
    fn test_stale_and_future_signatures_refused() {
        let config = ApprovalConfigBuilder::new()
            .chain_id(1)
            .default_timeout_minutes(3 * 24 * 60)
            .max_signature_age(Duration::from_secs(3_600))
            .build()
            .unwrap();
        let h = Harness::new(config);
        let a = Approver::random();
        h.gate.add_rule(transfer_rule("r", 0, 1, &[&a])).unwrap();
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();

        let message = h.gate.workflows().approval_message(wf.id, &a.address, T0).unwrap();
        let old = a.sign(&message, T0);
        h.clock.advance(61 * MINUTE_MS);
        assert_eq!(
            h.gate
                .workflows()
                .submit_approval(wf.id, a.address, old, None)
                .unwrap_err(),
            WorkflowError::InvalidSignature
        );

        let ahead = h.clock.now() + 10 * MINUTE_MS;
        let message = h
            .gate
            .workflows()
            .approval_message(wf.id, &a.address, ahead)
            .unwrap();
        let future = a.sign(&message, ahead);
        assert_eq!(
            h.gate
                .workflows()
                .submit_approval(wf.id, a.address, future, None)
                .unwrap_err(),
            WorkflowError::InvalidSignature
        );

        assert_eq!(h.approve(wf.id, &a).unwrap().status, WorkflowStatus::Approved);
    }

    #[test]
    fn test_expired_workflow_never_approves() {
        let h = Harness::on_chain(1);
        let a = Approver::random();
        h.gate.add_rule(transfer_rule("r", 0, 1, &[&a])).unwrap();
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();
        assert_eq!(wf.expires_at, Some(T0 + 60 * MINUTE_MS));

        h.clock.advance(60 * MINUTE_MS + 1);
        assert_eq!(h.approve(wf.id, &a).unwrap_err(), WorkflowError::Expired(wf.id));
        assert_eq!(
            h.gate.workflows().get_workflow(wf.id).unwrap().status,
            WorkflowStatus::Expired
        );
        assert!(matches!(
            h.approve(wf.id, &a).unwrap_err(),
            WorkflowError::InvalidState { .. }
        ));
    }

    #[test]
    fn test_rejection_is_terminal() {
        let h = Harness::on_chain(1);
        let (a, b) = (Approver::random(), Approver::random());
        h.gate.add_rule(transfer_rule("r", 0, 2, &[&a, &b])).unwrap();
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();

        h.approve(wf.id, &a).unwrap();
        let rejected = h
            .gate
            .workflows()
            .reject_workflow(wf.id, b.address, Some("unknown recipient".to_string()))
            .unwrap();
        assert_eq!(rejected.status, WorkflowStatus::Rejected);

        let err = h.approve(wf.id, &b).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidState {
                id: wf.id,
                status: WorkflowStatus::Rejected
            }
        );
        assert!(h
            .gate
            .workflows()
            .get_approver_pending_workflows(&b.address)
            .is_empty());
    }

    #[test]
    fn test_unmatched_context_fails_closed() {
        let h = Harness::on_chain(1);
        let a = Approver::random();
        h.gate.add_rule(transfer_rule("r", 1_000, 1, &[&a])).unwrap();
        assert_eq!(
            h.gate
                .workflows()
                .create_workflow(transfer(1, 999))
                .unwrap_err(),
            WorkflowError::NoMatchingRule
        );
    }

    #[test]
    fn test_capacity_backpressure() {
        let mut config = ApprovalConfig::for_chain(1);
        config.max_pending_workflows = 3;
        let h = Harness::new(config);
        let a = Approver::random();
        h.gate.add_rule(transfer_rule("r", 0, 1, &[&a])).unwrap();

        let ids: Vec<_> = (0..3)
            .map(|_| h.gate.workflows().create_workflow(transfer(1, 1)).unwrap().id)
            .collect();
        assert!(matches!(
            h.gate.workflows().create_workflow(transfer(1, 1)),
            Err(WorkflowError::Capacity { pending: 3, max: 3 })
        ));

        h.approve(ids[0], &a).unwrap();
        assert!(h.gate.workflows().create_workflow(transfer(1, 1)).is_ok());
    }
}
