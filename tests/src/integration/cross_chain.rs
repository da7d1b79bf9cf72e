//! Approvals signed on another chain: the signature binds the
//! `(source, destination)` pair and the workflow.

#[cfg(test)]
mod tests {
    use super::super::harness::Harness;
    use crate::fixtures::{transfer, transfer_rule, Approver, T0};
    use qg_03_workflow_manager::{WorkflowError, WorkflowManagerApi, WorkflowStatus};

    fn setup(required: u32) -> (Harness, Approver, Approver) {
        let h = Harness::on_chain(1);
        let (a, b) = (Approver::random(), Approver::random());
        h.gate
            .add_rule(transfer_rule("bridge", 0, required, &[&a, &b]))
            .unwrap();
        (h, a, b)
    }

    #[test]
    fn test_cross_chain_approval_accepted() {
        let (h, a, _) = setup(1);
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();

        let state = h.approve_from(wf.id, &a, 137).unwrap();
        assert_eq!(state.status, WorkflowStatus::Approved);
        assert_eq!(state.approvals[0].source_chain_id, Some(137));
    }

    #[test]
    fn test_mixed_paths_share_quorum() {
        let (h, a, b) = setup(2);
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();

        assert_eq!(h.approve(wf.id, &a).unwrap().status, WorkflowStatus::Pending);
        let done = h.approve_from(wf.id, &b, 42161).unwrap();
        assert_eq!(done.status, WorkflowStatus::Approved);
        assert_eq!(done.approvals[0].source_chain_id, None);
        assert_eq!(done.approvals[1].source_chain_id, Some(42161));
    }

    #[test]
    fn test_replay_with_other_source_chain_fails() {
        let (h, a, _) = setup(1);
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();
        let message = h.gate.workflows().approval_message(wf.id, &a.address, T0).unwrap();
        let signature = a.sign_cross_chain(137, 1, &message, T0);

        let err = h
            .gate
            .workflows()
            .submit_cross_chain_approval(wf.id, a.address, 10, signature.clone(), None)
            .unwrap_err();
        assert_eq!(err, WorkflowError::InvalidSignature);

        let ok = h
            .gate
            .workflows()
            .submit_cross_chain_approval(wf.id, a.address, 137, signature, None)
            .unwrap();
        assert_eq!(ok.status, WorkflowStatus::Approved);
    }

    #[test]
    fn test_replay_against_other_destination_fails() {
        let (h, a, _) = setup(1);
        let on_bsc = h.gate.workflows().create_workflow(transfer(56, 10)).unwrap();
        let message = h
            .gate
            .workflows()
            .approval_message(on_bsc.id, &a.address, T0)
            .unwrap();

        let framed_for_mainnet = a.sign_cross_chain(137, 1, &message, T0);
        let err = h
            .gate
            .workflows()
            .submit_cross_chain_approval(on_bsc.id, a.address, 137, framed_for_mainnet, None)
            .unwrap_err();
        assert_eq!(err, WorkflowError::InvalidSignature);

        let framed_for_bsc = a.sign_cross_chain(137, 56, &message, T0);
        assert!(h
            .gate
            .workflows()
            .submit_cross_chain_approval(on_bsc.id, a.address, 137, framed_for_bsc, None)
            .is_ok());
        assert_eq!(h.gate.verifiers().registered_chains(), vec![56]);
    }

    #[test]
    fn test_unsupported_source_chain_fails() {
        let (h, a, _) = setup(1);
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();
        assert_eq!(
            h.approve_from(wf.id, &a, 999).unwrap_err(),
            WorkflowError::InvalidSignature
        );
        assert!(h.gate.workflows().get_workflow(wf.id).unwrap().is_pending());
    }

    #[test]
    fn test_paths_are_not_interchangeable() {
        let (h, a, _) = setup(1);
        let wf = h.gate.workflows().create_workflow(transfer(1, 10)).unwrap();
        let message = h.gate.workflows().approval_message(wf.id, &a.address, T0).unwrap();

        let direct = a.sign(&message, T0);
        assert_eq!(
            h.gate
                .workflows()
                .submit_cross_chain_approval(wf.id, a.address, 1, direct, None)
                .unwrap_err(),
            WorkflowError::InvalidSignature
        );

        let cross = a.sign_cross_chain(137, 1, &message, T0);
        assert_eq!(
            h.gate
                .workflows()
                .submit_approval(wf.id, a.address, cross, None)
                .unwrap_err(),
            WorkflowError::InvalidSignature
        );
    }
}
