use std::sync::Arc;

use super::common::*;
use crate::workflows::governance::{
    ActivationGateError, ConfigStatus, ConfigVersionId, CycleId, CycleType, DecisionQuery,
    GovernanceError, GovernanceService, RepositoryError, SimulationRunId,
};
use crate::workflows::simulation::{CompletenessResult, PricingMode, SimulationRequestError};

#[test]
fn simulate_records_run_scaled_by_segment_customers() {
    let (service, repository) = build_service();

    let run = service
        .simulate(simulation_request(CANDIDATE, Some(ACTIVE)))
        .expect("simulation succeeds");

    assert_eq!(run.config_version_id, ConfigVersionId::from(CANDIDATE));
    assert_eq!(
        run.baseline_config_version_id,
        Some(ConfigVersionId::from(ACTIVE))
    );
    assert_eq!(run.input.segment_customer_count, 2);
    assert_eq!(run.input.pricing_mode, PricingMode::RevenueProxyCommit);
    assert_eq!(run.completeness_result, CompletenessResult::Green);

    let summary = &run.output.economics_summary;
    assert_eq!(summary.revenue_billed_usd, 600.0);
    assert_eq!(summary.cost_usd, 300.0);
    let baseline = run.output.baseline_summary.as_ref().expect("baseline ran");
    assert_eq!(baseline.revenue_billed_usd, 600.0);

    let stored = repository
        .state
        .lock()
        .expect("repository mutex poisoned")
        .runs
        .contains_key(&run.simulation_run_id);
    assert!(stored);
}

#[test]
fn none_baseline_runs_candidate_alone() {
    let (service, _) = build_service();

    let run = service
        .simulate(simulation_request(CANDIDATE, Some("none")))
        .expect("simulation succeeds");

    assert!(run.baseline_config_version_id.is_none());
    assert!(run.output.baseline_summary.is_none());
}

#[test]
fn unknown_baseline_is_dropped() {
    let (service, _) = build_service();

    let run = service
        .simulate(simulation_request(CANDIDATE, Some("cfg_retired")))
        .expect("simulation succeeds");

    assert!(run.baseline_config_version_id.is_none());
}

#[test]
fn simulate_rejects_unknown_candidate() {
    let (service, _) = build_service();

    let err = service
        .simulate(simulation_request("cfg_missing", None))
        .expect_err("candidate missing");

    assert!(matches!(err, GovernanceError::CandidateNotFound(id) if id.0 == "cfg_missing"));
}

#[test]
fn simulate_rejects_invalid_settings_before_touching_storage() {
    let (service, repository) = build_service();
    let mut request = simulation_request(CANDIDATE, None);
    request.settings.pricing_mode = Some("flat_fee".to_string());

    let err = service.simulate(request).expect_err("invalid mode");

    assert!(matches!(
        err,
        GovernanceError::Request(SimulationRequestError::InvalidPricingMode(_))
    ));
    assert!(repository
        .state
        .lock()
        .expect("repository mutex poisoned")
        .runs
        .is_empty());
}

#[test]
fn approve_archives_prior_active_and_activates_candidate() {
    let (service, repository) = build_service();
    let run = service
        .simulate(simulation_request(CANDIDATE, Some(ACTIVE)))
        .expect("simulation succeeds");

    let outcome = service
        .approve(&approval_request(CANDIDATE, &run.simulation_run_id))
        .expect("approval succeeds");

    assert_eq!(outcome.status, ConfigStatus::Active);
    assert_eq!(repository.status_of(ACTIVE), Some(ConfigStatus::Archived));
    assert_eq!(repository.status_of(CANDIDATE), Some(ConfigStatus::Active));

    let bundle = service
        .decision(&outcome.decision_id)
        .expect("decision stored");
    assert_eq!(
        bundle.decision.baseline_config_version_id,
        Some(ConfigVersionId::from(ACTIVE))
    );
    assert_eq!(bundle.decision.approved_by(), "Dana Ruiz, Head of Pricing");
    assert!(bundle.decision.diff.pools_changed());
    let patch = bundle.billing_patch.expect("patch stored");
    assert_eq!(patch.billing_patch_id, outcome.billing_patch_id);
    assert_eq!(patch.workspace_id, "ws_1049");
    let config = bundle.config.expect("config stored");
    assert_eq!(config.billing_patch_id, Some(outcome.billing_patch_id));
    assert_eq!(
        bundle.simulation.map(|run| run.simulation_run_id),
        Some(run.simulation_run_id)
    );
}

#[test]
fn approve_requires_every_field() {
    let (service, _) = build_service();
    let mut request = approval_request(CANDIDATE, &SimulationRunId::from("sim_000001"));
    request.rationale = Some("   ".to_string());

    let err = service.approve(&request).expect_err("rationale blank");

    assert!(matches!(err, GovernanceError::MissingApprovalFields));
}

#[test]
fn approve_rejects_run_of_another_config() {
    let (service, repository) = build_service();
    let run = service
        .simulate(simulation_request(ACTIVE, None))
        .expect("simulation succeeds");

    let err = service
        .approve(&approval_request(CANDIDATE, &run.simulation_run_id))
        .expect_err("run belongs to v1");

    assert!(matches!(err, GovernanceError::RunConfigMismatch));
    assert_eq!(repository.status_of(CANDIDATE), Some(ConfigStatus::Candidate));
}

#[test]
fn approve_rejects_unknown_run() {
    let (service, _) = build_service();

    let err = service
        .approve(&approval_request(CANDIDATE, &SimulationRunId::from("sim_999999")))
        .expect_err("run missing");

    assert!(matches!(err, GovernanceError::SimulationRunNotFound(_)));
}

#[test]
fn production_activation_requires_production_cycle() {
    let (service, repository) = build_service();
    repository
        .state
        .lock()
        .expect("repository mutex poisoned")
        .cycles
        .get_mut(&CycleId::from(CYCLE))
        .expect("cycle seeded")
        .cycle_type = CycleType::Sandbox;
    let run = service
        .simulate(simulation_request(CANDIDATE, None))
        .expect("simulation succeeds");

    let err = service
        .approve(&approval_request(CANDIDATE, &run.simulation_run_id))
        .expect_err("sandbox cycle");

    assert!(matches!(
        err,
        GovernanceError::Gate(ActivationGateError::CycleNotProduction)
    ));
    assert_eq!(repository.status_of(ACTIVE), Some(ConfigStatus::Active));
    assert!(repository
        .state
        .lock()
        .expect("repository mutex poisoned")
        .decisions
        .is_empty());
}

#[test]
fn production_activation_requires_complete_rails() {
    let (service, repository) = build_service();
    repository
        .state
        .lock()
        .expect("repository mutex poisoned")
        .configs
        .get_mut(&ConfigVersionId::from(CANDIDATE))
        .expect("candidate seeded")
        .snapshot
        .rails
        .usage_thresholds
        .retain(|threshold| threshold.percent != 90);
    let run = service
        .simulate(simulation_request(CANDIDATE, None))
        .expect("simulation succeeds");

    let err = service
        .approve(&approval_request(CANDIDATE, &run.simulation_run_id))
        .expect_err("missing 90% threshold");

    assert!(matches!(
        err,
        GovernanceError::Gate(ActivationGateError::UsageThresholds)
    ));
}

#[test]
fn runtime_config_serves_pooled_units_of_the_active_version() {
    let (service, _) = build_service();

    let runtime = service.active_config(&subject()).expect("v1 active");

    assert_eq!(runtime.config_version_id, ConfigVersionId::from(ACTIVE));
    assert_eq!(runtime.value_units.len(), 1);
    assert_eq!(runtime.value_units[0].value_unit_id.0, RENDER_UNIT);
    assert_eq!(runtime.north_star.primary_metrics, vec!["renders_per_workspace"]);
    assert!(runtime.governance.approval_ref.is_none());
}

#[test]
fn runtime_config_follows_approval() {
    let (service, _) = build_service();
    let run = service
        .simulate(simulation_request(CANDIDATE, None))
        .expect("simulation succeeds");
    let outcome = service
        .approve(&approval_request(CANDIDATE, &run.simulation_run_id))
        .expect("approval succeeds");

    let runtime = service.active_config(&subject()).expect("v2 active");

    assert_eq!(runtime.config_version_id, ConfigVersionId::from(CANDIDATE));
    assert_eq!(runtime.governance.approval_ref, Some(outcome.decision_id));
    assert_eq!(runtime.governance.config_status, ConfigStatus::Active);
}

#[test]
fn runtime_config_reports_missing_subject() {
    let (service, _) = build_service();
    let mut other = subject();
    other.segment = "enterprise".to_string();

    let err = service.active_config(&other).expect_err("nothing active");

    assert!(matches!(err, GovernanceError::NoActiveConfig(subject) if subject.segment == "enterprise"));
}

#[test]
fn baseline_options_list_siblings_highest_version_first() {
    let (service, repository) = build_service();
    let v3 = config("cfg_smb_learning_prod_v3", 3, ConfigStatus::Draft, 120.0, at(3, 1));
    repository
        .state
        .lock()
        .expect("repository mutex poisoned")
        .configs
        .insert(v3.config_version_id.clone(), v3);

    let options = service
        .baseline_options(&ConfigVersionId::from(CANDIDATE))
        .expect("candidate exists");

    let versions: Vec<u32> = options.iter().map(|option| option.version).collect();
    assert_eq!(versions, vec![3, 1]);
}

#[test]
fn configs_are_listed_newest_first() {
    let (service, _) = build_service();

    let configs = service.configs().expect("configs listed");

    assert_eq!(configs[0].config_version_id, ConfigVersionId::from(CANDIDATE));
    assert_eq!(configs[1].config_version_id, ConfigVersionId::from(ACTIVE));
}

#[test]
fn decisions_filter_by_subject_and_text() {
    let (service, _) = build_service();
    let run = service
        .simulate(simulation_request(CANDIDATE, None))
        .expect("simulation succeeds");
    service
        .approve(&approval_request(CANDIDATE, &run.simulation_run_id))
        .expect("approval succeeds");

    let all = service
        .decisions(&DecisionQuery::default())
        .expect("decisions listed");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].config_version_number, Some(2));

    let by_text = service
        .decisions(&DecisionQuery {
            q: Some("Commit floor".to_string()),
            ..DecisionQuery::default()
        })
        .expect("decisions listed");
    assert_eq!(by_text.len(), 1);

    let other_segment = service
        .decisions(&DecisionQuery {
            segment: Some("enterprise".to_string()),
            ..DecisionQuery::default()
        })
        .expect("decisions listed");
    assert!(other_segment.is_empty());

    let none = service
        .decisions(&DecisionQuery {
            q: Some("nobody wrote this".to_string()),
            ..DecisionQuery::default()
        })
        .expect("decisions listed");
    assert!(none.is_empty());
}

#[test]
fn compare_requires_both_decisions() {
    let (service, _) = build_service();
    let run = service
        .simulate(simulation_request(CANDIDATE, None))
        .expect("simulation succeeds");
    let outcome = service
        .approve(&approval_request(CANDIDATE, &run.simulation_run_id))
        .expect("approval succeeds");

    let comparison = service
        .compare_decisions(&outcome.decision_id, &outcome.decision_id)
        .expect("both present");
    assert_eq!(comparison.a.decision.decision_id, comparison.b.decision.decision_id);

    let err = service
        .compare_decisions(&outcome.decision_id, &"dec_missing".into())
        .expect_err("second missing");
    assert!(matches!(err, GovernanceError::ComparisonNotFound));
}

#[test]
fn storage_failures_surface_as_repository_errors() {
    let service = GovernanceService::new(Arc::new(UnavailableRepository), feed());

    let err = service.configs().expect_err("store offline");

    assert!(matches!(
        err,
        GovernanceError::Repository(RepositoryError::Unavailable(_))
    ));
}
