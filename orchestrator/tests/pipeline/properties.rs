//! Text assembly, history and rationale rules

use speech_orchestrator::{
    DraftError, Role, RoleRegistry, Stage, StageOutcome, TemplateContributor, ROLE_ORDER,
};

use crate::support::{
    fixed_registry, permissive_session, positions, reversed_latency_registry, session,
};

#[tokio::test]
async fn test_full_run_orders_stage_outputs() {
    let registry = RoleRegistry::with_templates();
    let mut session = session(registry);

    let briefed = session.initial_briefing().await.unwrap().draft().text.clone();
    let debated = session.debate_round().await.unwrap().draft().text.clone();
    session.polish_and_risk_check().await.unwrap();
    let final_draft = session.generate_speaker_notes().await.unwrap();

    let debate_only = debated[briefed.len()..].trim_start_matches('\n');
    let found = positions(
        &final_draft.text,
        &[briefed.as_str(), debate_only, "[Stylist]", "[Risk]"],
    );
    assert!(found.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", found);
}

#[tokio::test]
async fn test_linear_run_history_has_four_snapshots() {
    let mut session = session(fixed_registry());
    session.initial_briefing().await.unwrap();
    session.debate_round().await.unwrap();
    session.polish_and_risk_check().await.unwrap();
    session.generate_speaker_notes().await.unwrap();

    let stages: Vec<_> = session.history().iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec![Stage::Briefed, Stage::Debated, Stage::Polished, Stage::Noted]
    );
    assert!(session.history().iter().all(|s| s.attempt == 1));
}

#[tokio::test]
async fn test_rationale_after_debate_and_polish() {
    let mut session = session(fixed_registry());
    session.initial_briefing().await.unwrap();
    let debated = session.debate_round().await.unwrap().draft().clone();

    assert_eq!(debated.rationale.len(), 5);
    assert_eq!(debated.rationale.roles(), ROLE_ORDER.to_vec());

    let polished = session.polish_and_risk_check().await.unwrap().draft().clone();
    assert_eq!(polished.rationale, debated.rationale);
    assert!(polished.text.ends_with("\n\n[Stylist]\ns\n\n[Risk]\nr"));
}

#[tokio::test]
async fn test_merge_order_ignores_completion_order() {
    let mut fast = session(fixed_registry());
    let mut slow = session(reversed_latency_registry());

    let fast_text = fast.initial_briefing().await.unwrap().draft().text.clone();
    let slow_text = slow.initial_briefing().await.unwrap().draft().text.clone();

    assert_eq!(fast_text, "p\nd\nl");
    assert_eq!(fast_text.as_bytes(), slow_text.as_bytes());

    let fast_debate = fast.debate_round().await.unwrap().draft().text.clone();
    let slow_debate = slow.debate_round().await.unwrap().draft().text.clone();
    assert_eq!(fast_debate, "p\nd\nl\np\nd\nl\ns\nr");
    assert_eq!(fast_debate, slow_debate);
}

#[tokio::test]
async fn test_permissive_debate_reentry_grows_text() {
    let mut session = permissive_session(fixed_registry());
    session.initial_briefing().await.unwrap();
    let briefed_len = session.current().text.len();

    session.debate_round().await.unwrap();
    let first_len = session.current().text.len();
    session.debate_round().await.unwrap();
    let second_len = session.current().text.len();

    // repeated debate appends again; this is expected in permissive mode
    assert!(first_len > briefed_len);
    assert!(second_len > first_len);
    assert_eq!(session.history().len(), 3);
}

#[tokio::test]
async fn test_strict_debate_reentry_is_rejected() {
    let mut session = session(fixed_registry());
    session.initial_briefing().await.unwrap();
    session.debate_round().await.unwrap();

    let err = session.debate_round().await.unwrap_err();
    assert!(matches!(
        err,
        DraftError::StageSequence {
            attempted: Stage::Debated,
            current: Stage::Debated
        }
    ));
}

#[tokio::test]
async fn test_permissive_briefing_keeps_existing_text() {
    let mut session = permissive_session(fixed_registry());
    session.initial_briefing().await.unwrap();
    session.debate_round().await.unwrap();
    let before = session.current().clone();

    session.initial_briefing().await.unwrap();
    assert!(session.current().extends(&before));
}

#[tokio::test]
async fn test_briefing_scenario_text_and_rationale() {
    let mut session = session(fixed_registry());
    let outcome = session.initial_briefing().await.unwrap();

    let StageOutcome::Suspended(checkpoint) = outcome else {
        panic!("briefing should suspend");
    };
    assert_eq!(checkpoint.stage, Stage::Briefed);
    assert_eq!(checkpoint.reason, "Review and approve the initial outline.");
    assert_eq!(checkpoint.draft.text, "p\nd\nl");
    assert_eq!(
        checkpoint.draft.rationale.roles(),
        vec![Role::PolicyExpert, Role::DataAdvisor, Role::LogicArchitect]
    );
}

#[tokio::test]
async fn test_template_briefing_scenario() {
    let mut session = session(RoleRegistry::with_templates());
    let draft = session.initial_briefing().await.unwrap().draft().clone();

    let expected = [Role::PolicyExpert, Role::DataAdvisor, Role::LogicArchitect]
        .iter()
        .map(|role| format!("[{}] suggestion based on X / Y", role.display_name()))
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(draft.text, expected);
    assert_eq!(draft.rationale.len(), 3);
}

#[tokio::test]
async fn test_unknown_role_is_an_error() {
    let err = "speechwriter".parse::<Role>().unwrap_err();
    assert!(matches!(err, DraftError::UnknownRole(ref name) if name == "speechwriter"));

    let registry = RoleRegistry::new()
        .with_contributor(Role::PolicyExpert, TemplateContributor::new(Role::PolicyExpert));
    assert!(matches!(
        registry.resolve_name("speechwriter"),
        Err(DraftError::UnknownRole(_))
    ));
    assert!(matches!(
        registry.resolve(Role::Stylist),
        Err(DraftError::UnknownRole(_))
    ));
    assert!(registry.resolve_name("policy_expert").is_ok());
}
