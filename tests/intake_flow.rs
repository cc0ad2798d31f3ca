//! Integration tests for the conversational intake flow.
//!
//! Each test drives `HandleTurnHandler` turn by turn with in-memory
//! adapters, the keyword intent parser and a manual clock:
//! 1. Complete flows, including nested row collection
//! 2. Cancellation from every stage
//! 3. Retries, expiry, interruption and failure handling

mod common;

use serde_json::json;
use std::sync::Arc;

use common::{record_type, Harness};
use nexchat::adapters::intent::{MockIntentError, MockIntentParser};
use nexchat::adapters::permissions::{RolePermissionChecker, StubPermissionChecker};
use nexchat::adapters::presenter::{MarkdownPresenter, PresenterRegistry};
use nexchat::application::TurnOutcome;
use nexchat::domain::foundation::RecordId;
use nexchat::domain::intake::{FlowStage, NestedGroupContext};
use nexchat::domain::intent::{IntentAction, IntentRequest, ParsedIntent};
use nexchat::domain::schema::FieldValue;
use nexchat::ports::{DocumentStore, FieldPresenter, GroupIntro, Operation, Prompt, PromptContext};

// =============================================================================
// Complete flows
// =============================================================================

mod complete_flows {
    use super::*;

    #[tokio::test]
    async fn two_fields_and_one_row_create_exactly_one_record() {
        let h = Harness::new().await;

        let reply = h.say("create work order").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.starts_with("Creating a new Work Order."));
        assert!(reply.text.contains("**Title** for Work Order:"));

        let reply = h.say("Fix the roof").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.contains("`2` Beta"));

        let reply = h.say("2").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.contains("**Tasks** (Work Order Task) needs at least one row."));

        let reply = h.say("yes").await;
        assert!(reply.text.contains("**Tasks Row 1** (field 1 of 1)"));

        let reply = h.say("T-100").await;
        assert!(reply.text.starts_with("Row 1 added to Tasks. (Code: T-100)"));

        let reply = h.say("no").await;
        assert_eq!(
            reply.outcome,
            TurnOutcome::Created {
                id: RecordId::new("WO-00001").unwrap()
            }
        );
        assert_eq!(reply.text, "Work Order WO-00001 created.");

        assert_eq!(
            h.created_payloads("Work Order").await,
            vec![json!({
                "title": "Fix the roof",
                "priority": "Beta",
                "tasks": [{"code": "T-100"}]
            })]
        );
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn several_rows_are_collected_in_order() {
        let h = Harness::new().await;

        let reply = h
            .say_all(&["create work order", "Paint", "Alpha", "yes", "A-1", "yes", "A-2"])
            .await;
        assert!(reply.text.starts_with("Row 2 added to Tasks."));

        h.say("done").await;
        let payloads = h.created_payloads("Work Order").await;
        assert_eq!(payloads[0]["tasks"], json!([{"code": "A-1"}, {"code": "A-2"}]));
    }

    #[tokio::test]
    async fn sales_order_uses_default_date_and_typo_tolerant_reference() {
        let h = Harness::new().await;

        let reply = h.say("create sales order").await;
        assert!(reply.text.contains("**Customer** for Sales Order:"));
        assert!(reply.text.contains("`1` Acme"));
        assert!(!reply.text.contains("**Date**"));

        let reply = h.say("Acem").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.contains("**Delivery Date** for Sales Order:"));

        h.say_all(&["2030-01-15", "yes", "WIDGET-01", "5", "no"]).await;

        let payloads = h.created_payloads("Sales Order").await;
        assert_eq!(payloads.len(), 1);
        let order = &payloads[0];
        assert_eq!(order["customer"], "Acme");
        assert_eq!(order["transaction_date"], "2025-06-15");
        assert_eq!(order["delivery_date"], "2030-01-15");
        assert_eq!(order["items"], json!([{"item_code": "WIDGET-01", "qty": 5.0}]));
        assert!(order.get("discount").is_none());
    }

    #[tokio::test]
    async fn quick_date_number_picks_the_listed_date() {
        let h = Harness::new().await;
        h.say_all(&["create sales order", "Globex"]).await;

        // `3` is "Next Week"
        h.say_all(&["3", "yes", "BOLT", "1", "no"]).await;
        let payloads = h.created_payloads("Sales Order").await;
        assert_eq!(payloads[0]["delivery_date"], "2025-06-22");
    }

    #[tokio::test]
    async fn fully_specified_command_creates_in_one_turn() {
        let h = Harness::new().await;

        let reply = h
            .say("create customer customer_name=Initech, customer_group=Individual")
            .await;
        assert_eq!(reply.text, "Customer CUS-00004 created.");
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn invalid_supplied_value_is_reported_and_asked_again() {
        let h = Harness::new().await;

        let reply = h
            .say("create customer customer_name=Initech, customer_group=Martian")
            .await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.contains("Some values could not be used:"));
        assert!(reply.text.contains("'Martian' was not found"));
        assert!(reply.text.contains("**Customer Group** for Customer:"));

        let reply = h.say("individual").await;
        assert_eq!(reply.text, "Customer CUS-00004 created.");
    }
}

// =============================================================================
// Field input resolution
// =============================================================================

mod resolution {
    use super::*;

    #[tokio::test]
    async fn numbered_selection_indexes_the_listed_options() {
        let h = Harness::new().await;
        h.say_all(&["create work order", "Paint"]).await;

        let reply = h.say("2").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);

        let session = h.session().await.unwrap();
        assert_eq!(
            session.data.get("priority"),
            Some(&FieldValue::Choice("Beta".to_string()))
        );
    }

    #[tokio::test]
    async fn ambiguous_reference_lists_matches_then_accepts_a_number() {
        let h = Harness::new().await;
        h.say("create sales order").await;

        let reply = h.say("ac").await;
        assert_eq!(reply.outcome, TurnOutcome::Retry);
        assert!(reply.text.contains("matches several options: Acme, Acme Logistics"));
        assert!(reply.text.contains("`2` Acme Logistics"));
        assert!(h.session().await.unwrap().data.get("customer").is_none());

        h.say("2").await;
        let session = h.session().await.unwrap();
        assert_eq!(
            session.data.get("customer"),
            Some(&FieldValue::Reference("Acme Logistics".to_string()))
        );
    }

    #[tokio::test]
    async fn exact_match_wins_over_substring_matches() {
        let h = Harness::new().await;
        h.say_all(&["create sales order", "acme"]).await;

        let session = h.session().await.unwrap();
        assert_eq!(
            session.data.get("customer"),
            Some(&FieldValue::Reference("Acme".to_string()))
        );
    }
}

// =============================================================================
// Cancellation
// =============================================================================

mod cancellation {
    use super::*;

    async fn cancel_after(messages: &[&str]) -> Harness {
        let h = Harness::new().await;
        h.say_all(messages).await;
        assert!(h.session().await.is_some(), "flow should be active");

        let reply = h.say("cancel").await;
        assert_eq!(reply.outcome, TurnOutcome::Cancelled);
        assert_eq!(reply.text, "Cancelled. Nothing was saved.");
        assert!(h.session().await.is_none());
        assert!(h.created("Work Order").await.is_empty());
        h
    }

    #[tokio::test]
    async fn during_top_level_fields() {
        cancel_after(&["create work order"]).await;
    }

    #[tokio::test]
    async fn while_awaiting_start_confirmation() {
        cancel_after(&["create work order", "Paint", "Gamma"]).await;
    }

    #[tokio::test]
    async fn mid_row_collection() {
        let h = Harness::new().await;
        h.say_all(&["create sales order", "Globex", "2030-01-15", "yes", "WIDGET-01"])
            .await;
        assert_eq!(
            h.session().await.unwrap().group().unwrap().current_row.len(),
            1
        );

        let reply = h.say("cancel").await;
        assert_eq!(reply.outcome, TurnOutcome::Cancelled);
        assert!(h.session().await.is_none());
        assert!(h.created("Sales Order").await.is_empty());
        assert!(h.created("Sales Order Item").await.is_empty());
    }

    #[tokio::test]
    async fn while_awaiting_more_rows() {
        cancel_after(&["create work order", "Paint", "Gamma", "yes", "A-1"]).await;
    }

    #[tokio::test]
    async fn any_cancel_token_and_case_works() {
        for token in ["QUIT", "Exit", " cancel "] {
            let h = Harness::new().await;
            h.say("create work order").await;
            let reply = h.say(token).await;
            assert_eq!(reply.outcome, TurnOutcome::Cancelled, "token {:?}", token);
            assert!(h.session().await.is_none());
        }
    }

    #[tokio::test]
    async fn without_a_session_there_is_nothing_to_cancel() {
        let h = Harness::new().await;
        let reply = h.say("cancel").await;
        assert_eq!(reply.outcome, TurnOutcome::Cancelled);
        assert_eq!(reply.text, "There is nothing to cancel.");
    }
}

// =============================================================================
// Retries and guarded assembly
// =============================================================================

mod retries {
    use super::*;

    #[tokio::test]
    async fn bad_answer_keeps_the_session_and_asks_again() {
        let h = Harness::new().await;
        h.say_all(&["create work order", "Paint"]).await;
        let before = h.session().await.unwrap();

        let reply = h.say("7").await;
        assert_eq!(reply.outcome, TurnOutcome::Retry);
        assert!(reply
            .text
            .starts_with("Invalid number: 7. Please use numbers between 1 and 3"));

        let after = h.session().await.unwrap();
        assert_eq!(after.data, before.data);
        assert_eq!(after.current_field().unwrap().name, "priority");

        let reply = h.say("Gamma").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
    }

    #[tokio::test]
    async fn malformed_date_and_past_date_are_rejected() {
        let h = Harness::new().await;
        h.say_all(&["create sales order", "Globex"]).await;

        let reply = h.say("15/01/2030").await;
        assert_eq!(reply.outcome, TurnOutcome::Retry);
        assert!(reply.text.contains("use YYYY-MM-DD"));

        let reply = h.say("2020-01-01").await;
        assert_eq!(reply.outcome, TurnOutcome::Retry);

        let session = h.session().await.unwrap();
        assert!(session.data.get("delivery_date").is_none());
        assert_eq!(session.current_field().unwrap().name, "delivery_date");
    }

    #[tokio::test]
    async fn invalid_row_value_is_retried_inside_the_row() {
        let h = Harness::new().await;
        h.say_all(&["create sales order", "Globex", "2030-01-15", "yes", "BOLT"])
            .await;

        let reply = h.say("-2").await;
        assert_eq!(reply.outcome, TurnOutcome::Retry);
        assert!(reply.text.contains("**Items Row 1** (field 2 of 2)"));

        let reply = h.say("2").await;
        assert!(reply.text.starts_with("Row 1 added to Items."));
    }

    #[tokio::test]
    async fn declined_required_group_is_asked_again_never_assembled_empty() {
        let h = Harness::new().await;
        h.say_all(&["create work order", "Paint", "Gamma"]).await;

        let reply = h.say("no").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply
            .text
            .starts_with("A Work Order can't be saved without at least one Tasks row."));
        assert!(h.created("Work Order").await.is_empty());

        let session = h.session().await.unwrap();
        assert_eq!(session.stage(), FlowStage::InNestedGroup);
        assert!(!session.is_ready_for_assembly());

        let reply = h.say_all(&["yes", "A-1", "no"]).await;
        assert!(matches!(reply.outcome, TurnOutcome::Created { .. }));
    }
}

// =============================================================================
// Expiry and interruption
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn expired_session_is_not_continued() {
        let mock = MockIntentParser::new()
            .with_intent(ParsedIntent::Action(IntentRequest::new(
                IntentAction::Create,
                Some(record_type("Work Order")),
            )))
            .with_intent(ParsedIntent::Clarification("What would you like to do?".into()));
        let h = Harness::builder()
            .intents(Arc::new(mock.clone()))
            .build()
            .await;

        h.say("new work order please").await;
        h.clock.advance_secs(601);

        let reply = h.say("Paint").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert_eq!(reply.text, "What would you like to do?");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.calls()[1].text, "Paint");
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn session_within_ttl_is_continued() {
        let h = Harness::new().await;
        h.say("create work order").await;
        h.clock.advance_secs(599);

        let reply = h.say("Paint").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.contains("**Priority**"));
    }

    #[tokio::test]
    async fn each_turn_extends_the_session() {
        let h = Harness::new().await;
        h.say("create work order").await;
        h.clock.advance_secs(500);
        h.say("Paint").await;
        h.clock.advance_secs(500);

        let reply = h.say("Beta").await;
        assert!(reply.text.contains("needs at least one row"));
    }

    #[tokio::test]
    async fn new_command_abandons_the_flow() {
        let h = Harness::new().await;
        h.say("create work order").await;

        let reply = h.say("list customers").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert!(reply.text.starts_with("**Customer** (most recent first):"));
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn yes_no_words_that_are_verbs_still_answer_the_confirmation() {
        let h = Harness::new().await;
        h.say_all(&["create work order", "Paint", "Gamma"]).await;

        let reply = h.say("add").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.contains("**Tasks Row 1**"));
    }

    #[tokio::test]
    async fn empty_message_without_session_asks_for_a_command() {
        let h = Harness::new().await;
        let reply = h.say("   ").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert!(reply.text.contains("Type \"help\""));
    }
}

// =============================================================================
// Non-create intents
// =============================================================================

mod other_intents {
    use super::*;

    #[tokio::test]
    async fn help_lists_record_types() {
        let h = Harness::new().await;
        let reply = h.say("help").await;
        assert!(reply.text.contains("Record types: Customer, Work Order"));
        assert!(reply.text.contains("create <record type>"));
    }

    #[tokio::test]
    async fn get_update_and_delete_by_name() {
        let h = Harness::new().await;

        let reply = h.say("get customer Globex").await;
        assert!(reply.text.starts_with("**Globex** (Customer CUS-00003)"));

        let reply = h.say("update customer Globex territory=EMEA").await;
        assert!(reply.text.starts_with("Updated Customer CUS-00003."));
        assert!(reply.text.contains("- territory: EMEA"));

        let reply = h.say("delete customer Acme Logistics").await;
        assert_eq!(reply.text, "Deleted Customer 'Acme Logistics'.");

        let reply = h.say("get customer Acme Logistics").await;
        assert_eq!(reply.text, "No Customer named 'Acme Logistics'.");
    }

    #[tokio::test]
    async fn update_rejects_unknown_fields() {
        let h = Harness::new().await;
        let reply = h.say("update customer Globex planet=Mars").await;
        assert_eq!(reply.text, "Customer has no field 'planet'.");
    }

    #[tokio::test]
    async fn update_without_changes_asks_for_field_then_value() {
        let h = Harness::new().await;

        let reply = h.say("update customer Globex").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        assert!(reply.text.starts_with("Updating Customer Globex."));
        assert!(reply.text.contains("`3` Territory"));
        assert_eq!(h.session().await.unwrap().stage(), FlowStage::UpdatingRecord);

        let reply = h.say("3").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        let session = h.session().await.unwrap();
        assert_eq!(session.current_field().unwrap().name, "territory");

        let reply = h.say("EMEA").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert!(reply.text.starts_with("Updated Customer CUS-00003."));
        assert!(reply.text.contains("- territory: EMEA"));
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn update_accepts_field_and_value_in_one_answer() {
        let h = Harness::new().await;
        h.say("update customer Globex").await;

        let reply = h.say("customer group to indiv").await;
        assert!(reply.text.starts_with("Updated Customer CUS-00003."));
        assert!(reply.text.contains("- customer_group: Individual"));
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn update_retries_unknown_field_choice() {
        let h = Harness::new().await;
        h.say("update customer Globex").await;

        let reply = h.say("planet").await;
        assert_eq!(reply.outcome, TurnOutcome::Retry);
        assert_eq!(h.session().await.unwrap().stage(), FlowStage::UpdatingRecord);

        let reply = h.say("cancel").await;
        assert_eq!(reply.outcome, TurnOutcome::Cancelled);
        assert!(h.session().await.is_none());

        let reply = h.say("get customer Globex").await;
        assert!(!reply.text.contains("territory"));
    }

    #[tokio::test]
    async fn update_of_unknown_record_opens_nothing() {
        let h = Harness::new().await;
        let reply = h.say("update customer Nobody").await;
        assert_eq!(reply.text, "No Customer named 'Nobody'.");
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn unknown_verb_gets_a_clarification() {
        let h = Harness::new().await;
        let reply = h.say("frobnicate the widgets").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert!(reply.text.contains("Known record types: Customer"));
        assert!(h.session().await.is_none());
    }
}

// =============================================================================
// Permissions and failures
// =============================================================================

/// Renders like the markdown presenter but panics after a completed row.
struct PanicAfterRow(MarkdownPresenter);

impl FieldPresenter for PanicAfterRow {
    fn field_prompt(&self, ctx: &PromptContext<'_>) -> Prompt {
        self.0.field_prompt(ctx)
    }

    fn group_intro(&self, intro: &GroupIntro<'_>) -> String {
        self.0.group_intro(intro)
    }

    fn row_added(&self, _group: &NestedGroupContext, _row_number: usize) -> String {
        panic!("presenter bug")
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn create_without_permission_is_denied() {
        let h = Harness::builder()
            .permissions(Arc::new(StubPermissionChecker::denying().allow(Operation::Read)))
            .build()
            .await;

        let reply = h.say("create customer").await;
        assert_eq!(reply.outcome, TurnOutcome::Denied);
        assert_eq!(
            reply.text,
            "You don't have permission to create Customer records."
        );
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn failed_session_delete_at_assembly_creates_nothing() {
        let h = Harness::new().await;
        h.say_all(&["create work order", "Paint", "beta", "yes", "A-1"]).await;

        h.sessions.set_deletes_failing(true);
        let reply = h.say("no").await;
        assert_eq!(reply.outcome, TurnOutcome::Failed);
        assert!(h.created("Work Order").await.is_empty());

        // The flow is still resumable and assembles exactly once
        h.sessions.set_deletes_failing(false);
        let reply = h.say("no").await;
        assert!(matches!(reply.outcome, TurnOutcome::Created { .. }));
        assert_eq!(h.created("Work Order").await.len(), 1);
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn role_table_limits_operations_per_record_type() {
        let roles = RolePermissionChecker::new()
            .grant("sales", "Customer", &[Operation::Read])
            .grant("sales", "Work Order", &[Operation::Read, Operation::Create]);
        let h = Harness::builder().permissions(Arc::new(roles)).build().await;

        let reply = h.say("delete customer Globex").await;
        assert_eq!(reply.outcome, TurnOutcome::Denied);
        assert_eq!(reply.text, "You don't have permission to delete Customer records.");

        let reply = h.say("get customer Globex").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);

        let reply = h.say("create work order").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
    }

    #[tokio::test]
    async fn permission_backend_failure_is_a_generic_failure() {
        let h = Harness::builder()
            .permissions(Arc::new(StubPermissionChecker::unavailable()))
            .build()
            .await;

        let reply = h.say("create customer").await;
        assert_eq!(reply.outcome, TurnOutcome::Failed);
        assert!(reply.text.starts_with("Sorry, something went wrong"));
    }

    #[tokio::test]
    async fn document_store_failure_mid_flow_discards_the_session() {
        let h = Harness::new().await;
        h.say("create sales order").await;
        assert!(h.session().await.is_some());

        h.documents.set_unavailable(true);
        let reply = h.say("Globex").await;
        assert_eq!(reply.outcome, TurnOutcome::Failed);
        assert!(h.session().await.is_none());

        h.documents.set_unavailable(false);
        let reply = h.say("Globex").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);
    }

    #[tokio::test]
    async fn intent_parser_outage_fails_without_a_session() {
        let mock = MockIntentParser::new().with_error(MockIntentError::Unavailable);
        let h = Harness::builder().intents(Arc::new(mock)).build().await;

        let reply = h.say("create a customer").await;
        assert_eq!(reply.outcome, TurnOutcome::Failed);
        assert!(h.session().await.is_none());
    }

    #[tokio::test]
    async fn panic_inside_a_turn_is_contained() {
        let h = Harness::builder()
            .presenter(Arc::new(PanicAfterRow(MarkdownPresenter::default())))
            .build()
            .await;
        h.say_all(&["create work order", "Paint", "Gamma", "yes"]).await;

        let reply = h.say("A-1").await;
        assert_eq!(reply.outcome, TurnOutcome::Failed);
        assert!(h.session().await.is_none());

        // The user's lock was released
        let reply = h.say("help").await;
        assert_eq!(reply.outcome, TurnOutcome::Answered);
    }
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn lost_race_asks_to_resend_and_keeps_the_winner() {
        let h = Harness::new().await;
        h.say("create work order").await;

        h.sessions.race_next_put();
        let reply = h.say("Paint").await;
        assert_eq!(reply.outcome, TurnOutcome::Conflict);

        let session = h.session().await.unwrap();
        assert_eq!(session.current_field().unwrap().name, "priority");
    }

    #[tokio::test]
    async fn simultaneous_turns_for_one_user_are_serialized() {
        let h = Harness::new().await;
        h.say("create work order").await;

        let first = {
            let handler = h.handler.clone();
            let actor = h.actor.clone();
            tokio::spawn(async move {
                handler
                    .handle(nexchat::application::HandleTurnCommand {
                        actor,
                        message: "Paint".into(),
                    })
                    .await
            })
        };
        let second = {
            let handler = h.handler.clone();
            let actor = h.actor.clone();
            tokio::spawn(async move {
                handler
                    .handle(nexchat::application::HandleTurnCommand {
                        actor,
                        message: "Beta".into(),
                    })
                    .await
            })
        };

        let first = first.await.unwrap();
        let second = second.await.unwrap();
        for reply in [&first, &second] {
            assert_ne!(reply.outcome, TurnOutcome::Conflict);
            assert_ne!(reply.outcome, TurnOutcome::Failed);
        }
        // Whichever ran first answered the title
        assert!(h.session().await.unwrap().data.contains_key("title"));
    }
}

// =============================================================================
// Custom presenters
// =============================================================================

/// Presenter that lists no candidates, so digits are plain text.
struct PlainPresenter;

impl FieldPresenter for PlainPresenter {
    fn field_prompt(&self, ctx: &PromptContext<'_>) -> Prompt {
        Prompt {
            text: format!("{}?", ctx.field.label),
            candidates: Vec::new(),
        }
    }

    fn group_intro(&self, intro: &GroupIntro<'_>) -> String {
        format!("Add {}?", intro.group.label)
    }

    fn row_added(&self, group: &NestedGroupContext, row_number: usize) -> String {
        format!("{} #{} saved. More?", group.label, row_number)
    }
}

mod presenters {
    use super::*;

    #[tokio::test]
    async fn flow_only_uses_candidates_the_presenter_listed() {
        let h = Harness::builder()
            .presenter(Arc::new(PlainPresenter))
            .build()
            .await;

        let reply = h.say_all(&["create work order", "Paint"]).await;
        assert_eq!(reply.text, "Priority?");

        // No list was shown, so "2" is matched as text and not found
        let reply = h.say("2").await;
        assert_eq!(reply.outcome, TurnOutcome::Retry);

        let reply = h.say_all(&["beta", "yes", "A-1"]).await;
        assert_eq!(reply.text, "Tasks #1 saved. More?");
    }

    #[tokio::test]
    async fn unlisted_record_named_like_a_command_is_an_answer() {
        let h = Harness::builder()
            .presenter(Arc::new(PlainPresenter))
            .build()
            .await;
        let data = json!({"customer_name": "New Horizons", "customer_group": "Individual"});
        h.documents
            .create(&record_type("Customer"), data.as_object().cloned().unwrap())
            .await
            .unwrap();

        let reply = h.say("create sales order").await;
        assert!(reply.text.ends_with("Customer?"));

        let reply = h.say("new horizons").await;
        assert_eq!(reply.outcome, TurnOutcome::Prompted);
        let session = h.session().await.unwrap();
        assert_eq!(session.record_type, record_type("Sales Order"));
        assert_eq!(session.data["customer"], FieldValue::Reference("New Horizons".into()));
    }

    #[tokio::test]
    async fn registry_override_applies_to_one_field() {
        let registry = PresenterRegistry::new(Arc::new(MarkdownPresenter::default()))
            .with_override(record_type("Work Order"), "priority", Arc::new(PlainPresenter));
        let h = Harness::builder().presenter(Arc::new(registry)).build().await;

        let reply = h.say("create work order").await;
        assert_ne!(reply.text, "Title?");

        let reply = h.say("Paint").await;
        assert_eq!(reply.text, "Priority?");
        assert_eq!(h.say("2").await.outcome, TurnOutcome::Retry);

        let reply = h.say("beta").await;
        assert_ne!(reply.text, "Add Tasks?");
        let reply = h.say_all(&["yes", "A-1"]).await;
        assert_ne!(reply.text, "Tasks #1 saved. More?");
        assert_eq!(h.session().await.unwrap().data["priority"], FieldValue::Choice("Beta".into()));
    }
}
