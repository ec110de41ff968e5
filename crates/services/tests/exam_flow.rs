use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use exam_core::model::{ExamSettingsDraft, QuestionRecord};
use exam_core::time::fixed_clock;
use services::{
    ExamService, ExamSession, ImportError, Navigation, TickOutcome, TranslationError,
    TranslationOutcome, TranslationPort,
};

struct Prefix;

#[async_trait]
impl TranslationPort for Prefix {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        Ok(format!("es:{text}"))
    }
}

/// Fails the first `failures` calls, then succeeds.
struct Flaky {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl TranslationPort for Flaky {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(TranslationError::Provider("unavailable".into()));
        }
        Ok(format!("fr:{text}"))
    }
}

fn four_questions() -> Vec<QuestionRecord> {
    vec![
        QuestionRecord::new("Capital of France?", r#"["Paris","Rome","Madrid","Berlin"]"#, "0"),
        QuestionRecord::new("Even numbers?", r#"["1","2","3","4"]"#, "1,3"),
        QuestionRecord::new("Largest planet?", r#"["Mars","Jupiter","Venus","Earth"]"#, "1"),
        QuestionRecord::new("Noble gas?", r#"["Oxygen","Neon","Iron","Carbon"]"#, "1"),
    ]
}

fn service(port: Arc<dyn TranslationPort>) -> ExamService {
    let mut service = ExamService::new(port).with_clock(fixed_clock());
    service.import_records(&four_questions()).unwrap();
    service
}

fn go_to_text(session: &mut ExamSession, text: &str) {
    let index = session
        .items()
        .iter()
        .position(|item| item.question().text() == text)
        .unwrap();
    assert_eq!(session.go_to(index).unwrap(), Navigation::Moved(index));
}

#[test]
fn full_exam_scores_with_penalty() {
    let service = service(Arc::new(Prefix));
    let settings = ExamSettingsDraft {
        num_questions: 4,
        time_limit_minutes: 1,
    }
    .validate()
    .unwrap();

    let mut session = service.new_session();
    service.start(&mut session, &settings).unwrap();
    assert_eq!(session.total_questions(), 4);
    assert_eq!(session.time_remaining(), 60);

    go_to_text(&mut session, "Capital of France?");
    session.choose("Paris").unwrap();

    go_to_text(&mut session, "Even numbers?");
    session.toggle("2").unwrap();
    session.flag().unwrap();

    go_to_text(&mut session, "Largest planet?");
    session.view_answer().unwrap();

    go_to_text(&mut session, "Noble gas?");
    session.skip().unwrap();

    let unanswered = session.unanswered_indices();
    assert_eq!(unanswered.len(), 1);
    assert_eq!(session.items()[unanswered[0]].question().text(), "Noble gas?");

    let report = session.submit().unwrap().clone();
    assert_eq!(report.total, 4);
    assert_eq!(report.correct_count, 1);
    assert_eq!(report.penalties, 1);
    assert_eq!(report.score, 0);
    assert!(report.percentage.abs() < f64::EPSILON);
    assert!(!report.timed_out);
    assert_eq!(report.started_at, report.submitted_at);
    assert_eq!(report.incorrect.len(), 3);
    assert_eq!(report.flagged.len(), 1);
    assert_eq!(report.flagged_and_incorrect.len(), 1);

    let multi = &report.flagged_and_incorrect[0];
    assert_eq!(multi.question, "Even numbers?");
    assert_eq!(multi.your_answer.as_deref(), Some("2"));
    assert_eq!(multi.correct_answer, "2, 4");

    let markdown = storage::render_markdown(&report);
    assert!(markdown.contains("**Final Score**: 0/4"));
    assert!(markdown.contains("Even numbers?"));
}

#[test]
fn import_csv_replaces_bank_and_rejects_bad_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "question,options,correct").unwrap();
    writeln!(file, r#""Pick B","['A','B']",1"#).unwrap();
    writeln!(file, r#""Pick A or C","[""A"",""B"",""C""]","0,2""#).unwrap();
    file.flush().unwrap();

    let mut service = ExamService::new(Arc::new(Prefix));
    assert_eq!(service.import_csv(file.path()).unwrap(), 2);
    assert_eq!(service.bank().len(), 2);
    assert!(service.bank().questions()[1].is_multiple_choice());

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    writeln!(bad, "question,options,correct").unwrap();
    writeln!(bad, r#""Broken","['A','B']",7"#).unwrap();
    bad.flush().unwrap();

    let err = service.import_csv(bad.path()).unwrap_err();
    assert!(matches!(err, ImportError::InvalidRow { row: 1, .. }));
    assert_eq!(service.bank().len(), 2);

    let missing = service.import_csv(file.path().with_extension("missing")).unwrap_err();
    assert!(matches!(missing, ImportError::Storage(_)));
}

#[tokio::test]
async fn translated_answers_score_canonically() {
    let service = service(Arc::new(Prefix));
    let mut session = service.new_session();
    session.start(service.bank(), 4, 120).unwrap();
    go_to_text(&mut session, "Capital of France?");

    let outcome = service.toggle_translation(&mut session).await.unwrap();
    assert!(matches!(outcome, TranslationOutcome::Applied));
    assert_eq!(session.display_text(), Some("es:Capital of France?"));
    session.choose("es:Paris").unwrap();

    let outcome = service.toggle_translation(&mut session).await.unwrap();
    assert!(matches!(outcome, TranslationOutcome::NotNeeded));
    assert_eq!(session.selection(), ["Paris"]);

    let report = session.submit().unwrap();
    assert_eq!(report.correct_count, 1);
}

#[tokio::test]
async fn translation_failure_is_retried_on_next_request() {
    let port = Arc::new(Flaky {
        failures: 1,
        calls: AtomicUsize::new(0),
    });
    let service = service(port);
    let mut session = service.new_session();
    session.start(service.bank(), 1, 120).unwrap();

    let outcome = service.toggle_translation(&mut session).await.unwrap();
    assert!(matches!(outcome, TranslationOutcome::Fallback(_)));
    let canonical = session.items()[0].question().options().to_vec();
    assert_eq!(session.display_options(), canonical.as_slice());
    assert!(session.is_translated_view());

    let outcome = service.ensure_translation(&mut session).await;
    assert!(matches!(outcome, TranslationOutcome::Applied));
    assert!(session.display_options().iter().all(|o| o.starts_with("fr:")));

    let outcome = service.ensure_translation(&mut session).await;
    assert!(matches!(outcome, TranslationOutcome::NotNeeded));
}

#[tokio::test]
async fn ticks_keep_running_while_translation_is_in_flight() {
    let port: Arc<dyn TranslationPort> = Arc::new(Prefix);
    let service = service(Arc::clone(&port));
    let mut session = service.new_session();
    session.start(service.bank(), 2, 3).unwrap();

    let request = session.toggle_translated_view().unwrap().unwrap();
    let pending = request.run(port.as_ref());

    assert_eq!(session.tick(), TickOutcome::Running { remaining: 2 });
    assert_eq!(session.tick(), TickOutcome::Running { remaining: 1 });
    assert_eq!(session.tick(), TickOutcome::Expired);

    let response = pending.await;
    assert!(matches!(
        session.apply_translation(response),
        TranslationOutcome::Discarded
    ));
    let report = session.report().unwrap();
    assert!(report.timed_out);
    assert_eq!(report.score, 0);
}

#[test]
fn restart_draws_fresh_state() {
    let service = service(Arc::new(Prefix));
    let mut session = service.new_session();
    session.start(service.bank(), 4, 60).unwrap();
    for _ in 0..4 {
        session.view_answer().unwrap();
        session.flag().unwrap();
        let _ = session.next().unwrap();
    }
    assert_eq!(session.penalties(), 4);
    session.submit().unwrap();

    session.start(service.bank(), 4, 60).unwrap();
    assert_eq!(session.penalties(), 0);
    assert!(session.items().iter().all(|item| {
        let state = item.state();
        state.user_answers().is_none() && !state.flagged() && !state.answer_viewed()
    }));
    assert_eq!(session.unanswered_indices().len(), 4);
}
