mod helpers;

use std::time::Duration;

use aura_journal::journal::editor::{EditorStatus, EditorTimings, JournalEditor, SaveStatus};
use aura_journal::journal::store;
use aura_journal::journal::types::{Emotion, ImageAttachment, Location};
use helpers::{audit_ops, day, shared_db, ScriptedInsight};
use tokio::time::sleep;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn typing_burst_is_analyzed_once_with_final_text() {
    let db = shared_db();
    let insight = ScriptedInsight::new(Emotion::Joy);
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(1)).unwrap();

    for text in ["Had", "Had a great", "Had a great run today!"] {
        editor.set_content(text);
        sleep(ms(400)).await;
    }
    assert_eq!(insight.calls(), 0);

    sleep(ms(2000)).await;

    assert_eq!(insight.calls(), 1);
    assert_eq!(insight.texts(), vec!["Had a great run today!".to_string()]);

    let stored = store::load_records(&db.lock().unwrap()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "2024-06-01");
    assert_eq!(stored[0].content, "Had a great run today!");
    assert_eq!(stored[0].emotion(), Some(Emotion::Joy));
    assert_eq!(
        audit_ops(&db.lock().unwrap()),
        vec![("create".to_string(), "2024-06-01".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn status_moves_through_saving_saved_idle() {
    let db = shared_db();
    let insight = ScriptedInsight::with_delay(Emotion::Optimism, ms(1000));
    let editor =
        JournalEditor::spawn(db, insight.clone(), EditorTimings::default(), day(2)).unwrap();
    let status = editor.status();

    editor.set_content("Looking forward to the weekend");
    sleep(ms(1600)).await;
    assert_eq!(
        *status.borrow(),
        EditorStatus {
            save: SaveStatus::Saving,
            analyzing: true
        }
    );

    sleep(ms(1000)).await;
    assert_eq!(
        *status.borrow(),
        EditorStatus {
            save: SaveStatus::Saved,
            analyzing: false
        }
    );

    sleep(ms(2000)).await;
    assert_eq!(*status.borrow(), EditorStatus::default());
}

#[tokio::test(start_paused = true)]
async fn switching_days_never_leaks_content() {
    let db = shared_db();
    let insight = ScriptedInsight::new(Emotion::Gratitude);
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(3)).unwrap();

    editor.set_content("Day three notes");
    sleep(ms(2000)).await;

    let other = editor.select_date(day(4)).await.unwrap();
    assert!(other.content.is_empty());
    editor.set_content("Day four notes");
    sleep(ms(2000)).await;

    let back = editor.select_date(day(3)).await.unwrap();
    assert_eq!(back.content, "Day three notes");
    assert_eq!(editor.date().await.unwrap(), day(3));

    let records = editor.records().await.unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2024-06-04", "2024-06-03"]);
    assert_eq!(records[0].content, "Day four notes");
    assert_eq!(insight.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn switching_within_quiet_window_discards_pending_edit() {
    let db = shared_db();
    let insight = ScriptedInsight::new(Emotion::Joy);
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(5)).unwrap();

    editor.set_content("half a thought");
    sleep(ms(500)).await;
    let next = editor.select_date(day(6)).await.unwrap();
    assert!(next.content.is_empty());

    sleep(ms(5000)).await;
    assert_eq!(insight.calls(), 0);
    assert!(store::load_records(&db.lock().unwrap()).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn switching_during_analysis_writes_nothing() {
    let db = shared_db();
    let insight = ScriptedInsight::with_delay(Emotion::Sadness, ms(1000));
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(7)).unwrap();
    let status = editor.status();

    editor.set_content("late thoughts");
    sleep(ms(1600)).await;
    assert!(status.borrow().analyzing);

    editor.select_date(day(8)).await.unwrap();
    sleep(ms(3000)).await;

    assert_eq!(insight.calls(), 1);
    assert_eq!(*status.borrow(), EditorStatus::default());
    assert!(editor.records().await.unwrap().is_empty());
    assert!(store::load_records(&db.lock().unwrap()).unwrap().is_empty());
    assert!(audit_ops(&db.lock().unwrap()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn newer_pass_supersedes_slow_analysis() {
    let db = shared_db();
    let insight = ScriptedInsight::with_delay(Emotion::Love, ms(3000));
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(9)).unwrap();

    editor.set_content("first draft");
    sleep(ms(1600)).await;
    editor.set_content("first draft, then more");
    sleep(ms(6000)).await;

    assert_eq!(insight.calls(), 2);
    let stored = store::load_records(&db.lock().unwrap()).unwrap();
    assert_eq!(stored[0].content, "first draft, then more");
    assert_eq!(
        stored[0].analysis.as_ref().unwrap().summary,
        "Reflection on: first draft, then more"
    );
    assert_eq!(audit_ops(&db.lock().unwrap()).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn location_change_keeps_analysis_without_a_call() {
    let db = shared_db();
    store::save_records(
        &db.lock().unwrap(),
        &[helpers::analyzed_record(10, "tired", Emotion::Sadness)],
    )
    .unwrap();
    let insight = ScriptedInsight::new(Emotion::Joy);
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(10)).unwrap();
    assert_eq!(editor.draft().await.unwrap().content, "tired");

    let paris = Location {
        latitude: 48.8566,
        longitude: 2.3522,
    };
    editor.set_location(Some(paris));
    sleep(ms(600)).await;

    assert_eq!(insight.calls(), 0);
    let stored = store::load_records(&db.lock().unwrap()).unwrap();
    assert_eq!(stored[0].location, Some(paris));
    assert_eq!(stored[0].emotion(), Some(Emotion::Sadness));
    assert_ne!(stored[0].timestamp, "2024-06-10T21:00:00+00:00");
    assert_eq!(
        audit_ops(&db.lock().unwrap()),
        vec![("update".to_string(), "2024-06-10".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn retyping_the_stored_text_is_not_reanalyzed() {
    let db = shared_db();
    store::save_records(
        &db.lock().unwrap(),
        &[helpers::analyzed_record(11, "I feel tired", Emotion::Sadness)],
    )
    .unwrap();
    let insight = ScriptedInsight::new(Emotion::Joy);
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(11)).unwrap();

    editor.set_content("I feel tired!");
    sleep(ms(200)).await;
    editor.set_content("I feel tired");
    sleep(ms(2000)).await;

    assert_eq!(insight.calls(), 0);
    let stored = store::load_records(&db.lock().unwrap()).unwrap();
    assert_eq!(stored[0].emotion(), Some(Emotion::Sadness));
}

#[tokio::test(start_paused = true)]
async fn image_edit_uses_the_shorter_window() {
    let db = shared_db();
    let insight = ScriptedInsight::new(Emotion::Joy);
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(12)).unwrap();

    editor.set_image(Some(ImageAttachment::from_bytes("image/png", b"abc")));
    sleep(ms(600)).await;

    assert_eq!(insight.calls(), 1);
    assert_eq!(insight.images(), vec![Some("YWJj".to_string())]);
    let stored = store::load_records(&db.lock().unwrap()).unwrap();
    assert_eq!(stored[0].content, "");
    assert_eq!(stored[0].image.as_deref(), Some("data:image/png;base64,YWJj"));
}

#[tokio::test(start_paused = true)]
async fn blank_day_is_never_saved() {
    let db = shared_db();
    let insight = ScriptedInsight::new(Emotion::Joy);
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(13)).unwrap();
    let status = editor.status();

    editor.set_content("   \n  ");
    sleep(ms(2000)).await;

    assert_eq!(insight.calls(), 0);
    assert_eq!(*status.borrow(), EditorStatus::default());
    assert!(store::load_records(&db.lock().unwrap()).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_analysis_records_fallback() {
    let db = shared_db();
    let insight = ScriptedInsight::failing();
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(14)).unwrap();

    editor.set_content("the network is down");
    editor.flush().await.unwrap();

    let stored = store::load_records(&db.lock().unwrap()).unwrap();
    let analysis = stored[0].analysis.as_ref().unwrap();
    assert_eq!(analysis.emotion, Emotion::Neutral);
    assert_eq!(analysis.summary, "Could not analyze the entry due to an error.");
    assert_eq!(analysis.suggestions.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn flush_waits_for_outstanding_analysis() {
    let db = shared_db();
    let insight = ScriptedInsight::with_delay(Emotion::Joy, ms(1000));
    let editor =
        JournalEditor::spawn(db.clone(), insight.clone(), EditorTimings::default(), day(15)).unwrap();

    editor.set_content("quick note");
    editor.flush().await.unwrap();

    assert_eq!(insight.calls(), 1);
    assert_eq!(editor.records().await.unwrap()[0].content, "quick note");

    editor.shutdown().await.unwrap();
    assert_eq!(store::load_records(&db.lock().unwrap()).unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn existing_entry_opens_as_draft() {
    let db = shared_db();
    let mut record = helpers::analyzed_record(16, "beach day", Emotion::Joy);
    record.image = Some("data:image/jpeg;base64,AQID".into());
    store::save_records(&db.lock().unwrap(), &[record]).unwrap();

    let editor = JournalEditor::spawn(
        db,
        ScriptedInsight::new(Emotion::Joy),
        EditorTimings::default(),
        day(16),
    )
    .unwrap();

    let draft = editor.draft().await.unwrap();
    assert_eq!(draft.content, "beach day");
    assert_eq!(draft.image.unwrap().encoded_payload, "AQID");
}
