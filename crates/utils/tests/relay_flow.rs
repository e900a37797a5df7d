use std::sync::Arc;

use mailparse::{MailHeaderMap, ParsedMail};
use mailrelay_utils::{
    FileObjectStore, MemoryObjectStore, NotificationEvent, ObjectStore, Orchestrator,
    OutboxMailService, RelayConfig, RelayError, Stage, StoreError,
};
use tempfile::TempDir;

const SIMPLE: &str = "From: Alice <a@x.com>\r\nTo: b@y.com\r\nSubject: Hi\r\n\r\nhello\r\n";

const WITH_ATTACHMENTS: &str = "From: Bob <bob@x.com>\r\n\
To: team@y.com\r\n\
Subject: Report\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: text/plain; charset=\"utf-8\"\r\n\
\r\n\
See attached.\r\n\
--outer\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQK\r\n\
--outer\r\n\
Content-Type: text/csv\r\n\
Content-Disposition: attachment; filename=\"data.csv\"\r\n\
\r\n\
a,b\r\n\
1,2\r\n\
--outer--\r\n";

fn config(prefix: &str) -> Arc<RelayConfig> {
    Arc::new(RelayConfig {
        bucket: "inbox".to_string(),
        prefix: prefix.to_string(),
        recipient: "r@z.com".to_string(),
        region: "us-east-1".to_string(),
        console_base: "http://s3.console.aws.amazon.com/s3/object".to_string(),
        archive: Default::default(),
        smtp: None,
    })
}

fn notification(message_id: &str) -> NotificationEvent {
    let json = format!(
        r#"{{"Records": [{{"eventSource": "aws:ses", "ses": {{"mail": {{"messageId": "{message_id}"}}}}}}]}}"#
    );
    NotificationEvent::from_json(&json).unwrap()
}

fn filenames(mail: &ParsedMail<'_>) -> Vec<Option<String>> {
    mail.subparts
        .iter()
        .map(|p| p.get_content_disposition().params.get("filename").cloned())
        .collect()
}

#[tokio::test]
async fn test_relay_simple_message() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("inbox", "m1", SIMPLE);
    let outbox = Arc::new(OutboxMailService::new());
    let orchestrator = Orchestrator::new(config(""), store, outbox.clone());

    let message_id = orchestrator.handle_event(&notification("m1")).await.unwrap();
    assert_eq!(message_id, "outbox-1");

    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].source, "Alice <a_at_x_dot_com_b@y.com>");
    assert_eq!(sent[0].destinations, vec!["r@z.com".to_string()]);

    let mail = mailparse::parse_mail(&sent[0].raw_data).unwrap();
    assert_eq!(mail.ctype.mimetype, "multipart/mixed");
    assert_eq!(mail.headers.get_first_value("Subject").unwrap(), "Hi");
    assert_eq!(mail.headers.get_first_value("To").unwrap(), "r@z.com");
    assert_eq!(mail.subparts.len(), 2);

    let banner = mail.subparts[0].get_body().unwrap();
    assert!(banner.contains("Alice a@x.com"));
    assert!(banner.contains("b@y.com"));
    assert!(banner
        .contains("http://s3.console.aws.amazon.com/s3/object/inbox/m1?region=us-east-1"));
    assert_eq!(mail.subparts[1].get_body().unwrap().trim_end(), "hello");
}

#[tokio::test]
async fn test_relay_keeps_attachment_order() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("inbox", "mail/m2", WITH_ATTACHMENTS);
    let outbox = Arc::new(OutboxMailService::new());
    let orchestrator = Orchestrator::new(config("mail"), store, outbox.clone());

    orchestrator.relay("m2").await.unwrap();

    let sent = outbox.sent();
    assert_eq!(sent[0].source, "Bob <bob_at_x_dot_com_team@y.com>");

    let mail = mailparse::parse_mail(&sent[0].raw_data).unwrap();
    assert_eq!(mail.subparts.len(), 4);
    let types: Vec<&str> = mail
        .subparts
        .iter()
        .map(|p| p.ctype.mimetype.as_str())
        .collect();
    assert_eq!(types, ["text/html", "text/plain", "application/pdf", "text/csv"]);
    assert_eq!(
        filenames(&mail),
        [
            None,
            None,
            Some("report.pdf".to_string()),
            Some("data.csv".to_string())
        ]
    );
    assert_eq!(
        mail.subparts[2].get_body_raw().unwrap(),
        b"%PDF-1.4\n".to_vec()
    );
    assert!(mail.subparts[0]
        .get_body()
        .unwrap()
        .contains("/inbox/mail/m2?region=us-east-1"));
}

#[tokio::test]
async fn test_missing_object_skips_dispatch() {
    let store = Arc::new(MemoryObjectStore::new());
    let outbox = Arc::new(OutboxMailService::new());
    let orchestrator = Orchestrator::new(config(""), store, outbox.clone());

    let report = orchestrator.run("m404").await;
    assert_eq!(report.stage, Stage::Start);
    assert!(matches!(
        report.outcome,
        Err(RelayError::Fetch(StoreError::NotFound(_)))
    ));
    assert!(outbox.sent().is_empty());
}

#[tokio::test]
async fn test_denied_object_skips_dispatch() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("inbox", "m1", SIMPLE);
    store.deny("inbox", "m1");
    let outbox = Arc::new(OutboxMailService::new());
    let orchestrator = Orchestrator::new(config(""), store, outbox.clone());

    let error = orchestrator.relay("m1").await.unwrap_err();
    assert!(matches!(error, RelayError::Fetch(StoreError::AccessDenied(_))));
    assert!(outbox.sent().is_empty());
}

#[tokio::test]
async fn test_rejected_send_surfaces_reason() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("inbox", "m1", SIMPLE);
    let outbox = Arc::new(OutboxMailService::rejecting(
        "Email address is not verified.",
    ));
    let orchestrator = Orchestrator::new(config(""), store, outbox);

    let error = orchestrator.relay("m1").await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Dispatch error: Email address is not verified."
    );
}

#[tokio::test]
async fn test_empty_notification_fetches_nothing() {
    let store = Arc::new(MemoryObjectStore::new());
    let outbox = Arc::new(OutboxMailService::new());
    let orchestrator = Orchestrator::new(config(""), store.clone(), outbox.clone());

    let event = NotificationEvent::from_json(r#"{"Records": []}"#).unwrap();
    let error = orchestrator.handle_event(&event).await.unwrap_err();
    assert!(matches!(error, RelayError::Event(_)));
    assert_eq!(store.fetches(), 0);
    assert!(outbox.sent().is_empty());
}

#[tokio::test]
async fn test_relay_from_file_archive() {
    let temp_dir = TempDir::new().unwrap();
    let object_dir = temp_dir.path().join("inbox").join("mail");
    std::fs::create_dir_all(&object_dir).unwrap();
    std::fs::write(object_dir.join("m1"), SIMPLE).unwrap();

    let store = Arc::new(FileObjectStore::new(temp_dir.path().to_path_buf()));
    assert_eq!(store.name(), "file");
    let outbox = Arc::new(OutboxMailService::new());
    let orchestrator = Orchestrator::new(config("mail"), store, outbox.clone());

    orchestrator.handle_event(&notification("m1")).await.unwrap();
    assert_eq!(outbox.sent().len(), 1);
}

#[tokio::test]
async fn test_repeated_relay_produces_equivalent_messages() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("inbox", "m1", SIMPLE);
    let outbox = Arc::new(OutboxMailService::new());
    let orchestrator = Orchestrator::new(config(""), store, outbox.clone());

    orchestrator.relay("m1").await.unwrap();
    orchestrator.relay("m1").await.unwrap();

    let sent = outbox.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].source, sent[1].source);
    let first = mailparse::parse_mail(&sent[0].raw_data).unwrap();
    let second = mailparse::parse_mail(&sent[1].raw_data).unwrap();
    for (a, b) in first.subparts.iter().zip(second.subparts.iter()) {
        assert_eq!(a.get_body_raw().unwrap(), b.get_body_raw().unwrap());
    }
}
