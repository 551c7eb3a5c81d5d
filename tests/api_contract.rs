use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{Value, json};
use spellwise::papers::{PaperMapping, PredefinedPapers};
use spellwise::seed::{builtin_catalogue, populate};
use spellwise::{AppConfig, AppState, PracticeService, build_app};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_server(predefined: PredefinedPapers) -> SocketAddr {
    let store = populate(builtin_catalogue()).expect("builtin catalogue");
    let state = AppState::new(
        PracticeService::new(store, predefined),
        &AppConfig::default(),
    );
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    addr
}

async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(user) = user {
        req.push_str(&format!("x-user-id: {user}\r\n"));
    }
    if !payload.is_empty() {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    req.push_str("\r\n");
    req.push_str(&payload);
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    let body = dechunk(head, body);
    let json = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    (status, json)
}

fn dechunk(head: &str, body: &str) -> String {
    if !head
        .to_ascii_lowercase()
        .contains("transfer-encoding: chunked")
    {
        return body.to_string();
    }
    let mut out = String::new();
    let mut rest = body;
    while let Some((size_line, tail)) = rest.split_once("\r\n") {
        let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);
        if size == 0 {
            break;
        }
        out.push_str(&tail[..size]);
        rest = tail[size..].trim_start_matches("\r\n");
    }
    out
}

async fn travel_unit(addr: SocketAddr) -> (String, Vec<Value>) {
    let (status, units) = send(addr, "GET", "/api/units", None, None).await;
    assert_eq!(status, 200);
    let unit_id = units[1]["id"].as_str().expect("unit id").to_string();
    assert_eq!(units[1]["title"], "Travel & Transport");
    let (status, words) = send(addr, "GET", &format!("/api/units/{unit_id}/words"), None, None).await;
    assert_eq!(status, 200);
    (unit_id, words.as_array().expect("word list").clone())
}

fn word_id(words: &[Value], spelling: &str) -> String {
    words
        .iter()
        .find(|w| w["word"] == spelling)
        .and_then(|w| w["id"].as_str())
        .expect("word present")
        .to_string()
}

#[tokio::test]
async fn attempt_lifecycle_over_http() {
    let addr = spawn_server(PredefinedPapers::default()).await;
    let (unit_id, words) = travel_unit(addr).await;
    let voyage = word_id(&words, "voyage");

    let (status, miss) = send(
        addr,
        "POST",
        "/api/practice-attempts",
        Some("alice"),
        Some(json!({ "wordId": voyage, "userSpelling": "voyag" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(miss["isCorrect"], false);
    assert_eq!(miss["correctSpelling"], "voyage");

    let (_, errors) = send(addr, "GET", "/api/error-words", Some("alice"), None).await;
    assert_eq!(errors.as_array().map(Vec::len), Some(1));
    assert_eq!(errors[0]["attemptCount"], 1);
    assert_eq!(errors[0]["word"]["word"], "voyage");

    let (_, others) = send(addr, "GET", "/api/error-words", Some("bob"), None).await;
    assert_eq!(others.as_array().map(Vec::len), Some(0));

    let (_, hit) = send(
        addr,
        "POST",
        "/api/practice-attempts",
        Some("alice"),
        Some(json!({ "wordId": voyage, "userSpelling": " Voyage " })),
    )
    .await;
    assert_eq!(hit["isCorrect"], true);
    assert_eq!(hit["progress"]["completedWords"], 1);

    let (_, errors) = send(addr, "GET", "/api/error-words", Some("alice"), None).await;
    assert_eq!(errors.as_array().map(Vec::len), Some(0));

    let (_, progress) = send(
        addr,
        "GET",
        &format!("/api/progress/{unit_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(progress["totalAttempts"], 2);
    assert_eq!(progress["correctAttempts"], 1);
    assert!(progress["lastPracticedAt"].is_string());

    let (_, none) = send(
        addr,
        "GET",
        &format!("/api/progress/{unit_id}"),
        Some("bob"),
        None,
    )
    .await;
    assert!(none.is_null());

    let (_, all) = send(addr, "GET", "/api/progress", Some("alice"), None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));

    let (_, stats) = send(addr, "GET", "/api/stats", Some("alice"), None).await;
    assert_eq!(stats["totalWords"], 30);
    assert_eq!(stats["masteredWords"], 1);
    assert_eq!(stats["overallAccuracy"], 50);
}

#[tokio::test]
async fn error_statuses_follow_taxonomy() {
    let addr = spawn_server(PredefinedPapers::default()).await;
    let (unit_id, words) = travel_unit(addr).await;

    let (status, body) = send(
        addr,
        "POST",
        "/api/practice-attempts",
        None,
        Some(json!({ "wordId": words[0]["id"], "userSpelling": "  " })),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap_or_default().contains("empty"));

    let (status, _) = send(
        addr,
        "POST",
        "/api/practice-attempts",
        None,
        Some(json!({ "wordId": "6f1c1c2a-0000-4000-8000-000000000000", "userSpelling": "x" })),
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = send(addr, "GET", "/api/units/nope", None, None).await;
    assert_eq!(status, 404);

    let (status, _) = send(
        addr,
        "POST",
        &format!("/api/units/{unit_id}/generate-test-papers"),
        None,
        Some(json!({ "wordsPerPaper": 0, "usePredefined": false })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = send(
        addr,
        "GET",
        "/api/test-papers/6f1c1c2a-0000-4000-8000-000000000000/words",
        None,
        None,
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_papers_regenerate_and_resolve_words() {
    let addr = spawn_server(PredefinedPapers::default()).await;
    let (unit_id, words) = travel_unit(addr).await;
    let generate = format!("/api/units/{unit_id}/generate-test-papers");

    let (status, papers) = send(
        addr,
        "POST",
        &generate,
        None,
        Some(json!({ "wordsPerPaper": 4, "useExcelStructure": false })),
    )
    .await;
    assert_eq!(status, 200);
    let sizes: Vec<usize> = papers
        .as_array()
        .expect("papers")
        .iter()
        .map(|p| p["wordIds"].as_array().map_or(0, Vec::len))
        .collect();
    assert_eq!(sizes, [4, 4, 2]);
    assert_eq!(papers[0]["title"], "Travel & Transport - Test 1");

    let (_, papers) = send(
        addr,
        "POST",
        &generate,
        None,
        Some(json!({ "wordsPerPaper": 5, "usePredefined": false })),
    )
    .await;
    let (_, listed) = send(
        addr,
        "GET",
        &format!("/api/units/{unit_id}/test-papers"),
        None,
        None,
    )
    .await;
    assert_eq!(listed, papers);
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    let second = papers[1]["id"].as_str().expect("paper id");
    let (status, paper_words) = send(
        addr,
        "GET",
        &format!("/api/test-papers/{second}/words"),
        None,
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(paper_words.as_array().map(Vec::as_slice), Some(&words[5..10]));
}

#[tokio::test]
async fn predefined_layout_is_selectable() {
    let addr = spawn_server(PredefinedPapers::from_mappings([PaperMapping {
        chapter: 2,
        test_paper: 1,
        words: vec!["Luggage".into(), "voyage".into()],
    }]))
    .await;
    let (unit_id, _) = travel_unit(addr).await;

    let (status, papers) = send(
        addr,
        "POST",
        &format!("/api/units/{unit_id}/generate-test-papers"),
        None,
        Some(json!({ "usePredefined": true })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(papers.as_array().map(Vec::len), Some(1));
    assert_eq!(papers[0]["wordsPerPaper"], 2);
}

#[tokio::test]
async fn predefined_layout_is_the_default() {
    let addr = spawn_server(PredefinedPapers::from_mappings([PaperMapping {
        chapter: 2,
        test_paper: 1,
        words: vec!["voyage".into(), "terminal".into(), "luggage".into()],
    }]))
    .await;
    let (unit_id, _) = travel_unit(addr).await;

    let (status, papers) = send(
        addr,
        "POST",
        &format!("/api/units/{unit_id}/generate-test-papers"),
        None,
        Some(json!({ "wordsPerPaper": 5 })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(papers.as_array().map(Vec::len), Some(1));
    assert_eq!(papers[0]["paperNumber"], 1);
    assert_eq!(papers[0]["wordsPerPaper"], 3);
}

#[tokio::test]
async fn attempt_history_is_per_user() {
    let addr = spawn_server(PredefinedPapers::default()).await;
    let (_, words) = travel_unit(addr).await;
    let voyage = word_id(&words, "voyage");

    for spelling in ["voyag", "voyage"] {
        send(
            addr,
            "POST",
            "/api/practice-attempts",
            Some("alice"),
            Some(json!({ "wordId": voyage, "userSpelling": spelling })),
        )
        .await;
    }

    let path = format!("/api/words/{voyage}/attempts");
    let (status, history) = send(addr, "GET", &path, Some("alice"), None).await;
    assert_eq!(status, 200);
    let spelled: Vec<&str> = history
        .as_array()
        .expect("attempts")
        .iter()
        .filter_map(|a| a["userSpelling"].as_str())
        .collect();
    assert_eq!(spelled, ["voyag", "voyage"]);

    let (_, other) = send(addr, "GET", &path, Some("bob"), None).await;
    assert_eq!(other.as_array().map(Vec::len), Some(0));

    let (status, _) = send(
        addr,
        "GET",
        "/api/words/6f1c1c2a-0000-4000-8000-000000000000/attempts",
        None,
        None,
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn spell_check_and_settings() {
    let addr = spawn_server(PredefinedPapers::default()).await;
    let (unit_id, words) = travel_unit(addr).await;
    let accommodation = word_id(&words, "accommodation");

    let (_, verdict) = send(
        addr,
        "POST",
        "/api/spell-check",
        None,
        Some(json!({ "wordId": accommodation, "userSpelling": " Accommodation " })),
    )
    .await;
    assert_eq!(verdict["isCorrect"], true);
    assert_eq!(verdict["userSpelling"], "Accommodation");

    let (_, progress) = send(addr, "GET", &format!("/api/progress/{unit_id}"), None, None).await;
    assert!(progress.is_null());

    let (_, settings) = send(addr, "GET", "/api/settings", Some("carol"), None).await;
    assert_eq!(
        settings,
        json!({ "playAudioAutomatically": true, "showDefinitions": true, "practiceSpeed": "normal" })
    );
    let (_, updated) = send(
        addr,
        "POST",
        "/api/settings",
        Some("carol"),
        Some(json!({ "practiceSpeed": "fast" })),
    )
    .await;
    assert_eq!(updated["practiceSpeed"], "fast");
    assert_eq!(updated["showDefinitions"], true);

    let (_, sample) = send(addr, "GET", "/api/words/random?count=3", None, None).await;
    assert_eq!(sample.as_array().map(Vec::len), Some(3));
}
