// ABOUTME: Integration tests for the panelfeed CLI binary.
// ABOUTME: Tests file and stdin feeds, remote loads with relay fallback, feed lists and the JSON envelope.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>File Comic</title>
  <entry>
    <title>Panel One</title>
    <link href="/panels/1"/>
    <content type="html">&lt;img src="/panels/1.png" onload="x()"&gt;</content>
  </entry>
</feed>"#;

fn panelfeed_cmd() -> Command {
    Command::cargo_bin("panelfeed-cli").unwrap()
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn feed_from_file_is_sanitized_against_feed_url() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("atom.xml");
    fs::write(&path, ATOM).unwrap();

    let value = stdout_json(
        panelfeed_cmd()
            .arg("--feed-url")
            .arg("https://comic.example.com/atom.xml")
            .arg(&path),
    );

    assert_eq!(value["title"], "File Comic");
    assert_eq!(value["dialect"], "atom");
    assert_eq!(value["base_url"], "https://comic.example.com");
    assert_eq!(value["entries"][0]["link"], "/panels/1");
    assert_eq!(
        value["entries"][0]["content_html"],
        r#"<img loading="lazy" src="https://comic.example.com/panels/1.png">"#
    );
}

#[test]
fn feed_from_stdin() {
    assert_cmd::Command::cargo_bin("panelfeed-cli")
        .unwrap()
        .arg("--compact")
        .arg("--feed-url")
        .arg("https://comic.example.com/")
        .arg("-")
        .write_stdin("<rss><channel><title>Piped</title><item/></channel></rss>")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title":"Piped""#))
        .stdout(predicate::str::contains(r#""title":"Untitled""#));
}

#[test]
fn remote_feed_falls_back_to_relay() {
    let server = MockServer::start();
    let direct = server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(503);
    });
    let relay = server.mock(|when, then| {
        when.method(GET).path("/relay");
        then.status(200)
            .header("content-type", "application/atom+xml")
            .body(ATOM);
    });

    let value = stdout_json(
        panelfeed_cmd()
            .arg("--relay")
            .arg(format!("{}/relay?u={{url}}", server.base_url()))
            .arg(server.url("/feed.xml")),
    );

    direct.assert_hits(1);
    relay.assert_hits(1);
    assert_eq!(value["title"], "File Comic");
}

#[test]
fn failures_are_reported_in_envelope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ok.xml");
        then.status(200).body("<rss><channel><title>Ok</title></channel></rss>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/missing.xml");
        then.status(404);
    });

    let missing = server.url("/missing.xml");
    let value = stdout_json(
        panelfeed_cmd()
            .arg("--no-relays")
            .arg(server.url("/ok.xml"))
            .arg(&missing),
    );

    assert_eq!(value["total_feeds"], 2);
    assert_eq!(value["parsed"], 1);
    assert_eq!(value["failed"], 1);
    assert_eq!(value["feeds"][1]["ok"], false);
    assert_eq!(value["feeds"][1]["feed_url"], missing.as_str());
    assert!(value["feeds"][1]["error"]
        .as_str()
        .unwrap()
        .contains(missing.as_str()));
}

#[test]
fn list_mode_sorts_sources_by_display_name() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("comics.txt");
    fs::write(
        &path,
        "https://www.zebra-comics.com/rss\n\nhttps://feeds.feedburner.com/AppleStrips\n  https://mango.blogspot.com/feeds/posts/default  \n",
    )
    .unwrap();

    let value = stdout_json(panelfeed_cmd().arg("--list").arg(&path));

    assert_eq!(value["total"], 3);
    let names: Vec<_> = value["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["display_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Apple Strips", "Mango", "Zebra Comics"]);
    assert_eq!(value["sources"][2]["origin_url"], "https://www.zebra-comics.com");
}

#[test]
fn list_mode_fetches_remote_lists_through_relays() {
    let server = MockServer::start();
    let direct = server.mock(|when, then| {
        when.method(GET).path("/comics.txt");
        then.status(500);
    });
    let relay = server.mock(|when, then| {
        when.method(GET).path("/relay");
        then.status(200)
            .body("\nhttps://www.zebra-comics.com/rss\n\n  https://feeds.feedburner.com/AppleStrips  \n");
    });

    let value = stdout_json(
        panelfeed_cmd()
            .arg("--list")
            .arg("--relay")
            .arg(format!("{}/relay?u={{url}}", server.base_url()))
            .arg(server.url("/comics.txt")),
    );

    direct.assert_hits(1);
    relay.assert_hits(1);
    assert_eq!(value["total"], 2);
    assert_eq!(value["sources"][0]["display_name"], "Apple Strips");
    assert_eq!(value["sources"][1]["display_name"], "Zebra Comics");
}

#[test]
fn feed_url_requires_single_target() {
    panelfeed_cmd()
        .arg("--feed-url")
        .arg("https://example.com")
        .arg("a.xml")
        .arg("b.xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--feed-url is only valid"));
}
