//! Handshake negotiation against scripted server transcripts.
//!
//! These mirror live-server plugin scenarios (native password, unix socket,
//! dialog-style "two_questions" / "three_attempts", PAM cleartext) with a
//! deterministic in-memory channel standing in for the server.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use mywire::WireError;
use mywire::auth::{
    AuthOptions, DialogHandler, ORDINARY_QUESTION, PASSWORD_QUESTION, authenticate,
    scramble_native, scramble_sha256,
};
use mywire::channel::Channel;
use mywire::protocol::AuthChallenge;

const NONCE: &[u8] = b"12345678901234567890";

/// In-memory channel replaying a fixed server transcript.
struct ScriptedChannel {
    incoming: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
}

impl ScriptedChannel {
    fn new(script: &[Vec<u8>]) -> Self {
        Self {
            incoming: script.iter().cloned().collect(),
            sent: Vec::new(),
        }
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn send(&mut self, payload: Bytes) -> std::io::Result<()> {
        self.sent.push(payload.to_vec());
        Ok(())
    }

    async fn recv(&mut self) -> std::io::Result<Bytes> {
        self.incoming.pop_front().map(Bytes::from).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "script exhausted")
        })
    }
}

fn ok_packet() -> Vec<u8> {
    vec![0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]
}

fn err_packet(code: u16, message: &str) -> Vec<u8> {
    let mut packet = vec![0xff];
    packet.extend_from_slice(&code.to_le_bytes());
    packet.extend_from_slice(b"#28000");
    packet.extend_from_slice(message.as_bytes());
    packet
}

fn switch_packet(plugin: &str, data: &[u8]) -> Vec<u8> {
    let mut packet = vec![0xfe];
    packet.extend_from_slice(plugin.as_bytes());
    packet.push(0);
    packet.extend_from_slice(data);
    packet.push(0);
    packet
}

fn prompt_packet(kind: u8, text: &str) -> Vec<u8> {
    let mut packet = vec![kind];
    packet.extend_from_slice(text.as_bytes());
    packet
}

/// Dialog handler with a fixed prompt→answer table and an optional
/// deliberate wrong answer, mirroring an interactive user.
struct TableDialog {
    answers: HashMap<&'static str, &'static [u8]>,
    fail_next: bool,
    seen_echo: Arc<Mutex<Vec<bool>>>,
}

impl TableDialog {
    fn new(answers: HashMap<&'static str, &'static [u8]>) -> Self {
        Self {
            answers,
            fail_next: false,
            seen_echo: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DialogHandler for TableDialog {
    fn prompt(&mut self, echo: bool, text: &str) -> Option<Vec<u8>> {
        self.seen_echo.lock().unwrap().push(echo);
        if self.fail_next {
            self.fail_next = false;
            return Some(b"bad guess".to_vec());
        }
        self.answers.get(text).map(|answer| answer.to_vec())
    }
}

#[tokio::test]
async fn native_password_authenticates_in_one_round_trip() {
    let mut channel = ScriptedChannel::new(&[ok_packet()]);
    let greeting = AuthChallenge::new("mysql_native_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "secret");

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();

    assert_eq!(channel.sent, vec![scramble_native(b"secret", NONCE)]);
}

#[tokio::test]
async fn unknown_plugin_fails_without_any_round_trip() {
    let mut channel = ScriptedChannel::new(&[ok_packet()]);
    let greeting = AuthChallenge::new("sha256_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "secret");

    let err = authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::UnsupportedAuthPlugin(name) if name == "sha256_password"));
    assert!(channel.sent.is_empty());
    assert_eq!(channel.incoming.len(), 1, "nothing was read either");
}

#[tokio::test]
async fn server_rejection_surfaces_verbatim() {
    let mut channel = ScriptedChannel::new(&[err_packet(1045, "Access denied for user 'root'")]);
    let greeting = AuthChallenge::new("mysql_native_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "wrong");

    let err = authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::Rejected(msg) if msg == "Access denied for user 'root'"));
}

#[tokio::test]
async fn socket_plugin_sends_empty_response() {
    let mut channel = ScriptedChannel::new(&[ok_packet()]);
    let greeting = AuthChallenge::new("unix_socket", Vec::new());
    let mut options = AuthOptions::new("appuser", "");

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();
    assert_eq!(channel.sent, vec![Vec::<u8>::new()]);
}

#[tokio::test]
async fn pam_uses_cleartext_password() {
    let mut channel = ScriptedChannel::new(&[ok_packet()]);
    let greeting = AuthChallenge::new("pam", Vec::new());
    let mut options = AuthOptions::new("appuser", "notverysecret");

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();
    assert_eq!(channel.sent, vec![b"notverysecret\0".to_vec()]);
}

#[tokio::test]
async fn two_questions_dialog_completes_within_budget() {
    let mut channel = ScriptedChannel::new(&[
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
        prompt_packet(ORDINARY_QUESTION, "Are you sure ?"),
        ok_packet(),
    ]);
    let greeting = AuthChallenge::new("dialog", Vec::new());
    let handler = TableDialog::new(HashMap::from([
        ("Password, please:", b"notverysecret".as_slice()),
        ("Are you sure ?", b"yes, of course".as_slice()),
    ]));
    let seen_echo = handler.seen_echo.clone();
    let mut options = AuthOptions::new("two_questions_user", "")
        .with_dialog_handler(handler)
        .with_dialog_rounds(2);

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();

    assert_eq!(
        channel.sent,
        vec![b"notverysecret".to_vec(), b"yes, of course".to_vec()]
    );
    // Password prompts arrive with echo off, ordinary questions with echo on.
    assert_eq!(*seen_echo.lock().unwrap(), vec![false, true]);
}

#[tokio::test]
async fn three_attempts_recovers_from_one_wrong_answer() {
    let mut channel = ScriptedChannel::new(&[
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
        ok_packet(),
    ]);
    let greeting = AuthChallenge::new("dialog", Vec::new());
    let mut handler = TableDialog::new(HashMap::from([(
        "Password, please:",
        b"stillnotverysecret".as_slice(),
    )]));
    handler.fail_next = true; // fail just once; three attempts after all
    let mut options = AuthOptions::new("three_attempts_user", "")
        .with_dialog_handler(handler)
        .with_dialog_rounds(3);

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();

    assert_eq!(
        channel.sent,
        vec![b"bad guess".to_vec(), b"stillnotverysecret".to_vec()]
    );
}

#[tokio::test]
async fn three_attempts_exhausts_round_budget() {
    // The server keeps re-asking; after the third consumed round the next
    // challenge must terminate as exhaustion, not rejection.
    let mut channel = ScriptedChannel::new(&[
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
    ]);
    let greeting = AuthChallenge::new("dialog", Vec::new());
    let handler = |_echo: bool, _text: &str| Some(b"wrong every time".to_vec());
    let mut options = AuthOptions::new("three_attempts_user", "")
        .with_dialog_handler(handler)
        .with_dialog_rounds(3);

    let err = authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::ExhaustedAttempts));
    assert_eq!(channel.sent.len(), 3);
}

#[tokio::test]
async fn dialog_without_answer_is_rejected() {
    let mut channel = ScriptedChannel::new(&[prompt_packet(ORDINARY_QUESTION, "Shibboleth?")]);
    let greeting = AuthChallenge::new("dialog", Vec::new());
    let handler = |_echo: bool, _text: &str| None;
    let mut options = AuthOptions::new("someone", "").with_dialog_handler(handler);

    let err = authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::Rejected(_)));
}

#[tokio::test]
async fn auth_switch_is_honored_once() {
    let mut channel = ScriptedChannel::new(&[
        switch_packet("dialog", b""),
        prompt_packet(PASSWORD_QUESTION, "Password, please:"),
        ok_packet(),
    ]);
    let greeting = AuthChallenge::new("mysql_native_password", NONCE.to_vec());
    let handler = TableDialog::new(HashMap::from([(
        "Password, please:",
        b"notverysecret".as_slice(),
    )]));
    let mut options = AuthOptions::new("root", "secret").with_dialog_handler(handler);

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();

    assert_eq!(
        channel.sent,
        vec![
            scramble_native(b"secret", NONCE),
            b"notverysecret".to_vec(),
        ]
    );
}

#[tokio::test]
async fn second_auth_switch_is_a_protocol_error() {
    let mut channel = ScriptedChannel::new(&[
        switch_packet("mysql_clear_password", b""),
        switch_packet("mysql_native_password", NONCE),
    ]);
    let greeting = AuthChallenge::new("mysql_native_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "secret");

    let err = authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::Protocol(_)));
}

#[tokio::test]
async fn switch_to_unknown_plugin_is_unsupported() {
    let mut channel = ScriptedChannel::new(&[switch_packet("sha256_password", NONCE)]);
    let greeting = AuthChallenge::new("mysql_native_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "secret");

    let err = authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::UnsupportedAuthPlugin(_)));
}

#[tokio::test]
async fn caching_sha2_fast_path() {
    let mut channel = ScriptedChannel::new(&[vec![0x01, 0x03], ok_packet()]);
    let greeting = AuthChallenge::new("caching_sha2_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "secret");

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();
    assert_eq!(channel.sent, vec![scramble_sha256(b"secret", NONCE)]);
}

#[tokio::test]
async fn caching_sha2_full_auth_sends_cleartext() {
    let mut channel = ScriptedChannel::new(&[vec![0x01, 0x04], ok_packet()]);
    let greeting = AuthChallenge::new("caching_sha2_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "secret");

    authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap();
    assert_eq!(
        channel.sent,
        vec![scramble_sha256(b"secret", NONCE), b"secret\0".to_vec()]
    );
}

#[tokio::test]
async fn closed_channel_surfaces_as_io_error() {
    // Script exhausted mid-handshake: the pending read fails instead of
    // hanging, and surfaces as a transport-level error.
    let mut channel = ScriptedChannel::new(&[]);
    let greeting = AuthChallenge::new("mysql_native_password", NONCE.to_vec());
    let mut options = AuthOptions::new("root", "secret");

    let err = authenticate(&mut channel, &greeting, &mut options)
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::Io(_)));
}
