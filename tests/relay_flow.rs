//! Relay behaviour with in-process providers: completion signalling,
//! fan-out isolation, room lifecycle and per-destination ordering.

mod mock_providers;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use mock_providers::{
    CountingSynthesizer, PrefixTranslator, ScriptedRecognizer, coordinator_with, drain,
    fake_audio, next_message, until_complete,
};
use voice_relay::core::relay::{
    OutgoingMessage, RelayCoordinator, Role, Session, SessionDefaults, SessionParams,
};

const ROOM: &str = "room-a";

fn params(role: Role, room_id: &str, target: &str) -> SessionParams {
    let mut params = SessionParams::from_defaults(role, &SessionDefaults::default());
    params.room_id = room_id.to_string();
    params.target_language = target.to_string();
    params
}

fn join(
    coordinator: &RelayCoordinator,
    role: Role,
    target: &str,
) -> (Arc<Session>, mpsc::Receiver<OutgoingMessage>) {
    let (tx, rx) = mpsc::channel(64);
    let session = coordinator.connect(params(role, ROOM, target), tx);
    (session, rx)
}

fn count_complete(messages: &[OutgoingMessage]) -> usize {
    messages
        .iter()
        .filter(|m| **m == OutgoingMessage::StreamComplete)
        .count()
}

#[tokio::test]
async fn test_stream_complete_after_all_listener_work() {
    let recognizer = Arc::new(ScriptedRecognizer::default());
    let translator = Arc::new(PrefixTranslator::default().with_delay(Duration::from_millis(20)));
    let synthesizer = Arc::new(CountingSynthesizer::default());
    let coordinator = coordinator_with(recognizer.clone(), translator, synthesizer);

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let mut listeners: Vec<_> = ["es-ES", "fr-FR", "de-DE"]
        .iter()
        .map(|target| join(&coordinator, Role::Listener, target))
        .collect();

    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"hello"))
        .unwrap();
    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"world"))
        .unwrap();
    coordinator.handle_text(&speaker, "END_OF_AUDIO").await;

    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(
        received,
        vec![
            OutgoingMessage::Transcript("hello".to_string()),
            OutgoingMessage::Transcript("world".to_string()),
            OutgoingMessage::StreamComplete,
        ]
    );
    assert_eq!(recognizer.opened(), 1);

    // Every unit delivered before the terminal signal went out
    for (listener, rx) in listeners.iter_mut() {
        let delivered = drain(rx);
        let translations = delivered
            .iter()
            .filter(|m| matches!(m, OutgoingMessage::Translation(_)))
            .count();
        let audio = delivered
            .iter()
            .filter(|m| matches!(m, OutgoingMessage::Audio(_)))
            .count();
        assert_eq!(translations, 2, "listener {}", listener.id());
        assert_eq!(audio, 2, "listener {}", listener.id());
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(drain(&mut speaker_rx).is_empty());
    assert!(speaker.completion().is_signalled());
    assert_eq!(speaker.completion().pending(), 0);
}

#[tokio::test]
async fn test_stream_complete_exactly_once_across_repeated_runs() {
    for _ in 0..20 {
        let coordinator = coordinator_with(
            Arc::new(ScriptedRecognizer::default()),
            Arc::new(PrefixTranslator::default()),
            Arc::new(CountingSynthesizer::default()),
        );
        let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
        let _listeners: Vec<_> = (0..4)
            .map(|_| join(&coordinator, Role::Listener, "es-ES"))
            .collect();

        for chunk in ["one", "two", "three"] {
            coordinator
                .handle_audio(&speaker, Bytes::from(chunk))
                .unwrap();
        }
        coordinator.end_of_audio(&speaker).await;
        // A repeated end of audio must not produce a second signal
        coordinator.end_of_audio(&speaker).await;

        let mut received = until_complete(&mut speaker_rx).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        received.extend(drain(&mut speaker_rx));
        assert_eq!(count_complete(&received), 1);
    }
}

#[tokio::test]
async fn test_failing_listener_does_not_affect_others() {
    let synthesizer = Arc::new(CountingSynthesizer::default());
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        Arc::new(PrefixTranslator::failing_for(&["fr-FR"])),
        synthesizer.clone(),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (_failing, mut failing_rx) = join(&coordinator, Role::Listener, "fr-FR");
    let (_healthy, mut healthy_rx) = join(&coordinator, Role::Listener, "de-DE");

    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"good morning"))
        .unwrap();
    coordinator.end_of_audio(&speaker).await;

    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(count_complete(&received), 1);

    assert!(drain(&mut failing_rx).is_empty());
    assert_eq!(
        drain(&mut healthy_rx),
        vec![
            OutgoingMessage::Translation("[de-DE] good morning".to_string()),
            OutgoingMessage::Audio(fake_audio("[de-DE] good morning")),
        ]
    );
    assert_eq!(synthesizer.calls(), 1);
}

#[tokio::test]
async fn test_synthesis_failure_still_completes() {
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        Arc::new(PrefixTranslator::default()),
        Arc::new(CountingSynthesizer::broken()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (_listener, mut listener_rx) = join(&coordinator, Role::Listener, "es-ES");

    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"hi"))
        .unwrap();
    coordinator.end_of_audio(&speaker).await;

    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(count_complete(&received), 1);

    // The translated text is still delivered without audio
    assert_eq!(
        drain(&mut listener_rx),
        vec![OutgoingMessage::Translation("[es-ES] hi".to_string())]
    );
}

#[tokio::test]
async fn test_recognizer_error_counts_as_completion() {
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::failing()),
        Arc::new(PrefixTranslator::default()),
        Arc::new(CountingSynthesizer::default()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (_listener, mut listener_rx) = join(&coordinator, Role::Listener, "es-ES");

    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"partial"))
        .unwrap();

    // No END_OF_AUDIO: the recognizer failure alone closes recognition
    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(
        received,
        vec![
            OutgoingMessage::Transcript("partial".to_string()),
            OutgoingMessage::StreamComplete,
        ]
    );
    assert_eq!(drain(&mut listener_rx).len(), 2);
}

#[tokio::test]
async fn test_end_of_audio_without_audio_completes() {
    let recognizer = Arc::new(ScriptedRecognizer::default());
    let coordinator = coordinator_with(
        recognizer.clone(),
        Arc::new(PrefixTranslator::default()),
        Arc::new(CountingSynthesizer::default()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    coordinator.handle_text(&speaker, "END_OF_AUDIO").await;

    assert_eq!(next_message(&mut speaker_rx).await, OutgoingMessage::StreamComplete);
    assert_eq!(recognizer.opened(), 0);
    assert!(speaker.completion().is_signalled());
}

#[tokio::test]
async fn test_room_lifecycle() {
    let translator = Arc::new(PrefixTranslator::default());
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        translator.clone(),
        Arc::new(CountingSynthesizer::default()),
    );
    let rooms = coordinator.rooms().clone();

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (first, _first_rx) = join(&coordinator, Role::Listener, "es-ES");
    let (second, _second_rx) = join(&coordinator, Role::Listener, "it-IT");
    assert_eq!(rooms.member_count(ROOM), 3);

    coordinator.disconnect(&first);
    coordinator.disconnect(&second);
    let remaining = rooms.members(ROOM);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), speaker.id());

    // A transcript now fans out to nobody
    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"anyone there"))
        .unwrap();
    coordinator.end_of_audio(&speaker).await;
    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(
        received,
        vec![
            OutgoingMessage::Transcript("anyone there".to_string()),
            OutgoingMessage::StreamComplete,
        ]
    );
    assert_eq!(translator.calls(), 0);

    coordinator.disconnect(&speaker);
    assert!(!rooms.contains_room(ROOM));
    assert!(rooms.is_empty());
}

#[tokio::test]
async fn test_listener_receives_translation_before_audio() {
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        Arc::new(PrefixTranslator::default()),
        Arc::new(CountingSynthesizer::default()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (_listener, mut listener_rx) = join(&coordinator, Role::Listener, "ja-JP");

    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"thank you"))
        .unwrap();

    assert_eq!(
        next_message(&mut listener_rx).await,
        OutgoingMessage::Translation("[ja-JP] thank you".to_string())
    );
    assert_eq!(
        next_message(&mut listener_rx).await,
        OutgoingMessage::Audio(fake_audio("[ja-JP] thank you"))
    );

    coordinator.end_of_audio(&speaker).await;
    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(received.first(), Some(&OutgoingMessage::Transcript("thank you".to_string())));
}

#[tokio::test]
async fn test_listener_audio_and_control_are_ignored() {
    let recognizer = Arc::new(ScriptedRecognizer::default());
    let coordinator = coordinator_with(
        recognizer.clone(),
        Arc::new(PrefixTranslator::default()),
        Arc::new(CountingSynthesizer::default()),
    );

    let (listener, mut listener_rx) = join(&coordinator, Role::Listener, "es-ES");
    coordinator
        .handle_audio(&listener, Bytes::from_static(b"noise"))
        .unwrap();
    coordinator.handle_text(&listener, "END_OF_AUDIO").await;
    coordinator.handle_text(&listener, "hello?").await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(recognizer.opened(), 0);
    assert!(drain(&mut listener_rx).is_empty());
    assert!(!listener.completion().is_signalled());
}

#[tokio::test]
async fn test_unknown_text_frame_keeps_session_usable() {
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        Arc::new(PrefixTranslator::default()),
        Arc::new(CountingSynthesizer::default()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    coordinator.handle_text(&speaker, "PAUSE").await;
    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"still here"))
        .unwrap();
    coordinator.end_of_audio(&speaker).await;

    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_disconnected_listener_is_skipped() {
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        Arc::new(PrefixTranslator::default()),
        Arc::new(CountingSynthesizer::default()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (gone, mut gone_rx) = join(&coordinator, Role::Listener, "es-ES");
    let (_stays, mut stays_rx) = join(&coordinator, Role::Listener, "pt-BR");
    coordinator.disconnect(&gone);

    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"bye"))
        .unwrap();
    coordinator.end_of_audio(&speaker).await;

    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(count_complete(&received), 1);
    assert!(drain(&mut gone_rx).is_empty());
    assert_eq!(drain(&mut stays_rx).len(), 2);
}

#[tokio::test]
async fn test_listener_leaving_mid_unit_is_discarded() {
    let translator = Arc::new(PrefixTranslator::default().with_delay(Duration::from_millis(200)));
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        translator.clone(),
        Arc::new(CountingSynthesizer::default()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (leaving, mut leaving_rx) = join(&coordinator, Role::Listener, "es-ES");
    let (_stays, mut stays_rx) = join(&coordinator, Role::Listener, "pt-BR");

    coordinator
        .handle_audio(&speaker, Bytes::from_static(b"in flight"))
        .unwrap();

    // Both units are inside the translator when the listener goes away
    tokio::time::timeout(Duration::from_secs(5), async {
        while translator.calls() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("units never started");
    coordinator.disconnect(&leaving);
    coordinator.end_of_audio(&speaker).await;

    let received = until_complete(&mut speaker_rx).await;
    assert_eq!(count_complete(&received), 1);
    assert_eq!(speaker.completion().pending(), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(drain(&mut speaker_rx).is_empty());
    assert!(drain(&mut leaving_rx).is_empty());
    assert_eq!(
        drain(&mut stays_rx),
        vec![
            OutgoingMessage::Translation("[pt-BR] in flight".to_string()),
            OutgoingMessage::Audio(fake_audio("[pt-BR] in flight")),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_units_deliver_whole_pairs() {
    let coordinator = coordinator_with(
        Arc::new(ScriptedRecognizer::default()),
        Arc::new(PrefixTranslator::default().with_delay(Duration::from_millis(10))),
        Arc::new(CountingSynthesizer::default()),
    );

    let (speaker, mut speaker_rx) = join(&coordinator, Role::Speaker, "en-US");
    let (_listener, mut listener_rx) = join(&coordinator, Role::Listener, "it-IT");

    let chunks = ["first", "second", "third", "fourth"];
    for chunk in chunks {
        coordinator
            .handle_audio(&speaker, Bytes::from(chunk))
            .unwrap();
    }
    coordinator.end_of_audio(&speaker).await;
    until_complete(&mut speaker_rx).await;

    let delivered = drain(&mut listener_rx);
    assert_eq!(delivered.len(), chunks.len() * 2);

    let mut seen = Vec::new();
    for pair in delivered.chunks(2) {
        let OutgoingMessage::Translation(text) = &pair[0] else {
            panic!("expected a translation, got {pair:?}");
        };
        assert_eq!(pair[1], OutgoingMessage::Audio(fake_audio(text)));
        seen.push(text.clone());
    }

    seen.sort();
    let mut expected: Vec<_> = chunks.iter().map(|c| format!("[it-IT] {c}")).collect();
    expected.sort();
    assert_eq!(seen, expected);
}
