//! 0-RTT early data integration tests.

mod common;

use common::*;
use palisade_core::cipher::CipherSuite;
use palisade_core::early_data::EarlyDataState;
use palisade_core::error::{Error, ProtocolError};
use palisade_core::extensions::{Extension, Extensions};
use palisade_core::handshake::{ClientHandshake, HandshakeStatus, TrafficLevel};
use palisade_core::protocol::{ExtensionType, HandshakeType};
use palisade_core::{AlertDescription, Config};
use palisade_crypto::KeyExchangeAlgorithm;

const SUITE: CipherSuite = CipherSuite::Aes128GcmSha256;

fn resumption_extensions(server_public: &[u8]) -> Extensions {
    let mut extensions = Extensions::new();
    extensions.add(psk_extension()).unwrap();
    extensions
        .add(key_share_extension(KeyExchangeAlgorithm::X25519, server_public))
        .unwrap();
    extensions
}

fn early_data_extension() -> Extension {
    Extension::new(ExtensionType::EarlyData, Vec::new())
}

#[test]
fn test_early_data_accepted_flow() {
    let psk = vec![0x42u8; 32];
    let session = resumable_session(SUITE, psk.clone(), Some(b"h2".to_vec()));
    let (offer, ch_bytes, client_public) =
        client_offer(KeyExchangeAlgorithm::X25519, Some(session), true);
    let (server_public, shared) = server_key_share(KeyExchangeAlgorithm::X25519, &client_public);

    let mut sim = ServerSim::new(SUITE, Some(&psk), &shared);
    sim.fold_raw(&ch_bytes);
    let sh = server_hello(SUITE, resumption_extensions(&server_public));
    sim.fold(&sh);
    sim.derive_handshake_secrets();

    let mut ee_extensions = Extensions::new();
    ee_extensions.add(early_data_extension()).unwrap();
    ee_extensions.add(alpn_extension(b"h2")).unwrap();
    let ee = encrypted_extensions(ee_extensions);
    sim.fold(&ee);
    let fin = sim.server_finished();
    sim.fold(&fin);
    let (client_app, server_app) = sim.derive_application_secrets();

    let mut harness = Harness::new();
    for msg in [sh, ee, fin] {
        harness.source.push(msg);
    }

    let mut handshake = ClientHandshake::new(Config::default(), offer).unwrap();
    assert_eq!(
        harness.drive(&mut handshake).unwrap(),
        HandshakeStatus::NeedFlush
    );
    assert_eq!(
        harness.drive(&mut handshake).unwrap(),
        HandshakeStatus::Complete
    );
    assert_eq!(handshake.early_data_state(), EarlyDataState::Accepted);
    assert!(handshake.session_reused());

    // EndOfEarlyData precedes the Finished, and both are in the
    // transcript the Finished binds.
    let messages = &harness.outbox.messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].msg_type, HandshakeType::EndOfEarlyData);
    assert!(messages[0].payload.is_empty());
    assert_eq!(messages[1].msg_type, HandshakeType::Finished);
    sim.fold(&messages[0]);
    assert_eq!(messages[1].payload, sim.expected_client_finished());

    // The client write key was deferred until after EndOfEarlyData: read
    // handshake first, then write handshake, then the application pair.
    let installed = &harness.keys.installed;
    assert_eq!(installed.len(), 4);
    assert_eq!(installed[0].0, "read");
    assert_eq!(installed[0].1, TrafficLevel::Handshake);
    assert_eq!(installed[1], ("write", TrafficLevel::Handshake, sim.client_hs.clone()));
    assert_eq!(installed[2], ("read", TrafficLevel::Application, server_app));
    assert_eq!(installed[3], ("write", TrafficLevel::Application, client_app));

    // The established session reflects the negotiated ALPN.
    let session = handshake.into_session().unwrap();
    assert_eq!(session.alpn_protocol, Some(b"h2".to_vec()));
}

#[test]
fn test_early_data_rejected_by_encrypted_extensions() {
    let psk = vec![0x42u8; 32];
    let session = resumable_session(SUITE, psk.clone(), None);
    let (offer, ch_bytes, client_public) =
        client_offer(KeyExchangeAlgorithm::X25519, Some(session), true);
    let (server_public, shared) = server_key_share(KeyExchangeAlgorithm::X25519, &client_public);

    let mut sim = ServerSim::new(SUITE, Some(&psk), &shared);
    sim.fold_raw(&ch_bytes);
    let sh = server_hello(SUITE, resumption_extensions(&server_public));
    sim.fold(&sh);
    sim.derive_handshake_secrets();
    // No early_data extension: the offer is rejected.
    let ee = encrypted_extensions(Extensions::new());
    sim.fold(&ee);
    let fin = sim.server_finished();
    sim.fold(&fin);
    sim.derive_application_secrets();
    let expected_client_finished = sim.expected_client_finished();

    let mut harness = Harness::new();
    for msg in [sh, ee, fin] {
        harness.source.push(msg);
    }

    let mut handshake = ClientHandshake::new(Config::default(), offer).unwrap();

    // Rejection is surfaced exactly once, then the handshake continues.
    assert_eq!(
        harness.drive(&mut handshake).unwrap(),
        HandshakeStatus::EarlyDataRejected
    );
    assert_eq!(handshake.early_data_state(), EarlyDataState::Rejected);
    assert_eq!(
        harness.drive(&mut handshake).unwrap(),
        HandshakeStatus::NeedFlush
    );
    assert_eq!(
        harness.drive(&mut handshake).unwrap(),
        HandshakeStatus::Complete
    );

    // No EndOfEarlyData on the rejected path.
    let messages = &harness.outbox.messages;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].msg_type, HandshakeType::Finished);
    assert_eq!(messages[0].payload, expected_client_finished);

    // The deferred client handshake write key still gets installed before
    // the second flight.
    let installed = &harness.keys.installed;
    assert_eq!(installed[0].0, "read");
    assert_eq!(installed[1], ("write", TrafficLevel::Handshake, sim.client_hs.clone()));
}

#[test]
fn test_alpn_mismatch_on_accepted_early_data_is_fatal() {
    // 0-RTT went out under ALPN "http/1.1"; the server accepts early data
    // but negotiates "h2".
    let psk = vec![0x42u8; 32];
    let session = resumable_session(SUITE, psk, Some(b"http/1.1".to_vec()));
    let (offer, _, client_public) =
        client_offer(KeyExchangeAlgorithm::X25519, Some(session), true);
    let (server_public, _) = server_key_share(KeyExchangeAlgorithm::X25519, &client_public);

    let mut ee_extensions = Extensions::new();
    ee_extensions.add(early_data_extension()).unwrap();
    ee_extensions.add(alpn_extension(b"h2")).unwrap();

    let mut harness = Harness::new();
    harness
        .source
        .push(server_hello(SUITE, resumption_extensions(&server_public)));
    harness.source.push(encrypted_extensions(ee_extensions));

    let mut handshake = ClientHandshake::new(Config::default(), offer).unwrap();
    let err = harness.drive(&mut handshake).unwrap_err();
    assert_eq!(err, Error::Protocol(ProtocolError::AlpnMismatchOnEarlyData));
    assert_eq!(
        harness.outbox.alerts.last().unwrap().description,
        AlertDescription::IllegalParameter
    );
}

#[test]
fn test_channel_binding_on_accepted_early_data_is_fatal() {
    let psk = vec![0x42u8; 32];
    let session = resumable_session(SUITE, psk, None);
    let (offer, _, client_public) =
        client_offer(KeyExchangeAlgorithm::X25519, Some(session), true);
    let (server_public, _) = server_key_share(KeyExchangeAlgorithm::X25519, &client_public);

    let mut ee_extensions = Extensions::new();
    ee_extensions.add(early_data_extension()).unwrap();
    ee_extensions
        .add(Extension::new(ExtensionType::ChannelId, Vec::new()))
        .unwrap();

    let mut harness = Harness::new();
    harness
        .source
        .push(server_hello(SUITE, resumption_extensions(&server_public)));
    harness.source.push(encrypted_extensions(ee_extensions));

    let mut handshake = ClientHandshake::new(Config::default(), offer).unwrap();
    let err = harness.drive(&mut handshake).unwrap_err();
    assert_eq!(
        err,
        Error::Protocol(ProtocolError::UnexpectedExtensionOnEarlyData)
    );
}

#[test]
fn test_unsolicited_early_data_acceptance_is_fatal() {
    // Early data was never offered, but the server claims to accept it.
    let (offer, _, client_public) = client_offer(KeyExchangeAlgorithm::X25519, None, false);
    let (server_public, _) = server_key_share(KeyExchangeAlgorithm::X25519, &client_public);

    let mut key_share_extensions = Extensions::new();
    key_share_extensions
        .add(key_share_extension(KeyExchangeAlgorithm::X25519, &server_public))
        .unwrap();

    let mut ee_extensions = Extensions::new();
    ee_extensions.add(early_data_extension()).unwrap();

    let mut harness = Harness::new();
    harness.source.push(server_hello(SUITE, key_share_extensions));
    harness.source.push(encrypted_extensions(ee_extensions));

    let mut handshake = ClientHandshake::new(Config::default(), offer).unwrap();
    let err = harness.drive(&mut handshake).unwrap_err();
    assert_eq!(err, Error::Protocol(ProtocolError::UnsupportedExtension));
}
